//! Document security integration tests.
//!
//! Covers the full open/decrypt cycle across security handler revisions:
//! RC4 documents (R=2/R=3) written and re-read through the object walker,
//! AES-128 crypt filters (R=4), and AES-256 authentication (R=6) against a
//! document whose O/U/OE/UE/Perms entries are constructed from first
//! principles with independent crypto primitives.

use std::collections::BTreeMap;

use aes::cipher::block_padding::NoPadding;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256, Sha384, Sha512};

use pdf_forge::encryption::{AccessPermissions, StandardSecurityHandler};
use pdf_forge::object::{Dictionary, Object, ObjectRef, Stream};
use pdf_forge::Error;

// ---- independent crypto helpers (test-side reference implementations) ----

fn aes128_cbc_encrypt(key: &[u8; 16], iv: &[u8; 16], buf: &mut [u8]) {
    let len = buf.len();
    cbc::Encryptor::<aes::Aes128>::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .unwrap();
}

fn aes256_cbc_encrypt(key: &[u8; 32], iv: &[u8; 16], buf: &mut [u8]) {
    let len = buf.len();
    cbc::Encryptor::<aes::Aes256>::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .unwrap();
}

fn aes256_ecb_encrypt(key: &[u8; 32], block: &mut [u8; 16]) {
    let cipher = aes::Aes256::new(GenericArray::from_slice(key));
    cipher.encrypt_block(GenericArray::from_mut_slice(block));
}

/// The revision 6 password hash, re-derived here so the library's version
/// is checked against a second implementation.
fn hash_r6(data: &[u8], password: &[u8], user_data: &[u8]) -> [u8; 32] {
    let mut k: Vec<u8> = Sha256::digest(data).to_vec();
    let mut round = 0usize;
    loop {
        let mut part = Vec::new();
        part.extend_from_slice(password);
        part.extend_from_slice(&k);
        part.extend_from_slice(user_data);

        let mut e = Vec::with_capacity(part.len() * 64);
        for _ in 0..64 {
            e.extend_from_slice(&part);
        }
        let key: [u8; 16] = k[..16].try_into().unwrap();
        let iv: [u8; 16] = k[16..32].try_into().unwrap();
        aes128_cbc_encrypt(&key, &iv, &mut e);

        let selector = e[..16].iter().map(|&b| (b % 3) as u32).sum::<u32>() % 3;
        let last = e[e.len() - 1] as usize;
        k = match selector {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };
        round += 1;
        if round >= 64 && last <= round - 32 {
            break;
        }
    }
    k[..32].try_into().unwrap()
}

// ---- fixtures ----

fn trailer() -> Dictionary {
    let mut trailer = Dictionary::new();
    trailer.set(
        "ID",
        Object::Array(vec![
            Object::string(b"fixture-id-0".to_vec()),
            Object::string(b"fixture-id-1".to_vec()),
        ]),
    );
    trailer
}

fn seeded_rng() -> Box<StdRng> {
    Box::new(StdRng::seed_from_u64(0x5EED))
}

/// Encryption dictionary skeleton for the RC4 revisions, with O/U filled
/// in afterwards.
fn rc4_encrypt_dict(r: i64, v: i64, length_bits: i64, p: i32) -> Dictionary {
    let mut encrypt = Dictionary::new();
    encrypt.set("Filter", Object::name("Standard"));
    encrypt.set("V", Object::Integer(v));
    encrypt.set("R", Object::Integer(r));
    encrypt.set("Length", Object::Integer(length_bits));
    encrypt.set("O", Object::string(vec![0u8; 32]));
    encrypt.set("U", Object::string(vec![0u8; 32]));
    encrypt.set("P", Object::Integer(p as i64));
    encrypt
}

/// Produce a complete RC4 encryption dictionary for the given passwords by
/// running the write-side algorithms on a scratch handler.
fn written_rc4_dict(
    r: i64,
    v: i64,
    length_bits: i64,
    p: i32,
    user_pass: &[u8],
    owner_pass: &[u8],
) -> Dictionary {
    let mut dict = rc4_encrypt_dict(r, v, length_bits, p);
    let mut scratch =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();

    let o = scratch.alg3(user_pass, owner_pass);
    scratch.o = o.clone();
    let (u, _) = if r == 2 {
        scratch.alg4(user_pass)
    } else {
        scratch.alg5(user_pass)
    };

    dict.set("O", Object::string(o));
    dict.set("U", Object::string(u));
    dict
}

struct R6Fixture {
    encrypt: Dictionary,
    file_key: [u8; 32],
}

fn build_r6_document(user_pass: &[u8], owner_pass: &[u8], p: i32) -> R6Fixture {
    let file_key = [0xA7u8; 32];
    let zero_iv = [0u8; 16];

    // U: check hash, validation salt, key salt.
    let uvs = *b"uValSalt";
    let uks = *b"uKeySalt";
    let mut data = user_pass.to_vec();
    data.extend_from_slice(&uvs);
    let mut u = hash_r6(&data, user_pass, b"").to_vec();
    u.extend_from_slice(&uvs);
    u.extend_from_slice(&uks);

    // UE: file key wrapped with the user intermediate key.
    let mut data = user_pass.to_vec();
    data.extend_from_slice(&uks);
    let user_ikey = hash_r6(&data, user_pass, b"");
    let mut ue = file_key.to_vec();
    aes256_cbc_encrypt(&user_ikey, &zero_iv, &mut ue);

    // O hashes over the complete 48-byte U.
    let ovs = *b"oValSalt";
    let oks = *b"oKeySalt";
    let mut data = owner_pass.to_vec();
    data.extend_from_slice(&ovs);
    data.extend_from_slice(&u);
    let mut o = hash_r6(&data, owner_pass, &u).to_vec();
    o.extend_from_slice(&ovs);
    o.extend_from_slice(&oks);

    let mut data = owner_pass.to_vec();
    data.extend_from_slice(&oks);
    data.extend_from_slice(&u);
    let owner_ikey = hash_r6(&data, owner_pass, &u);
    let mut oe = file_key.to_vec();
    aes256_cbc_encrypt(&owner_ikey, &zero_iv, &mut oe);

    // Perms: P (little endian), reserved, 'T' for EncryptMetadata, "adb".
    let mut perms = [0u8; 16];
    perms[..4].copy_from_slice(&p.to_le_bytes());
    perms[4..8].copy_from_slice(&[0xFF; 4]);
    perms[8] = b'T';
    perms[9..12].copy_from_slice(b"adb");
    perms[12..16].copy_from_slice(b"rand");
    aes256_ecb_encrypt(&file_key, &mut perms);

    let mut cf_entry = Dictionary::new();
    cf_entry.set("Type", Object::name("CryptFilter"));
    cf_entry.set("CFM", Object::name("AESV3"));
    cf_entry.set("Length", Object::Integer(32));
    let mut cf = Dictionary::new();
    cf.set("StdCF", Object::Dictionary(cf_entry));

    let mut encrypt = Dictionary::new();
    encrypt.set("Filter", Object::name("Standard"));
    encrypt.set("V", Object::Integer(5));
    encrypt.set("R", Object::Integer(6));
    encrypt.set("Length", Object::Integer(256));
    encrypt.set("CF", Object::Dictionary(cf));
    encrypt.set("StrF", Object::name("StdCF"));
    encrypt.set("StmF", Object::name("StdCF"));
    encrypt.set("O", Object::string(o));
    encrypt.set("U", Object::string(u));
    encrypt.set("OE", Object::string(oe));
    encrypt.set("UE", Object::string(ue));
    encrypt.set("P", Object::Integer(p as i64));
    encrypt.set("Perms", Object::string(perms.to_vec()));

    R6Fixture { encrypt, file_key }
}

// ---- RC4 document round-trips ----

#[test]
fn test_rc4_r2_document_roundtrip() {
    let dict = written_rc4_dict(2, 1, 40, -4, b"user123", b"owner123");

    let mut objects: BTreeMap<ObjectRef, Object> = BTreeMap::new();
    objects.insert(
        ObjectRef::new(1, 0),
        Object::string(b"first string".to_vec()),
    );
    let mut info = Dictionary::new();
    info.set("Title", Object::string(b"A Title".to_vec()));
    objects.insert(ObjectRef::new(2, 0), Object::Dictionary(info));
    objects.insert(
        ObjectRef::new(3, 0),
        Object::Stream(Stream::new(Dictionary::new(), b"content stream".to_vec())),
    );
    let plaintext = objects.clone();

    // Writer side: encrypt with the user password.
    let mut writer =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    assert!(writer.authenticate(b"user123").unwrap());
    writer.encrypt_document(&mut objects).unwrap();
    assert_ne!(objects, plaintext);

    // Reader side: a fresh handler, authenticated with the owner password.
    let mut reader =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    assert!(reader.authenticate(b"owner123").unwrap());
    reader.decrypt_document(&mut objects).unwrap();
    assert_eq!(objects, plaintext);
}

#[test]
fn test_rc4_r3_document_roundtrip() {
    let dict = written_rc4_dict(3, 2, 128, -4, b"user456", b"owner456");

    let mut objects: BTreeMap<ObjectRef, Object> = BTreeMap::new();
    objects.insert(
        ObjectRef::new(11, 0),
        Object::Array(vec![
            Object::string(b"array element".to_vec()),
            Object::Integer(17),
        ]),
    );
    objects.insert(
        ObjectRef::new(12, 2),
        Object::string(b"generation two".to_vec()),
    );
    let plaintext = objects.clone();

    let mut writer =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    assert!(writer.authenticate(b"user456").unwrap());
    writer.encrypt_document(&mut objects).unwrap();

    let mut reader =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    assert!(reader.authenticate(b"user456").unwrap());
    reader.decrypt_document(&mut objects).unwrap();
    assert_eq!(objects, plaintext);
}

#[test]
fn test_rc4_wrong_password_is_false_not_error() {
    let dict = written_rc4_dict(3, 2, 128, -4, b"user", b"owner");
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    assert!(!handler.authenticate(b"intruder").unwrap());
    assert!(!handler.is_authenticated());
}

#[test]
fn test_check_access_rights_rc4() {
    let p = -13; // printing and modify denied
    let dict = written_rc4_dict(3, 2, 128, p, b"user", b"owner");
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();

    let (ok, perms) = handler.check_access_rights(b"owner").unwrap();
    assert!(ok);
    assert_eq!(perms, AccessPermissions::all());

    let (ok, perms) = handler.check_access_rights(b"user").unwrap();
    assert!(ok);
    assert!(!perms.printing);
    assert!(!perms.modify);
    assert!(perms.annotate);
    assert!(perms.full_print_quality);

    let (ok, perms) = handler.check_access_rights(b"intruder").unwrap();
    assert!(!ok);
    assert_eq!(perms, AccessPermissions::default());
}

// ---- AES-128 crypt filters (V=4, R=4) ----

fn aesv2_dict(p: i32) -> Dictionary {
    let mut cf_entry = Dictionary::new();
    cf_entry.set("Type", Object::name("CryptFilter"));
    cf_entry.set("CFM", Object::name("AESV2"));
    cf_entry.set("Length", Object::Integer(16));
    let mut cf = Dictionary::new();
    cf.set("StdCF", Object::Dictionary(cf_entry));

    let mut encrypt = rc4_encrypt_dict(4, 4, 128, p);
    encrypt.set("CF", Object::Dictionary(cf));
    encrypt.set("StrF", Object::name("StdCF"));
    encrypt.set("StmF", Object::name("StdCF"));
    encrypt
}

fn written_aesv2_dict(p: i32, user_pass: &[u8], owner_pass: &[u8]) -> Dictionary {
    let mut dict = aesv2_dict(p);
    let mut scratch =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    let o = scratch.alg3(user_pass, owner_pass);
    scratch.o = o.clone();
    let (u, _) = scratch.alg5(user_pass);
    dict.set("O", Object::string(o));
    dict.set("U", Object::string(u));
    dict
}

#[test]
fn test_aesv2_document_roundtrip() {
    let dict = written_aesv2_dict(-4, b"user789", b"owner789");

    let mut objects: BTreeMap<ObjectRef, Object> = BTreeMap::new();
    objects.insert(
        ObjectRef::new(7, 0),
        Object::string(b"an AES encrypted string of awkward length".to_vec()),
    );
    objects.insert(
        ObjectRef::new(8, 0),
        Object::Stream(Stream::new(Dictionary::new(), vec![0x42; 100])),
    );
    let plaintext = objects.clone();

    let mut writer =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    assert!(writer.authenticate(b"user789").unwrap());
    writer.encrypt_document(&mut objects).unwrap();

    // AES ciphertext carries a 16-byte IV and PKCS padding.
    if let Object::Stream(stream) = &objects[&ObjectRef::new(8, 0)] {
        assert_eq!(stream.data.len(), 16 + 112);
        assert_eq!(stream.dict.get_integer("Length"), Some(128));
    } else {
        panic!("stream expected");
    }

    let mut reader =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    assert!(reader.authenticate(b"owner789").unwrap());
    reader.decrypt_document(&mut objects).unwrap();

    // Length entries were rewritten on both passes.
    if let Object::Stream(stream) = &objects[&ObjectRef::new(8, 0)] {
        assert_eq!(stream.dict.get_integer("Length"), Some(100));
    }
    assert_eq!(objects, plaintext);
}

#[test]
fn test_crypt_filter_stream_override_identity() {
    let dict = written_aesv2_dict(-4, b"user", b"owner");
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&dict, &trailer(), seeded_rng()).unwrap();
    assert!(handler.authenticate(b"user").unwrap());

    // A stream whose Filter array leads with Crypt and whose DecodeParms
    // name the Identity filter passes through untouched.
    let mut parms = Dictionary::new();
    parms.set("Name", Object::name("Identity"));
    let mut stream_dict = Dictionary::new();
    stream_dict.set("Filter", Object::Array(vec![Object::name("Crypt")]));
    stream_dict.set("DecodeParms", Object::Dictionary(parms));

    let payload = b"already plaintext".to_vec();
    let mut object = Object::Stream(Stream::new(stream_dict, payload.clone()));
    handler.encrypt_object(ObjectRef::new(30, 0), &mut object).unwrap();

    if let Object::Stream(stream) = &object {
        assert_eq!(stream.data, payload);
    } else {
        panic!("stream expected");
    }
}

// ---- AES-256 (V=5, R=6) ----

#[test]
fn test_r6_user_password_authenticates() {
    let fixture = build_r6_document(b"user-r6", b"owner-r6", -4);
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&fixture.encrypt, &trailer(), seeded_rng())
            .unwrap();

    assert!(handler.authenticate(b"user-r6").unwrap());
    assert_eq!(handler.encryption_key(), Some(&fixture.file_key[..]));
}

#[test]
fn test_r6_owner_password_authenticates() {
    let fixture = build_r6_document(b"user-r6", b"owner-r6", -4);
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&fixture.encrypt, &trailer(), seeded_rng())
            .unwrap();

    assert!(handler.authenticate(b"owner-r6").unwrap());
    assert_eq!(handler.encryption_key(), Some(&fixture.file_key[..]));
}

#[test]
fn test_r6_wrong_password_rejected() {
    let fixture = build_r6_document(b"user-r6", b"owner-r6", -4);
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&fixture.encrypt, &trailer(), seeded_rng())
            .unwrap();
    assert!(!handler.authenticate(b"not the password").unwrap());
    assert!(!handler.is_authenticated());
}

#[test]
fn test_r6_empty_user_password_fallback() {
    // Documents protected with the default (empty) user password open with
    // any supplied password via the fallback.
    let fixture = build_r6_document(b"", b"owner-r6", -4);
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&fixture.encrypt, &trailer(), seeded_rng())
            .unwrap();
    assert!(handler.authenticate(b"whatever").unwrap());
    assert_eq!(handler.encryption_key(), Some(&fixture.file_key[..]));
}

#[test]
fn test_r6_check_access_rights() {
    let p = -13;
    let fixture = build_r6_document(b"user-r6", b"owner-r6", p);
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&fixture.encrypt, &trailer(), seeded_rng())
            .unwrap();

    let (ok, perms) = handler.check_access_rights(b"owner-r6").unwrap();
    assert!(ok);
    assert_eq!(perms, AccessPermissions::all());

    let (ok, perms) = handler.check_access_rights(b"user-r6").unwrap();
    assert!(ok);
    assert_eq!(perms, AccessPermissions::from_p(p));

    let (ok, _) = handler.check_access_rights(b"guess").unwrap();
    assert!(!ok);
}

#[test]
fn test_r6_tampered_perms_is_an_error() {
    let fixture = build_r6_document(b"user-r6", b"owner-r6", -4);
    let mut encrypt = fixture.encrypt.clone();
    let mut tampered = encrypt.get_str_bytes("Perms").unwrap().to_vec();
    tampered[0] ^= 0x80;
    encrypt.set("Perms", Object::string(tampered));

    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&encrypt, &trailer(), seeded_rng()).unwrap();
    let result = handler.authenticate(b"user-r6");
    assert!(matches!(result, Err(Error::PermissionsValidation(_))));
}

#[test]
fn test_aesv3_walker_roundtrip_block_aligned() {
    let fixture = build_r6_document(b"user-r6", b"owner-r6", -4);
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&fixture.encrypt, &trailer(), seeded_rng())
            .unwrap();
    assert!(handler.authenticate(b"user-r6").unwrap());

    let payload = vec![0x31u8; 32];
    let mut object = Object::string(payload.clone());
    handler.encrypt_object(ObjectRef::new(40, 0), &mut object).unwrap();
    assert_eq!(object.as_str_bytes().unwrap().len(), 16 + 32);

    handler.reset_pass_state();
    handler.decrypt_object(ObjectRef::new(40, 0), &mut object).unwrap();
    assert_eq!(object.as_str_bytes().unwrap(), payload);
}

#[test]
fn test_aesv3_decrypt_keeps_pkcs_padding() {
    // Writers pad AES-256 strings like any other AES payload; the walker
    // hands the padding back to the caller untouched.
    let fixture = build_r6_document(b"user-r6", b"owner-r6", -4);
    let mut handler =
        StandardSecurityHandler::from_dicts_with_rng(&fixture.encrypt, &trailer(), seeded_rng())
            .unwrap();
    assert!(handler.authenticate(b"user-r6").unwrap());

    let mut padded = b"data".to_vec();
    padded.extend(std::iter::repeat(12u8).take(12));
    let iv = [0x11u8; 16];
    let mut ciphertext = padded.clone();
    aes256_cbc_encrypt(&fixture.file_key, &iv, &mut ciphertext);

    let mut wire = iv.to_vec();
    wire.extend_from_slice(&ciphertext);
    let mut object = Object::string(wire);
    handler.decrypt_object(ObjectRef::new(41, 0), &mut object).unwrap();

    assert_eq!(object.as_str_bytes().unwrap(), padded);
}
