//! Key derivation and password authentication for the standard security
//! handler, revisions 2 through 6.
//!
//! Revisions 2-4 are MD5/RC4 based; revisions 5 and 6 derive a 32-byte file
//! key via the SHA-2 family, with revision 6 using the iterated hash of
//! Algorithm 2.B. All byte orders are explicit; P is always hashed as four
//! little-endian bytes.

use md5::{Digest, Md5};
use sha2::{Sha256, Sha384, Sha512};

use crate::encryption::handler::StandardSecurityHandler;
use crate::encryption::{aes, rc4};
use crate::error::{Error, Result};

/// Padding string used when canonicalizing passwords (32 bytes).
pub(crate) const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

/// Truncate or pad a password to exactly 32 bytes with the standard pad.
pub(crate) fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let n = password.len().min(32);
    padded[..n].copy_from_slice(&password[..n]);
    padded[n..].copy_from_slice(&PAD[..32 - n]);
    padded
}

/// Constant-time byte comparison; length mismatches compare unequal.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

impl StandardSecurityHandler {
    /// Compute the document key from a user password (revisions 2-4).
    pub fn alg2(&self, password: &[u8]) -> Vec<u8> {
        let mut hasher = Md5::new();
        hasher.update(pad_password(password));
        hasher.update(&self.o);
        hasher.update((self.p as u32).to_le_bytes());
        hasher.update(&self.id0);
        if self.r >= 4 && !self.encrypt_metadata {
            hasher.update([0xFF, 0xFF, 0xFF, 0xFF]);
        }
        let mut hash = hasher.finalize().to_vec();

        if self.r >= 3 {
            let n = self.length.min(16);
            for _ in 0..50 {
                hash = Md5::digest(&hash[..n]).to_vec();
            }
            hash.truncate(n);
        } else {
            hash.truncate(5);
        }
        hash
    }

    /// The RC4 key used when producing and checking the O entry.
    fn alg3_key(&self, password: &[u8]) -> Vec<u8> {
        let mut hash = Md5::digest(pad_password(password)).to_vec();
        if self.r >= 3 {
            for _ in 0..50 {
                hash = Md5::digest(&hash).to_vec();
            }
        }
        if self.r == 2 {
            hash.truncate(5);
        } else {
            hash.truncate(self.length.min(16));
        }
        hash
    }

    /// Compute the O entry from the passwords (an empty owner password
    /// falls back to the user password).
    pub fn alg3(&self, user_pass: &[u8], owner_pass: &[u8]) -> Vec<u8> {
        let key = if owner_pass.is_empty() {
            self.alg3_key(user_pass)
        } else {
            self.alg3_key(owner_pass)
        };

        let mut encrypted = rc4::rc4_crypt(&key, &pad_password(user_pass));
        if self.r >= 3 {
            for i in 1..=19u8 {
                let xored: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                encrypted = rc4::rc4_crypt(&xored, &encrypted);
            }
        }
        encrypted
    }

    /// Compute the U entry for revision 2. Returns (U, document key).
    pub fn alg4(&self, user_pass: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let key = self.alg2(user_pass);
        let u = rc4::rc4_crypt(&key, &PAD);
        (u, key)
    }

    /// Compute the U entry for revision 3 and up. Returns (U, document
    /// key). The trailing 16 bytes of U are random.
    pub fn alg5(&mut self, user_pass: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let key = self.alg2(user_pass);

        let mut hasher = Md5::new();
        hasher.update(PAD);
        hasher.update(&self.id0);
        let hash = hasher.finalize();

        let mut encrypted = rc4::rc4_crypt(&key, &hash);
        for i in 1..=19u8 {
            let xored: Vec<u8> = key.iter().map(|b| b ^ i).collect();
            encrypted = rc4::rc4_crypt(&xored, &encrypted);
        }

        let mut u = vec![0u8; 32];
        u[..16].copy_from_slice(&encrypted);
        self.rng.fill_bytes(&mut u[16..]);
        (u, key)
    }

    /// Authenticate the user password. Stores the document key on success.
    pub fn alg6(&mut self, user_pass: &[u8]) -> Result<bool> {
        let (generated, key) = if self.r == 2 {
            self.alg4(user_pass)
        } else {
            self.alg5(user_pass)
        };

        // Revision 3+ only defines the first 16 bytes of U; the rest is
        // arbitrary padding.
        let (gen_cmp, doc_cmp) = if self.r >= 3 {
            (
                &generated[..16.min(generated.len())],
                &self.u[..16.min(self.u.len())],
            )
        } else {
            (&generated[..], &self.u[..])
        };

        if constant_time_eq(gen_cmp, doc_cmp) {
            self.encryption_key = key;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Authenticate the owner password by recovering the user password
    /// from O and feeding it through the user check.
    pub fn alg7(&mut self, owner_pass: &[u8]) -> Result<bool> {
        let key = self.alg3_key(owner_pass);

        let user_pass = if self.r == 2 {
            rc4::rc4_crypt(&key, &self.o)
        } else {
            let mut buf = self.o.clone();
            for i in 0..20u8 {
                let xored: Vec<u8> = key.iter().map(|b| b ^ (19 - i)).collect();
                buf = rc4::rc4_crypt(&xored, &buf);
            }
            buf
        };

        self.alg6(&user_pass)
    }

    /// Retrieve the file key from the password for revisions 5 and 6.
    /// Returns false on a wrong password.
    pub(crate) fn alg2a(&mut self, password: &[u8]) -> Result<bool> {
        // Passwords are UTF-8, at most 127 bytes.
        let mut pass = &password[..password.len().min(127)];

        let owner_hash = self.alg12(pass)?;
        let (data, ekey, user_key) = if owner_hash.is_some() {
            let mut data = Vec::with_capacity(pass.len() + 8 + 48);
            data.extend_from_slice(pass);
            data.extend_from_slice(&self.o[40..48]); // owner key salt
            data.extend_from_slice(&self.u[..48]);
            (data, self.oe.clone(), self.u[..48].to_vec())
        } else {
            let mut user_hash = self.alg11(pass)?;
            if user_hash.is_none() && !pass.is_empty() {
                // Fall back to the default password, used consistently in
                // the key derivation below.
                pass = b"";
                user_hash = self.alg11(pass)?;
            }
            if user_hash.is_none() {
                return Ok(false);
            }
            let mut data = Vec::with_capacity(pass.len() + 8);
            data.extend_from_slice(pass);
            data.extend_from_slice(&self.u[40..48]); // user key salt
            (data, self.ue.clone(), Vec::new())
        };

        let intermediate = self.alg2b(&data, pass, &user_key)?;

        let mut file_key = ekey[..32].to_vec();
        aes::cbc_decrypt(&intermediate[..32], &[0u8; 16], &mut file_key)?;
        self.encryption_key = file_key;

        if self.r == 6 {
            self.alg13()?;
        }
        Ok(true)
    }

    /// Password hash for revisions 5 and 6. Revision 5 is a single
    /// SHA-256; revision 6 runs the iterated scheme below.
    pub(crate) fn alg2b(&self, data: &[u8], password: &[u8], user_key: &[u8]) -> Result<Vec<u8>> {
        if self.r == 5 {
            return Ok(Sha256::digest(data).to_vec());
        }
        alg2b_r6(data, password, user_key)
    }

    /// Authenticate the user password for revisions 5 and 6, returning the
    /// check hash when it matches U.
    pub(crate) fn alg11(&self, user_pass: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut data = Vec::with_capacity(user_pass.len() + 8);
        data.extend_from_slice(user_pass);
        data.extend_from_slice(&self.u[32..40]); // user validation salt

        let mut hash = self.alg2b(&data, user_pass, &[])?;
        hash.truncate(32);
        if constant_time_eq(&hash, &self.u[..32]) {
            Ok(Some(hash))
        } else {
            Ok(None)
        }
    }

    /// Authenticate the owner password for revisions 5 and 6, returning
    /// the check hash when it matches O.
    pub(crate) fn alg12(&self, owner_pass: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut data = Vec::with_capacity(owner_pass.len() + 8 + 48);
        data.extend_from_slice(owner_pass);
        data.extend_from_slice(&self.o[32..40]); // owner validation salt
        data.extend_from_slice(&self.u[..48]);

        let mut hash = self.alg2b(&data, owner_pass, &self.u[..48])?;
        hash.truncate(32);
        if constant_time_eq(&hash, &self.o[..32]) {
            Ok(Some(hash))
        } else {
            Ok(None)
        }
    }

    /// Validate the Perms entry against P (revision 6 only).
    pub(crate) fn alg13(&self) -> Result<()> {
        let mut perms = self.perms[..16].to_vec();
        aes::ecb_decrypt(&self.encryption_key[..32], &mut perms)?;

        if &perms[9..12] != b"adb" {
            return Err(Error::PermissionsValidation(
                "decoded permissions are invalid",
            ));
        }
        let p = i32::from_le_bytes([perms[0], perms[1], perms[2], perms[3]]);
        if p != self.p {
            return Err(Error::PermissionsValidation("permissions do not match P"));
        }
        Ok(())
    }
}

/// The revision 6 iterated hash.
///
/// Starting from SHA-256 of the input, each round AES-128-CBC encrypts 64
/// repetitions of (password, K, user key) with K's halves as key and IV,
/// picks SHA-256/384/512 from the encrypted block's first 16 bytes mod 3,
/// and rehashes. Stops once at least 64 rounds have run and the last byte
/// of the encrypted block is no greater than round - 32.
fn alg2b_r6(data: &[u8], password: &[u8], user_key: &[u8]) -> Result<Vec<u8>> {
    let mut k: Vec<u8> = Sha256::digest(data).to_vec();
    let mut round = 0usize;

    loop {
        let mut part = Vec::with_capacity(password.len() + k.len() + user_key.len());
        part.extend_from_slice(password);
        part.extend_from_slice(&k);
        part.extend_from_slice(user_key);

        let mut e = Vec::with_capacity(part.len() * 64);
        for _ in 0..64 {
            e.extend_from_slice(&part);
        }

        let mut iv = [0u8; 16];
        iv.copy_from_slice(&k[16..32]);
        aes::cbc_encrypt(&k[..16], &iv, &mut e)?;

        let selector: u32 = e[..16].iter().map(|&b| (b % 3) as u32).sum::<u32>() % 3;
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

    k.truncate(32);
    Ok(k)
}
