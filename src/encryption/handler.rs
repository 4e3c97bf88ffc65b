//! Standard security handler.
//!
//! Built from a document's encryption dictionary and trailer at open time;
//! authenticates passwords, exposes access permissions, and drives the
//! object-tree decryption/encryption walkers.

use std::collections::HashSet;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::encryption::crypt_filters::CryptFilterRegistry;
use crate::error::{Error, Result};
use crate::object::{Dictionary, ObjectRef};

/// Access permissions decoded from the P entry.
///
/// Bit positions (1-indexed, per the standard security handler): 3 printing,
/// 4 modify, 5 extract graphics, 6 annotate, 9 fill forms, 10 extraction for
/// accessibility, 11 rotate/insert pages, 12 full-quality printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessPermissions {
    /// Print the document
    pub printing: bool,
    /// Modify document contents
    pub modify: bool,
    /// Copy text and graphics
    pub extract_graphics: bool,
    /// Add or modify annotations
    pub annotate: bool,
    /// Fill in form fields even when annotation is disabled
    pub fill_forms: bool,
    /// Extract content for accessibility purposes
    pub disability_extract: bool,
    /// Rotate pages, insert pages, edit page order
    pub rotate_insert: bool,
    /// Print at full quality (otherwise low resolution only)
    pub full_print_quality: bool,
}

impl AccessPermissions {
    /// Decode permissions from a P value.
    pub fn from_p(p: i32) -> Self {
        Self {
            printing: p & (1 << 2) != 0,
            modify: p & (1 << 3) != 0,
            extract_graphics: p & (1 << 4) != 0,
            annotate: p & (1 << 5) != 0,
            fill_forms: p & (1 << 8) != 0,
            disability_extract: p & (1 << 9) != 0,
            rotate_insert: p & (1 << 10) != 0,
            full_print_quality: p & (1 << 11) != 0,
        }
    }

    /// Encode the permission bits back into a P value. Reserved bits are
    /// left clear; writers OR in their own convention.
    pub fn as_p(&self) -> i32 {
        let mut p = 0i32;
        if self.printing {
            p |= 1 << 2;
        }
        if self.modify {
            p |= 1 << 3;
        }
        if self.extract_graphics {
            p |= 1 << 4;
        }
        if self.annotate {
            p |= 1 << 5;
        }
        if self.fill_forms {
            p |= 1 << 8;
        }
        if self.disability_extract {
            p |= 1 << 9;
        }
        if self.rotate_insert {
            p |= 1 << 10;
        }
        if self.full_print_quality {
            p |= 1 << 11;
        }
        p
    }

    /// Every permission granted; what an owner password yields.
    pub fn all() -> Self {
        Self {
            printing: true,
            modify: true,
            extract_graphics: true,
            annotate: true,
            fill_forms: true,
            disability_extract: true,
            rotate_insert: true,
            full_print_quality: true,
        }
    }
}

/// Standard security handler state for one document.
///
/// Holds the encryption dictionary fields, the crypt filter registry, the
/// document key once a password has authenticated, and the walker's
/// per-pass memo sets.
pub struct StandardSecurityHandler {
    /// Security handler name; always `Standard`
    pub filter: String,
    /// Optional SubFilter name
    pub sub_filter: Option<String>,
    /// Algorithm version (V entry, default 0)
    pub v: i64,
    /// Document key length in bytes (Length entry, default 5)
    pub length: usize,
    /// Security handler revision (R entry, 2 through 6)
    pub r: i64,
    /// Owner password hash (O entry)
    pub o: Vec<u8>,
    /// User password hash (U entry)
    pub u: Vec<u8>,
    /// Owner-encrypted file key (OE entry, R >= 5)
    pub oe: Vec<u8>,
    /// User-encrypted file key (UE entry, R >= 5)
    pub ue: Vec<u8>,
    /// Permission bits (P entry)
    pub p: i32,
    /// Encrypted permissions (Perms entry, R = 6)
    pub perms: Vec<u8>,
    /// Whether document metadata is encrypted
    pub encrypt_metadata: bool,
    /// First element of the trailer ID array
    pub id0: Vec<u8>,

    pub(crate) filters: CryptFilterRegistry,
    pub(crate) encryption_key: Vec<u8>,
    pub(crate) authenticated: bool,
    pub(crate) decrypted: HashSet<ObjectRef>,
    pub(crate) encrypted: HashSet<ObjectRef>,
    pub(crate) rng: Box<dyn RngCore>,
}

impl std::fmt::Debug for StandardSecurityHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardSecurityHandler")
            .field("v", &self.v)
            .field("r", &self.r)
            .field("length", &self.length)
            .field("p", &self.p)
            .field("encrypt_metadata", &self.encrypt_metadata)
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

impl StandardSecurityHandler {
    /// Build the handler from the trailer's `Encrypt` dictionary and the
    /// trailer itself (for the `ID` array), using the operating system RNG.
    pub fn from_dicts(encrypt: &Dictionary, trailer: &Dictionary) -> Result<Self> {
        Self::from_dicts_with_rng(encrypt, trailer, Box::new(OsRng))
    }

    /// Like [`from_dicts`](Self::from_dicts) but with a caller-supplied
    /// random source, so IV and salt generation can be made deterministic.
    pub fn from_dicts_with_rng(
        encrypt: &Dictionary,
        trailer: &Dictionary,
        rng: Box<dyn RngCore>,
    ) -> Result<Self> {
        let filter = encrypt
            .get("Filter")
            .ok_or(Error::MissingDictEntry("Filter"))?
            .as_name()
            .ok_or(Error::TypeMismatch {
                entry: "Filter",
                expected: "name",
            })?;
        if filter != "Standard" {
            return Err(Error::UnsupportedEncryption(format!(
                "security handler {}",
                filter
            )));
        }

        let sub_filter = encrypt.get_name("SubFilter").map(str::to_string);

        let length_bits = encrypt.get_integer("Length").unwrap_or(40);
        if length_bits <= 0 || length_bits % 8 != 0 {
            return Err(Error::MalformedLength {
                what: "encryption key",
                len: length_bits as usize,
            });
        }
        let length = (length_bits / 8) as usize;

        let v = encrypt.get_integer("V").unwrap_or(0);
        let filters = match v {
            0 => CryptFilterRegistry::default(),
            1 | 2 => CryptFilterRegistry::rc4_default(length),
            4 | 5 => CryptFilterRegistry::from_encrypt_dict(encrypt)?,
            other => {
                return Err(Error::UnsupportedEncryption(format!(
                    "algorithm V={}",
                    other
                )));
            }
        };

        let r = encrypt
            .get_integer("R")
            .ok_or(Error::MissingDictEntry("R"))?;
        if r < 2 || r > 6 {
            return Err(Error::UnsupportedEncryption(format!("revision R={}", r)));
        }

        let o = encrypt
            .get_str_bytes("O")
            .ok_or(Error::MissingDictEntry("O"))?
            .to_vec();
        let u = encrypt
            .get_str_bytes("U")
            .ok_or(Error::MissingDictEntry("U"))?
            .to_vec();
        if r >= 5 {
            // The standard asks for exactly 48 bytes; some writers pad.
            if o.len() < 48 {
                return Err(Error::MalformedLength {
                    what: "O entry",
                    len: o.len(),
                });
            }
            if u.len() < 48 {
                return Err(Error::MalformedLength {
                    what: "U entry",
                    len: u.len(),
                });
            }
        } else {
            if o.len() != 32 {
                return Err(Error::MalformedLength {
                    what: "O entry",
                    len: o.len(),
                });
            }
            if u.len() != 32 {
                // Tolerated: the document can still authenticate via O.
                log::warn!("U entry is {} bytes, expected 32", u.len());
            }
        }

        let (oe, ue) = if r >= 5 {
            let oe = encrypt
                .get_str_bytes("OE")
                .ok_or(Error::MissingDictEntry("OE"))?
                .to_vec();
            if oe.len() != 32 {
                return Err(Error::MalformedLength {
                    what: "OE entry",
                    len: oe.len(),
                });
            }
            let ue = encrypt
                .get_str_bytes("UE")
                .ok_or(Error::MissingDictEntry("UE"))?
                .to_vec();
            if ue.len() != 32 {
                return Err(Error::MalformedLength {
                    what: "UE entry",
                    len: ue.len(),
                });
            }
            (oe, ue)
        } else {
            (Vec::new(), Vec::new())
        };

        let p = encrypt
            .get_integer("P")
            .ok_or(Error::MissingDictEntry("P"))? as i32;

        let perms = if r == 6 {
            let perms = encrypt
                .get_str_bytes("Perms")
                .ok_or(Error::MissingDictEntry("Perms"))?
                .to_vec();
            if perms.len() != 16 {
                return Err(Error::MalformedLength {
                    what: "Perms entry",
                    len: perms.len(),
                });
            }
            perms
        } else {
            Vec::new()
        };

        let encrypt_metadata = encrypt.get_bool("EncryptMetadata").unwrap_or(true);

        // Strictly the trailer ID is required for encrypted files, but not
        // everyone writes one.
        let id0 = trailer
            .get("ID")
            .and_then(|obj| obj.as_array())
            .and_then(|arr| arr.first())
            .and_then(|obj| obj.as_str_bytes())
            .map(|bytes| bytes.to_vec())
            .unwrap_or_else(|| {
                log::debug!("trailer ID array missing or invalid");
                Vec::new()
            });

        log::info!(
            "document encrypted with {} handler, V={} R={} length={} bytes",
            filter,
            v,
            r,
            length
        );

        Ok(Self {
            filter: filter.to_string(),
            sub_filter,
            v,
            length,
            r,
            o,
            u,
            oe,
            ue,
            p,
            perms,
            encrypt_metadata,
            id0,
            filters,
            encryption_key: Vec::new(),
            authenticated: false,
            decrypted: HashSet::new(),
            encrypted: HashSet::new(),
            rng,
        })
    }

    /// Whether a password has successfully authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The derived document key, once authenticated.
    pub fn encryption_key(&self) -> Option<&[u8]> {
        if self.encryption_key.is_empty() {
            None
        } else {
            Some(&self.encryption_key)
        }
    }

    /// Permissions implied by the P entry.
    pub fn permissions(&self) -> AccessPermissions {
        AccessPermissions::from_p(self.p)
    }

    /// Check whether `password` opens the document, deriving and storing
    /// the document key on success.
    ///
    /// A wrong password is `Ok(false)`; errors indicate structural problems
    /// with the encryption dictionary.
    pub fn authenticate(&mut self, password: &[u8]) -> Result<bool> {
        self.authenticated = false;

        if self.r >= 5 {
            let ok = self.alg2a(password)?;
            self.authenticated = ok;
            if !ok {
                log::warn!("password authentication failed (R={})", self.r);
            }
            return Ok(ok);
        }

        // User password first, then owner.
        if self.alg6(password)? {
            log::trace!("authenticated with user password");
            self.authenticated = true;
            return Ok(true);
        }
        if self.alg7(password)? {
            log::trace!("authenticated with owner password");
            self.authenticated = true;
            return Ok(true);
        }

        log::warn!("password authentication failed (R={})", self.r);
        Ok(false)
    }

    /// Check access rights for a password: the owner password grants every
    /// permission, the user password grants what P implies, anything else
    /// cannot open the document at all.
    pub fn check_access_rights(&mut self, password: &[u8]) -> Result<(bool, AccessPermissions)> {
        let is_owner = if self.r >= 5 {
            self.alg12(password)?.is_some()
        } else {
            self.alg7(password)?
        };
        if is_owner {
            return Ok((true, AccessPermissions::all()));
        }

        let is_user = if self.r >= 5 {
            self.alg11(password)?.is_some()
        } else {
            self.alg6(password)?
        };
        if is_user {
            return Ok((true, self.permissions()));
        }

        Ok((false, AccessPermissions::default()))
    }

    /// Clear the walker's already-decrypted / already-encrypted memo sets.
    /// Callers reset between passes over the same document.
    pub fn reset_pass_state(&mut self) {
        self.decrypted.clear();
        self.encrypted.clear();
    }
}
