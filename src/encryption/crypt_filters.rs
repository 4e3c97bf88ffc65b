//! Crypt filter registry for V=4 and V=5 encryption dictionaries.
//!
//! The `CF` dictionary maps filter names to crypt filters; `StrF` and `StmF`
//! select which named filter strings and streams use. The `Identity`
//! pass-through is always present and cannot be redefined.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::object::Dictionary;

/// Name of the built-in pass-through crypt filter.
pub const IDENTITY_FILTER: &str = "Identity";

/// Name of the implicit filter used by V=1/V=2 documents.
pub const DEFAULT_FILTER: &str = "Default";

/// Crypt filter method from the `CFM` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptFilterMethod {
    /// Pass data through unchanged
    None,
    /// RC4 keystream
    V2,
    /// AES-128 in CBC mode (PDF 1.6)
    Aesv2,
    /// AES-256 in CBC mode (PDF 2.0)
    Aesv3,
}

impl CryptFilterMethod {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "V2" => Some(CryptFilterMethod::V2),
            "AESV2" => Some(CryptFilterMethod::Aesv2),
            "AESV3" => Some(CryptFilterMethod::Aesv3),
            _ => None,
        }
    }
}

/// A named crypt filter: method plus key length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptFilter {
    /// Encryption method
    pub method: CryptFilterMethod,
    /// Key length in bytes
    pub length: usize,
}

impl Default for CryptFilter {
    fn default() -> Self {
        // The Identity pass-through.
        Self {
            method: CryptFilterMethod::None,
            length: 0,
        }
    }
}

/// Registry of named crypt filters plus the string/stream selections.
#[derive(Debug, Clone)]
pub struct CryptFilterRegistry {
    filters: HashMap<String, CryptFilter>,
    /// Filter applied to strings (`StrF`)
    pub string_filter: String,
    /// Filter applied to streams (`StmF`)
    pub stream_filter: String,
}

impl Default for CryptFilterRegistry {
    fn default() -> Self {
        let mut filters = HashMap::new();
        filters.insert(IDENTITY_FILTER.to_string(), CryptFilter::default());
        Self {
            filters,
            string_filter: IDENTITY_FILTER.to_string(),
            stream_filter: IDENTITY_FILTER.to_string(),
        }
    }
}

impl CryptFilterRegistry {
    /// Registry for V=1/V=2 documents: a single RC4 filter named `Default`
    /// with the document key length.
    pub(crate) fn rc4_default(key_length: usize) -> Self {
        let mut registry = Self::default();
        registry.filters.insert(
            DEFAULT_FILTER.to_string(),
            CryptFilter {
                method: CryptFilterMethod::V2,
                length: key_length,
            },
        );
        registry.string_filter = DEFAULT_FILTER.to_string();
        registry.stream_filter = DEFAULT_FILTER.to_string();
        registry
    }

    /// Load the registry from an encryption dictionary's `CF`, `StrF` and
    /// `StmF` entries.
    pub(crate) fn from_encrypt_dict(ed: &Dictionary) -> Result<Self> {
        let mut registry = Self::default();

        let cf = match ed.get("CF") {
            None => None,
            Some(obj) => Some(obj.as_dict().ok_or(Error::TypeMismatch {
                entry: "CF",
                expected: "dictionary",
            })?),
        };

        if let Some(cf) = cf {
            for (name, value) in cf.iter() {
                if name == IDENTITY_FILTER {
                    log::warn!("cannot overwrite the Identity crypt filter, skipping");
                    continue;
                }
                let dict = value.as_dict().ok_or(Error::TypeMismatch {
                    entry: "CF entry",
                    expected: "dictionary",
                })?;
                registry
                    .filters
                    .insert(name.clone(), parse_crypt_filter(dict)?);
            }
        }

        if let Some(strf) = ed.get_name("StrF") {
            if !registry.filters.contains_key(strf) {
                return Err(Error::UnsupportedCryptFilter(strf.to_string()));
            }
            registry.string_filter = strf.to_string();
        }
        if let Some(stmf) = ed.get_name("StmF") {
            if !registry.filters.contains_key(stmf) {
                return Err(Error::UnsupportedCryptFilter(stmf.to_string()));
            }
            registry.stream_filter = stmf.to_string();
        }

        Ok(registry)
    }

    /// Look up a filter by name.
    pub fn get(&self, name: &str) -> Option<CryptFilter> {
        self.filters.get(name).copied()
    }
}

fn parse_crypt_filter(dict: &Dictionary) -> Result<CryptFilter> {
    if let Some(type_name) = dict.get_name("Type") {
        if type_name != "CryptFilter" {
            return Err(Error::UnsupportedCryptFilter(format!(
                "CF entry with Type {}",
                type_name
            )));
        }
    }

    let method = dict
        .get_name("CFM")
        .and_then(CryptFilterMethod::from_name)
        .ok_or_else(|| {
            Error::UnsupportedCryptFilter(
                dict.get_name("CFM").unwrap_or("None").to_string(),
            )
        })?;

    let mut length = 0usize;
    if let Some(raw) = dict.get_integer("Length") {
        if raw % 8 != 0 {
            return Err(Error::MalformedLength {
                what: "crypt filter key",
                len: raw as usize,
            });
        }
        let mut len = raw;
        if len < 5 || len > 16 {
            if len == 64 || len == 128 {
                // The standard handler keys are 5-16 bytes; some writers
                // store bits here instead.
                log::warn!(
                    "crypt filter Length {} looks like bits, assuming bits",
                    len
                );
                len /= 8;
            } else if !(len == 32 && method == CryptFilterMethod::Aesv3) {
                return Err(Error::MalformedLength {
                    what: "crypt filter key",
                    len: len as usize,
                });
            }
        }
        length = len as usize;
    }

    Ok(CryptFilter { method, length })
}
