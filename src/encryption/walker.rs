//! Object-tree encryption and decryption.
//!
//! Walks a document's indirect objects, transforming every string and
//! stream payload in place with a key derived per object. Each indirect
//! object is processed at most once per pass, tracked by its reference.
//! References inside the tree are never chased; the caller resolves them
//! before walking.

use std::collections::BTreeMap;

use md5::{Digest, Md5};

use crate::encryption::crypt_filters::{CryptFilterMethod, DEFAULT_FILTER, IDENTITY_FILTER};
use crate::encryption::handler::StandardSecurityHandler;
use crate::encryption::{aes, rc4};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Decrypt,
    Encrypt,
}

impl StandardSecurityHandler {
    /// Decrypt every indirect object in the document. Requires a prior
    /// successful [`authenticate`](Self::authenticate).
    pub fn decrypt_document(&mut self, objects: &mut BTreeMap<ObjectRef, Object>) -> Result<()> {
        for (id, object) in objects.iter_mut() {
            self.decrypt_object(*id, object)?;
        }
        Ok(())
    }

    /// Encrypt every indirect object in the document.
    pub fn encrypt_document(&mut self, objects: &mut BTreeMap<ObjectRef, Object>) -> Result<()> {
        for (id, object) in objects.iter_mut() {
            self.encrypt_object(*id, object)?;
        }
        Ok(())
    }

    /// Decrypt a single indirect object in place. Repeated calls with the
    /// same reference are no-ops until [`reset_pass_state`](Self::reset_pass_state).
    pub fn decrypt_object(&mut self, id: ObjectRef, object: &mut Object) -> Result<()> {
        if !self.authenticated {
            return Err(Error::NotAuthenticated);
        }
        if !self.decrypted.insert(id) {
            log::trace!("{} already decrypted", id);
            return Ok(());
        }
        self.walk(object, id, Direction::Decrypt)
    }

    /// Encrypt a single indirect object in place, mirroring
    /// [`decrypt_object`](Self::decrypt_object).
    pub fn encrypt_object(&mut self, id: ObjectRef, object: &mut Object) -> Result<()> {
        if !self.authenticated {
            return Err(Error::NotAuthenticated);
        }
        if !self.encrypted.insert(id) {
            log::trace!("{} already encrypted", id);
            return Ok(());
        }
        self.walk(object, id, Direction::Encrypt)
    }

    fn walk(&mut self, object: &mut Object, id: ObjectRef, direction: Direction) -> Result<()> {
        match object {
            Object::Stream(stream) => {
                let filter = self.stream_crypt_filter(&stream.dict);
                if self.v >= 4 && filter == IDENTITY_FILTER {
                    return Ok(());
                }

                // The dictionary's own strings first, then the payload.
                self.walk_dict(&mut stream.dict, id, direction)?;

                let key = self.object_key(&filter, id)?;
                let payload = std::mem::take(&mut stream.data);
                stream.data = match direction {
                    Direction::Decrypt => self.decrypt_bytes(payload, &filter, &key)?,
                    Direction::Encrypt => self.encrypt_bytes(payload, &filter, &key)?,
                };
                stream
                    .dict
                    .set("Length", Object::Integer(stream.data.len() as i64));
                Ok(())
            }
            Object::String(bytes) => {
                let filter = if self.v >= 4 {
                    if self.filters.string_filter == IDENTITY_FILTER {
                        return Ok(());
                    }
                    self.filters.string_filter.clone()
                } else {
                    DEFAULT_FILTER.to_string()
                };

                let key = self.object_key(&filter, id)?;
                let payload = std::mem::take(bytes);
                *bytes = match direction {
                    Direction::Decrypt => self.decrypt_bytes(payload, &filter, &key)?,
                    Direction::Encrypt => self.encrypt_bytes(payload, &filter, &key)?,
                };
                Ok(())
            }
            Object::Array(items) => {
                for item in items.iter_mut() {
                    self.walk(item, id, direction)?;
                }
                Ok(())
            }
            Object::Dictionary(dict) => self.walk_dict(dict, id, direction),
            // Null, booleans, numbers, names carry no encrypted bytes, and
            // references are resolved by the caller.
            _ => Ok(()),
        }
    }

    fn walk_dict(
        &mut self,
        dict: &mut Dictionary,
        id: ObjectRef,
        direction: Direction,
    ) -> Result<()> {
        // Signature contents must stay byte-identical for later
        // validation, so they are never transformed.
        let is_signature = dict.get_name("Type") == Some("Sig");

        for (key, value) in dict.iter_mut() {
            if is_signature && key == "Contents" {
                continue;
            }
            // Back-links would revisit ancestors.
            if key == "Parent" || key == "Prev" || key == "Last" {
                continue;
            }
            self.walk(value, id, direction)?;
        }
        Ok(())
    }

    /// The crypt filter governing a stream: the document's stream filter,
    /// unless the stream names `Crypt` first in its Filter array, in which
    /// case `DecodeParms.Name` picks the filter (default Identity).
    fn stream_crypt_filter(&self, dict: &Dictionary) -> String {
        if self.v < 4 {
            return DEFAULT_FILTER.to_string();
        }

        let mut filter = self.filters.stream_filter.clone();
        if let Some(Object::Array(filters)) = dict.get("Filter") {
            if filters.first().and_then(Object::as_name) == Some("Crypt") {
                filter = IDENTITY_FILTER.to_string();
                if let Some(Object::Dictionary(parms)) = dict.get("DecodeParms") {
                    if let Some(name) = parms.get_name("Name") {
                        if self.filters.get(name).is_some() {
                            filter = name.to_string();
                        }
                    }
                }
            }
        }
        filter
    }

    /// Derive the key for one object: MD5 over the document key, the low
    /// three bytes of the object number, the low two bytes of the
    /// generation number, and the AESV2 salt, truncated to
    /// min(key length + 5, 16). AESV3 uses the document key unchanged.
    pub(crate) fn object_key(&self, filter: &str, id: ObjectRef) -> Result<Vec<u8>> {
        let cf = self
            .filters
            .get(filter)
            .ok_or_else(|| Error::UnsupportedCryptFilter(filter.to_string()))?;

        if cf.method == CryptFilterMethod::Aesv3 {
            return Ok(self.encryption_key.clone());
        }

        let ekey = &self.encryption_key;
        let mut hasher = Md5::new();
        hasher.update(ekey);
        hasher.update(&id.num.to_le_bytes()[..3]);
        hasher.update(&(id.gen as u32).to_le_bytes()[..2]);
        if cf.method == CryptFilterMethod::Aesv2 {
            hasher.update(b"sAlT");
        }
        let hash = hasher.finalize();

        let n = (ekey.len() + 5).min(16);
        Ok(hash[..n].to_vec())
    }

    /// Decrypt a buffer with the named crypt filter and per-object key.
    ///
    /// AESV2 strips the PKCS#5 padding; AESV3 hands the padded plaintext
    /// back unchanged.
    pub(crate) fn decrypt_bytes(
        &mut self,
        mut buf: Vec<u8>,
        filter: &str,
        key: &[u8],
    ) -> Result<Vec<u8>> {
        let cf = self
            .filters
            .get(filter)
            .ok_or_else(|| Error::UnsupportedCryptFilter(filter.to_string()))?;

        match cf.method {
            CryptFilterMethod::V2 => {
                rc4::Rc4::new(key).apply_keystream(&mut buf);
                Ok(buf)
            }
            CryptFilterMethod::Aesv2 | CryptFilterMethod::Aesv3 => {
                // The first 16 bytes are the CBC initialization vector.
                if buf.len() < aes::BLOCK_SIZE {
                    return Err(Error::MalformedLength {
                        what: "AES buffer",
                        len: buf.len(),
                    });
                }
                let mut iv = [0u8; aes::BLOCK_SIZE];
                iv.copy_from_slice(&buf[..aes::BLOCK_SIZE]);
                let mut data = buf.split_off(aes::BLOCK_SIZE);

                aes::cbc_decrypt(key, &iv, &mut data)?;
                if data.is_empty() {
                    return Ok(data);
                }

                if cf.method == CryptFilterMethod::Aesv2 {
                    let pad = data[data.len() - 1] as usize;
                    if pad >= data.len() {
                        return Err(Error::MalformedLength {
                            what: "AES padding",
                            len: pad,
                        });
                    }
                    data.truncate(data.len() - pad);
                }
                Ok(data)
            }
            CryptFilterMethod::None => Err(Error::UnsupportedCryptFilter(filter.to_string())),
        }
    }

    /// Encrypt a buffer with the named crypt filter and per-object key,
    /// prepending a fresh random IV for the AES methods. Only AESV2 pads;
    /// AESV3 callers must supply block-aligned input.
    pub(crate) fn encrypt_bytes(
        &mut self,
        mut buf: Vec<u8>,
        filter: &str,
        key: &[u8],
    ) -> Result<Vec<u8>> {
        let cf = self
            .filters
            .get(filter)
            .ok_or_else(|| Error::UnsupportedCryptFilter(filter.to_string()))?;

        match cf.method {
            CryptFilterMethod::V2 => {
                rc4::Rc4::new(key).apply_keystream(&mut buf);
                Ok(buf)
            }
            CryptFilterMethod::Aesv2 | CryptFilterMethod::Aesv3 => {
                if cf.method == CryptFilterMethod::Aesv2 {
                    let pad = aes::BLOCK_SIZE - buf.len() % aes::BLOCK_SIZE;
                    buf.extend(std::iter::repeat(pad as u8).take(pad));
                }

                let mut iv = [0u8; aes::BLOCK_SIZE];
                self.rng.fill_bytes(&mut iv);
                aes::cbc_encrypt(key, &iv, &mut buf)?;

                let mut out = Vec::with_capacity(aes::BLOCK_SIZE + buf.len());
                out.extend_from_slice(&iv);
                out.append(&mut buf);
                Ok(out)
            }
            CryptFilterMethod::None => Err(Error::UnsupportedCryptFilter(filter.to_string())),
        }
    }
}
