//! AES primitives for PDF encryption.
//!
//! Strings and streams use AES in CBC mode with a 16-byte IV stored in
//! front of the ciphertext; key length selects AES-128 (AESV2) or AES-256
//! (AESV3). Padding is handled by the callers, so the CBC helpers here work
//! on exact block multiples. The ECB wrapper exists for the revision 6
//! `Perms` check, which encrypts a single block pair without an IV.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{
    BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit,
};
use aes::{Aes128, Aes256};

use crate::error::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size in bytes.
pub(crate) const BLOCK_SIZE: usize = 16;

fn check_block_aligned(len: usize) -> Result<()> {
    if len % BLOCK_SIZE != 0 {
        return Err(Error::MalformedLength {
            what: "AES buffer",
            len,
        });
    }
    Ok(())
}

/// CBC-encrypt `buf` in place. The buffer must already be padded to a block
/// multiple; the key selects AES-128 or AES-256.
pub(crate) fn cbc_encrypt(key: &[u8], iv: &[u8; BLOCK_SIZE], buf: &mut [u8]) -> Result<()> {
    check_block_aligned(buf.len())?;
    let len = buf.len();
    match key.len() {
        16 => {
            let cipher = Aes128CbcEnc::new_from_slices(key, iv).map_err(|_| {
                Error::MalformedLength {
                    what: "AES key",
                    len: key.len(),
                }
            })?;
            cipher
                .encrypt_padded_mut::<NoPadding>(buf, len)
                .map_err(|_| Error::MalformedLength {
                    what: "AES buffer",
                    len,
                })?;
        }
        32 => {
            let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| {
                Error::MalformedLength {
                    what: "AES key",
                    len: key.len(),
                }
            })?;
            cipher
                .encrypt_padded_mut::<NoPadding>(buf, len)
                .map_err(|_| Error::MalformedLength {
                    what: "AES buffer",
                    len,
                })?;
        }
        other => {
            return Err(Error::MalformedLength {
                what: "AES key",
                len: other,
            });
        }
    }
    Ok(())
}

/// CBC-decrypt `buf` in place without removing padding.
pub(crate) fn cbc_decrypt(key: &[u8], iv: &[u8; BLOCK_SIZE], buf: &mut [u8]) -> Result<()> {
    check_block_aligned(buf.len())?;
    match key.len() {
        16 => {
            let cipher = Aes128CbcDec::new_from_slices(key, iv).map_err(|_| {
                Error::MalformedLength {
                    what: "AES key",
                    len: key.len(),
                }
            })?;
            let buf_len = buf.len();
            cipher
                .decrypt_padded_mut::<NoPadding>(buf)
                .map_err(|_| Error::MalformedLength {
                    what: "AES buffer",
                    len: buf_len,
                })?;
        }
        32 => {
            let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| {
                Error::MalformedLength {
                    what: "AES key",
                    len: key.len(),
                }
            })?;
            let buf_len = buf.len();
            cipher
                .decrypt_padded_mut::<NoPadding>(buf)
                .map_err(|_| Error::MalformedLength {
                    what: "AES buffer",
                    len: buf_len,
                })?;
        }
        other => {
            return Err(Error::MalformedLength {
                what: "AES key",
                len: other,
            });
        }
    }
    Ok(())
}

/// ECB-decrypt `buf` in place, block by block.
pub(crate) fn ecb_decrypt(key: &[u8], buf: &mut [u8]) -> Result<()> {
    check_block_aligned(buf.len())?;
    match key.len() {
        16 => {
            let cipher = Aes128::new_from_slice(key).map_err(|_| Error::MalformedLength {
                what: "AES key",
                len: key.len(),
            })?;
            for block in buf.chunks_exact_mut(BLOCK_SIZE) {
                cipher.decrypt_block(GenericArray::from_mut_slice(block));
            }
        }
        32 => {
            let cipher = Aes256::new_from_slice(key).map_err(|_| Error::MalformedLength {
                what: "AES key",
                len: key.len(),
            })?;
            for block in buf.chunks_exact_mut(BLOCK_SIZE) {
                cipher.decrypt_block(GenericArray::from_mut_slice(block));
            }
        }
        other => {
            return Err(Error::MalformedLength {
                what: "AES key",
                len: other,
            });
        }
    }
    Ok(())
}

/// ECB-encrypt `buf` in place, block by block.
pub(crate) fn ecb_encrypt(key: &[u8], buf: &mut [u8]) -> Result<()> {
    check_block_aligned(buf.len())?;
    match key.len() {
        16 => {
            let cipher = Aes128::new_from_slice(key).map_err(|_| Error::MalformedLength {
                what: "AES key",
                len: key.len(),
            })?;
            for block in buf.chunks_exact_mut(BLOCK_SIZE) {
                cipher.encrypt_block(GenericArray::from_mut_slice(block));
            }
        }
        32 => {
            let cipher = Aes256::new_from_slice(key).map_err(|_| Error::MalformedLength {
                what: "AES key",
                len: key.len(),
            })?;
            for block in buf.chunks_exact_mut(BLOCK_SIZE) {
                cipher.encrypt_block(GenericArray::from_mut_slice(block));
            }
        }
        other => {
            return Err(Error::MalformedLength {
                what: "AES key",
                len: other,
            });
        }
    }
    Ok(())
}
