//! Streaming file encryption with AES-CBC and PKCS#7 padding.
//!
//! Files are pushed through a bounded working buffer, so memory use does not
//! grow with file size. Whole cipher blocks are transformed as soon as they
//! are read; only the final block goes through the padding step.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::CipherError;
use crate::key::{CipherKey, IV_SIZE};

/// Size of the working buffer used while streaming a file.
pub const BUFFER_SIZE: usize = 64 * 1024;

const BLOCK: usize = IV_SIZE;

/// Length of the ciphertext produced for `plaintext_len` bytes.
///
/// PKCS#7 always adds between 1 and 16 bytes of padding.
pub fn ciphertext_len(plaintext_len: u64) -> u64 {
    (plaintext_len / BLOCK as u64 + 1) * BLOCK as u64
}

enum Encryptor {
    Aes128(cbc::Encryptor<Aes128>),
    Aes192(cbc::Encryptor<Aes192>),
    Aes256(cbc::Encryptor<Aes256>),
}

impl Encryptor {
    fn new(key: &CipherKey) -> Result<Self, CipherError> {
        let invalid = |e: InvalidLength| CipherError::InvalidKey(e.to_string());
        match key.key().len() {
            16 => Ok(Self::Aes128(
                cbc::Encryptor::new_from_slices(key.key(), key.iv()).map_err(invalid)?,
            )),
            24 => Ok(Self::Aes192(
                cbc::Encryptor::new_from_slices(key.key(), key.iv()).map_err(invalid)?,
            )),
            32 => Ok(Self::Aes256(
                cbc::Encryptor::new_from_slices(key.key(), key.iv()).map_err(invalid)?,
            )),
            n => Err(CipherError::InvalidKey(format!("unsupported key length {}", n))),
        }
    }

    /// Encrypt whole blocks in place. `buf.len()` must be a multiple of 16.
    fn encrypt_blocks(&mut self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(BLOCK) {
            let block = GenericArray::from_mut_slice(block);
            match self {
                Self::Aes128(c) => c.encrypt_block_mut(block),
                Self::Aes192(c) => c.encrypt_block_mut(block),
                Self::Aes256(c) => c.encrypt_block_mut(block),
            }
        }
    }

    /// Pad and encrypt the final partial block (may be empty).
    fn finish(self, tail: &[u8]) -> Vec<u8> {
        match self {
            Self::Aes128(c) => c.encrypt_padded_vec_mut::<Pkcs7>(tail),
            Self::Aes192(c) => c.encrypt_padded_vec_mut::<Pkcs7>(tail),
            Self::Aes256(c) => c.encrypt_padded_vec_mut::<Pkcs7>(tail),
        }
    }
}

enum Decryptor {
    Aes128(cbc::Decryptor<Aes128>),
    Aes192(cbc::Decryptor<Aes192>),
    Aes256(cbc::Decryptor<Aes256>),
}

impl Decryptor {
    fn new(key: &CipherKey) -> Result<Self, CipherError> {
        let invalid = |e: InvalidLength| CipherError::InvalidKey(e.to_string());
        match key.key().len() {
            16 => Ok(Self::Aes128(
                cbc::Decryptor::new_from_slices(key.key(), key.iv()).map_err(invalid)?,
            )),
            24 => Ok(Self::Aes192(
                cbc::Decryptor::new_from_slices(key.key(), key.iv()).map_err(invalid)?,
            )),
            32 => Ok(Self::Aes256(
                cbc::Decryptor::new_from_slices(key.key(), key.iv()).map_err(invalid)?,
            )),
            n => Err(CipherError::InvalidKey(format!("unsupported key length {}", n))),
        }
    }

    fn decrypt_blocks(&mut self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(BLOCK) {
            let block = GenericArray::from_mut_slice(block);
            match self {
                Self::Aes128(c) => c.decrypt_block_mut(block),
                Self::Aes192(c) => c.decrypt_block_mut(block),
                Self::Aes256(c) => c.decrypt_block_mut(block),
            }
        }
    }

    /// Decrypt the final block and strip its padding.
    fn finish(self, last: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self {
            Self::Aes128(c) => c.decrypt_padded_vec_mut::<Pkcs7>(last),
            Self::Aes192(c) => c.decrypt_padded_vec_mut::<Pkcs7>(last),
            Self::Aes256(c) => c.decrypt_padded_vec_mut::<Pkcs7>(last),
        }
        .map_err(|_| CipherError::DecryptionFailed)
    }
}

async fn open_pair(src: &Path, dst: &Path) -> Result<(File, File), CipherError> {
    if src == dst {
        return Err(CipherError::SamePath {
            path: src.to_path_buf(),
        });
    }
    if let (Ok(a), Ok(b)) = (
        tokio::fs::canonicalize(src).await,
        tokio::fs::canonicalize(dst).await,
    ) {
        if a == b {
            return Err(CipherError::SamePath { path: a });
        }
    }

    let input = File::open(src)
        .await
        .map_err(|e| CipherError::io("opening", src, e))?;
    let output = File::create(dst)
        .await
        .map_err(|e| CipherError::io("creating", dst, e))?;
    Ok((input, output))
}

/// Encrypt `src` into `dst` with the container key.
///
/// `dst` is created or truncated. On failure a partial `dst` is left in
/// place for the caller to inspect or remove.
///
/// Returns the number of ciphertext bytes written.
pub async fn encrypt_file(src: &Path, dst: &Path, key: &CipherKey) -> Result<u64, CipherError> {
    let (mut input, mut output) = open_pair(src, dst).await?;
    let mut cipher = Encryptor::new(key)?;

    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut pending: Vec<u8> = Vec::with_capacity(BUFFER_SIZE + BLOCK);
    let mut written = 0u64;

    loop {
        let n = input
            .read(&mut buf)
            .await
            .map_err(|e| CipherError::io("reading", src, e))?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buf[..n]);

        let whole = pending.len() - pending.len() % BLOCK;
        if whole > 0 {
            cipher.encrypt_blocks(&mut pending[..whole]);
            output
                .write_all(&pending[..whole])
                .await
                .map_err(|e| CipherError::io("writing", dst, e))?;
            written += whole as u64;
            pending.drain(..whole);
        }
    }

    let last = cipher.finish(&pending);
    output
        .write_all(&last)
        .await
        .map_err(|e| CipherError::io("writing", dst, e))?;
    output
        .flush()
        .await
        .map_err(|e| CipherError::io("flushing", dst, e))?;
    written += last.len() as u64;

    tracing::debug!(
        "Encrypted {} -> {} ({} bytes)",
        src.display(),
        dst.display(),
        written
    );
    Ok(written)
}

/// Decrypt `src` into `dst` with the container key.
///
/// The last cipher block is held back until end of file so that its padding
/// can be checked. Returns the number of plaintext bytes written.
pub async fn decrypt_file(src: &Path, dst: &Path, key: &CipherKey) -> Result<u64, CipherError> {
    let (mut input, mut output) = open_pair(src, dst).await?;
    let mut cipher = Decryptor::new(key)?;

    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut pending: Vec<u8> = Vec::with_capacity(BUFFER_SIZE + BLOCK);
    let mut read = 0u64;
    let mut written = 0u64;

    loop {
        let n = input
            .read(&mut buf)
            .await
            .map_err(|e| CipherError::io("reading", src, e))?;
        if n == 0 {
            break;
        }
        read += n as u64;
        pending.extend_from_slice(&buf[..n]);

        // Keep at least one block back for the padding check.
        let keep = match pending.len() % BLOCK {
            0 => BLOCK,
            rem => rem,
        };
        let whole = pending.len().saturating_sub(keep);
        if whole > 0 {
            cipher.decrypt_blocks(&mut pending[..whole]);
            output
                .write_all(&pending[..whole])
                .await
                .map_err(|e| CipherError::io("writing", dst, e))?;
            written += whole as u64;
            pending.drain(..whole);
        }
    }

    if pending.len() != BLOCK {
        return Err(CipherError::Truncated { len: read });
    }

    let last = cipher.finish(&pending)?;
    output
        .write_all(&last)
        .await
        .map_err(|e| CipherError::io("writing", dst, e))?;
    output
        .flush()
        .await
        .map_err(|e| CipherError::io("flushing", dst, e))?;
    written += last.len() as u64;

    tracing::debug!(
        "Decrypted {} -> {} ({} bytes)",
        src.display(),
        dst.display(),
        written
    );
    Ok(written)
}
