//! # sft-content
//!
//! Client-side envelope encryption for sealbox.
//!
//! Every file is encrypted locally before it leaves the machine and decrypted
//! locally after it arrives. The key is never generated here: it is issued by
//! the service per container and handed over as Base64 key and IV.
//!
//! ## Cipher
//!
//! ```text
//! Plaintext → AES-CBC (128 or 256) + PKCS#7 → Ciphertext
//!                 ↑
//!          ContainerKeyMaterial (Base64 key + IV from the service)
//! ```
//!
//! 1. Decode and validate the key material ([`CipherKey::from_material`])
//! 2. Stream the source through a bounded working buffer
//! 3. Write ciphertext (or plaintext) to a separate destination file
//!
//! ## Example
//!
//! ```rust,ignore
//! use sft_content::{encrypt_file, decrypt_file, CipherKey, CipherError};
//!
//! # async fn example(material: sft_types::ContainerKeyMaterial) -> Result<(), CipherError> {
//! let key = CipherKey::from_material(&material)?;
//! encrypt_file("report.pdf".as_ref(), "report.pdf.sealed".as_ref(), &key).await?;
//! decrypt_file("report.pdf.sealed".as_ref(), "copy.pdf".as_ref(), &key).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod encrypt;
mod error;
mod key;

pub use encrypt::{ciphertext_len, decrypt_file, encrypt_file, BUFFER_SIZE};
pub use error::CipherError;
pub use key::{CipherKey, IV_SIZE};
