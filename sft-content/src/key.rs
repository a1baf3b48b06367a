//! Decoding server-issued key material into raw cipher keys.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sft_types::{ContainerKeyMaterial, SymmetricKeyStrength};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CipherError;

/// Size of the AES block and of the CBC initialisation vector in bytes.
pub const IV_SIZE: usize = 16;

/// Key lengths AES accepts, in bytes.
pub const KEY_SIZES: [usize; 3] = [16, 24, 32];

/// A decoded AES key and IV.
///
/// The key length alone picks AES-128, AES-192 or AES-256. The declared
/// strength is kept for display only. Memory is zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey {
    key: Vec<u8>,
    iv: [u8; IV_SIZE],
    #[zeroize(skip)]
    strength: SymmetricKeyStrength,
}

impl CipherKey {
    /// Decode and validate container key material.
    ///
    /// The decoded key must be 16, 24 or 32 bytes and the IV must be one
    /// block long. The declared strength is not checked against the key.
    pub fn from_material(material: &ContainerKeyMaterial) -> Result<Self, CipherError> {
        let strength = material.strength();

        let mut key = BASE64
            .decode(material.key_base64().trim())
            .map_err(|e| CipherError::InvalidKey(format!("key is not Base64: {}", e)))?;
        if !KEY_SIZES.contains(&key.len()) {
            let len = key.len();
            key.zeroize();
            return Err(CipherError::InvalidKey(format!(
                "AES needs a 16, 24 or 32-byte key, got {} bytes",
                len
            )));
        }

        let mut iv_bytes = BASE64
            .decode(material.iv_base64().trim())
            .map_err(|e| CipherError::InvalidKey(format!("IV is not Base64: {}", e)))?;
        let iv: [u8; IV_SIZE] = match iv_bytes.as_slice().try_into() {
            Ok(iv) => iv,
            Err(_) => {
                let len = iv_bytes.len();
                iv_bytes.zeroize();
                key.zeroize();
                return Err(CipherError::InvalidKey(format!(
                    "IV must be {} bytes, got {} bytes",
                    IV_SIZE, len
                )));
            }
        };
        iv_bytes.zeroize();

        Ok(Self { key, iv, strength })
    }

    /// Raw key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Raw IV bytes.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Strength the service declared for this key.
    pub fn strength(&self) -> SymmetricKeyStrength {
        self.strength
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CipherKey({:?}, [{} bytes REDACTED])",
            self.strength,
            self.key.len()
        )
    }
}
