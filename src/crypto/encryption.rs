//! AES-256-CBC encryption with PKCS#7 padding.
//!
//! Each call to `encrypt` generates a fresh random 16-byte IV and
//! prepends it to the ciphertext.  `decrypt` splits the IV back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 16-byte IV | ciphertext (multiple of 16 bytes) ]

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::errors::{PinVaultError, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of the CBC initialization vector in bytes.
pub const IV_LEN: usize = 16;

/// AES block size in bytes.
const BLOCK_LEN: usize = 16;

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Generate a random IV.
pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext` with a 32-byte `key` under a fresh random IV.
///
/// Returns the IV prepended to the ciphertext (IV || ciphertext).
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_iv(key, &generate_iv(), plaintext)
}

/// Encrypt `plaintext` under a caller-chosen IV.
///
/// Used when the IV doubles as the KDF salt and must be known before
/// the key exists.  The IV must never be reused with the same key.
pub fn encrypt_with_iv(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| PinVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut output = Vec::with_capacity(IV_LEN + ciphertext.len());
    output.extend_from_slice(iv);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Split an encrypted payload into its IV and ciphertext.
pub fn split_iv(ciphertext_with_iv: &[u8]) -> Result<(&[u8; IV_LEN], &[u8])> {
    if ciphertext_with_iv.len() < IV_LEN + BLOCK_LEN {
        return Err(PinVaultError::DecryptionFailed);
    }
    let (iv, ciphertext) = ciphertext_with_iv.split_at(IV_LEN);
    let iv: &[u8; IV_LEN] = iv.try_into().map_err(|_| PinVaultError::DecryptionFailed)?;
    Ok((iv, ciphertext))
}

/// Decrypt data that was produced by `encrypt`.
///
/// A wrong key or corrupted data almost always surfaces as a padding
/// failure and is reported as `DecryptionFailed`.
pub fn decrypt(key: &[u8], ciphertext_with_iv: &[u8]) -> Result<Vec<u8>> {
    let (iv, ciphertext) = split_iv(ciphertext_with_iv)?;
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(PinVaultError::DecryptionFailed);
    }

    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| PinVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PinVaultError::DecryptionFailed)
}
