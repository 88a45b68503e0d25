//! Request and Response Signatures
//!
//! jsConnect signs by hashing `content || secret` with a plain digest, not
//! HMAC. The forum computes the same digest, so the construction must stay
//! exactly as is.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

/// Digest used for signing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Length of the hex rendered digest
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => Md5::digest(bytes).to_vec(),
            Self::Sha256 => Sha256::digest(bytes).to_vec(),
            Self::Sha512 => Sha512::digest(bytes).to_vec(),
        }
    }
}

/// Signs content with the shared secret.
///
/// Returns the lowercase hex digest of the UTF-8 bytes of `content`
/// followed by `secret`.
pub fn sign(algorithm: HashAlgorithm, content: &str, secret: &str) -> String {
    let mut payload = String::with_capacity(content.len() + secret.len());
    payload.push_str(content);
    payload.push_str(secret);
    hex::encode(algorithm.digest(payload.as_bytes()))
}

/// Verifies a signature produced by [`sign`]
pub fn verify(algorithm: HashAlgorithm, content: &str, secret: &str, signature: &str) -> bool {
    let expected = sign(algorithm, content, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
