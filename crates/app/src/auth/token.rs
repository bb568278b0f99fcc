//! Opaque token generation, formatting, and digests.

use std::{fmt, str::FromStr};

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

/// Number of random bytes behind every token.
pub const TOKEN_SECRET_BYTES: usize = 16;

/// Length of the base32 plaintext handed to the client.
pub const TOKEN_PLAINTEXT_CHARS: usize = (TOKEN_SECRET_BYTES * 8).div_ceil(5);

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Purpose a token was issued for.
///
/// A token issued for one scope never verifies for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Activation,
    Authentication,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Authentication => "authentication",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown token scope")]
pub struct UnknownScope;

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "activation" => Ok(Self::Activation),
            "authentication" => Ok(Self::Authentication),
            _ => Err(UnknownScope),
        }
    }
}

#[derive(Clone)]
pub struct TokenSecret {
    bytes: [u8; TOKEN_SECRET_BYTES],
}

impl TokenSecret {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; TOKEN_SECRET_BYTES]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TOKEN_SECRET_BYTES] {
        &self.bytes
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(**redacted**)")
    }
}

impl Drop for TokenSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// SHA-256 of a token plaintext. The only form a token is ever stored in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenDigest([u8; 32]);

impl TokenDigest {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenDigest(..)")
    }
}

#[must_use]
pub fn generate_token_secret() -> TokenSecret {
    let mut secret = [0_u8; TOKEN_SECRET_BYTES];

    OsRng.fill_bytes(&mut secret);

    TokenSecret::from_bytes(secret)
}

/// Format a secret as unpadded RFC 4648 base32.
#[must_use]
pub fn format_token(secret: &TokenSecret) -> String {
    encode_base32(secret.as_bytes())
}

/// Whether `plaintext` has the exact shape of a formatted token.
#[must_use]
pub fn is_well_formed(plaintext: &str) -> bool {
    plaintext.len() == TOKEN_PLAINTEXT_CHARS
        && plaintext.bytes().all(|byte| BASE32_ALPHABET.contains(&byte))
}

#[must_use]
pub fn digest_token(plaintext: &str) -> TokenDigest {
    TokenDigest(Sha256::digest(plaintext.as_bytes()).into())
}

fn encode_base32(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer = 0_u32;
    let mut bits = 0_u32;

    for byte in bytes {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;

        while bits >= 5 {
            bits -= 5;
            encoded.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }

        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        encoded.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    encoded
}
