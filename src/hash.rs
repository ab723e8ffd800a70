// src/hash.rs

//! SHA-256 checksums for source archives, resources and bottles
//!
//! Formulas carry checksums in prefixed form (`sha256:<64 hex>`). Bottle
//! entries carry the bare hex digest. Both parse into [`Checksum`], which
//! guarantees a well-formed, lowercase digest.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Hex length of a SHA-256 digest
pub const SHA256_HEX_LEN: usize = 64;

/// A validated SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    value: String,
}

impl Checksum {
    /// Create from a bare hex digest
    pub fn from_hex(value: &str) -> Result<Self> {
        if value.len() != SHA256_HEX_LEN {
            return Err(Error::InvalidChecksum {
                value: value.to_string(),
                reason: format!("expected {} hex characters, got {}", SHA256_HEX_LEN, value.len()),
            });
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidChecksum {
                value: value.to_string(),
                reason: "contains non-hex characters".to_string(),
            });
        }
        Ok(Self {
            value: value.to_ascii_lowercase(),
        })
    }

    /// Parse a prefixed checksum (`sha256:abc...`)
    ///
    /// Unprefixed digests are accepted as SHA-256.
    pub fn parse_prefixed(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some(("sha256", hex)) => Self::from_hex(hex),
            Some((algo, _)) => Err(Error::InvalidChecksum {
                value: s.to_string(),
                reason: format!("unsupported algorithm '{}' (supported: sha256)", algo),
            }),
            None => Self::from_hex(s),
        }
    }

    /// The lowercase hex digest
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Format as `sha256:<hex>`
    pub fn to_prefixed_string(&self) -> String {
        format!("sha256:{}", self.value)
    }

    /// Check that the digest of `data` matches
    pub fn verify_bytes(&self, data: &[u8]) -> Result<()> {
        let actual = sha256(data);
        self.compare(actual)
    }

    /// Check that the digest of the file at `path` matches
    pub fn verify_file(&self, path: &Path) -> Result<()> {
        let actual = sha256_file(path)?;
        self.compare(actual)
    }

    fn compare(&self, actual: String) -> Result<()> {
        if actual == self.value {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                expected: self.value.clone(),
                actual,
            })
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for Checksum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_prefixed(s)
    }
}

/// Compute the SHA-256 hex digest of a byte slice
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the SHA-256 hex digest of everything a reader yields
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 hex digest of a file
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    Ok(sha256_reader(&mut file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(sha256(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_from_hex_normalizes_case() {
        let upper = HELLO_SHA256.to_uppercase();
        let checksum = Checksum::from_hex(&upper).unwrap();
        assert_eq!(checksum.as_str(), HELLO_SHA256);
    }

    #[test]
    fn test_from_hex_rejects_bad_length() {
        let err = Checksum::from_hex("abc123").unwrap_err();
        assert!(matches!(err, Error::InvalidChecksum { .. }));
    }

    #[test]
    fn test_from_hex_rejects_non_hex() {
        let bad = "z".repeat(SHA256_HEX_LEN);
        assert!(Checksum::from_hex(&bad).is_err());
    }

    #[test]
    fn test_parse_prefixed() {
        let checksum: Checksum = format!("sha256:{}", HELLO_SHA256).parse().unwrap();
        assert_eq!(checksum.to_prefixed_string(), format!("sha256:{}", HELLO_SHA256));

        let bare: Checksum = HELLO_SHA256.parse().unwrap();
        assert_eq!(bare, checksum);

        assert!(Checksum::parse_prefixed(&format!("md5:{}", HELLO_SHA256)).is_err());
    }

    #[test]
    fn test_verify_bytes() {
        let checksum = Checksum::from_hex(HELLO_SHA256).unwrap();
        assert!(checksum.verify_bytes(b"hello").is_ok());

        match checksum.verify_bytes(b"world") {
            Err(Error::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, HELLO_SHA256);
                assert_eq!(actual, sha256(b"world"));
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        file.flush().unwrap();

        let checksum = Checksum::from_hex(HELLO_SHA256).unwrap();
        assert!(checksum.verify_file(file.path()).is_ok());
    }

    #[test]
    fn test_sha256_reader_matches_bytes() {
        let data = vec![7u8; 20_000];
        let mut cursor = std::io::Cursor::new(data.clone());
        assert_eq!(sha256_reader(&mut cursor).unwrap(), sha256(&data));
    }
}
