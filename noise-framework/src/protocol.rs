use std::fmt;
use std::str::FromStr;

use crate::crypto::{CipherKind, DhKind, HashKind};
use crate::error::NoiseError;
use crate::handshakepattern::HandshakePattern;

/// A resolved protocol name such as `Noise_XX_25519_ChaChaPoly_BLAKE2s`.
///
/// Immutable once parsed. `to_string()` gives back the exact input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Protocol {
    pattern: HandshakePattern,
    dh: DhKind,
    cipher: CipherKind,
    hash: HashKind,
}

impl Protocol {
    pub fn new(pattern: HandshakePattern, dh: DhKind, cipher: CipherKind, hash: HashKind) -> Self {
        Protocol {
            pattern,
            dh,
            cipher,
            hash,
        }
    }

    pub fn pattern(&self) -> &HandshakePattern {
        &self.pattern
    }

    pub fn dh(&self) -> DhKind {
        self.dh
    }

    pub fn cipher(&self) -> CipherKind {
        self.cipher
    }

    pub fn hash(&self) -> HashKind {
        self.hash
    }

    pub fn is_one_way(&self) -> bool {
        self.pattern.is_one_way()
    }

    pub fn is_psk(&self) -> bool {
        self.pattern.is_psk()
    }
}

impl FromStr for Protocol {
    type Err = NoiseError;

    fn from_str(name: &str) -> Result<Self, NoiseError> {
        let mut parts = name.split('_');
        let (prefix, pattern, dh, cipher, hash) = match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e), None) => (a, b, c, d, e),
            _ => {
                return Err(NoiseError::UnsupportedProtocol(format!(
                    "malformed protocol name {:?}",
                    name
                )))
            }
        };

        if prefix != "Noise" {
            return Err(NoiseError::UnsupportedProtocol(format!(
                "unknown prefix {:?}",
                prefix
            )));
        }

        let pattern = HandshakePattern::from_name(pattern)?;
        let dh = DhKind::from_name(dh)
            .ok_or_else(|| NoiseError::UnsupportedProtocol(format!("DH {:?}", dh)))?;
        let cipher = CipherKind::from_name(cipher)
            .ok_or_else(|| NoiseError::UnsupportedProtocol(format!("cipher {:?}", cipher)))?;
        let hash = HashKind::from_name(hash)
            .ok_or_else(|| NoiseError::UnsupportedProtocol(format!("hash {:?}", hash)))?;

        Ok(Protocol::new(pattern, dh, cipher, hash))
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Noise_{}_{}_{}_{}",
            self.pattern.name(),
            self.dh.name(),
            self.cipher.name(),
            self.hash.name()
        )
    }
}
