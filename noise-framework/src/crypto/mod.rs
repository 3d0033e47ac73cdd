//! The closed set of primitives a protocol name can select.
//!
//! Each family is a plain enum resolved once when a protocol name is parsed.
//! Calls are forwarded to the generic [`Dh`], [`Cipher`] and [`Hash`]
//! implementations in the submodules.

mod aead;
mod hash;
mod sensitive;
mod x25519;

pub use self::aead::{AesGcm, ChaChaPoly};
pub use self::hash::{Blake2b, Blake2s, Sha256, Sha512};
pub use self::sensitive::Sensitive;
pub use self::x25519::X25519;

use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::error::NoiseError;
use crate::traits::{Cipher, Dh, Hash, U8Array};

/// Diffie-Hellman functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhKind {
    X25519,
}

/// AEAD ciphers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherKind {
    ChaChaPoly,
    AesGcm,
}

/// Hash functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Sha256,
    Sha512,
    Blake2s,
    Blake2b,
}

macro_rules! with_dh {
    ($kind:expr, $d:ident => $body:expr) => {
        match $kind {
            DhKind::X25519 => {
                type $d = X25519;
                $body
            }
        }
    };
}

macro_rules! with_cipher {
    ($kind:expr, $c:ident => $body:expr) => {
        match $kind {
            CipherKind::ChaChaPoly => {
                type $c = ChaChaPoly;
                $body
            }
            CipherKind::AesGcm => {
                type $c = AesGcm;
                $body
            }
        }
    };
}

macro_rules! with_hash {
    ($kind:expr, $h:ident => $body:expr) => {
        match $kind {
            HashKind::Sha256 => {
                type $h = Sha256;
                $body
            }
            HashKind::Sha512 => {
                type $h = Sha512;
                $body
            }
            HashKind::Blake2s => {
                type $h = Blake2s;
                $body
            }
            HashKind::Blake2b => {
                type $h = Blake2b;
                $body
            }
        }
    };
}

impl DhKind {
    pub const ALL: &'static [DhKind] = &[DhKind::X25519];

    pub fn name(self) -> &'static str {
        with_dh!(self, D => D::name())
    }

    pub fn from_name(name: &str) -> Option<DhKind> {
        Self::ALL.iter().copied().find(|d| d.name() == name)
    }

    pub fn pub_len(self) -> usize {
        with_dh!(self, D => D::pub_len())
    }

    pub fn secret_len(self) -> usize {
        with_dh!(self, D => <D as Dh>::Key::len())
    }

    /// Draw a fresh private key from `rng`.
    pub(crate) fn generate(self, rng: &mut dyn CryptoRngCore) -> Zeroizing<Vec<u8>> {
        with_dh!(self, D => Zeroizing::new(D::genkey(rng).as_slice().to_vec()))
    }

    pub(crate) fn pubkey(self, secret: &[u8]) -> Vec<u8> {
        with_dh!(self, D => {
            let k = <D as Dh>::Key::from_slice(secret);
            D::pubkey(&k).as_slice().to_vec()
        })
    }

    pub(crate) fn dh(self, secret: &[u8], public: &[u8]) -> Result<Zeroizing<Vec<u8>>, NoiseError> {
        with_dh!(self, D => {
            let k = <D as Dh>::Key::from_slice(secret);
            let pk = <D as Dh>::Pubkey::from_slice(public);
            D::dh(&k, &pk)
                .map(|out| Zeroizing::new(out.as_slice().to_vec()))
                .map_err(|_| NoiseError::DhFailed)
        })
    }
}

impl CipherKind {
    pub const ALL: &'static [CipherKind] = &[CipherKind::ChaChaPoly, CipherKind::AesGcm];

    pub fn name(self) -> &'static str {
        with_cipher!(self, C => C::name())
    }

    pub fn from_name(name: &str) -> Option<CipherKind> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn key_len(self) -> usize {
        with_cipher!(self, C => C::key_len())
    }

    pub fn tag_len(self) -> usize {
        with_cipher!(self, C => C::tag_len())
    }

    /// `out.len()` must be `plaintext.len() + tag_len()`.
    pub(crate) fn encrypt(self, key: &[u8], nonce: u64, ad: &[u8], plaintext: &[u8], out: &mut [u8]) {
        with_cipher!(self, C => {
            let k = <C as Cipher>::Key::from_slice(key);
            C::encrypt(&k, nonce, ad, plaintext, out)
        })
    }

    /// `out.len()` must be `ciphertext.len() - tag_len()`.
    pub(crate) fn decrypt(
        self,
        key: &[u8],
        nonce: u64,
        ad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<(), NoiseError> {
        with_cipher!(self, C => {
            let k = <C as Cipher>::Key::from_slice(key);
            C::decrypt(&k, nonce, ad, ciphertext, out).map_err(|_| NoiseError::AuthenticationFailed)
        })
    }

    pub(crate) fn rekey(self, key: &[u8]) -> Zeroizing<Vec<u8>> {
        with_cipher!(self, C => {
            let k = <C as Cipher>::Key::from_slice(key);
            Zeroizing::new(C::rekey(&k).as_slice().to_vec())
        })
    }
}

impl HashKind {
    pub const ALL: &'static [HashKind] = &[
        HashKind::Sha256,
        HashKind::Sha512,
        HashKind::Blake2s,
        HashKind::Blake2b,
    ];

    pub fn name(self) -> &'static str {
        with_hash!(self, H => H::name())
    }

    pub fn from_name(name: &str) -> Option<HashKind> {
        Self::ALL.iter().copied().find(|h| h.name() == name)
    }

    pub fn hash_len(self) -> usize {
        with_hash!(self, H => H::hash_len())
    }

    pub(crate) fn hash(self, data: &[&[u8]]) -> Vec<u8> {
        with_hash!(self, H => {
            let mut h = H::default();
            for d in data {
                h.input(d);
            }
            h.result().as_slice().to_vec()
        })
    }

    pub(crate) fn hkdf2(self, ck: &[u8], ikm: &[u8]) -> [Zeroizing<Vec<u8>>; 2] {
        with_hash!(self, H => {
            let (a, b) = H::hkdf(ck, ikm);
            [a, b].map(|o| Zeroizing::new(o.as_slice().to_vec()))
        })
    }

    pub(crate) fn hkdf3(self, ck: &[u8], ikm: &[u8]) -> [Zeroizing<Vec<u8>>; 3] {
        with_hash!(self, H => {
            let (a, b, c) = H::hkdf3(ck, ikm);
            [a, b, c].map(|o| Zeroizing::new(o.as_slice().to_vec()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_both_ways() {
        for d in DhKind::ALL {
            assert_eq!(DhKind::from_name(d.name()), Some(*d));
        }
        for c in CipherKind::ALL {
            assert_eq!(CipherKind::from_name(c.name()), Some(*c));
        }
        for h in HashKind::ALL {
            assert_eq!(HashKind::from_name(h.name()), Some(*h));
        }
        assert_eq!(DhKind::from_name("448"), None);
        assert_eq!(CipherKind::from_name("chachapoly"), None);
        assert_eq!(HashKind::from_name("SHA1"), None);
    }

    #[test]
    fn lengths() {
        assert_eq!(DhKind::X25519.pub_len(), 32);
        assert_eq!(CipherKind::AesGcm.key_len(), 32);
        assert_eq!(CipherKind::ChaChaPoly.tag_len(), 16);
        assert_eq!(HashKind::Sha256.hash_len(), 32);
        assert_eq!(HashKind::Blake2b.hash_len(), 64);
    }

    #[test]
    fn hash_concatenates_inputs() {
        assert_eq!(
            HashKind::Sha256.hash(&[&b"a"[..], &b"bc"[..]]),
            HashKind::Sha256.hash(&[&b"abc"[..]])
        );
    }

    #[test]
    fn dh_agrees_and_maps_failure() {
        use rand::{rngs::StdRng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(3);
        let a = DhKind::X25519.generate(&mut rng);
        let b = DhKind::X25519.generate(&mut rng);
        let pa = DhKind::X25519.pubkey(&a);
        let pb = DhKind::X25519.pubkey(&b);
        assert_eq!(
            *DhKind::X25519.dh(&a, &pb).unwrap(),
            *DhKind::X25519.dh(&b, &pa).unwrap()
        );
        assert!(matches!(
            DhKind::X25519.dh(&a, &[0u8; 32]),
            Err(NoiseError::DhFailed)
        ));
    }

    #[test]
    fn cipher_maps_auth_failure() {
        let key = [1u8; 32];
        let mut ct = [0u8; 19];
        CipherKind::AesGcm.encrypt(&key, 0, b"", b"abc", &mut ct);
        let mut pt = [0u8; 3];
        assert_eq!(
            CipherKind::AesGcm.decrypt(&key, 1, b"", &ct, &mut pt),
            Err(NoiseError::AuthenticationFailed)
        );
        assert!(CipherKind::AesGcm.decrypt(&key, 0, b"", &ct, &mut pt).is_ok());
        assert_eq!(&pt, b"abc");
    }
}
