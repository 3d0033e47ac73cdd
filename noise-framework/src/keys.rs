use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::DhKind;
use crate::error::NoiseError;

/// A public key for one of the supported DH functions.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    dh: DhKind,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Wrap raw public key bytes, checking the length against `dh`.
    pub fn from_bytes(dh: DhKind, bytes: &[u8]) -> Result<Self, NoiseError> {
        if bytes.len() != dh.pub_len() {
            return Err(NoiseError::InvalidPublicKey);
        }
        Ok(PublicKey {
            dh,
            bytes: bytes.to_vec(),
        })
    }

    pub fn dh(&self) -> DhKind {
        self.dh
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({:02x?})", &self.bytes[..4.min(self.bytes.len())])
    }
}

/// A DH keypair. The private half is wiped when dropped.
#[derive(Clone)]
pub struct Keypair {
    dh: DhKind,
    secret: Zeroizing<Vec<u8>>,
    public: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate(dh: DhKind, rng: &mut dyn CryptoRngCore) -> Self {
        let secret = dh.generate(rng);
        Self::from_secret(dh, secret)
    }

    /// Rebuild a keypair from private key bytes, deriving the public key.
    pub fn from_private_bytes(dh: DhKind, bytes: &[u8]) -> Result<Self, NoiseError> {
        if bytes.len() != dh.secret_len() {
            return Err(NoiseError::InvalidConfig("private key has the wrong length"));
        }
        Ok(Self::from_secret(dh, Zeroizing::new(bytes.to_vec())))
    }

    fn from_secret(dh: DhKind, secret: Zeroizing<Vec<u8>>) -> Self {
        let public = PublicKey {
            dh,
            bytes: dh.pubkey(&secret),
        };
        Keypair { dh, secret, public }
    }

    pub fn dh_kind(&self) -> DhKind {
        self.dh
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// Raw private key bytes.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }

    /// Perform DH between this keypair and `remote`.
    pub(crate) fn dh(&self, remote: &PublicKey) -> Result<Zeroizing<Vec<u8>>, NoiseError> {
        self.dh.dh(&self.secret, remote.as_bytes())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// A 32-byte pre-shared key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Psk([u8; 32]);

impl Psk {
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Psk(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, NoiseError> {
        if bytes.len() != Self::LEN {
            return Err(NoiseError::InvalidConfig("pre-shared key must be 32 bytes"));
        }
        let mut k = [0u8; 32];
        k.copy_from_slice(bytes);
        Ok(Psk(k))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Psk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Psk([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn private_bytes_derive_public() {
        let sk = hex::decode("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a")
            .unwrap();
        let kp = Keypair::from_private_bytes(DhKind::X25519, &sk).unwrap();
        assert_eq!(
            hex::encode(kp.public().as_bytes()),
            "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a"
        );
        assert_eq!(kp.secret_bytes(), &sk[..]);
    }

    #[test]
    fn wrong_lengths_are_rejected() {
        assert_eq!(
            PublicKey::from_bytes(DhKind::X25519, &[1u8; 31]),
            Err(NoiseError::InvalidPublicKey)
        );
        assert!(Keypair::from_private_bytes(DhKind::X25519, &[1u8; 33]).is_err());
        assert!(Psk::from_slice(&[0u8; 16]).is_err());
        assert!(Psk::from_slice(&[0u8; 32]).is_ok());
    }

    #[test]
    fn generated_keypairs_agree() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Keypair::generate(DhKind::X25519, &mut rng);
        let b = Keypair::generate(DhKind::X25519, &mut rng);
        assert_ne!(a.public(), b.public());
        assert_eq!(*a.dh(b.public()).unwrap(), *b.dh(a.public()).unwrap());
    }

    #[test]
    fn debug_hides_secrets() {
        let kp = Keypair::from_private_bytes(DhKind::X25519, &[9u8; 32]).unwrap();
        let shown = format!("{:?}", kp);
        assert!(shown.contains("REDACTED"));
        assert!(!shown.contains("09, 09"));
        assert_eq!(format!("{:?}", Psk::new([1; 32])), "Psk([REDACTED])");
    }
}
