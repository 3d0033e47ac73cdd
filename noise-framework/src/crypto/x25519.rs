use rand_core::CryptoRngCore;
use x25519_dalek::{PublicKey, StaticSecret};

use super::sensitive::Sensitive;
use crate::traits::{Dh, U8Array};

pub enum X25519 {}

fn secret(k: &Sensitive<[u8; 32]>) -> StaticSecret {
    StaticSecret::from(<[u8; 32]>::from_slice(k.as_slice()))
}

impl Dh for X25519 {
    type Key = Sensitive<[u8; 32]>;
    type Pubkey = [u8; 32];
    type Output = Sensitive<[u8; 32]>;

    fn name() -> &'static str {
        "25519"
    }

    fn genkey(rng: &mut dyn CryptoRngCore) -> Self::Key {
        let mut k = Self::Key::new();
        rng.fill_bytes(k.as_mut());
        k
    }

    fn pubkey(k: &Self::Key) -> Self::Pubkey {
        PublicKey::from(&secret(k)).to_bytes()
    }

    fn dh(k: &Self::Key, pk: &Self::Pubkey) -> Result<Self::Output, ()> {
        let shared = secret(k).diffie_hellman(&PublicKey::from(*pk));
        // Low-order points give the all-zero output.
        if !shared.was_contributory() {
            return Err(());
        }
        Ok(Self::Output::from_slice(shared.as_bytes()))
    }
}
