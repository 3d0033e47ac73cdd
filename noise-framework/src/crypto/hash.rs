use blake2::{Blake2b512, Blake2s256};
use sha2::{Digest, Sha256 as Sha256Impl, Sha512 as Sha512Impl};

use crate::traits::{Hash, U8Array};

macro_rules! impl_hash {
    ($name:ident, $inner:ty, $wire:expr, $block:ty, $output:ty) => {
        #[derive(Default, Clone)]
        pub struct $name {
            hasher: $inner,
        }

        impl Hash for $name {
            type Block = $block;
            type Output = $output;

            fn name() -> &'static str {
                $wire
            }

            fn input(&mut self, data: &[u8]) {
                Digest::update(&mut self.hasher, data);
            }

            fn result(&mut self) -> Self::Output {
                let digest = Digest::finalize_reset(&mut self.hasher);
                Self::Output::from_slice(&digest)
            }
        }
    };
}

impl_hash!(Sha256, Sha256Impl, "SHA256", [u8; 64], [u8; 32]);
impl_hash!(Sha512, Sha512Impl, "SHA512", [u8; 128], [u8; 64]);
impl_hash!(Blake2s, Blake2s256, "BLAKE2s", [u8; 64], [u8; 32]);
impl_hash!(Blake2b, Blake2b512, "BLAKE2b", [u8; 128], [u8; 64]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abc_known_answers() {
        assert_eq!(
            hex::encode(Sha256::hash(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hex::encode(Blake2s::hash(b"abc")),
            "508c5e8c327c14e2e1a72ba34eeb452f37458b209ed63a294d999b4c86675982"
        );
        assert_eq!(
            hex::encode(&Sha512::hash(b"abc")[..]),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
        assert_eq!(
            hex::encode(&Blake2b::hash(b"abc")[..]),
            "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1\
             7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923"
        );
    }

    #[test]
    fn hmac_sha256_rfc4231_case2() {
        let out = Sha256::hmac(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(out),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hkdf_outputs_chain() {
        let ck = [7u8; 32];
        let (a1, a2) = Blake2s::hkdf(&ck, b"ikm");
        let (b1, b2, b3) = Blake2s::hkdf3(&ck, b"ikm");
        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
        assert_ne!(b2, b3);
        // A fresh hasher after `result` must behave like a new one.
        let mut h = Sha256::default();
        h.input(b"junk");
        let _ = h.result();
        h.input(b"abc");
        assert_eq!(h.result(), Sha256::hash(b"abc"));
    }
}
