use rand_core::CryptoRngCore;

/// A trait for fixed size u8 array.

// Inspired by ArrayVec and SmallVec, but no unsafe.
pub trait U8Array: Sized {
    fn new() -> Self;
    fn new_with(x: u8) -> Self;
    fn from_slice(data: &[u8]) -> Self;
    fn len() -> usize;
    fn as_slice(&self) -> &[u8];
    fn as_mut(&mut self) -> &mut [u8];
}

macro_rules! impl_array {
    ($len:expr) => {
        impl U8Array for [u8; $len] {
            fn new() -> Self {
                [0u8; $len]
            }

            fn new_with(x: u8) -> Self {
                [x; $len]
            }

            fn from_slice(data: &[u8]) -> Self {
                let mut a = [0u8; $len];
                a.copy_from_slice(data);
                a
            }

            fn len() -> usize {
                $len
            }

            fn as_slice(&self) -> &[u8] {
                self
            }

            fn as_mut(&mut self) -> &mut [u8] {
                self
            }
        }
    };
}

impl_array!(32);
impl_array!(64);
impl_array!(128);

/// A DH.
pub trait Dh {
    type Key: U8Array;
    type Pubkey: U8Array;
    type Output: U8Array;

    fn name() -> &'static str;

    fn pub_len() -> usize {
        Self::Pubkey::len()
    }

    fn genkey(rng: &mut dyn CryptoRngCore) -> Self::Key;

    fn pubkey(k: &Self::Key) -> Self::Pubkey;

    /// Fails when the peer's public key yields a degenerate shared secret.
    fn dh(k: &Self::Key, pk: &Self::Pubkey) -> Result<Self::Output, ()>;
}

/// An AEAD.
pub trait Cipher {
    type Key: U8Array;

    fn name() -> &'static str;

    fn key_len() -> usize {
        Self::Key::len()
    }

    fn tag_len() -> usize {
        16
    }

    /// AEAD encryption.
    ///
    /// out.len() == plaintext.len() + Self::tag_len()
    fn encrypt(k: &Self::Key, nonce: u64, ad: &[u8], plaintext: &[u8], out: &mut [u8]);

    /// AEAD decryption.
    ///
    /// out.len() == ciphertext.len() - Self::tag_len()
    fn decrypt(
        k: &Self::Key,
        nonce: u64,
        ad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<(), ()>;

    /// `REKEY(k)`: the first `key_len` bytes of encrypting zeros under the
    /// maximum nonce.
    fn rekey(k: &Self::Key) -> Self::Key {
        let zeros = vec![0u8; Self::key_len()];
        let mut out = zeroize::Zeroizing::new(vec![0u8; Self::key_len() + Self::tag_len()]);
        Self::encrypt(k, u64::MAX, &[], &zeros, &mut out[..]);
        Self::Key::from_slice(&out[..Self::key_len()])
    }
}

/// A hash function.
pub trait Hash: Default {
    type Block: U8Array;
    type Output: U8Array;

    fn name() -> &'static str;

    fn block_len() -> usize {
        Self::Block::len()
    }

    fn hash_len() -> usize {
        Self::Output::len()
    }

    fn reset(&mut self) {
        *self = Default::default();
    }

    fn input(&mut self, data: &[u8]);
    fn result(&mut self) -> Self::Output;

    fn hash(data: &[u8]) -> Self::Output {
        let mut h: Self = Default::default();
        h.input(data);
        h.result()
    }

    fn hmac_many(key: &[u8], data: &[&[u8]]) -> Self::Output {
        assert!(key.len() <= Self::block_len());

        let mut ipad = Self::Block::new_with(0x36u8);
        let mut opad = Self::Block::new_with(0x5cu8);

        for (i, k) in key.iter().enumerate() {
            ipad.as_mut()[i] ^= k;
            opad.as_mut()[i] ^= k;
        }

        let mut hasher: Self = Default::default();
        hasher.input(ipad.as_slice());
        for d in data {
            hasher.input(d);
        }
        let inner_output = hasher.result();

        hasher.reset();
        hasher.input(opad.as_slice());
        hasher.input(inner_output.as_slice());
        hasher.result()
    }

    fn hmac(key: &[u8], data: &[u8]) -> Self::Output {
        Self::hmac_many(key, &[data])
    }

    fn hkdf(chaining_key: &[u8], input_key_material: &[u8]) -> (Self::Output, Self::Output) {
        let temp_key = Self::hmac(chaining_key, input_key_material);
        let out1 = Self::hmac(temp_key.as_slice(), &[1u8]);
        let out2 = Self::hmac_many(temp_key.as_slice(), &[out1.as_slice(), &[2u8]]);
        (out1, out2)
    }

    fn hkdf3(
        chaining_key: &[u8],
        input_key_material: &[u8],
    ) -> (Self::Output, Self::Output, Self::Output) {
        let temp_key = Self::hmac(chaining_key, input_key_material);
        let out1 = Self::hmac(temp_key.as_slice(), &[1u8]);
        let out2 = Self::hmac_many(temp_key.as_slice(), &[out1.as_slice(), &[2u8]]);
        let out3 = Self::hmac_many(temp_key.as_slice(), &[out2.as_slice(), &[3u8]]);
        (out1, out2, out3)
    }
}
