use zeroize::Zeroizing;

use crate::crypto::CipherKind;
use crate::error::NoiseError;

/// Largest message the Noise framework allows on the wire.
pub const MAX_MESSAGE_LEN: usize = 65535;

/// A `CipherState` can encrypt and decrypt data. It keeps a secret key and a nonce.
///
/// Unlike a Noise `CipherState` it always holds a key. The nonce `2^64 - 1`
/// is reserved, so a state that reaches it refuses further use with
/// [`NoiseError::NonceExhausted`].
pub struct CipherState {
    cipher: CipherKind,
    k: Zeroizing<Vec<u8>>,
    n: u64,
    max_message_size: Option<usize>,
}

impl CipherState {
    /// Create a `CipherState` from a raw key, with nonce 0.
    pub fn new(cipher: CipherKind, key: &[u8]) -> Result<Self, NoiseError> {
        if key.len() != cipher.key_len() {
            return Err(NoiseError::InvalidConfig("cipher key has the wrong length"));
        }
        Ok(Self::from_key(cipher, Zeroizing::new(key.to_vec())))
    }

    pub(crate) fn from_key(cipher: CipherKind, k: Zeroizing<Vec<u8>>) -> Self {
        debug_assert_eq!(k.len(), cipher.key_len());
        CipherState {
            cipher,
            k,
            n: 0,
            max_message_size: Some(MAX_MESSAGE_LEN),
        }
    }

    pub fn name(&self) -> &'static str {
        self.cipher.name()
    }

    pub fn cipher(&self) -> CipherKind {
        self.cipher
    }

    /// The nonce the next encryption or decryption will use.
    pub fn nonce(&self) -> u64 {
        self.n
    }

    /// Move the nonce, for transports that deliver messages out of order.
    pub fn set_nonce(&mut self, n: u64) {
        self.n = n;
    }

    pub fn max_message_size(&self) -> Option<usize> {
        self.max_message_size
    }

    /// Limit ciphertexts to `max` bytes; `None` lifts the limit.
    pub fn set_max_message_size(&mut self, max: Option<usize>) {
        self.max_message_size = max;
    }

    fn check_size(&self, ciphertext_len: usize) -> Result<(), NoiseError> {
        match self.max_message_size {
            Some(max) if ciphertext_len > max => Err(NoiseError::MessageTooLarge),
            _ => Ok(()),
        }
    }

    fn check_nonce(&self) -> Result<(), NoiseError> {
        if self.n == u64::MAX {
            return Err(NoiseError::NonceExhausted);
        }
        Ok(())
    }

    /// AEAD encryption under the current nonce, which is then incremented.
    pub fn encrypt_with_ad(&mut self, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        self.check_nonce()?;
        let len = plaintext.len() + self.cipher.tag_len();
        self.check_size(len)?;

        let mut out = vec![0u8; len];
        self.cipher.encrypt(&self.k, self.n, ad, plaintext, &mut out);
        self.n += 1;
        Ok(out)
    }

    /// AEAD decryption. The nonce is only incremented on success.
    pub fn decrypt_with_ad(&mut self, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        self.check_nonce()?;
        self.check_size(ciphertext.len())?;
        let len = ciphertext
            .len()
            .checked_sub(self.cipher.tag_len())
            .ok_or(NoiseError::MalformedMessage)?;

        let mut out = vec![0u8; len];
        self.cipher.decrypt(&self.k, self.n, ad, ciphertext, &mut out)?;
        self.n += 1;
        Ok(out)
    }

    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        self.encrypt_with_ad(&[], plaintext)
    }

    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        self.decrypt_with_ad(&[], ciphertext)
    }

    /// Replace the key with `REKEY(k)` and reset the nonce to zero.
    pub fn rekey(&mut self) {
        self.k = self.cipher.rekey(&self.k);
        self.n = 0;
    }
}

impl std::fmt::Debug for CipherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherState")
            .field("cipher", &self.cipher)
            .field("n", &self.n)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(cipher: CipherKind) -> (CipherState, CipherState) {
        let key = [0x42u8; 32];
        (
            CipherState::new(cipher, &key).unwrap(),
            CipherState::new(cipher, &key).unwrap(),
        )
    }

    #[test]
    fn nonces_count_up() {
        let (mut tx, mut rx) = pair(CipherKind::ChaChaPoly);
        for i in 0..10u64 {
            assert_eq!(tx.nonce(), i);
            let ct = tx.encrypt(format!("msg {}", i).as_bytes()).unwrap();
            assert_eq!(rx.decrypt(&ct).unwrap(), format!("msg {}", i).as_bytes());
        }
        assert_eq!(tx.nonce(), 10);
        assert_eq!(rx.nonce(), 10);
    }

    #[test]
    fn nonce_matches_raw_aead() {
        let (mut tx, _) = pair(CipherKind::AesGcm);
        tx.set_nonce(5);
        let ct = tx.encrypt_with_ad(b"ad", b"hello noise").unwrap();
        assert_eq!(
            hex::encode(ct),
            "aadedce91b06aba8512350508e8f198dadd09bbbb5b5c9721c7b71"
        );
        assert_eq!(tx.nonce(), 6);
    }

    #[test]
    fn failed_decrypt_keeps_nonce() {
        let (mut tx, mut rx) = pair(CipherKind::ChaChaPoly);
        let mut ct = tx.encrypt_with_ad(b"ad", b"payload").unwrap();

        assert_eq!(
            rx.decrypt_with_ad(b"AD", &ct),
            Err(NoiseError::AuthenticationFailed)
        );
        assert_eq!(rx.nonce(), 0);

        ct[0] ^= 1;
        assert_eq!(
            rx.decrypt_with_ad(b"ad", &ct),
            Err(NoiseError::AuthenticationFailed)
        );
        assert_eq!(rx.nonce(), 0);

        ct[0] ^= 1;
        assert_eq!(rx.decrypt_with_ad(b"ad", &ct).unwrap(), b"payload");
        assert_eq!(rx.nonce(), 1);
    }

    #[test]
    fn last_nonce_is_reserved() {
        let (mut tx, mut rx) = pair(CipherKind::ChaChaPoly);
        tx.set_nonce(u64::MAX - 1);
        rx.set_nonce(u64::MAX - 1);
        let ct = tx.encrypt(b"last").unwrap();
        assert_eq!(rx.decrypt(&ct).unwrap(), b"last");

        assert_eq!(tx.encrypt(b"one more"), Err(NoiseError::NonceExhausted));
        assert_eq!(rx.decrypt(&ct), Err(NoiseError::NonceExhausted));
        assert_eq!(tx.nonce(), u64::MAX);
    }

    #[test]
    fn rekey_resets_nonce_and_agrees() {
        for cipher in CipherKind::ALL {
            let (mut tx, mut rx) = pair(*cipher);
            let ct = tx.encrypt(b"before").unwrap();
            rx.decrypt(&ct).unwrap();

            tx.rekey();
            rx.rekey();
            assert_eq!(tx.nonce(), 0);
            assert_eq!(rx.nonce(), 0);

            let ct = tx.encrypt(b"after").unwrap();
            assert_eq!(rx.decrypt(&ct).unwrap(), b"after");

            // The old key no longer works.
            let (_, mut stale) = pair(*cipher);
            assert_eq!(stale.decrypt(&ct), Err(NoiseError::AuthenticationFailed));
        }
    }

    #[test]
    fn short_ciphertext_is_malformed() {
        let (_, mut rx) = pair(CipherKind::AesGcm);
        assert_eq!(rx.decrypt(&[0u8; 15]), Err(NoiseError::MalformedMessage));
        assert_eq!(rx.nonce(), 0);
    }

    #[test]
    fn size_limit() {
        let (mut tx, mut rx) = pair(CipherKind::ChaChaPoly);
        let big = vec![0u8; MAX_MESSAGE_LEN - 16 + 1];
        assert_eq!(tx.encrypt(&big), Err(NoiseError::MessageTooLarge));
        assert_eq!(tx.nonce(), 0);

        tx.set_max_message_size(None);
        let ct = tx.encrypt(&big).unwrap();
        assert_eq!(rx.decrypt(&ct), Err(NoiseError::MessageTooLarge));
        rx.set_max_message_size(None);
        assert_eq!(rx.decrypt(&ct).unwrap(), big);
    }

    #[test]
    fn wrong_key_length() {
        assert!(CipherState::new(CipherKind::ChaChaPoly, &[0u8; 16]).is_err());
    }
}
