use zeroize::Zeroizing;

use crate::cipherstate::CipherState;
use crate::crypto::{CipherKind, HashKind};
use crate::error::NoiseError;

/// The chaining key and transcript hash of a handshake in progress.
pub(crate) struct SymmetricState {
    hash: HashKind,
    cipher: CipherKind,
    // Instead of `has_key`, use an `Option`.
    cipherstate: Option<CipherState>,
    h: Vec<u8>,
    ck: Zeroizing<Vec<u8>>,
}

impl SymmetricState {
    /// Initialize a `SymmetricState` with a protocol name.
    pub fn new(protocol_name: &str, cipher: CipherKind, hash: HashKind) -> SymmetricState {
        let name = protocol_name.as_bytes();
        let h = if name.len() <= hash.hash_len() {
            let mut h = vec![0u8; hash.hash_len()];
            h[..name.len()].copy_from_slice(name);
            h
        } else {
            hash.hash(&[name])
        };

        SymmetricState {
            hash,
            cipher,
            cipherstate: None,
            ck: Zeroizing::new(h.clone()),
            h,
        }
    }

    fn install_key(&mut self, temp_k: &[u8]) {
        let k = Zeroizing::new(temp_k[..self.cipher.key_len()].to_vec());
        let mut cs = CipherState::from_key(self.cipher, k);
        // Handshake messages are size-checked as a whole.
        cs.set_max_message_size(None);
        self.cipherstate = Some(cs);
    }

    pub fn mix_key(&mut self, data: &[u8]) {
        let [ck, temp_k] = self.hash.hkdf2(&self.ck, data);
        self.ck = ck;
        self.install_key(&temp_k);
    }

    pub fn mix_hash(&mut self, data: &[u8]) {
        self.h = self.hash.hash(&[self.h.as_slice(), data]);
    }

    /// Mix in a pre-shared key.
    pub fn mix_key_and_hash(&mut self, data: &[u8]) {
        let [ck, temp_h, temp_k] = self.hash.hkdf3(&self.ck, data);
        self.ck = ck;
        self.mix_hash(&temp_h);
        self.install_key(&temp_k);
    }

    pub fn has_key(&self) -> bool {
        self.cipherstate.is_some()
    }

    /// Length of `encrypt_and_hash` output for a plaintext of `len` bytes.
    pub fn encrypted_len(&self, len: usize) -> usize {
        if self.has_key() {
            len + self.cipher.tag_len()
        } else {
            len
        }
    }

    pub fn encrypt_and_hash(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, NoiseError> {
        let out = match self.cipherstate {
            Some(ref mut c) => c.encrypt_with_ad(&self.h, plaintext)?,
            None => plaintext.to_vec(),
        };
        self.mix_hash(&out);
        Ok(out)
    }

    pub fn decrypt_and_hash(&mut self, data: &[u8]) -> Result<Vec<u8>, NoiseError> {
        let out = match self.cipherstate {
            Some(ref mut c) => c.decrypt_with_ad(&self.h, data)?,
            None => data.to_vec(),
        };
        self.mix_hash(data);
        Ok(out)
    }

    /// Derive the two transport `CipherState`s: initiator to responder first.
    pub fn split(self) -> (CipherState, CipherState) {
        let [k1, k2] = self.hash.hkdf2(&self.ck, &[]);
        let key_len = self.cipher.key_len();
        let c1 = CipherState::from_key(self.cipher, Zeroizing::new(k1[..key_len].to_vec()));
        let c2 = CipherState::from_key(self.cipher, Zeroizing::new(k2[..key_len].to_vec()));
        (c1, c2)
    }

    pub fn handshake_hash(&self) -> &[u8] {
        &self.h
    }
}
