use byteorder::{BigEndian, ByteOrder, LittleEndian};
use zeroize::Zeroize;

use super::sensitive::Sensitive;
use crate::traits::{Cipher, U8Array};

const TAGLEN: usize = 16;

pub enum ChaChaPoly {}

pub enum AesGcm {}

impl Cipher for ChaChaPoly {
    type Key = Sensitive<[u8; 32]>;

    fn name() -> &'static str {
        "ChaChaPoly"
    }

    fn encrypt(k: &Self::Key, nonce: u64, ad: &[u8], plaintext: &[u8], out: &mut [u8]) {
        use chacha20poly1305::aead::{generic_array::GenericArray, AeadInPlace, KeyInit};
        use chacha20poly1305::ChaCha20Poly1305;

        assert_eq!(plaintext.len() + TAGLEN, out.len());

        let mut nonce_bytes = [0u8; 12];
        LittleEndian::write_u64(&mut nonce_bytes[4..], nonce);

        let cipher = ChaCha20Poly1305::new(GenericArray::from_slice(k.as_slice()));
        let (c, t) = out.split_at_mut(plaintext.len());
        c.copy_from_slice(plaintext);
        let tag = cipher
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce_bytes), ad, c)
            .expect("plaintext within ChaCha20-Poly1305 limits");
        t.copy_from_slice(&tag);
    }

    fn decrypt(
        k: &Self::Key,
        nonce: u64,
        ad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<(), ()> {
        use chacha20poly1305::aead::{generic_array::GenericArray, AeadInPlace, KeyInit};
        use chacha20poly1305::ChaCha20Poly1305;

        assert_eq!(ciphertext.len(), out.len() + TAGLEN);

        let mut nonce_bytes = [0u8; 12];
        LittleEndian::write_u64(&mut nonce_bytes[4..], nonce);

        let cipher = ChaCha20Poly1305::new(GenericArray::from_slice(k.as_slice()));
        let text_len = ciphertext.len() - TAGLEN;
        out.copy_from_slice(&ciphertext[..text_len]);
        cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(&nonce_bytes),
                ad,
                out,
                GenericArray::from_slice(&ciphertext[text_len..]),
            )
            .map_err(|_| out.zeroize())
    }
}

impl Cipher for AesGcm {
    type Key = Sensitive<[u8; 32]>;

    fn name() -> &'static str {
        "AESGCM"
    }

    fn encrypt(k: &Self::Key, nonce: u64, ad: &[u8], plaintext: &[u8], out: &mut [u8]) {
        use aes_gcm::aead::{generic_array::GenericArray, AeadInPlace, KeyInit};
        use aes_gcm::Aes256Gcm;

        assert_eq!(plaintext.len() + TAGLEN, out.len());

        // AES-GCM takes the counter big-endian.
        let mut nonce_bytes = [0u8; 12];
        BigEndian::write_u64(&mut nonce_bytes[4..], nonce);

        let cipher = Aes256Gcm::new(GenericArray::from_slice(k.as_slice()));
        let (c, t) = out.split_at_mut(plaintext.len());
        c.copy_from_slice(plaintext);
        let tag = cipher
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce_bytes), ad, c)
            .expect("plaintext within AES-GCM limits");
        t.copy_from_slice(&tag);
    }

    fn decrypt(
        k: &Self::Key,
        nonce: u64,
        ad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<(), ()> {
        use aes_gcm::aead::{generic_array::GenericArray, AeadInPlace, KeyInit};
        use aes_gcm::Aes256Gcm;

        assert_eq!(ciphertext.len(), out.len() + TAGLEN);

        let mut nonce_bytes = [0u8; 12];
        BigEndian::write_u64(&mut nonce_bytes[4..], nonce);

        let cipher = Aes256Gcm::new(GenericArray::from_slice(k.as_slice()));
        let text_len = ciphertext.len() - TAGLEN;
        out.copy_from_slice(&ciphertext[..text_len]);
        cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(&nonce_bytes),
                ad,
                out,
                GenericArray::from_slice(&ciphertext[text_len..]),
            )
            .map_err(|_| out.zeroize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: u8) -> Sensitive<[u8; 32]> {
        Sensitive::new_with(v)
    }

    #[test]
    fn chachapoly_round_trip() {
        // Empty plaintext.
        let key = key(0);
        let nonce = 0u64;
        let plaintext = [0u8; 0];
        let authtext = [0u8; 0];
        let mut ciphertext = [0u8; 16];
        ChaChaPoly::encrypt(&key, nonce, &authtext, &plaintext, &mut ciphertext);

        let mut resulttext = [0u8; 0];
        assert!(ChaChaPoly::decrypt(&key, nonce, &authtext, &ciphertext, &mut resulttext).is_ok());
        ciphertext[0] ^= 1;
        assert!(ChaChaPoly::decrypt(&key, nonce, &authtext, &ciphertext, &mut resulttext).is_err());

        // Non-empty plaintext.
        let plaintext = [0x34u8; 117];
        let mut ciphertext = [0u8; 133];
        ChaChaPoly::encrypt(&key, nonce, &authtext, &plaintext, &mut ciphertext);

        let mut resulttext = [0u8; 117];
        assert!(ChaChaPoly::decrypt(&key, nonce, &authtext, &ciphertext, &mut resulttext).is_ok());
        assert_eq!(resulttext, plaintext);
    }

    #[test]
    fn chachapoly_known_answer() {
        // RFC 7539, appendix A.5.
        let key = Sensitive::<[u8; 32]>::from_slice(
            &hex::decode("1c9240a5eb55d38af333888604f6b5f0473917c1402b80099dca5cbc207075c0")
                .unwrap(),
        );
        let nonce = 0x0807060504030201u64;
        let ciphertext = hex::decode(
            "64a0861575861af460f062c79be643bd\
             5e805cfd345cf389f108670ac76c8cb2\
             4c6cfc18755d43eea09ee94e382d26b0\
             bdb7b73c321b0100d4f03b7f355894cf\
             332f830e710b97ce98c8a84abd0b9481\
             14ad176e008d33bd60f982b1ff37c855\
             9797a06ef4f0ef61c186324e2b350638\
             3606907b6a7c02b0f9f6157b53c867e4\
             b9166c767b804d46a59b5216cde7a4e9\
             9040c5a40433225ee282a1b0a06c523e\
             af4534d7f83fa1155b0047718cbc546a\
             0d072b04b3564eea1b422273f548271a\
             0bb2316053fa76991955ebd63159434e\
             cebb4e466dae5a1073a6727627097a10\
             49e617d91d361094fa68f0ff77987130\
             305beaba2eda04df997b714d6c6f2c29\
             a6ad5cb4022b02709b",
        )
        .unwrap();
        let tag = hex::decode("eead9d67890cbb22392336fea1851f38").unwrap();
        let authtext = hex::decode("f33388860000000000004e91").unwrap();

        let mut combined = ciphertext.clone();
        combined.extend_from_slice(&tag);
        let mut out = vec![0u8; ciphertext.len()];
        assert!(ChaChaPoly::decrypt(&key, nonce, &authtext, &combined, &mut out).is_ok());

        let desired_plaintext = "496e7465726e65742d44726166747320\
                                 61726520647261667420646f63756d65\
                                 6e74732076616c696420666f72206120\
                                 6d6178696d756d206f6620736978206d\
                                 6f6e74687320616e64206d6179206265\
                                 20757064617465642c207265706c6163\
                                 65642c206f72206f62736f6c65746564\
                                 206279206f7468657220646f63756d65\
                                 6e747320617420616e792074696d652e\
                                 20497420697320696e617070726f7072\
                                 6961746520746f2075736520496e7465\
                                 726e65742d4472616674732061732072\
                                 65666572656e6365206d617465726961\
                                 6c206f7220746f206369746520746865\
                                 6d206f74686572207468616e20617320\
                                 2fe2809c776f726b20696e2070726f67\
                                 726573732e2fe2809d";
        assert_eq!(hex::encode(&out), desired_plaintext);
    }

    #[test]
    fn aesgcm_known_answer() {
        let key = key(0x42);
        let plaintext = b"hello noise";
        let mut out = [0u8; 11 + TAGLEN];
        AesGcm::encrypt(&key, 5, b"ad", plaintext, &mut out);
        assert_eq!(
            hex::encode(out),
            "aadedce91b06aba8512350508e8f198dadd09bbbb5b5c9721c7b71"
        );

        let mut back = [0u8; 11];
        assert!(AesGcm::decrypt(&key, 5, b"ad", &out, &mut back).is_ok());
        assert_eq!(&back, plaintext);
        assert!(AesGcm::decrypt(&key, 6, b"ad", &out, &mut back).is_err());
        assert!(AesGcm::decrypt(&key, 5, b"da", &out, &mut back).is_err());
    }

    #[test]
    fn failed_decrypt_leaves_no_plaintext() {
        let key = key(9);
        let mut ct = [0u8; 4 + TAGLEN];
        ChaChaPoly::encrypt(&key, 0, &[], b"abcd", &mut ct);
        ct[TAGLEN] ^= 0xff;
        let mut out = [0xaau8; 4];
        assert!(ChaChaPoly::decrypt(&key, 0, &[], &ct, &mut out).is_err());
        assert_eq!(out, [0u8; 4]);
    }

    #[test]
    fn rekey_known_answers() {
        assert_eq!(
            hex::encode(ChaChaPoly::rekey(&key(0x42)).as_slice()),
            "159f5119c24b03e867f41504aecfbe0708789c2285c6577effe3de06d2f03234"
        );
        assert_eq!(
            hex::encode(AesGcm::rekey(&key(0x42)).as_slice()),
            "3d6be346f64bea44dd203f2fe21e4da6a121c537e22b449949e2d2973f22ed1d"
        );
    }
}
