use noise_framework::patterns::base_pattern_names;
use noise_framework::{CipherKind, HashKind, Protocol};
use noise_vectors::*;
use rand::{rngs::StdRng, SeedableRng};

fn load() -> VectorFile {
    VectorFile::from_json(include_str!("vectors/noise-framework.json")).unwrap()
}

#[test]
fn noise_framework_vectors() {
    let file = load();
    for v in &file.vectors {
        if let Err(e) = verify_vector(v) {
            panic!("{}: {}", v.name.as_deref().unwrap_or(&v.protocol_name), e);
        }
    }
    let summary = verify_file(&file).unwrap();
    assert_eq!(summary, Summary { passed: 14, skipped: 3 });
}

#[test]
fn skipped_vectors() {
    let file = load();
    let outcomes: Vec<_> = file
        .vectors
        .iter()
        .filter_map(|v| match verify_vector(v).unwrap() {
            Outcome::Skipped(why) => Some(why),
            Outcome::Passed => None,
        })
        .collect();
    assert_eq!(outcomes, ["expected failure", "fallback", "unsupported"]);
}

#[test]
fn corrupted_vector_is_caught() {
    let mut v = load()
        .vectors
        .into_iter()
        .find(|v| v.protocol_name == "Noise_XX_25519_AESGCM_SHA256")
        .unwrap();
    let mut ct = v.messages[1].ciphertext.to_bytes().unwrap();
    let last = ct.len() - 1;
    ct[last] ^= 1;
    v.messages[1].ciphertext = HexString::from_bytes(&ct);

    assert!(verify_vector(&v).is_err());
}

#[test]
fn wrong_handshake_hash_is_caught() {
    let mut v = load()
        .vectors
        .into_iter()
        .find(|v| v.handshake_hash.is_some() && !v.fail && !v.fallback)
        .unwrap();
    v.handshake_hash = Some(HexString::from_bytes(&[0u8; 32]));
    assert!(matches!(verify_vector(&v), Err(VectorError::HandshakeHash)));
}

#[test]
fn recorded_vectors_replay() {
    let mut rng = StdRng::seed_from_u64(7);
    let payloads: [&[u8]; 5] = [b"alpha", b"", b"gamma", b"delta", b"epsilon"];

    let mut vectors = Vec::new();
    for pattern in base_pattern_names() {
        for (i, modifier) in ["", "psk0", "psk1"].iter().enumerate() {
            let cipher = CipherKind::ALL[i % CipherKind::ALL.len()];
            let hash = HashKind::ALL[(vectors.len() + i) % HashKind::ALL.len()];
            let name = format!(
                "Noise_{}{}_25519_{}_{}",
                pattern,
                modifier,
                cipher.name(),
                hash.name()
            );
            let protocol: Protocol = name.parse().unwrap();
            let v = record_vector(&protocol, b"prologue", &payloads, &mut rng).unwrap();
            assert_eq!(v.messages.len(), payloads.len());
            vectors.push(v);
        }
    }

    // Through JSON and back.
    let file = VectorFile { vectors };
    let json = file.to_json().unwrap();
    let file = VectorFile::from_json(&json).unwrap();

    let summary = verify_file(&file).unwrap();
    assert_eq!(summary.passed, file.vectors.len());
    assert_eq!(summary.skipped, 0);
}
