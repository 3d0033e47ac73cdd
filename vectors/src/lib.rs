//! Replay and record Noise test vectors in the JSON format shared by
//! cacophony, noise-c and snow.
//!
//! Each vector carries the key material of both parties and the expected
//! wire bytes of every message. Both sides are driven independently: a side
//! writes and compares when it is its turn, and otherwise reads the expected
//! ciphertext and compares the payload.

use noise_framework::{
    CipherState, HandshakeAction, HandshakeState, HandshakeStateBuilder, Keypair,
    NoiseError, Progress, Protocol, Psk, PublicKey, Role,
};
use rand_core::{CryptoRng, CryptoRngCore, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexString(String);

impl HexString {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        HexString(hex::encode(bytes))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, VectorError> {
        Ok(hex::decode(&self.0)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub payload: HexString,
    pub ciphertext: HexString,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub protocol_name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub fail: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub fallback: bool,

    pub init_prologue: HexString,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_psks: Vec<HexString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_static: Option<HexString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_ephemeral: Option<HexString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_remote_static: Option<HexString>,

    pub resp_prologue: HexString,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resp_psks: Vec<HexString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp_static: Option<HexString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp_ephemeral: Option<HexString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp_remote_static: Option<HexString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handshake_hash: Option<HexString>,
    pub messages: Vec<Message>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Top level of a vectors file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorFile {
    pub vectors: Vec<Vector>,
}

impl VectorFile {
    pub fn from_json(s: &str) -> Result<Self, VectorError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, VectorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("bad hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("bad json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Noise(#[from] NoiseError),
    #[error("protocol name {parsed} does not match {expected}")]
    NameMismatch { expected: String, parsed: String },
    #[error("message {index}: {what} mismatch")]
    Mismatch { index: usize, what: &'static str },
    #[error("message {index}: transport used before the handshake finished")]
    NoTransport { index: usize },
    #[error("handshake ran out of messages")]
    Incomplete,
    #[error("handshake hash mismatch")]
    HandshakeHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// The vector needs something this crate does not implement.
    Skipped(&'static str),
}

/// Stands in for the RNG when a vector supplies every ephemeral key.
struct FailRng;

impl RngCore for FailRng {
    fn next_u32(&mut self) -> u32 {
        panic!("vector did not supply an ephemeral key")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("vector did not supply an ephemeral key")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("vector did not supply an ephemeral key")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
        panic!("vector did not supply an ephemeral key")
    }
}

impl CryptoRng for FailRng {}

struct Side<'a> {
    prologue: &'a HexString,
    psks: &'a [HexString],
    s: Option<&'a HexString>,
    e: Option<&'a HexString>,
    rs: Option<&'a HexString>,
}

impl Vector {
    fn side(&self, role: Role) -> Side<'_> {
        match role {
            Role::Initiator => Side {
                prologue: &self.init_prologue,
                psks: &self.init_psks,
                s: self.init_static.as_ref(),
                e: self.init_ephemeral.as_ref(),
                rs: self.init_remote_static.as_ref(),
            },
            Role::Responder => Side {
                prologue: &self.resp_prologue,
                psks: &self.resp_psks,
                s: self.resp_static.as_ref(),
                e: self.resp_ephemeral.as_ref(),
                rs: self.resp_remote_static.as_ref(),
            },
        }
    }
}

fn build(protocol: &Protocol, role: Role, side: &Side) -> Result<HandshakeState, VectorError> {
    let dh = protocol.dh();
    let mut builder = HandshakeStateBuilder::new(protocol.clone());
    builder
        .set_role(role)
        .set_prologue(&side.prologue.to_bytes()?)
        .set_rng(FailRng);
    if let Some(s) = side.s {
        builder.set_s(Keypair::from_private_bytes(dh, &s.to_bytes()?)?);
    }
    if let Some(e) = side.e {
        builder.set_e(Keypair::from_private_bytes(dh, &e.to_bytes()?)?);
    }
    if let Some(rs) = side.rs {
        builder.set_rs(PublicKey::from_bytes(dh, &rs.to_bytes()?)?);
    }
    for psk in side.psks {
        builder.add_psk(Psk::from_slice(&psk.to_bytes()?)?);
    }
    Ok(builder.build_handshake_state()?)
}

/// Whether transport message `index` (counted over the whole vector) is sent
/// by the initiator.
fn initiator_sends(protocol: &Protocol, index: usize) -> bool {
    protocol.is_one_way() || index % 2 == 0
}

/// Drive one party through every message of `v`.
fn replay_side(protocol: &Protocol, role: Role, v: &Vector) -> Result<(), VectorError> {
    let mut hs = build(protocol, role, &v.side(role))?;
    let mut messages = v.messages.iter().enumerate();
    let mut transport: Option<(Option<CipherState>, Option<CipherState>)> = None;

    for (index, m) in messages.by_ref() {
        let payload = m.payload.to_bytes()?;
        let ciphertext = m.ciphertext.to_bytes()?;

        let progress = match hs.next_action() {
            HandshakeAction::WriteMessage => {
                let p = hs.write_message(&payload)?;
                if p.bytes() != ciphertext.as_slice() {
                    return Err(VectorError::Mismatch { index, what: "ciphertext" });
                }
                p
            }
            HandshakeAction::ReadMessage => {
                let p = hs.read_message(&ciphertext)?;
                if p.bytes() != payload.as_slice() {
                    return Err(VectorError::Mismatch { index, what: "payload" });
                }
                p
            }
            HandshakeAction::Complete | HandshakeAction::Failed => {
                return Err(VectorError::Incomplete)
            }
        };

        if let Progress::Done(_, status) = progress {
            if let Some(expected) = &v.handshake_hash {
                if status.handshake_hash != expected.to_bytes()? {
                    return Err(VectorError::HandshakeHash);
                }
            }
            transport = Some(status.cipher_states.into_directional(role));
            break;
        }
    }

    let (mut send, mut recv) = transport.ok_or(VectorError::Incomplete)?;
    for (index, m) in messages {
        let payload = m.payload.to_bytes()?;
        let ciphertext = m.ciphertext.to_bytes()?;
        let we_send = initiator_sends(protocol, index) == (role == Role::Initiator);

        if we_send {
            let c = send
                .as_mut()
                .ok_or(VectorError::NoTransport { index })?
                .encrypt(&payload)?;
            if c != ciphertext {
                return Err(VectorError::Mismatch { index, what: "transport ciphertext" });
            }
        } else {
            let p = recv
                .as_mut()
                .ok_or(VectorError::NoTransport { index })?
                .decrypt(&ciphertext)?;
            if p != payload {
                return Err(VectorError::Mismatch { index, what: "transport payload" });
            }
        }
    }
    Ok(())
}

/// Check one vector with both parties.
pub fn verify_vector(v: &Vector) -> Result<Outcome, VectorError> {
    if v.fail {
        return Ok(Outcome::Skipped("expected failure"));
    }
    if v.fallback {
        return Ok(Outcome::Skipped("fallback"));
    }
    let protocol: Protocol = match v.protocol_name.parse() {
        Ok(p) => p,
        Err(NoiseError::UnsupportedProtocol(_)) => return Ok(Outcome::Skipped("unsupported")),
        Err(e) => return Err(e.into()),
    };
    if protocol.to_string() != v.protocol_name {
        return Err(VectorError::NameMismatch {
            expected: v.protocol_name.clone(),
            parsed: protocol.to_string(),
        });
    }

    replay_side(&protocol, Role::Initiator, v)?;
    replay_side(&protocol, Role::Responder, v)?;
    log::debug!("vector {} passed", v.name.as_deref().unwrap_or(&v.protocol_name));
    Ok(Outcome::Passed)
}

/// Tally of a `verify_file` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub skipped: usize,
}

/// Verify every vector in a file, stopping at the first failure.
pub fn verify_file(file: &VectorFile) -> Result<Summary, (usize, VectorError)> {
    let mut summary = Summary::default();
    for (i, v) in file.vectors.iter().enumerate() {
        match verify_vector(v).map_err(|e| (i, e))? {
            Outcome::Passed => summary.passed += 1,
            Outcome::Skipped(why) => {
                log::info!("skipping {}: {}", v.protocol_name, why);
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

/// Record a vector by running a live handshake with fresh keys from `rng`,
/// one message per entry of `payloads`. Payloads beyond the handshake go over
/// the transport ciphers.
pub fn record_vector(
    protocol: &Protocol,
    prologue: &[u8],
    payloads: &[&[u8]],
    rng: &mut dyn CryptoRngCore,
) -> Result<Vector, VectorError> {
    let dh = protocol.dh();
    let pattern = protocol.pattern();
    let init_s = pattern
        .needs_local_static(true)
        .then(|| Keypair::generate(dh, &mut *rng));
    let resp_s = pattern
        .needs_local_static(false)
        .then(|| Keypair::generate(dh, &mut *rng));
    let init_e = Keypair::generate(dh, rng);
    let resp_e = Keypair::generate(dh, rng);
    let mut psks = Vec::new();
    for _ in 0..pattern.num_psks() {
        let mut psk = [0u8; 32];
        rng.fill_bytes(&mut psk);
        psks.push(HexString::from_bytes(&psk));
    }

    let secret = |k: &Keypair| HexString::from_bytes(k.secret_bytes());
    let public = |k: &Keypair| HexString::from_bytes(k.public().as_bytes());
    let init_rs = resp_s
        .as_ref()
        .filter(|_| pattern.needs_remote_static(true))
        .map(public);
    let resp_rs = init_s
        .as_ref()
        .filter(|_| pattern.needs_remote_static(false))
        .map(public);

    let mut v = Vector {
        name: None,
        protocol_name: protocol.to_string(),
        fail: false,
        fallback: false,
        init_prologue: HexString::from_bytes(prologue),
        init_psks: psks.clone(),
        init_static: init_s.as_ref().map(secret),
        init_ephemeral: Some(secret(&init_e)),
        init_remote_static: init_rs,
        resp_prologue: HexString::from_bytes(prologue),
        resp_psks: psks,
        resp_static: resp_s.as_ref().map(secret),
        resp_ephemeral: Some(secret(&resp_e)),
        resp_remote_static: resp_rs,
        handshake_hash: None,
        messages: Vec::new(),
    };

    let mut init = build(protocol, Role::Initiator, &v.side(Role::Initiator))?;
    let mut resp = build(protocol, Role::Responder, &v.side(Role::Responder))?;
    let mut payloads = payloads.iter().enumerate();
    let mut ciphers = None;

    for (index, payload) in payloads.by_ref() {
        let (writer, reader) = if init.next_action() == HandshakeAction::WriteMessage {
            (&mut init, &mut resp)
        } else {
            (&mut resp, &mut init)
        };
        let message = writer.write_message(payload)?;
        let read = reader.read_message(message.bytes())?;
        if read.bytes() != *payload {
            return Err(VectorError::Mismatch { index, what: "payload" });
        }
        v.messages.push(Message {
            payload: HexString::from_bytes(payload),
            ciphertext: HexString::from_bytes(message.bytes()),
        });
        if let (Progress::Done(_, a), Progress::Done(_, b)) = (message, read) {
            v.handshake_hash = Some(HexString::from_bytes(&a.handshake_hash));
            // `a` is the writer's, which may be either party. Both hold the
            // same keys in each direction.
            ciphers = Some((a.cipher_states, b.cipher_states));
            break;
        }
    }

    if let Some((mut a, mut b)) = ciphers {
        for (index, payload) in payloads {
            let (tx, rx) = if initiator_sends(protocol, index) {
                (&mut a.initiator_to_responder, &mut b.initiator_to_responder)
            } else {
                match (
                    a.responder_to_initiator.as_mut(),
                    b.responder_to_initiator.as_mut(),
                ) {
                    (Some(tx), Some(rx)) => (tx, rx),
                    _ => return Err(VectorError::NoTransport { index }),
                }
            };
            let c = tx.encrypt(payload)?;
            if rx.decrypt(&c)? != *payload {
                return Err(VectorError::Mismatch { index, what: "transport payload" });
            }
            v.messages.push(Message {
                payload: HexString::from_bytes(payload),
                ciphertext: HexString::from_bytes(&c),
            });
        }
    }

    Ok(v)
}
