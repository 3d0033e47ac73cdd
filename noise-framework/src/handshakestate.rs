use rand_core::{CryptoRngCore, OsRng};

use crate::cipherstate::{CipherState, MAX_MESSAGE_LEN};
use crate::error::NoiseError;
use crate::handshakepattern::Token;
use crate::keys::{Keypair, Psk, PublicKey};
use crate::protocol::Protocol;
use crate::symmetricstate::SymmetricState;

/// Which side of the handshake we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Where a `HandshakeState` is in its life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakePhase {
    /// Message `n` (zero based) is next, to be written or read.
    AwaitingMessage(usize),
    Complete,
    /// Terminal. Every later call returns this error again.
    Failed(NoiseError),
}

/// The current action the caller must take to advance the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Call `write_message()` to produce the next handshake message.
    WriteMessage,
    /// Call `read_message()` with the peer's handshake message.
    ReadMessage,
    Complete,
    Failed,
}

/// Outcome of a successful `write_message` or `read_message`.
///
/// The bytes are the handshake message for a write and the decrypted payload
/// for a read.
#[derive(Debug)]
pub enum Progress {
    Continue(Vec<u8>),
    /// The last handshake message was processed.
    Done(Vec<u8>, HandshakeStatus),
}

impl Progress {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Progress::Continue(b) | Progress::Done(b, _) => b,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Progress::Done(..))
    }
}

/// Transport ciphers produced by a finished handshake.
#[derive(Debug)]
pub struct CipherStates {
    pub initiator_to_responder: CipherState,
    /// `None` for one-way patterns.
    pub responder_to_initiator: Option<CipherState>,
}

impl CipherStates {
    /// Arrange as `(send, receive)` for `role`.
    pub fn into_directional(self, role: Role) -> (Option<CipherState>, Option<CipherState>) {
        match role {
            Role::Initiator => (Some(self.initiator_to_responder), self.responder_to_initiator),
            Role::Responder => (self.responder_to_initiator, Some(self.initiator_to_responder)),
        }
    }
}

/// Everything a finished handshake hands back.
#[derive(Debug)]
pub struct HandshakeStatus {
    /// Final transcript hash. Useful for channel binding.
    pub handshake_hash: Vec<u8>,
    pub cipher_states: CipherStates,
    pub local_ephemeral: Option<PublicKey>,
    pub remote_static: Option<PublicKey>,
    pub remote_ephemeral: Option<PublicKey>,
}

/// Noise handshake state.
///
/// Created with [`HandshakeStateBuilder`]. Call `write_message` and
/// `read_message` in the order the pattern dictates until one of them
/// returns [`Progress::Done`].
pub struct HandshakeState {
    protocol: Protocol,
    role: Role,
    // Taken out while a message is processed, dropped on failure and
    // consumed by `split` on completion.
    symmetric: Option<SymmetricState>,
    s: Option<Keypair>,
    e: Option<Keypair>,
    rs: Option<PublicKey>,
    re: Option<PublicKey>,
    psks: Vec<Psk>,
    psk_index: usize,
    rng: Box<dyn CryptoRngCore + Send>,
    phase: HandshakePhase,
    max_message_size: Option<usize>,
    final_hash: Vec<u8>,
}

impl HandshakeState {
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_initiator(&self) -> bool {
        self.role == Role::Initiator
    }

    pub fn phase(&self) -> &HandshakePhase {
        &self.phase
    }

    /// What the caller should do next.
    pub fn next_action(&self) -> HandshakeAction {
        match self.phase {
            HandshakePhase::AwaitingMessage(n) if self.is_our_turn(n) => {
                HandshakeAction::WriteMessage
            }
            HandshakePhase::AwaitingMessage(_) => HandshakeAction::ReadMessage,
            HandshakePhase::Complete => HandshakeAction::Complete,
            HandshakePhase::Failed(_) => HandshakeAction::Failed,
        }
    }

    /// Current transcript hash, or the final one once complete.
    ///
    /// Empty after a failure.
    pub fn handshake_hash(&self) -> &[u8] {
        match self.symmetric {
            Some(ref s) => s.handshake_hash(),
            None => &self.final_hash,
        }
    }

    /// Remote static public key, if known yet.
    pub fn remote_static(&self) -> Option<&PublicKey> {
        self.rs.as_ref()
    }

    /// Remote ephemeral public key, if received yet.
    pub fn remote_ephemeral(&self) -> Option<&PublicKey> {
        self.re.as_ref()
    }

    fn is_our_turn(&self, message_index: usize) -> bool {
        (message_index % 2 == 0) == self.is_initiator()
    }

    /// Check the phase and hand out the index of the message to process.
    fn begin(&self, writing: bool) -> Result<usize, NoiseError> {
        match self.phase {
            HandshakePhase::Failed(ref e) => Err(e.clone()),
            HandshakePhase::Complete => Err(NoiseError::OutOfOrder),
            HandshakePhase::AwaitingMessage(n) if self.is_our_turn(n) == writing => Ok(n),
            HandshakePhase::AwaitingMessage(_) => Err(NoiseError::OutOfOrder),
        }
    }

    /// Takes a payload and returns the handshake message to send to the peer.
    pub fn write_message(&mut self, payload: &[u8]) -> Result<Progress, NoiseError> {
        let index = self.begin(true)?;
        let mut symmetric = self.symmetric.take().ok_or(NoiseError::OutOfOrder)?;

        match self.write_tokens(&mut symmetric, index, payload) {
            Ok(message) => {
                log::debug!(
                    "{}: wrote handshake message {} ({} bytes)",
                    self.protocol,
                    index,
                    message.len()
                );
                Ok(self.advance(symmetric, index, message))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Processes a handshake message from the peer and returns its payload.
    pub fn read_message(&mut self, message: &[u8]) -> Result<Progress, NoiseError> {
        let index = self.begin(false)?;
        let mut symmetric = self.symmetric.take().ok_or(NoiseError::OutOfOrder)?;

        match self.read_tokens(&mut symmetric, index, message) {
            Ok(payload) => {
                log::debug!(
                    "{}: read handshake message {} ({} bytes)",
                    self.protocol,
                    index,
                    message.len()
                );
                Ok(self.advance(symmetric, index, payload))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn check_size(&self, len: usize) -> Result<(), NoiseError> {
        match self.max_message_size {
            Some(max) if len > max => Err(NoiseError::MessageTooLarge),
            _ => Ok(()),
        }
    }

    fn write_tokens(
        &mut self,
        symmetric: &mut SymmetricState,
        index: usize,
        payload: &[u8],
    ) -> Result<Vec<u8>, NoiseError> {
        let dh = self.protocol.dh();
        let is_psk = self.protocol.is_psk();
        let tokens = self.protocol.pattern().message_patterns()[index].clone();
        let mut out = Vec::new();

        for t in tokens {
            log::trace!("{}: write token {}", self.protocol, t.as_str());
            match t {
                Token::E => {
                    let rng = &mut self.rng;
                    let e = self
                        .e
                        .get_or_insert_with(|| Keypair::generate(dh, &mut **rng));
                    let e_pub = e.public().clone();
                    symmetric.mix_hash(e_pub.as_bytes());
                    if is_psk {
                        symmetric.mix_key(e_pub.as_bytes());
                    }
                    out.extend_from_slice(e_pub.as_bytes());
                }
                Token::S => {
                    let s = self
                        .s
                        .as_ref()
                        .ok_or(NoiseError::InvalidConfig("no local static key"))?;
                    let encrypted_s = symmetric.encrypt_and_hash(s.public().as_bytes())?;
                    out.extend_from_slice(&encrypted_s);
                }
                Token::Psk => self.mix_psk(symmetric)?,
                t => self.perform_dh(symmetric, t)?,
            }
        }

        let encrypted_payload = symmetric.encrypt_and_hash(payload)?;
        out.extend_from_slice(&encrypted_payload);
        self.check_size(out.len())?;
        Ok(out)
    }

    fn read_tokens(
        &mut self,
        symmetric: &mut SymmetricState,
        index: usize,
        message: &[u8],
    ) -> Result<Vec<u8>, NoiseError> {
        self.check_size(message.len())?;

        let dh = self.protocol.dh();
        let is_psk = self.protocol.is_psk();
        let tokens = self.protocol.pattern().message_patterns()[index].clone();
        let mut data = message;

        for t in tokens {
            log::trace!("{}: read token {}", self.protocol, t.as_str());
            match t {
                Token::E => {
                    let re = PublicKey::from_bytes(dh, take(&mut data, dh.pub_len())?)?;
                    symmetric.mix_hash(re.as_bytes());
                    if is_psk {
                        symmetric.mix_key(re.as_bytes());
                    }
                    self.re = Some(re);
                }
                Token::S => {
                    let temp = take(&mut data, symmetric.encrypted_len(dh.pub_len()))?;
                    let rs = symmetric.decrypt_and_hash(temp)?;
                    self.rs = Some(PublicKey::from_bytes(dh, &rs)?);
                }
                Token::Psk => self.mix_psk(symmetric)?,
                t => self.perform_dh(symmetric, t)?,
            }
        }

        if data.len() < symmetric.encrypted_len(0) {
            return Err(NoiseError::MalformedMessage);
        }
        symmetric.decrypt_and_hash(data)
    }

    fn mix_psk(&mut self, symmetric: &mut SymmetricState) -> Result<(), NoiseError> {
        let psk = self
            .psks
            .get(self.psk_index)
            .ok_or(NoiseError::InvalidConfig("not enough pre-shared keys"))?;
        symmetric.mix_key_and_hash(psk.as_bytes());
        self.psk_index += 1;
        Ok(())
    }

    fn perform_dh(&self, symmetric: &mut SymmetricState, t: Token) -> Result<(), NoiseError> {
        let dh = |a: Option<&Keypair>, b: Option<&PublicKey>| match (a, b) {
            (Some(a), Some(b)) => a.dh(b),
            _ => Err(NoiseError::InvalidConfig("key required for DH is missing")),
        };

        let initiator = self.is_initiator();
        let k = match t {
            Token::EE => dh(self.e.as_ref(), self.re.as_ref()),
            Token::ES if initiator => dh(self.e.as_ref(), self.rs.as_ref()),
            Token::ES => dh(self.s.as_ref(), self.re.as_ref()),
            Token::SE if initiator => dh(self.s.as_ref(), self.re.as_ref()),
            Token::SE => dh(self.e.as_ref(), self.rs.as_ref()),
            Token::SS => dh(self.s.as_ref(), self.rs.as_ref()),
            Token::E | Token::S | Token::Psk => unreachable!("not a DH token"),
        }?;

        symmetric.mix_key(&k);
        Ok(())
    }

    fn advance(&mut self, symmetric: SymmetricState, index: usize, bytes: Vec<u8>) -> Progress {
        let next = index + 1;
        if next < self.protocol.pattern().message_patterns().len() {
            self.symmetric = Some(symmetric);
            self.phase = HandshakePhase::AwaitingMessage(next);
            return Progress::Continue(bytes);
        }

        self.final_hash = symmetric.handshake_hash().to_vec();
        let (mut c1, mut c2) = symmetric.split();
        c1.set_max_message_size(self.max_message_size);
        c2.set_max_message_size(self.max_message_size);
        let responder_to_initiator = if self.protocol.is_one_way() {
            None
        } else {
            Some(c2)
        };

        let local_ephemeral = self.e.as_ref().map(|e| e.public().clone());
        self.drop_secrets();
        self.phase = HandshakePhase::Complete;
        log::debug!("{}: handshake complete", self.protocol);

        Progress::Done(
            bytes,
            HandshakeStatus {
                handshake_hash: self.final_hash.clone(),
                cipher_states: CipherStates {
                    initiator_to_responder: c1,
                    responder_to_initiator,
                },
                local_ephemeral,
                remote_static: self.rs.clone(),
                remote_ephemeral: self.re.clone(),
            },
        )
    }

    fn fail(&mut self, e: NoiseError) -> NoiseError {
        log::debug!("{}: handshake failed: {}", self.protocol, e);
        self.drop_secrets();
        self.phase = HandshakePhase::Failed(e.clone());
        e
    }

    fn drop_secrets(&mut self) {
        self.symmetric = None;
        self.s = None;
        self.e = None;
        self.psks.clear();
    }
}

/// Consume the next `n` bytes of `data`.
fn take<'a>(data: &mut &'a [u8], n: usize) -> Result<&'a [u8], NoiseError> {
    if data.len() < n {
        return Err(NoiseError::MalformedMessage);
    }
    let (head, rest) = data.split_at(n);
    *data = rest;
    Ok(head)
}

/// Builder for `HandshakeState`.
pub struct HandshakeStateBuilder {
    protocol: Protocol,
    role: Option<Role>,
    prologue: Vec<u8>,
    s: Option<Keypair>,
    e: Option<Keypair>,
    rs: Option<PublicKey>,
    psks: Vec<Psk>,
    rng: Option<Box<dyn CryptoRngCore + Send>>,
    max_message_size: Option<usize>,
}

impl HandshakeStateBuilder {
    pub fn new(protocol: Protocol) -> Self {
        HandshakeStateBuilder {
            protocol,
            role: None,
            prologue: Vec::new(),
            s: None,
            e: None,
            rs: None,
            psks: Vec::new(),
            rng: None,
            max_message_size: Some(MAX_MESSAGE_LEN),
        }
    }

    pub fn set_role(&mut self, role: Role) -> &mut Self {
        self.role = Some(role);
        self
    }

    pub fn set_is_initiator(&mut self, is: bool) -> &mut Self {
        self.set_role(if is { Role::Initiator } else { Role::Responder })
    }

    pub fn set_prologue(&mut self, prologue: &[u8]) -> &mut Self {
        self.prologue = prologue.to_vec();
        self
    }

    pub fn set_s(&mut self, s: Keypair) -> &mut Self {
        self.s = Some(s);
        self
    }

    /// Use a fixed ephemeral key instead of generating one. For testing.
    pub fn set_e(&mut self, e: Keypair) -> &mut Self {
        self.e = Some(e);
        self
    }

    pub fn set_rs(&mut self, rs: PublicKey) -> &mut Self {
        self.rs = Some(rs);
        self
    }

    /// Add the next pre-shared key. One is needed per `psk` token, in order.
    pub fn add_psk(&mut self, psk: Psk) -> &mut Self {
        self.psks.push(psk);
        self
    }

    /// Defaults to `OsRng`.
    pub fn set_rng<R>(&mut self, rng: R) -> &mut Self
    where
        R: CryptoRngCore + Send + 'static,
    {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Defaults to 65535. `None` removes the limit.
    pub fn set_max_message_size(&mut self, max: Option<usize>) -> &mut Self {
        self.max_message_size = max;
        self
    }

    fn validate(&self) -> Result<Role, NoiseError> {
        let role = self.role.ok_or(NoiseError::InvalidConfig("role not set"))?;
        let initiator = role == Role::Initiator;
        let dh = self.protocol.dh();
        let pattern = self.protocol.pattern();

        let kinds = self
            .s
            .iter()
            .chain(self.e.iter())
            .map(|k| k.dh_kind())
            .chain(self.rs.iter().map(|k| k.dh()));
        for kind in kinds {
            if kind != dh {
                return Err(NoiseError::InvalidConfig(
                    "key does not match the protocol's DH function",
                ));
            }
        }

        if self.s.is_none() && pattern.needs_local_static(initiator) {
            return Err(NoiseError::InvalidConfig("pattern requires a local static key"));
        }
        if self.rs.is_none() && pattern.needs_remote_static(initiator) {
            return Err(NoiseError::InvalidConfig("pattern requires the remote static key"));
        }
        if self.psks.len() != pattern.num_psks() {
            return Err(NoiseError::InvalidConfig("wrong number of pre-shared keys"));
        }
        Ok(role)
    }

    /// Build `HandshakeState`.
    ///
    /// Fails with `InvalidConfig` when the keys do not fit the pattern and
    /// role. The builder can be reused; a custom RNG is handed to the first
    /// state built.
    pub fn build_handshake_state(&mut self) -> Result<HandshakeState, NoiseError> {
        let role = self.validate()?;
        let initiator = role == Role::Initiator;
        let protocol = self.protocol.clone();
        let name = protocol.to_string();

        let mut symmetric = SymmetricState::new(&name, protocol.cipher(), protocol.hash());
        symmetric.mix_hash(&self.prologue);

        let local_s = self.s.as_ref().map(|s| s.public());
        let (pre_i_key, pre_r_key) = if initiator {
            (local_s, self.rs.as_ref())
        } else {
            (self.rs.as_ref(), local_s)
        };
        for (tokens, key) in [
            (protocol.pattern().pre_i(), pre_i_key),
            (protocol.pattern().pre_r(), pre_r_key),
        ] {
            for t in tokens {
                match (t, key) {
                    (Token::S, Some(key)) => symmetric.mix_hash(key.as_bytes()),
                    _ => {
                        return Err(NoiseError::InvalidConfig(
                            "pre-message key not available",
                        ))
                    }
                }
            }
        }

        log::debug!("{}: new handshake as {:?}", name, role);

        Ok(HandshakeState {
            role,
            symmetric: Some(symmetric),
            s: self.s.clone(),
            e: self.e.clone(),
            rs: self.rs.clone(),
            re: None,
            psks: self.psks.clone(),
            psk_index: 0,
            rng: match self.rng.take() {
                Some(rng) => rng,
                None => Box::new(OsRng),
            },
            phase: HandshakePhase::AwaitingMessage(0),
            max_message_size: self.max_message_size,
            final_hash: Vec::new(),
            protocol,
        })
    }
}
