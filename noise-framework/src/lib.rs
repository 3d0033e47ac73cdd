//! Rust implementation of the [Noise Protocol
//! Framework](http://www.noiseprotocol.org/).
//!
//! Parse a protocol name into a [`Protocol`], configure a
//! [`HandshakeStateBuilder`] with the role and key material, then call
//! `write_message` and `read_message` until one of them returns
//! [`Progress::Done`]. The [`HandshakeStatus`] it carries holds the two
//! transport [`CipherState`]s.
//!
//! ```
//! use noise_framework::{HandshakeStateBuilder, Progress, Protocol};
//!
//! let protocol: Protocol = "Noise_NN_25519_ChaChaPoly_BLAKE2s".parse().unwrap();
//! let mut initiator = HandshakeStateBuilder::new(protocol.clone())
//!     .set_is_initiator(true)
//!     .build_handshake_state()
//!     .unwrap();
//! let mut responder = HandshakeStateBuilder::new(protocol)
//!     .set_is_initiator(false)
//!     .build_handshake_state()
//!     .unwrap();
//!
//! let m1 = initiator.write_message(b"").unwrap();
//! responder.read_message(m1.bytes()).unwrap();
//! let m2 = responder.write_message(b"").unwrap();
//! let done = initiator.read_message(m2.bytes()).unwrap();
//! assert!(done.is_done());
//! ```
//!
//! DH, cipher and hash functions form a closed set (see [`crypto`]), chosen
//! by name at runtime.

mod cipherstate;
pub mod crypto;
mod error;
mod handshakepattern;
mod handshakestate;
mod keys;
mod protocol;
mod symmetricstate;
mod traits;

pub use crate::cipherstate::{CipherState, MAX_MESSAGE_LEN};
pub use crate::crypto::{CipherKind, DhKind, HashKind};
pub use crate::error::NoiseError;
pub use crate::handshakestate::{
    CipherStates, HandshakeAction, HandshakePhase, HandshakeState, HandshakeStateBuilder,
    HandshakeStatus, Progress, Role,
};
pub use crate::keys::{Keypair, Psk, PublicKey};
pub use crate::protocol::Protocol;
pub use crate::traits::{Cipher, Dh, Hash, U8Array};

/// Handshake patterns.
pub mod patterns {
    pub use crate::handshakepattern::{base_pattern_names, HandshakePattern, Token};
}
