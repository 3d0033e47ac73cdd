/// Noise error type.
///
/// Everything except `UnsupportedProtocol`, `InvalidConfig` and `OutOfOrder` is
/// terminal for the `HandshakeState` that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoiseError {
    /// A component of the protocol name is unknown or the name is malformed.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    /// The handshake configuration does not fit the protocol.
    #[error("invalid handshake configuration: {0}")]
    InvalidConfig(&'static str),
    /// `write_message` was called when a read was due, or vice versa.
    #[error("handshake message out of order")]
    OutOfOrder,
    /// AEAD tag mismatch.
    #[error("authentication failed")]
    AuthenticationFailed,
    /// Undersized or structurally invalid wire input.
    #[error("malformed message")]
    MalformedMessage,
    /// A public key has the wrong length for the DH function.
    #[error("invalid public key")]
    InvalidPublicKey,
    /// The DH function rejected the peer's public key.
    #[error("diffie-hellman failed")]
    DhFailed,
    /// The nonce counter reached its maximum value.
    #[error("nonce exhausted")]
    NonceExhausted,
    /// A message exceeds the configured maximum size.
    #[error("message too large")]
    MessageTooLarge,
}
