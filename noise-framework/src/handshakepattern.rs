//! Handshake patterns.
//!
//! Base patterns live in a static table. A [`HandshakePattern`] is a base
//! pattern with its `pskN` modifiers applied.

use crate::error::NoiseError;

/// A handshake message token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Token {
    E,
    S,
    EE,
    ES,
    SE,
    SS,
    Psk,
}

impl Token {
    pub fn as_str(self) -> &'static str {
        match self {
            E => "e",
            S => "s",
            EE => "ee",
            ES => "es",
            SE => "se",
            SS => "ss",
            Psk => "psk",
        }
    }
}

use self::Token::*;

struct BasePattern {
    name: &'static str,
    pre_i: &'static [Token],
    pre_r: &'static [Token],
    messages: &'static [&'static [Token]],
}

macro_rules! patterns {
    ($($name:expr => [$($pre_i:ident),*], [$($pre_r:ident),*], [$([$($t:ident),*]),+];)+) => {
        &[$(BasePattern {
            name: $name,
            pre_i: &[$($pre_i),*],
            pre_r: &[$($pre_r),*],
            messages: &[$(&[$($t),*]),+],
        }),+]
    };
}

static BASE_PATTERNS: &[BasePattern] = patterns! {
    // One-way.
    "N" => [], [S], [[E, ES]];
    "K" => [S], [S], [[E, ES, SS]];
    "X" => [], [S], [[E, ES, S, SS]];

    // Fundamental.
    "NN" => [], [], [[E], [E, EE]];
    "NK" => [], [S], [[E, ES], [E, EE]];
    "NX" => [], [], [[E], [E, EE, S, ES]];
    "XN" => [], [], [[E], [E, EE], [S, SE]];
    "XK" => [], [S], [[E, ES], [E, EE], [S, SE]];
    "XX" => [], [], [[E], [E, EE, S, ES], [S, SE]];
    "KN" => [S], [], [[E], [E, EE, SE]];
    "KK" => [S], [S], [[E, ES, SS], [E, EE, SE]];
    "KX" => [S], [], [[E], [E, EE, SE, S, ES]];
    "IN" => [], [], [[E, S], [E, EE, SE]];
    "IK" => [], [S], [[E, ES, S, SS], [E, EE, SE]];
    "IX" => [], [], [[E, S], [E, EE, SE, S, ES]];

    // Deferred.
    "NK1" => [], [S], [[E], [E, EE, ES]];
    "NX1" => [], [], [[E], [E, EE, S], [ES]];
    "X1N" => [], [], [[E], [E, EE], [S], [SE]];
    "X1K" => [], [S], [[E, ES], [E, EE], [S], [SE]];
    "XK1" => [], [S], [[E], [E, EE, ES], [S, SE]];
    "X1K1" => [], [S], [[E], [E, EE, ES], [S], [SE]];
    "X1X" => [], [], [[E], [E, EE, S, ES], [S], [SE]];
    "XX1" => [], [], [[E], [E, EE, S], [ES, S, SE]];
    "X1X1" => [], [], [[E], [E, EE, S], [ES, S], [SE]];
    "K1N" => [S], [], [[E], [E, EE], [SE]];
    "K1K" => [S], [S], [[E, ES], [E, EE], [SE]];
    "KK1" => [S], [S], [[E], [E, EE, SE, ES]];
    "K1K1" => [S], [S], [[E], [E, EE, ES], [SE]];
    "K1X" => [S], [], [[E], [E, EE, S, ES], [SE]];
    "KX1" => [S], [], [[E], [E, EE, SE, S], [ES]];
    "K1X1" => [S], [], [[E], [E, EE, S], [SE, ES]];
    "I1N" => [], [], [[E, S], [E, EE], [SE]];
    "I1K" => [], [S], [[E, ES, S], [E, EE], [SE]];
    "IK1" => [], [S], [[E, S], [E, EE, SE, ES]];
    "I1K1" => [], [S], [[E, S], [E, EE, ES], [SE]];
    "I1X" => [], [], [[E, S], [E, EE, S, ES], [SE]];
    "IX1" => [], [], [[E, S], [E, EE, SE, S], [ES]];
    "I1X1" => [], [], [[E, S], [E, EE, S], [SE, ES]];
};

/// Names of every base pattern, in table order.
pub fn base_pattern_names() -> impl Iterator<Item = &'static str> {
    BASE_PATTERNS.iter().map(|p| p.name)
}

/// Noise handshake pattern, with modifiers applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakePattern {
    name: String,
    pre_i: Vec<Token>,
    pre_r: Vec<Token>,
    msg_patterns: Vec<Vec<Token>>,
    num_psks: usize,
}

impl HandshakePattern {
    /// Look up a pattern such as `XX`, `NK1` or `NNpsk0+psk2`.
    pub fn from_name(name: &str) -> Result<Self, NoiseError> {
        let unsupported = || NoiseError::UnsupportedProtocol(format!("pattern {:?}", name));

        let split = name
            .find(|c: char| c.is_ascii_lowercase())
            .unwrap_or(name.len());
        let (base_name, modifiers) = name.split_at(split);

        let base = BASE_PATTERNS
            .iter()
            .find(|p| p.name == base_name)
            .ok_or_else(unsupported)?;

        let mut msg_patterns: Vec<Vec<Token>> =
            base.messages.iter().map(|m| m.to_vec()).collect();
        let mut seen = Vec::new();

        if !modifiers.is_empty() {
            for m in modifiers.split('+') {
                let index = parse_psk_modifier(m).ok_or_else(unsupported)?;
                if index > msg_patterns.len() || seen.contains(&index) {
                    return Err(unsupported());
                }
                seen.push(index);
                if index == 0 {
                    msg_patterns[0].insert(0, Psk);
                } else {
                    msg_patterns[index - 1].push(Psk);
                }
            }
        }

        Ok(HandshakePattern {
            name: name.to_string(),
            pre_i: base.pre_i.to_vec(),
            pre_r: base.pre_r.to_vec(),
            msg_patterns,
            num_psks: seen.len(),
        })
    }

    /// Full pattern name including modifiers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initiator pre-message.
    pub fn pre_i(&self) -> &[Token] {
        &self.pre_i
    }

    /// Responder pre-message.
    pub fn pre_r(&self) -> &[Token] {
        &self.pre_r
    }

    pub fn message_patterns(&self) -> &[Vec<Token>] {
        &self.msg_patterns
    }

    /// Only the initiator ever sends.
    pub fn is_one_way(&self) -> bool {
        self.msg_patterns.len() == 1
    }

    pub fn is_psk(&self) -> bool {
        self.num_psks > 0
    }

    pub fn num_psks(&self) -> usize {
        self.num_psks
    }

    /// Whether the initiator (or responder) static key takes part in the
    /// handshake at all.
    pub fn needs_local_static(&self, initiator: bool) -> bool {
        let own_pre = if initiator { &self.pre_i } else { &self.pre_r };
        if own_pre.contains(&S) {
            return true;
        }
        self.msg_patterns.iter().enumerate().any(|(i, m)| {
            let ours = (i % 2 == 0) == initiator;
            m.iter().any(|t| match *t {
                S => ours,
                SS => true,
                ES => !initiator,
                SE => initiator,
                _ => false,
            })
        })
    }

    /// Whether the peer's static key must be known before the handshake.
    pub fn needs_remote_static(&self, initiator: bool) -> bool {
        let peer_pre = if initiator { &self.pre_r } else { &self.pre_i };
        peer_pre.contains(&S)
    }
}

fn parse_psk_modifier(m: &str) -> Option<usize> {
    let digits = m.strip_prefix("psk")?;
    let index: usize = digits.parse().ok()?;
    // Reject forms like `psk01` so names round-trip.
    if index.to_string() != digits {
        return None;
    }
    Some(index)
}
