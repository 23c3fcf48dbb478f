//! Channel framing for multiplexed exec streams.
//!
//! Two sub-protocols are understood:
//! - `channel.k8s.io`: binary messages whose first byte is the channel number
//! - `base64.channel.k8s.io`: text messages whose first character is the
//!   channel digit, followed by base64-encoded payload

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Logical sub-stream of an exec connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Stdin,
    Stdout,
    Stderr,
    Error,
    Resize,
}

impl Channel {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Stdin),
            1 => Some(Self::Stdout),
            2 => Some(Self::Stderr),
            3 => Some(Self::Error),
            4 => Some(Self::Resize),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Stdin => 0,
            Self::Stdout => 1,
            Self::Stderr => 2,
            Self::Error => 3,
            Self::Resize => 4,
        }
    }
}

/// A payload tagged with its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub channel: Channel,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(channel: Channel, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            channel,
            payload: payload.into(),
        }
    }

    /// Payload as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Exec stream sub-protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelProtocol {
    #[default]
    Binary,
    Base64,
}

impl ChannelProtocol {
    /// Value of the `Sec-WebSocket-Protocol` header.
    pub fn name(self) -> &'static str {
        match self {
            Self::Binary => "channel.k8s.io",
            Self::Base64 => "base64.channel.k8s.io",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "channel.k8s.io" | "channel" | "binary" => Some(Self::Binary),
            "base64.channel.k8s.io" | "base64" => Some(Self::Base64),
            _ => None,
        }
    }

    /// Decode a binary message. `None` when empty or the channel is unknown.
    pub fn decode_binary(data: &[u8]) -> Option<Frame> {
        let (first, payload) = data.split_first()?;
        Some(Frame::new(Channel::from_byte(*first)?, payload))
    }

    /// Decode a base64 text message.
    pub fn decode_text(text: &str) -> Option<Frame> {
        let mut chars = text.chars();
        let digit = chars.next()?.to_digit(10)?;
        let channel = Channel::from_byte(u8::try_from(digit).ok()?)?;
        let payload = STANDARD.decode(chars.as_str().trim_end()).ok()?;
        Some(Frame::new(channel, payload))
    }
}
