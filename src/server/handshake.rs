//! WebSocket upgrade handshake and push payload framing.

use base64::Engine;
use sha1::{Digest, Sha1};

pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// `Sec-WebSocket-Accept` value for a client's `Sec-WebSocket-Key`.
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.trim().as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

pub fn switching_protocols(client_key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         \r\n",
        accept_key(client_key)
    )
}

/// How each pushed snapshot is put on the wire after the handshake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PushFraming {
    /// Bare JSON bytes with no frame header. Clients expecting framed
    /// WebSocket messages cannot parse this stream.
    #[default]
    Raw,
    /// One unmasked FIN text frame per snapshot.
    WebSocket,
}

impl PushFraming {
    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "websocket" | "ws" => PushFraming::WebSocket,
            _ => PushFraming::Raw,
        }
    }

    pub fn encode(self, payload: Vec<u8>) -> Vec<u8> {
        match self {
            PushFraming::Raw => payload,
            PushFraming::WebSocket => text_frame(&payload),
        }
    }
}

fn text_frame(payload: &[u8]) -> Vec<u8> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 10);
    // FIN + text opcode
    frame.push(0x81);
    if len < 126 {
        frame.push(len as u8);
    } else if len <= u16::MAX as usize {
        frame.push(126);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        frame.push(127);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }
    frame.extend_from_slice(payload);
    frame
}
