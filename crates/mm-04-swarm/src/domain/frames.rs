//! Wire frames.
//!
//! JSON objects tagged by `type`, one per length-delimited frame.

use super::errors::SwarmError;
use bytes::Bytes;
use mm_03_gossip::GossipMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireFrame {
    Challenge(Challenge),
    Hello(Hello),
    Gossip(GossipMessage),
    Ping { nonce: u64 },
    Pong { nonce: u64 },
}

/// First frame each side sends: which network it is on and a fresh nonce the
/// other side must sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub network: String,
    pub nonce: String,
}

/// Proof of key possession, bound to the peer's challenge nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Address the sender accepts connections on, if any
    pub listen: Option<String>,
    pub signer: String,
    pub signature: String,
}

impl WireFrame {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Challenge(_) => "challenge",
            Self::Hello(_) => "hello",
            Self::Gossip(_) => "gossip",
            Self::Ping { .. } => "ping",
            Self::Pong { .. } => "pong",
        }
    }

    pub fn encode(&self) -> Result<Bytes, SwarmError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| SwarmError::Malformed(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SwarmError> {
        serde_json::from_slice(bytes).map_err(|e| SwarmError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_03_gossip::GossipPayload;
    use serde_json::json;

    #[test]
    fn test_gossip_frame_layout() {
        let frame = WireFrame::Gossip(GossipMessage {
            payload: GossipPayload::new("ping", json!(1)),
            signer: "s".into(),
            signature: "t".into(),
            hop_count: 2,
        });
        let value: serde_json::Value = serde_json::from_slice(&frame.encode().unwrap()).unwrap();
        assert_eq!(value["type"], "gossip");
        assert_eq!(value["hopCount"], 2);
        assert_eq!(value["payload"]["kind"], "ping");
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let missing_signer =
            br#"{"type":"gossip","payload":{"kind":"x","data":1},"signature":"t","hopCount":0}"#;
        assert!(matches!(
            WireFrame::decode(missing_signer),
            Err(SwarmError::Malformed(_))
        ));
        assert!(WireFrame::decode(b"not json").is_err());
        assert!(WireFrame::decode(br#"{"type":"bogus"}"#).is_err());
    }

    #[test]
    fn test_ping_decodes() {
        let frame = WireFrame::decode(br#"{"type":"ping","nonce":7}"#).unwrap();
        assert_eq!(frame, WireFrame::Ping { nonce: 7 });
        assert_eq!(frame.name(), "ping");
    }
}
