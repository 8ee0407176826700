use serde::{Deserialize, Serialize};

// --- Message Vocabulary ---

/// Everything that crosses the context boundary. Wire form is a flat JSON
/// object `{ "kind": "...", ...payload }`; delivery is best-effort with no
/// ordering or acknowledgment guarantee, so every variant must be safe to
/// lose.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind")]
pub enum Message {
    /// Player→Host: playback crossed a skip threshold, advance now.
    #[serde(rename = "ADVANCE_REQUEST", rename_all = "camelCase")]
    AdvanceRequest {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remaining_seconds: Option<f64>,
    },
    /// Host→Player: the request was accepted. Only resets the player's
    /// waiting indicator; absence means nothing.
    #[serde(rename = "ADVANCE_ACK")]
    AdvanceAck,
    /// Player→Host: seconds actually watched since the previous report.
    #[serde(rename = "WATCH_TIME", rename_all = "camelCase")]
    WatchTime { seconds: f64 },
    /// Host→Player: start playback after a countdown.
    #[serde(rename = "AUTO_PLAY", rename_all = "camelCase")]
    AutoPlay { delay_seconds: u32 },
    /// Player→Host: the countdown elapsed and play was pressed.
    #[serde(rename = "AUTO_PLAY_DONE")]
    AutoPlayDone,
}

impl Message {
    pub fn encode(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Failed to encode message: {}", e);
                None
            }
        }
    }

    /// Unrecognized kinds and malformed payloads are ignored, not errors:
    /// the channel carries whatever the page or other extensions feel like
    /// posting.
    pub fn decode(raw: &str) -> Option<Message> {
        match serde_json::from_str(raw) {
            Ok(msg) => Some(msg),
            Err(e) => {
                log::trace!("Ignoring unrecognized message: {}", e);
                None
            }
        }
    }
}

/// A message plus the origin the transport attributed it to. The origin is
/// transport metadata, never part of the wire payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub origin: String,
    pub message: Message,
}
