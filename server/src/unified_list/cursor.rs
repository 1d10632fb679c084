//! Opaque base64(JSON) pagination cursor (§4.5). Carries the local store's
//! advanced offset/exhaustion flag, each connection's page token and
//! exhaustion flag, and the `received_at` of the last row returned.
use std::collections::HashMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CursorState {
    pub db_offset: u64,
    pub db_exhausted: bool,
    pub connection_tokens: HashMap<i32, Option<String>>,
    pub connection_exhausted: HashMap<i32, bool>,
    pub last_received_at: Option<DateTime<Utc>>,
}

impl CursorState {
    pub fn decode(raw: &str) -> Self {
        URL_SAFE_NO_PAD
            .decode(raw)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    pub fn encode(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("CursorState always serializes");
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn is_connection_exhausted(&self, connection_id: i32) -> bool {
        self.connection_exhausted.get(&connection_id).copied().unwrap_or(false)
    }

    pub fn connection_token(&self, connection_id: i32) -> Option<String> {
        self.connection_tokens.get(&connection_id).cloned().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let mut state = CursorState { db_offset: 40, db_exhausted: true, ..Default::default() };
        state.connection_tokens.insert(1, Some("tok".into()));
        state.connection_exhausted.insert(1, false);

        let encoded = state.encode();
        let decoded = CursorState::decode(&encoded);

        assert_eq!(decoded.db_offset, 40);
        assert!(decoded.db_exhausted);
        assert_eq!(decoded.connection_token(1), Some("tok".to_string()));
        assert!(!decoded.is_connection_exhausted(1));
    }

    #[test]
    fn absent_cursor_decodes_to_default() {
        let decoded = CursorState::decode("not-valid-base64!!!");
        assert_eq!(decoded.db_offset, 0);
        assert!(!decoded.db_exhausted);
    }
}
