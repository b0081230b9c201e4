// Wire protocol DTOs and conversions for messages exchanged with the map client.
// Field names are shared with existing browser clients and must not change.

use crate::domain::{ActualCoordinate, GeoPoint, GuessCoordinate};
use crate::use_cases::MapCommand;
use serde::{Deserialize, Serialize};

/// Messages the engine sends to the map client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineMessage {
    ShowMap,
    HideMap,
    // Hidden marker position; revealed when guessing ends.
    SetActualLocation(ActualLocationPayload),
    SetGuessingState(GuessingStatePayload),
    UpdateScoreDisplay(ScoreDisplayPayload),
    ClearMapState,
}

/// Messages the map client sends to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    SubmitGuess(SubmitGuessPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualLocationPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub z_level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessingStatePayload {
    pub is_guessing: bool,
    // Round sequence number; lets the client tag its guesses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDisplayPayload {
    pub score: u32,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGuessPayload {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub z_level: i32,
    #[serde(default)]
    pub z_level_name: String,
    // Epoch milliseconds.
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid message: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("guess coordinate ({latitude}, {longitude}) is out of range")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl From<ActualCoordinate> for ActualLocationPayload {
    fn from(actual: ActualCoordinate) -> Self {
        Self {
            latitude: actual.point.latitude,
            longitude: actual.point.longitude,
            z_level: actual.z_level,
        }
    }
}

impl From<MapCommand> for EngineMessage {
    fn from(command: MapCommand) -> Self {
        match command {
            MapCommand::ShowMap => EngineMessage::ShowMap,
            MapCommand::HideMap => EngineMessage::HideMap,
            MapCommand::SetActualLocation(actual) => {
                EngineMessage::SetActualLocation(actual.into())
            }
            MapCommand::SetGuessingState { is_guessing, round } => {
                EngineMessage::SetGuessingState(GuessingStatePayload {
                    is_guessing,
                    round: Some(round),
                })
            }
            MapCommand::UpdateScoreDisplay { score, round } => {
                EngineMessage::UpdateScoreDisplay(ScoreDisplayPayload { score, round })
            }
            MapCommand::ClearMapState => EngineMessage::ClearMapState,
        }
    }
}

impl TryFrom<&SubmitGuessPayload> for GuessCoordinate {
    type Error = ProtocolError;

    fn try_from(payload: &SubmitGuessPayload) -> Result<Self, Self::Error> {
        let point = GeoPoint::new(payload.latitude, payload.longitude);
        if !point.is_valid() {
            return Err(ProtocolError::InvalidCoordinate {
                latitude: payload.latitude,
                longitude: payload.longitude,
            });
        }
        Ok(GuessCoordinate {
            point,
            z_level: payload.z_level,
            timestamp: payload.timestamp,
        })
    }
}

/// Parses a client message, accepting the enveloped form or a bare `SubmitGuess` payload.
pub fn decode_client_message(text: &str) -> Result<SubmitGuessPayload, ProtocolError> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::SubmitGuess(payload)) => Ok(payload),
        Err(envelope_err) => {
            // Legacy clients pass the payload as the single bridge argument.
            serde_json::from_str::<SubmitGuessPayload>(text).map_err(|_| envelope_err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn when_engine_message_is_serialized_then_field_names_match_the_client() {
        let msg = EngineMessage::from(MapCommand::SetActualLocation(ActualCoordinate {
            point: GeoPoint::new(-27.5, 153.0),
            z_level: -2,
        }));
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(
            value,
            json!({
                "type": "SetActualLocation",
                "data": { "latitude": -27.5, "longitude": 153.0, "zLevel": -2 }
            })
        );

        let msg = EngineMessage::from(MapCommand::SetGuessingState {
            is_guessing: true,
            round: 4,
        });
        assert_eq!(
            serde_json::to_value(&msg).expect("serialize"),
            json!({ "type": "SetGuessingState", "data": { "isGuessing": true, "round": 4 } })
        );

        let msg = EngineMessage::from(MapCommand::UpdateScoreDisplay { score: 950, round: 2 });
        assert_eq!(
            serde_json::to_value(&msg).expect("serialize"),
            json!({ "type": "UpdateScoreDisplay", "data": { "score": 950, "round": 2 } })
        );
    }

    #[test]
    fn when_unit_message_is_serialized_then_it_has_no_data() {
        assert_eq!(
            serde_json::to_value(EngineMessage::ClearMapState).expect("serialize"),
            json!({ "type": "ClearMapState" })
        );
        let parsed: EngineMessage =
            serde_json::from_str(r#"{"type":"ShowMap"}"#).expect("parse unit message");
        assert_eq!(parsed, EngineMessage::ShowMap);
    }

    #[test]
    fn when_guessing_state_has_no_round_then_it_still_parses() {
        let parsed: EngineMessage =
            serde_json::from_str(r#"{"type":"SetGuessingState","data":{"isGuessing":false}}"#)
                .expect("parse");
        assert_eq!(
            parsed,
            EngineMessage::SetGuessingState(GuessingStatePayload {
                is_guessing: false,
                round: None
            })
        );
    }

    #[test]
    fn when_submit_guess_is_enveloped_then_it_decodes() {
        let text = json!({
            "type": "SubmitGuess",
            "data": {
                "latitude": -27.4975,
                "longitude": 153.0137,
                "zLevel": 2,
                "zLevelName": "Level 1",
                "timestamp": 1_700_000_000_123_u64,
                "round": 3
            }
        })
        .to_string();

        let payload = decode_client_message(&text).expect("decode");
        assert_eq!(payload.z_level, 2);
        assert_eq!(payload.z_level_name, "Level 1");
        assert_eq!(payload.round, Some(3));

        let guess = GuessCoordinate::try_from(&payload).expect("valid guess");
        assert_eq!(guess.point, GeoPoint::new(-27.4975, 153.0137));
        assert_eq!(guess.timestamp, 1_700_000_000_123);
    }

    #[test]
    fn when_submit_guess_is_bare_payload_then_legacy_form_decodes() {
        let text = r#"{"latitude":1.5,"longitude":2.5,"zLevel":0,"zLevelName":"Lower Ground","timestamp":5}"#;
        let payload = decode_client_message(text).expect("decode legacy");
        assert_eq!(payload.latitude, 1.5);
        assert_eq!(payload.round, None);
    }

    #[test]
    fn when_payload_is_garbage_then_decode_fails() {
        assert!(matches!(
            decode_client_message("{not json"),
            Err(ProtocolError::Parse(_))
        ));
        assert!(decode_client_message(r#"{"type":"SubmitGuess","data":{}}"#).is_err());
    }

    #[test]
    fn when_guess_is_out_of_range_then_conversion_fails() {
        let payload = SubmitGuessPayload {
            latitude: 200.0,
            longitude: 0.0,
            z_level: 0,
            z_level_name: String::new(),
            timestamp: 0,
            round: None,
        };
        assert!(matches!(
            GuessCoordinate::try_from(&payload),
            Err(ProtocolError::InvalidCoordinate { .. })
        ));
    }
}
