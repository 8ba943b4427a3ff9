//! Interactive session messages.
//!
//! Frames on `/connect` are JSON objects tagged by `type`. The client opens
//! with `init`, then streams stdin and signals; the service answers with
//! runtime, stage, data and exit events.

use crate::execute::ExecutionRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard stream a data frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdin,
    Stdout,
    Stderr,
}

/// Message sent from the client to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Start an execution. Must be the first message on a session.
    Init(ExecutionRequest),
    /// A chunk of input for the running program.
    Data {
        /// Always [`StreamName::Stdin`] for client data.
        stream: StreamName,
        /// The chunk.
        data: String,
    },
    /// Deliver a signal (e.g. `SIGTERM`) to the running program.
    Signal {
        /// Signal name.
        signal: String,
    },
}

impl ClientMessage {
    /// A stdin chunk.
    pub fn stdin(data: impl Into<String>) -> Self {
        Self::Data {
            stream: StreamName::Stdin,
            data: data.into(),
        }
    }

    /// A signal for the running program.
    pub fn signal(signal: impl Into<String>) -> Self {
        Self::Signal {
            signal: signal.into(),
        }
    }
}

/// Message received from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// The runtime selected for this session.
    Runtime { language: String, version: String },
    /// A stage (e.g. `compile`, `run`) has started.
    Stage { stage: String },
    /// A chunk of program output.
    Data { stream: StreamName, data: String },
    /// A stage has finished.
    Exit {
        stage: String,
        #[serde(default)]
        code: Option<i32>,
        #[serde(default)]
        signal: Option<String>,
    },
    /// The service rejected a message or failed the session.
    Error { message: String },
    /// Any frame this client does not understand, kept verbatim.
    ///
    /// Never produced by serde directly; see [`ServerMessage::parse`].
    #[serde(skip)]
    Unknown(Value),
}

impl ServerMessage {
    /// Parse a text frame.
    ///
    /// Fails only if the frame is not JSON. Well-formed JSON that does not
    /// match a known message becomes [`ServerMessage::Unknown`].
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::deserialize(&value).unwrap_or(Self::Unknown(value)))
    }

    /// Check whether this message ends the session's final stage.
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_wire_shape() {
        let request = ExecutionRequest::builder("python", "3.11.0", "input()").build();
        let value = serde_json::to_value(ClientMessage::Init(request)).unwrap();

        assert_eq!(value["type"], "init");
        assert_eq!(value["language"], "python");
        assert_eq!(value["files"][0]["content"], "input()");
        assert!(value.get("args").is_none());
    }

    #[test]
    fn test_stdin_and_signal_wire_shape() {
        assert_eq!(
            serde_json::to_value(ClientMessage::stdin("42\n")).unwrap(),
            json!({"type": "data", "stream": "stdin", "data": "42\n"})
        );
        assert_eq!(
            serde_json::to_value(ClientMessage::signal("SIGKILL")).unwrap(),
            json!({"type": "signal", "signal": "SIGKILL"})
        );
    }

    #[test]
    fn test_parse_known_messages() {
        assert_eq!(
            ServerMessage::parse(r#"{"type":"data","stream":"stdout","data":"hi\n"}"#).unwrap(),
            ServerMessage::Data {
                stream: StreamName::Stdout,
                data: "hi\n".to_string()
            }
        );

        let exit = ServerMessage::parse(r#"{"type":"exit","stage":"run","code":0}"#).unwrap();
        assert!(exit.is_exit());
        assert_eq!(
            exit,
            ServerMessage::Exit {
                stage: "run".to_string(),
                code: Some(0),
                signal: None
            }
        );
    }

    #[test]
    fn test_parse_unknown_message() {
        let message = ServerMessage::parse(r#"{"type":"heartbeat","at":12}"#).unwrap();
        assert_eq!(message, ServerMessage::Unknown(json!({"type": "heartbeat", "at": 12})));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(ServerMessage::parse("not json").is_err());
    }
}
