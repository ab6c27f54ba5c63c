//! Newline-delimited JSON spoken by the `awardwatch` binary on stdin/stdout.

use serde::{Deserialize, Serialize};

use crate::{
    classifier::{EligibilityResult, Spot},
    history::ContactRecord,
    progress::ProgressSummary,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Spot(Spot),
    /// A contact that has just been logged; committed to history before invalidation.
    Contact(ContactRecord),
    Progress,
    Exit,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireMessage {
    Spot(Spot),
    Contact(ContactRecord),
    Progress,
    Exit,
}

pub fn parse_client_message(line: &str) -> Result<ClientMessage, serde_json::Error> {
    let wire: WireMessage = serde_json::from_str(line)?;
    let message = match wire {
        WireMessage::Spot(spot) => ClientMessage::Spot(spot),
        WireMessage::Contact(contact) => ClientMessage::Contact(contact),
        WireMessage::Progress => ClientMessage::Progress,
        WireMessage::Exit => ClientMessage::Exit,
    };
    Ok(message)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Classified {
        spot: Spot,
        result: EligibilityResult,
    },
    Progress {
        generation: u64,
        awards: Vec<ProgressSummary>,
    },
    Error {
        message: String,
    },
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}
