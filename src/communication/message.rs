use serde::{Deserialize, Serialize};

use crate::common::{ProcessId, Round, VoteValue};
use crate::errors::{new_err, Result};

/// Wire tag of a message. The numeric codes are part of the wire format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display)]
pub enum MessageKind {
    #[display(fmt = "TEST")]
    Test,
    #[display(fmt = "ELECTION")]
    Election,
    #[display(fmt = "ANSWER")]
    Answer,
    #[display(fmt = "COORDINATOR")]
    Coordinator,
    #[display(fmt = "HEARTBEAT")]
    Heartbeat,
    #[display(fmt = "LEADER_SEARCH")]
    LeaderSearch,
    #[display(fmt = "LEADER_ACK")]
    LeaderAck,
    #[display(fmt = "CONSENSUS_START")]
    ConsensusStart,
    #[display(fmt = "CONSENSUS_VOTE")]
    ConsensusVote,
    #[display(fmt = "CONSENSUS_DECIDE")]
    ConsensusDecide,
    #[display(fmt = "WHO_IS_THERE")]
    WhoIsThere,
    #[display(fmt = "I_AM")]
    IAm,
}

impl MessageKind {
    pub fn code(self) -> u8 {
        match self {
            MessageKind::Test => 0,
            MessageKind::Election => 3,
            MessageKind::Answer => 4,
            MessageKind::Coordinator => 5,
            MessageKind::Heartbeat => 6,
            MessageKind::LeaderSearch => 7,
            MessageKind::LeaderAck => 8,
            MessageKind::ConsensusStart => 10,
            MessageKind::ConsensusVote => 11,
            MessageKind::ConsensusDecide => 12,
            MessageKind::WhoIsThere => 13,
            MessageKind::IAm => 14,
        }
    }

    pub fn from_code(code: u8) -> Option<MessageKind> {
        let kind = match code {
            0 => MessageKind::Test,
            3 => MessageKind::Election,
            4 => MessageKind::Answer,
            5 => MessageKind::Coordinator,
            6 => MessageKind::Heartbeat,
            7 => MessageKind::LeaderSearch,
            8 => MessageKind::LeaderAck,
            10 => MessageKind::ConsensusStart,
            11 => MessageKind::ConsensusVote,
            12 => MessageKind::ConsensusDecide,
            13 => MessageKind::WhoIsThere,
            14 => MessageKind::IAm,
            _ => return None,
        };

        Some(kind)
    }
}

/// JSON form of a message as it travels over the group channel.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: u8,
    pub sender_id: ProcessId,
    pub payload: String,
}

/// Typed message content. Payload strings are parsed once, at decode time.
#[derive(Clone, Debug, Eq, PartialEq, Display)]
pub enum Message {
    #[display(fmt = "HEARTBEAT")]
    Heartbeat,
    #[display(fmt = "ELECTION")]
    Election,
    #[display(fmt = "ANSWER")]
    Answer,
    #[display(fmt = "COORDINATOR")]
    Coordinator,
    #[display(fmt = "LEADER_SEARCH")]
    LeaderSearch,
    #[display(fmt = "LEADER_ACK")]
    LeaderAck,
    #[display(fmt = "CONSENSUS_START(round {})", round)]
    ConsensusStart { round: Round },
    #[display(fmt = "CONSENSUS_VOTE(round {}, value {})", round, value)]
    ConsensusVote { round: Round, value: VoteValue },
    #[display(fmt = "CONSENSUS_DECIDE({})", value)]
    ConsensusDecide { value: VoteValue },
    #[display(fmt = "TEST({})", note)]
    Test { note: String },
    #[display(fmt = "WHO_IS_THERE")]
    WhoIsThere,
    #[display(fmt = "I_AM")]
    IAm,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Heartbeat => MessageKind::Heartbeat,
            Message::Election => MessageKind::Election,
            Message::Answer => MessageKind::Answer,
            Message::Coordinator => MessageKind::Coordinator,
            Message::LeaderSearch => MessageKind::LeaderSearch,
            Message::LeaderAck => MessageKind::LeaderAck,
            Message::ConsensusStart { .. } => MessageKind::ConsensusStart,
            Message::ConsensusVote { .. } => MessageKind::ConsensusVote,
            Message::ConsensusDecide { .. } => MessageKind::ConsensusDecide,
            Message::Test { .. } => MessageKind::Test,
            Message::WhoIsThere => MessageKind::WhoIsThere,
            Message::IAm => MessageKind::IAm,
        }
    }

    fn payload(&self) -> String {
        match self {
            Message::Answer => "ANSWER_ACK".to_string(),
            Message::ConsensusStart { round } => round.to_string(),
            Message::ConsensusVote { round, value } => format!("{}:{}", round, value),
            Message::ConsensusDecide { value } => value.to_string(),
            Message::Test { note } => note.clone(),
            other => other.kind().to_string(),
        }
    }

    fn from_payload(kind: MessageKind, payload: &str) -> Result<Message> {
        let message = match kind {
            MessageKind::Heartbeat => Message::Heartbeat,
            MessageKind::Election => Message::Election,
            MessageKind::Answer => Message::Answer,
            MessageKind::Coordinator => Message::Coordinator,
            MessageKind::LeaderSearch => Message::LeaderSearch,
            MessageKind::LeaderAck => Message::LeaderAck,
            MessageKind::WhoIsThere => Message::WhoIsThere,
            MessageKind::IAm => Message::IAm,
            MessageKind::Test => Message::Test {
                note: payload.to_string(),
            },
            MessageKind::ConsensusStart => Message::ConsensusStart {
                round: parse_field(payload, "round")?,
            },
            MessageKind::ConsensusDecide => Message::ConsensusDecide {
                value: parse_field(payload, "value")?,
            },
            MessageKind::ConsensusVote => match payload.split_once(':') {
                Some((round, value)) => Message::ConsensusVote {
                    round: parse_field(round, "round")?,
                    value: parse_field(value, "value")?,
                },
                None => {
                    return new_err(
                        "Malformed vote payload".to_string(),
                        format!("expected '<round>:<value>', got '{}'", payload),
                    )
                }
            },
        };

        Ok(message)
    }
}

fn parse_field<N: std::str::FromStr>(text: &str, field: &str) -> Result<N>
where
    N::Err: std::fmt::Display,
{
    match text.trim().parse::<N>() {
        Ok(number) => Ok(number),
        Err(err) => new_err(
            format!("Malformed {} field '{}'", field, text),
            err.to_string(),
        ),
    }
}

/// A decoded message together with its sender.
#[derive(Clone, Debug, Eq, PartialEq, Display)]
#[display(fmt = "{} from {}", message, sender_id)]
pub struct Packet {
    pub sender_id: ProcessId,
    pub message: Message,
}

impl Packet {
    pub fn new(sender_id: ProcessId, message: Message) -> Packet {
        Packet { sender_id, message }
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope {
            kind: self.message.kind().code(),
            sender_id: self.sender_id,
            payload: self.message.payload(),
        }
    }

    pub fn from_envelope(envelope: Envelope) -> Result<Packet> {
        let kind = match MessageKind::from_code(envelope.kind) {
            Some(kind) => kind,
            None => {
                return new_err(
                    "Unknown message type".to_string(),
                    envelope.kind.to_string(),
                )
            }
        };

        let message = Message::from_payload(kind, &envelope.payload)?;

        Ok(Packet::new(envelope.sender_id, message))
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match serde_json::to_vec(&self.to_envelope()) {
            Ok(bytes) => Ok(bytes),
            Err(err) => new_err(format!("Cannot encode {}", self), err.to_string()),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Packet> {
        let envelope: Envelope = match serde_json::from_slice(bytes) {
            Ok(envelope) => envelope,
            Err(err) => return new_err("Cannot decode envelope".to_string(), err.to_string()),
        };

        Packet::from_envelope(envelope)
    }
}
