use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::metadata::Metadata;

/// Value of `metadata.source` written at parse time.
pub const SOURCE_HISTORICAL: &str = "historical_conversation";

/// Fixed namespace for message ids.
const MESSAGE_NS: Uuid = Uuid::from_bytes([
    0x7e, 0xc0, 0x11, 0xec, 0x00, 0x00, 0x50, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
]);

/// Speaker classification of a message.
///
/// `User` is the human party, `Assistant` the AI party, `System` covers
/// filler lines pasted in from the surrounding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Assistant, Role::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role '{0}' (expected user, assistant, or system)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => Ok(Role::User),
            "assistant" | "ai" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// One attributed, contiguous turn of text by a single speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Deterministic message id: UUID v5 over the message's position and body.
///
/// Identical input parsed twice yields identical ids, so a re-run of the
/// upload hands the remote side the same external references.
pub fn message_id(
    sequence: usize,
    line_start: usize,
    line_end: usize,
    role: Role,
    content: &str,
) -> String {
    let name = format!("{sequence}:{line_start}-{line_end}:{role}:{content}");
    Uuid::new_v5(&MESSAGE_NS, name.as_bytes()).to_string()
}

/// Format a timestamp as RFC 3339.
pub fn rfc3339(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.format(&Rfc3339)
}

/// Per-role message counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub user: usize,
    pub assistant: usize,
    pub system: usize,
}

impl RoleCounts {
    pub fn from_messages(messages: &[Message]) -> Self {
        let mut counts = Self::default();
        for msg in messages {
            counts.add(msg.role);
        }
        counts
    }

    pub fn add(&mut self, role: Role) {
        match role {
            Role::User => self.user += 1,
            Role::Assistant => self.assistant += 1,
            Role::System => self.system += 1,
        }
    }

    pub fn get(&self, role: Role) -> usize {
        match role {
            Role::User => self.user,
            Role::Assistant => self.assistant,
            Role::System => self.system,
        }
    }

    pub fn total(&self) -> usize {
        self.user + self.assistant + self.system
    }
}

/// Header block of the intermediate document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    pub source_file: String,
    pub total_messages: usize,
    pub parsing_timestamp: String,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub system_messages: usize,
}

impl ConversationMetadata {
    pub fn role_counts(&self) -> RoleCounts {
        RoleCounts {
            user: self.user_messages,
            assistant: self.assistant_messages,
            system: self.system_messages,
        }
    }
}

/// The file handed from the parser to the uploader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedConversation {
    pub conversation_metadata: ConversationMetadata,
    pub messages: Vec<Message>,
}

impl ParsedConversation {
    pub fn new(source_file: &str, parsing_timestamp: String, messages: Vec<Message>) -> Self {
        let counts = RoleCounts::from_messages(&messages);
        Self {
            conversation_metadata: ConversationMetadata {
                source_file: source_file.to_string(),
                total_messages: messages.len(),
                parsing_timestamp,
                user_messages: counts.user,
                assistant_messages: counts.assistant,
                system_messages: counts.system,
            },
            messages,
        }
    }
}
