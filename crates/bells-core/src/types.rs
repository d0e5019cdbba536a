use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a single message in a conversation log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a conversation session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one turn (a user submission and its resolution).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Conversation enums
// =============================================================================

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Presentation mode of a session.
///
/// A session starts in `Welcome` and moves to `Active` on its first
/// accepted submission. It never moves back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Welcome,
    Active,
}

// =============================================================================
// Response documents
// =============================================================================

/// One typed block of assistant content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A plain paragraph of text.
    Paragraph { text: String },
    /// A titled card with an icon name and an ordered list of items.
    InfoCard {
        title: String,
        icon: String,
        items: Vec<String>,
    },
    /// A short helpful note, rendered less prominently than a paragraph.
    Hint { text: String },
}

/// Structured assistant response: an ordered sequence of content blocks.
///
/// Carries no markup so any presentation layer can render it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDocument {
    pub blocks: Vec<ContentBlock>,
}

impl ResponseDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph block.
    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(ContentBlock::Paragraph { text: text.into() });
        self
    }

    /// Append an info card block.
    pub fn info_card<I, S>(
        mut self,
        title: impl Into<String>,
        icon: impl Into<String>,
        items: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks.push(ContentBlock::InfoCard {
            title: title.into(),
            icon: icon.into(),
            items: items.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Append a hint block.
    pub fn hint(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(ContentBlock::Hint { text: text.into() });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Titles of every info card, in document order.
    pub fn card_titles(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::InfoCard { title, .. } => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Find the first info card with the given title.
    pub fn find_card(&self, title: &str) -> Option<&ContentBlock> {
        self.blocks
            .iter()
            .find(|b| matches!(b, ContentBlock::InfoCard { title: t, .. } if t == title))
    }

    /// All hint texts, in document order.
    pub fn hints(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Hint { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Body of a message: user text or an assistant document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    Document(ResponseDocument),
}

/// A single entry in a conversation log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// The user text, if this is a text message.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(t) => Some(t),
            MessageContent::Document(_) => None,
        }
    }

    /// The assistant document, if this message carries one.
    pub fn document(&self) -> Option<&ResponseDocument> {
        match &self.content {
            MessageContent::Document(d) => Some(d),
            MessageContent::Text(_) => None,
        }
    }

    /// Local wall-clock time in `h:mm AM/PM` form, as shown under a message.
    pub fn display_time(&self) -> String {
        format_display_time(self.timestamp.with_timezone(&Local))
    }
}

/// Format a time as `h:mm AM/PM` with a non-padded 12-hour clock.
pub fn format_display_time<Tz>(time: DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: fmt::Display,
{
    time.format("%-I:%M %p").to_string()
}
