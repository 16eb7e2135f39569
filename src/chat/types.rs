//! Core types for conversation entries and result panels.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed reply appended when an exchange fails for any reason.
pub const FAILURE_REPLY: &str = "Sorry, I couldn't get a response. Please try again.";

/// Role used when the host supplies an empty one.
pub const DEFAULT_USER_ROLE: &str = "learner";

/// Display name used when the host supplies an empty one.
pub const DEFAULT_USER_NAME: &str = "User";

/// Operating context selected by the host.
///
/// The mode changes how the backend encodes its reply, never the shape of
/// the canonical records.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Internal mode (default): replies arrive as objects.
    #[default]
    Internal,
    /// External mode: replies may arrive as JSON encoded inside a string.
    External,
}

impl Mode {
    /// Stable wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            _ => Err(value.to_string()),
        }
    }
}

/// Identity handed over by the host shell.
///
/// The role is advisory (`admin`, `trainer` or `learner` by convention) and is
/// forwarded to the backend without being checked.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Host-side user identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Access-level tag.
    #[serde(default)]
    pub role: String,
}

impl User {
    /// Create a user from its three host-supplied fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
        }
    }

    /// Role to forward, falling back to [`DEFAULT_USER_ROLE`] when empty.
    #[must_use]
    pub fn role_or_default(&self) -> &str {
        if self.role.is_empty() {
            DEFAULT_USER_ROLE
        } else {
            &self.role
        }
    }

    /// Name to display, falling back to [`DEFAULT_USER_NAME`] when empty.
    #[must_use]
    pub fn name_or_default(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_USER_NAME
        } else {
            &self.name
        }
    }
}

/// Body of one outbound `POST /chat` call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Advisory role of the asking user.
    pub role: String,
    /// Mode active when the question was submitted.
    pub mode: Mode,
    /// Trimmed user question.
    pub query: String,
}

impl ChatRequest {
    /// Build the request for `user` asking `query` in `mode`.
    #[must_use]
    pub fn new(user: &User, mode: Mode, query: impl Into<String>) -> Self {
        Self {
            role: user.role_or_default().to_string(),
            mode,
            query: query.into(),
        }
    }
}

/// Who produced a conversation entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    /// Text typed by the user.
    User,
    /// Reply shown on behalf of the assistant (answers and failures).
    Assistant,
}

impl EntryRole {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for EntryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unique entry identifier: creation millis plus a kind suffix (`1700000000000-user`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Compose an id from a millisecond stamp and a kind.
    #[must_use]
    pub fn compose(millis: i64, kind: EntryKind) -> Self {
        Self(format!("{millis}-{}", kind.suffix()))
    }

    /// Borrow the textual id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of entry an id is minted for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EntryKind {
    /// User question.
    User,
    /// Interpreted assistant answer.
    Assistant,
    /// Fixed failure reply.
    Error,
}

impl EntryKind {
    /// Suffix appended to the millisecond stamp.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Error => "error",
        }
    }
}

/// One immutable line of the transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    /// Unique id.
    pub id: EntryId,
    /// Author of the entry.
    pub role: EntryRole,
    /// Displayed text.
    pub content: String,
    /// Result panels attached to an assistant answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_bundle: Option<ResultBundle>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl ConversationEntry {
    /// Build a user entry.
    #[must_use]
    pub fn user(id: EntryId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: EntryRole::User,
            content: content.into(),
            result_bundle: None,
            created_at: Utc::now(),
        }
    }

    /// Build an assistant entry carrying an optional bundle.
    #[must_use]
    pub fn assistant(
        id: EntryId,
        content: impl Into<String>,
        result_bundle: Option<ResultBundle>,
    ) -> Self {
        Self {
            id,
            role: EntryRole::Assistant,
            content: content.into(),
            result_bundle,
            created_at: Utc::now(),
        }
    }

    /// Build the fixed assistant-role failure entry.
    #[must_use]
    pub fn failure(id: EntryId) -> Self {
        Self::assistant(id, FAILURE_REPLY, None)
    }
}

/// Categorized result panels attached to an answer.
///
/// Only built through [`ResultBundle::from_parts`], which refuses to create an
/// empty bundle, so `Option<ResultBundle>` tells consumers whether a results
/// section exists at all.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    /// Web search hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<Vec<WebResult>>,
    /// Video hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Vec<VideoResult>>,
    /// Code repository hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<Vec<RepoResult>>,
}

impl ResultBundle {
    /// Assemble a bundle, dropping empty categories.
    ///
    /// Returns `None` when every category is empty.
    #[must_use]
    pub fn from_parts(
        web: Vec<WebResult>,
        video: Vec<VideoResult>,
        repo: Vec<RepoResult>,
    ) -> Option<Self> {
        let bundle = Self {
            web: non_empty(web),
            video: non_empty(video),
            repo: non_empty(repo),
        };
        if bundle.web.is_none() && bundle.video.is_none() && bundle.repo.is_none() {
            None
        } else {
            Some(bundle)
        }
    }

    /// Total number of records across categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.web.as_ref().map_or(0, Vec::len)
            + self.video.as_ref().map_or(0, Vec::len)
            + self.repo.as_ref().map_or(0, Vec::len)
    }

    /// Whether no category holds a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

/// Canonical web search hit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    /// Page title.
    pub title: String,
    /// Page URL (may be empty).
    pub url: String,
    /// Text excerpt.
    pub snippet: String,
    /// Origin label.
    pub source: String,
}

/// Canonical video hit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    /// Video title.
    pub title: String,
    /// Watch URL (may be empty).
    pub url: String,
    /// Channel or uploader.
    pub channel: String,
    /// Human-readable duration.
    pub duration: String,
    /// Human-readable view count.
    pub views: String,
    /// Human-readable publication date.
    pub published_at: String,
    /// Thumbnail URL, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Canonical code repository hit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoResult {
    /// Repository title.
    pub title: String,
    /// Repository URL (may be empty).
    pub url: String,
    /// Description.
    pub description: String,
    /// Primary language.
    pub language: String,
    /// Star count.
    pub stars: u64,
    /// Fork count.
    pub forks: u64,
    /// Last update, as supplied upstream.
    pub updated_at: String,
    /// Owner or author.
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("External".parse::<Mode>(), Ok(Mode::External));
        assert_eq!(" internal ".parse::<Mode>(), Ok(Mode::Internal));
        assert!("public".parse::<Mode>().is_err());
        assert_eq!(Mode::default(), Mode::Internal);
    }

    #[test]
    fn test_user_fallbacks() {
        let user = User::new("u1", "", "");
        assert_eq!(user.role_or_default(), "learner");
        assert_eq!(user.name_or_default(), "User");

        let trainer = User::new("u2", "Ada", "trainer");
        assert_eq!(trainer.role_or_default(), "trainer");
        assert_eq!(trainer.name_or_default(), "Ada");
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let user = User::new("u1", "Ada", "admin");
        let request = ChatRequest::new(&user, Mode::External, "hello");
        let json = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({"role": "admin", "mode": "external", "query": "hello"})
        );
    }

    #[test]
    fn test_entry_id_format() {
        let id = EntryId::compose(1_700_000_000_000, EntryKind::Error);
        assert_eq!(id.as_str(), "1700000000000-error");
    }

    #[test]
    fn test_empty_bundle_is_absent() {
        assert!(ResultBundle::from_parts(Vec::new(), Vec::new(), Vec::new()).is_none());
    }

    #[test]
    fn test_bundle_drops_empty_categories() {
        let web = vec![WebResult {
            title: "A".to_string(),
            url: "u".to_string(),
            snippet: String::new(),
            source: "Web".to_string(),
        }];
        let bundle = ResultBundle::from_parts(web, Vec::new(), Vec::new());
        let bundle = bundle.unwrap_or_default();
        assert_eq!(bundle.len(), 1);
        assert!(bundle.video.is_none());
        assert!(bundle.repo.is_none());
    }

    #[test]
    fn test_failure_entry_text() {
        let entry = ConversationEntry::failure(EntryId::compose(1, EntryKind::Error));
        assert_eq!(entry.role, EntryRole::Assistant);
        assert_eq!(entry.content, FAILURE_REPLY);
        assert!(entry.result_bundle.is_none());
    }
}
