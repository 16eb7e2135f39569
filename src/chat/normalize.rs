//! Result normalizers: loosely-typed upstream records to canonical panels.
//!
//! Upstream search tools disagree on field names (`url` vs `link`,
//! `stars` vs `stargazers_count`, ...). Every canonical field is resolved
//! through an ordered alias list declared once per category in the tables
//! below. The first alias carrying a usable value wins, otherwise the
//! field's default applies. Normalization never fails.

use serde_json::Value;

use crate::chat::types::{RepoResult, VideoResult, WebResult};

/// Number of snippet characters kept when a title has to be synthesized.
pub const TITLE_SNIPPET_CHARS: usize = 50;

/// Marker appended to a synthesized title.
pub const TITLE_ELLIPSIS: &str = "...";

/// Key a synthesized title is cut from.
const SNIPPET_KEY: &str = "snippet";

/// Ordered source keys for each canonical web field.
#[derive(Clone, Copy, Debug)]
pub struct WebAliases {
    /// Sources for `title`.
    pub title: &'static [&'static str],
    /// Sources for `url`.
    pub url: &'static [&'static str],
    /// Sources for `snippet`.
    pub snippet: &'static [&'static str],
    /// Sources for `source`.
    pub source: &'static [&'static str],
}

/// Ordered source keys for each canonical video field.
#[derive(Clone, Copy, Debug)]
pub struct VideoAliases {
    /// Sources for `title`.
    pub title: &'static [&'static str],
    /// Sources for `url`.
    pub url: &'static [&'static str],
    /// Sources for `channel`.
    pub channel: &'static [&'static str],
    /// Sources for `duration`.
    pub duration: &'static [&'static str],
    /// Sources for `views`.
    pub views: &'static [&'static str],
    /// Sources for `publishedAt`.
    pub published_at: &'static [&'static str],
    /// Sources for `thumbnail`.
    pub thumbnail: &'static [&'static str],
}

/// Ordered source keys for each canonical repository field.
#[derive(Clone, Copy, Debug)]
pub struct RepoAliases {
    /// Sources for `title`.
    pub title: &'static [&'static str],
    /// Sources for `url`.
    pub url: &'static [&'static str],
    /// Sources for `description`.
    pub description: &'static [&'static str],
    /// Sources for `language`.
    pub language: &'static [&'static str],
    /// Sources for `stars`.
    pub stars: &'static [&'static str],
    /// Sources for `forks`.
    pub forks: &'static [&'static str],
    /// Sources for `updatedAt`.
    pub updated_at: &'static [&'static str],
    /// Sources for `author`.
    pub author: &'static [&'static str],
}

/// Web alias table.
pub const WEB_ALIASES: WebAliases = WebAliases {
    title: &["title"],
    url: &["url", "link"],
    snippet: &["snippet", "description"],
    source: &["source"],
};

/// Video alias table.
pub const VIDEO_ALIASES: VideoAliases = VideoAliases {
    title: &["title"],
    url: &["url", "link"],
    channel: &["channel", "author"],
    duration: &["duration"],
    views: &["views"],
    published_at: &["publishedAt", "date"],
    thumbnail: &["thumbnail"],
};

/// Repository alias table.
pub const REPO_ALIASES: RepoAliases = RepoAliases {
    title: &["title", "name"],
    url: &["url", "link"],
    description: &["description", "snippet"],
    language: &["language"],
    stars: &["stars", "stargazers_count"],
    forks: &["forks", "forks_count"],
    updated_at: &["updatedAt", "updated_at"],
    author: &["author", "owner"],
};

/// Default web `source`.
pub const DEFAULT_WEB_SOURCE: &str = "Web";
/// Default video `channel`.
pub const DEFAULT_CHANNEL: &str = "Unknown Channel";
/// Default video `duration`, repository `language`, `updatedAt` and `author`.
pub const UNKNOWN: &str = "Unknown";
/// Default video `views`.
pub const DEFAULT_VIEWS: &str = "Unknown views";
/// Default video `publishedAt`.
pub const DEFAULT_PUBLISHED_AT: &str = "Unknown date";

/// Normalize one raw web record.
#[must_use]
pub fn normalize_web(raw: &Value) -> WebResult {
    let aliases = &WEB_ALIASES;
    WebResult {
        title: text_or_title(raw, aliases.title),
        url: text_or(raw, aliases.url, ""),
        snippet: text_or(raw, aliases.snippet, ""),
        source: text_or(raw, aliases.source, DEFAULT_WEB_SOURCE),
    }
}

/// Normalize one raw video record.
#[must_use]
pub fn normalize_video(raw: &Value) -> VideoResult {
    let aliases = &VIDEO_ALIASES;
    VideoResult {
        title: text_or_title(raw, aliases.title),
        url: text_or(raw, aliases.url, ""),
        channel: text_or(raw, aliases.channel, DEFAULT_CHANNEL),
        duration: text_or(raw, aliases.duration, UNKNOWN),
        views: text_or(raw, aliases.views, DEFAULT_VIEWS),
        published_at: text_or(raw, aliases.published_at, DEFAULT_PUBLISHED_AT),
        thumbnail: first_text(raw, aliases.thumbnail),
    }
}

/// Normalize one raw repository record.
#[must_use]
pub fn normalize_repo(raw: &Value) -> RepoResult {
    let aliases = &REPO_ALIASES;
    RepoResult {
        title: text_or_title(raw, aliases.title),
        url: text_or(raw, aliases.url, ""),
        description: text_or(raw, aliases.description, ""),
        language: text_or(raw, aliases.language, UNKNOWN),
        stars: first_count(raw, aliases.stars).unwrap_or(0),
        forks: first_count(raw, aliases.forks).unwrap_or(0),
        updated_at: text_or(raw, aliases.updated_at, UNKNOWN),
        author: text_or(raw, aliases.author, UNKNOWN),
    }
}

/// Normalize a sequence of web records, preserving order.
#[must_use]
pub fn normalize_web_list(raw: &[Value]) -> Vec<WebResult> {
    raw.iter().map(normalize_web).collect()
}

/// Normalize a sequence of video records, preserving order.
#[must_use]
pub fn normalize_video_list(raw: &[Value]) -> Vec<VideoResult> {
    raw.iter().map(normalize_video).collect()
}

/// Normalize a sequence of repository records, preserving order.
#[must_use]
pub fn normalize_repo_list(raw: &[Value]) -> Vec<RepoResult> {
    raw.iter().map(normalize_repo).collect()
}

/// First `TITLE_SNIPPET_CHARS` characters of the record's snippet plus the ellipsis.
#[must_use]
pub fn truncated_snippet(raw: &Value) -> String {
    let snippet = raw
        .get(SNIPPET_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut title: String = snippet.chars().take(TITLE_SNIPPET_CHARS).collect();
    title.push_str(TITLE_ELLIPSIS);
    title
}

fn text_or_title(raw: &Value, sources: &[&str]) -> String {
    first_text(raw, sources).unwrap_or_else(|| truncated_snippet(raw))
}

fn text_or(raw: &Value, sources: &[&str], default: &str) -> String {
    first_text(raw, sources).unwrap_or_else(|| default.to_string())
}

/// First alias holding displayable text.
///
/// Non-empty strings are taken as-is; non-zero numbers and `true` are
/// rendered as text. `null`, `false`, `""`, `0`, arrays and objects are
/// skipped.
fn first_text(raw: &Value, sources: &[&str]) -> Option<String> {
    sources.iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if !is_zero(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    })
}

/// First alias holding a positive count.
///
/// Accepts integers, floats (truncated toward zero) and numeric strings
/// with `,` or `_` separators. Zero, negative and unparseable values fall
/// through to the next alias.
fn first_count(raw: &Value, sources: &[&str]) -> Option<u64> {
    sources.iter().find_map(|key| match raw.get(*key)? {
        Value::Number(n) => number_count(n),
        Value::String(s) => string_count(s),
        _ => None,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn number_count(n: &serde_json::Number) -> Option<u64> {
    if let Some(v) = n.as_u64() {
        return (v > 0).then_some(v);
    }
    let f = n.as_f64()?;
    if f >= 1.0 && f.is_finite() {
        Some(f.trunc() as u64)
    } else {
        None
    }
}

fn string_count(s: &str) -> Option<u64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    cleaned.parse::<u64>().ok().filter(|v| *v > 0)
}

/// Whether a JSON number is zero (`0`, `-0`, `0.0`).
pub(crate) fn is_zero(n: &serde_json::Number) -> bool {
    n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON)
}
