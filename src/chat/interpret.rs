//! Response interpretation: raw backend payload to display text plus panels.
//!
//! The backend wraps its answer as `{ "response": ... }`, but the inner value
//! changes shape with the mode: external mode frequently returns JSON encoded
//! inside a string, internal mode returns the object directly. The inner
//! value is classified once into [`ResponseBody`] and each mode then applies
//! its own rule table. Nothing here can fail.

use serde_json::{Map, Value};

use crate::chat::normalize::{
    is_zero, normalize_repo_list, normalize_video_list, normalize_web_list,
};
use crate::chat::types::{Mode, RepoResult, ResultBundle, VideoResult, WebResult};

/// Key wrapping the answer in every backend payload.
pub const RESPONSE_KEY: &str = "response";

/// Key holding the answer text inside a structured response.
pub const ANSWER_KEY: &str = "answer";

/// Result category a payload key feeds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Category {
    /// Web search hits.
    Web,
    /// Video hits.
    Video,
    /// Code repository hits.
    Repo,
}

/// Payload keys scanned for result arrays, in scan order.
///
/// Every key is checked. A later key of the same category replaces whatever
/// an earlier key produced, so the bare form wins over the `_results` form.
pub const CATEGORY_KEYS: [(&str, Category); 6] = [
    ("web_results", Category::Web),
    ("youtube_results", Category::Video),
    ("git_results", Category::Repo),
    ("web", Category::Web),
    ("youtube", Category::Video),
    ("git", Category::Repo),
];

/// Output of [`interpret`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Interpretation {
    /// Text to display; never empty.
    pub text: String,
    /// Result panels, present only when at least one category has records.
    pub bundle: Option<ResultBundle>,
}

impl Interpretation {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bundle: None,
        }
    }
}

/// Shape of the inner `response` value.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody<'a> {
    /// A plain string (possibly JSON encoded inside).
    Text(&'a str),
    /// An object exposing a usable `answer`.
    Structured {
        /// Answer text.
        answer: String,
        /// The whole object, scanned for result categories.
        fields: &'a Map<String, Value>,
    },
    /// Anything else, including a missing `response`.
    Opaque(Option<&'a Value>),
}

impl<'a> ResponseBody<'a> {
    /// Classify the `response` member of a raw payload.
    #[must_use]
    pub fn classify(payload: &'a Value) -> Self {
        match payload.get(RESPONSE_KEY) {
            Some(Value::String(text)) => Self::Text(text),
            Some(Value::Object(fields)) => match answer_text(fields.get(ANSWER_KEY)) {
                Some(answer) => Self::Structured { answer, fields },
                None => Self::Opaque(payload.get(RESPONSE_KEY)),
            },
            other => Self::Opaque(other),
        }
    }
}

/// Turn a raw backend payload into display text and optional panels.
///
/// Always returns non-empty text: when no rule yields any, the serialized raw
/// payload is used.
#[must_use]
pub fn interpret(payload: &Value, mode: Mode) -> Interpretation {
    let body = ResponseBody::classify(payload);
    let interpretation = match mode {
        Mode::External => interpret_external(body),
        Mode::Internal => interpret_internal(body),
    };

    if interpretation.text.is_empty() {
        return Interpretation {
            text: to_display(payload),
            bundle: interpretation.bundle,
        };
    }
    interpretation
}

fn interpret_external(body: ResponseBody<'_>) -> Interpretation {
    match body {
        ResponseBody::Text(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => {
                let text = parsed
                    .as_object()
                    .and_then(|fields| answer_text(fields.get(ANSWER_KEY)))
                    .unwrap_or_else(|| raw.to_string());
                Interpretation {
                    text,
                    bundle: extract_categories(&parsed),
                }
            }
            Err(e) => {
                tracing::debug!("external response is not JSON ({e}), using it verbatim");
                Interpretation::text_only(raw)
            }
        },
        ResponseBody::Structured { answer, fields } => Interpretation {
            text: answer,
            bundle: extract_from_map(fields),
        },
        ResponseBody::Opaque(value) => interpret_opaque(value),
    }
}

fn interpret_internal(body: ResponseBody<'_>) -> Interpretation {
    match body {
        ResponseBody::Structured { answer, fields } => Interpretation {
            text: answer,
            bundle: extract_from_map(fields),
        },
        ResponseBody::Text(raw) => Interpretation::text_only(raw),
        ResponseBody::Opaque(value) => interpret_opaque(value),
    }
}

fn interpret_opaque(value: Option<&Value>) -> Interpretation {
    match value {
        Some(value) => Interpretation {
            text: to_display(value),
            bundle: extract_categories(value),
        },
        None => Interpretation::default(),
    }
}

/// Scan a structured value for result arrays and normalize them.
///
/// Returns `None` for non-objects and when every category ends up empty.
#[must_use]
pub fn extract_categories(value: &Value) -> Option<ResultBundle> {
    value.as_object().and_then(extract_from_map)
}

fn extract_from_map(fields: &Map<String, Value>) -> Option<ResultBundle> {
    let mut web: Vec<WebResult> = Vec::new();
    let mut video: Vec<VideoResult> = Vec::new();
    let mut repo: Vec<RepoResult> = Vec::new();

    for (key, category) in CATEGORY_KEYS {
        let Some(records) = fields.get(key).and_then(Value::as_array) else {
            continue;
        };
        match category {
            Category::Web => web = normalize_web_list(records),
            Category::Video => video = normalize_video_list(records),
            Category::Repo => repo = normalize_repo_list(records),
        }
    }

    ResultBundle::from_parts(web, video, repo)
}

/// Answer text from an `answer` member, if it is truthy.
fn answer_text(answer: Option<&Value>) -> Option<String> {
    match answer? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null | Value::Bool(false) => None,
        Value::Number(n) if is_zero(n) => None,
        other => Some(to_display(other)),
    }
}

/// Compact JSON rendering used as display text of last resort.
fn to_display(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("null"))
}
