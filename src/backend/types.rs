//! Wire types for the grant finder API
//!
//! Field names follow the original JSON contract (camelCase profile fields,
//! snake_case clarification keys). Unknown extra fields in responses are
//! tolerated; the agent decorates grants with metadata the client ignores.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// How the query was authored: the guided profile form or free-form chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Form,
    Chat,
}

/// User-submitted search criteria. Opaque to the orchestrator beyond being
/// serializable; the server does all interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub mode: QueryMode,
    /// Free-form text, chat mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub industry: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stage: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sector: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub founder_type: String,
    #[serde(default)]
    pub non_dilutive_only: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_window: Option<String>,
}

impl SearchQuery {
    /// A chat-mode query from free text.
    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            mode: QueryMode::Chat,
            query: Some(text.into()),
            ..Self::default()
        }
    }
}

/// One grant opportunity as returned by the server. Consumed mostly opaquely;
/// the orchestrator only relies on `id` existing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantItem {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub amount: String,
    /// ISO date (`YYYY-MM-DD`) when the server knows it; absent or free-form
    /// ("Rolling") otherwise.
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub eligibility: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub apply_link: String,
    /// Relevance indicator assigned server-side (0-100).
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

impl GrantItem {
    /// The deadline as a date, when it parses as one.
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        let raw = self.deadline.as_deref()?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

/// The server sends grant ids as either numbers or strings.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

/// Server-requested disambiguation step. Consumed once, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clarification {
    pub needed: bool,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Response envelope for `POST /process-input`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchReply {
    #[serde(default)]
    pub grants: Vec<GrantItem>,
    #[serde(default)]
    pub clarification: Option<Clarification>,
}

impl SearchReply {
    /// Whether the server wants a disambiguation round before results.
    pub fn needs_clarification(&self) -> bool {
        self.clarification.as_ref().is_some_and(|c| c.needed)
    }
}

/// Request body for `POST /clarify`.
#[derive(Debug, Clone, Serialize)]
pub struct ClarifyRequest<'a> {
    pub original_query: &'a SearchQuery,
    pub clarification_choice: &'a str,
    pub mode: QueryMode,
}

/// Response envelope for `POST /clarify`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClarifyReply {
    #[serde(default)]
    pub grants: Vec<GrantItem>,
}

/// Request body for `POST /send-email`.
#[derive(Debug, Clone, Serialize)]
pub struct DigestRequest<'a> {
    pub email: &'a str,
    pub grants: &'a [GrantItem],
    pub filters: &'a SearchQuery,
}

/// Error body the server returns on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorReply {
    #[serde(default)]
    pub error: String,
}
