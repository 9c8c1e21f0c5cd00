// crates/core/src/types.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Display name used when a session's user has no member record.
pub const UNKNOWN_MEMBER_NAME: &str = "Usuário Desconhecido";

/// A time-tracking entry. `end_time == None` means the session is still running.
///
/// `user_id` is nullable in the table; such a record still renders, with no
/// member resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRecord {
    pub id: String,
    pub user_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub client_id: Option<String>,
    pub product_id: Option<String>,
    pub task_id: Option<String>,
}

impl TimeRecord {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Expected duration of a task when a given member is responsible for it.
///
/// `estimated_value` is stored either as hours (values below 1000) or as
/// milliseconds; see [`crate::duration::estimate_to_ms`].
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationRule {
    pub id: String,
    pub task_id: String,
    pub responsible_id: i64,
    pub estimated_value: Option<f64>,
    pub start_date: Option<String>,
}

/// Links a user to the member identity used as "responsible" in estimation rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: i64,
    pub user_id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub photo: Option<String>,
}

/// Id/name pair for clients, products and tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    pub id: String,
    pub name: Option<String>,
}

impl NamedEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

/// One running session as rendered by `GET /api/live/active-sessions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSession {
    pub id: String,
    #[serde(rename = "usuario_id")]
    pub user_id: Option<i64>,
    #[serde(rename = "data_inicio")]
    pub started_at: String,
    #[serde(rename = "membro_id")]
    pub member_id: i64,
    #[serde(rename = "membro_nome")]
    pub member_name: String,
    #[serde(rename = "foto_perfil", skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(rename = "cliente_id", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "cliente_nome")]
    pub client_name: Option<String>,
    #[serde(rename = "produto_id", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(rename = "produto_nome")]
    pub product_name: Option<String>,
    #[serde(rename = "tarefa_id", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "tarefa_nome")]
    pub task_name: Option<String>,
    #[serde(rename = "tempo_estimado_id")]
    pub estimation_id: Option<String>,
    #[serde(rename = "tempo_decorrido_ms")]
    pub elapsed_ms: i64,
    #[serde(rename = "tempo_estimado_formatado")]
    pub estimated_formatted: Option<String>,
    #[serde(rename = "data_estimada_formatada")]
    pub estimated_date_formatted: Option<String>,
}

/// Success envelope for the active-sessions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSessionsResponse {
    pub success: bool,
    pub data: Vec<ActiveSession>,
    pub count: usize,
}

impl ActiveSessionsResponse {
    pub fn new(data: Vec<ActiveSession>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix, e.g. `2024-03-05T10:00:00.000Z`.
pub fn to_iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
