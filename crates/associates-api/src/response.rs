//! JSON response envelope shared by every route

use associates_core::{AssociateId, AssociateRecord, AssociateStatus, FieldError};
use serde::{Deserialize, Serialize};

/// Body of every route: `data` on success, `error` otherwise
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Correlates the body with the request's log lines
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            data: Some(data),
            error: None,
            request_id,
        }
    }

    pub fn error(error: ErrorInfo, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            data: None,
            error: Some(error),
            request_id,
        }
    }
}

/// Why a request was turned down.
///
/// Submission and creation failures carry one reason code per failing field,
/// in field order, so a page can highlight every problem at once.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorInfo {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            reasons: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: &[FieldError]) -> Self {
        self.reasons = fields.iter().map(|f| f.reason.as_str()).collect();
        self.fields = fields.to_vec();
        self
    }
}

/// Which associate page a token was opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Field,
    Form,
}

/// Associate data exposed to pages; never carries the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateView {
    pub id: AssociateId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub status: AssociateStatus,
}

impl From<&AssociateRecord> for AssociateView {
    fn from(record: &AssociateRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
            cpf: record.cpf.clone(),
            phone: record.phone.clone(),
            postal_code: record.postal_code.clone(),
            status: record.status,
        }
    }
}

/// Body of the associate page endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub page: Page,
    pub associate: AssociateView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
}
