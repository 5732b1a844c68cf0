//! Data model for associates and their access tokens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of an associate record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssociateId(Uuid);

impl AssociateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssociateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssociateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for AssociateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle status of an associate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociateStatus {
    /// Created by an admin, waiting for the associate's submission
    Pending,
    /// Submission accepted
    Active,
    /// Turned down by an admin
    Rejected,
}

impl AssociateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssociateStatus::Pending => "pending",
            AssociateStatus::Active => "active",
            AssociateStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AssociateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque token gating an associate's field and form pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Whether the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| now >= expiry)
    }

    /// Short prefix safe to put in logs
    pub fn redacted(&self) -> String {
        redact_token(&self.value)
    }
}

/// Keeps the first few characters of a token for log correlation
pub fn redact_token(value: &str) -> String {
    let prefix: String = value.chars().take(6).collect();
    format!("{prefix}…")
}

/// A member managed by HR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateRecord {
    pub id: AssociateId,
    pub name: String,
    pub email: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub status: AssociateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<AccessToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssociateRecord {
    /// Build a fresh pending record from an admin request
    pub fn pending(new: NewAssociate) -> Self {
        let now = Utc::now();
        Self {
            id: AssociateId::new(),
            name: new.name,
            email: new.email,
            cpf: new.cpf,
            phone: new.phone,
            postal_code: new.postal_code,
            status: AssociateStatus::Pending,
            token: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == AssociateStatus::Pending
    }

    /// Apply accepted submission values
    pub fn apply(&mut self, changes: &AssociateChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        self.email = changes.email.clone();
        self.cpf = Some(changes.cpf.clone());
        self.phone = Some(changes.phone.clone());
        if let Some(postal_code) = &changes.postal_code {
            self.postal_code = Some(postal_code.clone());
        }
    }
}

/// Admin request to register an associate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssociate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl NewAssociate {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_cpf(mut self, cpf: impl Into<String>) -> Self {
        self.cpf = Some(cpf.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }
}

/// Data posted by an associate from the field or form page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl SubmissionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_cpf(mut self, cpf: impl Into<String>) -> Self {
        self.cpf = Some(cpf.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }
}

/// Normalized values written to the record when a submission is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateChanges {
    pub name: Option<String>,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub postal_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&AssociateStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        assert_eq!(AssociateStatus::Rejected.to_string(), "rejected");
    }

    #[test]
    fn test_token_expiry() {
        let now = Utc::now();
        let token = AccessToken {
            value: "abc".to_string(),
            issued_at: now,
            expires_at: Some(now + Duration::hours(1)),
        };
        assert!(!token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::hours(1)));

        let forever = AccessToken {
            expires_at: None,
            ..token
        };
        assert!(!forever.is_expired_at(now + Duration::days(3650)));
    }

    #[test]
    fn test_redacted_token_keeps_prefix_only() {
        assert_eq!(redact_token("0123456789abcdef"), "012345…");
        assert_eq!(redact_token("ab"), "ab…");
    }

    #[test]
    fn test_apply_changes() {
        let mut record = AssociateRecord::pending(NewAssociate::new("Ana", "a@b.com"));
        record.apply(&AssociateChanges {
            name: None,
            email: "ana@b.com".to_string(),
            cpf: "123.456.789-01".to_string(),
            phone: "(11) 98765-4321".to_string(),
            postal_code: None,
        });
        assert_eq!(record.name, "Ana");
        assert_eq!(record.email, "ana@b.com");
        assert_eq!(record.cpf.as_deref(), Some("123.456.789-01"));
        assert!(record.postal_code.is_none());
    }

    #[test]
    fn test_associate_id_parses() {
        let id = AssociateId::new();
        let parsed: AssociateId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
