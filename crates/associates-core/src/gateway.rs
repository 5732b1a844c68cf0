//! Submission gateway
//!
//! Drives one submission attempt through
//! `Received -> TokenResolved -> Validating -> Accepted | Rejected`.
//! Acceptance writes the normalized values and flips the record from
//! `pending` to `active` in a single compare-and-set, which also retires
//! the token. A rejected attempt leaves the record untouched so the
//! associate can correct the payload and retry with the same token.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::{StoreResult, SubmissionError};
use crate::model::{
    redact_token, AssociateChanges, AssociateId, AssociateRecord, AssociateStatus,
    SubmissionPayload,
};
use crate::retry::with_store_retry;
use crate::store::RecordStore;
use crate::token::TokenIssuer;
use crate::validators::{
    check_cpf_length, check_email, check_field_exists, check_phone_length, check_postal_length,
    clean_cpf, clean_digits, format_cpf, format_phone, format_postal_code, validate_cpf_checksum,
    FieldError, FieldLookup, FieldReason, LookupField, SubmissionField, ValidationResult,
};

/// Lifecycle of a single submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Received,
    TokenResolved,
    Validating,
    Accepted,
    Rejected,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Accepted | SubmissionState::Rejected)
    }

    pub fn can_transition_to(&self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        matches!(
            (self, next),
            (Received, TokenResolved)
                | (Received, Rejected)
                | (TokenResolved, Validating)
                | (Validating, Accepted)
                | (Validating, Rejected)
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Received => "received",
            SubmissionState::TokenResolved => "token_resolved",
            SubmissionState::Validating => "validating",
            SubmissionState::Accepted => "accepted",
            SubmissionState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

struct Attempt {
    state: SubmissionState,
    token: String,
}

impl Attempt {
    fn new(token: &str) -> Self {
        Self {
            state: SubmissionState::Received,
            token: redact_token(token),
        }
    }

    fn advance(&mut self, next: SubmissionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal submission transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(token = %self.token, from = %self.state, to = %next, "Submission state");
        self.state = next;
    }

    fn reject(&mut self, err: SubmissionError) -> SubmissionError {
        self.advance(SubmissionState::Rejected);
        tracing::info!(token = %self.token, reasons = ?err.reason_codes(), "Submission rejected");
        err
    }
}

/// Existence lookup that ignores the submitting associate's own record
struct OtherRecords<'a> {
    store: &'a dyn RecordStore,
    exclude: AssociateId,
    retries: u32,
}

#[async_trait]
impl FieldLookup for OtherRecords<'_> {
    async fn find_by_field(
        &self,
        field: LookupField,
        value: &str,
    ) -> StoreResult<Option<AssociateId>> {
        let store = self.store;
        let found = with_store_retry(self.retries, "field_lookup", || {
            store.find_by_field(field, value)
        })
        .await?;
        Ok(found.filter(|id| *id != self.exclude))
    }
}

/// Accepts token + payload submissions from associates
pub struct SubmissionGateway {
    store: Arc<dyn RecordStore>,
    tokens: TokenIssuer,
    config: CoreConfig,
}

impl SubmissionGateway {
    pub fn new(store: Arc<dyn RecordStore>, config: CoreConfig) -> Self {
        let tokens = TokenIssuer::new(store.clone(), config.clone());
        Self {
            store,
            tokens,
            config,
        }
    }

    /// Resolve the token ahead of rendering a field or form page
    pub async fn preview(&self, token: &str) -> Result<AssociateRecord, SubmissionError> {
        Ok(self.tokens.resolve_token(token).await?)
    }

    /// Process one submission attempt
    pub async fn submit(
        &self,
        token: &str,
        payload: &SubmissionPayload,
    ) -> Result<AssociateRecord, SubmissionError> {
        let mut attempt = Attempt::new(token);

        let record = match self.tokens.resolve_token(token).await {
            Ok(record) => record,
            Err(err) => {
                let err = SubmissionError::from(err);
                if !err.is_rejection() {
                    return Err(err);
                }
                return Err(attempt.reject(err));
            }
        };
        attempt.advance(SubmissionState::TokenResolved);

        attempt.advance(SubmissionState::Validating);
        let changes = match self.validate(&record, payload).await? {
            Ok(changes) => changes,
            Err(fields) => return Err(attempt.reject(SubmissionError::ValidationFailed(fields))),
        };

        let store = self.store.as_ref();
        let updated = with_store_retry(self.config.store_retries, "accept_submission", || {
            store.update_status(
                &record.id,
                AssociateStatus::Active,
                AssociateStatus::Pending,
                Some(changes.clone()),
            )
        })
        .await;

        match updated {
            Ok(updated) => {
                attempt.advance(SubmissionState::Accepted);
                tracing::info!(associate_id = %updated.id, "Submission accepted");
                Ok(updated)
            }
            Err(err) => {
                let err = SubmissionError::from(err);
                if !err.is_rejection() {
                    return Err(err);
                }
                Err(attempt.reject(err))
            }
        }
    }

    /// Validate every field, collecting all failures.
    ///
    /// Required fields missing from the payload fall back to the values
    /// already on the record. The outer error is a store outage during the
    /// email uniqueness lookup.
    async fn validate(
        &self,
        record: &AssociateRecord,
        payload: &SubmissionPayload,
    ) -> Result<Result<AssociateChanges, Vec<FieldError>>, SubmissionError> {
        let mut errors = validate_fields(record, payload, self.config.strict_cpf_checksum);

        let email = provided(&payload.email)
            .unwrap_or(record.email.as_str())
            .to_string();
        let email_ok = !errors.iter().any(|e| e.field == SubmissionField::Email);
        if email_ok {
            let others = OtherRecords {
                store: self.store.as_ref(),
                exclude: record.id,
                retries: self.config.store_retries,
            };
            if check_field_exists(&others, LookupField::Email, &email).await? {
                errors.push(FieldError::new(SubmissionField::Email, FieldReason::EmailInUse));
            }
        }

        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        let cpf = provided(&payload.cpf).or(record.cpf.as_deref()).unwrap_or_default();
        let phone = provided(&payload.phone).or(record.phone.as_deref()).unwrap_or_default();
        Ok(Ok(AssociateChanges {
            name: provided(&payload.name).map(str::to_string),
            email,
            cpf: format_cpf(&clean_cpf(cpf)),
            phone: format_phone(&clean_digits(phone)),
            postal_code: provided(&payload.postal_code)
                .map(|p| format_postal_code(&clean_digits(p))),
        }))
    }
}

/// Trimmed value, treating blank input as absent
fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Pure field checks, in field order
pub fn validate_fields(
    record: &AssociateRecord,
    payload: &SubmissionPayload,
    strict_cpf_checksum: bool,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut push = |field: SubmissionField, result: ValidationResult| {
        if let ValidationResult::Invalid(reason) = result {
            errors.push(FieldError::new(field, reason));
        }
    };

    if payload.name.is_some() && provided(&payload.name).is_none() {
        push(
            SubmissionField::Name,
            ValidationResult::Invalid(FieldReason::InvalidName),
        );
    }

    match payload.email.as_deref().or(Some(record.email.as_str())).map(str::trim) {
        Some(email) if !email.is_empty() => push(SubmissionField::Email, check_email(email)),
        _ => push(
            SubmissionField::Email,
            ValidationResult::Invalid(FieldReason::Required),
        ),
    }

    match provided(&payload.cpf).or(record.cpf.as_deref()) {
        Some(cpf) => {
            let length = check_cpf_length(cpf);
            if length.is_valid() && strict_cpf_checksum && !validate_cpf_checksum(cpf) {
                push(
                    SubmissionField::Cpf,
                    ValidationResult::Invalid(FieldReason::InvalidCpfChecksum),
                );
            } else {
                push(SubmissionField::Cpf, length);
            }
        }
        None => push(
            SubmissionField::Cpf,
            ValidationResult::Invalid(FieldReason::Required),
        ),
    }

    match provided(&payload.phone).or(record.phone.as_deref()) {
        Some(phone) => push(SubmissionField::Phone, check_phone_length(phone)),
        None => push(
            SubmissionField::Phone,
            ValidationResult::Invalid(FieldReason::Required),
        ),
    }

    if let Some(postal_code) = provided(&payload.postal_code) {
        push(SubmissionField::PostalCode, check_postal_length(postal_code));
    }

    errors
}
