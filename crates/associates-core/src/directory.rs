//! Admin-side associate management

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::{DirectoryError, TokenError};
use crate::model::{AccessToken, AssociateId, AssociateRecord, AssociateStatus, NewAssociate};
use crate::retry::with_store_retry;
use crate::store::{Criteria, RecordStore};
use crate::token::TokenIssuer;
use crate::validators::{
    check_cpf_length, check_field_exists, check_phone_length, check_postal_length, clean_cpf,
    clean_digits, format_cpf, format_phone, format_postal_code, validate_email, FieldError,
    FieldReason, LookupField, SubmissionField, ValidationResult,
};

/// A freshly created associate and the token to deliver to them
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CreatedAssociate {
    pub record: AssociateRecord,
    pub token: AccessToken,
}

/// Admin actions: create, reject, list, reissue tokens
pub struct AssociateDirectory {
    store: Arc<dyn RecordStore>,
    tokens: TokenIssuer,
    config: CoreConfig,
}

impl AssociateDirectory {
    pub fn new(store: Arc<dyn RecordStore>, config: CoreConfig) -> Self {
        let tokens = TokenIssuer::new(store.clone(), config.clone());
        Self {
            store,
            tokens,
            config,
        }
    }

    /// Register a pending associate and mint its access token
    pub async fn create_associate(
        &self,
        new: NewAssociate,
    ) -> Result<CreatedAssociate, DirectoryError> {
        let mut new = NewAssociate {
            name: new.name.trim().to_string(),
            email: new.email.trim().to_string(),
            cpf: optional(new.cpf),
            phone: optional(new.phone),
            postal_code: optional(new.postal_code),
        };

        let mut errors = Vec::new();
        let mut push = |field, result| {
            if let ValidationResult::Invalid(reason) = result {
                errors.push(FieldError::new(field, reason));
            }
        };
        if new.name.is_empty() {
            push(
                SubmissionField::Name,
                ValidationResult::Invalid(FieldReason::InvalidName),
            );
        }
        if !validate_email(&new.email) {
            push(
                SubmissionField::Email,
                ValidationResult::Invalid(FieldReason::InvalidEmail),
            );
        } else if check_field_exists(self.store.as_ref(), LookupField::Email, &new.email).await? {
            push(
                SubmissionField::Email,
                ValidationResult::Invalid(FieldReason::EmailInUse),
            );
        }
        if let Some(cpf) = new.cpf.as_deref() {
            push(SubmissionField::Cpf, check_cpf_length(cpf));
        }
        if let Some(phone) = new.phone.as_deref() {
            push(SubmissionField::Phone, check_phone_length(phone));
        }
        if let Some(postal_code) = new.postal_code.as_deref() {
            push(SubmissionField::PostalCode, check_postal_length(postal_code));
        }
        if !errors.is_empty() {
            return Err(DirectoryError::Invalid(errors));
        }

        new.cpf = new.cpf.map(|cpf| format_cpf(&clean_cpf(&cpf)));
        new.phone = new.phone.map(|phone| format_phone(&clean_digits(&phone)));
        new.postal_code = new
            .postal_code
            .map(|postal_code| format_postal_code(&clean_digits(&postal_code)));

        let record = self.tokens.register(AssociateRecord::pending(new)).await?;
        let Some(token) = record.token.clone() else {
            return Err(DirectoryError::Token(TokenError::Generation(
                "registered record carries no token".to_string(),
            )));
        };

        tracing::info!(associate_id = %record.id, "Associate created");
        Ok(CreatedAssociate { record, token })
    }

    /// Replace the token of a pending associate
    pub async fn reissue_token(&self, id: &AssociateId) -> Result<AccessToken, DirectoryError> {
        Ok(self.tokens.issue_token(id).await?)
    }

    /// Turn down a pending associate; their token stops resolving
    pub async fn reject_associate(&self, id: &AssociateId) -> Result<AssociateRecord, DirectoryError> {
        let store = self.store.as_ref();
        let record = with_store_retry(self.config.store_retries, "reject_associate", || {
            store.update_status(id, AssociateStatus::Rejected, AssociateStatus::Pending, None)
        })
        .await?;
        tracing::info!(associate_id = %id, "Associate rejected");
        Ok(record)
    }

    pub async fn get(&self, id: &AssociateId) -> Result<Option<AssociateRecord>, DirectoryError> {
        let store = self.store.as_ref();
        let criteria = Criteria::Id(*id);
        Ok(
            with_store_retry(self.config.store_retries, "get_associate", || {
                store.find_one(&criteria)
            })
            .await?,
        )
    }

    pub async fn list_associates(
        &self,
        status: Option<AssociateStatus>,
    ) -> Result<Vec<AssociateRecord>, DirectoryError> {
        let store = self.store.as_ref();
        Ok(
            with_store_retry(self.config.store_retries, "list_associates", || store.list(status))
                .await?,
        )
    }
}

/// Trimmed value, treating blank input as absent
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
