//! Associates Core
//!
//! Token-gated onboarding for HR associates. An admin registers a pending
//! associate, which mints an opaque access token; the associate opens the
//! field or form page with that token and submits their data, which must
//! pass the field validators before the record becomes active.
//!
//! ## Architecture
//!
//! 1. **Token issuer** (`token`): mints CSPRNG-backed tokens and resolves
//!    them back to pending records.
//! 2. **Validators** (`validators`): pure email/CPF/phone/CEP checks and
//!    formatters, plus the injectable existence lookup.
//! 3. **Gateway** (`gateway`): resolves, validates and accepts or rejects a
//!    submission, reporting every failing field.
//! 4. **Directory** (`directory`): admin actions.
//! 5. **Store** (`store`): the [`RecordStore`] seam with an in-memory
//!    implementation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use associates_core::{
//!     AssociateDirectory, CoreConfig, InMemoryRecordStore, NewAssociate, RecordStore,
//!     SubmissionGateway, SubmissionPayload,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
//!     let directory = AssociateDirectory::new(store.clone(), CoreConfig::default());
//!     let gateway = SubmissionGateway::new(store, CoreConfig::default());
//!
//!     let created = directory
//!         .create_associate(NewAssociate::new("Ana", "ana@example.com"))
//!         .await
//!         .unwrap();
//!
//!     let payload = SubmissionPayload::new()
//!         .with_cpf("123.456.789-01")
//!         .with_phone("11987654321");
//!     let record = gateway.submit(&created.token.value, &payload).await.unwrap();
//!     assert_eq!(record.status.as_str(), "active");
//! }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod model;
pub mod store;
pub mod token;
pub mod validators;

mod retry;

pub use config::CoreConfig;
pub use directory::{AssociateDirectory, CreatedAssociate};
pub use error::{ConfigError, DirectoryError, StoreError, StoreResult, SubmissionError, TokenError};
pub use gateway::{SubmissionGateway, SubmissionState};
pub use model::{
    AccessToken, AssociateChanges, AssociateId, AssociateRecord, AssociateStatus, NewAssociate,
    SubmissionPayload,
};
pub use store::{Criteria, InMemoryRecordStore, RecordStore};
pub use token::TokenIssuer;
pub use validators::{
    check_field_exists, clean_cpf, format_cpf, format_phone, format_postal_code, validate_email,
    FieldError, FieldLookup, FieldReason, LookupField, SubmissionField, ValidationResult,
};
