//! Record store abstraction
//!
//! The store is an external collaborator: onboarding logic only talks to it
//! through [`RecordStore`], so tests and alternative backends plug in by
//! implementing the trait. Implementations must make
//! [`RecordStore::update_status`] a compare-and-set on the status so that
//! the pending to active transition happens exactly once.

pub mod memory;

pub use memory::InMemoryRecordStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{AccessToken, AssociateChanges, AssociateId, AssociateRecord, AssociateStatus};
use crate::validators::{FieldLookup, LookupField};

/// Lookup criteria for [`RecordStore::find_one`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    Id(AssociateId),
    /// Exact token value
    Token(String),
    /// Case-insensitive email
    Email(String),
    /// CPF compared on digits only
    Cpf(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First record matching `criteria`
    async fn find_one(&self, criteria: &Criteria) -> StoreResult<Option<AssociateRecord>>;

    /// Insert a new record; ids and token values must be unique
    async fn insert(&self, record: AssociateRecord) -> StoreResult<AssociateRecord>;

    /// Associate `token` with the record, replacing any previous token
    async fn attach_token(&self, id: &AssociateId, token: AccessToken) -> StoreResult<()>;

    /// Move the record to `status` only if it is currently `expected_prior`,
    /// applying `changes` in the same atomic step.
    ///
    /// Fails with [`StoreError::Conflict`](crate::error::StoreError::Conflict)
    /// when the current status differs.
    async fn update_status(
        &self,
        id: &AssociateId,
        status: AssociateStatus,
        expected_prior: AssociateStatus,
        changes: Option<AssociateChanges>,
    ) -> StoreResult<AssociateRecord>;

    /// All records, optionally filtered by status, oldest first
    async fn list(&self, status: Option<AssociateStatus>) -> StoreResult<Vec<AssociateRecord>>;
}

#[async_trait]
impl<S> FieldLookup for S
where
    S: RecordStore + ?Sized,
{
    async fn find_by_field(
        &self,
        field: LookupField,
        value: &str,
    ) -> StoreResult<Option<AssociateId>> {
        let criteria = match field {
            LookupField::Email => Criteria::Email(value.to_string()),
            LookupField::Cpf => Criteria::Cpf(value.to_string()),
        };
        Ok(self.find_one(&criteria).await?.map(|record| record.id))
    }
}
