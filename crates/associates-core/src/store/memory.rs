//! In-process record store backed by a `RwLock<HashMap>`

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Criteria, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::model::{AccessToken, AssociateChanges, AssociateId, AssociateRecord, AssociateStatus};
use crate::validators::clean_cpf;

/// Store used by the development server and tests.
///
/// Every mutation runs under a single write lock, which gives
/// [`RecordStore::update_status`] its compare-and-set guarantee.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<AssociateId, AssociateRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn matches(record: &AssociateRecord, criteria: &Criteria) -> bool {
    match criteria {
        Criteria::Id(id) => record.id == *id,
        Criteria::Token(value) => record.token.as_ref().is_some_and(|t| t.value == *value),
        Criteria::Email(email) => record.email.trim().eq_ignore_ascii_case(email.trim()),
        Criteria::Cpf(cpf) => {
            let wanted = clean_cpf(cpf);
            !wanted.is_empty()
                && record
                    .cpf
                    .as_deref()
                    .is_some_and(|stored| clean_cpf(stored) == wanted)
        }
    }
}

fn token_taken(
    records: &HashMap<AssociateId, AssociateRecord>,
    owner: &AssociateId,
    value: &str,
) -> bool {
    records.values().any(|r| {
        r.id != *owner && r.token.as_ref().is_some_and(|t| t.value == value)
    })
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_one(&self, criteria: &Criteria) -> StoreResult<Option<AssociateRecord>> {
        let records = self.records.read().await;
        if let Criteria::Id(id) = criteria {
            return Ok(records.get(id).cloned());
        }
        let mut found: Vec<&AssociateRecord> =
            records.values().filter(|r| matches(r, criteria)).collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found.first().map(|r| (*r).clone()))
    }

    async fn insert(&self, record: AssociateRecord) -> StoreResult<AssociateRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate("id"));
        }
        if let Some(token) = &record.token {
            if token_taken(&records, &record.id, &token.value) {
                return Err(StoreError::Duplicate("token"));
            }
        }
        records.insert(record.id, record.clone());
        tracing::debug!(associate_id = %record.id, "Inserted associate record");
        Ok(record)
    }

    async fn attach_token(&self, id: &AssociateId, token: AccessToken) -> StoreResult<()> {
        let mut records = self.records.write().await;
        if token_taken(&records, id, &token.value) {
            return Err(StoreError::Duplicate("token"));
        }
        let record = records.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        record.token = Some(token);
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(
        &self,
        id: &AssociateId,
        status: AssociateStatus,
        expected_prior: AssociateStatus,
        changes: Option<AssociateChanges>,
    ) -> StoreResult<AssociateRecord> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        if record.status != expected_prior {
            return Err(StoreError::Conflict {
                id: *id,
                expected: expected_prior,
                actual: record.status,
            });
        }
        if let Some(changes) = &changes {
            record.apply(changes);
        }
        record.status = status;
        record.updated_at = Utc::now();
        tracing::debug!(
            associate_id = %id,
            from = %expected_prior,
            to = %status,
            "Associate status updated"
        );
        Ok(record.clone())
    }

    async fn list(&self, status: Option<AssociateStatus>) -> StoreResult<Vec<AssociateRecord>> {
        let records = self.records.read().await;
        let mut out: Vec<AssociateRecord> = records
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }
}
