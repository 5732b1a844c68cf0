//! Access token issuance and resolution
//!
//! A token is a random fragment drawn from the operating system CSPRNG
//! followed by `-` and the issuance time, both rendered in base 36. It gates the
//! associate's field and form pages and resolves to its record only while
//! that record is still pending and the token has not expired.

use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::{StoreError, TokenError};
use crate::model::{redact_token, AccessToken, AssociateId, AssociateRecord};
use crate::retry::with_store_retry;
use crate::store::{Criteria, RecordStore};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Width of the random fragment: `u128::MAX` needs 25 base-36 digits
const RANDOM_FRAGMENT_LEN: usize = 25;

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Produce a fresh token value for `now`
pub fn generate_token_value(
    rng: &dyn SecureRandom,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes)
        .map_err(|_| TokenError::Generation("system random source failed".to_string()))?;

    let random = to_base36(u128::from_be_bytes(bytes));
    let millis = u128::try_from(now.timestamp_millis()).unwrap_or_default();
    Ok(format!(
        "{random:0>width$}-{}",
        to_base36(millis),
        width = RANDOM_FRAGMENT_LEN
    ))
}

/// Mints and resolves access tokens against a [`RecordStore`]
pub struct TokenIssuer {
    store: Arc<dyn RecordStore>,
    config: CoreConfig,
    rng: SystemRandom,
}

impl TokenIssuer {
    pub fn new(store: Arc<dyn RecordStore>, config: CoreConfig) -> Self {
        Self {
            store,
            config,
            rng: SystemRandom::new(),
        }
    }

    /// Fresh token issued at `now`, with the configured expiry
    fn mint(&self, now: DateTime<Utc>) -> Result<AccessToken, TokenError> {
        let expires_at = match self.config.token_ttl() {
            Some(ttl) => Some(now.checked_add_signed(ttl).ok_or_else(|| {
                TokenError::Generation(format!(
                    "token expiry out of range for ttl of {} hours",
                    self.config.token_ttl_hours
                ))
            })?),
            None => None,
        };
        Ok(AccessToken {
            value: generate_token_value(&self.rng, now)?,
            issued_at: now,
            expires_at,
        })
    }

    /// Generate a token for a pending record and persist the association.
    ///
    /// Any token the record held before stops resolving.
    pub async fn issue_token(&self, record_id: &AssociateId) -> Result<AccessToken, TokenError> {
        let store = self.store.as_ref();
        let criteria = Criteria::Id(*record_id);
        let record = with_store_retry(self.config.store_retries, "find_record", || {
            store.find_one(&criteria)
        })
        .await?
        .ok_or(StoreError::NotFound(*record_id))?;

        if !record.is_pending() {
            return Err(TokenError::NotPending {
                id: record.id,
                status: record.status,
            });
        }

        for attempt in 0..=self.config.token_collision_retries {
            let token = self.mint(Utc::now())?;

            let attached = with_store_retry(self.config.store_retries, "attach_token", || {
                store.attach_token(record_id, token.clone())
            })
            .await;

            match attached {
                Ok(()) => {
                    tracing::info!(
                        associate_id = %record_id,
                        token = %token.redacted(),
                        expires_at = ?token.expires_at,
                        "Issued access token"
                    );
                    return Ok(token);
                }
                Err(StoreError::Duplicate("token")) => {
                    tracing::warn!(associate_id = %record_id, attempt, "Token collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(self.collisions_exhausted())
    }

    /// Insert a new pending record with a token already attached.
    ///
    /// The record and its token are written in one store call, so a failure
    /// leaves nothing behind.
    pub async fn register(&self, record: AssociateRecord) -> Result<AssociateRecord, TokenError> {
        if !record.is_pending() {
            return Err(TokenError::NotPending {
                id: record.id,
                status: record.status,
            });
        }

        let store = self.store.as_ref();
        for attempt in 0..=self.config.token_collision_retries {
            let mut candidate = record.clone();
            candidate.token = Some(self.mint(Utc::now())?);

            let inserted = with_store_retry(self.config.store_retries, "insert_record", || {
                store.insert(candidate.clone())
            })
            .await;

            match inserted {
                Ok(inserted) => {
                    tracing::info!(
                        associate_id = %inserted.id,
                        token = %inserted.token.as_ref().map(AccessToken::redacted).unwrap_or_default(),
                        "Registered associate with access token"
                    );
                    return Ok(inserted);
                }
                Err(StoreError::Duplicate("token")) => {
                    tracing::warn!(associate_id = %record.id, attempt, "Token collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(self.collisions_exhausted())
    }

    fn collisions_exhausted(&self) -> TokenError {
        TokenError::Generation(format!(
            "no unique token after {} attempts",
            self.config.token_collision_retries + 1
        ))
    }

    /// Resolve a token to its pending record.
    ///
    /// Unknown, expired and consumed tokens all yield [`TokenError::NotFound`].
    /// Resolution never mutates the record.
    pub async fn resolve_token(&self, token: &str) -> Result<AssociateRecord, TokenError> {
        if token.is_empty() {
            return Err(TokenError::NotFound);
        }

        let store = self.store.as_ref();
        let criteria = Criteria::Token(token.to_string());
        let record = with_store_retry(self.config.store_retries, "resolve_token", || {
            store.find_one(&criteria)
        })
        .await?;

        let Some(record) = record else {
            tracing::debug!(token = %redact_token(token), "Unknown token");
            return Err(TokenError::NotFound);
        };

        let expired = record
            .token
            .as_ref()
            .map_or(true, |t| t.is_expired_at(Utc::now()));
        if expired {
            tracing::debug!(associate_id = %record.id, "Expired token");
            return Err(TokenError::NotFound);
        }
        if !record.is_pending() {
            tracing::debug!(
                associate_id = %record.id,
                status = %record.status,
                "Token of a non-pending associate"
            );
            return Err(TokenError::NotFound);
        }

        Ok(record)
    }
}
