//! Bounded immediate retry for transient store failures

use std::future::Future;

use crate::error::StoreResult;

/// Run `op`, retrying up to `retries` more times while it fails with a
/// transient error. Non-transient errors are returned on first sight.
pub(crate) async fn with_store_retry<T, F, Fut>(
    retries: u32,
    operation: &'static str,
    mut op: F,
) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < retries => {
                attempt += 1;
                tracing::warn!(
                    operation,
                    attempt,
                    error = %err,
                    "Store unavailable, retrying"
                );
            }
            result => return result,
        }
    }
}
