//! Per-application exclusive locks.
//!
//! A suspend or resume decision reads host status, evaluates, and writes
//! host status. Two decisions for the same application must not interleave,
//! or both may observe a state that is only safe for one of them.
//! Different applications never contend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use hostgate_model::ApplicationId;

use crate::error::{StatusError, StatusResult};

/// Hands out one exclusive lock per application.
#[derive(Clone, Default)]
pub struct ApplicationLocks {
    locks: Arc<Mutex<HashMap<ApplicationId, Arc<Mutex<()>>>>>,
}

impl ApplicationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock of `application`, waiting at most `timeout`.
    pub async fn lock(
        &self,
        application: &ApplicationId,
        timeout: Duration,
    ) -> StatusResult<ApplicationLock> {
        let mutex = {
            let mut locks = self.locks.lock().await;
            // Entries nobody holds or waits for are only referenced by the map.
            locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            locks
                .entry(application.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        match tokio::time::timeout(timeout, mutex.lock_owned()).await {
            Ok(guard) => {
                debug!(%application, "application lock acquired");
                Ok(ApplicationLock {
                    application: application.clone(),
                    _guard: guard,
                })
            }
            Err(_) => {
                warn!(%application, ?timeout, "timed out waiting for application lock");
                Err(StatusError::LockTimeout {
                    application: application.clone(),
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
    }
}

/// Held for the duration of one decision. Released on drop.
pub struct ApplicationLock {
    application: ApplicationId,
    _guard: OwnedMutexGuard<()>,
}

impl ApplicationLock {
    pub fn application(&self) -> &ApplicationId {
        &self.application
    }
}

impl Drop for ApplicationLock {
    fn drop(&mut self) {
        debug!(application = %self.application, "application lock released");
    }
}
