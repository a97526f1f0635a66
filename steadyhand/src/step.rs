//! Named steps for automation flows.
//!
//! Each step logs when it starts and, if it fails, logs the failure under its
//! name before handing the error back unchanged.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::AutomationError;

/// Run a step whose failure ends the flow.
pub async fn run_step<T, F>(name: &str, step: F) -> Result<T, AutomationError>
where
    F: Future<Output = Result<T, AutomationError>>,
{
    info!("{}...", name);
    step.await.inspect_err(|e| error!("Error during {}: {}", name, e))
}

/// Run a step the flow can do without. Failures are logged and turned into
/// `Ok(None)`; cancellation still propagates.
pub async fn optional_step<T, F>(name: &str, step: F) -> Result<Option<T>, AutomationError>
where
    F: Future<Output = Result<T, AutomationError>>,
{
    info!("{}...", name);
    match step.await {
        Ok(value) => Ok(Some(value)),
        Err(e @ AutomationError::Cancelled(_)) => Err(e),
        Err(e) => {
            warn!("Skipping {}: {}", name, e);
            Ok(None)
        }
    }
}

/// Sleep for a fixed delay, returning early with `Cancelled` if the run is
/// abandoned. Only for states nothing on screen can confirm.
pub async fn pause(delay: Duration, cancel: &CancellationToken) -> Result<(), AutomationError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AutomationError::Cancelled(format!(
            "cancelled during {delay:?} pause"
        ))),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
