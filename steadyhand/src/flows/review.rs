//! Open a document in the browser and leave it up for a timed review.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::{with_teardown, FlowContext};
use crate::condition::{condition_fn, ProbeResult};
use crate::config::{FlowConfig, ReviewConfig};
use crate::driver::UiDriver;
use crate::errors::AutomationError;
use crate::step::run_step;

const READY_STATE_SCRIPT: &str = "return document.readyState";

#[instrument(skip_all, fields(url = %config.url))]
pub async fn run(
    driver: &dyn UiDriver,
    config: &ReviewConfig,
    cancel: &CancellationToken,
) -> Result<(), AutomationError> {
    let wait = config.wait_config()?;
    let ctx = FlowContext::new(driver, wait, cancel);
    with_teardown(driver, async {
        run_step("Opening document", driver.navigate(&config.url)).await?;

        let loaded = condition_fn("document to finish loading", move || async move {
            let state = driver.execute_script(READY_STATE_SCRIPT).await?;
            Ok::<_, AutomationError>(match state.as_str() {
                Some("complete") => ProbeResult::Satisfied(()),
                _ => ProbeResult::not_yet(format!("readyState {state}")),
            })
        });
        run_step("Waiting for document to load", ctx.until(loaded)).await?;

        info!("Document open; reviewing for {:?}", config.review);
        ctx.pause(config.review).await?;
        info!("Review time finished");
        Ok(())
    })
    .await
}
