//! Automation flows.
//!
//! Each flow is a straight sequence of steps against a [`UiDriver`]. Every
//! wait goes through [`crate::waiter`]; the constants below are the only fixed
//! delays, kept for states nothing on screen reports.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::condition::{clickable, presence_of, visibility_of, Condition};
use crate::driver::{Element, UiDriver};
use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::step::pause;
use crate::waiter::{wait_until, WaitConfig};

pub mod file_picker;
pub mod groupware;
pub mod product_update;
pub mod review;

/// Gap between filling two fields, so key handlers on the page keep up.
pub const TYPING_PAUSE: Duration = Duration::from_millis(500);
/// Settle time after a navigation click when no readiness marker is configured.
pub const PAGE_SETTLE: Duration = Duration::from_secs(3);
/// Settle time after saving when no confirmation marker is configured.
pub const SAVE_SETTLE: Duration = Duration::from_secs(5);
/// Time for the user to focus the target window before keys are sent.
pub const STARTUP_GRACE: Duration = Duration::from_secs(5);
/// Time for a native file dialog to open.
pub const DIALOG_SETTLE: Duration = Duration::from_secs(2);
/// Gap between repeated key presses in a native dialog.
pub const KEY_PAUSE: Duration = Duration::from_millis(500);
/// Time for the application to load the chosen file.
pub const LOAD_SETTLE: Duration = Duration::from_secs(1);

/// The driver, timeouts and cancellation token shared by a flow's steps.
pub(crate) struct FlowContext<'a> {
    pub driver: &'a dyn UiDriver,
    pub wait: WaitConfig,
    pub cancel: &'a CancellationToken,
}

impl<'a> FlowContext<'a> {
    pub fn new(driver: &'a dyn UiDriver, wait: WaitConfig, cancel: &'a CancellationToken) -> Self {
        Self {
            driver,
            wait,
            cancel,
        }
    }

    pub async fn until<C>(&self, condition: C) -> Result<C::Output, AutomationError>
    where
        C: Condition,
    {
        wait_until(&condition, self.wait, self.cancel).await
    }

    pub async fn present(&self, locator: &Locator) -> Result<Element, AutomationError> {
        self.until(presence_of(self.driver, locator)).await
    }

    pub async fn visible(&self, locator: &Locator) -> Result<Element, AutomationError> {
        self.until(visibility_of(self.driver, locator)).await
    }

    /// Wait until the element is clickable, then click it.
    pub async fn click(&self, locator: &Locator) -> Result<(), AutomationError> {
        let element = self.until(clickable(self.driver, locator)).await?;
        self.driver.click(&element).await
    }

    /// Type into an element that has already been waited for, optionally
    /// clearing it first.
    pub async fn fill(
        &self,
        element: &Element,
        text: &str,
        clear_first: bool,
    ) -> Result<(), AutomationError> {
        if clear_first {
            self.driver.clear(element).await?;
        }
        self.driver.type_text(element, text).await
    }

    pub async fn pause(&self, delay: Duration) -> Result<(), AutomationError> {
        pause(delay, self.cancel).await
    }
}

/// Release the driver whether or not the flow succeeded. A failure to quit
/// is only logged, so it never hides the flow's own result.
pub(crate) async fn with_teardown<F>(driver: &dyn UiDriver, flow: F) -> Result<(), AutomationError>
where
    F: std::future::Future<Output = Result<(), AutomationError>>,
{
    let result = flow.await;
    if let Err(e) = driver.quit().await {
        warn!("Failed to release {} driver: {}", driver.name(), e);
    }
    result
}
