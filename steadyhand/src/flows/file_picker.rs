//! Pick a file in a desktop media player with the keyboard alone: open the
//! file dialog, walk down the list, confirm.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::{with_teardown, FlowContext, DIALOG_SETTLE, KEY_PAUSE, LOAD_SETTLE, STARTUP_GRACE};
use crate::config::{FilePickerConfig, FlowConfig};
use crate::driver::UiDriver;
use crate::errors::AutomationError;
use crate::keyboard::{parse_hotkey, Key};
use crate::step::run_step;

#[instrument(skip_all, fields(presses = config.presses))]
pub async fn run(
    driver: &dyn UiDriver,
    config: &FilePickerConfig,
    cancel: &CancellationToken,
) -> Result<(), AutomationError> {
    config.validate()?;
    let open = parse_hotkey(&config.open_hotkey)?;
    let ctx = FlowContext::new(driver, config.wait_config()?, cancel);

    with_teardown(driver, async {
        info!("Focus the media player window now; starting in {:?}", STARTUP_GRACE);
        ctx.pause(STARTUP_GRACE).await?;

        run_step(
            &format!("Opening file dialog ({})", config.open_hotkey),
            driver.hotkey(&open),
        )
        .await?;
        ctx.pause(DIALOG_SETTLE).await?;

        run_step(&format!("Moving down {} entries", config.presses), async {
            for _ in 0..config.presses {
                driver.press_key(Key::Down).await?;
                ctx.pause(KEY_PAUSE).await?;
            }
            Ok(())
        })
        .await?;

        run_step("Selecting the file", driver.press_key(Key::Enter)).await?;
        ctx.pause(LOAD_SETTLE).await?;
        info!("File selection finished");
        Ok(())
    })
    .await
}
