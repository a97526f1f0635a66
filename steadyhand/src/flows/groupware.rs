//! Log into a groupware portal and click through its menus.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::{with_teardown, FlowContext, PAGE_SETTLE, TYPING_PAUSE};
use crate::config::{FlowConfig, GroupwareConfig};
use crate::driver::UiDriver;
use crate::errors::AutomationError;
use crate::step::run_step;

#[instrument(skip_all, fields(url = %config.url))]
pub async fn run(
    driver: &dyn UiDriver,
    config: &GroupwareConfig,
    cancel: &CancellationToken,
) -> Result<(), AutomationError> {
    let wait = config.wait_config()?;
    let ctx = FlowContext::new(driver, wait, cancel);
    with_teardown(driver, async {
        login(&ctx, config).await?;
        navigate_menus(&ctx, config).await?;
        info!(
            "Groupware session complete; keeping the browser open for {:?}",
            config.observe
        );
        ctx.pause(config.observe).await
    })
    .await
}

async fn login(ctx: &FlowContext<'_>, config: &GroupwareConfig) -> Result<(), AutomationError> {
    let locators = &config.locators;

    run_step("Navigating to login page", ctx.driver.navigate(&config.url)).await?;

    run_step("Entering username", async {
        let field = ctx.present(&locators.username).await?;
        ctx.fill(&field, &config.credentials.username, false).await
    })
    .await?;
    ctx.pause(TYPING_PAUSE).await?;

    run_step("Entering password", async {
        let field = ctx.present(&locators.password).await?;
        ctx.fill(&field, &config.credentials.password, false).await
    })
    .await?;
    ctx.pause(TYPING_PAUSE).await?;

    run_step("Clicking login button", ctx.click(&locators.login_button)).await?;
    run_step("Waiting for post-login page", ctx.present(&locators.post_login)).await?;
    info!("Login successful");
    Ok(())
}

async fn navigate_menus(
    ctx: &FlowContext<'_>,
    config: &GroupwareConfig,
) -> Result<(), AutomationError> {
    for (i, item) in config.menu.iter().enumerate() {
        run_step(&format!("Clicking menu item {} ({})", i + 1, item.locator), async {
            ctx.click(&item.locator).await?;
            match &item.ready {
                Some(ready) => ctx.present(ready).await.map(|_| ()),
                None => ctx.pause(PAGE_SETTLE).await,
            }
        })
        .await?;
    }
    if !config.menu.is_empty() {
        info!("Menu navigation finished");
    }
    Ok(())
}
