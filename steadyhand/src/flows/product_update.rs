//! Log into a shop admin console, open a product and overwrite its
//! description and price.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::{with_teardown, FlowContext, SAVE_SETTLE, TYPING_PAUSE};
use crate::condition::frame_available;
use crate::config::{FlowConfig, ProductUpdateConfig};
use crate::driver::UiDriver;
use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::step::{optional_step, run_step};

#[instrument(skip_all, fields(url = %config.url, product = %config.product.identifier))]
pub async fn run(
    driver: &dyn UiDriver,
    config: &ProductUpdateConfig,
    cancel: &CancellationToken,
) -> Result<(), AutomationError> {
    let wait = config.wait_config()?;
    let ctx = FlowContext::new(driver, wait, cancel);
    with_teardown(driver, async {
        login(&ctx, config).await?;
        open_product_list(&ctx, config).await?;
        open_product(&ctx, config).await?;
        update_fields(&ctx, config).await?;
        save(&ctx, config).await?;
        info!(
            "Product update complete; keeping the browser open for {:?}",
            config.observe
        );
        ctx.pause(config.observe).await
    })
    .await
}

async fn switch_to_frame(ctx: &FlowContext<'_>, frame: &Locator) -> Result<(), AutomationError> {
    ctx.until(frame_available(ctx.driver, frame)).await
}

async fn login(ctx: &FlowContext<'_>, config: &ProductUpdateConfig) -> Result<(), AutomationError> {
    let locators = &config.locators;

    run_step("Navigating to admin login", ctx.driver.navigate(&config.url)).await?;

    // Some admin pages render the form inline; carry on in the top document
    // when the frame never shows up.
    if let Some(frame) = &locators.login_frame {
        optional_step("Switching to login frame", switch_to_frame(ctx, frame)).await?;
    }

    run_step("Entering username", async {
        let field = ctx.visible(&locators.username).await?;
        ctx.fill(&field, &config.credentials.username, true).await
    })
    .await?;
    ctx.pause(TYPING_PAUSE).await?;

    run_step("Entering password", async {
        let field = ctx.visible(&locators.password).await?;
        ctx.fill(&field, &config.credentials.password, true).await
    })
    .await?;
    ctx.pause(TYPING_PAUSE).await?;

    run_step("Clicking login button", ctx.click(&locators.login_button)).await?;
    run_step("Waiting for dashboard", ctx.visible(&locators.products_menu)).await?;
    info!("Login successful");
    Ok(())
}

async fn open_product_list(
    ctx: &FlowContext<'_>,
    config: &ProductUpdateConfig,
) -> Result<(), AutomationError> {
    let locators = &config.locators;

    run_step("Switching to default content", ctx.driver.switch_to_default()).await?;
    run_step("Opening products menu", ctx.click(&locators.products_menu)).await?;
    run_step("Opening product list", ctx.click(&locators.product_list)).await?;
    run_step(
        "Waiting for product list page",
        ctx.visible(&Locator::new(crate::locator::By::TagName, "body")),
    )
    .await?;
    Ok(())
}

async fn open_product(
    ctx: &FlowContext<'_>,
    config: &ProductUpdateConfig,
) -> Result<(), AutomationError> {
    let locators = &config.locators;
    let edit_button = locators
        .edit_button
        .fill("product", &config.product.identifier);

    run_step(
        &format!("Opening product '{}'", config.product.identifier),
        ctx.click(&edit_button),
    )
    .await?;

    if let Some(frame) = &locators.edit_frame {
        run_step("Switching to edit frame", switch_to_frame(ctx, frame)).await?;
    }
    Ok(())
}

async fn update_fields(
    ctx: &FlowContext<'_>,
    config: &ProductUpdateConfig,
) -> Result<(), AutomationError> {
    let locators = &config.locators;
    let product = &config.product;

    run_step("Updating description", async {
        let field = ctx.visible(&locators.description).await?;
        ctx.fill(&field, &product.description, true).await
    })
    .await?;
    ctx.pause(TYPING_PAUSE).await?;

    run_step(&format!("Updating price to {}", product.price), async {
        let field = ctx.visible(&locators.price).await?;
        ctx.fill(&field, &product.price, true).await
    })
    .await?;
    ctx.pause(TYPING_PAUSE).await?;
    Ok(())
}

async fn save(ctx: &FlowContext<'_>, config: &ProductUpdateConfig) -> Result<(), AutomationError> {
    let locators = &config.locators;

    run_step("Saving product", ctx.click(&locators.save)).await?;
    match &locators.saved {
        Some(saved) => {
            run_step("Waiting for save confirmation", ctx.visible(saved)).await?;
            info!("Changes saved");
        }
        None => {
            ctx.pause(SAVE_SETTLE).await?;
            info!("Save clicked; no confirmation marker configured");
        }
    }
    Ok(())
}
