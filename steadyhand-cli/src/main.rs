//! Steadyhand CLI
//!
//! Runs one automation flow from a YAML or JSON config file.
//!
//! Usage:
//!   steadyhand groupware --config groupware.yaml
//!   steadyhand product-update --config product.yaml --headless
//!   steadyhand review --config review.yaml --dry-run
//!   steadyhand file-picker

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use steadyhand::config::{
    self, FilePickerConfig, FlowConfig, GroupwareConfig, ProductUpdateConfig, ReviewConfig,
};
use steadyhand::flows::{file_picker, groupware, product_update, review};
use steadyhand::webdriver::DEFAULT_WEBDRIVER_URL;
use steadyhand::{Browser, BrowserOptions, WebDriverClient, XdotoolKeyboard};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "steadyhand")]
#[command(about = "Bounded-wait browser and desktop automation flows")]
struct Cli {
    #[command(subcommand)]
    flow: Flow,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Flow configuration file (.yaml, .yml or .json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Validate the config and print it without launching anything
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct BrowserArgs {
    /// WebDriver server (chromedriver or geckodriver)
    #[arg(long, env = "STEADYHAND_WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL)]
    webdriver_url: String,

    /// Browser to request from the WebDriver server: chrome or firefox
    #[arg(long, default_value = "chrome")]
    browser: Browser,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Extra browser command-line arguments
    #[arg(long = "browser-arg", value_name = "ARG")]
    browser_args: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Flow {
    /// Log into a groupware portal and click through its menus
    Groupware(BrowserArgs),
    /// Log into a shop admin and update a product's description and price
    ProductUpdate(BrowserArgs),
    /// Open a document and keep it on screen for review
    Review(BrowserArgs),
    /// Pick a file in a desktop media player with keyboard shortcuts
    FilePicker,
}

fn init_logging() {
    let log_level = env::var("LOG_LEVEL")
        .map(|level| match level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// Cancel `token` on the first Ctrl+C so the running wait or pause returns
/// and the driver is still released.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, stopping the flow");
            token.cancel();
        }
    });
}

fn required_config(path: Option<&Path>, flow: &str) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => bail!("the {flow} flow needs a config file: pass --config <file>"),
    }
}

fn load_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    config::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Refuse to start while template values remain, listing what to fill in.
fn check_config<T: FlowConfig>(config: &T) -> Result<()> {
    let placeholders = config.placeholders();
    if !placeholders.is_empty() {
        eprintln!("============================================================");
        eprintln!("The configuration still contains placeholder values.");
        eprintln!("Fill in these fields before running:");
        for field in &placeholders {
            eprintln!("  - {field}");
        }
        eprintln!("============================================================");
        bail!("{} placeholder value(s) left in the config", placeholders.len());
    }
    config.validate().context("Invalid configuration")
}

fn print_config<T: Serialize>(config: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to render config")?;
    println!("{yaml}");
    Ok(())
}

async fn start_browser(args: &BrowserArgs) -> Result<WebDriverClient> {
    let options = BrowserOptions {
        browser: args.browser,
        headless: args.headless,
        args: args.browser_args.clone(),
    };
    WebDriverClient::connect(&args.webdriver_url, &options)
        .await
        .with_context(|| format!("Failed to start a browser session at {}", args.webdriver_url))
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let common = &cli.common;
    match &cli.flow {
        Flow::Groupware(browser) => {
            let path = required_config(common.config.as_deref(), "groupware")?;
            let mut config: GroupwareConfig = load_config(&path)?;
            config.credentials.override_from_env();
            check_config(&config)?;
            if common.dry_run {
                return print_config(&config);
            }
            let driver = start_browser(browser).await?;
            groupware::run(&driver, &config, &cancel)
                .await
                .context("Groupware flow failed")
        }
        Flow::ProductUpdate(browser) => {
            let path = required_config(common.config.as_deref(), "product-update")?;
            let mut config: ProductUpdateConfig = load_config(&path)?;
            config.credentials.override_from_env();
            check_config(&config)?;
            if common.dry_run {
                return print_config(&config);
            }
            let driver = start_browser(browser).await?;
            product_update::run(&driver, &config, &cancel)
                .await
                .context("Product update flow failed")
        }
        Flow::Review(browser) => {
            let path = required_config(common.config.as_deref(), "review")?;
            let config: ReviewConfig = load_config(&path)?;
            check_config(&config)?;
            if common.dry_run {
                return print_config(&config);
            }
            let driver = start_browser(browser).await?;
            review::run(&driver, &config, &cancel)
                .await
                .context("Review flow failed")
        }
        Flow::FilePicker => {
            let config: FilePickerConfig = match &common.config {
                Some(path) => load_config(path)?,
                None => FilePickerConfig::default(),
            };
            check_config(&config)?;
            if common.dry_run {
                return print_config(&config);
            }
            let driver = XdotoolKeyboard::new();
            file_picker::run(&driver, &config, &cancel)
                .await
                .context("File picker flow failed")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; credentials may come from the config file.
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    info!("Starting {:?} flow", cli.flow);

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    run(cli, cancel).await.inspect_err(|e| error!("{:#}", e))?;
    info!("Flow completed successfully");
    Ok(())
}
