//! W3C WebDriver backend.
//!
//! Talks plain HTTP + JSON to a running chromedriver or geckodriver. One
//! [`WebDriverClient`] owns exactly one browser session.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

use crate::driver::{Element, UiDriver};
use crate::errors::AutomationError;
use crate::keyboard::Key;
use crate::locator::Locator;

/// Key under which W3C drivers return element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

impl std::str::FromStr for Browser {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            _ => Err(AutomationError::InvalidArgument(format!(
                "unsupported browser: {s}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    pub browser: Browser,
    pub headless: bool,
    /// Extra command-line arguments for the browser.
    pub args: Vec<String>,
}

impl BrowserOptions {
    /// The `capabilities` body for `POST /session`.
    pub fn capabilities(&self) -> Value {
        let mut args = self.args.clone();
        match self.browser {
            Browser::Chrome => {
                if self.headless {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                }
                json!({
                    "capabilities": {
                        "alwaysMatch": {
                            "browserName": "chrome",
                            "goog:chromeOptions": { "args": args }
                        }
                    }
                })
            }
            Browser::Firefox => {
                if self.headless {
                    args.push("--headless".to_string());
                }
                json!({
                    "capabilities": {
                        "alwaysMatch": {
                            "browserName": "firefox",
                            "moz:firefoxOptions": { "args": args }
                        }
                    }
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// Map a W3C error code to an [`AutomationError`].
pub fn map_wire_error(code: &str, message: &str) -> AutomationError {
    let detail = if message.is_empty() {
        code.to_string()
    } else {
        message.to_string()
    };
    match code {
        "no such element" => AutomationError::ElementNotFound(detail),
        "stale element reference" => AutomationError::ElementDetached(detail),
        "element not interactable" | "element click intercepted" => {
            AutomationError::ElementNotEnabled(detail)
        }
        "no such frame" => AutomationError::NoSuchFrame(detail),
        "invalid selector" => AutomationError::InvalidSelector(detail),
        "invalid argument" => AutomationError::InvalidArgument(detail),
        "timeout" | "script timeout" => AutomationError::Timeout(detail),
        _ => AutomationError::PlatformError(format!("{code}: {detail}")),
    }
}

/// A WebDriver session.
#[derive(Debug)]
pub struct WebDriverClient {
    base_url: String,
    session_id: String,
    http: reqwest::Client,
    closed: AtomicBool,
}

impl WebDriverClient {
    /// Start a new browser session on the WebDriver server at `server_url`.
    #[instrument(skip(options))]
    pub async fn connect(
        server_url: &str,
        options: &BrowserOptions,
    ) -> Result<Self, AutomationError> {
        let base_url = server_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();

        info!("Connecting to {:?} WebDriver at {}", options.browser, base_url);
        let value = send(
            http.post(format!("{base_url}/session"))
                .json(&options.capabilities()),
        )
        .await
        .map_err(|e| match e {
            AutomationError::PlatformError(msg) => AutomationError::PlatformError(format!(
                "Could not start a session at {base_url} (is chromedriver/geckodriver running?): {msg}"
            )),
            other => other,
        })?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AutomationError::PlatformError(format!(
                    "New session response has no sessionId: {value}"
                ))
            })?
            .to_string();

        debug!("WebDriver session {} started", session_id);
        Ok(Self {
            base_url,
            session_id,
            http,
            closed: AtomicBool::new(false),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    async fn get(&self, path: &str) -> Result<Value, AutomationError> {
        send(self.http.get(self.url(path))).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, AutomationError> {
        send(self.http.post(self.url(path)).json(&body)).await
    }

    fn element_path(element: &Element, suffix: &str) -> String {
        format!("/element/{}/{}", element.id(), suffix)
    }

    async fn key_actions(&self, actions: Vec<Value>) -> Result<(), AutomationError> {
        self.post(
            "/actions",
            json!({
                "actions": [{ "type": "key", "id": "keyboard", "actions": actions }]
            }),
        )
        .await?;
        Ok(())
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<Value, AutomationError> {
    let response = request
        .send()
        .await
        .map_err(|e| AutomationError::PlatformError(format!("WebDriver request failed: {e}")))?;
    let status = response.status();
    let body: WireResponse = response.json().await.map_err(|e| {
        AutomationError::PlatformError(format!(
            "Failed to parse WebDriver response ({status}): {e}"
        ))
    })?;

    if !status.is_success() {
        return Err(match serde_json::from_value::<WireError>(body.value.clone()) {
            Ok(err) => map_wire_error(&err.error, &err.message),
            Err(_) => AutomationError::PlatformError(format!(
                "WebDriver returned {status}: {}",
                body.value
            )),
        });
    }
    Ok(body.value)
}

fn element_from(value: &Value) -> Result<Element, AutomationError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(Element::new)
        .ok_or_else(|| {
            AutomationError::PlatformError(format!("Response is not an element reference: {value}"))
        })
}

fn as_bool(value: Value) -> Result<bool, AutomationError> {
    value
        .as_bool()
        .ok_or_else(|| AutomationError::PlatformError(format!("Expected a boolean, got {value}")))
}

fn as_string(value: Value) -> Result<String, AutomationError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(AutomationError::PlatformError(format!(
            "Expected a string, got {other}"
        ))),
    }
}

#[async_trait::async_trait]
impl UiDriver for WebDriverClient {
    fn name(&self) -> &str {
        "webdriver"
    }

    #[instrument(level = "debug", skip(self))]
    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        self.post("/url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, AutomationError> {
        as_string(self.get("/url").await?)
    }

    #[instrument(level = "debug", skip(self), fields(locator = %locator))]
    async fn find(&self, locator: &Locator) -> Result<Option<Element>, AutomationError> {
        let (using, value) = locator.to_webdriver();
        match self
            .post("/element", json!({ "using": using, "value": value }))
            .await
        {
            Ok(found) => element_from(&found).map(Some),
            Err(AutomationError::ElementNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool, AutomationError> {
        as_bool(self.get(&Self::element_path(element, "displayed")).await?)
    }

    async fn is_enabled(&self, element: &Element) -> Result<bool, AutomationError> {
        as_bool(self.get(&Self::element_path(element, "enabled")).await?)
    }

    async fn text(&self, element: &Element) -> Result<String, AutomationError> {
        as_string(self.get(&Self::element_path(element, "text")).await?)
    }

    async fn execute_script(&self, script: &str) -> Result<Value, AutomationError> {
        self.post("/execute/sync", json!({ "script": script, "args": [] }))
            .await
    }

    #[instrument(level = "debug", skip(self, text), fields(element = element.id()))]
    async fn type_text(&self, element: &Element, text: &str) -> Result<(), AutomationError> {
        self.post(&Self::element_path(element, "value"), json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &Element) -> Result<(), AutomationError> {
        self.post(&Self::element_path(element, "clear"), json!({}))
            .await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(element = element.id()))]
    async fn click(&self, element: &Element) -> Result<(), AutomationError> {
        self.post(&Self::element_path(element, "click"), json!({}))
            .await?;
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<(), AutomationError> {
        let value = key.webdriver_value();
        self.key_actions(vec![
            json!({ "type": "keyDown", "value": value }),
            json!({ "type": "keyUp", "value": value }),
        ])
        .await
    }

    async fn hotkey(&self, keys: &[Key]) -> Result<(), AutomationError> {
        let mut actions: Vec<Value> = keys
            .iter()
            .map(|k| json!({ "type": "keyDown", "value": k.webdriver_value() }))
            .collect();
        actions.extend(
            keys.iter()
                .rev()
                .map(|k| json!({ "type": "keyUp", "value": k.webdriver_value() })),
        );
        self.key_actions(actions).await
    }

    async fn switch_to_frame(&self, frame: &Element) -> Result<(), AutomationError> {
        self.post("/frame", json!({ "id": { ELEMENT_KEY: frame.id() } }))
            .await?;
        Ok(())
    }

    async fn switch_to_default(&self) -> Result<(), AutomationError> {
        self.post("/frame", json!({ "id": null })).await?;
        Ok(())
    }

    async fn quit(&self) -> Result<(), AutomationError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Closing WebDriver session {}", self.session_id);
        send(
            self.http
                .delete(format!("{}/session/{}", self.base_url, self.session_id)),
        )
        .await
        .inspect_err(|e| warn!("Failed to close session {}: {}", self.session_id, e))?;
        Ok(())
    }
}
