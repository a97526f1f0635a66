//! Per-flow configuration.
//!
//! Every flow receives its URL, credentials, locators and timeouts as one
//! explicit value, loaded from a YAML or JSON file. Durations are written in
//! human form (`"10s"`, `"500ms"`, `"1.5m"`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::waiter::{WaitConfig, DEFAULT_POLL_INTERVAL};

pub const USERNAME_ENV: &str = "STEADYHAND_USERNAME";
pub const PASSWORD_ENV: &str = "STEADYHAND_PASSWORD";

/// Parse human-readable duration strings into milliseconds.
/// Supports formats like: "1s", "500ms", "2m", "1.5s", "30", "2h"
pub fn parse_duration(input: &str) -> anyhow::Result<u64> {
    use anyhow::anyhow;

    let input = input.trim();

    // Plain numbers are milliseconds
    if let Ok(ms) = input.parse::<u64>() {
        return Ok(ms);
    }

    let (number_part, unit_part) = split_number_and_unit(input)?;
    let value: f64 = number_part
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid number in duration: {}", number_part))?;
    if value < 0.0 || !value.is_finite() {
        return Err(anyhow!("Duration must be a non-negative number: {}", input));
    }

    let multiplier = match unit_part.trim() {
        "ms" | "milliseconds" | "millisecond" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => 1000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "" => 1.0,
        other => return Err(anyhow!("Unknown time unit: {}", other)),
    };

    Ok((value * multiplier) as u64)
}

fn split_number_and_unit(input: &str) -> anyhow::Result<(&str, &str)> {
    let split_pos = input
        .char_indices()
        .find(|(_, ch)| ch.is_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(input.len());

    let number_part = &input[..split_pos];
    let unit_part = &input[split_pos..];

    if number_part.trim().is_empty() {
        return Err(anyhow::anyhow!("No numeric value in duration: {}", input));
    }

    Ok((number_part, unit_part))
}

/// serde adapter for `Duration` fields written as strings or bare milliseconds.
pub mod duration {
    use super::parse_duration;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}ms", value.as_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Ok(Duration::from_millis(ms)),
            Raw::Text(text) => parse_duration(&text)
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Load a config file, choosing the format from the extension (`.json` is
/// JSON, anything else YAML).
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, AutomationError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AutomationError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&text)
            .map_err(|e| AutomationError::InvalidConfig(format!("{}: {e}", path.display())))
    } else {
        serde_yaml::from_str(&text)
            .map_err(|e| AutomationError::InvalidConfig(format!("{}: {e}", path.display())))
    }
}

/// Checks shared by every flow config.
pub trait FlowConfig {
    /// Names of fields still holding template placeholders.
    fn placeholders(&self) -> Vec<String>;

    /// The timeouts every wait in the flow uses.
    fn wait_config(&self) -> Result<WaitConfig, AutomationError>;

    /// Fail if placeholders remain or the timeouts are inconsistent.
    fn validate(&self) -> Result<(), AutomationError> {
        let placeholders = self.placeholders();
        if !placeholders.is_empty() {
            return Err(AutomationError::InvalidConfig(format!(
                "placeholder values must be customized: {}",
                placeholders.join(", ")
            )));
        }
        self.wait_config().map(|_| ())
    }
}

fn is_placeholder(value: &str) -> bool {
    value.trim().is_empty() || value.contains("YOUR_") || value.starts_with("placeholder_")
}

fn check(found: &mut Vec<String>, field: &str, value: &str) {
    if is_placeholder(value) {
        found.push(field.to_string());
    }
}

/// Locator markers can sit anywhere in the value, e.g. inside an XPath
/// predicate.
fn check_locator(found: &mut Vec<String>, field: &str, locator: &Locator) {
    let value = locator.value();
    if value.contains("placeholder_") || value.contains("YOUR_") {
        found.push(field.to_string());
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Let `STEADYHAND_USERNAME` / `STEADYHAND_PASSWORD` take precedence over
    /// the file.
    pub fn override_from_env(&mut self) {
        if let Ok(username) = std::env::var(USERNAME_ENV) {
            self.username = username;
        }
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            self.password = password;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    /// Upper bound for every individual wait.
    #[serde(with = "duration", default = "default_wait")]
    pub wait: Duration,
    #[serde(with = "duration", default = "default_poll_interval")]
    pub poll_interval: Duration,
}

fn default_wait() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            wait: default_wait(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl Timeouts {
    pub fn wait_config(&self) -> Result<WaitConfig, AutomationError> {
        WaitConfig::new(self.wait, self.poll_interval)
            .map_err(|e| AutomationError::InvalidConfig(format!("timeouts: {e}")))
    }
}

fn default_observe() -> Duration {
    Duration::from_secs(5)
}

// ============== GROUPWARE ==============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupwareLocators {
    pub username: Locator,
    pub password: Locator,
    pub login_button: Locator,
    /// Something only visible once logged in.
    pub post_login: Locator,
}

/// A menu entry to click after logging in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuItem {
    pub locator: Locator,
    /// Element that shows the page behind the entry has loaded. Without one
    /// the flow falls back to a fixed settle delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<Locator>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupwareConfig {
    pub url: String,
    pub credentials: Credentials,
    pub locators: GroupwareLocators,
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    /// How long to keep the browser open at the end.
    #[serde(with = "duration", default = "default_observe")]
    pub observe: Duration,
    #[serde(default)]
    pub timeouts: Timeouts,
}

impl FlowConfig for GroupwareConfig {
    fn placeholders(&self) -> Vec<String> {
        let mut found = Vec::new();
        check(&mut found, "url", &self.url);
        check(&mut found, "credentials.username", &self.credentials.username);
        check(&mut found, "credentials.password", &self.credentials.password);
        check_locator(&mut found, "locators.username", &self.locators.username);
        check_locator(&mut found, "locators.password", &self.locators.password);
        check_locator(&mut found, "locators.login_button", &self.locators.login_button);
        check_locator(&mut found, "locators.post_login", &self.locators.post_login);
        for (i, item) in self.menu.iter().enumerate() {
            check_locator(&mut found, &format!("menu[{i}].locator"), &item.locator);
        }
        found
    }

    fn wait_config(&self) -> Result<WaitConfig, AutomationError> {
        self.timeouts.wait_config()
    }
}

// ============== PRODUCT UPDATE ==============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductLocators {
    /// Frame holding the login form, when the admin page uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_frame: Option<Locator>,
    pub username: Locator,
    pub password: Locator,
    pub login_button: Locator,
    pub products_menu: Locator,
    pub product_list: Locator,
    /// Edit link for the product; `{product}` is replaced with the identifier.
    pub edit_button: Locator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_frame: Option<Locator>,
    pub description: Locator,
    pub price: Locator,
    pub save: Locator,
    /// Confirmation shown after saving. Without one the flow falls back to a
    /// fixed settle delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved: Option<Locator>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductEdit {
    /// Name or code used to find the product in the list.
    pub identifier: String,
    pub description: String,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdateConfig {
    pub url: String,
    pub credentials: Credentials,
    pub product: ProductEdit,
    pub locators: ProductLocators,
    #[serde(with = "duration", default = "default_product_observe")]
    pub observe: Duration,
    #[serde(default = "default_product_timeouts")]
    pub timeouts: Timeouts,
}

fn default_product_observe() -> Duration {
    Duration::from_secs(10)
}

fn default_product_timeouts() -> Timeouts {
    Timeouts {
        wait: Duration::from_secs(15),
        ..Timeouts::default()
    }
}

impl FlowConfig for ProductUpdateConfig {
    fn placeholders(&self) -> Vec<String> {
        let mut found = Vec::new();
        check(&mut found, "url", &self.url);
        check(&mut found, "credentials.username", &self.credentials.username);
        check(&mut found, "credentials.password", &self.credentials.password);
        check(&mut found, "product.identifier", &self.product.identifier);
        let l = &self.locators;
        check_locator(&mut found, "locators.username", &l.username);
        check_locator(&mut found, "locators.password", &l.password);
        check_locator(&mut found, "locators.login_button", &l.login_button);
        check_locator(&mut found, "locators.products_menu", &l.products_menu);
        check_locator(&mut found, "locators.product_list", &l.product_list);
        check_locator(&mut found, "locators.edit_button", &l.edit_button);
        check_locator(&mut found, "locators.description", &l.description);
        check_locator(&mut found, "locators.price", &l.price);
        check_locator(&mut found, "locators.save", &l.save);
        found
    }

    fn wait_config(&self) -> Result<WaitConfig, AutomationError> {
        self.timeouts.wait_config()
    }
}

// ============== REVIEW ==============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewConfig {
    pub url: String,
    /// How long the document stays open once loaded.
    #[serde(with = "duration", default = "default_review")]
    pub review: Duration,
    #[serde(default)]
    pub timeouts: Timeouts,
}

fn default_review() -> Duration {
    Duration::from_secs(10)
}

impl FlowConfig for ReviewConfig {
    fn placeholders(&self) -> Vec<String> {
        let mut found = Vec::new();
        check(&mut found, "url", &self.url);
        found
    }

    fn wait_config(&self) -> Result<WaitConfig, AutomationError> {
        self.timeouts.wait_config()
    }
}

// ============== FILE PICKER ==============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilePickerConfig {
    /// Shortcut that opens the player's file dialog.
    #[serde(default = "default_open_hotkey")]
    pub open_hotkey: String,
    /// Number of Down presses to reach the file.
    #[serde(default = "default_presses")]
    pub presses: u32,
}

fn default_open_hotkey() -> String {
    "ctrl+o".to_string()
}

fn default_presses() -> u32 {
    3
}

impl Default for FilePickerConfig {
    fn default() -> Self {
        Self {
            open_hotkey: default_open_hotkey(),
            presses: default_presses(),
        }
    }
}

impl FlowConfig for FilePickerConfig {
    fn placeholders(&self) -> Vec<String> {
        Vec::new()
    }

    fn wait_config(&self) -> Result<WaitConfig, AutomationError> {
        Timeouts::default().wait_config()
    }

    fn validate(&self) -> Result<(), AutomationError> {
        crate::keyboard::parse_hotkey(&self.open_hotkey)
            .map(|_| ())
            .map_err(|e| AutomationError::InvalidConfig(format!("open_hotkey: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_duration_milliseconds() {
        assert_eq!(parse_duration("500").unwrap(), 500);
        assert_eq!(parse_duration("1000ms").unwrap(), 1000);
        assert_eq!(parse_duration("250milliseconds").unwrap(), 250);
    }

    #[test]
    fn test_parse_duration_seconds_and_minutes() {
        assert_eq!(parse_duration("1s").unwrap(), 1000);
        assert_eq!(parse_duration("2.5s").unwrap(), 2500);
        assert_eq!(parse_duration("0.5 minutes").unwrap(), 30000);
        assert_eq!(parse_duration("1h").unwrap(), 3600000);
    }

    #[test]
    fn test_parse_duration_errors() {
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("").is_err());
    }

    const GROUPWARE_YAML: &str = r#"
url: https://groupware.example.com/login
credentials:
  username: alice
  password: hunter2
locators:
  username: id:user
  password: id:pass
  login_button: "xpath://button[text()='Login']"
  post_login: link:Dashboard
menu:
  - locator: link:Dashboard
    ready: css:#dashboard
  - locator: "xpath://a[@href='/some/internal/page']"
observe: 2s
timeouts:
  wait: 10s
  poll_interval: 250ms
"#;

    #[test]
    fn test_groupware_yaml() {
        let config: GroupwareConfig = serde_yaml::from_str(GROUPWARE_YAML).unwrap();
        assert_eq!(config.menu.len(), 2);
        assert!(config.menu[1].ready.is_none());
        assert_eq!(config.observe, Duration::from_secs(2));
        assert_eq!(config.timeouts.poll_interval, Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_placeholders_are_reported() {
        let yaml = GROUPWARE_YAML
            .replace("https://groupware.example.com/login", "YOUR_GROUPWARE_LOGIN_URL_HERE")
            .replace("id:pass", "id:placeholder_password");
        let config: GroupwareConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            config.placeholders(),
            vec!["url".to_string(), "locators.password".to_string()]
        );
        match config.validate() {
            Err(AutomationError::InvalidConfig(msg)) => assert!(msg.contains("url")),
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_placeholders_inside_locator_values() {
        let yaml = GROUPWARE_YAML
            .replace("//a[@href='/some/internal/page']", "//a[contains(@href, 'placeholder_page')]")
            .replace("id:user", "css:input[name='YOUR_FIELD']");
        let config: GroupwareConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            config.placeholders(),
            vec!["locators.username".to_string(), "menu[1].locator".to_string()]
        );
    }

    #[test]
    fn test_inconsistent_timeouts_rejected() {
        let yaml = GROUPWARE_YAML.replace("poll_interval: 250ms", "poll_interval: 20s");
        let config: GroupwareConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(AutomationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = format!("{GROUPWARE_YAML}\nheadles: true\n");
        assert!(serde_yaml::from_str::<GroupwareConfig>(&yaml).is_err());
    }

    #[test]
    fn test_product_defaults() {
        let json = r#"{
            "url": "https://shop.example.com/admin/",
            "credentials": {"username": "admin", "password": "pw"},
            "product": {"identifier": "Sample Mug", "description": "New text", "price": "12345"},
            "locators": {
                "username": "id:mall_id",
                "password": "id:userpasswd",
                "login_button": "xpath://button[@type='submit']",
                "products_menu": "xpath://a[contains(text(),'Products')]",
                "product_list": "xpath://a[contains(text(),'Product List')]",
                "edit_button": "xpath://td[contains(text(),'{product}')]/following-sibling::td/a",
                "description": "name:product_description",
                "price": "id:price",
                "save": "css:#save"
            }
        }"#;
        let config: ProductUpdateConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeouts.wait, Duration::from_secs(15));
        assert_eq!(config.observe, Duration::from_secs(10));
        assert!(config.locators.login_frame.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_by_extension() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(yaml, "url: https://docs.example.com/guide\nreview: 3s\n").unwrap();
        let config: ReviewConfig = load(yaml.path()).unwrap();
        assert_eq!(config.review, Duration::from_secs(3));

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"url": "https://docs.example.com/guide", "review": 1500}}"#).unwrap();
        let config: ReviewConfig = load(json.path()).unwrap();
        assert_eq!(config.review, Duration::from_millis(1500));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load::<ReviewConfig>(Path::new("/nonexistent/steadyhand.yaml")).unwrap_err();
        assert!(matches!(err, AutomationError::InvalidConfig(_)));
    }

    #[test]
    fn test_password_not_serialized_or_printed() {
        let creds = Credentials {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!serde_json::to_string(&creds).unwrap().contains("hunter2"));
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_file_picker_hotkey_validation() {
        let config = FilePickerConfig {
            open_hotkey: "ctrl+hyper".to_string(),
            presses: 3,
        };
        assert!(config.validate().is_err());
        assert!(FilePickerConfig::default().validate().is_ok());
    }
}
