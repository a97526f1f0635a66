use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AutomationError;

/// Strategy used to find an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum By {
    Id,
    Name,
    XPath,
    Css,
    LinkText,
    PartialLinkText,
    TagName,
}

impl By {
    fn prefix(&self) -> &'static str {
        match self {
            By::Id => "id",
            By::Name => "name",
            By::XPath => "xpath",
            By::Css => "css",
            By::LinkText => "link",
            By::PartialLinkText => "partial-link",
            By::TagName => "tag",
        }
    }
}

/// Where to find an element, e.g. `id:username` or `xpath://button[@type='submit']`.
///
/// Strings without a known `strategy:` prefix are taken as CSS selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator {
    strategy: By,
    value: String,
}

impl Locator {
    pub fn new(strategy: By, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(By::Id, value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(By::Css, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(By::XPath, value)
    }

    pub fn strategy(&self) -> By {
        self.strategy
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace every `{name}` in the value with `replacement`.
    pub fn fill(&self, name: &str, replacement: &str) -> Locator {
        Locator {
            strategy: self.strategy,
            value: self.value.replace(&format!("{{{name}}}"), replacement),
        }
    }

    /// The W3C WebDriver `(using, value)` pair for this locator.
    ///
    /// WebDriver has no id or name strategy, so those become attribute CSS
    /// selectors.
    pub fn to_webdriver(&self) -> (&'static str, String) {
        match self.strategy {
            By::Id => ("css selector", format!("[id=\"{}\"]", css_escape(&self.value))),
            By::Name => (
                "css selector",
                format!("[name=\"{}\"]", css_escape(&self.value)),
            ),
            By::Css => ("css selector", self.value.clone()),
            By::XPath => ("xpath", self.value.clone()),
            By::LinkText => ("link text", self.value.clone()),
            By::PartialLinkText => ("partial link text", self.value.clone()),
            By::TagName => ("tag name", self.value.clone()),
        }
    }
}

const CSS_PSEUDO_CLASSES: &[&str] = &[
    "active",
    "checked",
    "default",
    "disabled",
    "empty",
    "enabled",
    "first-child",
    "first-of-type",
    "focus",
    "focus-visible",
    "focus-within",
    "has",
    "hover",
    "indeterminate",
    "invalid",
    "is",
    "last-child",
    "last-of-type",
    "link",
    "not",
    "nth-child",
    "nth-last-child",
    "nth-last-of-type",
    "nth-of-type",
    "only-child",
    "only-of-type",
    "optional",
    "placeholder-shown",
    "read-only",
    "read-write",
    "required",
    "root",
    "target",
    "valid",
    "visited",
    "where",
];

/// Whether the text after `word:` continues a CSS selector rather than
/// naming a locator strategy.
fn is_css_pseudo(rest: &str) -> bool {
    if rest.starts_with(':') {
        return true;
    }
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(rest.len());
    CSS_PSEUDO_CLASSES.contains(&rest[..name_len].to_ascii_lowercase().as_str())
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy.prefix(), self.value)
    }
}

impl FromStr for Locator {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AutomationError::InvalidSelector(
                "locator is empty".to_string(),
            ));
        }

        // bare XPath such as `//div[@id='x']`, which may itself contain ':'
        if s.starts_with('/') || s.starts_with("(/") {
            return Ok(Locator::new(By::XPath, s));
        }

        let (strategy, value) = match s.split_once(':') {
            Some((prefix, rest)) => match prefix.to_lowercase().as_str() {
                "id" => (By::Id, rest),
                "name" => (By::Name, rest),
                "xpath" => (By::XPath, rest),
                "css" => (By::Css, rest),
                "link" | "link-text" => (By::LinkText, rest),
                "partial-link" => (By::PartialLinkText, rest),
                "tag" => (By::TagName, rest),
                // `#menu a:hover`, `li.item:first-child`
                _ if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => (By::Css, s),
                // `a:hover`, `input::placeholder`
                _ if is_css_pseudo(rest) => (By::Css, s),
                _ => {
                    return Err(AutomationError::InvalidSelector(format!(
                        "unknown locator strategy '{prefix}' in '{s}'"
                    )))
                }
            },
            None => (By::Css, s),
        };

        let value = value.trim();
        if value.is_empty() {
            return Err(AutomationError::InvalidSelector(format!(
                "locator '{s}' has no value"
            )));
        }

        Ok(Locator::new(strategy, value))
    }
}

impl TryFrom<String> for Locator {
    type Error = AutomationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}
