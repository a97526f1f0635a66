//! The UI driving capability flows and conditions are written against.
//!
//! Backends implement the operations they can support; the rest fall back to
//! [`AutomationError::UnsupportedOperation`].

use serde::{Deserialize, Serialize};

use crate::errors::AutomationError;
use crate::keyboard::Key;
use crate::locator::Locator;

/// Opaque handle to an element located by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    id: String,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

fn unsupported<T>(operation: &str) -> Result<T, AutomationError> {
    Err(AutomationError::UnsupportedOperation(format!(
        "{operation} is not supported by this driver"
    )))
}

#[async_trait::async_trait]
pub trait UiDriver: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    // ============== NAVIGATION ==============

    async fn navigate(&self, _url: &str) -> Result<(), AutomationError> {
        unsupported("navigate")
    }

    async fn current_url(&self) -> Result<String, AutomationError> {
        unsupported("current_url")
    }

    // ============== QUERIES (never block) ==============

    /// Look the element up once. `Ok(None)` when it is not there right now.
    async fn find(&self, _locator: &Locator) -> Result<Option<Element>, AutomationError> {
        unsupported("find")
    }

    async fn is_displayed(&self, _element: &Element) -> Result<bool, AutomationError> {
        unsupported("is_displayed")
    }

    async fn is_enabled(&self, _element: &Element) -> Result<bool, AutomationError> {
        unsupported("is_enabled")
    }

    async fn text(&self, _element: &Element) -> Result<String, AutomationError> {
        unsupported("text")
    }

    async fn execute_script(&self, _script: &str) -> Result<serde_json::Value, AutomationError> {
        unsupported("execute_script")
    }

    // ============== INPUT ==============

    async fn type_text(&self, _element: &Element, _text: &str) -> Result<(), AutomationError> {
        unsupported("type_text")
    }

    async fn clear(&self, _element: &Element) -> Result<(), AutomationError> {
        unsupported("clear")
    }

    async fn click(&self, _element: &Element) -> Result<(), AutomationError> {
        unsupported("click")
    }

    /// Press and release a single key on whatever currently has focus.
    async fn press_key(&self, _key: Key) -> Result<(), AutomationError> {
        unsupported("press_key")
    }

    /// Hold the keys down in order, then release them in reverse.
    async fn hotkey(&self, _keys: &[Key]) -> Result<(), AutomationError> {
        unsupported("hotkey")
    }

    // ============== CONTEXT ==============

    async fn switch_to_frame(&self, _frame: &Element) -> Result<(), AutomationError> {
        unsupported("switch_to_frame")
    }

    async fn switch_to_default(&self) -> Result<(), AutomationError> {
        unsupported("switch_to_default")
    }

    /// Release everything held for the session. Calling it twice is harmless.
    async fn quit(&self) -> Result<(), AutomationError> {
        Ok(())
    }
}
