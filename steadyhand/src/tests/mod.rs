mod flow_tests;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::driver::{Element, UiDriver};
use crate::errors::AutomationError;
use crate::keyboard::Key;
use crate::locator::Locator;

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_test_writer()
        .try_init();
}

/// How a scripted element behaves.
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub displayed: bool,
    pub enabled: bool,
    pub text: String,
    /// Number of lookups that miss before the element shows up.
    pub appears_after: u32,
}

impl Default for FakeElement {
    fn default() -> Self {
        Self {
            displayed: true,
            enabled: true,
            text: String::new(),
            appears_after: 0,
        }
    }
}

#[derive(Default)]
struct FakeState {
    elements: HashMap<String, FakeElement>,
    lookups: HashMap<String, u32>,
    invalid: Vec<String>,
    url: String,
    ready_after: u32,
    ready_probes: u32,
    log: Vec<String>,
}

/// In-memory [`UiDriver`] that plays back a scripted page and records every
/// action it is asked to perform.
#[derive(Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element under its locator's display form (`id:user`).
    pub fn with(self, locator: &str, element: FakeElement) -> Self {
        let key = locator.parse::<Locator>().unwrap().to_string();
        self.state.lock().unwrap().elements.insert(key, element);
        self
    }

    pub fn with_present(self, locator: &str) -> Self {
        self.with(locator, FakeElement::default())
    }

    /// Lookups for this locator fail with `InvalidSelector`.
    pub fn with_invalid(self, locator: &str) -> Self {
        let key = locator.parse::<Locator>().unwrap().to_string();
        self.state.lock().unwrap().invalid.push(key);
        self
    }

    /// `document.readyState` reports `complete` from this probe on (1-based).
    pub fn with_ready_after(self, probes: u32) -> Self {
        self.state.lock().unwrap().ready_after = probes;
        self
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().unwrap().url = url.to_string();
    }

    pub fn set_displayed(&self, locator: &str, displayed: bool) {
        let key = locator.parse::<Locator>().unwrap().to_string();
        if let Some(el) = self.state.lock().unwrap().elements.get_mut(&key) {
            el.displayed = displayed;
        }
    }

    pub fn lookups(&self, locator: &str) -> u32 {
        let key = locator.parse::<Locator>().unwrap().to_string();
        self.state
            .lock()
            .unwrap()
            .lookups
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    fn record(&self, entry: String) {
        self.state.lock().unwrap().log.push(entry);
    }

    fn element(&self, element: &Element) -> Result<FakeElement, AutomationError> {
        self.state
            .lock()
            .unwrap()
            .elements
            .get(element.id())
            .cloned()
            .ok_or_else(|| AutomationError::ElementDetached(element.id().to_string()))
    }
}

#[async_trait::async_trait]
impl UiDriver for FakeDriver {
    fn name(&self) -> &str {
        "fake"
    }

    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        self.set_url(url);
        self.record(format!("navigate {url}"));
        Ok(())
    }

    async fn current_url(&self) -> Result<String, AutomationError> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<Element>, AutomationError> {
        let key = locator.to_string();
        let mut state = self.state.lock().unwrap();
        if state.invalid.contains(&key) {
            return Err(AutomationError::InvalidSelector(key));
        }
        let seen = {
            let count = state.lookups.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };
        match state.elements.get(&key) {
            Some(el) if seen > el.appears_after => Ok(Some(Element::new(key))),
            _ => Ok(None),
        }
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool, AutomationError> {
        Ok(self.element(element)?.displayed)
    }

    async fn is_enabled(&self, element: &Element) -> Result<bool, AutomationError> {
        Ok(self.element(element)?.enabled)
    }

    async fn text(&self, element: &Element) -> Result<String, AutomationError> {
        Ok(self.element(element)?.text)
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, AutomationError> {
        let mut state = self.state.lock().unwrap();
        if script.contains("readyState") {
            state.ready_probes += 1;
            let ready = if state.ready_probes >= state.ready_after {
                "complete"
            } else {
                "loading"
            };
            return Ok(serde_json::Value::String(ready.to_string()));
        }
        Ok(serde_json::Value::Null)
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<(), AutomationError> {
        self.element(element)?;
        self.record(format!("type {} {}", element.id(), text));
        Ok(())
    }

    async fn clear(&self, element: &Element) -> Result<(), AutomationError> {
        self.element(element)?;
        self.record(format!("clear {}", element.id()));
        Ok(())
    }

    async fn click(&self, element: &Element) -> Result<(), AutomationError> {
        self.element(element)?;
        self.record(format!("click {}", element.id()));
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<(), AutomationError> {
        self.record(format!("key {key}"));
        Ok(())
    }

    async fn hotkey(&self, keys: &[Key]) -> Result<(), AutomationError> {
        let combo = keys
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join("+");
        self.record(format!("hotkey {combo}"));
        Ok(())
    }

    async fn switch_to_frame(&self, frame: &Element) -> Result<(), AutomationError> {
        self.record(format!("frame {}", frame.id()));
        Ok(())
    }

    async fn switch_to_default(&self) -> Result<(), AutomationError> {
        self.record("default content".to_string());
        Ok(())
    }

    async fn quit(&self) -> Result<(), AutomationError> {
        self.record("quit".to_string());
        Ok(())
    }
}
