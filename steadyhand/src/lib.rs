//! Browser and desktop automation built on bounded waits
//!
//! Every interaction with a third-party UI first waits, with a deadline, for
//! the thing it is about to touch: an element to exist or become clickable, a
//! frame to load, the URL to change. [`waiter::wait`] is that single primitive;
//! the flows in [`flows`] are written on top of it and the [`UiDriver`]
//! capability, with a W3C WebDriver backend for browsers and an `xdotool`
//! backend for desktop keyboard input.

pub mod condition;
pub mod config;
pub mod driver;
pub mod errors;
pub mod flows;
pub mod keyboard;
pub mod locator;
pub mod step;
#[cfg(test)]
mod tests;
pub mod waiter;
pub mod webdriver;

pub use condition::{condition_fn, Condition, ProbeResult};
pub use driver::{Element, UiDriver};
pub use errors::AutomationError;
pub use keyboard::{Key, XdotoolKeyboard};
pub use locator::{By, Locator};
pub use waiter::{wait, wait_until, WaitConfig, WaitOutcome};
pub use webdriver::{Browser, BrowserOptions, WebDriverClient};
