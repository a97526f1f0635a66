//! Conditions a wait can poll for.
//!
//! A condition wraps a single non-blocking probe against the UI. Every probe
//! is independent: a condition never remembers what an earlier probe saw.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

use crate::driver::{Element, UiDriver};
use crate::errors::AutomationError;
use crate::locator::Locator;

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult<T> {
    /// The awaited state holds; carries the value the caller waited for.
    Satisfied(T),
    /// The awaited state does not hold yet. `state` describes what was seen
    /// instead, when the probe can tell.
    NotYet { state: Option<String> },
}

impl<T> ProbeResult<T> {
    pub fn not_yet(state: impl Into<String>) -> Self {
        ProbeResult::NotYet {
            state: Some(state.into()),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, ProbeResult::Satisfied(_))
    }
}

#[async_trait]
pub trait Condition: Send + Sync {
    type Output: Send;

    /// Query the external system once, without blocking.
    ///
    /// Transient errors (see [`AutomationError::is_transient`]) are read as
    /// "not yet"; any other error aborts the wait.
    async fn probe(&self) -> Result<ProbeResult<Self::Output>, AutomationError>;

    /// Human-readable description used in timeout messages.
    fn describe(&self) -> String;
}

/// Adapts an async closure into a [`Condition`].
pub struct FnCondition<F, Fut> {
    description: String,
    probe: F,
    _future: PhantomData<fn() -> Fut>,
}

/// Build a condition from a description and a probe closure.
pub fn condition_fn<F, Fut, T>(description: impl Into<String>, probe: F) -> FnCondition<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<ProbeResult<T>, AutomationError>> + Send,
    T: Send,
{
    FnCondition {
        description: description.into(),
        probe,
        _future: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, T> Condition for FnCondition<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<ProbeResult<T>, AutomationError>> + Send,
    T: Send,
{
    type Output = T;

    async fn probe(&self) -> Result<ProbeResult<T>, AutomationError> {
        (self.probe)().await
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// What an [`ElementCondition`] requires of the located element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementState {
    Present,
    Visible,
    /// Displayed and enabled.
    Clickable,
    /// Element text contains the given string.
    HasText(String),
}

/// Waits for an element to reach an [`ElementState`].
pub struct ElementCondition<'a> {
    driver: &'a dyn UiDriver,
    locator: Locator,
    state: ElementState,
}

pub fn presence_of<'a>(driver: &'a dyn UiDriver, locator: &Locator) -> ElementCondition<'a> {
    ElementCondition {
        driver,
        locator: locator.clone(),
        state: ElementState::Present,
    }
}

pub fn visibility_of<'a>(driver: &'a dyn UiDriver, locator: &Locator) -> ElementCondition<'a> {
    ElementCondition {
        driver,
        locator: locator.clone(),
        state: ElementState::Visible,
    }
}

pub fn clickable<'a>(driver: &'a dyn UiDriver, locator: &Locator) -> ElementCondition<'a> {
    ElementCondition {
        driver,
        locator: locator.clone(),
        state: ElementState::Clickable,
    }
}

pub fn text_present<'a>(
    driver: &'a dyn UiDriver,
    locator: &Locator,
    text: impl Into<String>,
) -> ElementCondition<'a> {
    ElementCondition {
        driver,
        locator: locator.clone(),
        state: ElementState::HasText(text.into()),
    }
}

#[async_trait]
impl Condition for ElementCondition<'_> {
    type Output = Element;

    async fn probe(&self) -> Result<ProbeResult<Element>, AutomationError> {
        let Some(element) = self.driver.find(&self.locator).await? else {
            return Ok(ProbeResult::not_yet(format!("{} not present", self.locator)));
        };

        match &self.state {
            ElementState::Present => {}
            ElementState::Visible => {
                if !self.driver.is_displayed(&element).await? {
                    return Ok(ProbeResult::not_yet(format!("{} not displayed", self.locator)));
                }
            }
            ElementState::Clickable => {
                if !self.driver.is_displayed(&element).await? {
                    return Ok(ProbeResult::not_yet(format!("{} not displayed", self.locator)));
                }
                if !self.driver.is_enabled(&element).await? {
                    return Ok(ProbeResult::not_yet(format!("{} disabled", self.locator)));
                }
            }
            ElementState::HasText(expected) => {
                let text = self.driver.text(&element).await?;
                if !text.contains(expected.as_str()) {
                    return Ok(ProbeResult::not_yet(format!("text was {text:?}")));
                }
            }
        }

        Ok(ProbeResult::Satisfied(element))
    }

    fn describe(&self) -> String {
        match &self.state {
            ElementState::Present => format!("presence of {}", self.locator),
            ElementState::Visible => format!("visibility of {}", self.locator),
            ElementState::Clickable => format!("{} to be clickable", self.locator),
            ElementState::HasText(text) => format!("{} to contain {text:?}", self.locator),
        }
    }
}

/// Waits for a frame to exist and switches the driver into it.
///
/// Switching is part of the probe, so a frame that disappears between lookup
/// and switch is simply retried on the next poll.
pub struct FrameAvailable<'a> {
    driver: &'a dyn UiDriver,
    locator: Locator,
}

pub fn frame_available<'a>(driver: &'a dyn UiDriver, locator: &Locator) -> FrameAvailable<'a> {
    FrameAvailable {
        driver,
        locator: locator.clone(),
    }
}

#[async_trait]
impl Condition for FrameAvailable<'_> {
    type Output = ();

    async fn probe(&self) -> Result<ProbeResult<()>, AutomationError> {
        let Some(frame) = self.driver.find(&self.locator).await? else {
            return Ok(ProbeResult::not_yet(format!("frame {} not present", self.locator)));
        };
        self.driver.switch_to_frame(&frame).await?;
        Ok(ProbeResult::Satisfied(()))
    }

    fn describe(&self) -> String {
        format!("frame {} to be available", self.locator)
    }
}

/// Waits for the current URL to differ from `from`.
pub struct UrlChanges<'a> {
    driver: &'a dyn UiDriver,
    from: String,
}

pub fn url_changes<'a>(driver: &'a dyn UiDriver, from: impl Into<String>) -> UrlChanges<'a> {
    UrlChanges {
        driver,
        from: from.into(),
    }
}

#[async_trait]
impl Condition for UrlChanges<'_> {
    type Output = String;

    async fn probe(&self) -> Result<ProbeResult<String>, AutomationError> {
        let current = self.driver.current_url().await?;
        if current == self.from {
            Ok(ProbeResult::not_yet(format!("still at {current}")))
        } else {
            Ok(ProbeResult::Satisfied(current))
        }
    }

    fn describe(&self) -> String {
        format!("URL to change from {}", self.from)
    }
}
