//! Driver boundary and session facade.
//!
//! [`Driver`] is the abstract browser-session capability everything else in
//! the crate is written against. It is the single substitution point for
//! tests: unit tests of the waiter and the action wrappers run against
//! [`crate::fake::FakeDriver`] instead of a live browser.
//!
//! [`Session`] is the only authorized path from pages and actions to the
//! driver. No component outside this module holds or mutates session state
//! directly.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::locator::Locator;
use crate::wait::WaitProfiles;

/// Script used by [`Session::scroll_to_bottom`]
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0,document.body.scrollHeight);";

/// Script used by [`Session::scroll_into_view`]; the element handle is the
/// first script argument
pub const SCROLL_INTO_VIEW_SCRIPT: &str = "arguments[0].scrollIntoView();";

/// Result type at the driver boundary
pub type DriverResult<T> = Result<T, DriverError>;

/// Low-level failures reported by a driver implementation
///
/// The action wrappers classify these into [`crate::EsperarError`] variants;
/// they are never surfaced raw by a precondition check.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No element matched the locator
    #[error("no element matching {locator}")]
    NoSuchElement {
        /// Locator that failed to resolve
        locator: String,
    },

    /// No option with the requested visible text
    #[error("no option with visible text '{value}'")]
    NoSuchOption {
        /// Visible text that was looked up
        value: String,
    },

    /// Handle refers to a node detached by a re-render
    #[error("stale element handle '{id}'")]
    StaleElement {
        /// Opaque handle id
        id: String,
    },

    /// Script execution failed inside the page
    #[error("script execution failed: {message}")]
    Script {
        /// Driver-reported message
        message: String,
    },

    /// Any other backend failure (lost session, protocol error, ...)
    #[error("driver backend error: {message}")]
    Backend {
        /// Driver-reported message
        message: String,
    },
}

/// Opaque handle to a resolved DOM node
///
/// Handles go stale after any re-render; callers should hold a
/// [`crate::page::ElementRef`] and re-resolve instead of caching these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier
    pub id: String,
    /// Element tag name
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }
}

/// Abstract browser-session capability
///
/// Object-safe and synchronous: one scenario drives one session from a single
/// flow of control, so no method requires `&mut self` at the trait level.
/// Implementations are free to use interior mutability.
pub trait Driver {
    /// Navigate to a URL
    fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Reload the current document
    fn refresh(&self) -> DriverResult<()>;

    /// Current document URL
    fn current_url(&self) -> DriverResult<String>;

    /// Current document title
    fn title(&self) -> DriverResult<String>;

    /// Execute a script in the page; `args` are exposed as `arguments[n]`
    fn execute_script(&self, script: &str, args: &[serde_json::Value])
        -> DriverResult<serde_json::Value>;

    /// Resolve a single element
    fn find(&self, locator: &Locator) -> DriverResult<ElementHandle>;

    /// Resolve all matching elements (empty vec when none match)
    fn find_all(&self, locator: &Locator) -> DriverResult<Vec<ElementHandle>>;

    /// Whether the element is rendered visible
    fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Whether the element accepts interaction
    fn is_enabled(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Click the element
    fn click(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Clear the element's value
    fn clear(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Type text into the element
    fn type_text(&self, element: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Select a dropdown option by its visible text
    fn select_by_visible_text(&self, element: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Switch the session context into a frame element
    fn switch_to_frame(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Switch the session context back to the root document
    fn switch_to_default_content(&self) -> DriverResult<()>;

    /// Configure the driver's implicit element-lookup timeout
    fn set_implicit_timeout(&self, timeout: Duration) -> DriverResult<()>;

    /// Configure the driver's page-load timeout
    fn set_page_load_timeout(&self, timeout: Duration) -> DriverResult<()>;

    /// Configure the driver's async-script timeout
    fn set_script_timeout(&self, timeout: Duration) -> DriverResult<()>;
}

/// Facade over one live browser session
///
/// Owned once per test scenario. Pages borrow the session; they never own it.
pub struct Session {
    driver: Box<dyn Driver>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Wrap a driver capability in a session facade
    #[must_use]
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Access the underlying driver capability
    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Navigate to a URL
    pub fn navigate(&self, url: &str) -> DriverResult<()> {
        tracing::debug!(url, "navigate");
        self.driver.navigate(url)
    }

    /// Reload the current document
    pub fn refresh(&self) -> DriverResult<()> {
        tracing::trace!("refresh");
        self.driver.refresh()
    }

    /// Execute a script in the page
    pub fn execute_script(
        &self,
        script: &str,
        args: &[serde_json::Value],
    ) -> DriverResult<serde_json::Value> {
        self.driver.execute_script(script, args)
    }

    /// Scroll the given element into the viewport
    pub fn scroll_into_view(&self, element: &ElementHandle) -> DriverResult<()> {
        let arg = serde_json::Value::String(element.id.clone());
        self.driver
            .execute_script(SCROLL_INTO_VIEW_SCRIPT, &[arg])
            .map(|_| ())
    }

    /// Scroll to the bottom of the document
    pub fn scroll_to_bottom(&self) -> DriverResult<()> {
        self.driver
            .execute_script(SCROLL_TO_BOTTOM_SCRIPT, &[])
            .map(|_| ())
    }

    /// Switch the session context back to the root document
    pub fn switch_to_default_content(&self) -> DriverResult<()> {
        self.driver.switch_to_default_content()
    }

    /// Push the wait-profile timeouts down into the driver
    ///
    /// Maps the element-visible profile to the implicit timeout, the
    /// page-load profile to the page-load timeout, and the script-readiness
    /// profile to the async-script timeout.
    pub fn apply_timeouts(&self, profiles: &WaitProfiles) -> DriverResult<()> {
        self.driver
            .set_implicit_timeout(profiles.element_visible.timeout())?;
        self.driver
            .set_page_load_timeout(profiles.page_load.timeout())?;
        self.driver
            .set_script_timeout(profiles.script_ready.timeout())?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fake::{DriverCall, FakeDriver, FakeElement};

    #[test]
    fn test_session_delegates_navigation() {
        let fake = FakeDriver::new();
        let session = Session::new(Box::new(fake.clone()));
        session.navigate("https://example.com/login").unwrap();
        session.refresh().unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                DriverCall::Navigate("https://example.com/login".into()),
                DriverCall::Refresh,
            ]
        );
    }

    #[test]
    fn test_scroll_helpers_go_through_execute_script() {
        let fake = FakeDriver::new();
        fake.add_element(&Locator::css("#row"), FakeElement::new("div"));
        let session = Session::new(Box::new(fake.clone()));

        let handle = session.driver().find(&Locator::css("#row")).unwrap();
        session.scroll_into_view(&handle).unwrap();
        session.scroll_to_bottom().unwrap();

        let scripts: Vec<String> = fake
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DriverCall::ExecuteScript(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(
            scripts,
            vec![
                SCROLL_INTO_VIEW_SCRIPT.to_string(),
                SCROLL_TO_BOTTOM_SCRIPT.to_string(),
            ]
        );
    }

    #[test]
    fn test_apply_timeouts_covers_all_three_surfaces() {
        let fake = FakeDriver::new();
        let session = Session::new(Box::new(fake.clone()));
        session.apply_timeouts(&WaitProfiles::default()).unwrap();

        let calls = fake.calls();
        assert!(calls
            .iter()
            .any(|c| matches!(c, DriverCall::SetImplicitTimeout(_))));
        assert!(calls
            .iter()
            .any(|c| matches!(c, DriverCall::SetPageLoadTimeout(_))));
        assert!(calls
            .iter()
            .any(|c| matches!(c, DriverCall::SetScriptTimeout(_))));
    }
}
