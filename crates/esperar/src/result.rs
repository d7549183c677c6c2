//! Result and error types for Esperar.

use thiserror::Error;

use crate::driver::DriverError;

/// Result type for Esperar operations
pub type EsperarResult<T> = Result<T, EsperarError>;

/// Errors that can occur in Esperar
///
/// Action-level failures (click, text entry, selection, frame switch) are
/// always propagated as one of these variants. Lifecycle-level failures
/// (element binding, page-load wait) are policy-controlled; see
/// [`crate::page::BindPolicy`] and [`crate::page::LoadPolicy`].
#[derive(Debug, Error)]
pub enum EsperarError {
    /// Element could not be resolved against the current document
    #[error("element '{element}' not found")]
    ElementNotFound {
        /// Declared element name
        element: String,
    },

    /// Element is present but refused the click (disabled or obscured)
    #[error("element '{element}' is present but not clickable")]
    ClickNotAllowed {
        /// Declared element name
        element: String,
    },

    /// Text input is absent or not visible, so clear/type never ran
    #[error("text element '{element}' not available for input")]
    TextEntryFailed {
        /// Declared element name
        element: String,
    },

    /// Dropdown option lookup by visible text failed
    #[error("option '{value}' not found in dropdown '{element}'")]
    DropdownValueNotFound {
        /// Declared element name
        element: String,
        /// Visible text that was looked up
        value: String,
        /// Underlying lookup failure
        #[source]
        source: DriverError,
    },

    /// Icon element is absent
    #[error("icon '{label}' not found")]
    IconNotFound {
        /// Human-readable icon label
        label: String,
    },

    /// Frame element is absent; the session context was left unchanged
    #[error("iframe '{element}' not found")]
    IFrameNotFound {
        /// Declared element name
        element: String,
    },

    /// Element never became visible within the element-visible wait profile
    #[error("element '{element}' is not visible in the UI")]
    ElementNotVisible {
        /// Declared element name
        element: String,
    },

    /// A bounded wait exhausted its timeout
    #[error("timed out after {ms}ms waiting for {waiting_for}")]
    WaitTimedOut {
        /// Configured timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waiting_for: String,
    },

    /// A bounded wait was cancelled through its [`crate::wait::CancelToken`]
    #[error("wait cancelled while waiting for {waiting_for}")]
    WaitCancelled {
        /// Description of the awaited condition
        waiting_for: String,
    },

    /// Page-load condition did not hold within the page-load wait profile
    ///
    /// Only raised under [`crate::page::LoadPolicy::Propagate`].
    #[error("page '{page}' did not finish loading within {ms}ms")]
    PageLoadTimedOut {
        /// Page name
        page: String,
        /// Configured timeout in milliseconds
        ms: u64,
    },

    /// A declared element failed to bind during page construction
    ///
    /// Only raised under [`crate::page::BindPolicy::Strict`].
    #[error("failed to bind element '{element}' on page '{page}'")]
    ElementBindingFailed {
        /// Page name
        page: String,
        /// Declared element name
        element: String,
        /// Underlying resolution failure
        #[source]
        source: DriverError,
    },

    /// Lookup of an element name that was never declared on the page
    #[error("no element named '{name}' is declared on page '{page}'")]
    UnknownElement {
        /// Page name
        page: String,
        /// Requested element name
        name: String,
    },

    /// Unclassified driver failure surfaced mid-action
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

impl EsperarError {
    /// Whether this error is a timeout of a bounded wait
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::WaitTimedOut { .. } | Self::PageLoadTimedOut { .. }
        )
    }
}
