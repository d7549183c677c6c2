//! Locator descriptors for element resolution.
//!
//! A [`Locator`] names *where* in the current document an element should
//! resolve; it never holds a live handle. Resolution happens lazily through
//! the [`crate::driver::Driver`] boundary on every access, so a locator stays
//! valid across re-renders while the handles it produces do not.

use serde::{Deserialize, Serialize};

/// Selector strategy for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., `button.primary`)
    Css(String),
    /// XPath expression
    XPath(String),
    /// Element id attribute
    Id(String),
    /// Form control name attribute
    Name(String),
    /// Anchor link text
    LinkText(String),
    /// Test ID selector (`data-testid` attribute)
    TestId(String),
}

impl Selector {
    /// Short strategy tag used in logs and error messages
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
            Self::Id(_) => "id",
            Self::Name(_) => "name",
            Self::LinkText(_) => "link-text",
            Self::TestId(_) => "test-id",
        }
    }

    /// The raw selector value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(s)
            | Self::XPath(s)
            | Self::Id(s)
            | Self::Name(s)
            | Self::LinkText(s)
            | Self::TestId(s) => s,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.strategy(), self.value())
    }
}

/// A descriptor identifying where an element should resolve
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    selector: Selector,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub const fn new(selector: Selector) -> Self {
        Self { selector }
    }

    /// Create a CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Selector::Css(selector.into()))
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::new(Selector::XPath(expression.into()))
    }

    /// Create an id-attribute locator
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(Selector::Id(id.into()))
    }

    /// Create a name-attribute locator
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::new(Selector::Name(name.into()))
    }

    /// Create a link-text locator
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::new(Selector::LinkText(text.into()))
    }

    /// Create a test-id locator
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::new(Selector::TestId(id.into()))
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.selector)
    }
}
