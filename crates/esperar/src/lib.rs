//! Esperar: Wait-Aware Page-Object Support for Browser UI Test Automation
//!
//! Esperar (Spanish: "to wait") gives test authors a typed, wait-aware
//! abstraction over a remote browser session, so page interactions never race
//! the page's asynchronous rendering. It does not automate the browser
//! itself — navigation, rendering and DOM access belong to an externally
//! supplied [`Driver`] capability. Esperar decides *when* to act and *how*
//! to classify failure.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      ESPERAR Architecture                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌──────────┐     ┌─────────────┐     ┌──────────────────┐      │
//! │   │  Page    │────►│  Actions    │────►│  Session         │      │
//! │   │ (bound   │     │ (verify-    │     │ (facade over a   │      │
//! │   │  refs +  │     │  then-act)  │     │  Driver impl)    │      │
//! │   │  load    │     └──────┬──────┘     └──────────────────┘      │
//! │   │  wait)   │            │                                      │
//! │   └──────────┘     ┌──────▼──────┐                               │
//! │                    │  Waiter     │  bounded polling, cancel      │
//! │                    └─────────────┘                               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A scenario owns one [`Session`]. Constructing a page through
//! [`PageBuilder`] binds its declared element references and then blocks on
//! the page-specific load condition; every action on the page checks its
//! precondition exactly once before mutating the UI and raises a specific
//! [`EsperarError`] variant when the check fails. All waits are bounded and
//! run through the same [`Waiter`] engine.
//!
//! # Example
//!
//! ```
//! use esperar::fake::{FakeDriver, FakeElement};
//! use esperar::{Locator, PageBuilder, Session, WaitProfiles};
//!
//! let fake = FakeDriver::new();
//! fake.add_element(&Locator::id("email"), FakeElement::new("input"));
//! fake.add_element(&Locator::id("submit"), FakeElement::new("button"));
//! let session = Session::new(Box::new(fake));
//!
//! let page = PageBuilder::new("signup")
//!     .with_element("email", Locator::id("email"))
//!     .with_element("submit", Locator::id("submit"))
//!     .with_profiles(WaitProfiles::short(100, 10))
//!     .build(&session)
//!     .unwrap();
//!
//! let actions = page.actions();
//! actions.enter_text(page.element("email").unwrap(), "x@y.com").unwrap();
//! actions.click(page.element("submit").unwrap()).unwrap();
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod actions;
pub mod driver;
pub mod fake;
pub mod locator;
pub mod page;
pub mod result;
pub mod wait;

pub use actions::{Actions, JQUERY_IDLE_SCRIPT};
pub use driver::{Driver, DriverError, DriverResult, ElementHandle, Session};
pub use locator::{Locator, Selector};
pub use page::{
    BindPolicy, ElementRef, LoadCondition, LoadPolicy, Page, PageBuilder, PageState,
};
pub use result::{EsperarError, EsperarResult};
pub use wait::{CancelToken, WaitProfiles, WaitSpec, Waiter};

/// Commonly used types, importable in one line
pub mod prelude {
    pub use crate::actions::Actions;
    pub use crate::driver::{Driver, ElementHandle, Session};
    pub use crate::locator::{Locator, Selector};
    pub use crate::page::{
        BindPolicy, ElementRef, LoadCondition, LoadPolicy, Page, PageBuilder, PageState,
    };
    pub use crate::result::{EsperarError, EsperarResult};
    pub use crate::wait::{CancelToken, WaitProfiles, WaitSpec, Waiter};
}
