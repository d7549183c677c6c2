//! Page construction and lifecycle.
//!
//! A page is a named collection of element references plus one load
//! condition. Construction is a linear protocol, `Unbound -> Bound ->
//! Loaded`, with no cycles and no re-entry: [`PageBuilder::build`] first
//! binds every declared reference against the live session, then blocks on
//! the page-load wait.
//!
//! Both historically-suppressed failure modes are explicit policy choices
//! here instead of baked-in behavior: [`BindPolicy`] governs element-binding
//! failures and [`LoadPolicy`] governs the page-load timeout. The suppressing
//! variants are the defaults for compatibility; with [`LoadPolicy::Suppress`]
//! a page can reach `Loaded` even though its load condition never held, so
//! callers must consult [`Page::load_verified`] rather than assume it.

use std::collections::HashMap;

use crate::actions::{is_truthy, Actions};
use crate::driver::{DriverResult, ElementHandle, Session};
use crate::locator::Locator;
use crate::result::{EsperarError, EsperarResult};
use crate::wait::{WaitProfiles, Waiter};

/// Lifecycle states of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Declared but not yet bound against a session
    Unbound,
    /// All declared references bound (possibly with tolerated misses)
    Bound,
    /// The page-load wait has completed (successfully or suppressed)
    Loaded,
}

/// How element-binding failures during construction are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindPolicy {
    /// Log each miss and continue into a partially-bound page
    #[default]
    Tolerate,
    /// Fail construction with [`EsperarError::ElementBindingFailed`]
    Strict,
}

/// How a page-load wait timeout is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Log the timeout and continue; [`Page::load_verified`] reports `false`
    #[default]
    Suppress,
    /// Fail construction with [`EsperarError::PageLoadTimedOut`]
    Propagate,
}

/// The page-specific "loaded" condition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadCondition {
    /// No condition; the load wait is skipped
    #[default]
    None,
    /// An element resolves and is displayed
    ElementDisplayed(Locator),
    /// The document title contains a fragment
    TitleContains(String),
    /// A script evaluates truthy
    ScriptTruthy(String),
}

impl LoadCondition {
    fn holds(&self, session: &Session) -> bool {
        match self {
            Self::None => true,
            Self::ElementDisplayed(locator) => session
                .driver()
                .find(locator)
                .ok()
                .is_some_and(|h| session.driver().is_displayed(&h).unwrap_or(false)),
            Self::TitleContains(fragment) => session
                .driver()
                .title()
                .is_ok_and(|t| t.contains(fragment)),
            Self::ScriptTruthy(script) => session
                .execute_script(script, &[])
                .is_ok_and(|v| is_truthy(&v)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::None => "no load condition".to_string(),
            Self::ElementDisplayed(locator) => format!("{locator} displayed"),
            Self::TitleContains(fragment) => format!("title contains '{fragment}'"),
            Self::ScriptTruthy(_) => "load script truthy".to_string(),
        }
    }
}

/// A named, lazily-resolved reference to a UI element
///
/// Holds only the locator; the live handle is re-resolved from the DOM on
/// every access because handles go stale after any re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    name: String,
    locator: Locator,
}

impl ElementRef {
    /// Create an element reference
    #[must_use]
    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
        }
    }

    /// Symbolic element name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Locator descriptor
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Resolve a fresh handle from the live DOM
    pub fn resolve(&self, session: &Session) -> DriverResult<ElementHandle> {
        session.driver().find(&self.locator)
    }
}

/// Explicit locator registry and construction options for one page
///
/// Replaces reflective field binding: every element is declared by symbolic
/// name, and binding is an explicit lookup at construction time.
#[derive(Debug, Clone)]
pub struct PageBuilder {
    name: String,
    locators: Vec<(String, Locator)>,
    load_condition: LoadCondition,
    bind_policy: BindPolicy,
    load_policy: LoadPolicy,
    profiles: WaitProfiles,
}

impl PageBuilder {
    /// Start declaring a page
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locators: Vec::new(),
            load_condition: LoadCondition::None,
            bind_policy: BindPolicy::default(),
            load_policy: LoadPolicy::default(),
            profiles: WaitProfiles::default(),
        }
    }

    /// Declare an element by symbolic name
    #[must_use]
    pub fn with_element(mut self, name: impl Into<String>, locator: Locator) -> Self {
        self.locators.push((name.into(), locator));
        self
    }

    /// Set the load condition
    #[must_use]
    pub fn with_load_condition(mut self, condition: LoadCondition) -> Self {
        self.load_condition = condition;
        self
    }

    /// Set the binding-failure policy
    #[must_use]
    pub const fn with_bind_policy(mut self, policy: BindPolicy) -> Self {
        self.bind_policy = policy;
        self
    }

    /// Set the load-timeout policy
    #[must_use]
    pub const fn with_load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    /// Set the wait profiles for this page and its actions
    #[must_use]
    pub const fn with_profiles(mut self, profiles: WaitProfiles) -> Self {
        self.profiles = profiles;
        self
    }

    /// Bind the declared elements and wait for the page to load
    ///
    /// Runs the full lifecycle: every declared locator is probed once against
    /// the session (the node need not exist yet; resolution stays lazy
    /// afterwards), then the load condition is awaited on the page-load
    /// profile. Which failures surface as errors depends on the configured
    /// [`BindPolicy`] and [`LoadPolicy`].
    pub fn build(self, session: &Session) -> EsperarResult<Page<'_>> {
        let mut page = Page {
            session,
            name: self.name,
            elements: HashMap::new(),
            state: PageState::Unbound,
            load_verified: false,
            profiles: self.profiles,
        };
        page.bind(self.locators, self.bind_policy)?;
        page.wait_for_load(&self.load_condition, self.load_policy)?;
        Ok(page)
    }
}

/// A bound collection of element references plus one load condition
///
/// Borrows its session; one session serves every page of a scenario.
pub struct Page<'s> {
    session: &'s Session,
    name: String,
    elements: HashMap<String, ElementRef>,
    state: PageState,
    load_verified: bool,
    profiles: WaitProfiles,
}

impl std::fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("load_verified", &self.load_verified)
            .field("elements", &self.elements.len())
            .finish_non_exhaustive()
    }
}

impl<'s> Page<'s> {
    fn bind(
        &mut self,
        locators: Vec<(String, Locator)>,
        policy: BindPolicy,
    ) -> EsperarResult<()> {
        for (name, locator) in locators {
            let reference = ElementRef::new(name.clone(), locator);
            if let Err(e) = reference.resolve(self.session) {
                match policy {
                    BindPolicy::Tolerate => {
                        tracing::warn!(
                            page = %self.name,
                            element = %name,
                            error = %e,
                            "element did not bind; continuing"
                        );
                    }
                    BindPolicy::Strict => {
                        return Err(EsperarError::ElementBindingFailed {
                            page: self.name.clone(),
                            element: name,
                            source: e,
                        });
                    }
                }
            }
            self.elements.insert(name, reference);
        }
        self.state = PageState::Bound;
        Ok(())
    }

    fn wait_for_load(
        &mut self,
        condition: &LoadCondition,
        policy: LoadPolicy,
    ) -> EsperarResult<()> {
        if matches!(condition, LoadCondition::None) {
            self.state = PageState::Loaded;
            self.load_verified = true;
            return Ok(());
        }

        let spec = self.profiles.page_load;
        let what = format!("page '{}' loaded ({})", self.name, condition.describe());
        let waited = Waiter::new().wait_until(&spec, &what, || {
            condition.holds(self.session).then_some(())
        });

        match waited {
            Ok(()) => self.load_verified = true,
            Err(EsperarError::WaitTimedOut { ms, .. }) => match policy {
                LoadPolicy::Suppress => {
                    tracing::warn!(
                        page = %self.name,
                        timeout_ms = ms,
                        "page-load wait timed out; continuing unverified"
                    );
                    self.load_verified = false;
                }
                LoadPolicy::Propagate => {
                    return Err(EsperarError::PageLoadTimedOut {
                        page: self.name.clone(),
                        ms,
                    });
                }
            },
            Err(other) => return Err(other),
        }
        self.state = PageState::Loaded;
        Ok(())
    }

    /// Page name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> PageState {
        self.state
    }

    /// Whether the load condition was actually observed to hold
    ///
    /// Under [`LoadPolicy::Suppress`] a `Loaded` page may report `false`
    /// here; act on such a page at your own risk.
    #[must_use]
    pub const fn load_verified(&self) -> bool {
        self.load_verified
    }

    /// The session this page borrows
    #[must_use]
    pub const fn session(&self) -> &'s Session {
        self.session
    }

    /// Look up a declared element reference by name
    pub fn element(&self, name: &str) -> EsperarResult<&ElementRef> {
        self.elements.get(name).ok_or_else(|| EsperarError::UnknownElement {
            page: self.name.clone(),
            name: name.to_string(),
        })
    }

    /// Names of all declared elements
    #[must_use]
    pub fn element_names(&self) -> Vec<&str> {
        self.elements.keys().map(String::as_str).collect()
    }

    /// Action wrapper over this page's session, sharing its wait profiles
    #[must_use]
    pub fn actions(&self) -> Actions<'s> {
        Actions::with_profiles(self.session, self.profiles)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::fake::{DriverCall, FakeDriver, FakeElement};

    fn short_builder(name: &str) -> PageBuilder {
        PageBuilder::new(name).with_profiles(WaitProfiles::short(60, 10))
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_build_reaches_loaded() {
            let fake = FakeDriver::new();
            fake.add_element(&Locator::id("user"), FakeElement::new("input"));
            let session = Session::new(Box::new(fake));

            let page = short_builder("login")
                .with_element("user", Locator::id("user"))
                .build(&session)
                .unwrap();

            assert_eq!(page.state(), PageState::Loaded);
            assert!(page.load_verified());
            assert_eq!(page.element_names(), vec!["user"]);
        }

        #[test]
        fn test_unbound_locator_still_constructs_under_tolerate() {
            let fake = FakeDriver::new();
            let session = Session::new(Box::new(fake));

            let page = short_builder("login")
                .with_element("ghost", Locator::css("#ghost"))
                .build(&session)
                .unwrap();

            // Bound was reached despite the miss; the ref stays lazily usable
            assert_eq!(page.state(), PageState::Loaded);
            assert!(page.element("ghost").is_ok());
        }

        #[test]
        fn test_strict_bind_policy_fails_construction() {
            let fake = FakeDriver::new();
            let session = Session::new(Box::new(fake));

            let result = short_builder("login")
                .with_element("ghost", Locator::css("#ghost"))
                .with_bind_policy(BindPolicy::Strict)
                .build(&session);

            match result {
                Err(EsperarError::ElementBindingFailed { page, element, .. }) => {
                    assert_eq!(page, "login");
                    assert_eq!(element, "ghost");
                }
                other => panic!("expected ElementBindingFailed, got {other:?}"),
            }
        }

        #[test]
        fn test_unknown_element_lookup() {
            let fake = FakeDriver::new();
            let session = Session::new(Box::new(fake));
            let page = short_builder("home").build(&session).unwrap();
            assert!(matches!(
                page.element("missing"),
                Err(EsperarError::UnknownElement { .. })
            ));
        }
    }

    mod load_condition_tests {
        use super::*;

        #[test]
        fn test_element_displayed_condition_verifies() {
            let fake = FakeDriver::new();
            fake.add_element(&Locator::css("#banner"), FakeElement::new("div"));
            let session = Session::new(Box::new(fake));

            let page = short_builder("home")
                .with_load_condition(LoadCondition::ElementDisplayed(Locator::css("#banner")))
                .build(&session)
                .unwrap();
            assert!(page.load_verified());
        }

        #[test]
        fn test_suppress_policy_swallows_timeout() {
            let fake = FakeDriver::new();
            let session = Session::new(Box::new(fake));

            let page = short_builder("home")
                .with_load_condition(LoadCondition::ElementDisplayed(Locator::css("#banner")))
                .build(&session)
                .unwrap();

            assert_eq!(page.state(), PageState::Loaded);
            assert!(!page.load_verified());
        }

        #[test]
        fn test_propagate_policy_raises_timeout() {
            let fake = FakeDriver::new();
            let session = Session::new(Box::new(fake));

            let result = short_builder("home")
                .with_load_condition(LoadCondition::ElementDisplayed(Locator::css("#banner")))
                .with_load_policy(LoadPolicy::Propagate)
                .build(&session);

            match result {
                Err(EsperarError::PageLoadTimedOut { page, ms }) => {
                    assert_eq!(page, "home");
                    assert_eq!(ms, 60);
                }
                other => panic!("expected PageLoadTimedOut, got {other:?}"),
            }
        }

        #[test]
        fn test_title_condition() {
            let fake = FakeDriver::new();
            fake.set_title("Dashboard - Acme");
            let session = Session::new(Box::new(fake));

            let page = short_builder("dashboard")
                .with_load_condition(LoadCondition::TitleContains("Dashboard".into()))
                .build(&session)
                .unwrap();
            assert!(page.load_verified());
        }

        #[test]
        fn test_script_condition() {
            let fake = FakeDriver::new();
            fake.push_script_result("return window.appReady;", serde_json::json!(false));
            fake.push_script_result("return window.appReady;", serde_json::json!(true));
            let session = Session::new(Box::new(fake));

            let page = short_builder("app")
                .with_load_condition(LoadCondition::ScriptTruthy(
                    "return window.appReady;".into(),
                ))
                .build(&session)
                .unwrap();
            assert!(page.load_verified());
        }
    }

    mod end_to_end_tests {
        use super::*;

        // RUST_LOG=esperar=trace cargo test -- --nocapture to see the waits
        fn init_logging() {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        }

        #[test]
        fn test_enter_text_then_click_in_order() {
            init_logging();
            let fake = FakeDriver::new();
            fake.add_element(&Locator::id("email"), FakeElement::new("input"));
            fake.add_element(&Locator::id("submit"), FakeElement::new("button"));
            let session = Session::new(Box::new(fake.clone()));

            let page = short_builder("signup")
                .with_element("email", Locator::id("email"))
                .with_element("submit", Locator::id("submit"))
                .build(&session)
                .unwrap();
            let actions = page.actions();

            actions
                .enter_text(page.element("email").unwrap(), "x@y.com")
                .unwrap();
            actions.click(page.element("submit").unwrap()).unwrap();

            let side_effects: Vec<DriverCall> = fake
                .calls()
                .into_iter()
                .filter(|c| {
                    matches!(
                        c,
                        DriverCall::Clear(_) | DriverCall::TypeText(_, _) | DriverCall::Click(_)
                    )
                })
                .collect();
            assert_eq!(side_effects.len(), 3);
            assert!(matches!(side_effects[0], DriverCall::Clear(_)));
            assert!(matches!(
                &side_effects[1],
                DriverCall::TypeText(_, text) if text == "x@y.com"
            ));
            assert!(matches!(side_effects[2], DriverCall::Click(_)));
        }

        #[test]
        fn test_element_ref_resolves_freshly_each_access() {
            let fake = FakeDriver::new();
            fake.add_element(&Locator::id("row"), FakeElement::new("tr"));
            let session = Session::new(Box::new(fake.clone()));

            let page = short_builder("list")
                .with_element("row", Locator::id("row"))
                .build(&session)
                .unwrap();

            let reference = page.element("row").unwrap();
            reference.resolve(&session).unwrap();
            reference.resolve(&session).unwrap();

            let finds = fake
                .calls()
                .into_iter()
                .filter(|c| matches!(c, DriverCall::Find(_)))
                .count();
            // one bind probe plus two explicit resolutions
            assert_eq!(finds, 3);
        }
    }
}
