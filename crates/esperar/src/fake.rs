//! Scripted fake driver for unit tests.
//!
//! [`FakeDriver`] implements the full [`Driver`] boundary over an in-memory
//! DOM description and records every call it receives, so tests can assert
//! not just outcomes but side-effect ordering ("clear before type", "no
//! click on a disabled element"). Clones share state: clone the fake before
//! boxing it into a [`crate::Session`] and keep the clone for inspection.
//!
//! The page model is deliberately dumb — elements are keyed by their
//! locator's string form, scripts by their exact source text.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use crate::driver::{Driver, DriverError, DriverResult, ElementHandle};
use crate::locator::Locator;

/// One element in the fake DOM
#[derive(Debug, Clone)]
pub struct FakeElement {
    /// Tag name reported on handles
    pub tag_name: String,
    /// Whether the element is rendered visible
    pub displayed: bool,
    /// Whether the element accepts interaction
    pub enabled: bool,
    /// Visible texts of dropdown options, if any
    pub options: Vec<String>,
}

impl FakeElement {
    /// A visible, enabled element
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            displayed: true,
            enabled: true,
            options: Vec::new(),
        }
    }

    /// Mark the element hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Mark the element disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Give the element dropdown options
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// A recorded driver invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// `navigate(url)`
    Navigate(String),
    /// `refresh()`
    Refresh,
    /// `execute_script(script, ..)`
    ExecuteScript(String),
    /// `find(locator)`
    Find(String),
    /// `find_all(locator)`
    FindAll(String),
    /// `click` on the element keyed by locator string
    Click(String),
    /// `clear` on the element keyed by locator string
    Clear(String),
    /// `type_text` (element key, text)
    TypeText(String, String),
    /// `select_by_visible_text` (element key, visible text)
    SelectOption(String, String),
    /// `switch_to_frame` on the element keyed by locator string
    SwitchToFrame(String),
    /// `switch_to_default_content()`
    SwitchToDefault,
    /// `set_implicit_timeout(..)`
    SetImplicitTimeout(Duration),
    /// `set_page_load_timeout(..)`
    SetPageLoadTimeout(Duration),
    /// `set_script_timeout(..)`
    SetScriptTimeout(Duration),
}

#[derive(Debug, Default)]
struct FakeDom {
    elements: HashMap<String, Vec<FakeElement>>,
    handles: HashMap<String, (String, usize)>,
    script_results: HashMap<String, serde_json::Value>,
    script_queues: HashMap<String, VecDeque<serde_json::Value>>,
    reveals: HashMap<String, usize>,
    calls: Vec<DriverCall>,
    url: String,
    title: String,
    frame_depth: usize,
    refresh_count: usize,
    next_handle: usize,
}

impl FakeDom {
    fn alloc_handle(&mut self, key: &str, index: usize, tag_name: &str) -> ElementHandle {
        let id = format!("e{}", self.next_handle);
        self.next_handle += 1;
        self.handles.insert(id.clone(), (key.to_string(), index));
        ElementHandle::new(id, tag_name)
    }

    fn lookup(&self, handle: &ElementHandle) -> DriverResult<(String, usize)> {
        self.handles
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| DriverError::StaleElement {
                id: handle.id.clone(),
            })
    }

    fn element(&self, key: &str, index: usize) -> DriverResult<&FakeElement> {
        self.elements
            .get(key)
            .and_then(|v| v.get(index))
            .ok_or_else(|| DriverError::NoSuchElement {
                locator: key.to_string(),
            })
    }
}

/// In-memory [`Driver`] implementation with a recorded call log
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Rc<RefCell<FakeDom>>,
}

impl FakeDriver {
    /// Create an empty fake
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element under the locator's key (repeat to build a list)
    pub fn add_element(&self, locator: &Locator, element: FakeElement) {
        self.state
            .borrow_mut()
            .elements
            .entry(locator.to_string())
            .or_default()
            .push(element);
    }

    /// Make every element under the locator visible
    pub fn show(&self, locator: &Locator) {
        self.set_displayed(locator, true);
    }

    /// Make every element under the locator hidden
    pub fn hide(&self, locator: &Locator) {
        self.set_displayed(locator, false);
    }

    /// Enable every element under the locator
    pub fn enable(&self, locator: &Locator) {
        self.set_enabled(locator, true);
    }

    /// Disable every element under the locator
    pub fn disable(&self, locator: &Locator) {
        self.set_enabled(locator, false);
    }

    fn set_displayed(&self, locator: &Locator, displayed: bool) {
        if let Some(elements) = self.state.borrow_mut().elements.get_mut(&locator.to_string()) {
            for element in elements {
                element.displayed = displayed;
            }
        }
    }

    fn set_enabled(&self, locator: &Locator, enabled: bool) {
        if let Some(elements) = self.state.borrow_mut().elements.get_mut(&locator.to_string()) {
            for element in elements {
                element.enabled = enabled;
            }
        }
    }

    /// Set the document title
    pub fn set_title(&self, title: impl Into<String>) {
        self.state.borrow_mut().title = title.into();
    }

    /// Fix the result of `script` for every execution
    pub fn set_script_result(&self, script: &str, value: serde_json::Value) {
        self.state
            .borrow_mut()
            .script_results
            .insert(script.to_string(), value);
    }

    /// Queue one result for `script`; queued values are consumed in order
    /// before any fixed result applies, and missing entries evaluate to null
    pub fn push_script_result(&self, script: &str, value: serde_json::Value) {
        self.state
            .borrow_mut()
            .script_queues
            .entry(script.to_string())
            .or_default()
            .push_back(value);
    }

    /// Reveal the locator's elements after `refreshes` more page refreshes
    ///
    /// Models backend indexing: content that only shows up on a fresh
    /// document once the backend has caught up.
    pub fn reveal_after_refreshes(&self, locator: &Locator, refreshes: usize) {
        self.state
            .borrow_mut()
            .reveals
            .insert(locator.to_string(), refreshes);
    }

    /// Every driver call recorded so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.borrow().calls.clone()
    }

    /// How many times the page was refreshed
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.state.borrow().refresh_count
    }

    /// Current frame nesting depth (0 = root document)
    #[must_use]
    pub fn frame_depth(&self) -> usize {
        self.state.borrow().frame_depth
    }
}

impl Driver for FakeDriver {
    fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut dom = self.state.borrow_mut();
        dom.url = url.to_string();
        dom.calls.push(DriverCall::Navigate(url.to_string()));
        Ok(())
    }

    fn refresh(&self) -> DriverResult<()> {
        let mut dom = self.state.borrow_mut();
        dom.refresh_count += 1;
        dom.calls.push(DriverCall::Refresh);

        let due: Vec<String> = dom
            .reveals
            .iter_mut()
            .filter_map(|(key, remaining)| {
                *remaining = remaining.saturating_sub(1);
                (*remaining == 0).then(|| key.clone())
            })
            .collect();
        for key in due {
            dom.reveals.remove(&key);
            if let Some(elements) = dom.elements.get_mut(&key) {
                for element in elements {
                    element.displayed = true;
                }
            }
        }
        Ok(())
    }

    fn current_url(&self) -> DriverResult<String> {
        Ok(self.state.borrow().url.clone())
    }

    fn title(&self) -> DriverResult<String> {
        Ok(self.state.borrow().title.clone())
    }

    fn execute_script(
        &self,
        script: &str,
        _args: &[serde_json::Value],
    ) -> DriverResult<serde_json::Value> {
        let mut dom = self.state.borrow_mut();
        dom.calls.push(DriverCall::ExecuteScript(script.to_string()));

        if let Some(queue) = dom.script_queues.get_mut(script) {
            if let Some(value) = queue.pop_front() {
                return Ok(value);
            }
        }
        Ok(dom
            .script_results
            .get(script)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    fn find(&self, locator: &Locator) -> DriverResult<ElementHandle> {
        let key = locator.to_string();
        let mut dom = self.state.borrow_mut();
        dom.calls.push(DriverCall::Find(key.clone()));

        let tag = dom.element(&key, 0)?.tag_name.clone();
        Ok(dom.alloc_handle(&key, 0, &tag))
    }

    fn find_all(&self, locator: &Locator) -> DriverResult<Vec<ElementHandle>> {
        let key = locator.to_string();
        let mut dom = self.state.borrow_mut();
        dom.calls.push(DriverCall::FindAll(key.clone()));

        let tags: Vec<String> = dom
            .elements
            .get(&key)
            .map(|v| v.iter().map(|e| e.tag_name.clone()).collect())
            .unwrap_or_default();
        Ok(tags
            .into_iter()
            .enumerate()
            .map(|(index, tag)| dom.alloc_handle(&key, index, &tag))
            .collect())
    }

    fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool> {
        let dom = self.state.borrow();
        let (key, index) = dom.lookup(element)?;
        Ok(dom.element(&key, index)?.displayed)
    }

    fn is_enabled(&self, element: &ElementHandle) -> DriverResult<bool> {
        let dom = self.state.borrow();
        let (key, index) = dom.lookup(element)?;
        Ok(dom.element(&key, index)?.enabled)
    }

    fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut dom = self.state.borrow_mut();
        let (key, index) = dom.lookup(element)?;
        dom.element(&key, index)?;
        dom.calls.push(DriverCall::Click(key));
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut dom = self.state.borrow_mut();
        let (key, index) = dom.lookup(element)?;
        dom.element(&key, index)?;
        dom.calls.push(DriverCall::Clear(key));
        Ok(())
    }

    fn type_text(&self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        let mut dom = self.state.borrow_mut();
        let (key, index) = dom.lookup(element)?;
        dom.element(&key, index)?;
        dom.calls.push(DriverCall::TypeText(key, text.to_string()));
        Ok(())
    }

    fn select_by_visible_text(&self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        let mut dom = self.state.borrow_mut();
        let (key, index) = dom.lookup(element)?;
        let has_option = dom
            .element(&key, index)?
            .options
            .iter()
            .any(|o| o == text);
        if !has_option {
            return Err(DriverError::NoSuchOption {
                value: text.to_string(),
            });
        }
        dom.calls
            .push(DriverCall::SelectOption(key, text.to_string()));
        Ok(())
    }

    fn switch_to_frame(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut dom = self.state.borrow_mut();
        let (key, index) = dom.lookup(element)?;
        dom.element(&key, index)?;
        dom.frame_depth += 1;
        dom.calls.push(DriverCall::SwitchToFrame(key));
        Ok(())
    }

    fn switch_to_default_content(&self) -> DriverResult<()> {
        let mut dom = self.state.borrow_mut();
        dom.frame_depth = 0;
        dom.calls.push(DriverCall::SwitchToDefault);
        Ok(())
    }

    fn set_implicit_timeout(&self, timeout: Duration) -> DriverResult<()> {
        self.state
            .borrow_mut()
            .calls
            .push(DriverCall::SetImplicitTimeout(timeout));
        Ok(())
    }

    fn set_page_load_timeout(&self, timeout: Duration) -> DriverResult<()> {
        self.state
            .borrow_mut()
            .calls
            .push(DriverCall::SetPageLoadTimeout(timeout));
        Ok(())
    }

    fn set_script_timeout(&self, timeout: Duration) -> DriverResult<()> {
        self.state
            .borrow_mut()
            .calls
            .push(DriverCall::SetScriptTimeout(timeout));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find_missing_element() {
        let fake = FakeDriver::new();
        let result = fake.find(&Locator::css("#nope"));
        assert!(matches!(result, Err(DriverError::NoSuchElement { .. })));
    }

    #[test]
    fn test_find_all_missing_is_empty_not_error() {
        let fake = FakeDriver::new();
        assert!(fake.find_all(&Locator::css("#nope")).unwrap().is_empty());
    }

    #[test]
    fn test_mutation_helpers() {
        let fake = FakeDriver::new();
        let locator = Locator::id("save");
        fake.add_element(&locator, FakeElement::new("button"));

        let handle = fake.find(&locator).unwrap();
        assert!(fake.is_displayed(&handle).unwrap());
        assert!(fake.is_enabled(&handle).unwrap());

        fake.hide(&locator);
        fake.disable(&locator);
        assert!(!fake.is_displayed(&handle).unwrap());
        assert!(!fake.is_enabled(&handle).unwrap());

        fake.show(&locator);
        fake.enable(&locator);
        assert!(fake.is_displayed(&handle).unwrap());
        assert!(fake.is_enabled(&handle).unwrap());
    }

    #[test]
    fn test_unknown_handle_is_stale() {
        let fake = FakeDriver::new();
        let ghost = ElementHandle::new("e999", "div");
        assert!(matches!(
            fake.is_displayed(&ghost),
            Err(DriverError::StaleElement { .. })
        ));
    }

    #[test]
    fn test_reveal_after_refreshes() {
        let fake = FakeDriver::new();
        let locator = Locator::css("#results");
        fake.add_element(&locator, FakeElement::new("div").hidden());
        fake.reveal_after_refreshes(&locator, 2);

        let handle = fake.find(&locator).unwrap();
        fake.refresh().unwrap();
        assert!(!fake.is_displayed(&handle).unwrap());
        fake.refresh().unwrap();
        assert!(fake.is_displayed(&handle).unwrap());
        assert_eq!(fake.refresh_count(), 2);
    }

    #[test]
    fn test_script_queue_consumed_before_fixed_result() {
        let fake = FakeDriver::new();
        fake.set_script_result("return x;", serde_json::json!("fixed"));
        fake.push_script_result("return x;", serde_json::json!("queued"));

        assert_eq!(
            fake.execute_script("return x;", &[]).unwrap(),
            serde_json::json!("queued")
        );
        assert_eq!(
            fake.execute_script("return x;", &[]).unwrap(),
            serde_json::json!("fixed")
        );
        assert_eq!(
            fake.execute_script("return y;", &[]).unwrap(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_clones_share_state() {
        let fake = FakeDriver::new();
        let observer = fake.clone();
        fake.navigate("https://example.com").unwrap();
        assert_eq!(
            observer.calls(),
            vec![DriverCall::Navigate("https://example.com".into())]
        );
        assert_eq!(observer.current_url().unwrap(), "https://example.com");
    }
}
