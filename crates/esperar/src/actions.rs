//! Verify-then-act wrappers around UI interactions.
//!
//! Every operation here performs its precondition check exactly once, and
//! only on success performs the side effect; on failure it raises the
//! specific [`EsperarError`] variant for that operation and leaves the page
//! untouched. Nothing retries the action itself — retry, if wanted, belongs
//! to the caller.
//!
//! [`Actions`] is a capability object composed into a page at construction;
//! there is no inheritance hierarchy behind it.

use crate::driver::{DriverError, ElementHandle, Session};
use crate::page::ElementRef;
use crate::result::{EsperarError, EsperarResult};
use crate::wait::{WaitProfiles, Waiter};

/// Script probed by [`Actions::wait_for_jquery_idle`]: truthy once jQuery is
/// present and has no active requests
pub const JQUERY_IDLE_SCRIPT: &str = "return !!window.jQuery && window.jQuery.active == 0;";

/// Verify-then-act operations over one session
pub struct Actions<'s> {
    session: &'s Session,
    waiter: Waiter,
    profiles: WaitProfiles,
}

impl std::fmt::Debug for Actions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actions")
            .field("profiles", &self.profiles)
            .finish_non_exhaustive()
    }
}

impl<'s> Actions<'s> {
    /// Create an action wrapper with default wait profiles
    #[must_use]
    pub fn new(session: &'s Session) -> Self {
        Self::with_profiles(session, WaitProfiles::default())
    }

    /// Create an action wrapper with custom wait profiles
    #[must_use]
    pub fn with_profiles(session: &'s Session, profiles: WaitProfiles) -> Self {
        Self {
            session,
            waiter: Waiter::new(),
            profiles,
        }
    }

    /// The wait profiles in effect
    #[must_use]
    pub const fn profiles(&self) -> &WaitProfiles {
        &self.profiles
    }

    fn resolve(&self, element: &ElementRef) -> Result<ElementHandle, DriverError> {
        element.resolve(self.session)
    }

    /// Non-throwing presence probe
    #[must_use]
    pub fn is_present(&self, element: &ElementRef) -> bool {
        match self.resolve(element) {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!(element = element.name(), error = %e, "presence probe failed");
                false
            }
        }
    }

    /// Clear the element and type `text` into it
    ///
    /// Precondition: the element resolves and is displayed. On failure the
    /// input is never touched.
    pub fn enter_text(&self, element: &ElementRef, text: &str) -> EsperarResult<()> {
        let handle = match self.resolve(element) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(element = element.name(), error = %e, "text element not found");
                return Err(EsperarError::TextEntryFailed {
                    element: element.name().to_string(),
                });
            }
        };
        let displayed = self
            .session
            .driver()
            .is_displayed(&handle)
            .unwrap_or(false);
        if !displayed {
            tracing::warn!(element = element.name(), "text element not displayed");
            return Err(EsperarError::TextEntryFailed {
                element: element.name().to_string(),
            });
        }
        self.session.driver().clear(&handle)?;
        self.session.driver().type_text(&handle, text)?;
        Ok(())
    }

    /// Click the element
    ///
    /// Absence is checked before enablement: an absent element reports
    /// [`EsperarError::ElementNotFound`], never `ClickNotAllowed`.
    pub fn click(&self, element: &ElementRef) -> EsperarResult<()> {
        let Ok(handle) = self.resolve(element) else {
            tracing::warn!(element = element.name(), "click target not found");
            return Err(EsperarError::ElementNotFound {
                element: element.name().to_string(),
            });
        };
        if self.session.driver().is_enabled(&handle)? {
            self.session.driver().click(&handle)?;
            Ok(())
        } else {
            tracing::warn!(element = element.name(), "click target not enabled");
            Err(EsperarError::ClickNotAllowed {
                element: element.name().to_string(),
            })
        }
    }

    /// Click the `index`-th element matching the ref's locator
    ///
    /// The whole list is re-resolved on each call; a missing list, an
    /// out-of-range index, or a hidden entry all report
    /// [`EsperarError::ClickNotAllowed`].
    pub fn click_by_index(&self, element: &ElementRef, index: usize) -> EsperarResult<()> {
        let not_allowed = || EsperarError::ClickNotAllowed {
            element: format!("{}[{index}]", element.name()),
        };

        let handles = self
            .session
            .driver()
            .find_all(element.locator())
            .map_err(|e| {
                tracing::warn!(element = element.name(), error = %e, "list did not resolve");
                not_allowed()
            })?;
        let handle = handles.get(index).ok_or_else(not_allowed)?;
        let displayed = self.session.driver().is_displayed(handle).unwrap_or(false);
        if !displayed {
            return Err(not_allowed());
        }
        self.session.driver().click(handle)?;
        Ok(())
    }

    /// Click an icon element, reporting the human-readable `label` on failure
    pub fn click_icon(&self, element: &ElementRef, label: &str) -> EsperarResult<()> {
        let Ok(handle) = self.resolve(element) else {
            tracing::warn!(icon = label, "icon not found");
            return Err(EsperarError::IconNotFound {
                label: label.to_string(),
            });
        };
        self.session.driver().click(&handle)?;
        Ok(())
    }

    /// Select a dropdown option by its visible text
    ///
    /// A failed lookup (of the dropdown itself or of the option) is wrapped
    /// into [`EsperarError::DropdownValueNotFound`] with the driver failure
    /// as cause; no option is selected in that case.
    pub fn select_dropdown_text(&self, element: &ElementRef, value: &str) -> EsperarResult<()> {
        let wrap = |source: DriverError| {
            tracing::warn!(
                element = element.name(),
                value,
                error = %source,
                "dropdown option lookup failed"
            );
            EsperarError::DropdownValueNotFound {
                element: element.name().to_string(),
                value: value.to_string(),
                source,
            }
        };

        let handle = self.resolve(element).map_err(wrap)?;
        self.session
            .driver()
            .select_by_visible_text(&handle, value)
            .map_err(wrap)
    }

    /// Switch the session context into a frame element
    ///
    /// If the frame element is absent the context is left unchanged.
    pub fn switch_to_frame(&self, element: &ElementRef) -> EsperarResult<()> {
        let Ok(handle) = self.resolve(element) else {
            tracing::warn!(element = element.name(), "iframe not found");
            return Err(EsperarError::IFrameNotFound {
                element: element.name().to_string(),
            });
        };
        self.session.driver().switch_to_frame(&handle)?;
        Ok(())
    }

    /// Switch the session context back to the root document
    pub fn switch_back_from_frame(&self) -> EsperarResult<()> {
        self.session.switch_to_default_content()?;
        Ok(())
    }

    /// Block until the element is displayed (element-visible profile)
    ///
    /// This is a hard wait: exhaustion raises
    /// [`EsperarError::ElementNotVisible`] because the caller is about to act
    /// on the element and cannot proceed safely.
    pub fn wait_visible(&self, element: &ElementRef) -> EsperarResult<ElementHandle> {
        let spec = self.profiles.element_visible;
        let what = format!("element '{}' visible", element.name());
        self.waiter
            .wait_until(&spec, &what, || {
                self.resolve(element)
                    .ok()
                    .filter(|h| self.session.driver().is_displayed(h).unwrap_or(false))
            })
            .map_err(|e| match e {
                EsperarError::WaitTimedOut { .. } => EsperarError::ElementNotVisible {
                    element: element.name().to_string(),
                },
                other => other,
            })
    }

    /// Block until backend indexing settles and the element is displayed
    ///
    /// The probe is deliberately side-effecting: each poll refreshes the page
    /// first, then re-resolves the element, because indexed content only
    /// appears on a fresh document.
    pub fn wait_for_indexing(&self, element: &ElementRef) -> EsperarResult<ElementHandle> {
        let spec = self.profiles.indexing;
        let what = format!("indexing of '{}' settled", element.name());
        self.waiter.wait_until(&spec, &what, || {
            if let Err(e) = self.session.refresh() {
                tracing::warn!(error = %e, "refresh during indexing wait failed");
                return None;
            }
            self.resolve(element)
                .ok()
                .filter(|h| self.session.driver().is_displayed(h).unwrap_or(false))
        })
    }

    /// Block until `script` evaluates truthy (script-readiness profile)
    pub fn wait_for_script_ready(&self, script: &str) -> EsperarResult<()> {
        let spec = self.profiles.script_ready;
        self.waiter.wait_until(&spec, "script readiness", || {
            match self.session.execute_script(script, &[]) {
                Ok(value) if is_truthy(&value) => Some(()),
                Ok(_) => None,
                Err(e) => {
                    tracing::trace!(error = %e, "readiness script failed; re-polling");
                    None
                }
            }
        })
    }

    /// Block until jQuery reports no active requests
    pub fn wait_for_jquery_idle(&self) -> EsperarResult<()> {
        self.wait_for_script_ready(JQUERY_IDLE_SCRIPT)
    }

    /// Scroll the element into the viewport
    pub fn scroll_to_element(&self, element: &ElementRef) -> EsperarResult<()> {
        let Ok(handle) = self.resolve(element) else {
            return Err(EsperarError::ElementNotFound {
                element: element.name().to_string(),
            });
        };
        self.session.scroll_into_view(&handle)?;
        Ok(())
    }

    /// Scroll to the bottom of the document
    pub fn scroll_to_page_bottom(&self) -> EsperarResult<()> {
        self.session.scroll_to_bottom()?;
        Ok(())
    }
}

pub(crate) fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}
