//! Navigation watcher. Storefront themes move between pages through the
//! History API, plain `popstate`, or mechanisms that fire neither, so the
//! browser side patches `pushState`/`replaceState`, listens for `popstate`
//! and polls `location.href` once a second. All three report here and are
//! deduplicated by [`NavigationWatcher::observe`].

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub href: String,
    pub path: String,
}

impl Location {
    pub fn new(href: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavigationWatcher {
    last_href: String,
}

impl NavigationWatcher {
    pub fn new(initial_href: impl Into<String>) -> Self {
        Self {
            last_href: initial_href.into(),
        }
    }

    pub fn last_href(&self) -> &str {
        &self.last_href
    }

    /// True when `href` differs from the last one seen.
    pub fn observe(&mut self, href: &str) -> bool {
        if href == self.last_href {
            return false;
        }
        self.last_href = href.to_string();
        true
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::{current_location, install};

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::Location;
    use gloo_timers::callback::Interval;
    use std::rc::Rc;
    use wasm_bindgen::{closure::Closure, JsCast, JsValue};
    use web_sys::window;

    const POLL_INTERVAL_MS: u32 = 1000;
    const PATCHED_FLAG: &str = "__webexpMusicPlayerHistoryPatched";

    pub fn current_location() -> Option<Location> {
        let location = window()?.location();
        Some(Location {
            href: location.href().ok()?,
            path: location.pathname().ok()?,
        })
    }

    /// Report every detected navigation to `on_change`.
    pub fn install(on_change: Rc<dyn Fn(Location)>) {
        let Some(win) = window() else {
            return;
        };

        let notify: Rc<dyn Fn()> = {
            let on_change = on_change.clone();
            Rc::new(move || {
                if let Some(location) = current_location() {
                    on_change(location);
                }
            })
        };

        let already_patched = js_sys::Reflect::get(&win, &PATCHED_FLAG.into())
            .map(|value| value.is_truthy())
            .unwrap_or(false);
        if !already_patched {
            if let Ok(history) = win.history() {
                for method in ["pushState", "replaceState"] {
                    if let Err(err) = patch_history_method(&history, method, notify.clone()) {
                        log::warn!("could not wrap history.{method}: {err:?}");
                    }
                }
                let _ = js_sys::Reflect::set(&win, &PATCHED_FLAG.into(), &JsValue::TRUE);
            }
        }

        let popstate_cb = {
            let notify = notify.clone();
            Closure::wrap(Box::new(move || notify()) as Box<dyn FnMut()>)
        };
        let _ = win
            .add_event_listener_with_callback("popstate", popstate_cb.as_ref().unchecked_ref());
        popstate_cb.forget();

        Interval::new(POLL_INTERVAL_MS, move || notify()).forget();
    }

    fn patch_history_method(
        history: &web_sys::History,
        name: &str,
        notify: Rc<dyn Fn()>,
    ) -> Result<(), JsValue> {
        let original: js_sys::Function =
            js_sys::Reflect::get(history, &name.into())?.dyn_into()?;
        let target = history.clone();
        let wrapper = Closure::wrap(Box::new(
            move |state: JsValue, title: JsValue, url: JsValue| -> Result<JsValue, JsValue> {
                let result = original.call3(&target, &state, &title, &url);
                notify();
                result
            },
        )
            as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);
        js_sys::Reflect::set(history, &name.into(), wrapper.as_ref())?;
        wrapper.forget();
        Ok(())
    }
}
