use super::media::{MediaElement, PlayRejection};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::HtmlAudioElement;

type RejectionHook = Rc<RefCell<Option<Box<dyn Fn(PlayRejection)>>>>;

/// [`MediaElement`] over the storefront's single `<audio>` tag.
#[derive(Clone)]
pub struct WebAudio {
    element: HtmlAudioElement,
    on_rejected: RejectionHook,
}

impl WebAudio {
    pub fn new(element: HtmlAudioElement) -> Self {
        if element.get_attribute("preload").is_none() {
            let _ = element.set_attribute("preload", "metadata");
        }
        Self {
            element,
            on_rejected: Rc::new(RefCell::new(None)),
        }
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }

    /// Called asynchronously whenever a `play()` promise rejects.
    pub fn set_rejection_handler(&self, handler: impl Fn(PlayRejection) + 'static) {
        *self.on_rejected.borrow_mut() = Some(Box::new(handler));
    }
}

fn rejection_from(err: &wasm_bindgen::JsValue) -> PlayRejection {
    err.dyn_ref::<web_sys::DomException>()
        .map(|exception| PlayRejection::from_exception_name(&exception.name()))
        .unwrap_or(PlayRejection::Failed)
}

impl MediaElement for WebAudio {
    fn set_src(&mut self, url: &str) {
        self.element.set_src(url);
    }

    fn load(&mut self) {
        self.element.load();
    }

    fn play(&mut self) {
        let hook = self.on_rejected.clone();
        let outcome = self.element.play();
        // Always report on a later task: the player is borrowed right now.
        wasm_bindgen_futures::spawn_local(async move {
            let rejection = match outcome {
                Ok(promise) => match wasm_bindgen_futures::JsFuture::from(promise).await {
                    Ok(_) => None,
                    Err(err) => Some(rejection_from(&err)),
                },
                Err(err) => Some(rejection_from(&err)),
            };
            if let Some(rejection) = rejection {
                if let Some(handler) = hook.borrow().as_ref() {
                    handler(rejection);
                }
            }
        });
    }

    fn pause(&mut self) {
        let _ = self.element.pause();
    }

    fn set_volume(&mut self, volume: f64) {
        self.element.set_volume(volume.clamp(0.0, 1.0));
    }

    fn volume(&self) -> f64 {
        self.element.volume()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn paused(&self) -> bool {
        self.element.paused()
    }
}
