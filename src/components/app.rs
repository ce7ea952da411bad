//! Browser entry point. Resolves the theme's markup and the `<audio>` tag,
//! builds one shared [`MusicPlayer`] and routes every DOM, media and timer
//! callback into it.

use crate::api::http::{fetch_playlists, send_analytics};
use crate::api::storefront::{
    select_playlist, PlaylistSelection, ProbeRequest, StorefrontEndpoints,
    EMPTY_PLAYLISTS_MESSAGE,
};
use crate::components::audio_manager::web_audio::WebAudio;
use crate::components::navigation::{self, Location};
use crate::components::player::controls::{
    seek_fraction, shortcut_action_from_key, slider_volume, ShortcutAction,
};
use crate::components::player::dom_view::{DomBindings, DomPlayerView, TRACK_ITEM_SELECTOR};
use crate::components::player::{HostEffect, MusicPlayer};
use crate::config::{self, BootstrapConfig};
use crate::db::BrowserStorage;
use crate::diagnostics;
use crate::error::{PlayerError, PlayerResult};
use gloo_timers::callback::Timeout;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    window, AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlAudioElement,
    KeyboardEvent, MouseEvent, VisibilityState,
};

const RESIZE_DEBOUNCE_MS: u32 = 250;
const GESTURE_EVENTS: [&str; 3] = ["click", "touchstart", "keydown"];

type WebPlayer = MusicPlayer<WebAudio, DomPlayerView, BrowserStorage>;

thread_local! {
    static GESTURE_RETRY: RefCell<Option<GestureRetry>> = const { RefCell::new(None) };
    static RESIZE_TIMER: RefCell<Option<Timeout>> = const { RefCell::new(None) };
}

#[derive(Clone)]
struct Runtime {
    player: Rc<RefCell<WebPlayer>>,
    endpoints: Rc<StorefrontEndpoints>,
}

impl Runtime {
    /// Run `action` against the player, then carry out whatever it queued.
    /// Re-entrant callbacks are dropped rather than allowed to panic.
    fn dispatch<R>(&self, action: impl FnOnce(&mut WebPlayer) -> R) -> Option<R> {
        let (result, effects) = {
            let Ok(mut player) = self.player.try_borrow_mut() else {
                log::debug!("player busy, dropping re-entrant callback");
                return None;
            };
            let result = action(&mut player);
            (result, player.take_effects())
        };
        for effect in effects {
            self.run_effect(effect);
        }
        Some(result)
    }

    fn run_effect(&self, effect: HostEffect) {
        match effect {
            HostEffect::ArmGestureRetry => arm_gesture_retry(self.clone()),
            HostEffect::ScheduleResume(delay) => {
                let runtime = self.clone();
                Timeout::new(millis(delay), move || {
                    runtime.dispatch(|player| player.resume_playback());
                })
                .forget();
            }
            HostEffect::ProbeDurations(requests) => {
                for request in requests {
                    let runtime = self.clone();
                    Timeout::new(millis(request.delay), move || probe_duration(runtime, request))
                        .forget();
                }
            }
            HostEffect::SendAnalytics(event) => {
                let endpoints = self.endpoints.clone();
                spawn_local(async move {
                    if let Err(err) = send_analytics(&endpoints, &event).await {
                        log::debug!("analytics event not recorded: {err}");
                    }
                });
            }
        }
    }
}

fn millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}

fn listen<T: AsRef<EventTarget>>(target: &T, event: &str, handler: impl FnMut(Event) + 'static) {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    let _ = target
        .as_ref()
        .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
    callback.forget();
}

fn listen_once<T: AsRef<EventTarget>>(
    target: &T,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    let _ = target
        .as_ref()
        .add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        );
    callback.forget();
}

/// Entry point called from the wasm start hook.
pub fn launch() {
    let config = config::load_from_page();
    diagnostics::init_logging(config.log_level.as_deref());
    if let Err(err) = start_player(config) {
        log::warn!("music player not started: {err}");
    }
}

fn start_player(config: BootstrapConfig) -> PlayerResult<()> {
    config.validate()?;
    let document = window()
        .and_then(|w| w.document())
        .ok_or(PlayerError::MissingElement("document"))?;
    let audio_element = document
        .query_selector("audio")
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<HtmlAudioElement>().ok())
        .ok_or(PlayerError::MissingElement("audio"))?;

    let bindings = DomBindings::resolve(&document);
    let audio = WebAudio::new(audio_element.clone());
    let location = navigation::current_location().unwrap_or_default();

    let BootstrapConfig {
        shop,
        proxy_path,
        settings,
        ..
    } = config;
    let endpoints = StorefrontEndpoints::new(shop.clone(), proxy_path);
    let player = MusicPlayer::new(
        audio.clone(),
        DomPlayerView::new(bindings.clone()),
        BrowserStorage::new(),
        settings,
        shop,
        &location,
    );
    let runtime = Runtime {
        player: Rc::new(RefCell::new(player)),
        endpoints: Rc::new(endpoints),
    };

    {
        let runtime = runtime.clone();
        audio.set_rejection_handler(move |rejection| {
            runtime.dispatch(|player| player.on_play_rejected(rejection));
        });
    }
    bind_media_events(&runtime, &audio_element);
    bind_controls(&runtime, &bindings);
    bind_modal(&runtime, &bindings);
    bind_shortcuts(&runtime, &document);
    bind_page_lifecycle(&runtime, &document);
    {
        let runtime = runtime.clone();
        navigation::install(Rc::new(move |location: Location| {
            runtime.dispatch(|player| player.on_location_change(&location));
        }));
    }

    spawn_local(load_playlist(runtime));
    Ok(())
}

async fn load_playlist(runtime: Runtime) {
    let selection = match fetch_playlists(&runtime.endpoints).await {
        Ok(response) => select_playlist(response),
        Err(err) => {
            log::warn!("could not load playlists: {err}");
            PlaylistSelection::Empty(EMPTY_PLAYLISTS_MESSAGE)
        }
    };
    runtime.dispatch(|player| player.on_playlist_loaded(selection));
}

fn bind_media_events(runtime: &Runtime, audio: &HtmlAudioElement) {
    let handlers: [(&str, fn(&mut WebPlayer)); 5] = [
        ("play", WebPlayer::on_media_play),
        ("pause", WebPlayer::on_media_pause),
        ("timeupdate", WebPlayer::on_time_update),
        ("loadedmetadata", WebPlayer::on_loaded_metadata),
        ("ended", WebPlayer::on_ended),
    ];
    for (name, handler) in handlers {
        let runtime = runtime.clone();
        listen(audio, name, move |_| {
            runtime.dispatch(handler);
        });
    }
}

fn bind_controls(runtime: &Runtime, bindings: &DomBindings) {
    let on_click = |elements: &[Element], action: fn(&mut WebPlayer)| {
        for element in elements {
            let runtime = runtime.clone();
            listen(element, "click", move |event| {
                event.prevent_default();
                runtime.dispatch(action);
            });
        }
    };
    on_click(&bindings.play_buttons, WebPlayer::toggle_play);
    on_click(&bindings.prev_buttons, WebPlayer::prev);
    on_click(&bindings.next_buttons, WebPlayer::next);
    on_click(&bindings.shuffle_buttons, WebPlayer::toggle_shuffle);
    on_click(&bindings.volume_buttons, WebPlayer::toggle_mute);

    for slider in &bindings.volume_sliders {
        let runtime = runtime.clone();
        let input = slider.clone();
        listen(slider, "input", move |_| {
            let max = input.max().parse::<f64>().unwrap_or(1.0);
            if let Some(volume) = slider_volume(input.value_as_number(), max) {
                runtime.dispatch(|player| player.set_volume(volume));
            }
        });
    }

    for bar in &bindings.progress_bars {
        let runtime = runtime.clone();
        let target = bar.clone();
        listen(bar, "click", move |event| {
            let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let rect = target.get_bounding_client_rect();
            if let Some(fraction) = seek_fraction(f64::from(mouse.client_x()), rect.left(), rect.width())
            {
                runtime.dispatch(|player| player.seek(fraction));
            }
        });
    }

    for list in &bindings.track_lists {
        let runtime = runtime.clone();
        listen(list, "click", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let Ok(Some(item)) = target.closest(TRACK_ITEM_SELECTOR) else {
                return;
            };
            let Some(index) = item
                .get_attribute("data-index")
                .and_then(|value| value.parse::<usize>().ok())
            else {
                return;
            };
            runtime.dispatch(|player| player.select_track(index));
        });
    }
}

fn bind_modal(runtime: &Runtime, bindings: &DomBindings) {
    let Some(modal) = bindings.modal.clone() else {
        return;
    };

    let openers = bindings.mini_expand_buttons.iter().cloned().chain(
        bindings
            .toggle_button
            .iter()
            .map(|button| button.clone().unchecked_into::<Element>()),
    );
    for opener in openers {
        let runtime = runtime.clone();
        let bindings = bindings.clone();
        let modal = modal.clone();
        listen(&opener, "click", move |event| {
            event.prevent_default();
            let open = !modal.class_list().contains("is-open");
            bindings.set_modal_open(open);
            runtime.dispatch(|player| player.refresh_layout());
        });
    }
    for closer in &bindings.close_modal_buttons {
        let bindings = bindings.clone();
        listen(closer, "click", move |event| {
            event.prevent_default();
            bindings.set_modal_open(false);
        });
    }
}

fn bind_shortcuts(runtime: &Runtime, document: &Document) {
    let runtime = runtime.clone();
    listen(document, "keydown", move |event| {
        let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        let Some(action) = shortcut_action_from_key(key) else {
            return;
        };
        event.prevent_default();
        runtime.dispatch(|player| match action {
            ShortcutAction::TogglePlay => player.toggle_play(),
            ShortcutAction::Next => player.next(),
            ShortcutAction::Previous => player.prev(),
        });
    });
}

fn bind_page_lifecycle(runtime: &Runtime, document: &Document) {
    {
        let runtime = runtime.clone();
        let doc = document.clone();
        listen(document, "visibilitychange", move |_| {
            if doc.visibility_state() == VisibilityState::Hidden {
                runtime.dispatch(|player| player.persist_now());
            }
        });
    }

    let Some(win) = window() else {
        return;
    };
    for name in ["pagehide", "beforeunload"] {
        let runtime = runtime.clone();
        listen(&win, name, move |_| {
            runtime.dispatch(|player| player.persist_now());
        });
    }

    let runtime = runtime.clone();
    listen(&win, "resize", move |_| {
        let runtime = runtime.clone();
        let timer = Timeout::new(RESIZE_DEBOUNCE_MS, move || {
            runtime.dispatch(|player| player.refresh_layout());
        });
        // Replacing the pending timer cancels it.
        RESIZE_TIMER.with(|slot| *slot.borrow_mut() = Some(timer));
    });
}

/// Capture-phase listeners for the first interaction after a refused
/// autoplay. Dropping this detaches them.
struct GestureRetry {
    target: EventTarget,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

impl Drop for GestureRetry {
    fn drop(&mut self) {
        for (name, callback) in &self.listeners {
            let _ = self.target.remove_event_listener_with_callback_and_bool(
                name,
                callback.as_ref().unchecked_ref(),
                false,
            );
        }
    }
}

fn arm_gesture_retry(runtime: Runtime) {
    let Some(document) = window().and_then(|w| w.document()) else {
        return;
    };
    GESTURE_RETRY.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let listeners = GESTURE_EVENTS
            .iter()
            .map(|&name| {
                let runtime = runtime.clone();
                let callback = Closure::wrap(Box::new(move |_event: Event| {
                    // Detach on a later task; this closure is still running.
                    spawn_local(async {
                        let _ = GESTURE_RETRY.with(|slot| slot.borrow_mut().take());
                    });
                    runtime.dispatch(|player| player.on_user_gesture());
                }) as Box<dyn FnMut(Event)>);
                // Bubble phase: the player's own controls handle the event first.
                let _ = document.add_event_listener_with_callback_and_bool(
                    name,
                    callback.as_ref().unchecked_ref(),
                    false,
                );
                (name, callback)
            })
            .collect();
        *slot.borrow_mut() = Some(GestureRetry {
            target: document.clone().into(),
            listeners,
        });
    });
}

/// Read a track's duration through a detached element that only fetches
/// metadata, then discard it.
fn probe_duration(runtime: Runtime, request: ProbeRequest) {
    let Ok(probe) = HtmlAudioElement::new() else {
        return;
    };
    probe.set_preload("metadata");

    let finish: Rc<dyn Fn(f64)> = {
        let probe = probe.clone();
        let done = Rc::new(Cell::new(false));
        let track_id = request.track_id.clone();
        Rc::new(move |duration: f64| {
            if done.replace(true) {
                return;
            }
            let _ = probe.remove_attribute("src");
            probe.load();
            runtime.dispatch(|player| player.on_duration_probed(&track_id, duration));
        })
    };

    {
        let finish = finish.clone();
        let element = probe.clone();
        listen_once(&probe, "loadedmetadata", move |_| finish(element.duration()));
    }
    {
        let url = request.audio_url.clone();
        listen_once(&probe, "error", move |_| {
            log::debug!("duration probe failed for {url}");
            finish(0.0);
        });
    }
    probe.set_src(&request.audio_url);
}
