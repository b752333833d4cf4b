//! Offline-caching service worker registration
//!
//! Only the "installed" notice matters here: a freshly installed worker with
//! a controller already in place means new content is waiting, which the
//! runtime hears about as [`RuntimeMessage::UpdateAvailable`].

use crate::port::{RuntimeMessage, RuntimePort};

/// What an installing worker reaching a new state means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// New content replaces an existing controller on next load
    UpdateAvailable,
    /// First install, content is now cached for offline use
    ContentCached,
}

pub fn install_outcome(installed: bool, has_controller: bool) -> Option<InstallOutcome> {
    match (installed, has_controller) {
        (false, _) => None,
        (true, true) => Some(InstallOutcome::UpdateAvailable),
        (true, false) => Some(InstallOutcome::ContentCached),
    }
}

/// Handle an installing worker's state change
pub fn notify_state_change<P: RuntimePort + ?Sized>(
    installed: bool,
    has_controller: bool,
    port: &P,
) -> Option<InstallOutcome> {
    let outcome = install_outcome(installed, has_controller)?;
    match outcome {
        InstallOutcome::UpdateAvailable => {
            log::info!("New content is available; it will be used when all tabs are closed");
            port.deliver(RuntimeMessage::UpdateAvailable);
        }
        InstallOutcome::ContentCached => {
            log::info!("Content is cached for offline use");
        }
    }
    Some(outcome)
}

#[cfg(target_arch = "wasm32")]
pub use web::register;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{ServiceWorkerContainer, ServiceWorkerRegistration, ServiceWorkerState};

    use super::notify_state_change;
    use crate::config::WorkerConfig;
    use crate::port::RuntimePort;

    /// Register (or unregister, when disabled) the service worker
    pub fn register(config: &WorkerConfig, port: Rc<dyn RuntimePort>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let navigator = window.navigator();
        let supported = js_sys::Reflect::has(&navigator, &JsValue::from_str("serviceWorker"))
            .unwrap_or(false);
        if !supported {
            log::info!("Service workers not supported");
            return;
        }

        let container = navigator.service_worker();
        if !config.enabled {
            unregister(container);
            return;
        }

        let promise = container.register(&config.script_url);
        wasm_bindgen_futures::spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(registration) => {
                    log::info!("Service worker registered");
                    watch_updates(registration.unchecked_into(), container, port);
                }
                Err(e) => log::error!("Error during service worker registration: {:?}", e),
            }
        });
    }

    fn watch_updates(
        registration: ServiceWorkerRegistration,
        container: ServiceWorkerContainer,
        port: Rc<dyn RuntimePort>,
    ) {
        let reg = registration.clone();
        let on_update_found = Closure::<dyn FnMut()>::new(move || {
            let Some(installing) = reg.installing() else {
                return;
            };
            let worker = installing.clone();
            let container = container.clone();
            let port = port.clone();
            let on_state_change = Closure::<dyn FnMut()>::new(move || {
                let installed = worker.state() == ServiceWorkerState::Installed;
                let has_controller = container.controller().is_some();
                notify_state_change(installed, has_controller, port.as_ref());
            });
            installing.set_onstatechange(Some(on_state_change.as_ref().unchecked_ref()));
            on_state_change.forget();
        });
        registration.set_onupdatefound(Some(on_update_found.as_ref().unchecked_ref()));
        on_update_found.forget();
    }

    fn unregister(container: ServiceWorkerContainer) {
        let ready = match container.ready() {
            Ok(ready) => ready,
            Err(e) => {
                log::warn!("Service worker not ready: {:?}", e);
                return;
            }
        };
        wasm_bindgen_futures::spawn_local(async move {
            let Ok(registration) = JsFuture::from(ready).await else {
                return;
            };
            let registration: ServiceWorkerRegistration = registration.unchecked_into();
            match registration.unregister() {
                Ok(promise) => {
                    let _ = JsFuture::from(promise).await;
                    log::info!("Service worker unregistered");
                }
                Err(e) => log::warn!("Failed to unregister service worker: {:?}", e),
            }
        });
    }
}
