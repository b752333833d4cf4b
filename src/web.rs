//! JavaScript entry points
//!
//! ```js
//! import init, { FlashBuddy } from "./pkg/flash_buddy.js";
//! await init();
//! const bridge = new FlashBuddy((msg) => app.ports.restoredStateCache.send(msg));
//! app.ports.storeStateCache.subscribe((data) => bridge.storeState(data));
//! ```

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::bridge::{StateBridge, Subscription};
use crate::config::BridgeConfig;
use crate::port::{PersistSender, RuntimeMessage, RuntimePort, persist_channel};
use crate::snapshot::Snapshot;
use crate::storage::LocalStorage;
use crate::worker;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
}

/// Delivers messages to a JS callback as plain objects
struct JsPort {
    callback: js_sys::Function,
}

impl RuntimePort for JsPort {
    fn deliver(&self, message: RuntimeMessage) {
        let payload = match js_sys::JSON::parse(&message.to_payload().to_string()) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Failed to build runtime payload: {:?}", e);
                return;
            }
        };
        if let Err(e) = self.callback.call1(&JsValue::NULL, &payload) {
            log::warn!("Runtime callback threw: {:?}", e);
        }
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn stringify(value: &JsValue) -> Option<String> {
    js_sys::JSON::stringify(value).ok()?.as_string()
}

fn parse_config(config: &JsValue) -> Result<BridgeConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(BridgeConfig::default());
    }
    let json = stringify(config).ok_or_else(|| to_js("config is not serializable"))?;
    BridgeConfig::from_json(&json).map_err(to_js)
}

fn init_logging(config: &BridgeConfig) {
    let level = config.log_level().unwrap_or_else(|e| {
        web_sys::console::warn_1(&to_js(&e));
        log::Level::Info
    });
    if console_log::init_with_level(level).is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Bridge handle owned by the page
#[wasm_bindgen]
pub struct FlashBuddy {
    requests: Option<PersistSender>,
    subscription: Option<Subscription<LocalStorage>>,
}

#[wasm_bindgen]
impl FlashBuddy {
    /// Start the bridge and register the service worker.
    ///
    /// `on_message` receives the restored state (or a sentinel) right away,
    /// and again whenever a worker update is installed.
    #[wasm_bindgen(constructor)]
    pub fn new(on_message: js_sys::Function, config: JsValue) -> Result<FlashBuddy, JsValue> {
        let config = parse_config(&config)?;
        init_logging(&config);

        let port: Rc<dyn RuntimePort> = Rc::new(JsPort {
            callback: on_message,
        });
        let (requests, receiver) = persist_channel();

        let subscription = match LocalStorage::open() {
            Ok(store) => StateBridge::new(store, config.storage_key())
                .map_err(to_js)?
                .start(port.as_ref(), receiver),
            Err(e) => {
                log::warn!("Local storage not available: {}", e);
                port.deliver(RuntimeMessage::StorageNotAvailable);
                None
            }
        };

        worker::register(&config.service_worker, port);

        Ok(FlashBuddy {
            requests: subscription.is_some().then_some(requests),
            subscription,
        })
    }

    #[wasm_bindgen(getter, js_name = storageAvailable)]
    pub fn storage_available(&self) -> bool {
        self.subscription.is_some()
    }

    /// Persist application state. Ignored when storage is unavailable.
    #[wasm_bindgen(js_name = storeState)]
    pub fn store_state(&mut self, data: JsValue) {
        let (Some(requests), Some(subscription)) = (&self.requests, &mut self.subscription) else {
            return;
        };
        let snapshot = match stringify(&data).map(|json| Snapshot::from_json(&json)) {
            Some(Ok(snapshot)) => snapshot,
            Some(Err(e)) => {
                log::warn!("Dropped state that is not JSON: {}", e);
                return;
            }
            None => {
                log::warn!("Dropped state that cannot be serialized");
                return;
            }
        };
        if requests.send(snapshot).is_ok() {
            subscription.pump();
        }
    }
}
