//! Flash Buddy entry point
//!
//! On the web the page drives everything through the `FlashBuddy` export.
//! The native build walks the bridge's startup paths against an in-memory
//! store and prints what the runtime would receive.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use flash_buddy::port::persist_channel;
    use flash_buddy::{MemoryStore, RuntimeMessage, STATE_CACHE_KEY, Snapshot, StateBridge};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Flash Buddy (native) starting...");
    log::info!("Native mode has no browser storage - build for wasm32 for the web version");

    let print = |m: RuntimeMessage| println!("  runtime <- {}", m.to_payload());

    let mut saved = MemoryStore::new();
    saved.insert(STATE_CACHE_KEY, r#"{"decks":[{"name":"verbs","cards":12}]}"#);
    let mut corrupt = MemoryStore::new();
    corrupt.insert(STATE_CACHE_KEY, "{not json");

    let scenarios = [
        ("fresh store", MemoryStore::new()),
        ("saved state", saved),
        ("corrupt state", corrupt),
        ("blocked store", MemoryStore::blocked()),
    ];

    for (name, store) in scenarios {
        println!("\n{}:", name);
        let (requests, receiver) = persist_channel();
        let bridge = match StateBridge::new(store, Default::default()) {
            Ok(bridge) => bridge,
            Err(e) => {
                log::error!("{}", e);
                continue;
            }
        };
        let Some(mut subscription) = bridge.start(&print, receiver) else {
            continue;
        };

        let state = Snapshot::new(serde_json::json!({ "decks": [], "scenario": name }));
        if requests.send(state).is_ok() {
            println!("  persisted {} snapshot(s)", subscription.pump());
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is flash_buddy::web, this is just to satisfy the compiler
}
