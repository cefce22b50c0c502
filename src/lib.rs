// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod logging;
pub mod scene;

// MVC Architecture
pub mod model;
pub mod controller;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{ConfigError, Settings};
pub use controller::{CharacterController, FrameLoop, GroundProbe, InputState, OrbitCamera, PhysicsBody};

#[cfg(target_arch = "wasm32")]
mod wasm_entry {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::wasm_bindgen;
    use wasm_bindgen::JsValue;

    use crate::config::Settings;
    use crate::logging;
    use crate::web::{self, WebHost};

    thread_local! {
        static HOST: RefCell<Option<WebHost>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        logging::init();
        let (window, document, canvas) = web::init_canvas(800, 600)?;
        let host = WebHost::start(window, &document, &canvas, Settings::default())?;
        HOST.with(|h| *h.borrow_mut() = Some(host));
        Ok(())
    }

    /// Tear down the running controller: listeners, frame loop and diagnostics.
    #[wasm_bindgen]
    pub fn detach() {
        if let Some(host) = HOST.with(|h| h.borrow_mut().take()) {
            host.detach();
        }
    }
}
