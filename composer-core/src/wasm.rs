//! WebAssembly bindings for composer-core.
//!
//! The browser host owns the pickers and storage. It passes every event to
//! [`WasmComposer::handle_event`] as JSON and carries out the returned
//! requests.

use wasm_bindgen::prelude::*;

use crate::{Composer, Event};

/// Initialize the composer WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
}

/// Composer instance for WASM.
#[wasm_bindgen]
pub struct WasmComposer {
    composer: Composer,
}

#[wasm_bindgen]
impl WasmComposer {
    /// Create a composer with the default display configuration.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            composer: Composer::default(),
        }
    }

    /// Handle one JSON event and return the resulting requests as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error string if the event cannot be decoded; the composer
    /// state is left untouched.
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, json: &str) -> Result<String, String> {
        let event = Event::from_json(json).map_err(|e| e.to_string())?;
        let requests = self.composer.handle(event);
        serde_json::to_string(&requests).map_err(|e| e.to_string())
    }

    /// Get the session model as JSON, or an empty string if it cannot be
    /// serialized.
    #[wasm_bindgen(js_name = getModelJson)]
    #[must_use]
    pub fn get_model_json(&self) -> String {
        match self.composer.model().to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize session model: {e}");
                String::new()
            }
        }
    }

    /// Get the flattened geometry of one character as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if `identity` is not a single character or
    /// is unknown.
    #[wasm_bindgen(js_name = getGeometryJson)]
    pub fn get_geometry_json(&self, identity: &str) -> Result<String, String> {
        let mut chars = identity.chars();
        let (Some(identity), None) = (chars.next(), chars.next()) else {
            return Err(format!("expected a single character, got {identity:?}"));
        };
        let geometry = self
            .composer
            .render_geometry(identity)
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&geometry).map_err(|e| e.to_string())
    }

    /// Get the SVG text of one simple character, if stored.
    #[wasm_bindgen(js_name = getArtwork)]
    #[must_use]
    pub fn get_artwork(&self, identity: char) -> Option<String> {
        self.composer
            .assets()
            .get(identity)
            .map(|artwork| artwork.source().to_string())
    }
}

impl Default for WasmComposer {
    fn default() -> Self {
        Self::new()
    }
}
