// Shared state handed to every request handler
use std::sync::Arc;

use crate::config::CardioidConfig;
use crate::generators::Canvas;

/// Read-only per-process settings. Requests never share mutable state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CardioidConfig>,
    pub canvas: Canvas,
}

impl AppState {
    pub fn new(config: CardioidConfig) -> crate::error::Result<Self> {
        let canvas = Canvas::from_config(&config.render)?;
        Ok(Self {
            config: Arc::new(config),
            canvas,
        })
    }
}
