// Application state module
// Immutable data shared by every connection

use std::fs;
use std::sync::atomic::AtomicUsize;

use super::types::Config;
use crate::converter::ConversionRegistry;
use crate::render::{PageRenderer, RenderError};

const HOSTNAME_FILE: &str = "/etc/hostname";
const FALLBACK_HOSTNAME: &str = "localhost";

/// Application state
///
/// Built once at startup and handed to handlers behind an `Arc`.
/// Only the connection counter changes after construction.
pub struct AppState {
    pub config: Config,
    pub registry: ConversionRegistry,
    pub renderer: PageRenderer,
    /// Host name displayed on the page
    pub hostname: String,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, RenderError> {
        Ok(Self {
            config: config.clone(),
            registry: ConversionRegistry::standard(),
            renderer: PageRenderer::new()?,
            hostname: resolve_hostname(config.app.hostname.as_deref()),
            active_connections: AtomicUsize::new(0),
        })
    }
}

/// Pick the host name to display: configured value, `HOSTNAME`,
/// `/etc/hostname`, then `localhost`
pub fn resolve_hostname(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            std::env::var("HOSTNAME")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .or_else(|| {
            fs::read_to_string(HOSTNAME_FILE)
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string())
}
