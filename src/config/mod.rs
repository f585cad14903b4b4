// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

use config::builder::{ConfigBuilder, DefaultState};

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Config file looked up when no path is given (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment prefix, e.g. `CONVERTER_SERVER__PORT=9000`
const ENV_PREFIX: &str = "CONVERTER";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence: environment, then the file, then built-in defaults.
    /// A missing file is not an error.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Configuration made only of the built-in defaults
    pub fn from_defaults() -> Result<Self, config::ConfigError> {
        with_defaults(config::Config::builder())?
            .build()?
            .try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5000)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("http.server_name", "distance-converter")?
        .set_default("http.enable_cors", false)?
        .set_default("http.max_body_size", 65_536) // 64KB
}
