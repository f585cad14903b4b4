use std::sync::Arc;

use tokio::sync::Notify;

mod config;
mod converter;
mod handler;
mod http;
mod logger;
mod render;
mod server;

const USAGE: &str = "Usage: distance-converter [-c|--config <path>]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(config_path) = config_path_from_args(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Tokio runtime; worker count comes from the config when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg)?);

    logger::log_server_start(&addr, &cfg, &state.hostname, state.registry.len());

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));
    server::start_server_loop(listener, state, shutdown).await;

    Ok(())
}

/// Config path from the command line; `None` when help was requested
fn config_path_from_args(
    mut args: impl Iterator<Item = String>,
) -> Result<Option<String>, String> {
    let mut path = config::DEFAULT_CONFIG_PATH.to_string();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                path = args
                    .next()
                    .ok_or_else(|| format!("{arg} requires a path\n{USAGE}"))?;
            }
            "-h" | "--help" => return Ok(None),
            other => return Err(format!("Unknown argument: {other}\n{USAGE}")),
        }
    }
    Ok(Some(path))
}
