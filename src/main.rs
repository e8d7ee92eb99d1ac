use std::sync::Arc;

use spa_edge::config::{self, AppState, Config};
use spa_edge::logger;
use spa_edge::server::{self, create_reusable_listener, shutdown_signal};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {
    // First argument overrides the config file path (extension optional)
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), BoxError> {
    let addr = cfg.get_socket_addr()?;
    let listener = create_reusable_listener(addr, cfg.server.backlog)?;
    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::new(cfg)?);
    server::serve(listener, state, shutdown_signal()).await;
    Ok(())
}
