use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use toolbox::config::{AppState, Config, DEFAULT_CONFIG_PATH};
use toolbox::server::{create_reusable_listener, start_server_loop, start_signal_handler};
use toolbox::{create_dir_if_not_exist, logger};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // First argument overrides the config file path (without extension)
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    create_dir_if_not_exist(&cfg.storage.upload_dir).await?;
    create_dir_if_not_exist(&cfg.storage.download_dir).await?;

    let state = Arc::new(AppState::new(&cfg));
    start_signal_handler(Arc::clone(&state.shutdown_signal))?;

    logger::log_server_start(&addr, &cfg);

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(start_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
        ))
        .await;
    Ok(())
}
