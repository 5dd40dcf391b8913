use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::Parser;

use cadence::catalog::library::LibraryIndex;
use cadence::catalog::{scanner, CatalogIndex};
use cadence::http::{self, state::AppState};
use cadence::playback::{Liquidsoap, PlaybackEngine};
use cadence::ratelimit::store::{MemoryStore, RedisStore, TtlStore};
use cadence::station::StationState;
use cadence::stream::{Icecast, StreamServer};
use cadence::sync::{self, SyncConfig, Synchronizer};
use cadence::{cli, config};

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        eprintln!("\ncadence: forced exit");
        std::process::exit(1);
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });

    let config = config::Config::resolve(file_config, &args);

    let Some(music_dir) = config.music_dir.clone() else {
        fail("no music directory given (positional argument, CADENCE_MUSIC_DIR or music_dir in the config file)");
    };
    if !music_dir.is_dir() {
        fail(format_args!("not a directory: {}", music_dir.display()));
    }

    tracing::info!("cadence {} on port {}", config.version, config.port);
    tracing::info!("Indexing {}", music_dir.display());

    let scan_root = music_dir.clone();
    let library = tokio::task::spawn_blocking(move || scanner::scan(&scan_root))
        .await
        .unwrap_or_else(|e| fail(format_args!("catalog scan panicked: {e}")));
    if library.records.is_empty() {
        tracing::warn!("No songs found in {}; requests will not resolve", music_dir.display());
    }
    let index = Arc::new(LibraryIndex::new(library));
    let song_count = index.len();
    let catalog: Arc<dyn CatalogIndex> = index;

    let store: Arc<dyn TtlStore> = match &config.redis_url {
        Some(url) => match RedisStore::connect(url, config.timeout).await {
            Ok(store) => {
                tracing::info!("Rate limits stored in redis at {}", url);
                Arc::new(store)
            }
            Err(e) => fail(format_args!("cannot connect to redis at {url}: {e}")),
        },
        None => {
            tracing::info!("Rate limits stored in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let engine: Arc<dyn PlaybackEngine> = Arc::new(Liquidsoap::new(
        config.liquidsoap_addr.clone(),
        config.liquidsoap_queue.clone(),
        config.liquidsoap_output.clone(),
        config.timeout,
    ));
    let stream: Arc<dyn StreamServer> = match Icecast::new(
        config.icecast_url.clone(),
        config.mountpoint.clone(),
        config.timeout,
    ) {
        Ok(icecast) => Arc::new(icecast),
        Err(e) => fail(format_args!("cannot build stream server client: {e}")),
    };

    let station = Arc::new(StationState::new());

    let mut state = AppState::new(
        Arc::clone(&catalog),
        engine,
        store,
        Arc::clone(&station),
        config.request_rate_limit,
    );
    state.version = config.version.clone();
    state.dev_mode = config.dev_mode;
    state.request_timeout = config.timeout * 2;
    if config.dev_mode {
        tracing::warn!("Development mode enabled: /api/dev/skip is routed");
    }
    let app = http::build_router(state);

    let addr = if config.localhost {
        format!("127.0.0.1:{}", config.port)
    } else {
        format!("0.0.0.0:{}", config.port)
    };
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| fail(format_args!("failed to bind {addr}: {e}")));
    tracing::info!("Serving {} songs on http://{}", song_count, addr);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(4);

    let synchronizer = Synchronizer::new(stream, catalog, station);
    let sync_config = SyncConfig {
        interval: config.poll_interval,
        tick_timeout: config.timeout * 2,
    };
    let sync_task = tokio::spawn(sync::run(synchronizer, sync_config, shutdown_tx.subscribe()));

    let mut http_rx = shutdown_tx.subscribe();
    let server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = http_rx.recv().await;
        })
        .await
        .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));
    });

    wait_for_shutdown().await;
    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(());

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = sync_task.await;
        let _ = server.await;
    })
    .await;

    tracing::info!("Goodbye.");
}
