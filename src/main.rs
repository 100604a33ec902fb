use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use obscura::{
    Config,
    cache::{self, RefreshOptions, Refresher, SnapshotStore},
    create_app,
    proxy::ImageStore,
    startup_checks,
    upstream::{DynPhotoSource, ImmichClient},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,
    },

    /// Rebuild the album snapshot once and exit
    Refresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::Refresh) => run_refresh(config).await,
        Some(Commands::Serve { port, host }) => run_server(config, port, host).await,
        None => run_server(config, None, None).await,
    }
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        toml_edit::de::from_str::<Config>(&config_content)?
    } else {
        info!("Config file not found at {:?}, using defaults", config_path);
        Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

async fn run_refresh(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let source: DynPhotoSource = Arc::new(ImmichClient::new(&config.upstream)?);
    let store = SnapshotStore::new(&config.cache.data_directory);
    let images = config
        .cache
        .store_images
        .then(|| ImageStore::new(config.cache.data_directory.join("img")));
    let refresher = Refresher::new(
        source,
        store.clone(),
        images,
        RefreshOptions::from_config(&config),
    );

    info!("Refreshing album {}", config.upstream.album_id);
    match refresher.refresh().await {
        Ok(snapshot) => {
            info!(
                "Wrote {} items to {:?}",
                snapshot.items.len(),
                store.snapshot_path()
            );
            Ok(())
        }
        Err(refresh_error) => {
            error!("Refresh failed: {}", refresh_error);
            std::process::exit(1);
        }
    }
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!("Data directory: {:?}", config.cache.data_directory);
    info!("Upstream album: {}", config.upstream.album_id);

    match startup_checks::perform_startup_checks(&config).await {
        Ok(()) => info!("All startup checks passed"),
        Err(check_errors) => {
            let mut critical = false;
            for check_error in &check_errors {
                if startup_checks::is_critical(check_error) {
                    tracing::error!("Startup check failed: {}", check_error);
                    critical = true;
                } else {
                    tracing::warn!("Startup check warning: {}", check_error);
                }
            }
            if critical {
                return Err("startup checks failed".into());
            }
        }
    }

    let app_state = obscura::build_state(config)
        .await
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;
    let app_name = app_state.config.app.name.clone();

    if app_state.config.cache.refresh_on_startup {
        let refresher = app_state.refresher.clone();
        tokio::spawn(async move {
            info!("Startup refresh: begin");
            match refresher.refresh().await {
                Ok(snapshot) => {
                    info!("Startup refresh: ok, {} items cached", snapshot.items.len());
                }
                Err(refresh_error) => error!("Startup refresh failed: {}", refresh_error),
            }
        });
    }

    if let Some(interval_minutes) = app_state.config.cache.refresh_interval_minutes {
        cache::start_periodic_refresh(app_state.refresher.clone(), interval_minutes);
    }

    let app = create_app(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("{} listening on {}", app_name, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
