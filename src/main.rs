//! hashpass 主程序
//!
//! 加载配置、初始化日志与追踪，然后启动密码派生 HTTP 服务

mod cli;
mod error;
mod observability;
mod server;
mod trace;

use clap::Parser;
use hashpass_common::HashpassConfig;
use observability::init_observability;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

macro_rules! bootstrap_info {
    ($($arg:tt)*) => {
        println!($($arg)*);
    };
}

macro_rules! bootstrap_error {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

use cli::{Cli, Commands};
use error::{Error, Result};

const DEFAULT_CONFIG: &str = "config.toml";
const SYSTEM_CONFIG: &str = "/etc/hashpass/config.toml";

/// Application launcher utilities
struct ApplicationLauncher;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Test { config_file }) => {
            let config_path = config_file.as_ref().unwrap_or(&cli.config);
            ApplicationLauncher::test_config_file(config_path)
        }
        None => {
            let config = ApplicationLauncher::load_config(&cli.config)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(ApplicationLauncher::run_application(config))
        }
    }
}

impl ApplicationLauncher {
    /// Find config file with fallback locations
    ///
    /// An explicitly provided path must exist; the default name falls back to
    /// the system location and finally to built-in defaults (`Ok(None)`).
    fn find_config_file(provided_path: &Path) -> Result<Option<PathBuf>> {
        if provided_path != Path::new(DEFAULT_CONFIG) {
            if provided_path.exists() {
                bootstrap_info!("Using provided config file: {:?}", provided_path);
                return Ok(Some(provided_path.to_path_buf()));
            }
            bootstrap_error!("Provided config file not found: {:?}", provided_path);
            return Err(Error::custom(format!(
                "Config file not found: {provided_path:?}"
            )));
        }

        for path in [PathBuf::from(DEFAULT_CONFIG), PathBuf::from(SYSTEM_CONFIG)] {
            if path.exists() {
                bootstrap_info!("Found config file: {:?}", path);
                return Ok(Some(path));
            }
            bootstrap_info!("Config not found at: {:?}", path);
        }

        Ok(None)
    }

    fn load_config(provided_path: &Path) -> Result<HashpassConfig> {
        let config = match Self::find_config_file(provided_path)? {
            Some(path) => HashpassConfig::from_file(&path)?,
            None => {
                bootstrap_info!("No configuration file found, using built-in defaults");
                HashpassConfig::default()
            }
        };

        if let Err(errors) = config.validate() {
            let mut has_critical_errors = false;
            for (i, err) in errors.iter().enumerate() {
                if err.starts_with("Warning:") {
                    bootstrap_info!("  {}. {}", i + 1, err);
                } else {
                    bootstrap_error!("  {}. {}", i + 1, err);
                    has_critical_errors = true;
                }
            }
            if has_critical_errors {
                return Err(Error::service_validation(
                    "configuration has errors, fix them before starting",
                ));
            }
        }

        Ok(config)
    }

    /// 测试配置文件是否有效
    fn test_config_file(config_path: &Path) -> Result<()> {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();

        let config = HashpassConfig::from_file(config_path).map_err(|e| {
            error!("Failed to parse config file {:?}: {}", config_path, e);
            Error::service_validation(format!("config parse failed: {e}"))
        })?;
        info!("Config file parsed: {:?}", config_path);

        if let Err(errors) = config.validate() {
            for (i, err) in errors.iter().enumerate() {
                if err.starts_with("Warning:") {
                    warn!("  {}. {}", i + 1, err);
                } else {
                    error!("  {}. {}", i + 1, err);
                }
            }
            if errors.iter().any(|e| !e.starts_with("Warning:")) {
                return Err(Error::service_validation("config validation failed"));
            }
        }

        info!("Config validation passed");
        Ok(())
    }

    /// 运行应用程序的主入口
    async fn run_application(config: HashpassConfig) -> Result<()> {
        let _observability_guard = init_observability(&config)?;

        if let Err(e) = hashpass_common::metrics::register_metrics() {
            warn!("Prometheus metrics registration warning: {}", e);
        }
        if let Ok(now) = SystemTime::now().duration_since(UNIX_EPOCH) {
            hashpass_common::metrics::START_TIME_SECONDS.set(now.as_secs() as i64);
        }

        let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(10);
        setup_ctrl_c_handler(shutdown_tx.clone()).await;

        let state = passgen::create_passgen_state(&config.passgen);
        let listener = server::bind(&config).await?;
        let local_addr = listener.local_addr()?;

        let handle = server::spawn(listener, server::build_app(state), shutdown_tx);
        Self::display_service_info(&config, local_addr);

        handle.await?;

        info!("hashpass stopped");
        Ok(())
    }

    fn display_service_info(config: &HashpassConfig, addr: std::net::SocketAddr) {
        info!("{} ({}) listening on http://{}", config.name, config.env, addr);
        info!("Available endpoints:");
        info!("  - GET  /");
        info!("  - GET  /generate?length=<1-64>&phrase=<optional>");
        info!("  - POST /generate {{\"length\": <1-64>, \"phrase\": <optional>}}");
        info!("  - GET  /health");
        info!("  - GET  /docs");
        info!("  - GET  /openapi.json");
        info!("  - GET  /metrics");
    }
}

/// 设置Ctrl-C信号处理程序
async fn setup_ctrl_c_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Received Ctrl-C, shutting down gracefully...");
        let _ = shutdown_tx.send(());
    });
}
