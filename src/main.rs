use anyhow::{Context as _, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::net::TcpListener;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};
use usagemon_auth::SessionManager;
use usagemon_config::{Config, LogConfig};
use usagemon_proxy::AppState;
use usagemon_store::{FileSessionStore, InMemorySessionStore};
use usagemon_types::{SessionCredential, SessionStore};
use usagemon_upstream::ClaudeWebClient;

#[derive(Parser, Debug)]
#[command(name = "usagemon", about = "Local claude.ai usage dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the dashboard server.
    Serve {
        /// Path to a YAML or JSON configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Override the listening port (default: 3000, or $PORT).
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the listening address (default: 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
        /// Directory holding the dashboard pages (default: ./web).
        #[arg(long, value_name = "DIR")]
        assets: Option<PathBuf>,
        /// Settings file holding the session cookie (default: ./settings.local.json).
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,
        /// Keep the session cookie in memory only.
        #[arg(long)]
        ephemeral: bool,
    },
    /// Store a claude.ai `sessionKey` cookie.
    Login {
        /// The cookie value (starts with `sk-ant-sid01-`).
        session_key: String,
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,
    },
    /// Remove the stored session cookie.
    Logout {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,
    },
    /// Show whether a session cookie is configured.
    Status {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            port,
            host,
            assets,
            settings,
            ephemeral,
        } => {
            let mut config = load_config(config.as_deref(), settings)?;
            if let Some(p) = port {
                config.port = p;
            }
            if let Some(h) = host {
                config.host = h;
            }
            if let Some(a) = assets {
                config.assets_dir = a;
            }
            cmd_serve(config, ephemeral).await
        }
        Commands::Login {
            session_key,
            config,
            settings,
        } => cmd_login(load_config(config.as_deref(), settings)?, &session_key).await,
        Commands::Logout { config, settings } => {
            cmd_logout(load_config(config.as_deref(), settings)?).await
        }
        Commands::Status { config, settings } => {
            cmd_status(load_config(config.as_deref(), settings)?).await
        }
    }
}

fn load_config(path: Option<&Path>, settings: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load(path).map_err(|e| anyhow!("config error: {e}"))?;
    if let Some(s) = settings {
        config.settings_path = s;
    }
    Ok(config)
}

async fn cmd_serve(config: Config, ephemeral: bool) -> Result<()> {
    let _guard = init_tracing(&config.log)?;

    let store: Arc<dyn SessionStore> = if ephemeral {
        Arc::new(InMemorySessionStore::new())
    } else {
        Arc::new(FileSessionStore::new(&config.settings_path))
    };
    let session = Arc::new(SessionManager::load(store, config.session_cookie.as_deref()).await);
    let upstream = Arc::new(
        ClaudeWebClient::from_config(&config.upstream).map_err(|e| anyhow!("{e}"))?,
    );
    let state = AppState::new(session.clone(), upstream, config.assets_dir.clone());
    let app = usagemon_proxy::make_router(state);

    let listener = bind(&config.host, config.port).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, assets = %config.assets_dir.display(), "usagemon listening on http://{addr}");
    if session.is_configured() {
        tracing::info!("session cookie configured");
    } else {
        log_setup_guidance(&config.settings_path);
    }

    axum::serve(listener, app).await?;
    Ok(())
}

/// Binds the listener, reusing a socket handed over by systemfd/systemd if present.
async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let mut fds = listenfd::ListenFd::from_env();
    if let Some(inherited) = fds.take_tcp_listener(0)? {
        inherited.set_nonblocking(true)?;
        return Ok(TcpListener::from_std(inherited)?);
    }

    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            let next = port.saturating_add(1);
            anyhow!("port {port} is already in use; try `usagemon serve --port {next}` or PORT={next}")
        } else {
            anyhow!("failed to bind {addr}: {e}")
        }
    })
}

fn log_setup_guidance(settings_path: &Path) {
    tracing::warn!("no session cookie configured; /api/usage will answer 401");
    tracing::warn!(
        "option 1: create {} with {{ \"sessionCookie\": \"sk-ant-sid01-...\" }}",
        settings_path.display()
    );
    tracing::warn!("option 2: export CLAUDE_SESSION_COOKIE=sk-ant-sid01-...");
    tracing::warn!("option 3: run `usagemon login <sessionKey>` or POST /api/session");
    tracing::warn!(
        "to find the cookie: log in at https://claude.ai, open DevTools → Application → Cookies → claude.ai, copy `sessionKey`"
    );
}

async fn cmd_login(config: Config, session_key: &str) -> Result<()> {
    let session_key = session_key.trim();
    if session_key.is_empty() {
        bail!("session key must not be empty");
    }
    let manager = file_manager(&config);
    if !manager.save(session_key).await {
        bail!(
            "failed to save session key to {}",
            config.settings_path.display()
        );
    }
    let preview = manager.status().preview.unwrap_or_default();
    eprintln!(
        "session cookie {preview} saved to {}",
        config.settings_path.display()
    );
    Ok(())
}

async fn cmd_logout(config: Config) -> Result<()> {
    let manager = file_manager(&config);
    if !manager.clear().await {
        bail!(
            "failed to clear session key in {}",
            config.settings_path.display()
        );
    }
    eprintln!("session cookie removed");
    Ok(())
}

async fn cmd_status(config: Config) -> Result<()> {
    let store = Arc::new(FileSessionStore::new(&config.settings_path));
    let manager = SessionManager::load(store, config.session_cookie.as_deref()).await;
    let status = manager.status();
    match status.preview {
        Some(preview) if status.configured => println!("session cookie: configured ({preview})"),
        _ => println!("session cookie: not configured"),
    }
    Ok(())
}

fn file_manager(config: &Config) -> SessionManager {
    SessionManager::new(
        Arc::new(FileSessionStore::new(&config.settings_path)),
        SessionCredential::empty(),
    )
}

/// Installs the global subscriber: stderr (text or JSON) plus an optional file.
///
/// The returned guard must be held for the file writer to flush.
fn init_tracing(log: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .with_context(|| format!("invalid log level {:?}", log.level))?;

    let stderr_layer: Box<dyn Layer<Registry> + Send + Sync> = if log.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match &log.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("log file {} has no file name", path.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter)
        .try_init()?;
    Ok(guard)
}
