//! tact-gateway: TACT portal session bridge
//!
//! Usage:
//!   tact-gateway              - Serve the HTTP API
//!   tact-gateway --login      - Sign in through the browser and exit
//!   tact-gateway --headless   - Run the login browser without a window
//!   tact-gateway --help       - Show help

use std::sync::Arc;

use tact_api::AppState;
use tact_browser::BrowserLogin;
use tact_core::{Config, PortalClient, SessionStore, TactPortal};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// HTTP API server
    Server,
    /// One-shot interactive login
    Login,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    mode: RunMode,
    headless: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1));

    match args.mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("tact-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let mut config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    if args.headless {
        config.login.headless = true;
    }

    tracing::info!("Starting tact-gateway...");
    tracing::info!("Portal: {}", config.portal.base_url);
    tracing::info!("Cookie file: {}", config.session.cookie_file.display());

    let login = BrowserLogin::from_config(&config);
    let session =
        Arc::new(SessionStore::open(&config.session.cookie_file).with_acquirer(Arc::new(login)));

    match args.mode {
        RunMode::Login => run_login(&config, &session).await,
        RunMode::Server => run_server(config, session).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> Args
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args {
        mode: RunMode::Server,
        headless: false,
    };

    for arg in args {
        match arg.as_str() {
            "--login" | "-l" => parsed.mode = RunMode::Login,
            "--headless" => parsed.headless = true,
            "--help" | "-h" => {
                parsed.mode = RunMode::Help;
                return parsed;
            }
            "--version" | "-v" => {
                parsed.mode = RunMode::Version;
                return parsed;
            }
            _ => {}
        }
    }

    parsed
}

/// Print help message
fn print_help() {
    println!("tact-gateway - TACT portal session bridge");
    println!();
    println!("Usage:");
    println!("  tact-gateway              Serve the HTTP API");
    println!("  tact-gateway --login      Sign in through the browser and exit");
    println!("  tact-gateway --headless   Run the login browser without a window");
    println!("  tact-gateway --help       Show this help message");
    println!("  tact-gateway --version    Show version");
    println!();
    println!("Environment Variables:");
    println!("  TACT_BASE_URL          Portal origin (default: https://tact.ac.thers.ac.jp)");
    println!("  TACT_USER_AGENT        User-Agent sent to the portal");
    println!("  TACT_REQUEST_TIMEOUT   Request timeout in seconds (default: 30)");
    println!("  TACT_COOKIE_FILE       Cookie file path (default: cookies.json)");
    println!("  TACT_LOGIN_HEADLESS    Headless login browser (default: false)");
    println!("  TACT_LOGIN_TIMEOUT     Seconds allowed for login (default: 300)");
    println!("  API_PORT               HTTP API port (default: 8000)");
}

/// Sign in once in the foreground
async fn run_login(config: &Config, session: &SessionStore) -> anyhow::Result<()> {
    tracing::info!(
        "Opening login browser (headless: {}, timeout: {}s)",
        config.login.headless,
        config.login.timeout_secs
    );

    session
        .authenticate(config.login.headless)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;

    tracing::info!(
        "Login successful, {} cookies saved to {}",
        session.cookies().len(),
        session.path().display()
    );
    Ok(())
}

/// Serve the HTTP API until Ctrl+C
async fn run_server(config: Config, session: Arc<SessionStore>) -> anyhow::Result<()> {
    let status = session.status();
    if status.authenticated {
        tracing::info!("Loaded {} cookies from previous session", status.cookie_count);
    } else {
        tracing::info!("No saved session; sign in with --login or POST /auth/login");
    }

    let client = PortalClient::new(&config.portal, Arc::clone(&session))
        .map_err(|e| anyhow::anyhow!("Failed to create portal client: {}", e))?;
    let portal = TactPortal::new(client);

    let state = AppState::new(config, session, portal);

    tracing::info!("Press Ctrl+C to exit");
    tact_api::start_server(state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
        tracing::info!("Shutting down...");
    })
    .await?;

    tracing::info!("tact-gateway stopped");
    Ok(())
}
