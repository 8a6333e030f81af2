//! dyi-capture — entry point.

use std::time::Duration;

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use dyi_capture::{DetectionRules, NavigationEvent, Session};
use dyi_capture_cli::browser::chromium::ChromiumBrowser;
use dyi_capture_cli::browser::Interception;
use dyi_capture_cli::config::{resolve_backend_timeout, resolve_backend_url};
use dyi_capture_cli::events::EventBus;
use dyi_capture_cli::{flow, report, HttpBackend};

#[derive(Parser)]
#[command(
    name = "dyi-capture",
    about = "dyi-capture — capture your Instagram data-export link and analyze it",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print flow events and results as JSON lines on stdout.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct AnalyzeArgs {
    /// Analysis backend endpoint. Also reads DYI_BACKEND_URL.
    #[arg(long)]
    backend: Option<String>,

    /// Seconds to wait for the backend. Also reads DYI_BACKEND_TIMEOUT_SECS.
    #[arg(long)]
    timeout: Option<u64>,

    /// Also print the usernames behind this metric (e.g. "not_following_back_count").
    #[arg(long)]
    show: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the data-request page so you can ask Instagram for an export.
    Request {
        /// Your Instagram username.
        #[arg(short, long)]
        username: String,
    },

    /// Open the download page, capture the export link, and analyze it.
    Capture {
        /// Your Instagram username.
        #[arg(short, long)]
        username: String,

        /// Run Chromium headless (only useful with an already logged-in profile).
        #[arg(long)]
        headless: bool,

        #[command(flatten)]
        analyze: AnalyzeArgs,
    },

    /// Analyze a download link copied by hand.
    Analyze {
        /// The export download URL.
        url: String,

        /// Your Instagram username.
        #[arg(short, long)]
        username: String,

        #[command(flatten)]
        analyze: AnalyzeArgs,
    },

    /// Show which detection rule, if any, recognizes a URL.
    Check {
        url: String,

        /// Declared content type to test the content-type rule.
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let bus = EventBus::new(64);
    let printer = cli.json.then(|| spawn_json_printer(&bus));

    let result = match cli.command {
        Commands::Request { username } => run_request(&username, &bus).await,
        Commands::Capture {
            username,
            headless,
            analyze,
        } => run_capture(&username, headless, &analyze, cli.json, &bus).await,
        Commands::Analyze {
            url,
            username,
            analyze,
        } => run_analyze(&url, &username, &analyze, cli.json, &bus).await,
        Commands::Check { url, content_type } => {
            run_check(&url, content_type, cli.json);
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dyi-capture", &mut std::io::stdout());
            Ok(())
        }
    };

    drop(bus);
    if let Some(handle) = printer {
        let _ = handle.await;
    }

    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }
    result
}

fn spawn_json_printer(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!("Failed to encode event: {e}"),
                },
                Err(RecvError::Lagged(n)) => tracing::warn!("Dropped {n} events"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn run_request(username: &str, bus: &EventBus) -> Result<()> {
    let mut session = Session::new();
    session.set_username(username);
    let started = session.start_request_flow();
    bus.publish_from(&mut session);
    let url = started?;

    let browser = ChromiumBrowser::launch(false).await?;
    let mut surface = browser.new_surface().await?;
    surface.load(url, Interception::Off).await?;

    eprintln!("  Request your data in the browser window, then press Ctrl-C here.");
    eprintln!("  Instagram emails you when the export is ready; then run `dyi-capture capture`.");
    tokio::signal::ctrl_c().await?;

    session.back();
    bus.publish_from(&mut session);
    surface.close().await?;
    browser.shutdown().await
}

async fn run_capture(
    username: &str,
    headless: bool,
    args: &AnalyzeArgs,
    json: bool,
    bus: &EventBus,
) -> Result<()> {
    let mut session = Session::new();
    session.set_username(username);
    let started = session.start_download_flow();
    bus.publish_from(&mut session);
    let url = started?;

    let browser = ChromiumBrowser::launch(headless).await?;
    let mut surface = browser.new_surface().await?;
    surface.load(url, Interception::On).await?;
    eprintln!("  Log in and press Download on your export. The link is captured automatically.");

    let captured = tokio::select! {
        captured = flow::watch_for_download(&mut session, surface.as_mut(), bus) => captured?,
        _ = tokio::signal::ctrl_c() => None,
    };
    surface.close().await?;
    browser.shutdown().await?;

    if captured.is_none() {
        session.back();
        bus.publish_from(&mut session);
        bail!("no download link was captured");
    }

    analyze_captured(&mut session, args, json, bus).await
}

async fn run_analyze(
    url: &str,
    username: &str,
    args: &AnalyzeArgs,
    json: bool,
    bus: &EventBus,
) -> Result<()> {
    let mut session = Session::new();
    session.set_username(username);
    flow::submit_pasted_link(&mut session, url, bus)?;
    analyze_captured(&mut session, args, json, bus).await
}

async fn analyze_captured(
    session: &mut Session,
    args: &AnalyzeArgs,
    json: bool,
    bus: &EventBus,
) -> Result<()> {
    let endpoint = resolve_backend_url(args.backend.as_deref());
    let timeout: Duration = resolve_backend_timeout(args.timeout);
    let backend = HttpBackend::new(endpoint, timeout);

    if !json {
        eprintln!("  Link captured. Analyzing via {} ...", backend.endpoint());
    }

    let cancelled = tokio::select! {
        _ = flow::run_analysis(session, &backend, timeout, bus) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if cancelled {
        session.back();
        bus.publish_from(session);
        bail!("analysis cancelled");
    }

    if let Some(notice) = session.take_notice() {
        bail!("{notice}");
    }
    let Some(result) = session.analysis_result() else {
        bail!("analysis finished without a result");
    };

    if json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }

    print!("{}", report::render_dashboard(session.username(), result));
    if let Some(metric) = args.show.as_deref() {
        match report::render_user_list(result, metric) {
            Some(text) => print!("\n{text}"),
            None => eprintln!("  No user list for '{metric}'."),
        }
    }
    Ok(())
}

fn run_check(url: &str, content_type: Option<String>, json: bool) {
    let mut event = NavigationEvent::new(url);
    event.content_type = content_type;
    let rule = DetectionRules::default().classify(&event);

    if json {
        println!(
            "{}",
            serde_json::json!({ "url": url, "captured": rule.is_some(), "rule": rule })
        );
        return;
    }
    match rule {
        Some(rule) => println!("  capture ({rule}): {url}"),
        None => println!("  proceed: {url}"),
    }
}
