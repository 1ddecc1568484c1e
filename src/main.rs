//! termdash — a terminal dashboard fed by concurrently polled sources.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ write  ┌─────────────┐ snapshot() ┌──────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ─────► │ snapshot.rs │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tasks)  │        │   (store)   │   (pull)   │ (state)  │          │ (render) │
//! └──────────┘        └─────────────┘            └──────────┘          └──────────┘
//!      ▲                                              ▲
//!      │ produce()                                    │ handle_key_event()
//! ┌──────────┐                                   ┌──────────┐
//! │ source/  │                                   │ input.rs │
//! └──────────┘                                   └──────────┘
//! ```
//!
//! * **`config`** — loads the YAML dashboard definition (or the defaults).
//! * **`source/`** — the `DataSource` trait, the concrete source kinds, and
//!   the registry mapping config `type` strings to them.
//! * **`poll`** — runs one Tokio task per source and owns their shutdown.
//! * **`snapshot`** — the shared map of each source's latest result.
//! * **`rpc`** — the optional JSON-RPC client behind `mcp` sources.
//! * **`app`** — presenter state (pulled snapshot, scroll position, etc.).
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`main`** — wires everything together: parse args, set up logging,
//!   the runtime and the terminal, and run the event loop.

mod app;
mod config;
mod error;
mod input;
mod logging;
mod poll;
mod rpc;
mod snapshot;
mod source;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info};

use app::App;
use poll::Aggregator;
use rpc::JsonRpcClient;
use source::{build_sources, RemoteClient, SourceContext};

#[derive(Parser, Debug)]
#[command(name = "termdash", version, about = "Terminal dashboard for polled data sources")]
struct Args {
    /// Dashboard config file (YAML).  Built-in defaults are used when absent.
    #[arg(short, long, env = "TERMDASH_CONFIG")]
    config: Option<PathBuf>,

    /// Where to write logs.
    #[arg(long, env = "TERMDASH_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// JSON-RPC endpoint used by `mcp` sources.
    #[arg(long, env = "TERMDASH_RPC_ENDPOINT")]
    rpc_endpoint: Option<String>,
}

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
///
/// The hook also fires for source panics the poller catches on worker
/// threads; those are only logged and leave the terminal alone.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if std::thread::current().name() == Some("main") {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(info);
        } else {
            error!(%info, "panic in background thread");
        }
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();

    // -- logging (to file; the terminal belongs to the UI) -------------------
    let _log_guard = logging::init(args.log_file.as_deref())?;

    // -- configuration and sources -------------------------------------------
    // Unknown source kinds and invalid intervals abort here, before any
    // polling starts.
    let config = config::load_config(args.config.as_deref()).context("failed to load config")?;

    let http = SourceContext::default_http_client().context("failed to build HTTP client")?;
    let remote = args.rpc_endpoint.map(|endpoint| {
        info!(%endpoint, "remote calls enabled");
        Arc::new(JsonRpcClient::new(endpoint, http.clone())) as Arc<dyn RemoteClient>
    });
    let ctx = SourceContext::new(http, remote);
    let sources = build_sources(&config.sources, &ctx).context("invalid source configuration")?;

    // -- start background polling --------------------------------------------
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let aggregator = {
        let _enter = runtime.enter();
        Aggregator::start(sources)
    };

    install_panic_hook();
    let result = run_ui(&aggregator, &config);

    // -- shutdown: stop every poll loop before exiting -----------------------
    runtime.block_on(aggregator.shutdown());
    info!("exiting");
    result
}

/// The foreground event loop.  Returns when the user quits.
fn run_ui(aggregator: &Aggregator, config: &config::DashboardConfig) -> Result<()> {
    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(config.title.clone(), aggregator.titles().to_vec());
    app.refresh(aggregator.snapshot());

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Pull a fresh snapshot if one is due or was requested.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);
    let pull_every = config.refresh_ui_interval();
    let mut last_pull = Instant::now();

    loop {
        // 1. Pull
        if app.refresh_requested() || last_pull.elapsed() >= pull_every {
            app.refresh(aggregator.snapshot());
            last_pull = Instant::now();
        }

        // 2. Render
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // 3. Handle input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
