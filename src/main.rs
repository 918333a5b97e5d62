//! Param Bridge - command line runner
//!
//! Connects to the configured host (or runs in preview), binds the standard
//! control set to logging consumers and runs the heartbeat until Ctrl-C.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use param_bridge::bridge::preview::{combo_default_index, SLIDER_DEFAULTS, TOGGLE_DEFAULTS};
use param_bridge::bridge::{resolve_global, BridgeProvider, DirectOptions};
use param_bridge::config::AppConfig;
use param_bridge::controls::ControlSet;
use param_bridge::sync::{Diagnostics, Heartbeat, SyncCounters};
use param_bridge::transport::{Transport, WebSocketTransport};
use param_bridge::{ChoiceDefaults, ChoiceOutcome, ParameterState};

/// Param Bridge - keep a control surface in sync with its host
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "bridge.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Ignore the configured host and run offline
    #[arg(long)]
    preview: bool,

    /// Print the preview default tables and exit
    #[arg(long)]
    list_defaults: bool,

    /// Stop after this many heartbeat ticks
    #[arg(long)]
    ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.log_json)?;

    if args.list_defaults {
        print_defaults(&ChoiceDefaults::builtin());
        return Ok(());
    }

    info!("Starting Param Bridge v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load_or_default(&args.config).await?;

    let transport = if args.preview {
        info!("Preview requested, not connecting to a host");
        None
    } else {
        connect_host(&config).await
    };

    let options = config
        .host
        .as_ref()
        .map(|h| h.direct_options())
        .unwrap_or_else(DirectOptions::default);
    let choices = config.choice_defaults();
    let bridge = resolve_global(transport, options, choices.clone());
    info!("✅ Using {} bridge", bridge.kind());

    run_app(bridge, &config, &choices, args.ticks, shutdown_signal()).await?;

    info!("Param Bridge shutdown complete");
    Ok(())
}

async fn connect_host(config: &AppConfig) -> Option<Arc<dyn Transport>> {
    let host = config.host.as_ref()?;

    match WebSocketTransport::connect(&host.url, host.connect_timeout()).await {
        Ok(transport) => Some(transport as Arc<dyn Transport>),
        Err(e) => {
            warn!("⚠️  Host unreachable ({:#}), continuing in preview", e);
            None
        }
    }
}

async fn run_app(
    bridge: Arc<dyn BridgeProvider>,
    config: &AppConfig,
    choices: &ChoiceDefaults,
    max_ticks: Option<u64>,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let counters = Arc::new(SyncCounters::new());
    let controls = ControlSet::build(bridge.as_ref());
    let heartbeat = Heartbeat::new(Arc::clone(&bridge), Arc::clone(&counters));

    // Log-only consumers; renders run on changes and on every tick
    for state in controls.continuous_states() {
        heartbeat.bind_continuous(state, |s| {
            trace!("🎚️  {} = {:.3} (norm {:.3})", s.name(), s.scaled(), s.normalized())
        });
    }
    for state in controls.boolean_states() {
        heartbeat.bind_boolean(state, |s| trace!("🔘 {} = {}", s.name(), s.value()));
    }
    for state in controls.enumerated_states() {
        heartbeat.bind_enumerated(state, |s| {
            trace!("📋 {} = {} {:?}", s.name(), s.index(), s.selected_label())
        });
    }
    for handle in controls.handles() {
        heartbeat.watch(handle);
    }
    info!("Bound {} controls", controls.len());

    // First resolution pass; later ticks retry anything still empty
    for request in controls.choice_requests(choices) {
        let resolver = heartbeat.resolver().clone();
        heartbeat.watch_choices(request.clone());
        tokio::spawn(async move {
            let outcome = resolver
                .resolve(&request, |index, items| {
                    debug!("{} → {} of {:?}", request.role, index, items)
                })
                .await;
            if let ChoiceOutcome::FellBack { error, .. } = &outcome {
                debug!("{} kept defaults: {}", request.role, error);
            }
        });
    }

    let mut interval = tokio::time::interval(config.heartbeat());
    tokio::pin!(shutdown);

    info!("Starting heartbeat every {:?}...", config.heartbeat());
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = heartbeat.tick();
                let diagnostics = Diagnostics::capture(
                    bridge.kind(),
                    bridge.transport_connected(),
                    counters.snapshot(),
                    snapshot,
                );
                debug!("{}", diagnostics.to_json());

                if max_ticks.is_some_and(|max| counters.heartbeat() >= max) {
                    info!("Reached {} ticks ({})", counters.heartbeat(), counters.snapshot());
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down...");
                break;
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .init();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn print_defaults(choices: &ChoiceDefaults) {
    use colored::*;

    println!("\n{}", "=== Preview Defaults ===".bold().cyan());

    println!("\n{} ({})", "Sliders:".bold(), SLIDER_DEFAULTS.len().to_string().green());
    for d in SLIDER_DEFAULTS {
        println!(
            "  {:<22} {:>8} in [{}, {}] skew {}",
            d.name.bright_white(),
            d.scaled.to_string().green(),
            d.start,
            d.end,
            d.skew.to_string().yellow()
        );
    }

    println!("\n{} ({})", "Toggles:".bold(), TOGGLE_DEFAULTS.len().to_string().green());
    for (name, value) in TOGGLE_DEFAULTS {
        let shown = if *value { "on".green() } else { "off".dimmed() };
        println!("  {:<22} {}", name.bright_white(), shown);
    }

    println!("\n{} ({})", "Selectors:".bold(), choices.len().to_string().green());
    for (name, items) in choices.iter() {
        let index = combo_default_index(name);
        let labels: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| if i == index { item.green().to_string() } else { item.clone() })
            .collect();
        println!("  {:<22} {}", name.bright_white(), labels.join(" | "));
    }
    println!();
}
