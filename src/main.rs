use std::io::BufRead;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatpost::{ChannelClient, WebhookClient};
use herald::cli::{Cli, Commands, OperatorCommand};
use herald::config::{Config, ConfiguredSource, SinkConfig, SourceTable};
use herald::errors::{HeraldError, HeraldResult};
use herald::fetch::{CommandRenderer, Fetcher, Fetchers, HttpFetcher};
use herald::services::{CycleOutcome, MessageFormatter, Poller, PollerRegistry, PollerStatus};
use herald::sinks::{ChannelSink, DeliverySink, LogSink, WebhookSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "herald=debug"
    } else {
        "herald=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Run { dry_run } => cmd_run(&config, dry_run).await?,
        Commands::List => cmd_list(&config)?,
        Commands::Check { name, deliver } => cmd_check(&config, &name, deliver).await?,
    }

    Ok(())
}

fn load_sources(config: &Config) -> HeraldResult<Vec<ConfiguredSource>> {
    SourceTable::load(config.sources_path.as_deref())?.build()
}

fn build_fetchers(config: &Config) -> HeraldResult<Fetchers> {
    let plain: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);

    let rendered = match &config.render_command {
        Some(command) => {
            let renderer = CommandRenderer::from_command_line(command, config.fetch.timeout)?;
            tracing::debug!(program = renderer.program(), "rendered fetches enabled");
            Some(Arc::new(renderer) as Arc<dyn Fetcher>)
        }
        None => None,
    };

    Ok(Fetchers::new(plain).with_renderer(rendered))
}

fn build_sink(config: &Config, dry_run: bool) -> HeraldResult<Arc<dyn DeliverySink>> {
    if dry_run {
        return Ok(Arc::new(LogSink));
    }

    let sink: Arc<dyn DeliverySink> = match config.require_sink()? {
        SinkConfig::Webhook {
            endpoint,
            username,
            avatar_url,
        } => {
            let client = WebhookClient::new(endpoint)?
                .with_username(username.clone())
                .with_avatar_url(avatar_url.clone());
            Arc::new(WebhookSink::new(client))
        }
        SinkConfig::Channel {
            url,
            token,
            channel,
        } => Arc::new(ChannelSink::new(ChannelClient::new(url, token)?, channel)),
    };

    Ok(sink)
}

fn build_formatter(config: &Config) -> MessageFormatter {
    config
        .placeholder_markers
        .iter()
        .fold(MessageFormatter::new(), |formatter, marker| {
            formatter.with_placeholder_marker(marker)
        })
}

fn build_poller(
    source: ConfiguredSource,
    fetchers: &Fetchers,
    sink: Arc<dyn DeliverySink>,
    formatter: &MessageFormatter,
) -> HeraldResult<Poller> {
    let fetcher = fetchers.for_source(&source.descriptor);
    Ok(Poller::new(source.descriptor, source.strategy, fetcher, sink)?.with_formatter(formatter.clone()))
}

fn cmd_list(config: &Config) -> HeraldResult<()> {
    let sources = load_sources(config)?;

    if sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!("Configured sources:\n");
    for source in sources {
        let d = &source.descriptor;
        println!(
            "  {} {} [{}] ({})",
            d.emoji.as_deref().unwrap_or("📰"),
            d.label,
            d.name,
            source.strategy.name()
        );
        println!("    URL: {}", d.url);
        if !d.aliases.is_empty() {
            println!("    Aliases: {}", d.aliases.join(", "));
        }
        println!(
            "    Every {}s{}",
            d.interval.as_secs(),
            if d.render { ", rendered" } else { "" }
        );
        println!();
    }

    Ok(())
}

async fn cmd_check(config: &Config, name: &str, deliver: bool) -> HeraldResult<()> {
    let source = load_sources(config)?
        .into_iter()
        .find(|s| s.descriptor.answers_to(name))
        .ok_or_else(|| HeraldError::UnknownSource(name.to_string()))?;

    let fetchers = build_fetchers(config)?;
    let sink = build_sink(config, !deliver)?;
    let poller = build_poller(source, &fetchers, sink, &build_formatter(config))?;

    println!("Checking {}...\n", poller.source().label);

    match poller.run_cycle().await {
        CycleOutcome::Delivered(key) => {
            if let Some(notification) = poller.last_delivered() {
                println!("{}", notification.format());
            }
            println!("\nLatest item: {}", key);
            if deliver {
                println!("Delivered.");
            }
            Ok(())
        }
        CycleOutcome::Unchanged => Ok(()),
        CycleOutcome::DeliveryFailed => Err(HeraldError::Delivery(format!(
            "{} was found but could not be delivered",
            poller.name()
        ))),
        CycleOutcome::Failed => Err(HeraldError::NotFound(format!(
            "no content extracted for {} (see log)",
            poller.name()
        ))),
    }
}

async fn cmd_run(config: &Config, dry_run: bool) -> HeraldResult<()> {
    let sink = build_sink(config, dry_run)?;
    let fetchers = build_fetchers(config)?;
    let formatter = build_formatter(config);

    let mut registry = PollerRegistry::new();
    for source in load_sources(config)? {
        registry.register(build_poller(source, &fetchers, Arc::clone(&sink), &formatter)?)?;
    }

    if registry.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    if dry_run {
        println!("Dry run - notifications are logged, not sent.");
    }
    println!("Polling {} sources. Type `help` for commands.", registry.len());

    registry.start_all();
    let console = operator_console(&registry).await;
    registry.shutdown().await;

    console
}

/// Forward stdin lines from a plain thread, so a pending read never holds up exit
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    rx
}

/// Serve operator commands from stdin until `quit` or Ctrl-C
async fn operator_console(registry: &PollerRegistry) -> HeraldResult<()> {
    let mut lines = stdin_lines();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("interrupt received, shutting down");
                return Ok(());
            }
            line = lines.recv() => match line {
                Some(line) => {
                    if !handle_command(registry, &line) {
                        return Ok(());
                    }
                }
                None => {
                    // Stdin closed; keep polling until interrupted
                    tokio::signal::ctrl_c().await?;
                    tracing::info!("interrupt received, shutting down");
                    return Ok(());
                }
            },
        }
    }
}

/// Returns false when the operator asked to quit
fn handle_command(registry: &PollerRegistry, line: &str) -> bool {
    match OperatorCommand::parse(line) {
        Ok(OperatorCommand::Status) => print_status(&registry.status()),
        Ok(OperatorCommand::Toggle(name)) => match registry.toggle(&name) {
            Ok(running) => {
                let label = registry
                    .find(&name)
                    .map(|p| p.source().label.clone())
                    .unwrap_or(name);
                println!(
                    "The {} poller has been turned {}.",
                    label,
                    if running { "on" } else { "off" }
                );
            }
            Err(e) => println!("{}", e),
        },
        Ok(OperatorCommand::Help) => {
            println!("Commands:");
            println!("  status          show every source and whether it is polling");
            println!("  toggle <name>   turn a source on or off (name or alias)");
            println!("  quit            stop all pollers and exit");
        }
        Ok(OperatorCommand::Quit) => return false,
        Err(message) if message.is_empty() => {}
        Err(message) => println!("{}", message),
    }

    true
}

fn print_status(statuses: &[PollerStatus]) {
    for status in statuses {
        println!("{}", status);
    }
}
