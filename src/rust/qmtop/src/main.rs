mod plain;
mod top_level_ui;
mod ui_base;
mod widgets;

use anyhow::{anyhow, Result};
use clap::Parser;
use qosmate_config::{load_config, load_config_from, Config, SourceKind};
use qosmate_flows::{source::ConfiguredSource, spawn_poller, FlowEngine};
use std::{fs::File, path::PathBuf, sync::Mutex};
use tracing::{info, level_filters::LevelFilter};
use ui_base::UiBase;

#[derive(Parser)]
#[command(version, about = "Live per-flow throughput for QoSmate")]
struct Args {
    /// Configuration file (defaults to $QOSMATE_FLOWS_CONFIG or /etc/qosmate_flows.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Where to read the flow table from
    #[arg(short, long, value_parser = ["ubus", "conntrack"])]
    source: Option<String>,

    /// Initial filter text
    #[arg(short, long)]
    filter: Option<String>,

    /// Initial sort column (protocol, src, dst, dscp, bytes, packets, avgPps, maxPps, avgBps)
    #[arg(long)]
    sort: Option<String>,

    /// Sort ascending instead of descending
    #[arg(long)]
    ascending: bool,

    /// Print rows to stdout instead of running the full-screen view
    #[arg(long)]
    plain: bool,

    /// With --plain, print each update as a JSON array
    #[arg(long, requires = "plain")]
    json: bool,

    /// With --plain, exit after this many updates
    #[arg(long, requires = "plain")]
    count: Option<u64>,

    /// Write log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Where log output goes.
#[derive(Debug, PartialEq, Eq)]
enum LogDestination {
    File(PathBuf),
    Stderr,
    /// The full-screen view owns the terminal; poll failures show up in
    /// its status line instead.
    Discard,
}

impl LogDestination {
    fn choose(plain: bool, log_file: Option<&str>) -> Self {
        match (log_file, plain) {
            (Some(path), _) => Self::File(PathBuf::from(path)),
            (None, true) => Self::Stderr,
            (None, false) => Self::Discard,
        }
    }
}

/// Configure logging. The level comes from RUST_LOG and defaults to WARN.
fn set_console_logging(destination: LogDestination) -> Result<()> {
    let level = if let Ok(level) = std::env::var("RUST_LOG") {
        match level.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::WARN,
        }
    } else {
        LevelFilter::WARN
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_target(false);

    match destination {
        LogDestination::File(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            tracing::subscriber::set_global_default(
                builder.with_ansi(false).with_writer(Mutex::new(file)).finish(),
            )?;
        }
        LogDestination::Stderr => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())?;
        }
        LogDestination::Discard => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::sink).finish())?;
        }
    }
    Ok(())
}

fn apply_overrides(mut config: Config, args: &Args) -> Result<Config> {
    if let Some(interval) = args.interval_ms {
        config.poll_interval_ms = interval;
    }
    match args.source.as_deref() {
        Some("ubus") => config.source.kind = SourceKind::Ubus,
        Some("conntrack") => config.source.kind = SourceKind::Conntrack,
        _ => {}
    }
    if let Some(filter) = &args.filter {
        config.display.filter = filter.clone();
    }
    if let Some(sort) = &args.sort {
        config.display.sort_column = sort.clone();
    }
    if args.ascending {
        config.display.sort_descending = false;
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = Some(log_file.display().to_string());
    }
    config.validate().map_err(|e| anyhow!(e))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let config = apply_overrides(config, &args)?;

    set_console_logging(LogDestination::choose(args.plain, config.log_file.as_deref()))?;
    info!("Polling the flow table every {} ms", config.poll_interval_ms);

    let poller = spawn_poller(
        ConfiguredSource::from_config(&config),
        FlowEngine::from_config(&config),
        config.poll_interval(),
    );

    if args.plain {
        plain::run(&config, poller.updates(), args.json, args.count).await?;
    } else {
        let mut ui = UiBase::new(&config, poller.updates())?;
        ui.event_loop().await?;
    }

    poller.stop().await;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = Args::parse_from([
            "qmtop", "--interval-ms", "250", "--source", "conntrack", "--sort", "avgPps", "--ascending",
        ]);
        let config = apply_overrides(Config::default(), &args).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.source.kind, SourceKind::Conntrack);
        assert_eq!(config.display.sort_column, "avgPps");
        assert!(!config.display.sort_descending);
    }

    #[test]
    fn bad_sort_column_is_rejected() {
        let args = Args::parse_from(["qmtop", "--sort", "colour"]);
        assert!(apply_overrides(Config::default(), &args).is_err());
    }

    #[test]
    fn full_screen_view_never_logs_to_the_terminal() {
        assert_eq!(LogDestination::choose(false, None), LogDestination::Discard);
        assert_eq!(LogDestination::choose(true, None), LogDestination::Stderr);
        assert_eq!(
            LogDestination::choose(false, Some("/tmp/qmtop.log")),
            LogDestination::File(PathBuf::from("/tmp/qmtop.log"))
        );
        assert_eq!(
            LogDestination::choose(true, Some("/tmp/qmtop.log")),
            LogDestination::File(PathBuf::from("/tmp/qmtop.log"))
        );
    }

    #[test]
    fn json_needs_plain() {
        assert!(Args::try_parse_from(["qmtop", "--json"]).is_err());
        assert!(Args::try_parse_from(["qmtop", "--plain", "--json", "--count", "2"]).is_ok());
    }
}
