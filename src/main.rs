use anyhow::{Context, Result};
use circbuf::config::{BufferConfig, Config};
use circbuf::{render, CircularBuffer, OverwritePolicy, PushOutcome};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use serde_json::json;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "circbuf", about = "Push integers through a fixed-capacity circular buffer", version)]
struct Cli {
    /// Values to push, in order (read from stdin when omitted)
    #[arg(allow_negative_numbers = true)]
    values: Vec<i64>,

    /// Requested capacity, rounded up to a power of two (<= 0 uses the default)
    #[arg(short, long, allow_negative_numbers = true)]
    capacity: Option<i64>,

    /// When full: overwrite (evict oldest) or ignore (drop new)
    #[arg(short, long)]
    policy: Option<OverwritePolicy>,

    /// Pop up to N values after pushing and print them
    #[arg(long, default_value_t = 0, value_name = "N")]
    pop: usize,

    /// Print a JSON snapshot of the buffer and exit
    #[arg(long)]
    json: bool,

    /// Print a human-readable report and exit
    #[arg(long)]
    report: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config_file: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

/// What happened while feeding the input through the buffer.
#[derive(Debug, Default)]
struct RunStats {
    pushed:      usize,
    overwritten: usize,
    rejected:    usize,
    popped:      Vec<i64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "circbuf", &mut io::stdout());
        return Ok(());
    }

    let cfg = match &cli.config_file {
        Some(path) => Config::load_from(path)?,
        None       => Config::load(),
    };
    if cli.config {
        return run_print_config(&cfg, cli.config_file.as_deref());
    }

    let values = if cli.values.is_empty() { read_stdin_values()? } else { cli.values.clone() };

    let settings = BufferConfig {
        capacity: cli.capacity.unwrap_or(cfg.buffer.capacity),
        policy:   cli.policy.unwrap_or(cfg.buffer.policy),
    };
    let requested = settings.capacity;
    let mut buf: CircularBuffer<i64> = settings.build()?;
    debug!(requested, capacity = buf.capacity(), policy = %settings.policy, "buffer ready");

    let stats = feed(&mut buf, values, cli.pop);
    info!(
        pushed = stats.pushed,
        overwritten = stats.overwritten,
        rejected = stats.rejected,
        popped = stats.popped.len(),
        "input processed"
    );

    if cli.json {
        return run_json_snapshot(&buf, requested, &stats);
    }
    if cli.report {
        print!("{}", report(&buf, requested, &stats, &cfg));
        return Ok(());
    }

    let sep = &cfg.display.separator;
    if !stats.popped.is_empty() {
        println!("popped: {}", render::listing(&stats.popped, sep));
    }
    println!("{}", render::listing(&buf, sep));
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_stdin_values() -> Result<Vec<i64>> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text).context("reading values from stdin")?;
    parse_values(&text)
}

fn parse_values(text: &str) -> Result<Vec<i64>> {
    text.split_whitespace()
        .map(|tok| tok.parse::<i64>().with_context(|| format!("invalid integer '{}'", tok)))
        .collect()
}

fn feed(buf: &mut CircularBuffer<i64>, values: Vec<i64>, pop: usize) -> RunStats {
    let mut stats = RunStats::default();
    for v in values {
        stats.pushed += 1;
        match buf.push(v) {
            PushOutcome::Stored       => {}
            PushOutcome::Overwrote(_) => stats.overwritten += 1,
            PushOutcome::Rejected(_)  => stats.rejected += 1,
        }
    }
    stats.popped = (0..pop).map_while(|_| buf.pop()).collect();
    stats
}

fn run_json_snapshot(buf: &CircularBuffer<i64>, requested: i64, stats: &RunStats) -> Result<()> {
    let snapshot = json!({
        "circbuf_version":    env!("CARGO_PKG_VERSION"),
        "timestamp":          chrono::Local::now().to_rfc3339(),
        "requested_capacity": requested,
        "capacity":           buf.capacity(),
        "policy":             buf.policy(),
        "len":                buf.len(),
        "full":               buf.is_full(),
        "items":              buf,
        "popped":             stats.popped,
        "pushed":             stats.pushed,
        "overwritten":        stats.overwritten,
        "rejected":           stats.rejected,
    });
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn report(buf: &CircularBuffer<i64>, requested: i64, stats: &RunStats, cfg: &Config) -> String {
    let sep = &cfg.display.separator;
    let show = |v: Option<&i64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    let recent: Vec<i64> = buf.recent(cfg.display.spark_width).copied().collect();

    let mut out = String::new();
    out.push_str("circbuf report\n");
    out.push_str("══════════════\n");
    out.push_str(&format!("Capacity : {} (requested {})\n", buf.capacity(), requested));
    out.push_str(&format!("Policy   : {}\n", buf.policy()));
    out.push_str(&format!(
        "Count    : {} ({}){}\n",
        render::fmt_count(buf.len(), buf.capacity()),
        render::fmt_fill_pct(buf.len(), buf.capacity()),
        if buf.is_full() { " FULL" } else if buf.is_empty() { " EMPTY" } else { "" },
    ));
    out.push_str(&format!("Head     : {}\n", show(buf.peek())));
    out.push_str(&format!("Tail     : {}\n", show(buf.peek_back())));
    out.push_str(&format!("Contents : {}\n", render::listing(buf, sep)));
    out.push_str(&format!("Trend    : {}\n", render::sparkline(&recent)));
    out.push_str(&format!(
        "Pushed {} · overwrote {} · rejected {}\n",
        stats.pushed, stats.overwritten, stats.rejected
    ));
    if !stats.popped.is_empty() {
        out.push_str(&format!("Popped   : {}\n", render::listing(&stats.popped, sep)));
    }
    out
}

fn run_print_config(cfg: &Config, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_string_lossy().into_owned(),
        None    => Config::config_path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "(unknown)".to_string()),
    };
    println!("Config: {}", path);
    println!();
    println!("[buffer]");
    println!("  capacity    = {} (effective {})", cfg.buffer.capacity, cfg.buffer.effective_capacity());
    println!("  policy      = {}", cfg.buffer.policy);
    println!();
    println!("[display]");
    println!("  separator   = {:?}", cfg.display.separator);
    println!("  spark_width = {}", cfg.display.spark_width);
    Ok(())
}
