//! Radar binary entry point.
//!
//! This binary queries the works API for a keyword and publication-date range
//! and prints summary metrics, the per-cluster chart data and the detail
//! table. It supports both single-query and interactive REPL modes, with
//! table or JSON output.
//!
//! # Examples
//!
//! Single query over the last year:
//! ```bash
//! radar --keyword "photocatalysis VOCs"
//! ```
//!
//! JSON output with an explicit range and a top-5 chart:
//! ```bash
//! radar --keyword glaucoma --start 2024-01-01 --end 2024-06-30 --top-n 5 --format json
//! ```
//!
//! Interactive mode:
//! ```bash
//! radar --interactive
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, Months, NaiveDate};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use scholar_radar::{
    history::SearchHistory,
    models::{ResultSet, StopReason},
    pipeline::QueryPipeline,
    provider::openalex::OpenAlexProvider,
    RadarConfig, DEFAULT_LIMIT, HISTORY_DISPLAY_LEN,
};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Widest bar drawn in the cluster chart
const BAR_WIDTH: usize = 30;

/// Output format for query results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Metrics, cluster chart and detail tables
    Table,
    /// Machine-readable JSON of the full result set
    Json,
}

/// Scholarly works radar with journal impact-factor enrichment
#[derive(Parser, Debug)]
#[command(
    name = "radar",
    version,
    about = "Search recent scholarly works and chart topic volume against journal impact factor",
    long_about = "Query the OpenAlex works API for a keyword and publication-date range, \
                  match each journal against a static impact-factor table and summarize \
                  the results per topic cluster.

EXAMPLES:
  Last year of a topic:
    radar --keyword \"photocatalysis VOCs\"

  Explicit range, top 5 clusters, JSON:
    radar --keyword glaucoma --start 2024-01-01 --end 2024-06-30 --top-n 5 --format json

  Interactive mode with polite-pool contact:
    RADAR_MAILTO=me@example.org radar --interactive"
)]
struct Args {
    /// Search keyword (required for single-query mode, omitted in interactive mode)
    #[arg(long, short = 'k', value_name = "TEXT", conflicts_with = "interactive")]
    keyword: Option<String>,

    /// First publication date (YYYY-MM-DD, default: one year before --end)
    #[arg(long, value_name = "DATE")]
    start: Option<NaiveDate>,

    /// Last publication date (YYYY-MM-DD, default: today)
    #[arg(long, value_name = "DATE")]
    end: Option<NaiveDate>,

    /// Maximum number of works to retrieve
    #[arg(long, value_name = "N", default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Number of clusters in the chart (default: all)
    #[arg(long, value_name = "N")]
    top_n: Option<usize>,

    /// Cap on impact-factor points listed per cluster
    #[arg(long, value_name = "N")]
    max_points: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Enable interactive REPL mode
    #[arg(long, short = 'i')]
    interactive: bool,

    /// Contact address for the polite pool (overrides RADAR_MAILTO)
    #[arg(long, value_name = "EMAIL")]
    mailto: Option<String>,

    /// API root (overrides RADAR_BASE_URL)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Page size per request (overrides RADAR_PER_PAGE)
    #[arg(long, value_name = "N")]
    per_page: Option<usize>,

    /// Pause between page requests in milliseconds (overrides RADAR_THROTTLE_MS)
    #[arg(long, value_name = "MS")]
    throttle_ms: Option<u64>,

    /// Logging verbosity level
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

/// Mutable query settings of a session
#[derive(Debug, Clone)]
struct Session {
    start: NaiveDate,
    end: NaiveDate,
    limit: usize,
    format: OutputFormat,
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

/// Build the configuration: defaults, then environment, then flags
fn build_config(args: &Args) -> Result<RadarConfig> {
    let mut config = RadarConfig::from_env().with_context(|| "Failed to read RADAR_* environment")?;

    if let Some(mailto) = &args.mailto {
        config.mailto = Some(mailto.clone());
    }
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(per_page) = args.per_page {
        config.per_page = per_page;
    }
    if let Some(throttle_ms) = args.throttle_ms {
        config.throttle_ms = throttle_ms;
    }
    config.top_n = args.top_n;
    config.max_points_per_cluster = args.max_points;

    config.validate().with_context(|| "Invalid configuration")?;
    Ok(config)
}

/// Default date range: one year up to `end` (today if unset)
fn resolve_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let start = start.unwrap_or_else(|| end.checked_sub_months(Months::new(12)).unwrap_or(end));
    (start, end)
}

/// Shorten text to `max` characters, adding an ellipsis
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Format the headline metrics
fn format_metrics_table(result: &ResultSet) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Works retrieved").add_attribute(Attribute::Bold),
        Cell::new("Impact factor matched").add_attribute(Attribute::Bold),
        Cell::new("Match rate").add_attribute(Attribute::Bold),
        Cell::new("Pages").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new(result.records.len()),
        Cell::new(result.matched_count()),
        Cell::new(format!("{:.1}%", result.match_rate * 100.0)),
        Cell::new(result.pages_requested),
    ]);

    table.to_string()
}

/// Format the cluster chart: volume bar and impact-factor spread per cluster
fn format_cluster_table(result: &ResultSet) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Topic cluster").add_attribute(Attribute::Bold),
        Cell::new("Works").add_attribute(Attribute::Bold),
        Cell::new("Volume").add_attribute(Attribute::Bold),
        Cell::new("Mean IF").add_attribute(Attribute::Bold),
        Cell::new("IF range").add_attribute(Attribute::Bold),
        Cell::new("IF points").add_attribute(Attribute::Bold),
    ]);

    let max_count = result
        .chart_clusters
        .iter()
        .map(|stat| stat.publication_count)
        .max()
        .unwrap_or(1)
        .max(1);

    for stat in &result.chart_clusters {
        let bar_len = (stat.publication_count * BAR_WIDTH).div_ceil(max_count);
        let low = stat.impact_factors.iter().copied().fold(f64::INFINITY, f64::min);
        let high = stat.impact_factors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if stat.impact_factors.is_empty() {
            "-".to_string()
        } else {
            format!("{:.1} - {:.1}", low, high)
        };
        let points = stat
            .impact_factors
            .iter()
            .map(|score| format!("{:.1}", score))
            .collect::<Vec<_>>()
            .join(" ");

        table.add_row(vec![
            Cell::new(&stat.topic_cluster),
            Cell::new(stat.publication_count),
            Cell::new("█".repeat(bar_len)).fg(Color::Cyan),
            Cell::new(
                stat.mean_impact_factor()
                    .map(|mean| format!("{:.1}", mean))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(range),
            Cell::new(truncate(&points, 60)).fg(Color::Yellow),
        ]);
    }

    table.to_string()
}

/// Format the detail table of every retrieved work
fn format_detail_table(result: &ResultSet) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Date").add_attribute(Attribute::Bold),
        Cell::new("Cluster").add_attribute(Attribute::Bold),
        Cell::new("IF").add_attribute(Attribute::Bold),
        Cell::new("Journal").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("DOI").add_attribute(Attribute::Bold),
    ]);

    for record in &result.records {
        let impact = if record.is_matched() {
            Cell::new(record.impact_factor_label()).fg(Color::Green)
        } else {
            Cell::new(record.impact_factor_label()).fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(&record.publication_date),
            Cell::new(truncate(&record.topic_cluster, 24)),
            impact,
            Cell::new(truncate(&record.journal_name, 32)),
            Cell::new(truncate(&record.title, 60)),
            Cell::new(&record.doi_identifier),
        ]);
    }

    table.to_string()
}

/// Print a result set in the chosen format
fn print_result(result: &ResultSet, format: OutputFormat, elapsed: Duration) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(result)
                .with_context(|| "Failed to serialize results to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if result.is_empty() {
                println!("No works found. Try widening the date range or changing the keyword.");
            } else {
                println!("{}", format_metrics_table(result));
                if result.chart_clusters.is_empty() {
                    println!("\nNo journal matched the impact-factor table; see the full list below.");
                } else {
                    println!("\nTopic clusters (volume vs. impact factor)");
                    println!("{}", format_cluster_table(result));
                }
                println!("\nWorks");
                println!("{}", format_detail_table(result));
            }
            if let StopReason::RequestFailed(reason) = &result.stop_reason {
                eprintln!("Warning: retrieval stopped early ({}); results are partial.", reason);
            }
            println!("\nFinished in {:.2}s", elapsed.as_secs_f64());
        }
    }
    Ok(())
}

/// Run one query behind a spinner and print it
async fn execute_query(
    pipeline: &QueryPipeline<OpenAlexProvider>,
    keyword: &str,
    session: &Session,
) -> Result<()> {
    debug!("Executing query for keyword: {}", keyword);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .with_context(|| "Invalid spinner template")?,
    );
    spinner.set_message(format!(
        "Analyzing '{}' from {} to {}...",
        keyword, session.start, session.end
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let started = Instant::now();
    let outcome = pipeline
        .run_query(keyword, session.start, session.end, session.limit)
        .await;
    spinner.finish_and_clear();

    let result: Arc<ResultSet> =
        outcome.with_context(|| format!("Failed to run query for keyword: '{}'", keyword))?;
    print_result(&result, session.format, started.elapsed())
}

fn print_help() {
    println!("Commands:");
    println!("  <keyword>         - Search for works");
    println!("  !N                - Rerun history entry N (see /history)");
    println!("  /history          - Show recent searches");
    println!("  /range START END  - Set publication date range (YYYY-MM-DD)");
    println!("  /limit N          - Set maximum number of works");
    println!("  /top N|all        - Set number of clusters in the chart");
    println!("  /format table     - Use table output format");
    println!("  /format json      - Use JSON output format");
    println!("  /help             - Show this help");
    println!("  Ctrl+D or Ctrl+C  - Exit");
}

/// Run interactive REPL mode
async fn run_interactive(mut pipeline: QueryPipeline<OpenAlexProvider>, mut session: Session) -> Result<()> {
    println!("Interactive Scholar Radar");
    print_help();
    println!();

    let mut rl = DefaultEditor::new().with_context(|| "Failed to create readline editor")?;
    let mut history = SearchHistory::with_presets();

    loop {
        let readline = rl.readline("Radar> ");
        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line).ok();

                if let Some(index) = line.strip_prefix('!') {
                    let recent = history.recent(HISTORY_DISPLAY_LEN);
                    match index.parse::<usize>() {
                        Ok(n) if n >= 1 && n <= recent.len() => {
                            let keyword = recent[n - 1].to_string();
                            println!("Searching '{}'", keyword);
                            if let Err(e) = execute_query(&pipeline, &keyword, &session).await {
                                eprintln!("Query failed: {:#}", e);
                            }
                        }
                        _ => eprintln!("Invalid history entry: use /history to list entries"),
                    }
                    continue;
                }

                if line.starts_with('/') {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    match parts[0] {
                        "/help" => print_help(),
                        "/history" => {
                            for (i, keyword) in history.recent(HISTORY_DISPLAY_LEN).iter().enumerate() {
                                println!("  !{}  {}", i + 1, keyword);
                            }
                        }
                        "/range" => {
                            if parts.len() != 3 {
                                eprintln!("Usage: /range START END");
                                continue;
                            }
                            match (parts[1].parse::<NaiveDate>(), parts[2].parse::<NaiveDate>()) {
                                (Ok(start), Ok(end)) if start <= end => {
                                    session.start = start;
                                    session.end = end;
                                    println!("Set date range: {} - {}", start, end);
                                }
                                (Ok(_), Ok(_)) => eprintln!("Invalid date range: START must be <= END"),
                                _ => eprintln!("Invalid date: use YYYY-MM-DD"),
                            }
                        }
                        "/limit" => {
                            if parts.len() != 2 {
                                eprintln!("Usage: /limit N");
                                continue;
                            }
                            match parts[1].parse::<usize>() {
                                Ok(n) if n > 0 => {
                                    session.limit = n;
                                    println!("Set limit to {}", n);
                                }
                                _ => eprintln!("Invalid number: must be a positive integer"),
                            }
                        }
                        "/top" => {
                            if parts.len() != 2 {
                                eprintln!("Usage: /top N|all");
                                continue;
                            }
                            if parts[1] == "all" {
                                pipeline.set_top_n(None);
                                println!("Chart shows all clusters");
                                continue;
                            }
                            match parts[1].parse::<usize>() {
                                Ok(n) if n > 0 => {
                                    pipeline.set_top_n(Some(n));
                                    println!("Chart shows top {} clusters", n);
                                }
                                _ => eprintln!("Invalid number: must be a positive integer"),
                            }
                        }
                        "/format" => {
                            if parts.len() != 2 {
                                eprintln!("Usage: /format [table|json]");
                                continue;
                            }
                            match parts[1] {
                                "table" => {
                                    session.format = OutputFormat::Table;
                                    println!("Set output format to table");
                                }
                                "json" => {
                                    session.format = OutputFormat::Json;
                                    println!("Set output format to JSON");
                                }
                                _ => eprintln!("Invalid format: must be 'table' or 'json'"),
                            }
                        }
                        _ => eprintln!("Unknown command: {}. Type /help for available commands.", parts[0]),
                    }
                } else {
                    history.record(line);
                    if let Err(e) = execute_query(&pipeline, line, &session).await {
                        eprintln!("Query failed: {:#}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level);

    // Validate arguments
    if !args.interactive && args.keyword.is_none() {
        anyhow::bail!(
            "Either --keyword or --interactive must be specified.\n\
             Use --help for usage information."
        );
    }

    if args.limit == 0 {
        anyhow::bail!("Invalid limit: --limit must be a positive integer");
    }

    let (start, end) = resolve_range(args.start, args.end);
    if start > end {
        anyhow::bail!(
            "Invalid date range: start date ({}) cannot be after end date ({})",
            start,
            end
        );
    }

    let config = build_config(&args)?;
    info!(
        "Using {} (per-page {}, throttle {}ms, polite pool: {})",
        config.base_url,
        config.per_page,
        config.throttle_ms,
        config.mailto.is_some()
    );

    let pipeline = QueryPipeline::openalex(&config).with_context(|| "Failed to set up query pipeline")?;

    let session = Session {
        start,
        end,
        limit: args.limit,
        format: args.format,
    };

    match args.keyword {
        Some(keyword) => execute_query(&pipeline, &keyword, &session).await?,
        None => run_interactive(pipeline, session).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_range_defaults_to_one_year() {
        let end = NaiveDate::from_ymd_opt(2024, 10, 18).unwrap();
        let (start, resolved_end) = resolve_range(None, Some(end));
        assert_eq!(resolved_end, end);
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 10, 18).unwrap());

        let leap = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, _) = resolve_range(None, Some(leap));
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long title", 10), "a rathe...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "radar",
            "--keyword",
            "glaucoma",
            "--start",
            "2024-01-01",
            "--limit",
            "50",
            "--top-n",
            "2",
        ])
        .unwrap();
        assert_eq!(args.keyword.as_deref(), Some("glaucoma"));
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.limit, 50);
        assert_eq!(args.top_n, Some(2));

        let conflict = Args::try_parse_from(["radar", "--keyword", "x", "--interactive"]);
        assert!(conflict.is_err());
    }
}
