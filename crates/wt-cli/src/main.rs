mod play;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use wt_core::{Calendar, Category, CategorySummary, WordStats};
use wt_data::{LoadedDataset, load_dataset};

use crate::play::{PlayOptions, SpeedStep};

#[derive(Parser)]
#[command(name = "wt", about = "Word-frequency timeline inspector and headless player")]
struct Cli {
    /// Dataset manifest (falls back to WT_DATASET)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the calendar span and per-category statistics
    Stats,

    /// List the words of a category
    Words {
        /// Category code or name (social, us, global, health, economy)
        category: String,
    },

    /// Show one word's series and extremes
    Word {
        category: String,
        word: String,
    },

    /// Run the playback clock headlessly and print its events
    Play {
        /// Number of ticks to run
        #[arg(long, default_value_t = 60)]
        frames: u32,

        /// Seconds of playback time per tick
        #[arg(long, default_value_t = 0.25)]
        dt: f32,

        /// Speed steps applied before the first tick, in order
        #[arg(long, value_enum)]
        speed: Vec<SpeedStep>,

        /// Tick on a wall-clock interval instead of as fast as possible
        #[arg(long)]
        realtime: bool,
    },
}

fn open_dataset(cli: &Cli) -> Result<LoadedDataset> {
    let path = cli
        .dataset
        .clone()
        .or_else(|| std::env::var("WT_DATASET").ok().map(PathBuf::from))
        .context("no dataset given: pass --dataset or set WT_DATASET")?;
    load_dataset(&path).with_context(|| format!("failed to load dataset {}", path.display()))
}

fn parse_category(raw: &str) -> Result<Category> {
    raw.parse::<Category>()
        .with_context(|| format!("unknown category '{raw}'"))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Stats => cmd_stats(&cli),
        Commands::Words { category } => cmd_words(&cli, category),
        Commands::Word { category, word } => cmd_word(&cli, category, word),
        Commands::Play {
            frames,
            dt,
            speed,
            realtime,
        } => {
            let options = PlayOptions {
                frames: *frames,
                dt: *dt,
                steps: speed.clone(),
                realtime: *realtime,
                json: cli.json,
            };
            let dataset = open_dataset(&cli)?;
            play::run(dataset, options).await
        }
    }
}

// ---------------------------------------------------------------------------
// Inspection commands
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct StatsReport {
    calendar: Calendar,
    categories: Vec<CategorySummary>,
    rejected_rows: usize,
    story_points: usize,
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let dataset = open_dataset(cli)?;
    let cache = &dataset.engine.cache;
    let calendar = cache.calendar();

    let report = StatsReport {
        calendar: *calendar,
        categories: cache.categories().map(|c| cache.summary(c)).collect(),
        rejected_rows: dataset.rejected_rows(),
        story_points: dataset.engine.story_points.len(),
    };

    if cli.json {
        return print_json(&report);
    }

    println!(
        "span:       {} .. {} ({} days)",
        calendar.label(1),
        calendar.label(calendar.total_days()),
        calendar.total_days()
    );
    println!("rejected:   {}", report.rejected_rows);
    println!("stories:    {}", report.story_points);
    for s in &report.categories {
        println!(
            "{:<16} words={} mentions={} max_total={} max_active={}",
            s.category.display_name(),
            s.words,
            s.total_mentions,
            s.max_total_word_count,
            s.max_active_word_count
        );
    }
    Ok(())
}

fn cmd_words(cli: &Cli, category: &str) -> Result<()> {
    let category = parse_category(category)?;
    let dataset = open_dataset(cli)?;
    let words = dataset.engine.cache.store().words(category);

    if cli.json {
        return print_json(&words);
    }

    if words.is_empty() {
        println!("(no words in {category})");
    }
    for word in words {
        println!("{word}");
    }
    Ok(())
}

#[derive(Serialize)]
struct WordReport<'a> {
    category: Category,
    word: &'a str,
    #[serde(flatten)]
    stats: WordStats,
    categories: Vec<Category>,
    /// ISO dates with their recorded counts.
    series: Vec<(String, u64)>,
}

fn cmd_word(cli: &Cli, category: &str, word: &str) -> Result<()> {
    let category = parse_category(category)?;
    let dataset = open_dataset(cli)?;
    let cache = &dataset.engine.cache;

    let stats = cache.word_stats(category, word)?;
    let series = cache.store().word_series(category, word)?;

    let report = WordReport {
        category,
        word: series.word(),
        stats,
        categories: cache.store().categories_of_word(word),
        series: series.iter().map(|(d, c)| (d.to_string(), c)).collect(),
    };

    if cli.json {
        return print_json(&report);
    }

    println!("word:       {} ({})", report.word, category);
    println!("max_count:  {}", stats.max_count);
    println!("max_delta:  {}", stats.max_absolute_delta);
    let names: Vec<&str> = report.categories.iter().map(|c| c.display_name()).collect();
    println!("found in:   {}", names.join(", "));
    for (date, count) in &report.series {
        println!("  {date}  {count}");
    }
    Ok(())
}
