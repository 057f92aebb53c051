//! unwiki CLI - Wikipedia dump to sentence dataset tool
//!
//! A command-line tool for turning MediaWiki dumps into Parquet or JSON Lines records.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use unwiki::{CleanOptions, OutputFormat, Record, RunStats, Unwiki};

/// Japanese Wikipedia dump to sentence-level training text
#[derive(Parser)]
#[command(
    name = "unwiki",
    author = "iyulab",
    version,
    about = "Extract sentence-level text from Wikipedia dumps",
    long_about = "unwiki - Wikipedia dump cleaning tool.\n\n\
                  Strips templates, links, tables and boilerplate sections from\n\
                  wikitext and writes one record per sentence line.\n\n\
                  Usage:\n  \
                  unwiki extract <dump>          Extract a whole dump to ./data\n  \
                  unwiki page <file>             Clean a single wikitext file\n  \
                  unwiki config > config.json    Dump the default configuration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a dump (.xml, .xml.bz2 or .xml.gz) into rotating output files
    Extract {
        /// Dump file path
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "data")]
        output: PathBuf,

        /// Output file format
        #[arg(short, long, value_enum, default_value = "parquet")]
        format: FormatArg,

        /// Rotate output files above this size (MB)
        #[arg(long, default_value = "500")]
        max_file_size: u64,

        /// JSON configuration file (see `unwiki config`)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Worker threads (0 = all cores)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,

        /// Clean on a single thread
        #[arg(long)]
        sequential: bool,

        /// Pages cleaned per batch
        #[arg(long, default_value = "256")]
        batch_size: usize,
    },

    /// Clean one raw wikitext file and print its records
    Page {
        /// Wikitext file path (`-` for stdin)
        input: PathBuf,

        /// Article title (default: file stem)
        #[arg(short, long)]
        title: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print records as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration as JSON
    Config,

    /// Show version information
    Version,
}

/// Output file format
#[derive(Clone, ValueEnum)]
enum FormatArg {
    /// Typed Parquet files (default)
    Parquet,
    /// JSON Lines files
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Parquet => OutputFormat::Parquet,
            FormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            format,
            max_file_size,
            config,
            threads,
            sequential,
            batch_size,
        } => {
            let mut settings = builder(config.as_deref())?
                .with_threads(threads)
                .with_batch_size(batch_size)
                .with_output_format(format.into())
                .with_max_file_size(max_file_size.saturating_mul(1024 * 1024));
            if sequential {
                settings = settings.sequential();
            }
            run_extract(&input, &output, settings)?;
        }

        Commands::Page {
            input,
            title,
            config,
            json,
        } => {
            let markup = read_input(&input)?;
            let title = title.unwrap_or_else(|| {
                input
                    .file_stem()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string()
            });

            let pipeline = builder(config.as_deref())?.sequential().build()?;
            let records = pipeline.process_article(&title, &markup);
            write_records(&records, json)?;
        }

        Commands::Config => {
            let json = serde_json::to_string_pretty(&CleanOptions::default())?;
            println!("{}", json);
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

/// Run the extract command over a whole dump
fn run_extract(
    input: &Path,
    output: &Path,
    settings: Unwiki,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = settings.build()?;
    let format = pipeline.output_format();

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))?;
    }

    tracing::info!(input = %input.display(), output = %output.display(), %format, "extracting dump");
    let pb = create_spinner(&format!("Extracting {}...", input.display()));
    let started = Instant::now();
    let stats = pipeline.extract_dump(input, output, Some(cancel.as_ref()));
    pb.finish_and_clear();
    let stats = stats?;

    print_summary(&stats, output, format, started.elapsed());
    Ok(())
}

fn builder(config: Option<&Path>) -> Result<Unwiki, Box<dyn std::error::Error>> {
    Ok(match config {
        Some(path) => Unwiki::new().with_config_file(path)?,
        None => Unwiki::new(),
    })
}

fn read_input(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_records(records: &[Record], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for record in records {
        if json {
            serde_json::to_writer(&mut handle, record)?;
            writeln!(handle)?;
        } else {
            writeln!(handle, "{}\t{}", record.topic_title, record.text)?;
        }
    }
    Ok(())
}

fn print_summary(
    stats: &RunStats,
    output: &Path,
    format: OutputFormat,
    elapsed: std::time::Duration,
) {
    if stats.cancelled {
        println!("{}", "Extraction Cancelled".yellow().bold());
    } else {
        println!("{}", "Extraction Complete".green().bold());
    }
    println!("{}", "─".repeat(40));
    println!("{}: {} ({})", "Output".bold(), output.display(), format);
    println!("{}: {}", "Pages read".bold(), stats.pages_read);
    println!("{}: {}", "Articles".bold(), stats.articles);
    println!("{}: {}", "Records".bold(), stats.records);
    println!("{}: {}", "Filtered".bold(), stats.filtered);
    println!("{}: {}", "Missing fields".bold(), stats.skipped_missing);
    println!("{}: {}", "Elapsed".bold(), format_duration(elapsed));
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

fn print_version() {
    println!("{} {}", "unwiki".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Wikipedia dump to sentence-level Parquet or JSON Lines");
    println!();
    println!("Supported inputs: .xml, .xml.bz2, .xml.gz");
    println!("Repository: https://github.com/iyulab/unwiki");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::parse_from(["unwiki", "extract", "dump.xml.bz2"]);
        match cli.command {
            Commands::Extract {
                output,
                format,
                max_file_size,
                threads,
                sequential,
                batch_size,
                ..
            } => {
                assert_eq!(output, PathBuf::from("data"));
                assert_eq!(OutputFormat::from(format), OutputFormat::Parquet);
                assert_eq!(max_file_size, 500);
                assert_eq!(threads, 0);
                assert!(!sequential);
                assert_eq!(batch_size, 256);
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_extract_jsonl_format() {
        let cli = Cli::parse_from(["unwiki", "extract", "dump.xml", "--format", "jsonl"]);
        match cli.command {
            Commands::Extract { format, .. } => {
                assert_eq!(OutputFormat::from(format), OutputFormat::Jsonl);
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }
}
