//! Command-line interface for the word-game vocabulary database.
//!
//! Each subcommand opens the database, performs one pass and prints a
//! summary line. Fatal errors exit with status 1; skipped records are
//! reported as warnings and do not affect the exit status.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wordgame_db::{
    ExportOptions, LanguageInfo, ProgressCallback, ProgressUpdate, Result, WordDb, WordDbError,
    WordImportOptions, convert_csv, default_db_path, export::DEFAULT_EXPORT_LENGTH,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Word-game vocabulary database tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the language database (defaults to word_<lang>.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Language code, e.g. "es"
    #[arg(short, long, global = true)]
    lang: Option<String>,

    /// Set verbosity level (use -v, -vv, or -vvv for increasing verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database tables and record the language (requires --lang)
    Init {
        /// Native name of the language, e.g. "español"
        #[arg(long)]
        name: String,
        /// English name of the language, e.g. "Spanish"
        #[arg(long)]
        english_name: String,
    },
    /// Add words from a CSV file (word, en_translation, [isAnswer, level, source, ...])
    ImportWords {
        csv_file: PathBuf,
        /// Source short name linked to rows that name no source
        #[arg(long)]
        source: Option<String>,
    },
    /// Add sources from a CSV file (lang, short_name, description)
    ImportSources { csv_file: PathBuf },
    /// Update word levels from a two-column CSV file (word, level)
    UpdateLevels { csv_file: PathBuf },
    /// Export words of one length to the word-game JSON format
    Export {
        /// Output JSON path (defaults to words_<lang>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Word length to export
        #[arg(long, default_value_t = DEFAULT_EXPORT_LENGTH)]
        length: usize,
    },
    /// Convert a two-column CSV file (word, translation) to the JSON format (requires --lang)
    Convert {
        /// Input CSV path
        #[arg(short, long)]
        input: PathBuf,
        /// Output JSON path
        #[arg(short, long, default_value = "out.json")]
        output: PathBuf,
    },
    /// List the sources in the database
    Sources,
}

/// Sets up logging based on verbosity level.
fn setup_logging(verbose: u8) {
    let log_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Creates a progress callback that drives a single bar for one pass.
fn create_progress_callback() -> ProgressCallback {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:>18.cyan.bold} {bar:40.cyan/blue} {pos:>6}/{len:6} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    Box::new(move |update: ProgressUpdate| {
        if update.current_item == 0 {
            pb.set_length(update.total_items);
            pb.set_prefix(update.stage_description);
        }
        pb.set_position(update.current_item);
        if let Some(msg) = update.message {
            pb.set_message(msg);
        }
        if update.current_item >= update.total_items {
            pb.finish_and_clear();
        }
    })
}

fn require_lang(lang: Option<&str>, command: &str) -> Result<String> {
    lang.map(str::to_string).ok_or_else(|| {
        WordDbError::InvalidArgument(format!("`{}` requires --lang <CODE>", command))
    })
}

fn resolve_db_path(cli_db: Option<&Path>, lang: Option<&str>) -> Result<PathBuf> {
    match (cli_db, lang) {
        (Some(path), _) => Ok(path.to_path_buf()),
        (None, Some(code)) => Ok(default_db_path(code)),
        (None, None) => Err(WordDbError::InvalidArgument(
            "either --db <PATH> or --lang <CODE> is required".to_string(),
        )),
    }
}

fn display_sources(db: &WordDb) -> Result<()> {
    println!("\n{}", "Current sources in database:".bold());
    println!("{}", "-".repeat(50));
    println!("{:6} | DESCRIPTION", "SHORT");
    println!("{}", "-".repeat(50));

    let sources = db.sources()?;
    if sources.is_empty() {
        println!("{}", "No sources found in database".yellow());
    } else {
        for source in sources {
            println!(
                "{} | {}",
                format!("{:6}", source.short_name).green(),
                source.description.unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let lang = cli.lang.as_deref();

    match cli.command {
        Commands::Init { name, english_name } => {
            let code = require_lang(lang, "init")?;
            let db_path = resolve_db_path(cli.db.as_deref(), lang)?;
            let language = LanguageInfo {
                language_name: name,
                english_name,
                language_code: code,
            };
            let db = WordDb::create(&db_path, &language)?;
            println!(
                "{}",
                format!("Successfully created database at {}", db.path().display()).green()
            );
        }
        Commands::ImportWords { csv_file, source } => {
            let mut db = WordDb::open(&resolve_db_path(cli.db.as_deref(), lang)?)?;
            let options = WordImportOptions {
                default_source: source,
            };
            let mut progress = create_progress_callback();
            let summary = db.import_words(&csv_file, &options, Some(&mut progress))?;
            println!(
                "\n{} Added: {}, Skipped: {}, Sources linked: {}",
                "Finished processing words.".green(),
                summary.added,
                summary.skipped,
                summary.sources_linked
            );
        }
        Commands::ImportSources { csv_file } => {
            let mut db = WordDb::open(&resolve_db_path(cli.db.as_deref(), lang)?)?;
            let code = db.language_code(lang)?;
            let mut progress = create_progress_callback();
            let summary = db.import_sources(&csv_file, &code, Some(&mut progress))?;
            println!(
                "\n{} Added: {}, Skipped: {}",
                "Finished processing sources.".green(),
                summary.added,
                summary.skipped
            );
            display_sources(&db)?;
        }
        Commands::UpdateLevels { csv_file } => {
            let mut db = WordDb::open(&resolve_db_path(cli.db.as_deref(), lang)?)?;
            let mut progress = create_progress_callback();
            let summary = db.update_levels(&csv_file, Some(&mut progress))?;
            println!(
                "{} Updated: {}, Not found: {}, Failed: {}",
                "Word levels updated.".green(),
                summary.updated,
                summary.unmatched,
                summary.failed
            );
        }
        Commands::Export { output, length } => {
            let db = WordDb::open(&resolve_db_path(cli.db.as_deref(), lang)?)?;
            let code = db.language_code(lang)?;
            let output = output.unwrap_or_else(|| PathBuf::from(format!("words_{}.json", code)));
            let options = ExportOptions {
                word_length: length,
            };
            match db.export(&output, &code, &options)? {
                Some(count) => println!(
                    "{}",
                    format!(
                        "Successfully extracted {} {}-letter words to {}",
                        count,
                        length,
                        output.display()
                    )
                    .green()
                ),
                None => println!(
                    "{}",
                    format!("No {}-letter words found; nothing written", length).yellow()
                ),
            }
        }
        Commands::Convert { input, output } => {
            let code = require_lang(lang, "convert")?;
            let mut progress = create_progress_callback();
            let summary = convert_csv(&input, &output, &code, Some(&mut progress))?;
            println!(
                "{}",
                format!(
                    "Successfully converted {} words ({} groups) to JSON in {}",
                    summary.words,
                    summary.groups,
                    output.display()
                )
                .green()
            );
        }
        Commands::Sources => {
            let db = WordDb::open(&resolve_db_path(cli.db.as_deref(), lang)?)?;
            display_sources(&db)?;
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    info!("Running {:?}", cli.command);

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}
