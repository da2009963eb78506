use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use tbp::config::{OutputFormat, Settings};
use tbp::parser::MASK_PLACEHOLDER;
use tbp::{capture, pattern, snapshot, Block, Extraction, Scan};

#[derive(Parser)]
#[command(name = "tbp", about = "Carve captured CLI output into blocks")]
struct Cli {
    /// Output format (overrides the config file)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,
    /// Config file (default: ./tbp.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Blocks from a start line up to (not including) an end line
    Fetch {
        /// Start-line pattern; groups after the first are reported as titles
        #[arg(short, long)]
        start: String,
        /// End-line pattern (default: derived from the start pattern's first group)
        #[arg(short, long)]
        end: Option<String>,
        #[command(flatten)]
        blocks: BlockArgs,
    },
    /// A new block at every start line
    Cut {
        #[arg(short, long)]
        start: String,
        #[command(flatten)]
        blocks: BlockArgs,
    },
    /// Blocks closed by end lines (inclusive), kept when they hold a start line
    Segment {
        #[arg(short, long)]
        start: String,
        #[arg(short, long)]
        end: String,
        #[command(flatten)]
        blocks: BlockArgs,
    },
    /// Capture groups of every matching line
    Grep {
        #[arg(short, long)]
        pattern: String,
        /// Print the lines that do NOT match instead
        #[arg(long)]
        drop: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Compare two captures of the same command
    Diff {
        before: PathBuf,
        after: PathBuf,
        /// Only compare the blocks opened by this pattern
        #[arg(short, long)]
        start: Option<String>,
        #[arg(short, long, requires = "start")]
        end: Option<String>,
        /// Ignore lines matching this pattern
        #[arg(long)]
        drop_lines: Option<String>,
        /// Hide spans matching this pattern
        #[arg(long)]
        mask: Option<String>,
        /// Keep uptime-style tokens as they are
        #[arg(long)]
        no_redact: bool,
    },
}

#[derive(Args)]
struct BlockArgs {
    /// Trim trailing whitespace and squeeze blank lines
    #[arg(long)]
    normalize: bool,
    /// Replace uptime-style tokens with a placeholder
    #[arg(long)]
    redact: bool,
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(format) = cli.format {
        settings.format = format;
    }
    debug!(?settings, "settings loaded");

    let code = match cli.command {
        Commands::Fetch { start, end, blocks } => {
            let start = pattern::compile(&start)?;
            let end = pattern::compile_opt(end.as_deref())?;
            run_scan(&settings, &blocks, Scan::Fetch { start: &start, end: end.as_ref() })?
        }
        Commands::Cut { start, blocks } => {
            let start = pattern::compile(&start)?;
            run_scan(&settings, &blocks, Scan::Cut { start: &start })?
        }
        Commands::Segment { start, end, blocks } => {
            let start = pattern::compile(&start)?;
            let end = pattern::compile(&end)?;
            run_scan(&settings, &blocks, Scan::Segment { start: &start, end: &end })?
        }
        Commands::Grep { pattern: expr, drop, files } => {
            let re = pattern::compile(&expr)?;
            run_grep(&settings, &re, drop, &files)?
        }
        Commands::Diff {
            before,
            after,
            start,
            end,
            drop_lines,
            mask,
            no_redact,
        } => {
            let opts = DiffOpts {
                start: pattern::compile_opt(start.as_deref())?,
                end: pattern::compile_opt(end.as_deref())?,
                drop: pattern::compile_opt(drop_lines.as_deref())?,
                mask: pattern::compile_opt(mask.as_deref())?,
                redact: settings.redact && !no_redact,
            };
            run_diff(&settings, &opts, &before, &after)?
        }
    };

    info!(elapsed = ?t0.elapsed(), "done");
    Ok(code)
}

#[derive(Serialize)]
struct FileReport<'a, T: Serialize> {
    file: &'a Path,
    #[serde(flatten)]
    result: T,
}

/// Read every file and run `f` on it, in parallel, keeping input order.
fn for_each_file<T, F>(settings: &Settings, files: &[PathBuf], f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(Block) -> T + Sync,
{
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = if settings.progress && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let results = files
        .par_iter()
        .map(|path| -> tbp::Result<T> {
            let lines = capture::read(path)?;
            pb.inc(1);
            Ok(f(lines))
        })
        .collect::<tbp::Result<Vec<T>>>()?;

    pb.finish_and_clear();
    Ok(results)
}

fn run_scan(settings: &Settings, args: &BlockArgs, scan: Scan<'_>) -> Result<ExitCode> {
    let results = for_each_file(settings, &args.files, |lines| {
        tidy(lines.scan(scan), args.normalize, args.redact)
    })?;

    match settings.format {
        OutputFormat::Json => {
            let reports: Vec<_> = args
                .files
                .iter()
                .zip(&results)
                .map(|(file, result)| FileReport { file, result })
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text => {
            let many = args.files.len() > 1;
            for (file, ex) in args.files.iter().zip(&results) {
                if many {
                    println!("==> {} <==", file.display());
                }
                print_blocks(ex);
            }
        }
    }

    let found = results.iter().any(|ex| !ex.is_empty());
    Ok(if found { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn tidy(mut ex: Extraction, normalize: bool, redact: bool) -> Extraction {
    if normalize {
        ex.blocks = ex.blocks.iter().map(Block::normalize).collect();
    }
    if redact {
        ex.blocks = ex.blocks.iter().map(Block::redact_durations).collect();
    }
    ex
}

fn print_blocks(ex: &Extraction) {
    for (i, (block, title)) in ex.iter().enumerate() {
        match title {
            Some(t) if !t.is_empty() => println!("--- block {} [{}]", i + 1, t.join(", ")),
            _ => println!("--- block {}", i + 1),
        }
        print!("{}", block);
    }
}

#[derive(Serialize)]
struct GrepResult {
    matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kept: Option<Block>,
}

fn run_grep(settings: &Settings, re: &Regex, drop: bool, files: &[PathBuf]) -> Result<ExitCode> {
    let results = for_each_file(settings, files, |lines| {
        if drop {
            let (matched, kept) = lines.filter_out(re);
            GrepResult { matched, rows: None, kept: Some(kept) }
        } else {
            let rows = lines.match_lines(re);
            GrepResult { matched: rows.is_some(), rows, kept: None }
        }
    })?;

    match settings.format {
        OutputFormat::Json => {
            let reports: Vec<_> = files
                .iter()
                .zip(&results)
                .map(|(file, result)| FileReport { file, result })
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text => {
            let many = files.len() > 1;
            for (file, r) in files.iter().zip(&results) {
                let prefix = if many { format!("{}:", file.display()) } else { String::new() };
                if let Some(kept) = &r.kept {
                    for line in kept {
                        println!("{}{}", prefix, line);
                    }
                }
                for row in r.rows.iter().flatten() {
                    println!("{}{}", prefix, row.join("\t"));
                }
            }
        }
    }

    let matched = results.iter().any(|r| r.matched);
    Ok(if matched { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

struct DiffOpts {
    start: Option<Regex>,
    end: Option<Regex>,
    drop: Option<Regex>,
    mask: Option<Regex>,
    redact: bool,
}

impl DiffOpts {
    /// The text of one capture as it takes part in the comparison.
    fn render(&self, path: &Path) -> Result<String> {
        let mut lines = capture::read(path)?;
        if let Some(start) = &self.start {
            lines = lines
                .fetch(start, self.end.as_ref())
                .blocks
                .into_iter()
                .flatten()
                .collect();
        }
        // drop and mask patterns are written against the raw capture
        if let Some(drop) = &self.drop {
            lines = lines.filter_out(drop).1;
        }
        if let Some(mask) = &self.mask {
            lines = lines.replace_all(mask, MASK_PLACEHOLDER);
        }
        if self.redact {
            lines = lines.redact_durations();
        }
        Ok(lines.diff_format(None, None))
    }
}

#[derive(Serialize)]
struct DiffReport<'a> {
    before: &'a Path,
    after: &'a Path,
    changed: bool,
    inserted: usize,
    deleted: usize,
    ratio: f32,
    diff: String,
}

fn run_diff(settings: &Settings, opts: &DiffOpts, before: &Path, after: &Path) -> Result<ExitCode> {
    let old = opts.render(before)?;
    let new = opts.render(after)?;
    let d = snapshot::diff(&old, &new);
    let changed = d.has_changes();
    let text = d.unified(settings.diff_context);

    match settings.format {
        OutputFormat::Json => {
            let report = DiffReport {
                before,
                after,
                changed,
                inserted: d.inserted(),
                deleted: d.deleted(),
                ratio: d.ratio(),
                diff: text,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print!("{}", text),
    }

    info!(inserted = d.inserted(), deleted = d.deleted(), "compared captures");
    Ok(if changed { ExitCode::from(1) } else { ExitCode::SUCCESS })
}
