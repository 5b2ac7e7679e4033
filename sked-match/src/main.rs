//! sked-match - Main entry point
//!
//! Reads a tab-separated schedule sheet and a report (one title per line),
//! resolves every report title against the schedule and writes
//! `title<TAB>airings` lines to stdout.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use sked_common::config::load_config;
use sked_common::logging::init_tracing;
use sked_match::report::read_report_text;
use sked_match::schedule_source::load_schedule_file;
use sked_match::{AiringFormatter, ReportProcessor, Resolution, Resolver, ScheduleIndex};

/// Command-line arguments for sked-match
#[derive(Parser, Debug)]
#[command(name = "sked-match")]
#[command(about = "Resolve broadcast report titles to scheduled airings")]
#[command(version)]
struct Args {
    /// Schedule sheet (tab-separated: time, title; day headers between)
    #[arg(short, long)]
    schedule: PathBuf,

    /// Report file, one program title per line
    #[arg(short, long)]
    report: PathBuf,

    /// Config file (overrides SKED_CONFIG and the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum airings rendered per title
    #[arg(short, long)]
    limit: Option<usize>,

    /// Omit titles without a match from the output
    #[arg(long)]
    prune: bool,

    /// Print ranked candidates and the deciding strategy for each title
    #[arg(long)]
    explain: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(limit) = args.limit {
        config.format.limit = limit;
    }
    init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!(
        schedule = %args.schedule.display(),
        report = %args.report.display(),
        "Starting sked-match"
    );

    let (index, _) = load_schedule_file(&args.schedule)
        .with_context(|| format!("Failed to read schedule {}", args.schedule.display()))?;
    index.validate().context("Schedule index failed validation")?;

    let report = std::fs::read_to_string(&args.report)
        .with_context(|| format!("Failed to read report {}", args.report.display()))?;
    let titles = read_report_text(&report);

    let formatter = AiringFormatter::new(&config.format).context("Invalid format settings")?;
    let resolver = Resolver::new(config.matching.clone());

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.explain {
        for title in titles.iter().filter(|t| !t.is_empty()) {
            let resolution = resolver.explain(title, &index);
            write_explanation(&mut out, &resolution, &formatter, &index)?;
        }
    } else {
        let processor = ReportProcessor::new(resolver, formatter).prune_unmatched(args.prune);
        let (lines, _) = processor.process(&titles, &index);
        for line in lines {
            writeln!(out, "{}\t{}", line.title, line.rendered)?;
        }
    }

    out.flush().context("Failed to write output")?;
    Ok(())
}

fn write_explanation(
    out: &mut impl Write,
    resolution: &Resolution,
    formatter: &AiringFormatter,
    index: &ScheduleIndex,
) -> Result<()> {
    let query = &resolution.query;
    writeln!(out, "{}", query.title)?;
    writeln!(out, "  base: {}  episodes: {}", query.base, query.episodes)?;
    writeln!(out, "  strategy: {}", resolution.strategy.unwrap_or("none"))?;
    writeln!(out, "  airings: {}", formatter.format(&resolution.airings))?;

    for (rank, candidate) in resolution.candidates.iter().enumerate() {
        let m = &candidate.metrics;
        let airings = index.get(&candidate.key).map_or(0, <[_]>::len);
        writeln!(
            out,
            "  #{:<2} {:>7.2}  {} {}  [ratio {:.0} partial {:.0} set {:.0} sort {:.0} jaccard {:.2} overlap {:.2} cross {:.2}{}] {} airing(s)",
            rank + 1,
            candidate.score,
            candidate.key.base,
            candidate.key.episodes,
            m.ratio,
            m.partial,
            m.token_set,
            m.token_sort,
            m.jaccard,
            m.word_overlap,
            m.cross_token,
            if m.contains { " contains" } else { "" },
            airings,
        )?;
    }
    Ok(())
}
