//! Report processing
//!
//! Resolves every title of a broadcast report against a schedule index and
//! renders the airings for writing back next to the title.

use crate::format::AiringFormatter;
use crate::index::ScheduleIndex;
use crate::resolver::Resolver;
use chrono::NaiveDateTime;
use tracing::info;

/// Candidates listed when a title goes unmatched
const NO_MATCH_CANDIDATES: usize = 3;

/// One processed report row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub title: String,
    pub airings: Vec<NaiveDateTime>,
    /// Formatted airings, empty when unmatched
    pub rendered: String,
}

impl ReportLine {
    pub fn is_match(&self) -> bool {
        !self.airings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub rows: usize,
    pub matched: usize,
    pub missed: usize,
    /// Blank titles
    pub skipped: usize,
}

/// Split report text into titles, one per line
pub fn read_report_text(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim().to_string()).collect()
}

pub struct ReportProcessor {
    resolver: Resolver,
    formatter: AiringFormatter,
    prune_unmatched: bool,
}

impl ReportProcessor {
    pub fn new(resolver: Resolver, formatter: AiringFormatter) -> Self {
        Self {
            resolver,
            formatter,
            prune_unmatched: false,
        }
    }

    /// Drop unmatched rows from the output instead of emitting them blank
    pub fn prune_unmatched(mut self, prune: bool) -> Self {
        self.prune_unmatched = prune;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve one title; `None` for a blank title
    pub fn process_title(&self, title: &str, index: &ScheduleIndex) -> Option<ReportLine> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let resolution = self.resolver.explain(title, index);
        if !resolution.is_match() {
            let top: Vec<String> = resolution
                .candidates
                .iter()
                .take(NO_MATCH_CANDIDATES)
                .map(|c| format!("{} {} ({:.1})", c.key.base, c.key.episodes, c.score))
                .collect();
            info!(
                title = %title,
                episodes = %resolution.query.episodes,
                candidates = ?top,
                "NO MATCH"
            );
        }

        let rendered = self.formatter.format(&resolution.airings);
        Some(ReportLine {
            title: title.to_string(),
            airings: resolution.airings,
            rendered,
        })
    }

    /// Resolve every title in report order
    pub fn process<I, S>(&self, titles: I, index: &ScheduleIndex) -> (Vec<ReportLine>, ReportStats)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines = Vec::new();
        let mut stats = ReportStats::default();

        for title in titles {
            stats.rows += 1;
            let Some(line) = self.process_title(title.as_ref(), index) else {
                stats.skipped += 1;
                continue;
            };

            if line.is_match() {
                stats.matched += 1;
            } else {
                stats.missed += 1;
                if self.prune_unmatched {
                    continue;
                }
            }
            lines.push(line);
        }

        info!(
            rows = stats.rows,
            matched = stats.matched,
            missed = stats.missed,
            skipped = stats.skipped,
            pruned = self.prune_unmatched,
            "Report processed"
        );
        (lines, stats)
    }
}
