//! Candidate scoring
//!
//! Ranks schedule keys against a report title. Every distinct base title in
//! the index is scored once against the report's base with a battery of
//! similarity metrics; accepted bases contribute all of their episode keys,
//! ranked by the base's composite score.
//!
//! Composite score for an accepted base:
//!
//! ```text
//! max(ratio, partial, token_set, token_sort)
//!   + jaccard * jaccard_weight
//!   + word_overlap * word_overlap_weight
//!   + cross_token * cross_token_weight
//!   + bonuses for each triggered criterion
//! ```
//!
//! Containment of one base in the other carries a bonus larger than any
//! score reachable without it, so it always ranks first.

pub mod similarity;

use crate::index::ScheduleKey;
use crate::normalize::{norm_base_only, split_base_and_episodes};
use serde::Serialize;
use sked_common::MatchConfig;
use std::collections::HashMap;
use tracing::debug;

/// Per-metric values behind a candidate's score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricBreakdown {
    pub ratio: f64,
    pub partial: f64,
    pub token_set: f64,
    pub token_sort: f64,
    pub jaccard: f64,
    pub word_overlap: f64,
    pub cross_token: f64,
    pub contains: bool,
}

impl MetricBreakdown {
    /// Compute every metric for two scoring-normalized bases
    pub fn compute(report: &str, schedule: &str, cross_token_min_len: usize) -> Self {
        Self {
            ratio: similarity::ratio(report, schedule),
            partial: similarity::partial_ratio(report, schedule),
            token_set: similarity::token_set_ratio(report, schedule),
            token_sort: similarity::token_sort_ratio(report, schedule),
            jaccard: similarity::jaccard(report, schedule),
            word_overlap: similarity::word_overlap(report, schedule),
            cross_token: similarity::cross_token(report, schedule, cross_token_min_len),
            contains: similarity::contains_either(report, schedule),
        }
    }

    /// Best of the four ratio-style metrics
    pub fn best_ratio(&self) -> f64 {
        self.ratio
            .max(self.partial)
            .max(self.token_set)
            .max(self.token_sort)
    }
}

/// A schedule key judged plausibly matching a report title
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: ScheduleKey,
    /// Composite score of the key's base
    pub score: f64,
    pub metrics: MetricBreakdown,
}

/// Scores schedule keys against report titles
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    config: MatchConfig,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

impl CandidateScorer {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Score one pair of scoring-normalized bases
    ///
    /// Returns `None` when no acceptance criterion fires.
    pub fn score_base(&self, report: &str, schedule: &str) -> Option<(f64, MetricBreakdown)> {
        if report.is_empty() || schedule.is_empty() {
            return None;
        }

        let cfg = &self.config;
        let mut metrics = MetricBreakdown::compute(report, schedule, cfg.cross_token_min_len);
        let contains = cfg.allow_contains && metrics.contains;
        if contains {
            metrics.partial = 100.0;
        }

        let jaccard_hit = metrics.jaccard >= cfg.jaccard_min;
        let overlap_hit = metrics.word_overlap > cfg.word_overlap_min;
        let cross_hit = metrics.cross_token > cfg.cross_token_min;

        let accepted = metrics.ratio >= cfg.base_ratio
            || metrics.partial >= cfg.partial_ratio
            || metrics.token_set >= cfg.token_set_ratio
            || metrics.token_sort >= cfg.token_sort_ratio
            || jaccard_hit
            || overlap_hit
            || cross_hit
            || contains;
        if !accepted {
            return None;
        }

        let mut score = metrics.best_ratio()
            + metrics.jaccard * cfg.jaccard_weight
            + metrics.word_overlap * cfg.word_overlap_weight
            + metrics.cross_token * cfg.cross_token_weight;
        if jaccard_hit {
            score += cfg.jaccard_bonus;
        }
        if overlap_hit {
            score += cfg.word_overlap_bonus;
        }
        if cross_hit {
            score += cfg.cross_token_bonus;
        }
        if contains {
            score += cfg.contains_bonus;
        }

        Some((score, metrics))
    }

    /// Rank schedule keys for a report title
    ///
    /// Bases are scored once each, in first-seen order; ties keep that order.
    /// At most `max_candidates` bases are kept, each with all of its keys.
    pub fn score_candidates<'a, I>(&self, report_title: &str, keys: I) -> Vec<Candidate>
    where
        I: IntoIterator<Item = &'a ScheduleKey>,
    {
        let (report_base, _) = split_base_and_episodes(report_title);
        let report_norm = norm_base_only(&report_base);
        if report_norm.is_empty() {
            debug!(title = %report_title, "Report title has empty base, no candidates");
            return Vec::new();
        }

        let mut groups: Vec<(&str, Vec<&ScheduleKey>)> = Vec::new();
        let mut group_of: HashMap<&str, usize> = HashMap::new();
        for key in keys {
            let base = key.base.as_str();
            match group_of.get(base) {
                Some(&i) => groups[i].1.push(key),
                None => {
                    group_of.insert(base, groups.len());
                    groups.push((base, vec![key]));
                }
            }
        }

        let mut accepted: Vec<(f64, MetricBreakdown, usize)> = Vec::new();
        for (i, (base, _)) in groups.iter().enumerate() {
            let schedule_norm = norm_base_only(base);
            if let Some((score, metrics)) = self.score_base(&report_norm, &schedule_norm) {
                debug!(
                    report = %report_norm,
                    schedule = %schedule_norm,
                    score,
                    contains = metrics.contains,
                    "Base accepted"
                );
                accepted.push((score, metrics, i));
            }
        }

        // Stable: equal scores keep first-seen order
        accepted.sort_by(|a, b| b.0.total_cmp(&a.0));
        accepted.truncate(self.config.max_candidates);

        accepted
            .into_iter()
            .flat_map(|(score, metrics, i)| {
                groups[i].1.iter().map(move |key| Candidate {
                    key: (*key).clone(),
                    score,
                    metrics,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::EpisodeSet;

    fn key(base: &str, episodes: EpisodeSet) -> ScheduleKey {
        ScheduleKey::new(base, episodes)
    }

    #[test]
    fn test_identical_bases_dominate() {
        let scorer = CandidateScorer::default();
        let (score, metrics) = scorer.score_base("новости", "новости").unwrap();
        assert!(metrics.contains);
        assert!(score > scorer.config().max_score_without_contains());
    }

    #[test]
    fn test_unrelated_bases_rejected() {
        let scorer = CandidateScorer::default();
        assert!(scorer.score_base("новости", "гора самоцветов").is_none());
        assert!(scorer.score_base("", "новости").is_none());
        assert!(scorer.score_base("новости", "").is_none());
    }

    #[test]
    fn test_containment_can_be_disabled() {
        let scorer = CandidateScorer::new(MatchConfig {
            allow_contains: false,
            ..MatchConfig::default()
        });
        let (score, _) = scorer.score_base("новости", "новости").unwrap();
        assert!(score <= scorer.config().max_score_without_contains());
    }

    #[test]
    fn test_metrics_combine_additively() {
        let scorer = CandidateScorer::default();
        let (score, m) = scorer
            .score_base("гора самоцвет", "гора самоцветов")
            .unwrap();
        assert!(m.contains);
        // Half the words shared: below the overlap bonus threshold
        assert!((m.word_overlap - 0.5).abs() < 1e-9);
        let cfg = scorer.config();
        let expected = m.best_ratio()
            + m.jaccard * cfg.jaccard_weight
            + m.word_overlap * cfg.word_overlap_weight
            + m.cross_token * cfg.cross_token_weight
            + cfg.jaccard_bonus
            + cfg.cross_token_bonus
            + cfg.contains_bonus;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_candidates_include_every_episode_of_base() {
        let keys = vec![
            key("гора самоцветов", EpisodeSet::single(63)),
            key("новости", EpisodeSet::Unnumbered),
            key("гора самоцветов", EpisodeSet::single(64)),
        ];
        let scorer = CandidateScorer::default();
        let candidates = scorer.score_candidates("Гора самоцветов. 65 серия", &keys);

        let found: Vec<&ScheduleKey> = candidates.iter().map(|c| &c.key).collect();
        assert_eq!(found, vec![&keys[0], &keys[2]]);
        assert_eq!(candidates[0].score, candidates[1].score);
    }

    #[test]
    fn test_containment_outranks_fuzzy_match() {
        let keys = vec![
            key("гора самоцвеьов", EpisodeSet::Unnumbered),
            key("гора самоцветов", EpisodeSet::Unnumbered),
        ];
        let scorer = CandidateScorer::default();
        let candidates = scorer.score_candidates("Гора самоцветов", &keys);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].key.base, "гора самоцветов");
        assert!(candidates[0].score > candidates[1].score);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let keys = vec![
            key("утро новости", EpisodeSet::Unnumbered),
            key("новости утро", EpisodeSet::Unnumbered),
        ];
        let scorer = CandidateScorer::new(MatchConfig {
            allow_contains: false,
            ..MatchConfig::default()
        });
        let candidates = scorer.score_candidates("утро", &keys);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].score, candidates[1].score);
        assert_eq!(candidates[0].key.base, "утро новости");
    }

    #[test]
    fn test_candidate_cap_counts_bases() {
        let mut keys = Vec::new();
        for n in 0..30 {
            keys.push(key(&format!("сериал {}", "а".repeat(n + 1)), EpisodeSet::Unnumbered));
        }
        keys.extend((1..=20).map(|ep| key("сериал", EpisodeSet::single(ep))));

        let scorer = CandidateScorer::new(MatchConfig {
            max_candidates: 3,
            ..MatchConfig::default()
        });
        let candidates = scorer.score_candidates("Сериал 15", &keys);

        let mut bases: Vec<&str> = candidates.iter().map(|c| c.key.base.as_str()).collect();
        bases.dedup();
        assert_eq!(bases.len(), 3);
        assert!(candidates
            .iter()
            .any(|c| c.key.episodes == EpisodeSet::single(15)));
    }

    #[test]
    fn test_empty_report_base_yields_nothing() {
        let keys = vec![key("новости", EpisodeSet::Unnumbered)];
        let scorer = CandidateScorer::default();
        assert!(scorer.score_candidates("(ред.)", &keys).is_empty());
        assert!(scorer.score_candidates("Фильм", &keys).is_empty());
    }

    #[test]
    fn test_stop_word_only_schedule_base_skipped() {
        let keys = vec![key("фильм", EpisodeSet::Unnumbered)];
        let scorer = CandidateScorer::default();
        assert!(scorer.score_candidates("Бабоньки", &keys).is_empty());
    }
}
