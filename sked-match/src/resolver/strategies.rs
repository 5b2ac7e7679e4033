//! Resolution strategies, in cascade order
//!
//! Each strategy looks at the report query and the ranked candidates and
//! either claims the title (`Some`, possibly with no airings) or passes it on
//! to the next strategy (`None`).

use super::{ReportQuery, ResolutionStrategy};
use crate::index::ScheduleIndex;
use crate::normalize::EpisodeSet;
use crate::scorer::Candidate;
use chrono::NaiveDateTime;
use sked_common::MatchConfig;

/// Default cascade for a configuration
pub fn default_strategies(config: &MatchConfig) -> Vec<Box<dyn ResolutionStrategy>> {
    vec![
        Box::new(ExactEpisode),
        Box::new(EpisodeOverlap {
            enabled: config.allow_episode_partial,
        }),
        Box::new(Unnumbered),
        Box::new(NoEpisodeGuess),
        Box::new(TopCandidate),
    ]
}

fn airings_of(candidate: &Candidate, index: &ScheduleIndex) -> Option<Vec<NaiveDateTime>> {
    index.get(&candidate.key).map(<[NaiveDateTime]>::to_vec)
}

/// Airings of the best-ranked candidate whose episodes equal the report's
///
/// Index keys hold one episode each, so in practice this fires for reports
/// citing a single episode; multi-episode reports go on to the overlap step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactEpisode;

impl ResolutionStrategy for ExactEpisode {
    fn name(&self) -> &'static str {
        "exact-episode"
    }

    fn resolve(
        &self,
        query: &ReportQuery,
        candidates: &[Candidate],
        index: &ScheduleIndex,
    ) -> Option<Vec<NaiveDateTime>> {
        if !query.episodes.is_numbered() {
            return None;
        }
        candidates
            .iter()
            .find(|c| c.key.episodes == query.episodes)
            .and_then(|c| airings_of(c, index))
    }
}

/// Union of airings of every candidate sharing an episode with the report
#[derive(Debug, Clone, Copy)]
pub struct EpisodeOverlap {
    pub enabled: bool,
}

impl Default for EpisodeOverlap {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ResolutionStrategy for EpisodeOverlap {
    fn name(&self) -> &'static str {
        "episode-overlap"
    }

    fn resolve(
        &self,
        query: &ReportQuery,
        candidates: &[Candidate],
        index: &ScheduleIndex,
    ) -> Option<Vec<NaiveDateTime>> {
        if !self.enabled || !query.episodes.is_numbered() {
            return None;
        }

        let mut union: Vec<NaiveDateTime> = candidates
            .iter()
            .filter(|c| c.key.episodes.intersects(&query.episodes))
            .filter_map(|c| index.get(&c.key))
            .flatten()
            .copied()
            .collect();
        if union.is_empty() {
            return None;
        }
        union.sort_unstable();
        union.dedup();
        Some(union)
    }
}

/// Best-ranked candidate without an episode number, for unnumbered reports
#[derive(Debug, Clone, Copy, Default)]
pub struct Unnumbered;

impl ResolutionStrategy for Unnumbered {
    fn name(&self) -> &'static str {
        "unnumbered"
    }

    fn resolve(
        &self,
        query: &ReportQuery,
        candidates: &[Candidate],
        index: &ScheduleIndex,
    ) -> Option<Vec<NaiveDateTime>> {
        if query.episodes.is_numbered() {
            return None;
        }
        candidates
            .iter()
            .find(|c| c.key.episodes == EpisodeSet::Unnumbered)
            .and_then(|c| airings_of(c, index))
    }
}

/// Stops the cascade for episodic reports nothing above could place
///
/// Guessing another episode's airtime is worse than reporting no match.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEpisodeGuess;

impl ResolutionStrategy for NoEpisodeGuess {
    fn name(&self) -> &'static str {
        "no-episode-guess"
    }

    fn resolve(
        &self,
        query: &ReportQuery,
        _candidates: &[Candidate],
        _index: &ScheduleIndex,
    ) -> Option<Vec<NaiveDateTime>> {
        query.episodes.is_numbered().then(Vec::new)
    }
}

/// Top-ranked candidate regardless of its episodes
#[derive(Debug, Clone, Copy, Default)]
pub struct TopCandidate;

impl ResolutionStrategy for TopCandidate {
    fn name(&self) -> &'static str {
        "top-candidate"
    }

    fn resolve(
        &self,
        _query: &ReportQuery,
        candidates: &[Candidate],
        index: &ScheduleIndex,
    ) -> Option<Vec<NaiveDateTime>> {
        candidates.first().and_then(|c| airings_of(c, index))
    }
}
