//! Title resolution
//!
//! Resolves a report title to the airings of the schedule entry it refers
//! to. Candidates come from [`CandidateScorer`]; an ordered cascade of
//! [`ResolutionStrategy`] implementations then decides which candidate's
//! airings, if any, belong to the title. The first strategy that claims the
//! title ends the cascade.
//!
//! Resolution is a pure function of the title and the index: nothing here
//! mutates the index, so one index can serve any number of report rows.

pub mod strategies;

use crate::index::ScheduleIndex;
use crate::normalize::{split_base_and_episodes, EpisodeSet};
use crate::scorer::{Candidate, CandidateScorer};
use chrono::NaiveDateTime;
use sked_common::MatchConfig;
use tracing::debug;

pub use strategies::{
    default_strategies, EpisodeOverlap, ExactEpisode, NoEpisodeGuess, TopCandidate, Unnumbered,
};

/// A report title with its base and episodes extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub title: String,
    pub base: String,
    pub episodes: EpisodeSet,
}

impl ReportQuery {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let (base, episodes) = split_base_and_episodes(&title);
        Self {
            title,
            base,
            episodes,
        }
    }
}

/// One step of the resolution cascade
///
/// Returns `Some` to claim the title (an empty list means "claimed, no
/// match") or `None` to defer to the next strategy.
pub trait ResolutionStrategy: Send + Sync {
    /// Strategy identifier for diagnostics
    fn name(&self) -> &'static str;

    fn resolve(
        &self,
        query: &ReportQuery,
        candidates: &[Candidate],
        index: &ScheduleIndex,
    ) -> Option<Vec<NaiveDateTime>>;
}

/// Full outcome of resolving one title
#[derive(Debug, Clone)]
pub struct Resolution {
    pub query: ReportQuery,
    /// Ranked candidates the cascade ran over
    pub candidates: Vec<Candidate>,
    /// Strategy that claimed the title, if any
    pub strategy: Option<&'static str>,
    /// Sorted, duplicate-free airings
    pub airings: Vec<NaiveDateTime>,
}

impl Resolution {
    pub fn is_match(&self) -> bool {
        !self.airings.is_empty()
    }
}

/// Resolves report titles against a [`ScheduleIndex`]
pub struct Resolver {
    scorer: CandidateScorer,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

impl Resolver {
    /// Resolver with the default cascade
    pub fn new(config: MatchConfig) -> Self {
        let strategies = default_strategies(&config);
        Self::with_strategies(config, strategies)
    }

    /// Resolver with a custom cascade, evaluated in the given order
    pub fn with_strategies(
        config: MatchConfig,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
    ) -> Self {
        Self {
            scorer: CandidateScorer::new(config),
            strategies,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        self.scorer.config()
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Airings for a report title; empty when nothing matches
    pub fn resolve(&self, title: &str, index: &ScheduleIndex) -> Vec<NaiveDateTime> {
        self.explain(title, index).airings
    }

    /// Resolve a title and keep the candidates and deciding strategy
    pub fn explain(&self, title: &str, index: &ScheduleIndex) -> Resolution {
        let query = ReportQuery::new(title);
        let candidates = self.scorer.score_candidates(title, index.keys());

        let mut resolution = Resolution {
            query,
            candidates,
            strategy: None,
            airings: Vec::new(),
        };
        if resolution.candidates.is_empty() {
            debug!(title = %title, "No candidates");
            return resolution;
        }

        for strategy in &self.strategies {
            if let Some(mut airings) =
                strategy.resolve(&resolution.query, &resolution.candidates, index)
            {
                airings.sort_unstable();
                airings.dedup();
                debug!(
                    title = %title,
                    strategy = strategy.name(),
                    airings = airings.len(),
                    "Title resolved"
                );
                resolution.strategy = Some(strategy.name());
                resolution.airings = airings;
                break;
            }
        }

        resolution
    }
}
