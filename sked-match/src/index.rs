//! Schedule index
//!
//! Maps `(base title, episode set)` keys to the sorted, duplicate-free list
//! of airings recorded for them. Built once per run and read-only afterwards.
//!
//! Multi-episode schedule entries ("63,64") are stored once per episode under
//! singleton keys, so a report citing a single episode finds an exact key.

use crate::normalize::{split_base_and_episodes, EpisodeSet};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sked_common::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One parsed schedule line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub title: String,
}

impl ScheduleRow {
    pub fn new(date: NaiveDate, time: NaiveTime, title: impl Into<String>) -> Self {
        Self {
            date,
            time,
            title: title.into(),
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Addressable index entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleKey {
    /// Canonical base title (stop words kept)
    pub base: String,
    pub episodes: EpisodeSet,
}

impl ScheduleKey {
    pub fn new(base: impl Into<String>, episodes: EpisodeSet) -> Self {
        Self {
            base: base.into(),
            episodes,
        }
    }
}

/// Counters collected while building an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Rows offered to the builder
    pub rows: usize,
    /// Rows that produced at least one key
    pub indexed: usize,
    /// Rows rejected (unparseable date/time or empty title)
    pub dropped: usize,
    /// Airings discarded as exact duplicates of an existing entry
    pub duplicates: usize,
}

/// Immutable lookup from [`ScheduleKey`] to airings
///
/// Keys iterate in first-seen order, which is what breaks scoring ties.
#[derive(Debug, Clone, Default)]
pub struct ScheduleIndex {
    entries: Vec<(ScheduleKey, Vec<NaiveDateTime>)>,
    positions: HashMap<ScheduleKey, usize>,
}

impl ScheduleIndex {
    /// Build an index from parsed rows
    pub fn build<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = ScheduleRow>,
    {
        let mut builder = IndexBuilder::new();
        for row in rows {
            builder.push(row);
        }
        builder.finish()
    }

    /// Airings for an exact key
    pub fn get(&self, key: &ScheduleKey) -> Option<&[NaiveDateTime]> {
        self.positions
            .get(key)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn contains_key(&self, key: &ScheduleKey) -> bool {
        self.positions.contains_key(key)
    }

    /// Keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &ScheduleKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScheduleKey, &[NaiveDateTime])> {
        self.entries
            .iter()
            .map(|(key, airings)| (key, airings.as_slice()))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total airings across all keys
    pub fn airing_count(&self) -> usize {
        self.entries.iter().map(|(_, airings)| airings.len()).sum()
    }

    /// Verify structural invariants
    ///
    /// A failure here means the index was built incorrectly.
    pub fn validate(&self) -> Result<()> {
        if self.positions.len() != self.entries.len() {
            return Err(Error::Internal(format!(
                "index has {} keys but {} positions",
                self.entries.len(),
                self.positions.len()
            )));
        }

        for (pos, (key, airings)) in self.entries.iter().enumerate() {
            if self.positions.get(key) != Some(&pos) {
                return Err(Error::Internal(format!(
                    "key '{}' {} is not addressable",
                    key.base, key.episodes
                )));
            }
            if key.base.is_empty() {
                return Err(Error::Internal("index key with empty base".to_string()));
            }
            if matches!(&key.episodes, EpisodeSet::Numbered(set) if set.len() != 1) {
                return Err(Error::Internal(format!(
                    "key '{}' {} is not a singleton episode key",
                    key.base, key.episodes
                )));
            }
            if airings.is_empty() {
                return Err(Error::Internal(format!(
                    "key '{}' {} has no airings",
                    key.base, key.episodes
                )));
            }
            if airings.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(Error::Internal(format!(
                    "airings for '{}' {} are not strictly ascending",
                    key.base, key.episodes
                )));
            }
        }

        Ok(())
    }
}

/// Convenience wrapper around [`ScheduleIndex::build`]
pub fn build_index<I>(rows: I) -> ScheduleIndex
where
    I: IntoIterator<Item = ScheduleRow>,
{
    ScheduleIndex::build(rows)
}

/// Incremental index construction
///
/// Callers that parse their own rows use [`IndexBuilder::record_dropped`] to
/// keep the counters honest for rows they had to reject.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: ScheduleIndex,
    stats: IndexStats,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row; returns false when the row was dropped
    pub fn push(&mut self, row: ScheduleRow) -> bool {
        self.stats.rows += 1;

        let (base, episodes) = split_base_and_episodes(&row.title);
        if base.is_empty() {
            warn!(
                title = %row.title,
                date = %row.date,
                "Schedule row has empty title after normalization, dropped"
            );
            self.stats.dropped += 1;
            return false;
        }

        let timestamp = row.timestamp();
        match episodes {
            EpisodeSet::Unnumbered => {
                self.insert(ScheduleKey::new(base, EpisodeSet::Unnumbered), timestamp);
            }
            EpisodeSet::Numbered(set) => {
                if set.len() > 1 {
                    debug!(base = %base, episodes = set.len(), "Splitting multi-episode airing");
                }
                for episode in set {
                    self.insert(
                        ScheduleKey::new(base.clone(), EpisodeSet::single(episode)),
                        timestamp,
                    );
                }
            }
        }

        self.stats.indexed += 1;
        true
    }

    /// Count a row the caller could not parse
    pub fn record_dropped(&mut self) {
        self.stats.rows += 1;
        self.stats.dropped += 1;
    }

    fn insert(&mut self, key: ScheduleKey, timestamp: NaiveDateTime) {
        let index = &mut self.index;
        let pos = match index.positions.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = index.entries.len();
                index.positions.insert(key.clone(), pos);
                index.entries.push((key, Vec::new()));
                pos
            }
        };
        index.entries[pos].1.push(timestamp);
    }

    /// Counters so far (duplicates are only known after [`Self::finish`])
    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Sort and deduplicate every airing list, then freeze the index
    pub fn finish(self) -> ScheduleIndex {
        self.finish_with_stats().0
    }

    pub fn finish_with_stats(mut self) -> (ScheduleIndex, IndexStats) {
        for (key, airings) in &mut self.index.entries {
            airings.sort_unstable();
            let before = airings.len();
            airings.dedup();
            let removed = before - airings.len();
            if removed > 0 {
                debug!(
                    base = %key.base,
                    episodes = %key.episodes,
                    removed,
                    "Duplicate airings removed"
                );
                self.stats.duplicates += removed;
            }
        }
        (self.index, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> ScheduleRow {
        ScheduleRow::new(
            NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            "",
        )
    }

    fn row(day: u32, hour: u32, minute: u32, title: &str) -> ScheduleRow {
        ScheduleRow {
            title: title.to_string(),
            ..at(day, hour, minute)
        }
    }

    #[test]
    fn test_single_row_indexed_under_unnumbered_key() {
        let index = build_index(vec![row(1, 6, 0, "Новости")]);
        let key = ScheduleKey::new("новости", EpisodeSet::Unnumbered);

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&key), Some(&[at(1, 6, 0).timestamp()][..]));
        assert!(index.validate().is_ok());
    }

    #[test]
    fn test_multi_episode_row_split_into_singletons() {
        let index = build_index(vec![row(1, 8, 0, "Гора самоцветов 63,64")]);

        let ep63 = ScheduleKey::new("гора самоцветов", EpisodeSet::single(63));
        let ep64 = ScheduleKey::new("гора самоцветов", EpisodeSet::single(64));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&ep63), index.get(&ep64));
        assert_eq!(index.airing_count(), 2);
        assert!(!index.contains_key(&ScheduleKey::new(
            "гора самоцветов",
            EpisodeSet::from_numbers([63, 64])
        )));
    }

    #[test]
    fn test_airings_sorted_and_deduplicated() {
        let mut builder = IndexBuilder::new();
        builder.push(row(2, 9, 0, "Новости"));
        builder.push(row(1, 18, 30, "Новости"));
        builder.push(row(2, 9, 0, "НОВОСТИ"));
        let (index, stats) = builder.finish_with_stats();

        let key = ScheduleKey::new("новости", EpisodeSet::Unnumbered);
        assert_eq!(
            index.get(&key).unwrap(),
            &[at(1, 18, 30).timestamp(), at(2, 9, 0).timestamp()]
        );
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.indexed, 3);
        assert_eq!(stats.duplicates, 1);
        assert!(index.validate().is_ok());
    }

    #[test]
    fn test_seconds_preserved_in_timestamps() {
        let mut r = row(1, 6, 0, "Новости");
        r.time = NaiveTime::from_hms_opt(6, 0, 30).unwrap();
        let index = build_index(vec![r.clone(), row(1, 6, 0, "Новости")]);

        let key = ScheduleKey::new("новости", EpisodeSet::Unnumbered);
        assert_eq!(index.get(&key).unwrap().len(), 2);
        assert_eq!(index.get(&key).unwrap()[1], r.timestamp());
    }

    #[test]
    fn test_empty_title_dropped() {
        let mut builder = IndexBuilder::new();
        assert!(!builder.push(row(1, 6, 0, "(ред.)")));
        builder.record_dropped();
        let (index, stats) = builder.finish_with_stats();

        assert!(index.is_empty());
        assert_eq!(stats.rows, 2);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.indexed, 0);
    }

    #[test]
    fn test_keys_in_first_seen_order() {
        let index = build_index(vec![
            row(1, 6, 0, "Утро"),
            row(1, 7, 0, "Новости"),
            row(1, 8, 0, "Утро"),
        ]);
        let bases: Vec<&str> = index.keys().map(|k| k.base.as_str()).collect();
        assert_eq!(bases, vec!["утро", "новости"]);
    }

    #[test]
    fn test_empty_schedule() {
        let index = build_index(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.airing_count(), 0);
        assert!(index.validate().is_ok());
    }
}
