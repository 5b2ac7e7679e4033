//! Airing list rendering

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use sked_common::{Error, FormatConfig, Result};

/// Render airings with the default pattern and separator
///
/// Airings are sorted ascending and entries that render to the same text
/// are kept once, then at most `limit` of them are joined. A zero limit or
/// empty input yields "".
pub fn format_airings(airings: &[NaiveDateTime], limit: usize) -> String {
    // The default pattern always validates
    AiringFormatter {
        pattern: FormatConfig::default().pattern,
        separator: FormatConfig::default().separator,
        limit,
    }
    .format(airings)
}

/// Renders airing lists as a single cell value
#[derive(Debug, Clone, PartialEq)]
pub struct AiringFormatter {
    pattern: String,
    separator: String,
    limit: usize,
}

impl AiringFormatter {
    /// Build from config, rejecting strftime patterns chrono cannot render
    pub fn new(config: &FormatConfig) -> Result<Self> {
        if config.pattern.is_empty() {
            return Err(Error::Config("format.pattern must not be empty".to_string()));
        }
        if StrftimeItems::new(&config.pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Config(format!(
                "format.pattern '{}' is not a valid strftime pattern",
                config.pattern
            )));
        }

        Ok(Self {
            pattern: config.pattern.clone(),
            separator: config.separator.clone(),
            limit: config.limit,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Render with the configured limit
    pub fn format(&self, airings: &[NaiveDateTime]) -> String {
        self.format_with_limit(airings, self.limit)
    }

    /// Render at most `limit` distinct entries
    ///
    /// Deduplication is on the rendered text, so airings seconds apart count
    /// once under a minute-resolution pattern.
    pub fn format_with_limit(&self, airings: &[NaiveDateTime], limit: usize) -> String {
        if limit == 0 || airings.is_empty() {
            return String::new();
        }

        let mut sorted = airings.to_vec();
        sorted.sort_unstable();

        let mut rendered: Vec<String> = sorted
            .iter()
            .map(|at| at.format(&self.pattern).to_string())
            .collect();
        rendered.dedup();
        rendered.truncate(limit);
        rendered.join(&self.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, day)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
    }

    #[test]
    fn test_limit_applies_after_sort_and_dedup() {
        let t1 = ts(1, 6, 0);
        let t2 = ts(1, 9, 30);
        assert_eq!(format_airings(&[t2, t1, t1], 1), "01.09.2025 06:00");
        assert_eq!(
            format_airings(&[t2, t1, t1], 5),
            "01.09.2025 06:00; 01.09.2025 09:30"
        );
    }

    #[test]
    fn test_same_minute_airings_render_once() {
        let early = ts(1, 6, 0);
        let late = early + chrono::Duration::seconds(30);
        let next = ts(1, 7, 0);

        assert_eq!(format_airings(&[late, early], 5), "01.09.2025 06:00");
        // Collapsed entries do not use up the limit
        assert_eq!(
            format_airings(&[early, late, next], 2),
            "01.09.2025 06:00; 01.09.2025 07:00"
        );

        let formatter = AiringFormatter::new(&FormatConfig {
            pattern: "%H:%M:%S".to_string(),
            ..FormatConfig::default()
        })
        .unwrap();
        assert_eq!(formatter.format(&[late, early]), "06:00:00; 06:00:30");
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(format_airings(&[], 5), "");
        assert_eq!(format_airings(&[ts(1, 6, 0)], 0), "");
    }

    #[test]
    fn test_custom_pattern_and_separator() {
        let formatter = AiringFormatter::new(&FormatConfig {
            pattern: "%Y-%m-%d %H:%M:%S".to_string(),
            separator: " | ".to_string(),
            limit: 2,
        })
        .unwrap();

        let rendered = formatter.format(&[ts(3, 7, 0), ts(1, 6, 0), ts(2, 6, 0)]);
        assert_eq!(rendered, "2025-09-01 06:00:00 | 2025-09-02 06:00:00");
        assert_eq!(formatter.format_with_limit(&[ts(3, 7, 0)], 0), "");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        for pattern in ["", "%Q", "%"] {
            let config = FormatConfig {
                pattern: pattern.to_string(),
                ..FormatConfig::default()
            };
            assert!(
                matches!(AiringFormatter::new(&config), Err(Error::Config(_))),
                "pattern {pattern:?}"
            );
        }
    }
}
