//! # Sked Match
//!
//! Resolves free-text program titles from broadcast reports to the airings
//! recorded in a broadcast schedule:
//! - Title normalization and episode extraction
//! - Schedule indexing by (base title, episode set)
//! - Fuzzy candidate scoring
//! - Ordered resolution cascade
//! - Airing formatting and report processing

pub mod format;
pub mod index;
pub mod normalize;
pub mod report;
pub mod resolver;
pub mod schedule_source;
pub mod scorer;

pub use format::{format_airings, AiringFormatter};
pub use index::{build_index, IndexStats, ScheduleIndex, ScheduleKey, ScheduleRow};
pub use normalize::{norm_base_only, normalize, split_base_and_episodes, EpisodeSet};
pub use report::{ReportLine, ReportProcessor, ReportStats};
pub use resolver::{Resolution, ResolutionStrategy, Resolver};
pub use scorer::{Candidate, CandidateScorer, MetricBreakdown};
