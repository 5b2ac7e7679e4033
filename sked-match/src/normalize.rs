//! Title normalization and episode-number extraction
//!
//! Turns free-text program titles from schedules and reports into a
//! comparable canonical form and an [`EpisodeSet`].
//!
//! All functions here are total: any string, including an empty one,
//! yields a value.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Token every episode-designator synonym is folded to
pub const EPISODE_TOKEN: &str = "серия";

/// Generic program-type nouns and editorial words dropped for scoring
const STOP_WORDS: &[&str] = &[
    "фильм", "кино", "передача", "программа", "серия", "выпуск", "эпизод", "часть", "ред",
    "copy",
];

static MEDIA_EXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(?:mp4|mkv|avi|mov|wmv|mpg|mpeg|mxf|m4v|mp3|wav)$").unwrap()
});

static BRACKETED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^()]*\)|\[[^\[\]]*\]").unwrap());

/// Editorial markers anywhere in the title; digits after them are left alone
static EDITORIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:copy|copie|копия|копии|ред)\b\.?").unwrap());

/// "copy 2" closing the title: the number is a copy counter, not an episode
static TRAILING_COPY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:copy|copie|копия|копии)\b\.?\s*[0-9]+\s*$").unwrap());

static EPISODE_SYNONYM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:серия|серии|эпизод|выпуск|часть)\b").unwrap());

static SEPARATOR_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").unwrap());

static DESIGNATOR_AFTER_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9])\s*серия\b").unwrap());

static DESIGNATOR_BEFORE_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bсерия\s*([0-9])").unwrap());

/// `<base><separator><episode list>` anchored at the end of the title
static EPISODE_TAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<base>.*?)[\s.#]+(?P<tail>[0-9]{1,3}(?:\s*[-–—]\s*[0-9]{1,3})?(?:[\s,]+[0-9]{1,3}(?:\s*[-–—]\s*[0-9]{1,3})?)*)$",
    )
    .unwrap()
});

static EPISODE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{1,3})(?:\s*[-–—]\s*([0-9]{1,3}))?").unwrap());

/// Episode numbers a title refers to
///
/// `Unnumbered` is an explicit marker for non-episodic programs, distinct
/// from any real episode number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EpisodeSet {
    /// Title carries no episode number
    Unnumbered,
    /// Non-empty set of episode numbers
    Numbered(BTreeSet<u32>),
}

impl EpisodeSet {
    /// Build from numbers; an empty input yields `Unnumbered`
    pub fn from_numbers<I: IntoIterator<Item = u32>>(numbers: I) -> Self {
        let set: BTreeSet<u32> = numbers.into_iter().collect();
        if set.is_empty() {
            EpisodeSet::Unnumbered
        } else {
            EpisodeSet::Numbered(set)
        }
    }

    pub fn single(episode: u32) -> Self {
        EpisodeSet::Numbered(BTreeSet::from([episode]))
    }

    pub fn is_numbered(&self) -> bool {
        matches!(self, EpisodeSet::Numbered(_))
    }

    /// Episode numbers in ascending order (none for `Unnumbered`)
    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        let set = match self {
            EpisodeSet::Numbered(set) => Some(set),
            EpisodeSet::Unnumbered => None,
        };
        set.into_iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        match self {
            EpisodeSet::Numbered(set) => set.len(),
            EpisodeSet::Unnumbered => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when this is exactly the singleton `{episode}`
    pub fn is_single(&self, episode: u32) -> bool {
        matches!(self, EpisodeSet::Numbered(set) if set.len() == 1 && set.contains(&episode))
    }

    /// True when both sets are numbered and share an episode
    pub fn intersects(&self, other: &EpisodeSet) -> bool {
        match (self, other) {
            (EpisodeSet::Numbered(a), EpisodeSet::Numbered(b)) => !a.is_disjoint(b),
            _ => false,
        }
    }
}

impl fmt::Display for EpisodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpisodeSet::Unnumbered => write!(f, "-"),
            EpisodeSet::Numbered(set) => {
                let parts: Vec<String> = set.iter().map(u32::to_string).collect();
                write!(f, "{{{}}}", parts.join(","))
            }
        }
    }
}

/// Canonical comparable form of a raw title
///
/// NFKC fold, lowercase, bracketed annotations and editorial markers
/// ("copy", "ред.") removed, trailing media extension removed, "ё" mapped
/// to "е", episode synonyms folded to [`EPISODE_TOKEN`], whitespace/comma
/// runs collapsed, leading/trailing punctuation stripped.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut current = raw.to_string();
    // Each pass after the first only removes text, so this settles quickly.
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn normalize_pass(raw: &str) -> String {
    // NFKC would expand the numero sign to "No"
    let s = raw.replace('№', "#");
    let s: String = s.nfkc().collect::<String>().to_lowercase();
    let s = s.replace('ё', "е");
    let s = BRACKETED_RE.replace_all(&s, " ");
    let s = MEDIA_EXT_RE.replace(trim_punctuation(&s), "");
    let s = TRAILING_COPY_RE.replace(&s, "");
    let s = EDITORIAL_RE.replace_all(&s, " ");
    let s = EPISODE_SYNONYM_RE.replace_all(&s, EPISODE_TOKEN);
    let s = SEPARATOR_RUN_RE.replace_all(&s, " ");
    let s = trim_punctuation(&s);
    let s = MEDIA_EXT_RE.replace(s, "");
    trim_punctuation(&s).to_string()
}

fn trim_punctuation(s: &str) -> &str {
    s.trim_matches(|c: char| !c.is_alphanumeric())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a raw title into its canonical base and episode set
///
/// Rules, first match wins:
/// 1. Episode designator words next to digits are dropped, keeping the digits.
/// 2. A trailing run of numbers (`63`, `63,64`, `63-64`, `5 7-9`) becomes the
///    episode set; ranges expand inclusively in either direction.
/// 3. Otherwise the whole string is the base and the set is `Unnumbered`.
///
/// A title legitimately ending in a small number is read as episodic; the
/// resolver's fallback ordering is what recovers those.
pub fn split_base_and_episodes(raw: &str) -> (String, EpisodeSet) {
    let normalized = normalize(raw);
    let s = DESIGNATOR_AFTER_DIGITS_RE.replace_all(&normalized, "${1}");
    let s = DESIGNATOR_BEFORE_DIGITS_RE.replace_all(&s, "${1}");
    let s = collapse_whitespace(&s);

    if let Some(caps) = EPISODE_TAIL_RE.captures(&s) {
        let base = clean_base(&caps["base"]);
        let episodes = parse_episode_tail(&caps["tail"]);
        if !base.is_empty() && episodes.is_numbered() {
            return (base, episodes);
        }
    }

    (clean_base(&s), EpisodeSet::Unnumbered)
}

fn clean_base(base: &str) -> String {
    let trimmed = base.trim_matches(|c: char| c.is_whitespace() || ".,:;#-–—".contains(c));
    collapse_whitespace(trimmed)
}

fn parse_episode_tail(tail: &str) -> EpisodeSet {
    let mut episodes = BTreeSet::new();
    for caps in EPISODE_TOKEN_RE.captures_iter(tail) {
        let Ok(start) = caps[1].parse::<u32>() else {
            continue;
        };
        match caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
            Some(end) => episodes.extend(start.min(end)..=start.max(end)),
            None => {
                episodes.insert(start);
            }
        }
    }
    EpisodeSet::from_numbers(episodes)
}

/// Normalized title with stop words removed, for scoring only
///
/// Index keys keep the unstripped base so programs differing only by a stop
/// word that is part of their name stay distinct.
pub fn norm_base_only(raw: &str) -> String {
    normalize(raw)
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eps(numbers: &[u32]) -> EpisodeSet {
        EpisodeSet::from_numbers(numbers.iter().copied())
    }

    #[test]
    fn test_normalize_basic_folding() {
        assert_eq!(normalize("  НОВОСТИ  "), "новости");
        assert_eq!(normalize("Ёлки"), "елки");
        assert_eq!(normalize("Новости (ред.) copy"), "новости");
        assert_eq!(normalize("Гора самоцветов (ред.) 63 серия"), "гора самоцветов 63 серия");
        assert_eq!(normalize("Бабоньки.mp4"), "бабоньки");
        assert_eq!(normalize("Новости копия 2"), "новости");
        assert_eq!(normalize("Дикие и стильные. 2 выпуск"), "дикие и стильные. 2 серия");
    }

    #[test]
    fn test_normalize_collapses_commas_and_whitespace() {
        assert_eq!(normalize("Гора  самоцветов 63,64"), "гора самоцветов 63 64");
        assert_eq!(normalize("a,\t,b"), "a b");
    }

    #[test]
    fn test_normalize_total_on_degenerate_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("(ред.)"), "");
        assert_eq!(normalize("..."), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "Гора самоцветов. 63 серия",
            "Новости (ред.) copy",
            "clip.mp4.mp4",
            "x.mp4 (ред.)",
            "((вложенные) скобки) Кино",
            "ＦＵＬＬＷＩＤＴＨ ４２",
            "Ёжик в тумане — 1-2 часть",
            "[HD] Title, , ,",
            "",
            "copy copy 3 copy",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_split_single_episode() {
        assert_eq!(
            split_base_and_episodes("Гора самоцветов. 63 серия"),
            ("гора самоцветов".to_string(), eps(&[63]))
        );
        assert_eq!(
            split_base_and_episodes("БЕСЦЕННАЯ ЛЮБОВЬ 4 серия"),
            ("бесценная любовь".to_string(), eps(&[4]))
        );
        assert_eq!(
            split_base_and_episodes("Дикие и стильные. 2 выпуск"),
            ("дикие и стильные".to_string(), eps(&[2]))
        );
    }

    #[test]
    fn test_split_list_and_range() {
        assert_eq!(
            split_base_and_episodes("Гора самоцветов 63,64"),
            ("гора самоцветов".to_string(), eps(&[63, 64]))
        );
        assert_eq!(
            split_base_and_episodes("Гора самоцветов 63-64"),
            ("гора самоцветов".to_string(), eps(&[63, 64]))
        );
        assert_eq!(
            split_base_and_episodes("Сериал 9-7, 12"),
            ("сериал".to_string(), eps(&[7, 8, 9, 12]))
        );
        assert_eq!(
            split_base_and_episodes("гора самоцветов - 63 серия"),
            ("гора самоцветов".to_string(), eps(&[63]))
        );
    }

    #[test]
    fn test_split_designator_before_number() {
        assert_eq!(
            split_base_and_episodes("Сказки. Серия 12"),
            ("сказки".to_string(), eps(&[12]))
        );
        assert_eq!(
            split_base_and_episodes("Передача №5"),
            ("передача".to_string(), eps(&[5]))
        );
    }

    #[test]
    fn test_split_no_episode() {
        assert_eq!(
            split_base_and_episodes("Новости"),
            ("новости".to_string(), EpisodeSet::Unnumbered)
        );
        assert_eq!(
            split_base_and_episodes("Новости (ред.) copy"),
            ("новости".to_string(), EpisodeSet::Unnumbered)
        );
        // Four-digit years are not episode numbers
        assert_eq!(
            split_base_and_episodes("Итоги 2024"),
            ("итоги 2024".to_string(), EpisodeSet::Unnumbered)
        );
        assert_eq!(split_base_and_episodes(""), (String::new(), EpisodeSet::Unnumbered));
    }

    #[test]
    fn test_split_keeps_episode_after_editorial_marker() {
        assert_eq!(
            split_base_and_episodes("Гора самоцветов ред. 63"),
            ("гора самоцветов".to_string(), eps(&[63]))
        );
        assert_eq!(
            split_base_and_episodes("Гора самоцветов copy 63 серия"),
            ("гора самоцветов".to_string(), eps(&[63]))
        );
        assert_eq!(
            split_base_and_episodes("Гора самоцветов 63 копия 2"),
            ("гора самоцветов".to_string(), eps(&[63]))
        );
        assert_eq!(
            split_base_and_episodes("Новости копия 2.mp4"),
            ("новости".to_string(), EpisodeSet::Unnumbered)
        );
    }

    #[test]
    fn test_split_hyphenated_numeral_name_is_not_episodic() {
        assert_eq!(
            split_base_and_episodes("Топ-10"),
            ("топ-10".to_string(), EpisodeSet::Unnumbered)
        );
        assert_eq!(
            split_base_and_episodes("Апокалипсис-2"),
            ("апокалипсис-2".to_string(), EpisodeSet::Unnumbered)
        );
        // A spaced dash still separates the episode
        assert_eq!(
            split_base_and_episodes("Апокалипсис - 2"),
            ("апокалипсис".to_string(), eps(&[2]))
        );
    }

    #[test]
    fn test_split_leading_numeral_kept_in_base() {
        assert_eq!(
            split_base_and_episodes("18 лун"),
            ("18 лун".to_string(), EpisodeSet::Unnumbered)
        );
    }

    #[test]
    fn test_split_trailing_numeral_is_read_as_episode() {
        // Known ambiguity: a name ending in a number looks episodic
        assert_eq!(
            split_base_and_episodes("Океан 11"),
            ("океан".to_string(), eps(&[11]))
        );
    }

    #[test]
    fn test_norm_base_only_strips_stop_words() {
        assert_eq!(norm_base_only("Фильм Бабоньки"), "бабоньки");
        assert_eq!(norm_base_only("Передача Новости выпуск"), "новости");
        assert_eq!(norm_base_only("фильм"), "");
    }

    #[test]
    fn test_episode_set_helpers() {
        let set = eps(&[5, 6]);
        assert!(set.is_numbered());
        assert_eq!(set.len(), 2);
        assert!(!set.is_single(5));
        assert!(eps(&[5]).is_single(5));
        assert!(set.intersects(&eps(&[6, 7])));
        assert!(!set.intersects(&EpisodeSet::Unnumbered));
        assert!(!EpisodeSet::Unnumbered.is_numbered());
        assert_eq!(EpisodeSet::Unnumbered.numbers().count(), 0);
        assert_eq!(eps(&[]), EpisodeSet::Unnumbered);
        assert_eq!(set.to_string(), "{5,6}");
    }
}
