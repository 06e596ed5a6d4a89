//! Score extraction from free-text evaluator responses.
//!
//! Assessors are instructed to end with `FINAL SCORE: N/100`, but responses
//! are unstructured prose and the instruction is not always honored. The
//! extractor applies an ordered set of heuristics and always produces a
//! value; the pipeline never fails over unparsable text. The origin tag
//! records which heuristic fired so callers can tell an extracted 75 from
//! the fallback 75.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// `FINAL SCORE: N` or `FINAL SCORE: N/100`, case-insensitive.
    static ref FINAL_TAG: Regex =
        Regex::new(r"(?i)final\s+score[:\s]*(\d{1,3})(?:\s*/\s*100)?").unwrap();

    /// `final score: N` / `overall score: N`.
    static ref LABELED: Regex =
        Regex::new(r"(?i)\b(?:final|overall)\s+score[:\s]*(\d{1,3})(?:\s*/\s*100)?").unwrap();

    /// Any `score: N` statement.
    static ref GENERIC: Regex =
        Regex::new(r"(?i)\bscore[:\s]*(\d{1,3})(?:\s*/\s*100)?").unwrap();

    /// Bare two- and three-digit integers.
    static ref BARE_NUMBER: Regex = Regex::new(r"\b(\d{2,3})\b").unwrap();
}

/// Phrases that indicate a strongly positive assessment. Used only when no
/// numeric score is stated anywhere in the response.
const QUALITY_PHRASES: &[&str] = &[
    "highly insightful",
    "genuinely intelligent",
    "rigorous",
    "sophisticated",
    "model of effective",
    "exceptional",
    "brilliant",
    "masterful",
    "fresh perspectives",
    "nuanced arguments",
    "systematically develops",
    "profound understanding",
    "intellectual depth",
    "conceptual clarity",
    "philosophical sophistication",
    "analytical precision",
    "logical rigor",
    "demonstrates mastery",
    "evidence of genius",
    "highly sophisticated",
    "intellectually honest",
    "substantial contribution",
    "significant insight",
];

/// Bare numbers below this are assumed to be prose artifacts, not scores.
const BARE_NUMBER_FLOOR: u32 = 40;

/// Returned when nothing in the response looks like a score.
pub const FALLBACK_SCORE: u8 = 75;

/// Which heuristic produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOrigin {
    /// Explicit `FINAL SCORE: N/100` statement.
    FinalTag,
    /// `final score:` / `overall score:` statement.
    Labeled,
    /// Generic `score:` statement.
    Generic,
    /// Largest plausible bare number in the text.
    BareNumber,
    /// Quality-keyword census.
    Keyword,
    /// Nothing matched; fixed fallback value.
    Fallback,
}

/// An extracted score, clamped to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub value: u8,
    pub origin: ScoreOrigin,
}

impl Score {
    pub fn new(value: u8, origin: ScoreOrigin) -> Self {
        Self {
            value: value.min(100),
            origin,
        }
    }

    /// True when the value came from the response rather than the fallback.
    pub fn is_extracted(&self) -> bool {
        self.origin != ScoreOrigin::Fallback
    }
}

/// Extract a score from a raw evaluator response.
///
/// Heuristics are tried in order; the first that matches wins. Within the
/// explicit-statement patterns the LAST occurrence in the text wins, since
/// assessors restate revised scores at the end of a response. Pure function
/// of the input; never fails.
pub fn extract_score(response: &str) -> Score {
    if let Some(value) = last_capture(&FINAL_TAG, response) {
        tracing::debug!(value, "extracted final-tag score");
        return Score::new(clamp(value), ScoreOrigin::FinalTag);
    }

    if let Some(value) = last_capture(&LABELED, response) {
        tracing::debug!(value, "extracted labeled score");
        return Score::new(clamp(value), ScoreOrigin::Labeled);
    }

    if let Some(value) = last_capture(&GENERIC, response) {
        tracing::debug!(value, "extracted generic score statement");
        return Score::new(clamp(value), ScoreOrigin::Generic);
    }

    // No explicit statement anywhere. Evaluators rarely write numbers in
    // the 40..=100 window for any other reason, so the largest one present
    // is most likely the score.
    let best_bare = BARE_NUMBER
        .captures_iter(response)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .filter(|n| (BARE_NUMBER_FLOOR..=100).contains(n))
        .max();
    if let Some(value) = best_bare {
        tracing::debug!(value, "extracted bare numeric score");
        return Score::new(value as u8, ScoreOrigin::BareNumber);
    }

    let lowered = response.to_lowercase();
    let hits = QUALITY_PHRASES
        .iter()
        .filter(|phrase| lowered.contains(*phrase))
        .count();
    let keyword_value = match hits {
        n if n >= 5 => Some(96),
        n if n >= 3 => Some(92),
        n if n >= 1 => Some(86),
        _ => None,
    };
    if let Some(value) = keyword_value {
        tracing::debug!(hits, value, "scored via quality-keyword census");
        return Score::new(value, ScoreOrigin::Keyword);
    }

    tracing::debug!("no score signal found, using fallback");
    Score::new(FALLBACK_SCORE, ScoreOrigin::Fallback)
}

fn last_capture(pattern: &Regex, text: &str) -> Option<u32> {
    pattern
        .captures_iter(text)
        .last()
        .and_then(|c| c[1].parse::<u32>().ok())
}

fn clamp(value: u32) -> u8 {
    value.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn final_tag_anywhere_in_text() {
        let text = "Long preamble about the argument.\nFINAL SCORE: 73/100\nA closing remark.";
        let score = extract_score(text);
        assert_eq!(score.value, 73);
        assert_eq!(score.origin, ScoreOrigin::FinalTag);
    }

    #[test]
    fn final_tag_without_denominator() {
        let score = extract_score("final score: 81");
        assert_eq!(score.value, 81);
        assert_eq!(score.origin, ScoreOrigin::FinalTag);
    }

    #[test]
    fn last_final_tag_wins() {
        let text = "FINAL SCORE: 62/100 ... after reconsideration ... FINAL SCORE: 88/100";
        assert_eq!(extract_score(text).value, 88);
    }

    #[test]
    fn explicit_score_beats_keywords() {
        let text = "This work is exceptional and rigorous and brilliant and masterful \
                    and sophisticated. FINAL SCORE: 40/100";
        let score = extract_score(text);
        assert_eq!(score.value, 40);
        assert_eq!(score.origin, ScoreOrigin::FinalTag);
    }

    #[test]
    fn overall_score_statement() {
        let score = extract_score("In sum, the overall score: 67/100 seems right.");
        assert_eq!(score.value, 67);
        assert_eq!(score.origin, ScoreOrigin::Labeled);
    }

    #[test]
    fn generic_score_statement() {
        let score = extract_score("I would assign a score: 58 to this passage.");
        assert_eq!(score.value, 58);
        assert_eq!(score.origin, ScoreOrigin::Generic);
    }

    #[test]
    fn bare_numbers_take_maximum_in_window() {
        // 12 is below the floor, 85 and 91 are candidates, 250 is out of range.
        let score = extract_score("Roughly 12 pages; I'd put it near 85, maybe 91, not 250.");
        assert_eq!(score.value, 91);
        assert_eq!(score.origin, ScoreOrigin::BareNumber);
    }

    #[test]
    fn bare_numbers_below_floor_are_ignored() {
        let score = extract_score("There are 12 sections and 38 footnotes.");
        assert_ne!(score.origin, ScoreOrigin::BareNumber);
    }

    #[test]
    fn keyword_census_tiers() {
        assert_eq!(
            extract_score("exceptional, rigorous, brilliant, masterful, and sophisticated work")
                .value,
            96
        );
        assert_eq!(extract_score("rigorous, brilliant, and masterful").value, 92);
        let one = extract_score("a brilliant effort");
        assert_eq!(one.value, 86);
        assert_eq!(one.origin, ScoreOrigin::Keyword);
    }

    #[test]
    fn fallback_when_nothing_matches() {
        let score = extract_score("A perfectly ordinary paragraph about gardening.");
        assert_eq!(score.value, FALLBACK_SCORE);
        assert_eq!(score.origin, ScoreOrigin::Fallback);
        assert!(!score.is_extracted());
    }

    #[test]
    fn values_above_one_hundred_clamp() {
        assert_eq!(extract_score("FINAL SCORE: 150/100").value, 100);
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "The claim is defensible. FINAL SCORE: 84/100";
        assert_eq!(extract_score(text), extract_score(text));
    }

    proptest! {
        #[test]
        fn never_exceeds_bounds(text in ".{0,400}") {
            let score = extract_score(&text);
            prop_assert!(score.value <= 100);
        }

        #[test]
        fn pure_function_of_text(text in ".{0,400}") {
            prop_assert_eq!(extract_score(&text), extract_score(&text));
        }

        #[test]
        fn explicit_tag_always_wins(value in 0u32..=100) {
            let text = format!("Some commentary. FINAL SCORE: {}/100", value);
            let score = extract_score(&text);
            prop_assert_eq!(score.value as u32, value);
            prop_assert_eq!(score.origin, ScoreOrigin::FinalTag);
        }
    }
}
