//! Response cleanup and report formatting.
//!
//! Assessor output arrives with markdown decoration and, for rewrites,
//! leading commentary ("Here's a rewrite..."). Both transforms here are
//! pure text cleanup and idempotent.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{EvaluationType, PhaseResult, ProtocolMode};

lazy_static! {
    static ref EMPHASIS: Regex = Regex::new(r"\*{1,3}").unwrap();
    static ref HEADING: Regex = Regex::new(r"#{1,6}\s*").unwrap();
    static ref HORIZONTAL_RULE: Regex = Regex::new(r"-{3,}").unwrap();
    static ref UNDERSCORE_RULE: Regex = Regex::new(r"_{3,}").unwrap();
    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();

    /// Leading commentary phrases models prepend to rewrites.
    static ref REWRITE_PREAMBLE: Regex = Regex::new(
        r"(?i)^\s*(?:here(?:'|\u{2019})s (?:a |the |your )?(?:rewrite|rewritten|revised)[^\n]*|here is (?:a |the |your )?(?:rewrite|rewritten|revised)[^\n]*|rewritten (?:text|version)\s*:?)\s*\n+"
    ).unwrap();
}

/// Strip markdown decoration from a response.
///
/// Removes emphasis and heading markers, horizontal rules, and collapses
/// runs of blank lines. Idempotent.
pub fn clean_response(text: &str) -> String {
    let text = EMPHASIS.replace_all(text, "");
    let text = HEADING.replace_all(&text, "");
    let text = HORIZONTAL_RULE.replace_all(&text, "");
    let text = UNDERSCORE_RULE.replace_all(&text, "");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Clean a rewrite response: markdown cleanup plus removal of any leading
/// commentary line before the rewritten text itself. Idempotent.
pub fn clean_rewrite_output(text: &str) -> String {
    let cleaned = clean_response(text);
    REWRITE_PREAMBLE.replace(&cleaned, "").trim().to_string()
}

/// One-line score delta, e.g. `+15 points (improvement)`.
pub fn delta_line(original: u8, rewritten: u8) -> String {
    let diff = rewritten as i16 - original as i16;
    let label = match diff {
        d if d > 0 => "improvement",
        d if d < 0 => "regression",
        _ => "no change",
    };
    let sign = if diff > 0 { "+" } else { "" };
    format!("{sign}{diff} points ({label})")
}

/// Full delta report for a rewrite operation.
pub fn rewrite_report(original: u8, rewritten: u8, provider: &str, instructions: &str) -> String {
    format!(
        "Intelligent Rewrite Analysis:\n\n\
         Original Score: {original}/100\n\
         Rewritten Score: {rewritten}/100\n\
         Change: {delta}\n\n\
         Provider: {provider}\n\
         Instructions: {instructions}",
        delta = delta_line(original, rewritten),
    )
}

/// Assemble the human-readable transcript report for a protocol run.
pub fn protocol_report(
    evaluation_type: EvaluationType,
    mode: ProtocolMode,
    phases: &[PhaseResult],
    final_score: u8,
) -> String {
    let title = match mode {
        ProtocolMode::Comprehensive => {
            format!("4-Phase {} Evaluation Protocol", evaluation_type.label())
        }
        ProtocolMode::Normal => {
            format!("Quick {} Evaluation (Phase 1 Only)", evaluation_type.label())
        }
    };

    let mut report = String::from(&title);
    report.push('\n');
    for phase in phases {
        report.push_str(&format!(
            "\nPHASE {} - {}\nScore: {}/100\n{}\n",
            phase.phase.number(),
            phase.phase.label(),
            phase.score.value,
            phase.response,
        ));
    }
    report.push_str(&format!("\nFINAL ASSESSMENT SCORE: {final_score}/100"));
    report
}
