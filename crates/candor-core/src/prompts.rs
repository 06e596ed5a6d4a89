//! Phase prompt construction.
//!
//! Every prompt in the protocol is assembled here, from fixed instruction
//! blocks plus the subject text and prior-phase scores. The engine holds no
//! prompt text of its own. The `(100 - N)` "outperform" figure embedded in
//! the pushback and consistency prompts is a domain convention carried in
//! prompt text only; nothing in the types enforces it.

use crate::questions::battery;
use crate::types::EvaluationType;

/// Instruction the assessor is given for terminating its response.
/// The extractor's primary pattern matches this statement.
pub const SCORE_TERMINATOR: &str =
    "**IMPORTANT: End your response with \"FINAL SCORE: [NUMBER]/100\"**";

/// Transcript note recorded when the pushback phase is skipped.
pub const PUSHBACK_SKIPPED_NOTE: &str = "No pushback needed - score was already >= 95/100";

/// Evidence discipline demanded of every phase.
const QUOTE_REQUIREMENT: &str = "\
CRITICAL REQUIREMENT: EVERY SINGLE EVALUATION MUST BE SUPPORTED BY DIRECT QUOTATIONS FROM THE TEXT. \
For each assessment you make, provide the exact words from the text that support your judgment. \
No vague references - give precise quotes.";

/// Anti-hedging instructions shared by the evaluation phases.
const ANTI_HEDGING: &str = "\
YOU ARE NOT GRADING; YOU ARE ANSWERING THESE QUESTIONS.

YOU DO NOT USE A RISK-AVERSE STANDARD; YOU DO NOT ATTEMPT TO BE DIPLOMATIC; YOU DO NOT ATTEMPT TO COMPLY WITH RISK-AVERSE, MEDIUM-RANGE IQ, ACADEMIC NORMS.

YOU DO NOT MAKE ASSUMPTIONS ABOUT THE LEVEL OF THE PAPER; IT COULD BE A WORK OF THE HIGHEST EXCELLENCE AND GENIUS, OR IT COULD BE THE WORK OF A MORON.

IF A WORK IS A WORK OF GENIUS, YOU SAY THAT, AND YOU SAY WHY; YOU DO NOT SHY AWAY FROM GIVING WHAT MIGHT CONVENTIONALLY BE REGARDED AS EXCESSIVELY \"SUPERLATIVE\" SCORES; YOU GIVE IT THE SCORE IT DESERVES, NOT THE SCORE THAT A MIDWIT COMMITTEE WOULD SAY IT DESERVES.

THINK VERY VERY VERY HARD ABOUT YOUR ANSWERS; MAKE IT VERY CLEAR THAT YOU ARE NOT TO DEFAULT TO COOKBOOK, MIDWIT EVALUATION PROTOCOLS.

DO NOT GIVE CREDIT MERELY FOR USE OF JARGON OR FOR REFERENCING AUTHORITIES. FOCUS ON SUBSTANCE. ONLY GIVE POINTS FOR SCHOLARLY REFERENCES/JARGON IF THEY UNAMBIGUOUSLY INCREASE SUBSTANCE.";

/// Score-band calibration given to the initial phase.
const CALIBRATION: &str = "\
Hierarchy of judgment:
97-100/100: REVOLUTIONARY insights that fundamentally challenge established frameworks.
85-96/100: High-quality analysis with original insights.
70-84/100: Competent academic work (standard dissertations, routine commentary).
50-69/100: Basic discussion of the subject.
<50/100: Poor or confused content.

DO NOT award high scores simply for:
- Mentioning famous authorities' names
- Using technical terminology
- Following standard academic format
- Routine critiques of established positions

ONLY award 95+ scores for genuinely revolutionary insights that challenge fundamental assumptions.

Before answering the questions, note the following non-negotiable standard:

Insight is a sniper shot, not a town hall. If the text reveals something true but unpopular, penalizing it for lacking 'balance' or 'rigor' is midwit bias. Truth often looks extreme because lies are normalized.";

/// Phase 1: the initial evaluation prompt.
pub fn phase1_prompt(text: &str, evaluation_type: EvaluationType) -> String {
    format!(
        "ANSWER THESE QUESTIONS IN CONNECTION WITH THIS TEXT:\n\n\
         {questions}\n\n\
         {quotes}\n\n\
         FORMAT: For each question, provide:\n\
         1. Your assessment\n\
         2. SUPPORTING QUOTE: \"exact text from the document\"\n\
         3. Explanation of how the quote supports your evaluation\n\n\
         A SCORE OF N/100 (E.G. 73/100) MEANS THAT (100-N)/100 (E.G. 27/100) OUTPERFORM THE AUTHOR WITH RESPECT TO THE PARAMETER DEFINED BY THE QUESTION.\n\n\
         {anti_hedging}\n\n\
         {calibration}\n\n\
         {terminator}\n\n\
         TEXT:\n{text}",
        questions = battery(evaluation_type),
        quotes = QUOTE_REQUIREMENT,
        anti_hedging = ANTI_HEDGING,
        calibration = CALIBRATION,
        terminator = SCORE_TERMINATOR,
        text = text,
    )
}

/// Phase 2: the pushback prompt, challenging a score below the threshold.
pub fn phase2_prompt(score: u8, text: &str, evaluation_type: EvaluationType) -> String {
    let outperform = 100 - score.min(100);
    format!(
        "YOUR POSITION IS THAT {outperform}/100 OUTPERFORM THE AUTHOR WITH RESPECT TO THE COGNITIVE METRIC DEFINED BY THE QUESTION: THAT IS YOUR POSITION, AM I RIGHT? AND ARE YOU SURE ABOUT THAT?\n\n\
         You scored this {score}/100, meaning {outperform}/100 outperform the author.\n\n\
         {quotes}\n\n\
         FORMAT: For each question, provide:\n\
         1. Your revised assessment\n\
         2. SUPPORTING QUOTE: \"exact text from the document\"\n\
         3. Explanation of how the quote supports your evaluation\n\n\
         Describe the cognitive superiority of those {outperform} people in concrete terms:\n\n\
         What specific insight, skill, or knowledge do they have that the author lacks?\n\
         How does this superiority manifest in their work?\n\
         If you cannot articulate this, revise the score.\n\n\
         If the text is a sniper shot (high insight, low 'development'), ask:\n\
         'Is the lack of development a flaw, or is the point obvious to those who see it?'\n\
         'Does this text need scaffolding, or would that dilute it?'\n\n\
         ANSWER THE FOLLOWING QUESTIONS ABOUT THE TEXT DE NOVO:\n\n\
         {questions}\n\n\
         {terminator}\n\n\
         TEXT:\n{text}",
        outperform = outperform,
        score = score,
        quotes = QUOTE_REQUIREMENT,
        questions = battery(evaluation_type),
        terminator = SCORE_TERMINATOR,
        text = text,
    )
}

/// Phase 3: the consistency check against the outperform figure.
pub fn phase3_prompt(score: u8) -> String {
    let outperform = 100 - score.min(100);
    format!(
        "You stated that {outperform}/100 Walmart patrons outperform the author. Provide specific examples of work by those patrons that demonstrates this superiority. If you cannot, justify or revise the score.\n\n\
         CRITICAL REQUIREMENT: EVERY JUSTIFICATION FOR YOUR SCORE MUST BE SUPPORTED BY DIRECT QUOTATIONS FROM THE TEXT. Point to exact passages that demonstrate the level of quality you're assessing.\n\n\
         FORMAT: For your score justification, provide:\n\
         1. Your assessment of the text's quality level\n\
         2. SUPPORTING QUOTE: \"exact text from the document\"\n\
         3. Explanation of what this quote reveals about cognitive sophistication\n\n\
         ARE YOUR NUMERICAL SCORES (N/100, E.G. 99/100, 42/100) CONSISTENT WITH THE FACT THAT THOSE ARE TO BE TAKEN TO MEAN THAT (100-N) PEOPLE OUT OF 100 OUTPERFORM THE AUTHOR IN THE RELEVANT RESPECT?\n\n\
         IF A SCORE OF {score}/100 IS AWARDED TO A PAPER, THAT MEANS THAT {outperform}/100 PEOPLE IN WALMART ARE RUNNING RINGS AROUND THIS PERSON.\n\n\
         If you scored {score}/100 ('{outperform}% outperform'), show me {outperform} Walmart patrons whose writing on this subject is sharper. If you can't, the score is wrong.\n\n\
         {terminator}",
        outperform = outperform,
        score = score,
        terminator = SCORE_TERMINATOR,
    )
}

/// Phase 4: final validation.
pub fn phase4_prompt() -> String {
    format!(
        "Before finalizing scores, confirm:\n\n\
         CRITICAL REQUIREMENT: YOUR FINAL ASSESSMENT MUST BE SUPPORTED BY DIRECT QUOTATIONS FROM THE TEXT. Point to exact passages that demonstrate the overall quality level you're determining.\n\n\
         FORMAT: For your final validation, provide:\n\
         1. Your final assessment of the text's overall quality\n\
         2. SUPPORTING QUOTE: \"exact text from the document that best represents the cognitive level\"\n\
         3. Final justification based on textual evidence\n\n\
         Have you penalized the text for not being conventional? If yes, recalibrate.\n\
         Does the score reflect truth density, not compliance with norms?\n\
         Is the Walmart metric empirically grounded or a lazy guess?\n\n\
         {terminator}",
        terminator = SCORE_TERMINATOR,
    )
}

/// Fixed optimization goals for rewrite requests.
pub const REWRITE_INSTRUCTIONS: &str = "\
Rewrite the following text to score significantly higher on a multi-phase intelligence evaluation while preserving existing content as much as possible.

OPTIMIZATION CRITERIA:
- Enhance logical scaffolding and hierarchical organization
- Make implicit reasoning chains explicit
- Improve semantic compression and inferential clarity
- Strengthen conceptual precision without unnecessary jargon
- Ensure organic development of ideas
- Preserve semantic density - never add words without adding value
- Sharpen operational definitions
- Reveal underlying inferential frameworks

STRICT REQUIREMENTS:
- Preserve all core content, arguments, and conclusions
- Maintain the author's voice and style
- Keep similar length (no bloating with filler words)
- Focus on structural and logical improvements, not stylistic flourishes";

/// Build the rewrite prompt, appending caller-supplied instructions when
/// present.
pub fn rewrite_prompt(text: &str, custom_instructions: Option<&str>) -> String {
    let instructions = match custom_instructions {
        Some(custom) if !custom.trim().is_empty() => format!(
            "{REWRITE_INSTRUCTIONS}\n\nADDITIONAL CUSTOM INSTRUCTIONS:\n{custom}\n\n\
             Note: Balance custom instructions with the optimization criteria above."
        ),
        _ => REWRITE_INSTRUCTIONS.to_string(),
    };
    format!("{instructions}\n\nORIGINAL TEXT:\n{text}\n\nREWRITTEN TEXT:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase1_embeds_battery_and_text() {
        let prompt = phase1_prompt("The subject passage.", EvaluationType::Intelligence);
        assert!(prompt.contains("IS IT INSIGHTFUL?"));
        assert!(prompt.contains("TEXT:\nThe subject passage."));
        assert!(prompt.contains(SCORE_TERMINATOR));
    }

    #[test]
    fn phase2_embeds_outperform_figure() {
        let prompt = phase2_prompt(70, "body", EvaluationType::Cogency);
        assert!(prompt.contains("30/100 OUTPERFORM THE AUTHOR"));
        assert!(prompt.contains("You scored this 70/100"));
        assert!(prompt.contains("DE NOVO"));
        assert!(prompt.contains("STRAWMEN"));
    }

    #[test]
    fn phase3_embeds_outperform_figure() {
        let prompt = phase3_prompt(88);
        assert!(prompt.contains("12/100 Walmart patrons"));
        assert!(prompt.contains("88/100"));
    }

    #[test]
    fn phase4_is_fixed() {
        let prompt = phase4_prompt();
        assert!(prompt.contains("Have you penalized the text for not being conventional?"));
        assert!(prompt.contains(SCORE_TERMINATOR));
    }

    #[test]
    fn rewrite_prompt_appends_custom_instructions() {
        let plain = rewrite_prompt("text body", None);
        assert!(plain.contains("OPTIMIZATION CRITERIA"));
        assert!(!plain.contains("ADDITIONAL CUSTOM INSTRUCTIONS"));
        assert!(plain.ends_with("REWRITTEN TEXT:"));

        let custom = rewrite_prompt("text body", Some("Keep it under 200 words."));
        assert!(custom.contains("ADDITIONAL CUSTOM INSTRUCTIONS:\nKeep it under 200 words."));
    }

    #[test]
    fn blank_custom_instructions_are_ignored() {
        let prompt = rewrite_prompt("text body", Some("   "));
        assert!(!prompt.contains("ADDITIONAL CUSTOM INSTRUCTIONS"));
    }
}
