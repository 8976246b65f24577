//! Step extraction: splits a process description into typed steps.
//!
//! DESIGN
//! ======
//! A deterministic keyword heuristic, not language understanding. Each
//! sentence becomes one step; its type is chosen by position and keyword
//! with priority start > end > decision > process. Keyword tests match whole
//! words, case-insensitively. Input that yields no sentences falls back to a
//! fixed four-step flow, so the result is never empty.

#[cfg(test)]
#[path = "steps_test.rs"]
mod steps_test;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::consts::MAX_LABEL_CHARS;
use crate::diagram::StepType;

type Pattern = LazyLock<Option<Regex>>;

// Word boundaries and case folding are ASCII-only: a keyword glued to an
// accented letter still counts as a whole word, and non-ASCII letters never
// fold onto a keyword.
static SENTENCE_SPLIT: Pattern = LazyLock::new(|| compile(r"[.!?]+"));
static DECISION_WORDS: Pattern = LazyLock::new(|| {
    compile(r"(?-u:\b)(?i-u:if|whether|decide|check|verify|confirm|approve|reject)(?-u:\b)")
});
static START_WORDS: Pattern =
    LazyLock::new(|| compile(r"(?-u:\b)(?i-u:start|begin|initiate|create|submit)(?-u:\b)"));
static END_WORDS: Pattern =
    LazyLock::new(|| compile(r"(?-u:\b)(?i-u:end|complete|finish|deliver|send|notify)(?-u:\b)"));
static LEADING_TRANSITION: Pattern =
    LazyLock::new(|| compile(r"^(?i-u:then|next|after that|finally)\s*"));
// Lower-case only: a capitalised article at the start of a sentence is kept.
static ARTICLES: Pattern = LazyLock::new(|| compile(r"(?-u:\b)(?:the|a|an)(?-u:\b)"));
static CONDITION: Pattern =
    LazyLock::new(|| compile(r"(?-u:\b)(?i-u:if|whether)\s+(.+?)(?:\s+(?i-u:then)|\s*,|\s*$)"));
static DATA_WORDS: Pattern =
    LazyLock::new(|| compile(r"(?-u:\b)(?i-u:data|database|record|store|save|retrieve)(?-u:\b)"));

// Patterns are literals covered by `patterns_compile`; a failure is logged
// once and the pattern then never matches.
fn compile(source: &str) -> Option<Regex> {
    match Regex::new(source) {
        Ok(re) => Some(re),
        Err(e) => {
            error!(pattern = source, error = %e, "steps: pattern failed to compile");
            None
        }
    }
}

fn pattern(lazy: &'static Pattern) -> Option<&'static Regex> {
    LazyLock::force(lazy).as_ref()
}

fn is_match(lazy: &'static Pattern, text: &str) -> bool {
    pattern(lazy).is_some_and(|re| re.is_match(text))
}

fn strip(lazy: &'static Pattern, text: &str) -> String {
    pattern(lazy).map_or_else(|| text.to_owned(), |re| re.replace_all(text, "").into_owned())
}

/// One sentence of the prompt, typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Shortened sentence used as the node label.
    pub label: String,
    /// The trimmed sentence, unmodified.
    pub description: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Condition text of a decision sentence.
    pub condition: Option<String>,
}

/// Split `prompt` into typed steps. Never empty.
#[must_use]
pub fn extract_steps(prompt: &str) -> Vec<Step> {
    let sentences: Vec<&str> = match pattern(&SENTENCE_SPLIT) {
        Some(re) => re.split(prompt).map(str::trim).filter(|s| !s.is_empty()).collect(),
        None => Some(prompt.trim()).filter(|s| !s.is_empty()).into_iter().collect(),
    };

    if sentences.is_empty() {
        return default_steps();
    }

    let last = sentences.len() - 1;
    sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| classify(sentence, index, last))
        .collect()
}

fn classify(sentence: &str, index: usize, last: usize) -> Step {
    let is_decision = is_match(&DECISION_WORDS, sentence);
    let is_start = index == 0 || is_match(&START_WORDS, sentence);
    let is_end = index == last || is_match(&END_WORDS, sentence);

    let step_type = if is_start {
        StepType::Start
    } else if is_end {
        StepType::End
    } else if is_decision {
        StepType::Decision
    } else {
        StepType::Process
    };

    Step {
        label: simplify_label(sentence),
        description: sentence.to_owned(),
        step_type,
        condition: if is_decision { extract_condition(sentence) } else { None },
    }
}

/// Drop a leading transition word and lower-case articles, then truncate.
///
/// Whitespace left behind by removed articles is not collapsed.
#[must_use]
pub fn simplify_label(sentence: &str) -> String {
    // The anchored pattern strips at most one leading transition word.
    let without_transition = strip(&LEADING_TRANSITION, sentence);
    let without_articles = strip(&ARTICLES, &without_transition);
    let simplified = without_articles.trim();

    if simplified.chars().count() > MAX_LABEL_CHARS {
        let head: String = simplified.chars().take(MAX_LABEL_CHARS).collect();
        format!("{head}...")
    } else {
        simplified.to_owned()
    }
}

/// The clause following `if`/`whether`, up to `then`, a comma, or the end.
#[must_use]
pub fn extract_condition(sentence: &str) -> Option<String> {
    pattern(&CONDITION)?
        .captures(sentence)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Whether `text` mentions stored data (data, database, record, store,
/// save, retrieve).
#[must_use]
pub fn mentions_data(text: &str) -> bool {
    is_match(&DATA_WORDS, text)
}

/// The fixed flow used when a prompt contains no sentences.
#[must_use]
pub fn default_steps() -> Vec<Step> {
    [
        ("Start Process", "Begin the workflow", StepType::Start),
        ("Process Input", "Handle the incoming request", StepType::Process),
        ("Make Decision", "Evaluate conditions and decide next step", StepType::Decision),
        ("Complete Task", "Finish the process", StepType::End),
    ]
    .into_iter()
    .map(|(label, description, step_type)| Step {
        label: label.to_owned(),
        description: description.to_owned(),
        step_type,
        condition: None,
    })
    .collect()
}
