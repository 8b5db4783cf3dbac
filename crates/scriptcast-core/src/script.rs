//! Script segmentation — multi-speaker transcript → voice-tagged segments.
//!
//! Pure functions, no I/O. Each non-blank line is classified in order:
//!
//! ```text
//! "## Chapter One"                  → dropped (heading)
//! "*laughs*" / "[INTRO MUSIC]"      → dropped (pure stage direction)
//! "Host 1: Welcome! [MUSIC]"        → Segment { voice of "host 1", "Welcome!" }
//! "**Host 2:** Thanks"              → Segment { voice of "host 2", "Thanks" }
//! "[Host 1]: psst"                  → dropped (direction inside the label)
//! "Just some narration."            → Segment { default voice, ... }
//! ```

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::types::{CleaningPolicy, Segment, VoiceRegistry};

static RE_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s").unwrap());
static RE_PURE_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]*\]$").unwrap());
static RE_PURE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*{1,2}[^*]+\*{1,2}$").unwrap());
static RE_SPEAKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?):\s*(.+)$").unwrap());
static RE_ANY_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*?[^*]+\*\*?").unwrap());
static RE_BRACKET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static RE_BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static RE_ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static RE_EMPTY_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*+\s*\*+").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Words that mark a single-word `*...*` span as a performance cue under
/// [`CleaningPolicy::Selective`]. Matched as case-insensitive substrings.
pub const CUE_WORDS: &[&str] = &[
    "laugh",
    "pause",
    "sigh",
    "chuckle",
    "gasp",
    "cough",
    "giggle",
    "smile",
    "groan",
    "whisper",
    "sniff",
    "exhale",
    "inhale",
    "clears throat",
];

/// Characters that make a speaker label a stage direction. Text made of
/// nothing else is not speech either.
const DIRECTION_MARKERS: &[char] = &['[', ']', '*'];

/// How a single trimmed line is treated before cleaning.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Heading, pure direction, or a label that is itself a direction.
    Skip,
    /// `label: utterance` with a normalized label.
    Speaker { label: String, utterance: &'a str },
    /// No label — the whole line is spoken by the default voice.
    Plain(&'a str),
}

/// Split a script into voice-tagged segments.
///
/// Total over arbitrary input: the worst case is an empty vector. Output
/// order follows source line order.
pub fn segment(script: &str, registry: &VoiceRegistry, policy: CleaningPolicy) -> Vec<Segment> {
    script
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let (voice, utterance) = match classify(raw.trim()) {
                Line::Skip => return None,
                Line::Speaker { label, utterance } => (registry.resolve(&label), utterance),
                Line::Plain(utterance) => (registry.default_voice(), utterance),
            };

            let text = clean_utterance(utterance, policy);
            if text.is_empty() {
                return None;
            }

            Some(Segment {
                voice_id: voice.to_string(),
                text,
                line: i + 1,
            })
        })
        .collect()
}

/// True when the whole trimmed line is a single `[...]` or `*...*` block.
pub fn is_pure_direction(line: &str) -> bool {
    let line = line.trim();
    RE_PURE_BRACKET.is_match(line) || RE_PURE_EMPHASIS.is_match(line)
}

/// True for markdown headings (`#`, `##`, … followed by whitespace).
pub fn is_heading(line: &str) -> bool {
    RE_HEADING.is_match(line.trim_start())
}

/// Remove stage directions from an utterance and normalize whitespace.
///
/// Rules are applied until nothing changes, so cleaning cleaned text is a
/// no-op.
pub fn clean_utterance(text: &str, policy: CleaningPolicy) -> String {
    let mut current = clean_once(text, policy);
    loop {
        let next = clean_once(&current, policy);
        if next == current {
            break;
        }
        current = next;
    }
    if current
        .chars()
        .all(|c| c.is_whitespace() || DIRECTION_MARKERS.contains(&c))
    {
        current.clear();
    }
    current
}

fn clean_once(text: &str, policy: CleaningPolicy) -> String {
    let c = match policy {
        CleaningPolicy::Strict => {
            let c = RE_ANY_EMPHASIS.replace_all(text, "");
            RE_BRACKET.replace_all(&c, "").into_owned()
        }
        CleaningPolicy::Selective => {
            let c = RE_BRACKET.replace_all(text, "");
            let c = RE_BOLD.replace_all(&c, "$1");
            RE_ITALIC
                .replace_all(&c, |caps: &Captures| {
                    if is_cue(&caps[1]) {
                        String::new()
                    } else {
                        caps[0].to_string()
                    }
                })
                .into_owned()
        }
    };
    // Emphasis pairs emptied by bracket removal, e.g. "*[laughs]*" → "**".
    let c = RE_EMPTY_EMPHASIS.replace_all(&c, "");
    RE_WHITESPACE.replace_all(&c, " ").trim().to_string()
}

/// Multi-word emphasis or an action word reads as a cue, not as stress.
fn is_cue(inner: &str) -> bool {
    let inner = inner.trim();
    if inner.split_whitespace().count() > 1 {
        return true;
    }
    let lower = inner.to_lowercase();
    CUE_WORDS.iter().any(|w| lower.contains(w))
}

fn classify(line: &str) -> Line<'_> {
    if line.is_empty() || is_heading(line) || is_pure_direction(line) {
        return Line::Skip;
    }

    let Some(caps) = RE_SPEAKER.captures(line) else {
        return Line::Plain(line);
    };
    let (Some(raw_label), Some(utterance)) = (caps.get(1), caps.get(2)) else {
        return Line::Plain(line);
    };
    let raw_label = raw_label.as_str();
    let mut utterance = utterance.as_str();

    // Tolerate "*Host*: ..." and "**Host:** ..." by peeling the wrapper.
    let opening = raw_label.len() - raw_label.trim_start_matches('*').len();
    let mut label = raw_label;
    if opening > 0 {
        label = label.trim_start_matches('*');
        if label.ends_with('*') {
            label = label.trim_end_matches('*');
        } else {
            for _ in 0..opening {
                utterance = utterance.strip_prefix('*').unwrap_or(utterance);
            }
        }
    }

    let label = label.trim().to_lowercase();
    if label.contains(DIRECTION_MARKERS) {
        return Line::Skip;
    }

    Line::Speaker { label, utterance }
}
