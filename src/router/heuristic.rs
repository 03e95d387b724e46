//! Heuristic complexity scorer
//!
//! Deterministic, zero-I/O scoring of free-form text. Starts from a neutral
//! 0.5 and applies independent adjustments for length, embedded code volume,
//! the pattern library, question density and numbered lists. The result is
//! clamped to [0,1].

use super::patterns::pattern_adjustment;
use regex::Regex;
use std::sync::LazyLock;

const BASELINE: f64 = 0.5;

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("code block regex is valid")
});

static NUMBERED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[0-9]+\.").expect("numbered line regex is valid"));

/// Fenced code statistics for a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeStats {
    pub blocks: usize,
    pub lines: usize,
}

impl CodeStats {
    pub fn from_text(text: &str) -> Self {
        CODE_BLOCK_RE
            .captures_iter(text)
            .fold(Self::default(), |acc, caps| {
                let lines = caps.get(1).map_or(0, |body| body.as_str().lines().count());
                Self {
                    blocks: acc.blocks + 1,
                    lines: acc.lines + lines,
                }
            })
    }
}

/// Score the complexity of `text` in [0,1]
pub fn score(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    let mut score = BASELINE;

    score += length_adjustment(words);
    score += code_adjustment(CodeStats::from_text(text));
    score += pattern_adjustment(text);
    score += question_adjustment(text.matches('?').count(), words);
    score += list_adjustment(NUMBERED_LINE_RE.find_iter(text).count());

    score.clamp(0.0, 1.0)
}

fn length_adjustment(words: usize) -> f64 {
    if words < 20 {
        -0.15
    } else if words > 500 {
        0.2
    } else if words > 200 {
        0.1
    } else {
        0.0
    }
}

fn code_adjustment(code: CodeStats) -> f64 {
    if code.lines > 100 {
        0.2
    } else if code.lines > 50 {
        0.1
    } else if code.blocks == 1 && code.lines < 20 {
        // a lone short snippet reads as a quick question about code
        -0.05
    } else {
        0.0
    }
}

fn question_adjustment(question_marks: usize, words: usize) -> f64 {
    let mut delta = 0.0;
    if question_marks >= 1 && words < 30 {
        delta -= 0.1;
    }
    if question_marks > 3 {
        delta += 0.1;
    }
    delta
}

fn list_adjustment(numbered_lines: usize) -> f64 {
    if numbered_lines > 3 { 0.1 } else { 0.0 }
}
