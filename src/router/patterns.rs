//! Pattern library for the heuristic scorer
//!
//! Each row is `(pattern, category, weight)`. Patterns are matched
//! case-insensitively against the whole prompt; a matching row contributes
//! its weight once, regardless of how many times it occurs or whether it
//! overlaps another row.

use regex::Regex;
use std::sync::LazyLock;

/// Signal category of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    /// Signals a trivial request (greetings, definitions, lookups)
    Simple,
    /// Signals routine work (small functions, explanations, comparisons)
    Medium,
    /// Signals demanding work (architecture, scale, concurrency, security)
    Complex,
}

impl PatternCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

pub const COMPLEX_WEIGHT: f64 = 0.08;
pub const MEDIUM_WEIGHT: f64 = 0.05;
pub const SIMPLE_WEIGHT: f64 = -0.15;

/// One row of the pattern table
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub pattern: &'static str,
    pub category: PatternCategory,
    pub weight: f64,
}

const fn complex(pattern: &'static str) -> PatternRule {
    PatternRule {
        pattern,
        category: PatternCategory::Complex,
        weight: COMPLEX_WEIGHT,
    }
}

const fn medium(pattern: &'static str) -> PatternRule {
    PatternRule {
        pattern,
        category: PatternCategory::Medium,
        weight: MEDIUM_WEIGHT,
    }
}

const fn simple(pattern: &'static str) -> PatternRule {
    PatternRule {
        pattern,
        category: PatternCategory::Simple,
        weight: SIMPLE_WEIGHT,
    }
}

pub const PATTERN_TABLE: &[PatternRule] = &[
    // complex
    complex(r"\barchitect(s|ure|ural|ing)?\b"),
    complex(r"\bdistributed\b"),
    complex(r"\bscal(e|able|ability|ing)\b"),
    complex(r"\bload[- ]?balanc"),
    complex(r"\bshard(s|ed|ing)?\b"),
    complex(r"\bcach(e|es|ing)\b"),
    complex(r"\bedge cases?\b"),
    complex(r"\berror handling\b"),
    complex(r"\b[0-9]+\s*[km]?\s*(requests|rps|qps|transactions)\b"),
    complex(r"\bmicroservices?\b"),
    complex(r"\b(concurren(t|cy)|race conditions?|deadlocks?|thread[- ]safe)\b"),
    complex(r"\b(security|vulnerabilit(y|ies)|threat model)\b"),
    complex(r"\boptimi[sz](e|ation)\b"),
    complex(r"\bperformance\b"),
    complex(r"\bfault[- ]toleran(t|ce)\b"),
    complex(r"\btrade-?offs?\b"),
    complex(r"\b(comprehensive|in-depth|thorough(ly)?)\b"),
    complex(r"\b(prove|proof|formal verification)\b"),
    complex(r"\brefactor\b.*\b(codebase|system|architecture|module)s?\b"),
    complex(r"\bdesign (a|an|the) .{0,40}\b(system|architecture|platform|pipeline)\b"),
    // medium
    medium(r"\bwrite (a|an|the|some) (\w+ )?(function|script|class|method|query|test|regex)\b"),
    medium(r"\b(explain|describe) (how|why)\b"),
    medium(r"\b(compare|difference between)\b"),
    medium(r"\b(debug|fix) (this|the|my)\b"),
    medium(r"\bimplement(ation)?\b"),
    medium(r"\b(javascript|typescript|python|rust|golang|java|sql)\b"),
    medium(r"\b(summari[sz]e|outline)\b"),
    medium(r"\bunit tests?\b"),
    medium(r"\b(api|endpoint)s?\b"),
    // simple
    simple(r"^\s*(what|who|when|where) (is|are|was|were)\b"),
    simple(r"^\s*(hi|hello|hey|thanks|thank you)\b"),
    simple(r"\bdefine\b"),
    simple(r"\bwhat does .{1,40} (mean|stand for)\b"),
    simple(r"\b(translate|convert) .{1,40} (to|into)\b"),
    simple(r"\bhow do (i|you) (say|spell|pronounce)\b"),
    simple(r"\b(yes or no|true or false)\b"),
    simple(r"\bquick question\b"),
    simple(r"\bin one (word|sentence)\b"),
    simple(r"\bfix (the |this |a )?typo\b"),
];

/// A pattern row with its compiled regex
#[derive(Debug)]
pub struct CompiledPattern {
    pub rule: PatternRule,
    pub regex: Regex,
}

/// Pattern table compiled once per process
pub static PATTERNS: LazyLock<Vec<CompiledPattern>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|rule| CompiledPattern {
            rule: *rule,
            regex: Regex::new(&format!("(?i){}", rule.pattern))
                .expect("static pattern table entries are valid regexes"),
        })
        .collect()
});

/// Sum of weights of every pattern matching `text`
pub fn pattern_adjustment(text: &str) -> f64 {
    PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(text))
        .map(|p| p.rule.weight)
        .sum()
}

/// Number of matching patterns in a category (diagnostics and tests)
pub fn match_count(text: &str, category: PatternCategory) -> usize {
    PATTERNS
        .iter()
        .filter(|p| p.rule.category == category && p.regex.is_match(text))
        .count()
}
