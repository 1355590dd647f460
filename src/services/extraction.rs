//! Structured-response extraction.
//!
//! The completion provider is told to answer with bare JSON, but the text that
//! comes back may carry prose, markdown fences, truncation or small syntax
//! slips. `extract` runs an ordered cascade of strategies over the raw text,
//! cheapest and most precise first, and returns the first document of the
//! expected shape.
//!
//! The bracket-span strategy is a heuristic, not a grammar: it takes the
//! greedy span from the first opening bracket to the last closing one, so it
//! assumes a single top-level value and no stray brackets in surrounding prose.

use crate::services::json_repair::{repair_json, RepairError};
use log::{debug, error, info};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    Object,
    Array,
}

impl DocumentShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentShape::Object => "object",
            DocumentShape::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            DocumentShape::Object => value.is_object(),
            DocumentShape::Array => value.is_array(),
        }
    }

    fn span_pattern(&self) -> &'static Regex {
        static OBJECT_SPAN: OnceLock<Regex> = OnceLock::new();
        static ARRAY_SPAN: OnceLock<Regex> = OnceLock::new();

        match self {
            DocumentShape::Object => {
                OBJECT_SPAN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid object span regex"))
            }
            DocumentShape::Array => {
                ARRAY_SPAN.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid array span regex"))
            }
        }
    }
}

impl fmt::Display for DocumentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    DirectParse,
    FencedBlock,
    BracketSpan,
    RepairedBracketSpan,
    RepairedWholeText,
}

/// Order matters: the whole-text repair comes last so that it cannot turn
/// unrelated prose into structure while a more precise strategy would work.
pub const CASCADE: [ExtractionStrategy; 5] = [
    ExtractionStrategy::DirectParse,
    ExtractionStrategy::FencedBlock,
    ExtractionStrategy::BracketSpan,
    ExtractionStrategy::RepairedBracketSpan,
    ExtractionStrategy::RepairedWholeText,
];

impl ExtractionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractionStrategy::DirectParse => "direct parse",
            ExtractionStrategy::FencedBlock => "fenced json block",
            ExtractionStrategy::BracketSpan => "bracket span",
            ExtractionStrategy::RepairedBracketSpan => "repaired bracket span",
            ExtractionStrategy::RepairedWholeText => "repaired whole text",
        }
    }

    fn attempt(&self, raw: &str, shape: DocumentShape) -> Result<Value, AttemptError> {
        match self {
            ExtractionStrategy::DirectParse => parse_shaped(raw.trim(), shape),
            ExtractionStrategy::FencedBlock => {
                let block = fenced_block(raw).ok_or(AttemptError::NotFound)?;
                parse_shaped(block.trim(), shape)
            }
            ExtractionStrategy::BracketSpan => {
                let span = bracket_span(raw, shape).ok_or(AttemptError::NotFound)?;
                parse_shaped(span, shape)
            }
            ExtractionStrategy::RepairedBracketSpan => {
                let span = bracket_span(raw, shape).ok_or(AttemptError::NotFound)?;
                let repaired = repair_json(span)?;
                parse_shaped(&repaired, shape)
            }
            ExtractionStrategy::RepairedWholeText => {
                let repaired = repair_json(raw)?;
                parse_shaped(&repaired, shape)
            }
        }
    }
}

/// Terminal failure: every strategy was exhausted. Carries the provider text
/// untouched so it can be shown for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    pub shape: DocumentShape,
    pub raw: String,
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not parse a JSON {} from the AI response",
            self.shape
        )
    }
}

impl std::error::Error for ExtractionFailure {}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub document: Value,
    pub strategy: ExtractionStrategy,
}

#[derive(Debug)]
enum AttemptError {
    NotFound,
    Parse(serde_json::Error),
    Repair(RepairError),
    WrongShape,
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::NotFound => write!(f, "no candidate text found"),
            AttemptError::Parse(err) => write!(f, "parse error: {}", err),
            AttemptError::Repair(err) => write!(f, "repair error: {}", err),
            AttemptError::WrongShape => write!(f, "parsed JSON has the wrong top-level shape"),
        }
    }
}

impl From<serde_json::Error> for AttemptError {
    fn from(err: serde_json::Error) -> Self {
        AttemptError::Parse(err)
    }
}

impl From<RepairError> for AttemptError {
    fn from(err: RepairError) -> Self {
        AttemptError::Repair(err)
    }
}

/// Extract a document of the given shape from raw provider text.
pub fn extract(raw: &str, shape: DocumentShape) -> Result<Extracted, ExtractionFailure> {
    for strategy in CASCADE {
        match strategy.attempt(raw, shape) {
            Ok(document) => {
                info!("Extracted JSON {} via {}", shape, strategy.name());
                return Ok(Extracted { document, strategy });
            }
            Err(err) => debug!("Extraction via {} failed: {}", strategy.name(), err),
        }
    }

    error!(
        "Failed to extract a JSON {} from AI response: {}",
        shape, raw
    );
    Err(ExtractionFailure {
        shape,
        raw: raw.to_string(),
    })
}

fn parse_shaped(text: &str, shape: DocumentShape) -> Result<Value, AttemptError> {
    let value: Value = serde_json::from_str(text)?;
    if shape.matches(&value) {
        Ok(value)
    } else {
        Err(AttemptError::WrongShape)
    }
}

fn fenced_block(raw: &str) -> Option<&str> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?is)```json(.*?)```").expect("valid fence regex"));

    fence
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str())
}

fn bracket_span(raw: &str, shape: DocumentShape) -> Option<&str> {
    shape.span_pattern().find(raw).map(|span| span.as_str())
}
