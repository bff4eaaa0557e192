//! Line parser: a two-state machine over cleaned lines.

use tracing::{debug, trace};

use crate::error::ParseError;
use crate::models::record::RawRecord;

use super::{ContinuationPolicy, InvoiceGrammar, Result};

/// Parser state between lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// No record has matched yet.
    NoAnchor,
    /// A record is open and may still receive continuation lines.
    HasAnchor(RawRecord),
}

impl ParserState {
    /// Feed one cleaned, non-blank line. A finished record is pushed to `done`.
    fn step<G: InvoiceGrammar + ?Sized>(
        self,
        grammar: &G,
        line: &str,
        done: &mut Vec<RawRecord>,
    ) -> Result<ParserState> {
        if let Some(record) = grammar.parse_line(line) {
            if let ParserState::HasAnchor(previous) = self {
                done.push(previous);
            }
            return Ok(ParserState::HasAnchor(record));
        }

        match (self, grammar.continuation()) {
            (ParserState::HasAnchor(mut current), ContinuationPolicy::Merge) => {
                current.append_text(line);
                Ok(ParserState::HasAnchor(current))
            }
            (ParserState::NoAnchor, ContinuationPolicy::Merge) => {
                Err(ParseError::UnreadableDocument {
                    carrier: grammar.carrier(),
                    reason: "continuation line before any record".to_string(),
                    fragment: line.to_string(),
                })
            }
            (state, ContinuationPolicy::Discard) => {
                trace!("Discarding unmatched line: {}", line);
                Ok(state)
            }
        }
    }
}

/// Parse ordered lines into raw records.
///
/// Record count equals the number of matching lines. Zero records is an error.
pub fn parse_lines<G, S>(grammar: &G, lines: &[S]) -> Result<Vec<RawRecord>>
where
    G: InvoiceGrammar + ?Sized,
    S: AsRef<str>,
{
    let mut records = Vec::new();
    let mut state = ParserState::NoAnchor;

    for line in lines {
        let cleaned = grammar.clean_line(line.as_ref());
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }
        state = state.step(grammar, cleaned, &mut records)?;
    }

    if let ParserState::HasAnchor(last) = state {
        records.push(last);
    }

    if records.is_empty() {
        return Err(ParseError::UnreadableDocument {
            carrier: grammar.carrier(),
            reason: "no line matched the invoice grammar".to_string(),
            fragment: lines
                .iter()
                .map(|l| l.as_ref().trim())
                .find(|l| !l.is_empty())
                .unwrap_or_default()
                .to_string(),
        });
    }

    debug!("Parsed {} {} records from {} lines", records.len(), grammar.carrier(), lines.len());
    Ok(records)
}
