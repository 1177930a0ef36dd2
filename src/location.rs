//! Feature location parsing.
//!
//! Turns a location expression into the ordered `LocationSpan` list the
//! extractor works from. The supported grammar is the part of the INSDC
//! location language this pipeline translates:
//!
//! ```text
//! location   = span | "complement(" location ")" | "join(" location, ... ")"
//! span       = ["<"] start ".." [">"] end
//! ```
//!
//! `complement` over a `join` reverses both the order of the spans and the
//! strand of each one, so the spliced product reads 5'→3' again. Everything
//! else (single-base locations, `order`, `bond`, `one-of`, external
//! references) is rejected.

use thiserror::Error;

use crate::model::{LocationSpan, Strand};

/// Errors that can occur while parsing a location expression.
#[derive(Error, Debug)]
pub enum LocationError {
    #[error("malformed location expression: {0:?}")]
    MalformedLocation(String),
}

/// Result type for location parsing.
pub type LocationResult<T> = Result<T, LocationError>;

/// Parses a location expression into ordered spans.
///
/// # Arguments
///
/// * `text` - The raw location string from a feature table, e.g.
///   `complement(join(2691..4571,4918..5163))`
///
/// # Returns
///
/// The ordered list of spans to extract, one per contiguous stretch.
///
/// # Examples
///
/// ```
/// use gbk2faa::location::parse_location;
/// use gbk2faa::model::Strand;
///
/// let spans = parse_location("complement(3300..4037)").unwrap();
/// assert_eq!(spans.len(), 1);
/// assert_eq!((spans[0].start, spans[0].end), (3300, 4037));
/// assert_eq!(spans[0].strand, Strand::Reverse);
/// ```
pub fn parse_location(text: &str) -> LocationResult<Vec<LocationSpan>> {
    // Continuation-joined expressions may carry stray whitespace.
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(LocationError::MalformedLocation(text.to_string()));
    }
    parse_expression(&cleaned)
}

fn parse_expression(expr: &str) -> LocationResult<Vec<LocationSpan>> {
    if let Some(inner) = strip_operator(expr, "complement") {
        let mut spans = parse_expression(inner)?;
        spans.reverse();
        for span in &mut spans {
            span.strand = span.strand.flipped();
        }
        return Ok(spans);
    }

    if let Some(inner) = strip_operator(expr, "join") {
        let mut spans = Vec::new();
        for part in split_top_level(inner) {
            if part.is_empty() {
                return Err(LocationError::MalformedLocation(expr.to_string()));
            }
            spans.extend(parse_expression(part)?);
        }
        if spans.is_empty() {
            return Err(LocationError::MalformedLocation(expr.to_string()));
        }
        return Ok(spans);
    }

    Ok(vec![parse_span(expr)?])
}

/// Strips `op(...)` when the whole expression is that operator call, i.e.
/// the opening parenthesis after `op` matches the final character.
fn strip_operator<'a>(expr: &'a str, op: &str) -> Option<&'a str> {
    let rest = expr.strip_prefix(op)?;
    let rest = rest.strip_prefix('(')?;
    let inner = rest.strip_suffix(')')?;
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// Splits on commas that are not nested inside parentheses.
fn split_top_level(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}

/// Parses a single `a..b` span with optional partial markers.
fn parse_span(expr: &str) -> LocationResult<LocationSpan> {
    let malformed = || LocationError::MalformedLocation(expr.to_string());

    let (low, high) = expr.split_once("..").ok_or_else(malformed)?;
    let (start_partial, low) = match low.strip_prefix('<') {
        Some(rest) => (true, rest),
        None => (false, low),
    };
    let (end_partial, high) = match high.strip_prefix('>') {
        Some(rest) => (true, rest),
        None => (false, high),
    };

    let start: u32 = low.parse().map_err(|_| malformed())?;
    let end: u32 = high.parse().map_err(|_| malformed())?;
    if start == 0 || end < start {
        return Err(malformed());
    }

    Ok(LocationSpan {
        start,
        end,
        strand: Strand::Forward,
        start_partial,
        end_partial,
    })
}
