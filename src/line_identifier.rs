//! Classification of boundary tokens into line numbers, literal text, or patterns.

use regex::Regex;

use crate::error::Error;
use crate::types::LineIdentifier;

/// Characters a JavaScript-style `.` refuses to cross; a quoted or slashed span
/// has to fit on one line.
const LINE_TERMINATORS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

/// Classify a raw boundary token.
///
/// Checks run in a fixed order and the first hit wins: `/pattern/`, then a
/// token wrapped whole in one pair of matching quotes, then a double- or
/// single-quoted span anywhere in the token, then any non-digit
/// character (verbatim text), then all digits (line number). `None` and the
/// empty string both mean "no boundary".
///
/// # Errors
///
/// Returns `Error::InvalidRegex` if a `/.../` token does not compile. The token
/// is never reinterpreted as literal text in that case.
pub fn resolve_line_identifier(token: Option<&str>) -> Result<Option<LineIdentifier>, Error> {
    let Some(token) = token else {
        return Ok(None);
    };

    if let Some(pattern) = slash_delimited_pattern(token) {
        return Regex::new(pattern)
            .map(|regex| return Some(LineIdentifier::Pattern(regex)))
            .map_err(|e| {
                return Error::InvalidRegex {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                };
            });
    }

    if let Some(interior) = wrapped_interior(token) {
        return Ok(Some(LineIdentifier::Text(interior.to_string())));
    }

    if let Some(text) = strip_quoted_span(token, '"').or_else(|| return strip_quoted_span(token, '\'')) {
        return Ok(Some(LineIdentifier::Text(text)));
    }

    if token.chars().any(|c| return !c.is_ascii_digit()) {
        return Ok(Some(LineIdentifier::Text(token.to_string())));
    }

    if token.is_empty() {
        return Ok(None);
    }

    // All digits from here; only overflow can fail the parse.
    return Ok(Some(LineIdentifier::Line(token.parse().unwrap_or(usize::MAX))));
}

/// Interior of a token shaped exactly `/.../` with no line break inside.
fn slash_delimited_pattern(token: &str) -> Option<&str> {
    let interior = token.strip_prefix('/')?.strip_suffix('/')?;
    if interior.contains(LINE_TERMINATORS) {
        return None;
    }
    return Some(interior);
}

/// Interior of a token that starts and ends with the same quote character.
/// Quotes inside the interior are kept as written.
fn wrapped_interior(token: &str) -> Option<&str> {
    return ['"', '\''].into_iter().find_map(|quote| {
        return token.strip_prefix(quote).and_then(|rest| return rest.strip_suffix(quote));
    });
}

/// Remove the opening and closing quote of the widest `q...q` span on the first
/// line that holds one. Text outside the span is kept.
fn strip_quoted_span(token: &str, quote: char) -> Option<String> {
    let mut line_start = 0;
    for line in token.split_inclusive(LINE_TERMINATORS) {
        if let (Some(open), Some(close)) = (line.find(quote), line.rfind(quote))
            && open < close
        {
            let open = line_start + open;
            let close = line_start + close;
            let quote_len = quote.len_utf8();
            let mut text = String::with_capacity(token.len());
            text.push_str(token.get(..open)?);
            text.push_str(token.get(open + quote_len..close)?);
            text.push_str(token.get(close + quote_len..)?);
            return Some(text);
        }
        line_start += line.len();
    }
    return None;
}
