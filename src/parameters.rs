//! Directive normalization: raw `key: value` text into `ReferenceParameters`.

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::error::Error;
use crate::line_identifier::resolve_line_identifier;
use crate::types::ReferenceParameters;

/// Keys naming the file, in lookup order.
const FILE_KEYS: [&str; 4] = ["filePath", "file", "path", "link"];

/// Keys naming the language, in lookup order.
const LANGUAGE_KEYS: [&str; 2] = ["language", "lang"];

/// Parse a directive into reference parameters.
///
/// The text is first patched so a YAML decoder accepts the informal forms
/// people write (`file:notes.md`, bare `[[Wiki Links]]`), then decoded.
///
/// # Errors
///
/// Returns `Error::ParseFailure` if the text does not decode into a mapping,
/// `Error::NoFileSpecified` if no file key carries a value,
/// or `Error::InvalidRegex` if a `/.../` boundary does not compile.
///
/// # Panics
///
/// Panics if a hardcoded normalization regex is invalid (compile-time invariant).
pub fn parse_reference_parameters(source: &str) -> Result<ReferenceParameters, Error> {
    let normalized = normalize_directive_text(source);
    let mapping = decode_directive_mapping(&normalized)?;

    let file_path = first_locator(&mapping)?.ok_or(Error::NoFileSpecified)?;

    let language = match first_present_value(&mapping, &LANGUAGE_KEYS)? {
        Some(language) => language,
        None => infer_language(&file_path),
    };

    let start = resolve_line_identifier(scalar_text(&mapping, "start")?.as_deref())?;
    let end = resolve_line_identifier(scalar_text(&mapping, "end")?.as_deref())?;

    tracing::debug!(%file_path, %language, has_start = start.is_some(), has_end = end.is_some(), "parsed directive");

    return Ok(ReferenceParameters {
        end,
        file_path,
        language,
        start,
    });
}

/// Language implied by a locator: the text after its last `.`, or the whole
/// locator when there is none. Wiki-link brackets are ignored.
pub fn infer_language(file_path: &str) -> String {
    let inner = strip_wiki_link(file_path);
    return match inner.rsplit_once('.') {
        Some((_, extension)) => extension.to_string(),
        None => inner.to_string(),
    };
}

/// Drop one pair of `[[` `]]` brackets wrapping the whole locator.
pub fn strip_wiki_link(locator: &str) -> &str {
    return locator
        .strip_prefix("[[")
        .and_then(|rest| return rest.strip_suffix("]]"))
        .unwrap_or(locator);
}

/// Textual fixes applied before decoding.
///
/// Adds the missing space in a first line written `key:value`, and quotes every
/// `[[...]]` token that is not already quoted so the decoder
/// reads it as a string instead of a nested sequence.
fn normalize_directive_text(source: &str) -> String {
    let first_key = Regex::new(r"^([^:\n]+):([^\s])").expect("valid regex");
    let spaced = first_key.replacen(source, 1, "$1: $2");
    return quote_bare_wiki_links(&spaced);
}

/// Wrap unquoted `[[...]]` tokens in double quotes. Tokens touching a double
/// quote on either side, or a single quote on both sides, are left alone.
fn quote_bare_wiki_links(text: &str) -> String {
    let wiki_link = Regex::new(r"\[\[(.*?)\]\]").expect("valid regex");
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for found in wiki_link.find_iter(text) {
        let before = text.get(..found.start()).unwrap_or("");
        let after = text.get(found.end()..).unwrap_or("");
        let double_quoted = before.ends_with('"') || after.starts_with('"');
        let single_quoted = before.ends_with('\'') && after.starts_with('\'');
        if double_quoted || single_quoted {
            continue;
        }
        out.push_str(text.get(last..found.start()).unwrap_or(""));
        out.push('"');
        out.push_str(found.as_str());
        out.push('"');
        last = found.end();
    }

    out.push_str(text.get(last..).unwrap_or(""));
    return out;
}

/// Decode normalized text and insist on a mapping.
///
/// A YAML decoder hands back plain text as a string scalar, which is how
/// "this was not a directive" shows up; that and an empty document both fail.
///
/// # Errors
///
/// Returns `Error::ParseFailure` for decode errors and for any non-mapping document.
fn decode_directive_mapping(text: &str) -> Result<Mapping, Error> {
    let document: Value = serde_yaml::from_str(text).map_err(|e| {
        return Error::ParseFailure { reason: e.to_string() };
    })?;

    return match document {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Err(Error::ParseFailure {
            reason: "directive is empty".to_string(),
        }),
        Value::String(_) => Err(Error::ParseFailure {
            reason: "directive is plain text, expected `key: value` lines".to_string(),
        }),
        other => Err(Error::ParseFailure {
            reason: format!("expected `key: value` lines, found {}", describe_value(&other)),
        }),
    };
}

/// The first file key whose value is neither null nor empty text.
///
/// # Errors
///
/// Returns `Error::ParseFailure` if that value is a sequence or mapping.
fn first_locator(mapping: &Mapping) -> Result<Option<String>, Error> {
    for key in FILE_KEYS {
        if let Some(text) = scalar_text(mapping, key)?
            && !text.is_empty()
        {
            return Ok(Some(text));
        }
    }
    return Ok(None);
}

/// The first key in `keys` whose value is not null. Empty text counts as present.
///
/// # Errors
///
/// Returns `Error::ParseFailure` if that value is a sequence or mapping.
fn first_present_value(mapping: &Mapping, keys: &[&str]) -> Result<Option<String>, Error> {
    for key in keys {
        if let Some(text) = scalar_text(mapping, key)? {
            return Ok(Some(text));
        }
    }
    return Ok(None);
}

/// Text form of a scalar value. Null and missing keys are both `None`.
///
/// # Errors
///
/// Returns `Error::ParseFailure` if the value is a sequence or mapping.
fn scalar_text(mapping: &Mapping, key: &str) -> Result<Option<String>, Error> {
    let Some(value) = mapping.get(key) else {
        return Ok(None);
    };
    return value_text(value).map_err(|found| {
        return Error::ParseFailure {
            reason: format!("`{key}` must be a single value, found {found}"),
        };
    });
}

/// Coerce a scalar to text; the error carries a description of what was found instead.
fn value_text(value: &Value) -> Result<Option<String>, &'static str> {
    return match value {
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Mapping(_) | Value::Sequence(_) => Err(describe_value(value)),
        Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Tagged(tagged) => value_text(&tagged.value),
    };
}

/// Short noun for a YAML value kind, used in messages.
fn describe_value(value: &Value) -> &'static str {
    return match value {
        Value::Bool(_) => "a boolean",
        Value::Mapping(_) => "a mapping",
        Value::Null => "nothing",
        Value::Number(_) => "a number",
        Value::Sequence(_) => "a list",
        Value::String(_) => "text",
        Value::Tagged(_) => "a tagged value",
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::LineIdentifier;

    #[test]
    fn parses_plain_directive() {
        let params = parse_reference_parameters("filePath: notes.md\nstart: 3\nend: \"END\"").unwrap();
        assert_eq!(
            params,
            ReferenceParameters {
                end: Some(LineIdentifier::Text("END".to_string())),
                file_path: "notes.md".to_string(),
                language: "md".to_string(),
                start: Some(LineIdentifier::Line(3)),
            }
        );
    }

    #[test]
    fn tolerates_missing_space_and_bare_wiki_link() {
        let params = parse_reference_parameters("file:[[My Note]]").unwrap();
        assert_eq!(params.file_path, "[[My Note]]");
        assert_eq!(params.language, "My Note");
        assert_eq!(params.start, None);
        assert_eq!(params.end, None);
    }

    #[test]
    fn canonical_and_informal_forms_agree() {
        let informal = parse_reference_parameters("file:[[src/lib.rs]]\nstart: 2\nend: /^}/\n").unwrap();
        let canonical = parse_reference_parameters("file: \"[[src/lib.rs]]\"\nstart: 2\nend: /^}/\n").unwrap();
        assert_eq!(informal, canonical);
        assert_eq!(canonical.language, "rs");
    }

    #[test]
    fn already_quoted_link_is_left_alone() {
        assert_eq!(
            normalize_directive_text("file: \"[[a.rs]]\""),
            "file: \"[[a.rs]]\""
        );
        assert_eq!(normalize_directive_text("file: [[a.rs]]"), "file: \"[[a.rs]]\"");
    }

    #[test]
    fn single_quoted_link_is_left_alone() {
        assert_eq!(normalize_directive_text("file: '[[a.rs]]'"), "file: '[[a.rs]]'");
        let params = parse_reference_parameters("file: '[[a.rs]]'").unwrap();
        assert_eq!(params.file_path, "[[a.rs]]");
        assert_eq!(params.language, "rs");
    }

    #[test]
    fn quoted_boundary_keeps_inner_quotes() {
        let params = parse_reference_parameters("file: a.py\nend: |-\n  'print(\"x\")'\n").unwrap();
        assert_eq!(params.end, Some(LineIdentifier::Text("print(\"x\")".to_string())));
        let params = parse_reference_parameters("file: a.py\nstart: \"'say \\\"hi\\\"'\"").unwrap();
        assert_eq!(params.start, Some(LineIdentifier::Text("say \"hi\"".to_string())));
    }

    #[test]
    fn empty_language_is_kept() {
        let params = parse_reference_parameters("file: a.rs\nlang: \"\"").unwrap();
        assert_eq!(params.language, "");
        let params = parse_reference_parameters("file: a.rs\nlanguage: ''\nlang: go").unwrap();
        assert_eq!(params.language, "");
    }

    #[test]
    fn file_keys_checked_in_order() {
        let params = parse_reference_parameters("link: d.go\npath: c.py\nfile: b.ts\n").unwrap();
        assert_eq!(params.file_path, "b.ts");
        let params = parse_reference_parameters("link: d.go\npath: c.py\nfile: b.ts\nfilePath: a.rs").unwrap();
        assert_eq!(params.file_path, "a.rs");
        let params = parse_reference_parameters("link: https://github.com/o/r/blob/main/x.rs").unwrap();
        assert_eq!(params.file_path, "https://github.com/o/r/blob/main/x.rs");
    }

    #[test]
    fn null_file_key_falls_through() {
        let params = parse_reference_parameters("file:\npath: lib.rs").unwrap();
        assert_eq!(params.file_path, "lib.rs");
    }

    #[test]
    fn explicit_language_wins() {
        let params = parse_reference_parameters("file: build\nlang: makefile").unwrap();
        assert_eq!(params.language, "makefile");
        let params = parse_reference_parameters("file: a.txt\nlanguage: rust\nlang: go").unwrap();
        assert_eq!(params.language, "rust");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = parse_reference_parameters("language: rust\nstart: 1").unwrap_err();
        assert!(matches!(err, Error::NoFileSpecified));
        let err = parse_reference_parameters("file: \"\"").unwrap_err();
        assert!(matches!(err, Error::NoFileSpecified));
        let params = parse_reference_parameters("file: ''\nlink: x.rs").unwrap();
        assert_eq!(params.file_path, "x.rs");
    }

    #[test]
    fn plain_text_is_a_parse_failure() {
        let err = parse_reference_parameters("just some words").unwrap_err();
        assert!(matches!(err, Error::ParseFailure { .. }));
    }

    #[test]
    fn empty_directive_is_a_parse_failure() {
        assert!(matches!(parse_reference_parameters("").unwrap_err(), Error::ParseFailure { .. }));
        assert!(matches!(parse_reference_parameters("~").unwrap_err(), Error::ParseFailure { .. }));
    }

    #[test]
    fn broken_yaml_is_a_parse_failure() {
        let err = parse_reference_parameters("file: a.rs\nstart: [1, 2").unwrap_err();
        assert!(matches!(err, Error::ParseFailure { .. }));
    }

    #[test]
    fn list_valued_file_is_a_parse_failure() {
        let err = parse_reference_parameters("file: [a.rs, b.rs]").unwrap_err();
        assert!(matches!(err, Error::ParseFailure { ref reason } if reason.contains("`file`")));
    }

    #[test]
    fn bad_regex_boundary_is_an_error() {
        let err = parse_reference_parameters("file: a.rs\nstart: /^fn ([/").unwrap_err();
        assert!(matches!(err, Error::InvalidRegex { .. }));
    }

    #[test]
    fn numeric_and_quoted_boundaries_share_rules() {
        let params = parse_reference_parameters("file: a.rs\nstart: 12\nend: '\"12\"'").unwrap();
        assert_eq!(params.start, Some(LineIdentifier::Line(12)));
        assert_eq!(params.end, Some(LineIdentifier::Text("12".to_string())));
        let params = parse_reference_parameters("file: a.rs\nstart: \"12\"").unwrap();
        assert_eq!(params.start, Some(LineIdentifier::Line(12)));
    }

    #[test]
    fn non_string_scalars_become_text() {
        let params = parse_reference_parameters("file: a.rs\nstart: true\nend: 2.5").unwrap();
        assert_eq!(params.start, Some(LineIdentifier::Text("true".to_string())));
        assert_eq!(params.end, Some(LineIdentifier::Text("2.5".to_string())));
    }

    #[test]
    fn infers_language_from_last_extension() {
        assert_eq!(infer_language("src/main.rs"), "rs");
        assert_eq!(infer_language("[[archive.tar.gz]]"), "gz");
        assert_eq!(infer_language("Makefile"), "Makefile");
        assert_eq!(infer_language("trailing."), "");
    }
}
