//! Reference assembly: turn parsed parameters into a located excerpt.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::external::{HttpClient, resolve_external_metadata};
use crate::parameters::strip_wiki_link;
use crate::types::{External, LineIdentifier, Reference, ReferenceParameters};

/// Whether a locator points at a remote file rather than the local store.
pub fn is_external_locator(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    return lower.starts_with("http://") || lower.starts_with("https://");
}

/// Cut the excerpt described by `params` out of `source`.
///
/// A start matcher that finds nothing falls back to the first line; an end
/// matcher that finds nothing falls back to the last. Content matchers for the
/// end are only tried on lines after the start line. The resulting range is not
/// checked for being non-empty.
pub fn extract_excerpt(params: &ReferenceParameters, path: &str, source: &str) -> Reference {
    let lines: Vec<&str> = source.lines().collect();
    let start = start_index(params.start.as_ref(), &lines);
    let end = end_index(params.end.as_ref(), &lines, start);

    let code = lines
        .get(start..end)
        .map(|excerpt| return excerpt.join("\n"))
        .unwrap_or_default();

    return Reference {
        code,
        external: None,
        language: params.language.clone(),
        path: path.to_string(),
        start_line: start.saturating_add(1),
    };
}

/// Zero-based index of the first excerpt line.
fn start_index(matcher: Option<&LineIdentifier>, lines: &[&str]) -> usize {
    return match matcher {
        None => 0,
        Some(LineIdentifier::Line(n)) => n.saturating_sub(1),
        Some(content) => lines.iter().position(|line| return content.matches_line(line)).unwrap_or(0),
    };
}

/// Zero-based exclusive index one past the last excerpt line.
fn end_index(matcher: Option<&LineIdentifier>, lines: &[&str], start: usize) -> usize {
    return match matcher {
        None => lines.len(),
        Some(LineIdentifier::Line(n)) => (*n).min(lines.len()),
        Some(content) => lines
            .iter()
            .enumerate()
            .skip(start.saturating_add(1))
            .find(|(_, line)| return content.matches_line(line))
            .map_or(lines.len(), |(index, _)| return index.saturating_add(1)),
    };
}

/// Read a local file named by `params` under `root` and excerpt it.
///
/// Wiki-link brackets are dropped from the locator; a bracketed name with no
/// extension that does not exist as written is retried with `.md`.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the file does not exist, or `Error::Io`
/// for any other read failure.
pub fn local_reference(root: &Path, params: &ReferenceParameters) -> Result<Reference, Error> {
    let path = local_path(root, &params.file_path);
    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound { path });
        },
        Err(e) => return Err(Error::Io(e)),
    };

    tracing::debug!(path = %path.display(), lines = source.lines().count(), "read local reference");
    return Ok(extract_excerpt(params, &path.to_string_lossy(), &source));
}

/// Disk location for a local locator.
fn local_path(root: &Path, locator: &str) -> PathBuf {
    let inner = strip_wiki_link(locator);
    let path = root.join(inner);
    let is_wiki_link = inner.len() != locator.len();
    if is_wiki_link && path.extension().is_none() && !path.exists() {
        return root.join(format!("{inner}.md"));
    }
    return path;
}

/// Build a remote reference and enrich it with site metadata.
///
/// File contents are not downloaded; the excerpt text stays empty.
///
/// # Errors
///
/// Returns `Error::ExternalResolution` if the site lookup fails.
pub fn remote_reference(
    params: &ReferenceParameters,
    store_dir: &Path,
    client: &impl HttpClient,
) -> Result<Reference, Error> {
    let url = params.file_path.trim();
    let store_path = store_dir.join(store_file_name(url)).to_string_lossy().into_owned();

    let mut reference = Reference {
        code: String::new(),
        external: Some(External::new(store_path, url)),
        language: params.language.clone(),
        path: url.to_string(),
        start_line: 1,
    };

    let metadata = resolve_external_metadata(&reference, client)?;
    if let Some(external) = reference.external.as_mut() {
        external.info.merge(metadata);
    }
    return Ok(reference);
}

/// Flat file name for a URL: scheme and query dropped, separators replaced.
fn store_file_name(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| return rest);
    let without_query = without_scheme.split(['?', '#']).next().unwrap_or(without_scheme);
    return without_query
        .trim_end_matches('/')
        .chars()
        .map(|c| return if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use pretty_assertions::assert_eq;
    use regex::Regex;

    use super::*;
    use crate::parameters::parse_reference_parameters;

    const SOURCE: &str = "use std::io;\n\nfn main() {\n    run();\n}\n\nfn run() {\n    println!(\"hi\");\n}\n";

    fn params(start: Option<LineIdentifier>, end: Option<LineIdentifier>) -> ReferenceParameters {
        return ReferenceParameters {
            end,
            file_path: "main.rs".to_string(),
            language: "rs".to_string(),
            start,
        };
    }

    #[test]
    fn no_boundaries_take_whole_file() {
        let reference = extract_excerpt(&params(None, None), "main.rs", SOURCE);
        assert_eq!(reference.start_line, 1);
        assert_eq!(reference.code, SOURCE.trim_end());
    }

    #[test]
    fn line_numbers_are_inclusive() {
        let reference = extract_excerpt(
            &params(Some(LineIdentifier::Line(3)), Some(LineIdentifier::Line(5))),
            "main.rs",
            SOURCE,
        );
        assert_eq!(reference.start_line, 3);
        assert_eq!(reference.code, "fn main() {\n    run();\n}");
    }

    #[test]
    fn text_and_pattern_boundaries() {
        let reference = extract_excerpt(
            &params(
                Some(LineIdentifier::Text("fn run".to_string())),
                Some(LineIdentifier::Pattern(Regex::new("^}").unwrap())),
            ),
            "main.rs",
            SOURCE,
        );
        assert_eq!(reference.start_line, 7);
        assert_eq!(reference.code, "fn run() {\n    println!(\"hi\");\n}");
    }

    #[test]
    fn end_match_skips_the_start_line() {
        let reference = extract_excerpt(
            &params(
                Some(LineIdentifier::Text("fn".to_string())),
                Some(LineIdentifier::Text("fn".to_string())),
            ),
            "main.rs",
            SOURCE,
        );
        assert_eq!(reference.start_line, 3);
        assert_eq!(reference.code.lines().last(), Some("fn run() {"));
    }

    #[test]
    fn unmatched_boundaries_fall_back_to_file_edges() {
        let reference = extract_excerpt(
            &params(
                Some(LineIdentifier::Text("nowhere".to_string())),
                Some(LineIdentifier::Text("nothing".to_string())),
            ),
            "main.rs",
            SOURCE,
        );
        assert_eq!(reference.start_line, 1);
        assert_eq!(reference.code, SOURCE.trim_end());
    }

    #[test]
    fn inverted_range_is_empty_not_an_error() {
        let reference = extract_excerpt(
            &params(Some(LineIdentifier::Line(6)), Some(LineIdentifier::Line(2))),
            "main.rs",
            SOURCE,
        );
        assert_eq!(reference.start_line, 6);
        assert_eq!(reference.code, "");
    }

    #[test]
    fn line_zero_means_first_line() {
        let reference = extract_excerpt(&params(Some(LineIdentifier::Line(0)), Some(LineIdentifier::Line(1))), "main.rs", SOURCE);
        assert_eq!(reference.start_line, 1);
        assert_eq!(reference.code, "use std::io;");
    }

    #[test]
    fn recognizes_remote_locators() {
        assert!(is_external_locator("https://github.com/o/r/blob/main/a.rs"));
        assert!(is_external_locator("HTTP://example.org/a.rs"));
        assert!(!is_external_locator("src/lib.rs"));
        assert!(!is_external_locator("[[https notes]]"));
    }

    #[test]
    fn reads_local_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), SOURCE).unwrap();

        let params = parse_reference_parameters("file: main.rs\nstart: 3\nend: 5").unwrap();
        let reference = local_reference(dir.path(), &params).unwrap();
        assert_eq!(reference.code, "fn main() {\n    run();\n}");
        assert!(reference.path.ends_with("main.rs"));
    }

    #[test]
    fn wiki_link_without_extension_finds_markdown_note() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("My Note.md"), "# Title\nbody\n").unwrap();

        let params = parse_reference_parameters("file:[[My Note]]\nstart: 2").unwrap();
        let reference = local_reference(dir.path(), &params).unwrap();
        assert_eq!(reference.code, "body");
        assert_eq!(reference.language, "My Note");
    }

    #[test]
    fn missing_local_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let params = parse_reference_parameters("file: absent.rs").unwrap();
        let err = local_reference(dir.path(), &params).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn store_names_are_flat() {
        assert_eq!(
            store_file_name("https://gitlab.com/o/r/-/blob/main/a.rs?ref=x"),
            "gitlab.com_o_r_-_blob_main_a.rs"
        );
    }
}
