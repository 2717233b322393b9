use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where the user can
/// act on it, how to fix it.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::ParseFailure { reason } => render_parse_failure(reason),
        Error::NoFileSpecified => render_no_file_specified(),
        Error::InvalidRegex { pattern, reason } => render_invalid_regex(pattern, reason),
        Error::ExternalResolution { url, cause } => render_external_resolution(url, cause),
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.

## Fix

Locators are resolved against `root` in `.coderef.toml` (default: the current directory).
", path.display()),

        Error::Http { url, reason } => format!("\
# Error: Request Failed

`{url}`: {reason}
"),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_parse_failure(reason: &str) -> String {
    format!("\
# Error: Parse Failure

The directive is not a block of `key: value` lines: {reason}

## Fix

Write one setting per line, for example:

    file: src/lib.rs
    start: 10
    end: \"}}\"
")
}

fn render_no_file_specified() -> String {
    "\
# Error: No File Specified

The directive names no file.

## Fix

Add one of `filePath`, `file`, `path` or `link`:

    file: src/lib.rs
"
    .to_string()
}

fn render_invalid_regex(pattern: &str, reason: &str) -> String {
    format!("\
# Error: Invalid Regular Expression

`/{pattern}/` does not compile:

{reason}

## Fix

Escape the pattern, or quote the boundary to match it as plain text:

    start: \"{pattern}\"
")
}

fn render_external_resolution(url: &str, cause: &str) -> String {
    format!("\
# Error: External Reference Failed

Metadata for `{url}` could not be fetched.

{cause}

The directive itself is valid; only the remote lookup failed.
")
}
