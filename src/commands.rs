use std::io::Read as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error;
use crate::external::{UreqClient, resolve_external_metadata};
use crate::parameters::parse_reference_parameters;
use crate::reference::{is_external_locator, local_reference, remote_reference};
use crate::types::{External, Reference, ReferenceParameters};

// ── CLI commands ──────────────────────────────────────────────────────

/// Parse a directive and print its normalized parameters.
///
/// # Errors
///
/// Returns errors from reading the input or parsing the directive.
pub fn cmd_parse(input: Option<&Path>, json: bool) -> Result<(), error::Error> {
    let directive = read_directive(input)?;
    let params = parse_reference_parameters(&directive)?;

    if json {
        return print_json(&params);
    }
    print_parameters(&params);
    return Ok(());
}

/// Parse a directive and resolve it into a reference: excerpted from disk for
/// local files, enriched with site metadata for remote ones.
///
/// # Errors
///
/// Returns errors from config loading, parsing, file reading, or metadata lookup.
pub fn cmd_resolve(input: Option<&Path>, json: bool) -> Result<(), error::Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let directive = read_directive(input)?;
    let params = parse_reference_parameters(&directive)?;

    let reference = if is_external_locator(&params.file_path) {
        let client = UreqClient::new(config.timeout, &config.user_agent);
        remote_reference(&params, &config.store_dir, &client)?
    } else {
        local_reference(&config.root, &params)?
    };

    if json {
        return print_json(&reference);
    }
    print_reference(&reference);
    return Ok(());
}

/// Look up metadata for a remote URL directly.
///
/// # Errors
///
/// Returns errors from config loading or the metadata lookup.
pub fn cmd_info(url: &str, json: bool) -> Result<(), error::Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let client = UreqClient::new(config.timeout, &config.user_agent);

    let reference = Reference {
        code: String::new(),
        external: Some(External::new(String::new(), url)),
        language: String::new(),
        path: url.to_string(),
        start_line: 1,
    };
    let metadata = resolve_external_metadata(&reference, &client)?;

    if json {
        return print_json(&metadata);
    }
    let site = reference.external.as_ref().map_or("", |external| return external.website.identifier());
    println!("site:       {site}");
    print_field("title", metadata.title.as_deref());
    print_field("raw url", metadata.raw_url.as_deref());
    print_field("display", metadata.display_url.as_deref());
    print_field("author", metadata.author.as_deref());
    print_field("repository", metadata.repository.as_deref());
    print_field("path", metadata.path.as_deref());
    if let Some(ref_info) = &metadata.ref_info {
        println!("ref:        {} {} ({})", ref_info.ref_type, ref_info.ref_name, ref_info.hash);
    }
    return Ok(());
}

// ── Input ─────────────────────────────────────────────────────────────

/// Read directive text from a file, or from stdin for `None` and `-`.
///
/// # Errors
///
/// Returns `Error::FileNotFound` for a missing file or `Error::Io` for other read failures.
fn read_directive(input: Option<&Path>) -> Result<String, error::Error> {
    return match input {
        Some(path) if path != Path::new("-") => match std::fs::read_to_string(path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(error::Error::FileNotFound {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(error::Error::Io(e)),
        },
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        },
    };
}

// ── Output ────────────────────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T) -> Result<(), error::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    return Ok(());
}

fn print_parameters(params: &ReferenceParameters) {
    println!("file:       {}", params.file_path);
    println!("language:   {}", params.language);
    if let Some(start) = &params.start {
        println!("start:      {start}");
    }
    if let Some(end) = &params.end {
        println!("end:        {end}");
    }
}

fn print_reference(reference: &Reference) {
    println!("path:       {}", reference.path);
    println!("language:   {}", reference.language);
    println!("start line: {}", reference.start_line);

    if let Some(external) = &reference.external {
        println!("site:       {}", external.website.identifier());
        print_field("title", Some(external.info.title.as_str()));
        print_field("raw url", Some(external.info.raw_url.as_str()));
        print_field("author", external.info.author.as_deref());
        print_field("repository", external.info.repository.as_deref());
        return;
    }

    println!();
    println!("{}", reference.code);
}

/// Print a labelled value; empty and missing values read as unresolved.
fn print_field(label: &str, value: Option<&str>) {
    let shown = value.filter(|v| return !v.is_empty()).unwrap_or("(unresolved)");
    println!("{:<11} {shown}", format!("{label}:"));
}
