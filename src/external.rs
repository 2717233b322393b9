//! Remote reference metadata: per-site lookup of title, raw URL, owner, and ref.

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::Error;
use crate::types::{ExternalMetadata, RefInfo, Reference, Website};

/// Outbound JSON requests. One call, one request; no retry.
pub trait HttpClient {
    /// GET `url` with `headers` and decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the request fails or the body is not JSON.
    fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<serde_json::Value, Error>;
}

/// Blocking client backed by a `ureq` agent.
pub struct UreqClient {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqClient {
    /// Build a client with a global per-request timeout.
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        return Self {
            agent: ureq::Agent::new_with_config(config),
            user_agent: user_agent.to_string(),
        };
    }
}

impl HttpClient for UreqClient {
    fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<serde_json::Value, Error> {
        let mut request = self.agent.get(url).header("User-Agent", self.user_agent.as_str());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let mut response = request.call().map_err(|e| {
            return Error::Http {
                reason: e.to_string(),
                url: url.to_string(),
            };
        })?;

        return response.body_mut().read_json().map_err(|e| {
            return Error::Http {
                reason: e.to_string(),
                url: url.to_string(),
            };
        });
    }
}

/// Look up descriptive metadata for a remote reference.
///
/// Only GitHub is queried. GitLab, Bitbucket and SourceForge answer with an
/// empty title and raw URL; anything else, including a reference with no
/// external record, answers with an empty title. Those sparse answers are
/// results, not errors.
///
/// # Errors
///
/// Returns `Error::ExternalResolution` if the GitHub request or its response
/// decoding fails.
pub fn resolve_external_metadata(
    reference: &Reference,
    client: &impl HttpClient,
) -> Result<ExternalMetadata, Error> {
    let Some(external) = &reference.external else {
        return Ok(untitled());
    };

    tracing::debug!(site = external.website.identifier(), path = %reference.path, "resolving external metadata");

    return match &external.website {
        Website::Github => resolve_github(&reference.path, client),
        Website::Bitbucket | Website::Gitlab | Website::Sourceforge => Ok(unresolved()),
        Website::Other(_) => Ok(untitled()),
    };
}

/// Stub for a recognized site without a lookup yet.
fn unresolved() -> ExternalMetadata {
    return ExternalMetadata {
        raw_url: Some(String::new()),
        title: Some(String::new()),
        ..ExternalMetadata::default()
    };
}

/// Stub for a site nothing is known about.
fn untitled() -> ExternalMetadata {
    return ExternalMetadata {
        title: Some(String::new()),
        ..ExternalMetadata::default()
    };
}

/// The blob page URL GitHub serves JSON for, given any file URL on the site.
///
/// Drops the query string, turns `/<owner>/<repo>/raw/...` into
/// `/<owner>/<repo>/blob/...`, and maps `raw.githubusercontent.com` links back
/// onto `github.com`.
///
/// # Panics
///
/// Panics if a hardcoded rewrite regex is invalid (compile-time invariant).
pub fn github_display_url(path: &str) -> String {
    let without_query = path.split('?').next().unwrap_or(path);

    let raw_host = Regex::new(r"^(https?://)raw\.githubusercontent\.com/([^/]+)/([^/]+)/").expect("valid regex");
    if raw_host.is_match(without_query) {
        return raw_host.replacen(without_query, 1, "${1}github.com/$2/$3/blob/").into_owned();
    }

    let raw_segment = Regex::new(r"^(https?://(?:www\.)?github\.com/[^/]+/[^/]+)/raw/").expect("valid regex");
    return raw_segment.replacen(without_query, 1, "$1/blob/").into_owned();
}

/// JSON embedded in a GitHub blob page.
#[derive(Deserialize)]
struct GithubBlobPage {
    payload: GithubPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GithubPayload {
    blob: GithubBlob,
    path: String,
    ref_info: GithubRefInfo,
    repo: GithubRepo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GithubBlob {
    display_name: String,
    raw_blob_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GithubRefInfo {
    current_oid: String,
    name: String,
    ref_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GithubRepo {
    name: String,
    owner_login: String,
}

/// Fetch and decode a GitHub blob page.
///
/// # Errors
///
/// Returns `Error::ExternalResolution` wrapping the request or decode failure.
fn resolve_github(path: &str, client: &impl HttpClient) -> Result<ExternalMetadata, Error> {
    let display_url = github_display_url(path);
    tracing::info!(url = %display_url, "requesting github blob metadata");

    let headers = [("Accept", "application/json"), ("Content-Type", "application/json")];
    let page: GithubBlobPage = client
        .get_json(&display_url, &headers)
        .and_then(|body| return serde_json::from_value(body).map_err(Error::from))
        .map_err(|e| {
            return Error::ExternalResolution {
                cause: e.to_string(),
                url: display_url.clone(),
            };
        })?;

    let payload = page.payload;
    return Ok(ExternalMetadata {
        author: Some(payload.repo.owner_login),
        display_url: Some(display_url),
        file_name: Some(payload.blob.display_name.clone()),
        path: Some(payload.path),
        raw_url: Some(payload.blob.raw_blob_url),
        ref_info: Some(RefInfo {
            hash: payload.ref_info.current_oid,
            ref_name: payload.ref_info.name,
            ref_type: payload.ref_info.ref_type,
        }),
        repository: Some(payload.repo.name),
        title: Some(payload.blob.display_name),
    });
}
