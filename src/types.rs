/// Core domain types for coderef directives, boundary matchers, and references.
use regex::Regex;
use serde::ser::SerializeMap as _;
use serde::{Serialize, Serializer};

/// Typed boundary matcher for the start or end of an excerpt.
#[derive(Debug, Clone)]
pub enum LineIdentifier {
    /// One-based line number.
    Line(usize),
    /// First line matching this pattern.
    Pattern(Regex),
    /// First line containing this exact text.
    Text(String),
}

impl LineIdentifier {
    /// Whether `line` satisfies a text or pattern matcher. Line numbers never match by content.
    pub fn matches_line(&self, line: &str) -> bool {
        return match self {
            LineIdentifier::Line(_) => false,
            LineIdentifier::Pattern(pattern) => pattern.is_match(line),
            LineIdentifier::Text(text) => line.contains(text.as_str()),
        };
    }
}

impl PartialEq for LineIdentifier {
    /// Patterns compare by their source text; `Regex` has no structural equality.
    fn eq(&self, other: &Self) -> bool {
        return match (self, other) {
            (LineIdentifier::Line(a), LineIdentifier::Line(b)) => a == b,
            (LineIdentifier::Pattern(a), LineIdentifier::Pattern(b)) => a.as_str() == b.as_str(),
            (LineIdentifier::Text(a), LineIdentifier::Text(b)) => a == b,
            _ => false,
        };
    }
}

impl std::fmt::Display for LineIdentifier {
    /// Written back in directive syntax: `12`, `"text"`, `/pattern/`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return match self {
            LineIdentifier::Line(n) => write!(f, "{n}"),
            LineIdentifier::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
            LineIdentifier::Text(text) => write!(f, "\"{text}\""),
        };
    }
}

impl Serialize for LineIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        return match self {
            LineIdentifier::Line(n) => serializer.serialize_u64(u64::try_from(*n).unwrap_or(u64::MAX)),
            LineIdentifier::Pattern(pattern) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("pattern", pattern.as_str())?;
                map.end()
            },
            LineIdentifier::Text(text) => serializer.serialize_str(text),
        };
    }
}

/// Normalized form of one directive. `file_path` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceParameters {
    /// Where the excerpt ends; `None` means the last line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<LineIdentifier>,
    /// Locator exactly as written, wiki-link brackets included.
    pub file_path: String,
    /// Explicit language, or the locator's extension.
    pub language: String,
    /// Where the excerpt starts; `None` means the first line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<LineIdentifier>,
}

/// Hosting sites with known metadata layouts, plus a generic arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Website {
    /// bitbucket.org
    Bitbucket,
    /// github.com and raw.githubusercontent.com
    Github,
    /// gitlab.com
    Gitlab,
    /// Any other host, kept for display.
    Other(String),
    /// sourceforge.net
    Sourceforge,
}

impl Website {
    /// Classify a remote locator by its host. Non-URL input yields `Other("")`.
    pub fn from_url(url: &str) -> Self {
        let without_scheme = url.split_once("://").map_or(url, |(_, rest)| return rest);
        let host = without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or("")
            .rsplit('@')
            .next()
            .unwrap_or("")
            .split(':')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);

        return match host {
            "github.com" | "raw.githubusercontent.com" => Website::Github,
            "gitlab.com" => Website::Gitlab,
            "bitbucket.org" => Website::Bitbucket,
            "sourceforge.net" => Website::Sourceforge,
            other => Website::Other(other.to_string()),
        };
    }

    /// Site identifier used in `ExternalReferenceInfo::site`.
    pub fn identifier(&self) -> &str {
        return match self {
            Website::Bitbucket => "bitbucket",
            Website::Github => "github",
            Website::Gitlab => "gitlab",
            Website::Other(host) => host,
            Website::Sourceforge => "sourceforge",
        };
    }
}

impl Serialize for Website {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        return serializer.serialize_str(self.identifier());
    }
}

/// Branch, tag, or commit a remote file was viewed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefInfo {
    /// Resolved commit id.
    pub hash: String,
    /// Branch or tag name.
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// Kind of ref as reported by the site, e.g. `branch`.
    #[serde(rename = "type")]
    pub ref_type: String,
}

/// Partial metadata returned by the external resolver. Unsupported sites
/// return a sparse value; an empty string means "unresolved", not "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMetadata {
    /// Owner or author login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Page a reader would open in a browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_url: Option<String>,
    /// Last path component of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Path of the file inside its repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Direct download URL of the file contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_url: Option<String>,
    /// Branch, tag or commit the URL points at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_info: Option<RefInfo>,
    /// Repository name without the owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Human-readable title, usually the file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Descriptive metadata attached to a remote reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalReferenceInfo {
    /// Owner or author login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// RFC 3339 time the reference was resolved.
    pub datetime: String,
    /// Page a reader would open in a browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_url: Option<String>,
    /// Last path component of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Path of the file inside its repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Direct download URL of the file contents; empty when unresolved.
    pub raw_url: String,
    /// Branch, tag or commit the URL points at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_info: Option<RefInfo>,
    /// Repository name without the owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Site identifier, such as `github`.
    pub site: String,
    /// Human-readable title; empty when unresolved.
    pub title: String,
    /// Locator as the user wrote it.
    pub url: String,
}

impl ExternalReferenceInfo {
    /// Fold a resolver result in, overwriting only the fields it carries.
    pub fn merge(&mut self, metadata: ExternalMetadata) {
        if let Some(title) = metadata.title {
            self.title = title;
        }
        if let Some(raw_url) = metadata.raw_url {
            self.raw_url = raw_url;
        }
        if metadata.author.is_some() {
            self.author = metadata.author;
        }
        if metadata.display_url.is_some() {
            self.display_url = metadata.display_url;
        }
        if metadata.file_name.is_some() {
            self.file_name = metadata.file_name;
        }
        if metadata.path.is_some() {
            self.path = metadata.path;
        }
        if metadata.ref_info.is_some() {
            self.ref_info = metadata.ref_info;
        }
        if metadata.repository.is_some() {
            self.repository = metadata.repository;
        }
    }
}

/// Remote half of a reference: where it lives and what is known about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct External {
    /// Metadata gathered for the remote file.
    pub info: ExternalReferenceInfo,
    /// Local location a fetched copy would be stored under.
    pub store_path: String,
    /// Hosting site the locator points at.
    pub website: Website,
}

impl External {
    /// Build the external record for a remote locator, stamped with the current time.
    pub fn new(store_path: String, url: &str) -> Self {
        let website = Website::from_url(url);
        let info = ExternalReferenceInfo {
            datetime: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            site: website.identifier().to_string(),
            url: url.to_string(),
            ..ExternalReferenceInfo::default()
        };
        return Self { info, store_path, website };
    }
}

/// A located excerpt, local or remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Excerpt text, lines joined with `\n`. Empty for remote references.
    pub code: String,
    /// Remote record; `None` for files read from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<External>,
    /// Language tag used for highlighting.
    pub language: String,
    /// Resolved file location (local path or remote URL).
    pub path: String,
    /// One-based line number of the first excerpt line.
    pub start_line: usize,
}
