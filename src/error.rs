/// Crate-level error types for coderef diagnostics.
use std::path::PathBuf;

/// Every failure a directive or reference can hit. Variants map one-to-one onto
/// the failure kinds a caller has to tell apart: a directive that never parsed is
/// a different problem from a valid directive whose remote metadata could not be fetched.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Metadata lookup for a remote reference failed after the directive itself parsed.
    #[error("could not parse external reference {url}: {cause}")]
    ExternalResolution {
        /// Description of the underlying request or decode failure.
        cause: String,
        /// Display URL the lookup was issued against.
        url: String,
    },

    /// A local file named by a directive does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// An outbound HTTP request failed or returned an unreadable body.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// Description of the transport or body failure.
        reason: String,
        /// URL that was requested.
        url: String,
    },

    /// A `/.../` boundary token did not compile as a regular expression.
    #[error("invalid regular expression `{pattern}`: {reason}")]
    InvalidRegex {
        /// Pattern source between the slashes.
        pattern: String,
        /// Compiler message from the regex engine.
        reason: String,
    },

    /// Underlying I/O error from the filesystem or stdin.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The directive named none of `filePath`, `file`, `path` or `link`.
    #[error("no file specified")]
    NoFileSpecified,

    /// The directive text did not decode into a key/value mapping.
    #[error("parse failure: {reason}")]
    ParseFailure {
        /// Why the decoded document was rejected.
        reason: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
