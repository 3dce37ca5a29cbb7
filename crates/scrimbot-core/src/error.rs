// Typed failures raised by the scheduling-service collaborators.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Machine-readable failure kind. `code()` is stable and safe to log or match
/// on; `description()` is what an interactive requester gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // HTTP status families reported by the scheduling service
    NoContent,
    BadRequest,
    Unauthorized,
    Forbidden,
    EndpointNotFound,
    Timeout,
    TooManyRequests,
    Unavailable,
    Failed,
    // Transport and decoding
    Network,
    Decode,
    // Domain lookups and mutations
    ScrimNotFound,
    NoOutgoingRequest,
    InvalidTeam,
    InvalidPlayer,
    TeamNotFound,
    InvalidFormat,
    InvalidTime,
    Unknown,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NoContent => "NoContent",
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::EndpointNotFound => "EndpointNotFound",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::TooManyRequests => "TooManyRequests",
            ErrorKind::Unavailable => "Unavailable",
            ErrorKind::Failed => "Failed",
            ErrorKind::Network => "Network",
            ErrorKind::Decode => "Decode",
            ErrorKind::ScrimNotFound => "ScrimNotFound",
            ErrorKind::NoOutgoingRequest => "NoOutgoingRequest",
            ErrorKind::InvalidTeam => "InvalidTeam",
            ErrorKind::InvalidPlayer => "InvalidPlayer",
            ErrorKind::TeamNotFound => "TeamNotFound",
            ErrorKind::InvalidFormat => "InvalidFormat",
            ErrorKind::InvalidTime => "InvalidTime",
            ErrorKind::Unknown => "Unknown",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::NoContent => {
                "No content was found for the given url or the bearer was missing (204 No Content)"
            }
            ErrorKind::BadRequest => "Request format was invalid (400 Bad Request)",
            ErrorKind::Unauthorized => "Authorization was invalid or expired (401 Unauthorized)",
            ErrorKind::Forbidden => {
                "The action was forbidden but authorization succeeded (403 Forbidden)"
            }
            ErrorKind::EndpointNotFound => "The endpoint for the url was not found (404 Not Found)",
            ErrorKind::Timeout => "Request took too long to process (408 Request Timeout)",
            ErrorKind::TooManyRequests => {
                "Too many requests were made in quick succession (429 Too Many Requests)"
            }
            ErrorKind::Unavailable => "The scheduling service is down at the moment (5xx)",
            ErrorKind::Failed => "The request did not meet its success condition",
            ErrorKind::Network => "Could not reach the scheduling service",
            ErrorKind::Decode => "The scheduling service returned a response that could not be read",
            ErrorKind::ScrimNotFound => {
                "No scrim matching the given time and format was found to act on"
            }
            ErrorKind::NoOutgoingRequest => {
                "The given team has no open scrim request at that time, so no request can be sent"
            }
            ErrorKind::InvalidTeam => "Team stats need a team number or name",
            ErrorKind::InvalidPlayer => "Player stats need a puuid",
            ErrorKind::TeamNotFound => "No team was found with the given name",
            ErrorKind::InvalidFormat => "Scrim format is invalid",
            ErrorKind::InvalidTime => "Scrim time is invalid",
            ErrorKind::Unknown => "No clue what went wrong",
        }
    }

    /// Map a non-success HTTP status to its kind. Returns `None` for 200/201.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200 | 201 => None,
            204 => Some(ErrorKind::NoContent),
            400 => Some(ErrorKind::BadRequest),
            401 => Some(ErrorKind::Unauthorized),
            403 => Some(ErrorKind::Forbidden),
            404 => Some(ErrorKind::EndpointNotFound),
            408 => Some(ErrorKind::Timeout),
            429 => Some(ErrorKind::TooManyRequests),
            500..=504 => Some(ErrorKind::Unavailable),
            _ => Some(ErrorKind::Failed),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure from the scheduling service or from validating a request to it.
/// `fields` carries free-form context (url, time, format, status) for logs.
#[derive(Debug, Error)]
#[error("{kind}: {} | fields=[{fields}]", .kind.description())]
pub struct ScrimError {
    pub kind: ErrorKind,
    pub fields: String,
    #[source]
    pub source: Option<BoxError>,
}

impl ScrimError {
    pub fn new(kind: ErrorKind, fields: impl Into<String>) -> Self {
        Self {
            kind,
            fields: fields.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn not_found(fields: impl Into<String>) -> Self {
        Self::new(ErrorKind::ScrimNotFound, fields)
    }

    pub fn status(status: u16, fields: impl Into<String>) -> Option<Self> {
        let fields = fields.into();
        ErrorKind::from_status(status).map(|kind| Self::new(kind, format!("{fields}, status={status}")))
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::ScrimNotFound
    }

    /// The text shown to an interactive requester.
    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}
