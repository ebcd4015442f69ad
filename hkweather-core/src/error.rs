use thiserror::Error;

/// Problems with the content of an otherwise well-formed HKO response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("Invalid percentage '{0}'")]
    Percentage(String),

    #[error("Invalid {kind} '{value}'")]
    Timestamp { kind: &'static str, value: String },

    #[error("Unknown warning statement code '{0}'")]
    UnknownWarning(String),

    #[error("Missing field '{0}'")]
    Missing(&'static str),

    #[error("No record for station '{0}'")]
    NoStationRecord(String),
}
