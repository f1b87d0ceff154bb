//! Error type shared by the library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// `set_description` was handed an identity that is not in the sequence.
    #[error("no chunk with from = {from}, to = {to}, and chunk index = {chunk_index}")]
    IdentityNotFound {
        from: String,
        to: String,
        chunk_index: usize,
    },

    #[error("position {position} is out of range for a sequence of {len} chunks")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("no stored diff with id {0}")]
    UnknownId(String),

    #[error("not a pull request URL: {0}")]
    InvalidPullRequestUrl(String),

    #[error("request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A store answered, but with a body that is not a stored diff
    #[error("invalid stored diff: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures of the outside world (network, database, a backend
    /// returning garbage), as opposed to a caller handing the core bad input.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. }
                | Self::Http(_)
                | Self::Sqlite(_)
                | Self::Json(_)
                | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let garbage = serde_json::from_str::<Vec<u32>>("not json").unwrap_err();
        assert!(Error::Json(garbage).is_transport());
        assert!(!Error::UnknownId("x".into()).is_transport());
        assert!(!Error::PositionOutOfRange { position: 3, len: 1 }.is_transport());
        assert!(!Error::InvalidPullRequestUrl("x".into()).is_transport());
    }
}
