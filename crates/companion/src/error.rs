use std::path::PathBuf;

/// Errors raised while serving a request or managing favorites.
#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    #[error("Unknown book: {0}")]
    UnknownBook(String),
    #[error("No text for {book} {chapter}")]
    MissingChapter { book: String, chapter: u8 },
    #[error("Invalid verse range: {0:?}")]
    InvalidRange(String),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_io_errors_name_the_path() {
        let error = CompanionError::Read {
            path: PathBuf::from("data/favorites.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(error.to_string(), "Failed to read data/favorites.json: denied");

        let error = CompanionError::Write {
            path: PathBuf::from("favorites.json"),
            source: io::Error::other("disk full"),
        };
        assert_eq!(error.to_string(), "Failed to write favorites.json: disk full");
    }
}
