use thiserror::Error;

///
/// Every failure surfaced by the coordinate store reader, the track readers
/// and the catalog client.
///
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Page {page} is out of range, there are {page_count} pages")]
    OutOfRange { page: usize, page_count: usize },

    #[error("The session has been closed")]
    Closed,

    #[error("No resolution has been set on this session")]
    Unbound,

    #[error("Malformed store layout: {0}")]
    Schema(String),

    #[error("Backing store error: {0}")]
    BackingStore(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    ///
    /// Whether the error is an expected, recoverable condition caused by the
    /// request itself (a 4xx at an HTTP boundary).
    ///
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReaderError::NotFound(_)
                | ReaderError::InvalidArgument(_)
                | ReaderError::OutOfRange { .. }
        )
    }

    pub fn backing_store<E: std::fmt::Display>(err: E) -> Self {
        ReaderError::BackingStore(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(ReaderError::NotFound("region 7".into()), true)]
    #[case(ReaderError::InvalidArgument("empty".into()), true)]
    #[case(ReaderError::OutOfRange { page: 3, page_count: 2 }, true)]
    #[case(ReaderError::Closed, false)]
    #[case(ReaderError::Unbound, false)]
    #[case(ReaderError::BackingStore("truncated".into()), false)]
    fn test_client_errors(#[case] err: ReaderError, #[case] expected: bool) {
        assert_eq!(err.is_client_error(), expected);
    }

    #[rstest]
    fn test_out_of_range_message() {
        let err = ReaderError::OutOfRange {
            page: 4,
            page_count: 2,
        };
        assert_eq!(err.to_string(), "Page 4 is out of range, there are 2 pages");
    }
}
