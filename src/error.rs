use thiserror::Error;

/// Fatal conditions of a drift aggregation pass.
///
/// Every variant aborts the run; there is no per-frame recovery.
#[derive(Debug, Error, PartialEq)]
pub enum DriftError {
    #[error("exposure {exposure}: header keyword {keyword}: {reason}")]
    Header {
        exposure: String,
        keyword: String,
        reason: String,
    },

    #[error("exposure {exposure}: cannot parse observation time '{value}'")]
    TimestampParse { exposure: String, value: String },

    #[error("cannot summarize an empty result table")]
    EmptyTable,

    #[error("no exposures were supplied")]
    NoInput,
}

impl DriftError {
    pub fn missing_keyword(exposure: &str, keyword: &str) -> Self {
        DriftError::Header {
            exposure: exposure.to_string(),
            keyword: keyword.to_string(),
            reason: "missing".to_string(),
        }
    }

    pub fn malformed_keyword(exposure: &str, keyword: &str, reason: impl Into<String>) -> Self {
        DriftError::Header {
            exposure: exposure.to_string(),
            keyword: keyword.to_string(),
            reason: reason.into(),
        }
    }

    /// Short name of the error kind, used when reporting a failed run.
    pub fn kind(&self) -> &'static str {
        match self {
            DriftError::Header { .. } => "HeaderError",
            DriftError::TimestampParse { .. } => "TimestampParseError",
            DriftError::EmptyTable => "EmptyTableError",
            DriftError::NoInput => "NoInputError",
        }
    }

    /// Identifier of the exposure that caused the failure, if any.
    pub fn exposure(&self) -> Option<&str> {
        match self {
            DriftError::Header { exposure, .. } | DriftError::TimestampParse { exposure, .. } => {
                Some(exposure)
            }
            DriftError::EmptyTable | DriftError::NoInput => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_error_message_names_exposure() {
        let err = DriftError::missing_keyword("Light_M42_0001", "DATE-OBS");
        assert_eq!(
            err.to_string(),
            "exposure Light_M42_0001: header keyword DATE-OBS: missing"
        );
        assert_eq!(err.kind(), "HeaderError");
        assert_eq!(err.exposure(), Some("Light_M42_0001"));
    }

    #[test]
    fn test_kinds_without_exposure() {
        assert_eq!(DriftError::NoInput.kind(), "NoInputError");
        assert_eq!(DriftError::EmptyTable.kind(), "EmptyTableError");
        assert_eq!(DriftError::NoInput.exposure(), None);
    }

    #[test]
    fn test_timestamp_error_message() {
        let err = DriftError::TimestampParse {
            exposure: "frame_3".to_string(),
            value: "yesterday".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "exposure frame_3: cannot parse observation time 'yesterday'"
        );
    }
}
