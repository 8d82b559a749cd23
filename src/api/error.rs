//! kDrive API error codes.

/// kDrive API error codes, as carried in the `error.code` field of an
/// error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// The addressed file or directory does not exist
    ObjectNotFound,
    /// The target of a move or upload is not a directory
    DestinationNotADirectory,
    /// A node with the same name already exists at the destination
    DestinationAlreadyExists,
    /// Token missing, expired or revoked
    NotAuthorized,
    /// Token valid but lacks rights on the drive
    Forbidden,
    /// Request parameters were rejected
    ValidationFailed,
    /// Rate limited
    TooManyRequests,
    /// Node is locked by another operation
    Locked,
    /// Drive storage exhausted
    QuotaExceeded,
    /// Unknown error
    Unknown,
}

impl From<&str> for ApiErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "object_not_found" | "file_not_found" => ApiErrorCode::ObjectNotFound,
            "destination_not_a_directory" => ApiErrorCode::DestinationNotADirectory,
            "destination_already_exists" | "conflict_error" => {
                ApiErrorCode::DestinationAlreadyExists
            }
            "not_authorized" | "unauthorized" => ApiErrorCode::NotAuthorized,
            "forbidden" | "forbidden_error" | "access_denied" => ApiErrorCode::Forbidden,
            "validation_failed" | "invalid_parameter" => ApiErrorCode::ValidationFailed,
            "too_many_requests" => ApiErrorCode::TooManyRequests,
            "lock_error" | "locked" => ApiErrorCode::Locked,
            "quota_exceeded_error" | "not_enough_space" => ApiErrorCode::QuotaExceeded,
            _ => ApiErrorCode::Unknown,
        }
    }
}

impl ApiErrorCode {
    /// Get human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorCode::ObjectNotFound => "Object not found",
            ApiErrorCode::DestinationNotADirectory => "Destination not a valid directory",
            ApiErrorCode::DestinationAlreadyExists => "Destination already exists",
            ApiErrorCode::NotAuthorized => "Not authorized",
            ApiErrorCode::Forbidden => "Access denied",
            ApiErrorCode::ValidationFailed => "Invalid arguments",
            ApiErrorCode::TooManyRequests => "Rate limit exceeded",
            ApiErrorCode::Locked => "Resource locked",
            ApiErrorCode::QuotaExceeded => "Over quota",
            ApiErrorCode::Unknown => "Unknown error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(
            ApiErrorCode::from("object_not_found"),
            ApiErrorCode::ObjectNotFound
        );
        assert_eq!(
            ApiErrorCode::from("destination_not_a_directory"),
            ApiErrorCode::DestinationNotADirectory
        );
        assert_eq!(
            ApiErrorCode::from("conflict_error"),
            ApiErrorCode::DestinationAlreadyExists
        );
        assert_eq!(ApiErrorCode::from("not_authorized"), ApiErrorCode::NotAuthorized);
        assert_eq!(ApiErrorCode::from("too_many_requests"), ApiErrorCode::TooManyRequests);

        // Unmapped codes fall through
        assert_eq!(ApiErrorCode::from("something_new"), ApiErrorCode::Unknown);
        assert_eq!(ApiErrorCode::from(""), ApiErrorCode::Unknown);
    }

    #[test]
    fn test_error_code_descriptions() {
        assert_eq!(ApiErrorCode::ObjectNotFound.description(), "Object not found");
        assert_eq!(
            ApiErrorCode::DestinationNotADirectory.description(),
            "Destination not a valid directory"
        );
        assert_eq!(ApiErrorCode::QuotaExceeded.description(), "Over quota");
        assert_eq!(ApiErrorCode::Unknown.description(), "Unknown error");
    }
}
