//! Error classification shared by engine and service errors.
//!
//! Outer layers branch on [`ErrorKind`] instead of matching every concrete
//! variant. Codes are stable API; do not rename them.

/// Coarse failure class of a catalog operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced category or course does not exist.
    NotFound,
    /// The request is well-formed but semantically invalid.
    InvalidOperation,
    /// The capability gate refused the actor.
    PermissionDenied,
    /// A category ran out of course sort keys inside its gap.
    CapacityExceeded,
    /// A computed sort key does not fit in `i64`.
    KeyOverflow,
    /// Transaction or I/O failure.
    Storage,
}

impl ErrorKind {
    /// Machine-readable `UPPER_SNAKE_CASE` code.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidOperation => "INVALID_OPERATION",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::CapacityExceeded => "GAP_CAPACITY_EXCEEDED",
            Self::KeyOverflow => "SORT_KEY_OVERFLOW",
            Self::Storage => "STORAGE_ERROR",
        }
    }

    /// HTTP status an API layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidOperation => 400,
            Self::PermissionDenied => 403,
            Self::CapacityExceeded | Self::KeyOverflow | Self::Storage => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;

    #[test]
    fn maps_kinds_to_codes_and_statuses() {
        let table = [
            (ErrorKind::NotFound, "NOT_FOUND", 404),
            (ErrorKind::InvalidOperation, "INVALID_OPERATION", 400),
            (ErrorKind::PermissionDenied, "PERMISSION_DENIED", 403),
            (ErrorKind::CapacityExceeded, "GAP_CAPACITY_EXCEEDED", 500),
            (ErrorKind::KeyOverflow, "SORT_KEY_OVERFLOW", 500),
            (ErrorKind::Storage, "STORAGE_ERROR", 500),
        ];
        for (kind, code, status) in table {
            assert_eq!(kind.code(), code);
            assert_eq!(kind.http_status(), status);
        }
    }
}
