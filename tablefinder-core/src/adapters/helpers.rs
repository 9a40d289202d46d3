//! Helper utilities for database adapter implementations.
//!
//! Driver errors are mapped onto [`QueryErrorKind`] here so every adapter
//! reports the same classification for the same underlying condition.

use crate::error::{QueryError, QueryErrorKind};

/// SQL Server error numbers meaning the login lacks permission.
pub const MSSQL_ACCESS_DENIED: &[u32] = &[229, 230];

/// SQL Server error numbers raised when a value cannot be converted.
pub const MSSQL_CONVERSION_FAILED: &[u32] = &[241, 245, 529, 6234, 8114, 8116];

/// MySQL error codes for denied access (`ER_TABLEACCESS_DENIED_ERROR` and friends).
const MYSQL_ACCESS_DENIED: &[&str] = &["1142", "1143", "1044", "1045"];

/// Maps a SQLSTATE (or MySQL error number) to a kind.
///
/// - `42501` insufficient privilege, MySQL `42000` with a privilege error
///   number: access denied
/// - class `22` data exceptions and `42846` (cannot coerce): cast failure
pub fn classify_sqlstate(code: &str) -> QueryErrorKind {
    if code == "42501" || MYSQL_ACCESS_DENIED.contains(&code) {
        QueryErrorKind::AccessDenied
    } else if code.starts_with("22") || code == "42846" {
        QueryErrorKind::TypeCastUnsupported
    } else {
        QueryErrorKind::Other
    }
}

/// Maps a SQL Server error number to a kind.
pub fn classify_mssql_code(code: u32) -> QueryErrorKind {
    if MSSQL_ACCESS_DENIED.contains(&code) {
        QueryErrorKind::AccessDenied
    } else if MSSQL_CONVERSION_FAILED.contains(&code) {
        QueryErrorKind::TypeCastUnsupported
    } else {
        QueryErrorKind::Other
    }
}

/// Converts a sqlx error into a classified [`QueryError`].
#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
pub fn classify_sqlx_error(error: sqlx::Error) -> QueryError {
    let kind = match &error {
        sqlx::Error::Database(db_err) => {
            let mut kind = db_err
                .code()
                .map_or(QueryErrorKind::Other, |code| classify_sqlstate(&code));
            // MySQL reports privilege problems as SQLSTATE 42000
            if kind == QueryErrorKind::Other
                && db_err.code().as_deref() == Some("42000")
                && db_err.message().to_lowercase().contains("denied")
            {
                kind = QueryErrorKind::AccessDenied;
            }
            kind
        }
        sqlx::Error::Io(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::WorkerCrashed => QueryErrorKind::ConnectionLost,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            QueryErrorKind::TypeCastUnsupported
        }
        _ => QueryErrorKind::Other,
    };

    QueryError::new(kind, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sqlstate() {
        assert_eq!(classify_sqlstate("42501"), QueryErrorKind::AccessDenied);
        assert_eq!(classify_sqlstate("1142"), QueryErrorKind::AccessDenied);
        assert_eq!(classify_sqlstate("22P02"), QueryErrorKind::TypeCastUnsupported);
        assert_eq!(classify_sqlstate("22018"), QueryErrorKind::TypeCastUnsupported);
        assert_eq!(classify_sqlstate("42846"), QueryErrorKind::TypeCastUnsupported);
        assert_eq!(classify_sqlstate("42P01"), QueryErrorKind::Other);
    }

    #[test]
    fn test_classify_mssql_code() {
        assert_eq!(classify_mssql_code(229), QueryErrorKind::AccessDenied);
        assert_eq!(classify_mssql_code(230), QueryErrorKind::AccessDenied);
        assert_eq!(classify_mssql_code(245), QueryErrorKind::TypeCastUnsupported);
        assert_eq!(classify_mssql_code(8114), QueryErrorKind::TypeCastUnsupported);
        assert_eq!(classify_mssql_code(208), QueryErrorKind::Other);
    }

    #[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
    #[test]
    fn test_classify_sqlx_pool_errors() {
        assert_eq!(
            classify_sqlx_error(sqlx::Error::PoolTimedOut).kind,
            QueryErrorKind::ConnectionLost
        );
        assert_eq!(
            classify_sqlx_error(sqlx::Error::PoolClosed).kind,
            QueryErrorKind::ConnectionLost
        );
        assert_eq!(
            classify_sqlx_error(sqlx::Error::RowNotFound).kind,
            QueryErrorKind::Other
        );
    }
}
