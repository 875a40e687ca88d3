//! Conversions from external infrastructure errors into domain errors.

use auspex_domain::AuspexError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AuspexError);

impl From<InfraError> for AuspexError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AuspexError> for InfraError {
    fn from(value: AuspexError) -> Self {
        InfraError(value)
    }
}

trait IntoAuspexError {
    fn into_auspex(self) -> AuspexError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → AuspexError */
/* -------------------------------------------------------------------------- */

impl IntoAuspexError for SqlError {
    fn into_auspex(self) -> AuspexError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => AuspexError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        AuspexError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        AuspexError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        AuspexError::Database("foreign key constraint violation".into())
                    }
                    _ => AuspexError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => AuspexError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                AuspexError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                AuspexError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidPath(path) => AuspexError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => AuspexError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_auspex())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → AuspexError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(AuspexError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AuspexError */
/* -------------------------------------------------------------------------- */

impl IntoAuspexError for HttpError {
    fn into_auspex(self) -> AuspexError {
        if self.is_timeout() {
            return AuspexError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AuspexError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return AuspexError::Remote {
                status: code,
                message: status.canonical_reason().unwrap_or("unknown status").to_string(),
            };
        }

        if self.is_decode() {
            return AuspexError::InvalidInput(format!("malformed response body: {self}"));
        }

        AuspexError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_auspex())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: AuspexError = InfraError::from(err).into();
        match mapped {
            AuspexError::Database(msg) => assert!(msg.contains("busy")),
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[test]
    fn foreign_key_violation_is_named() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::ConstraintViolation, extended_code: 787 },
            None,
        );

        let mapped: AuspexError = InfraError::from(err).into();
        assert_eq!(mapped, AuspexError::Database("foreign key constraint violation".into()));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let mapped: AuspexError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(mapped, AuspexError::NotFound(_)));
    }

    #[tokio::test]
    async fn http_status_maps_to_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::FORBIDDEN))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: AuspexError = InfraError::from(error).into();
        match mapped {
            AuspexError::Remote { status, .. } => assert_eq!(status, 403),
            other => panic!("expected remote error, got {other:?}"),
        }
    }
}
