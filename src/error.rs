use thiserror::Error;

/// Everything that can go wrong between fetching the sheet and handing over the report.
///
/// Selections that name values missing from the dataset are not errors; the filters
/// simply match nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwiftError {
    /// The dataset lacks a column one of the projections needs.
    #[error("Dataset is missing column: {column}")]
    Schema { column: String },

    /// The sheet could not be opened, downloaded or parsed. Fatal for the session.
    #[error("Data source unavailable: {0} (reload to retry)")]
    SourceUnavailable(String),

    /// Writing or encoding the report failed. The user may retry with another target.
    #[error("Report delivery failed: {0}")]
    Delivery(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Session snapshot error: {0}")]
    Snapshot(String),
}

impl SwiftError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        SwiftError::Schema {
            column: column.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SwiftError>;

#[cfg(feature = "web")]
mod web {
    use super::SwiftError;
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use serde_json::json;

    impl IntoResponse for SwiftError {
        fn into_response(self) -> Response {
            let status = match &self {
                SwiftError::Schema { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SwiftError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                SwiftError::Delivery(_) => {
                    tracing::error!("Report delivery failed: {}", self);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                SwiftError::Config(_) | SwiftError::Snapshot(_) => StatusCode::BAD_REQUEST,
            };

            let body = Json(json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            }));

            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_the_column() {
        let err = SwiftError::missing_column("Mitigation_Id");
        assert_eq!(err.to_string(), "Dataset is missing column: Mitigation_Id");
    }

    #[test]
    fn source_error_mentions_reload() {
        let err = SwiftError::SourceUnavailable("connection refused".to_string());
        assert!(err.to_string().contains("reload"));
    }
}
