use crate::config::ConfigError;
use crate::metadata::MetadataError;
use crate::registry::CalculatorError;
use crate::service::ServiceError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Metadata(MetadataError),
    Service(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Metadata(err) => write!(f, "metadata error: {}", err),
            AppError::Service(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Metadata(err) => Some(err),
            AppError::Service(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<MetadataError> for AppError {
    fn from(value: MetadataError) -> Self {
        Self::Metadata(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

/// Uniform `{error, message, details}` body shared by every failing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEnvelope {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
    pub details: Value,
}

impl ErrorEnvelope {
    pub fn body(&self) -> Value {
        json!({
            "error": self.kind,
            "message": self.message,
            "details": self.details,
        })
    }
}

impl From<&ServiceError> for ErrorEnvelope {
    fn from(error: &ServiceError) -> Self {
        match error {
            ServiceError::ScoreNotFound { score_id } => ErrorEnvelope {
                status: StatusCode::NOT_FOUND,
                kind: "ScoreNotFound",
                message: error.to_string(),
                details: json!({ "score_id": score_id }),
            },
            ServiceError::CalculatorNotImplemented { score_id } => ErrorEnvelope {
                status: StatusCode::NOT_IMPLEMENTED,
                kind: "CalculatorNotImplemented",
                message: error.to_string(),
                details: json!({ "score_id": score_id }),
            },
            ServiceError::Calculator(inner) => calculator_envelope(inner),
            ServiceError::MalformedBody(reason) => ErrorEnvelope {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                kind: "ValidationError",
                message: "Request body is not a valid JSON object".to_string(),
                details: json!({ "error": reason }),
            },
            ServiceError::Reload(inner) => ErrorEnvelope {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                kind: "ReloadError",
                message: "Error reloading scores".to_string(),
                details: json!({ "error": inner.to_string() }),
            },
        }
    }
}

fn calculator_envelope(error: &CalculatorError) -> ErrorEnvelope {
    match error {
        CalculatorError::NotFound { score_id } => ErrorEnvelope {
            status: StatusCode::NOT_FOUND,
            kind: "ScoreNotFound",
            message: format!("Score '{score_id}' not found"),
            details: json!({ "score_id": score_id }),
        },
        CalculatorError::InvalidParameters { score_id, source } => ErrorEnvelope {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            kind: "ValidationError",
            message: format!("Invalid parameters for {score_id}"),
            details: json!({ "error": source.to_string() }),
        },
        CalculatorError::Validation { score_id, source } => ErrorEnvelope {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            kind: "ValidationError",
            message: format!("Invalid parameters for {score_id}"),
            details: json!({ "violations": source.violations() }),
        },
        CalculatorError::NonFinite { score_id } => ErrorEnvelope {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "CalculationError",
            message: format!("Error calculating {score_id}"),
            details: json!({ "error": error.to_string() }),
        },
        CalculatorError::Serialization { .. } => ErrorEnvelope {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "InternalServerError",
            message: "Internal error in calculation".to_string(),
            details: json!({ "error": error.to_string() }),
        },
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::from(&self);
        (envelope.status, Json(envelope.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn not_found_maps_to_404_envelope() {
        let envelope = ErrorEnvelope::from(&ServiceError::ScoreNotFound {
            score_id: "nope".to_string(),
        });
        assert_eq!(envelope.status, StatusCode::NOT_FOUND);
        let body = envelope.body();
        assert_eq!(body["error"], "ScoreNotFound");
        assert_eq!(body["message"], "Score 'nope' not found");
        assert_eq!(body["details"]["score_id"], "nope");
    }

    #[test]
    fn validation_failures_list_violations() {
        let error = ServiceError::from(CalculatorError::Validation {
            score_id: "curb_65",
            source: ValidationError::single("diastolic_bp", "must not exceed systolic_bp"),
        });
        let envelope = ErrorEnvelope::from(&error);
        assert_eq!(envelope.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(envelope.kind, "ValidationError");
        assert_eq!(
            envelope.details["violations"][0]["field"],
            "diastolic_bp"
        );
    }

    #[test]
    fn non_finite_results_are_calculation_errors() {
        let error = ServiceError::from(CalculatorError::NonFinite { score_id: "rox_index" });
        let envelope = ErrorEnvelope::from(&error);
        assert_eq!(envelope.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.kind, "CalculationError");
    }

    #[test]
    fn not_implemented_maps_to_501() {
        let envelope = ErrorEnvelope::from(&ServiceError::CalculatorNotImplemented {
            score_id: "sofa_score".to_string(),
        });
        assert_eq!(envelope.status, StatusCode::NOT_IMPLEMENTED);
    }
}
