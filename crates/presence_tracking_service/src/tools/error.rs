/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    error_message: String,
    pub error_code: String,
}

#[macros::add_error]
pub enum AppError {
    InvalidRequest(String),
    UnprocessibleRequest(String),
    LargePayloadSize(usize, usize),
    TooManySamples(usize, usize),
    FamilyMismatch(String, String),
    SubjectNotFound(String),
    ExternalAPICallError(String),
    SerializationError(String),
    DeserializationError(String),
    TrackerQueueFull,
    TrackerUnavailable,
    DispatchTimeout,
    RequestTimeout,
}

impl AppError {
    fn error_message(&self) -> ErrorBody {
        ErrorBody {
            error_message: self.message(),
            error_code: self.code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::InvalidRequest(err) => err.to_string(),
            AppError::UnprocessibleRequest(err) => err.to_string(),
            AppError::ExternalAPICallError(err) => err.to_string(),
            AppError::SerializationError(err) => err.to_string(),
            AppError::DeserializationError(err) => err.to_string(),
            AppError::LargePayloadSize(length, limit) => {
                format!("Content length ({length} Bytes) greater than allowed maximum limit : ({limit} Bytes)")
            }
            AppError::TooManySamples(count, limit) => {
                format!("Received {count} samples, at most {limit} are accepted per request")
            }
            AppError::FamilyMismatch(expected, received) => {
                format!("Family mismatch : expected {expected}, received {received}")
            }
            AppError::SubjectNotFound(subject_id) => {
                format!("No presence record for subject : {subject_id}")
            }
            AppError::TrackerQueueFull => "Tracker queue is full, retry later".to_string(),
            AppError::TrackerUnavailable => "Tracker is not running".to_string(),
            AppError::DispatchTimeout => "Alert dispatch timed out".to_string(),
            AppError::RequestTimeout => "Request timed out".to_string(),
        }
    }

    fn code(&self) -> String {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::UnprocessibleRequest(_) => "UNPROCESSIBLE_REQUEST",
            AppError::LargePayloadSize(_, _) => "LARGE_PAYLOAD_SIZE",
            AppError::TooManySamples(_, _) => "TOO_MANY_SAMPLES",
            AppError::FamilyMismatch(_, _) => "FAMILY_MISMATCH",
            AppError::SubjectNotFound(_) => "SUBJECT_NOT_FOUND",
            AppError::ExternalAPICallError(_) => "EXTERNAL_API_CALL_ERROR",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
            AppError::DeserializationError(_) => "DESERIALIZATION_ERROR",
            AppError::TrackerQueueFull => "TRACKER_QUEUE_FULL",
            AppError::TrackerUnavailable => "TRACKER_UNAVAILABLE",
            AppError::DispatchTimeout => "DISPATCH_TIMEOUT",
            AppError::RequestTimeout => "REQUEST_TIMEOUT",
        }
        .to_string()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(self.error_message())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnprocessibleRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LargePayloadSize(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::TooManySamples(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::FamilyMismatch(_, _) => StatusCode::BAD_REQUEST,
            AppError::SubjectNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalAPICallError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DeserializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TrackerQueueFull => StatusCode::TOO_MANY_REQUESTS,
            AppError::TrackerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DispatchTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_screaming_variant_name() {
        assert_eq!(AppError::TrackerQueueFull.to_string(), "TRACKER_QUEUE_FULL");
        assert_eq!(
            AppError::SubjectNotFound("alice".to_string()).to_string(),
            "SUBJECT_NOT_FOUND"
        );
    }

    #[test]
    fn family_mismatch_is_a_bad_request() {
        let err = AppError::FamilyMismatch("f1".to_string(), "f2".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "FAMILY_MISMATCH");
    }
}
