//! Shared HTTP building blocks

pub mod response;
pub mod validated_json;

pub use response::{domain_error_response, error_response, ApiResponse, ErrorResponse};
pub use validated_json::ValidatedJson;
