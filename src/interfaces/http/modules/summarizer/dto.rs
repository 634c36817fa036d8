//! Summarizer DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "githubUrl": "https://github.com/rust-lang/rust" }))]
pub struct SummarizeRequest {
    #[serde(rename = "githubUrl", alias = "github_url", default)]
    #[validate(length(max = 2048, message = "GitHub URL is too long"))]
    pub github_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RepositorySummary {
    pub summary: String,
    /// The URL as submitted
    pub repository: String,
    pub owner: String,
    pub repo: String,
    pub analyzed_at: String,
    /// Name of the key that authorized the request
    pub requested_by: String,
}
