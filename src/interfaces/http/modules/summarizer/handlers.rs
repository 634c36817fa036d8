//! Summarizer handler
//!
//! Requires a valid `x-api-key` (see `api_key_middleware`).

use axum::{http::StatusCode, Extension, Json};
use chrono::Utc;
use tracing::info;

use super::dto::{RepositorySummary, SummarizeRequest};
use crate::interfaces::http::common::{error_response, ApiResponse, ErrorResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedKey;

const GITHUB_HOSTS: [&str; 2] = ["github.com/", "www.github.com/"];

/// Split `https://github.com/<owner>/<repo>[/...]` into owner and repo
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    let rest = url
        .trim()
        .strip_prefix("https://")
        .or_else(|| url.trim().strip_prefix("http://"))?;
    let path = GITHUB_HOSTS.iter().find_map(|host| rest.strip_prefix(host))?;

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    let valid = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if !valid(owner) || !valid(repo) {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}

/// Summarize a GitHub repository
#[utoipa::path(
    post,
    path = "/api/v1/github-summarizer",
    tag = "Summarizer",
    security(("api_key" = [])),
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Repository summary", body = ApiResponse<RepositorySummary>),
        (status = 400, description = "Missing API key, missing or unsupported GitHub URL"),
        (status = 401, description = "Invalid API key"),
        (status = 500, description = "Error validating API key")
    )
)]
pub async fn summarize_repository(
    Extension(AuthenticatedKey(key)): Extension<AuthenticatedKey>,
    ValidatedJson(request): ValidatedJson<SummarizeRequest>,
) -> Result<Json<ApiResponse<RepositorySummary>>, ErrorResponse> {
    let Some(url) = request.github_url.filter(|u| !u.trim().is_empty()) else {
        return Err(error_response(StatusCode::BAD_REQUEST, "GitHub URL is required"));
    };

    let Some((owner, repo)) = parse_github_url(&url) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "GitHub URL must look like https://github.com/<owner>/<repo>",
        ));
    };

    info!(key_id = %key.id, owner = %owner, repo = %repo, "Summary requested");

    // TODO: fetch the repository README through the GitHub API and summarize it
    Ok(Json(ApiResponse::success(RepositorySummary {
        summary: format!("No summary is available yet for {}/{}", owner, repo),
        repository: url.trim().to_string(),
        owner,
        repo,
        analyzed_at: Utc::now().to_rfc3339(),
        requested_by: key.name,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_repo_url() {
        assert_eq!(
            parse_github_url("https://github.com/tokio-rs/axum"),
            Some(("tokio-rs".to_string(), "axum".to_string()))
        );
    }

    #[test]
    fn test_parse_variants() {
        let expected = Some(("rust-lang".to_string(), "rust".to_string()));
        assert_eq!(parse_github_url("https://github.com/rust-lang/rust.git"), expected);
        assert_eq!(parse_github_url(" https://www.github.com/rust-lang/rust/tree/master "), expected);
        assert_eq!(parse_github_url("http://github.com/rust-lang/rust/"), expected);
    }

    #[test]
    fn test_parse_rejects_other_urls() {
        assert_eq!(parse_github_url("https://gitlab.com/a/b"), None);
        assert_eq!(parse_github_url("https://github.com/only-owner"), None);
        assert_eq!(parse_github_url("github.com/a/b"), None);
        assert_eq!(parse_github_url("https://github.com/a b/c"), None);
    }
}
