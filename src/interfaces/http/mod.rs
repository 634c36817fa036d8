//! HTTP REST API interfaces
//!
//! - `common`: Response envelope and validated JSON extractor
//! - `middleware`: Admin token and API key authentication
//! - `modules`: Handlers and DTOs per resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiContext, ApiDoc};
