//! Interfaces layer - adapters that expose the application

pub mod http;
