//! enhance-service: relays prompt enhancement requests to Gemini while
//! keeping the API key on the server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
