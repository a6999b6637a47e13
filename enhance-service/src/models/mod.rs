//! Wire models for the enhancement endpoint.

pub mod enhancement;

pub use enhancement::{EnhancementRequest, EnhancementResponse};
