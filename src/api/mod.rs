//! HTTP access to the retrieval backend

pub mod client;
pub mod types;

pub use client::{ensure_streamable, RagClient};
pub use types::ChatRequest;
