//! Request handler module
//!
//! Routes requests to the HTML form handlers and the JSON conversion API.

pub mod api;
pub mod body;
pub mod page;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
