//! Request handler module
//!
//! Routing and the demo endpoints served by `toolbox-server`.

mod endpoints;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
