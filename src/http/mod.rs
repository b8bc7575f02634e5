//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! filesystem dispatch logic.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_error_response, build_file_response, build_html_response, build_options_response,
    build_405_response,
};
