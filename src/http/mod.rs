//! HTTP protocol layer module
//!
//! Response builders shared by the page and API handlers.

pub mod response;

pub use response::{
    build_404_response, build_405_response, build_413_response, build_500_response,
    build_health_response, build_html_response, build_json_error, build_json_response,
    build_options_response,
};
