//! JSON conversion API
//!
//! `POST /convert-api` with `{"conversion_type": "1", "value": 1000}`.
//! Success is `{"success": true, "result": 1.0, "unit": "quilômetros"}`;
//! every client error is a 400 with an `error` message.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::AppState;
use crate::converter::{ConversionRequest, ConversionResult};
use crate::http;
use crate::logger;

pub const API_PATH: &str = "/convert-api";

const INVALID_JSON_MESSAGE: &str = "Corpo da requisição deve ser um JSON válido";

#[derive(Debug, Serialize)]
struct ConversionResponse {
    success: bool,
    #[serde(flatten)]
    outcome: ConversionResult,
}

/// Handle a JSON conversion request body
pub fn handle_convert(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    let payload: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            logger::log_info(&format!("[API] Invalid JSON body: {e}"));
            return http::build_json_error(StatusCode::BAD_REQUEST, INVALID_JSON_MESSAGE);
        }
    };

    let outcome = ConversionRequest::from_json(&payload).and_then(|request| {
        let outcome = state.registry.convert(&request.conversion_type, request.value)?;
        logger::log_conversion(&request.conversion_type, request.value, outcome.result, outcome.unit);
        Ok(outcome)
    });

    match outcome {
        Ok(outcome) => http::build_json_response(
            StatusCode::OK,
            &ConversionResponse {
                success: true,
                outcome,
            },
        ),
        Err(e) => {
            logger::log_info(&format!("[API] Rejected conversion: {e}"));
            http::build_json_error(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}
