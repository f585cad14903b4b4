//! HTML form handlers
//!
//! `GET /` renders the blank form; `POST /` converts the submitted fields
//! and re-renders the page with either the result or an inline error.
//! Validation failures never change the status code.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::body::BODY_READ_MESSAGE;
use crate::config::AppState;
use crate::converter::{ConversionRequest, ConversionResult, ConvertError};
use crate::http;
use crate::logger;
use crate::render::PageView;

pub const FORM_TYPE_FIELD: &str = "selectTemp";
pub const FORM_VALUE_FIELD: &str = "valorRef";

/// Submitted form fields; unknown fields are ignored
#[derive(Debug, Default)]
struct ConversionForm {
    select_temp: Option<String>,
    valor_ref: Option<String>,
}

impl ConversionForm {
    /// Decode an urlencoded body; the first occurrence of a repeated field wins
    fn parse(body: &[u8]) -> Self {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body).unwrap_or_else(|e| {
            logger::log_warning(&format!("Malformed form body: {e}"));
            Vec::new()
        });

        let mut form = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                FORM_TYPE_FIELD => &mut form.select_temp,
                FORM_VALUE_FIELD => &mut form.valor_ref,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        form
    }
}

/// Render the empty conversion form
pub fn serve_form(state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    render_page(
        state,
        StatusCode::OK,
        &PageView::new(&state.registry, &state.hostname),
        is_head,
    )
}

/// Handle a form-encoded conversion submission
pub fn handle_form_submit(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    let form = ConversionForm::parse(body);
    let type_id = form.select_temp.as_deref().unwrap_or_default();
    let raw_value = form.valor_ref.as_deref().unwrap_or_default();

    let view = PageView::new(&state.registry, &state.hostname).with_input(type_id, raw_value);
    let view = match convert_form(state, &form) {
        Ok(outcome) => view.with_result(&outcome),
        Err(e) => {
            logger::log_info(&format!("[Form] Rejected conversion: {e}"));
            view.with_error(&e)
        }
    };

    render_page(state, StatusCode::OK, &view, false)
}

/// Re-render the form with a 400 when the submitted body could not be read
pub fn handle_unreadable_body(state: &AppState) -> Response<Full<Bytes>> {
    let view = PageView::new(&state.registry, &state.hostname).with_error(&BODY_READ_MESSAGE);
    render_page(state, StatusCode::BAD_REQUEST, &view, false)
}

fn convert_form(
    state: &AppState,
    form: &ConversionForm,
) -> Result<ConversionResult, ConvertError> {
    let request = ConversionRequest::from_text(
        form.select_temp.as_deref(),
        form.valor_ref.as_deref(),
        (FORM_TYPE_FIELD, FORM_VALUE_FIELD),
    )?;
    let outcome = state.registry.convert(&request.conversion_type, request.value)?;
    logger::log_conversion(&request.conversion_type, request.value, outcome.result, outcome.unit);
    Ok(outcome)
}

fn render_page(
    state: &AppState,
    status: StatusCode,
    view: &PageView<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    match state.renderer.render(view) {
        Ok(html) => http::build_html_response(status, html, is_head),
        Err(e) => {
            logger::log_error(&format!("Failed to render page: {e}"));
            http::build_500_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;

    fn test_state() -> AppState {
        let mut cfg = Config::from_defaults().unwrap();
        cfg.app.hostname = Some("test-host".to_string());
        AppState::new(&cfg).unwrap()
    }

    async fn body_text(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_serve_form() {
        let state = test_state();
        let resp = serve_form(&state, false);
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Conversor"));
        assert!(html.contains("test-host"));
    }

    #[tokio::test]
    async fn test_valid_submission() {
        let state = test_state();
        let resp = handle_form_submit(&state, b"selectTemp=1&valorRef=1000");
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("1.0 quilômetros"));
        assert!(!html.contains("class=\"erro\""));
    }

    #[tokio::test]
    async fn test_invalid_value_rerenders_with_error() {
        let state = test_state();
        let resp = handle_form_submit(&state, b"selectTemp=1&valorRef=abc");
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("<html"));
        assert!(html.contains("class=\"erro\""));
        assert!(html.contains("value=\"abc\""));
    }

    #[tokio::test]
    async fn test_missing_and_unknown_fields() {
        let state = test_state();
        let html = body_text(handle_form_submit(&state, b"")).await;
        assert!(html.contains("selectTemp"));
        assert!(html.contains("class=\"erro\""));

        let html = body_text(handle_form_submit(&state, b"selectTemp=99&valorRef=5")).await;
        assert!(html.contains("class=\"erro\""));
        assert!(!html.contains("class=\"resultado\""));
    }

    #[tokio::test]
    async fn test_overflowing_result_shows_inline_error() {
        let state = test_state();
        let resp = handle_form_submit(&state, b"selectTemp=4&valorRef=1e306");
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("class=\"erro\""));
        assert!(!html.contains("class=\"resultado\""));
        assert!(!html.contains("inf metros"));
    }

    #[test]
    fn test_repeated_field_keeps_first_value() {
        let form = ConversionForm::parse(b"selectTemp=1&selectTemp=2&valorRef=5&extra=x");
        assert_eq!(form.select_temp.as_deref(), Some("1"));
        assert_eq!(form.valor_ref.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_repeated_field_is_not_reported_missing() {
        let state = test_state();
        let html = body_text(handle_form_submit(&state, b"selectTemp=1&selectTemp=2&valorRef=5")).await;
        assert!(!html.contains("class=\"erro\""));
        assert!(html.contains("0.005 quilômetros"));
    }

    #[tokio::test]
    async fn test_url_encoded_value() {
        let state = test_state();
        let html = body_text(handle_form_submit(&state, b"selectTemp=2&valorRef=+0.5+")).await;
        assert!(html.contains("500.0 metros"));
    }
}
