//! Request body collection
//!
//! Reads a whole request body while enforcing the configured size limit,
//! both from the declared `Content-Length` and from the bytes received.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_LENGTH;
use hyper::HeaderMap;

use crate::logger;

/// Client-facing message when the request body cannot be read
pub const BODY_READ_MESSAGE: &str = "Falha ao ler o corpo da requisição";

/// Why a body could not be read
#[derive(Debug)]
pub enum BodyError {
    TooLarge,
    Read(String),
}

/// Collect `body` into memory, rejecting anything over `max_body_size`
pub async fn read_body<B>(
    headers: &HeaderMap,
    body: B,
    max_body_size: u64,
) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(size) = declared_length(headers) {
        if size > max_body_size {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            return Err(BodyError::TooLarge);
        }
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
            Err(BodyError::TooLarge)
        }
        Err(e) => Err(BodyError::Read(e.to_string())),
    }
}

/// Parsed `Content-Length`, if present and valid
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_LENGTH)?;
    match value.to_str().ok().and_then(|s| s.trim().parse::<u64>().ok()) {
        Some(size) => Some(size),
        None => {
            logger::log_warning("Invalid Content-Length value, skipping size check");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::header::HeaderValue;

    #[tokio::test]
    async fn test_reads_small_body() {
        let body = Full::new(Bytes::from_static(b"hello"));
        let bytes = read_body(&HeaderMap::new(), body, 16).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_rejects_declared_oversize() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("1024"));
        let body = Full::new(Bytes::from_static(b"x"));
        assert!(matches!(
            read_body(&headers, body, 16).await,
            Err(BodyError::TooLarge)
        ));
    }

    #[tokio::test]
    async fn test_rejects_actual_oversize() {
        let body = Full::new(Bytes::from(vec![b'x'; 32]));
        assert!(matches!(
            read_body(&HeaderMap::new(), body, 16).await,
            Err(BodyError::TooLarge)
        ));
    }

    #[test]
    fn test_declared_length_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("abc"));
        assert_eq!(declared_length(&headers), None);
    }
}
