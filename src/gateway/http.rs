//! HTTP gateway: multipart `POST {base_url}/convert`.
//!
//! The request carries two form fields, `file` (the payload with its original
//! filename) and `target_format` (the catalog code). A successful response
//! body is the converted file; a failure body is JSON with a `detail` field.

use super::{ConversionGateway, ConversionRequest, ConvertedFile, GatewayError};
use crate::config::ClientConfig;
use crate::error::TypeShiftError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Failure body returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    /// A string for conversion failures; validation errors send a list.
    detail: Option<serde_json::Value>,
}

/// [`ConversionGateway`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    convert_url: String,
}

impl HttpGateway {
    /// Build a gateway with its own client configured from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TypeShiftError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("typeshift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TypeShiftError::HttpClient(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing client (connection pool, proxies, TLS settings).
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            convert_url: config.convert_url(),
        }
    }

    pub fn convert_url(&self) -> &str {
        &self.convert_url
    }
}

#[async_trait]
impl ConversionGateway for HttpGateway {
    async fn convert(&self, request: ConversionRequest) -> Result<ConvertedFile, GatewayError> {
        info!(
            "POST {} ({} → {}, {} bytes)",
            self.convert_url,
            request.filename,
            request.target_format,
            request.payload.len()
        );

        let len = request.payload.len() as u64;
        let part = Part::stream_with_length(reqwest::Body::from(request.payload), len)
            .file_name(request.filename);
        let form = Form::new()
            .part("file", part)
            .text("target_format", request.target_format);

        let response = self
            .client
            .post(&self.convert_url)
            .multipart(form)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = parse_detail(&body);
            warn!("Service declined conversion: HTTP {} {:?}", status, message);
            return Err(GatewayError::Rejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // The service answered; a broken body is not a connectivity failure.
        let bytes = response.bytes().await.map_err(|e| GatewayError::Rejected {
            status: Some(status.as_u16()),
            message: Some(format!("Failed to read converted file: {e}")),
        })?;

        debug!("Received {} bytes ({:?})", bytes.len(), content_type);
        Ok(ConvertedFile {
            bytes,
            content_type,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Classify an error raised before any response arrived.
///
/// Connect failures, timeouts and aborted sends mean the service never
/// answered. Anything else (e.g. a malformed redirect) means it did.
fn classify_send_error(e: reqwest::Error) -> GatewayError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        debug!("Transport failure: {e}");
        GatewayError::Unreachable {
            reason: e.to_string(),
        }
    } else {
        GatewayError::Rejected {
            status: e.status().map(|s| s.as_u16()),
            message: Some(e.to_string()),
        }
    }
}

/// Extract the `detail` message from a failure body, if it has one.
fn parse_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockito::{Matcher, Server};

    fn gateway_for(url: String) -> HttpGateway {
        let config = ClientConfig::builder()
            .base_url(url)
            .request_timeout_secs(5)
            .connect_timeout_secs(2)
            .build()
            .unwrap();
        HttpGateway::new(&config).unwrap()
    }

    fn request(filename: &str, target: &'static str) -> ConversionRequest {
        ConversionRequest {
            filename: filename.to_string(),
            payload: Bytes::from_static(b"%PDF-1.7 fake"),
            target_format: target,
        }
    }

    #[test]
    fn parse_detail_string() {
        assert_eq!(
            parse_detail(br#"{"detail":"Unsupported conversion: pdf to MP3"}"#).as_deref(),
            Some("Unsupported conversion: pdf to MP3")
        );
    }

    #[test]
    fn parse_detail_list_is_stringified() {
        let msg = parse_detail(br#"{"detail":[{"loc":["body","target_format"],"msg":"field required"}]}"#)
            .unwrap();
        assert!(msg.contains("field required"), "got: {msg}");
    }

    #[test]
    fn parse_detail_missing_or_not_json() {
        assert_eq!(parse_detail(b"{}"), None);
        assert_eq!(parse_detail(br#"{"detail":null}"#), None);
        assert_eq!(parse_detail(b"<html>Bad Gateway</html>"), None);
        assert_eq!(parse_detail(b""), None);
    }

    #[tokio::test]
    async fn posts_multipart_and_returns_bytes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/convert")
            .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="target_format""#.into()),
                Matcher::Regex("DOCX".into()),
                Matcher::Regex(r#"filename="report.pdf""#.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body("converted-docx-bytes")
            .create_async()
            .await;

        let gateway = gateway_for(server.url());
        let out = gateway.convert(request("report.pdf", "DOCX")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(out.bytes.as_ref(), b"converted-docx-bytes");
        assert_eq!(out.content_type.as_deref(), Some("application/octet-stream"));
    }

    #[tokio::test]
    async fn error_status_with_detail_is_rejected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/convert")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Unsupported conversion: png to CSV"}"#)
            .create_async()
            .await;

        let gateway = gateway_for(server.url());
        let err = gateway.convert(request("photo.png", "CSV")).await.unwrap_err();

        mock.assert_async().await;
        assert_eq!(
            err,
            GatewayError::Rejected {
                status: Some(400),
                message: Some("Unsupported conversion: png to CSV".into()),
            }
        );
    }

    #[tokio::test]
    async fn error_status_without_json_has_no_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/convert")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let gateway = gateway_for(server.url());
        let err = gateway.convert(request("a.csv", "XLSX")).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Rejected {
                status: Some(502),
                message: None,
            }
        );
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Reserve a port, then free it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = gateway_for(format!("http://{addr}"));
        let err = gateway.convert(request("photo.png", "JPG")).await.unwrap_err();
        assert!(err.is_unreachable(), "got: {err:?}");
    }

    #[test]
    fn convert_url_from_config() {
        let gateway = gateway_for("http://localhost:9000/".into());
        assert_eq!(gateway.convert_url(), "http://localhost:9000/convert");
        assert_eq!(gateway.name(), "http");
    }
}
