//! HTTP connector to the Transgate proof tool.
//!
//! The tool is an external process; this client talks to its local bridge
//! endpoint. `GET /available` probes for the tool, `POST /launch` runs the
//! handshake and blocks until the tool returns an attestation or the user
//! cancels inside it. Signature validation is local, via
//! [`zkredeem_core::verify`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use zkredeem_core::{verify, AttestationResult, ChainFamily};

use crate::connector::{ConnectorError, ProofConnector};

pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:18545";

#[derive(Debug, Deserialize)]
struct AvailableResponse {
    available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LaunchRequest<'a> {
    app_id: &'a str,
    schema_id: &'a str,
    recipient: &'a str,
}

/// Error body the bridge returns on a failed or cancelled handshake.
#[derive(Debug, Deserialize)]
struct BridgeError {
    message: String,
    #[serde(default)]
    code: i64,
}

pub struct TransgateBridge {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
}

impl TransgateBridge {
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            app_id: app_id.into(),
        }
    }
}

#[async_trait]
impl ProofConnector for TransgateBridge {
    async fn is_available(&self) -> Result<bool, ConnectorError> {
        let url = format!("{}/available", self.base_url);
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            // An unreachable bridge means the tool is not installed.
            Err(e) if e.is_connect() => {
                debug!("transgate bridge unreachable: {e}");
                return Ok(false);
            }
            Err(e) => return Err(ConnectorError::Transport(e.to_string())),
        };

        if !response.status().is_success() {
            return Err(ConnectorError::Transport(format!(
                "availability probe returned {}",
                response.status()
            )));
        }

        let body: AvailableResponse = response
            .json()
            .await
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;
        Ok(body.available)
    }

    async fn launch(
        &self,
        schema_id: &str,
        recipient: &str,
    ) -> Result<AttestationResult, ConnectorError> {
        let url = format!("{}/launch", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LaunchRequest {
                app_id: &self.app_id,
                schema_id,
                recipient,
            })
            .send()
            .await
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let err: BridgeError = response
                .json()
                .await
                .map_err(|e| ConnectorError::Transport(e.to_string()))?;
            return Err(ConnectorError::Tool {
                message: err.message,
                code: err.code,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ConnectorError::Transport(e.to_string()))
    }

    fn verify_signature(
        &self,
        chain: ChainFamily,
        schema_id: &str,
        result: &AttestationResult,
    ) -> bool {
        verify::verify_attestation(chain, schema_id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_request_uses_sdk_wire_names() {
        let req = LaunchRequest {
            app_id: "app",
            schema_id: "schema",
            recipient: "0xabc",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["appId"], "app");
        assert_eq!(json["schemaId"], "schema");
        assert_eq!(json["recipient"], "0xabc");
    }

    #[test]
    fn bridge_error_defaults_missing_code() {
        let err: BridgeError = serde_json::from_str(r#"{"message":"cancelled"}"#).unwrap();
        assert_eq!(err.message, "cancelled");
        assert_eq!(err.code, 0);
    }

    #[tokio::test]
    async fn availability_probe_reports_http_failures() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf).await;
            let body = "bridge exploded";
            let response = format!(
                "HTTP/1.1 500 Internal Server Error\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = sock.write_all(response.as_bytes()).await;
        });

        let bridge = TransgateBridge::new(format!("http://{addr}"), "app");
        let err = bridge.is_available().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Transport(_)));
        assert!(err.to_string().contains("500"));
    }
}
