//! REST implementation of [`RemoteStore`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::bundle::Bundle;
use super::remote::{AuthToken, DocumentMeta, Grant, RemoteError, RemoteStore, SharedDocument};

pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(server_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn document_url(&self, id: &str) -> String {
        self.url(&format!("/v1/documents/{}", urlencoding::encode(id)))
    }

    async fn send(&self, request: RequestBuilder, token: &AuthToken) -> Result<Response, RemoteError> {
        let response = request.bearer_auth(token.as_str()).send().await?;
        check(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &AuthToken,
    ) -> Result<T, RemoteError> {
        let response = self.send(request, token).await?;
        let value: Value = response.json().await?;
        serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// GET that maps 404 to `None`.
    async fn get_optional(&self, url: String, token: &AuthToken) -> Result<Option<Value>, RemoteError> {
        let response = self.client.get(url).bearer_auth(token.as_str()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response).await?;
        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn read_bundle(&self, token: &AuthToken) -> Result<Option<Value>, RemoteError> {
        self.get_optional(self.url("/v1/bundle"), token).await
    }

    async fn write_bundle(&self, token: &AuthToken, bundle: &Bundle) -> Result<(), RemoteError> {
        tracing::debug!("PUT bundle {}", bundle.updated_at);
        self.send(self.client.put(self.url("/v1/bundle")).json(bundle), token)
            .await?;
        Ok(())
    }

    async fn create_shared(
        &self,
        token: &AuthToken,
        document: &SharedDocument,
    ) -> Result<String, RemoteError> {
        let created: Value = self
            .send_json(self.client.post(self.url("/v1/documents")).json(document), token)
            .await?;
        created["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RemoteError::Decode("missing document id".to_string()))
    }

    async fn list_owned(&self, token: &AuthToken) -> Result<Vec<DocumentMeta>, RemoteError> {
        self.send_json(self.client.get(self.url("/v1/documents")), token)
            .await
    }

    async fn list_shared_with_me(&self, token: &AuthToken) -> Result<Vec<DocumentMeta>, RemoteError> {
        self.send_json(self.client.get(self.url("/v1/documents/shared")), token)
            .await
    }

    async fn read_shared(&self, token: &AuthToken, id: &str) -> Result<Option<Value>, RemoteError> {
        self.get_optional(self.document_url(id), token).await
    }

    async fn grant_access(&self, token: &AuthToken, id: &str, email: &str) -> Result<(), RemoteError> {
        let body = json!({"email": email, "role": "reader"});
        let url = format!("{}/grants", self.document_url(id));
        self.send(self.client.post(url).json(&body), token).await?;
        Ok(())
    }

    async fn revoke_access(&self, token: &AuthToken, id: &str, grant_id: &str) -> Result<(), RemoteError> {
        let url = format!(
            "{}/grants/{}",
            self.document_url(id),
            urlencoding::encode(grant_id)
        );
        self.send(self.client.delete(url), token).await?;
        Ok(())
    }

    async fn list_access(&self, token: &AuthToken, id: &str) -> Result<Vec<Grant>, RemoteError> {
        let url = format!("{}/grants", self.document_url(id));
        let grants: Vec<Grant> = self.send_json(self.client.get(url), token).await?;
        Ok(grants.into_iter().filter(|g| g.role != "owner").collect())
    }

    async fn delete_document(&self, token: &AuthToken, id: &str) -> Result<(), RemoteError> {
        self.send(self.client.delete(self.document_url(id)), token)
            .await?;
        Ok(())
    }
}

/// Turns a non-success response into [`RemoteError::Status`].
async fn check(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    Err(RemoteError::Status {
        status: status.as_u16(),
        message: error_message(status.as_u16(), &body),
    })
}

fn error_message(status: u16, body: &Value) -> String {
    body.pointer("/error/message")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Remote API {}", status))
}

/// Accepts bare hosts and websocket URLs; always yields `http(s)://host`
/// without a trailing slash.
fn normalize_base_url(server_url: &str) -> String {
    let url = server_url.trim().trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        format!("http://{}", url)
    } else {
        url.to_string()
    }
}
