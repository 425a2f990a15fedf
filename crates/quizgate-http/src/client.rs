//! HTTP client for the quiz API.

use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use quizgate_core::{ApiUrl, Error, InvalidInputError, ProtocolError, Result, TransportError};

use crate::config::ClientConfig;
use crate::endpoints::ErrorResponse;

/// A request that can be sent, and resent, as-is.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("request body: {}", e),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Unauthenticated HTTP client bound to one API base URL.
///
/// Bearer tokens are passed per call; the client holds no credential.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: ApiUrl,
}

impl ApiClient {
    /// Build a client from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| TransportError::Http {
            message: format!("failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    /// Returns the API base URL this client is configured for.
    pub fn api_url(&self) -> &ApiUrl {
        &self.api_url
    }

    /// Send `request`, with `bearer` as the Authorization token if given.
    ///
    /// Non-success statuses are returned as [`Error::Protocol`] carrying the
    /// server's `detail` message.
    #[instrument(skip(self, request, bearer), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Response> {
        let url = self.api_url.endpoint(&request.path);
        debug!(authenticated = bearer.is_some(), "API request");

        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        trace!(%status, "API response");

        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::Protocol(parse_error_response(response).await))
        }
    }

    /// Send `request` and decode a JSON response body.
    pub async fn call<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<R> {
        let response = self.send(request, bearer).await?;
        decode(response).await
    }

    /// Send `request`, discarding any response body.
    pub async fn call_no_response(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<()> {
        self.send(request, bearer).await.map(drop)
    }
}

/// Decode a JSON response body.
pub(crate) async fn decode<R: DeserializeOwned>(response: Response) -> Result<R> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        InvalidInputError::Payload {
            message: e.to_string(),
        }
        .into()
    })
}

/// Map a reqwest failure onto the transport taxonomy.
pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        TransportError::Timeout.into()
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
        .into()
    } else if err.is_decode() {
        InvalidInputError::Payload {
            message: err.to_string(),
        }
        .into()
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
        .into()
    }
}

async fn parse_error_response(response: Response) -> ProtocolError {
    let status = response.status().as_u16();

    match response.json::<ErrorResponse>().await {
        Ok(body) => ProtocolError::new(status, body.detail.map(|d| d.into_message())),
        Err(_) => ProtocolError::new(status, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let api = ApiUrl::new("https://quiz.example.com/api").unwrap();
        let client = ApiClient::new(&ClientConfig::new(api.clone())).unwrap();
        assert_eq!(client.api_url(), &api);
    }

    #[test]
    fn request_builder() {
        let request = ApiRequest::post("/auth/login")
            .json(&serde_json::json!({"email": "ada@example.com"}))
            .unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/auth/login");
        assert!(request.body.is_some());
        assert!(ApiRequest::get("/auth/me").body.is_none());
    }
}
