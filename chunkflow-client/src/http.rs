//! HTTP connection adapters.
//!
//! Both adapters POST `{"messages": [...], "data": ...}` as JSON and stream
//! the response body into fragments. They differ only in body format:
//! [`FetchServerSentEvents`] reads `data:` lines, [`FetchHttpStream`] reads
//! newline-delimited JSON.

use crate::adapter::{ChunkSource, ConnectionAdapter};
use crate::error::ClientError;
use chunkflow_streaming::DecodedStream;
use futures::{stream, Future, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Request options shared by the HTTP adapters.
///
/// ```rust
/// use chunkflow_client::ConnectionOptions;
///
/// let options: ConnectionOptions = serde_json::from_str(
///     r#"{"headers": {"Authorization": "Bearer token"}, "timeout_ms": 30000}"#,
/// ).unwrap();
/// assert_eq!(options.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Extra request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Total request timeout, body included.
    #[serde(default, rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Option<Duration>,
}

impl ConnectionOptions {
    /// Create empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => {
                serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[derive(Serialize)]
struct RequestBody<'a> {
    messages: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

/// A POST endpoint with its client and options.
#[derive(Debug, Clone)]
struct Endpoint {
    client: reqwest::Client,
    url: String,
    options: ConnectionOptions,
}

impl Endpoint {
    fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            options: ConnectionOptions::default(),
        }
    }

    /// Build the request now, send it when polled.
    fn send(
        &self,
        messages: &[Value],
        data: Option<&Value>,
    ) -> impl Future<Output = Result<reqwest::Response, ClientError>> + Send + 'static {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&RequestBody { messages, data });
        for (name, value) in &self.options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = self.options.timeout {
            request = request.timeout(timeout);
        }

        let url = self.url.clone();
        async move {
            tracing::debug!(url = %url, "Sending chat request");
            let response = request.send().await?;

            let status = response.status();
            if !status.is_success() {
                tracing::debug!(url = %url, status = status.as_u16(), "Chat request rejected");
                return Err(ClientError::http(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default(),
                ));
            }
            Ok(response)
        }
    }
}

/// Adapter for SSE-style response bodies.
///
/// ```rust,no_run
/// use chunkflow_client::{ConnectionAdapter, FetchServerSentEvents};
///
/// let adapter = FetchServerSentEvents::new("https://example.com/api/chat")
///     .with_header("Authorization", "Bearer token");
/// let source = adapter.connect(vec![serde_json::json!({"role": "user", "content": "Hi"})], None);
/// ```
#[derive(Debug, Clone)]
pub struct FetchServerSentEvents {
    endpoint: Endpoint,
}

impl FetchServerSentEvents {
    /// Create an adapter posting to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(url.into()),
        }
    }

    /// Use an existing client, sharing its connection pool.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.endpoint.client = client;
        self
    }

    /// Replace the request options.
    #[must_use]
    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.endpoint.options = options;
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.endpoint.options.headers.insert(name.into(), value.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.endpoint.options.timeout = Some(timeout);
        self
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.endpoint.url
    }
}

impl ConnectionAdapter for FetchServerSentEvents {
    fn connect(&self, messages: Vec<Value>, data: Option<Value>) -> ChunkSource {
        let response = self.endpoint.send(&messages, data.as_ref());
        let body = stream::once(response)
            .map_ok(|response| {
                DecodedStream::sse(response.bytes_stream().map_err(ClientError::from))
            })
            .try_flatten();
        Box::pin(body)
    }
}

/// Adapter for newline-delimited JSON response bodies.
#[derive(Debug, Clone)]
pub struct FetchHttpStream {
    endpoint: Endpoint,
}

impl FetchHttpStream {
    /// Create an adapter posting to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(url.into()),
        }
    }

    /// Use an existing client, sharing its connection pool.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.endpoint.client = client;
        self
    }

    /// Replace the request options.
    #[must_use]
    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.endpoint.options = options;
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.endpoint.options.headers.insert(name.into(), value.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.endpoint.options.timeout = Some(timeout);
        self
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.endpoint.url
    }
}

impl ConnectionAdapter for FetchHttpStream {
    fn connect(&self, messages: Vec<Value>, data: Option<Value>) -> ChunkSource {
        let response = self.endpoint.send(&messages, data.as_ref());
        let body = stream::once(response)
            .map_ok(|response| {
                DecodedStream::ndjson(response.bytes_stream().map_err(ClientError::from))
            })
            .try_flatten();
        Box::pin(body)
    }
}
