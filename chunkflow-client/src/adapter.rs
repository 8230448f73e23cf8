//! The connection adapter trait and the direct-stream adapter.

use crate::error::ClientError;
use futures::Stream;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

/// A stream of backend-native fragments.
pub type ChunkSource = Pin<Box<dyn Stream<Item = Result<Value, ClientError>> + Send>>;

/// Opens a fragment source for a conversation.
///
/// `connect` is lazy: nothing is sent until the source is first polled, and
/// connection failures arrive as the source's first item. Dropping the
/// source cancels the request.
pub trait ConnectionAdapter: Send + Sync {
    /// Open a source for `messages`, with optional extra request `data`.
    fn connect(&self, messages: Vec<Value>, data: Option<Value>) -> ChunkSource;
}

impl<A: ConnectionAdapter + ?Sized> ConnectionAdapter for Arc<A> {
    fn connect(&self, messages: Vec<Value>, data: Option<Value>) -> ChunkSource {
        (**self).connect(messages, data)
    }
}

impl<A: ConnectionAdapter + ?Sized> ConnectionAdapter for Box<A> {
    fn connect(&self, messages: Vec<Value>, data: Option<Value>) -> ChunkSource {
        (**self).connect(messages, data)
    }
}

type StreamFactory = dyn Fn(Vec<Value>, Option<Value>) -> ChunkSource + Send + Sync;

/// Adapter over an in-process stream factory.
///
/// For backends reachable without HTTP, such as a server function in the
/// same process or a recorded fixture.
#[derive(Clone)]
pub struct DirectStream {
    factory: Arc<StreamFactory>,
}

impl DirectStream {
    /// Create an adapter calling `factory` on every connect.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(Vec<Value>, Option<Value>) -> ChunkSource + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }
}

impl ConnectionAdapter for DirectStream {
    fn connect(&self, messages: Vec<Value>, data: Option<Value>) -> ChunkSource {
        tracing::debug!(messages = messages.len(), "Opening direct stream");
        (self.factory)(messages, data)
    }
}

impl fmt::Debug for DirectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{stream, StreamExt};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_direct_stream_passes_arguments() {
        let adapter = DirectStream::new(|messages, data| {
            let data = data.map_or_else(|| "none".to_string(), |data| data.to_string());
            let echo = json!({"type": "content", "content": format!("{} {data}", messages.len())});
            Box::pin(stream::iter(vec![Ok(echo)]))
        });

        let values: Vec<Value> = adapter
            .connect(vec![json!({"role": "user", "content": "hi"})], Some(json!({"k": 1})))
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(
            values,
            vec![json!({"type": "content", "content": "1 {\"k\":1}"})]
        );
    }

    #[tokio::test]
    async fn test_shared_adapter() {
        let adapter: Arc<dyn ConnectionAdapter> =
            Arc::new(DirectStream::new(|_, _| Box::pin(stream::empty())));
        assert!(adapter.connect(Vec::new(), None).next().await.is_none());
    }
}
