//! One-call helpers for running a conversation turn.
//!
//! These wire a [`ConnectionAdapter`] straight into a [`StreamProcessor`]
//! for callers that do not need to hold the fragment source themselves.
//!
//! ```rust,no_run
//! use chunkflow::direct::process_connection;
//! use chunkflow::{FetchServerSentEvents, StreamHandlers, StreamProcessor};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), chunkflow::ClientError> {
//! let adapter = FetchServerSentEvents::new("https://example.com/api/chat");
//! let mut processor = StreamProcessor::new(StreamHandlers::new());
//!
//! let result = process_connection(
//!     &adapter,
//!     vec![json!({"role": "user", "content": "What's the weather in Oslo?"})],
//!     None,
//!     &mut processor,
//! )
//! .await?;
//!
//! for call in result.api_tool_calls() {
//!     println!("{} {}", call.function.name, call.function.arguments);
//! }
//! # Ok(())
//! # }
//! ```

use chunkflow_client::{ClientError, ConnectionAdapter};
use chunkflow_streaming::{ProcessResult, StreamProcessor};
use serde_json::Value;

/// Connect with `adapter` and process the resulting source to its end.
pub async fn process_connection<A>(
    adapter: &A,
    messages: Vec<Value>,
    data: Option<Value>,
    processor: &mut StreamProcessor,
) -> Result<ProcessResult, ClientError>
where
    A: ConnectionAdapter + ?Sized,
{
    let source = adapter.connect(messages, data);
    let result = processor.process(source).await;
    if let Err(err) = &result {
        tracing::debug!(error = %err, transport = err.is_transport(), "Connection failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkflow_client::DirectStream;
    use chunkflow_streaming::StreamHandlers;
    use futures::stream;
    use serde_json::json;

    #[tokio::test]
    async fn test_process_direct_connection() {
        let adapter = DirectStream::new(|messages, _| {
            let reply = format!("echo: {}", messages.len());
            Box::pin(stream::iter(vec![
                Ok(json!({"type": "content", "content": reply})),
                Ok(json!({"type": "done"})),
            ]))
        });
        let mut processor = StreamProcessor::new(StreamHandlers::new());

        let messages = vec![json!({"role": "user"})];
        let result = process_connection(&adapter, messages, None, &mut processor)
            .await
            .unwrap();

        assert_eq!(result.content, "echo: 1");
        assert!(!result.has_tool_calls());
    }

    #[tokio::test]
    async fn test_source_error_is_returned() {
        let adapter = DirectStream::new(|_, _| {
            Box::pin(stream::iter(vec![Err(ClientError::http(401, "Unauthorized"))]))
        });
        let mut processor = StreamProcessor::new(StreamHandlers::new());

        let err = process_connection(&adapter, Vec::new(), None, &mut processor)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
    }
}
