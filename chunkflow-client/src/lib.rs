//! # chunkflow-client
//!
//! Connection adapters that open fragment sources for the chunkflow stream
//! processor.
//!
//! - **[`FetchServerSentEvents`]**: POST, SSE-style `data:` lines back
//! - **[`FetchHttpStream`]**: POST, newline-delimited JSON back
//! - **[`DirectStream`]**: an in-process stream factory
//!
//! ## Example
//!
//! ```rust,no_run
//! use chunkflow_client::{ConnectionAdapter, FetchServerSentEvents};
//! use chunkflow_streaming::{StreamHandlers, StreamProcessor};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), chunkflow_client::ClientError> {
//! let adapter = FetchServerSentEvents::new("https://example.com/api/chat");
//! let source = adapter.connect(vec![json!({"role": "user", "content": "Hi"})], None);
//!
//! let mut processor = StreamProcessor::new(StreamHandlers::new().on_text_update(|text| {
//!     println!("{text}");
//! }));
//! let result = processor.process(source).await?;
//! println!("{}", result.content);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod error;
pub mod http;

pub use adapter::{ChunkSource, ConnectionAdapter, DirectStream};
pub use error::{ClientError, ClientResult};
pub use http::{ConnectionOptions, FetchHttpStream, FetchServerSentEvents};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ChunkSource, ClientError, ConnectionAdapter, ConnectionOptions, DirectStream,
        FetchHttpStream, FetchServerSentEvents,
    };
}
