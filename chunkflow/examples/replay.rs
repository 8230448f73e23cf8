//! Replay a recorded response body through the stream processor.
//!
//! The body is fed to the decoder in small reads, the way it would arrive
//! over the network. Files ending in `.ndjson` or `.jsonl` are decoded as
//! newline-delimited JSON, anything else as SSE-style `data:` lines. With no
//! path a built-in recording is used.
//!
//! ```sh
//! cargo run --example replay -- recording.sse
//! CHUNKFLOW_STRATEGY='{"strategy":"punctuation"}' RUST_LOG=chunkflow_streaming=debug \
//!     cargo run --example replay
//! ```

use anyhow::Context;
use bytes::Bytes;
use chunkflow::{
    ChunkStrategyConfig, DecodedStream, StreamError, StreamHandlers, StreamProcessor,
};
use futures::stream;
use std::fs::File;
use std::io::Read;
use tracing_subscriber::EnvFilter;

const RECORDING: &str = concat!(
    "data: {\"type\":\"content\",\"content\":\"Let me check \"}\n\n",
    "data: {\"type\":\"content\",\"content\":\"the weather.\"}\n\n",
    "data: {\"type\":\"tool_call\",\"index\":0,\"toolCall\":{\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"get_weather\",\"arguments\":\"\"}}}\n\n",
    "data: {\"type\":\"tool_call\",\"index\":0,\"toolCall\":{\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"get_weather\",\"arguments\":\"{\\\"city\\\":\\\"Os\"}}}\n\n",
    "data: {\"type\":\"tool_call\",\"index\":0,\"toolCall\":{\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"get_weather\",\"arguments\":\"lo\\\",\\\"units\\\":[\\\"c\"}}}\n\n",
    "data: {\"type\":\"tool_call\",\"index\":0,\"toolCall\":{\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"get_weather\",\"arguments\":\"\\\"]}\"}}}\n\n",
    "data: {\"type\":\"done\",\"finishReason\":\"tool_calls\"}\n\n",
    "data: [DONE]\n\n",
);

const READ_SIZE: usize = 7;

enum BodyFormat {
    Sse,
    Ndjson,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (mut body, format): (Box<dyn Read>, _) = match std::env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("failed to open {path}"))?;
            let format = if path.ends_with(".ndjson") || path.ends_with(".jsonl") {
                BodyFormat::Ndjson
            } else {
                BodyFormat::Sse
            };
            (Box::new(file), format)
        }
        None => (Box::new(RECORDING.as_bytes()), BodyFormat::Sse),
    };

    let strategy = match std::env::var("CHUNKFLOW_STRATEGY") {
        Ok(json) => serde_json::from_str::<ChunkStrategyConfig>(&json)
            .context("CHUNKFLOW_STRATEGY is not a valid strategy description")?,
        Err(_) => ChunkStrategyConfig::default(),
    };

    let handlers = StreamHandlers::new()
        .on_text_update(|text| tracing::info!(text, "text"))
        .on_tool_call_start(|index, id, name| tracing::info!(index, id, name, "tool call started"))
        .on_tool_call_state_change(|index, _id, _name, state, _raw, parsed| {
            let parsed = parsed.map(ToString::to_string).unwrap_or_default();
            tracing::info!(index, %state, parsed = %parsed, "tool call updated");
        })
        .on_tool_call_complete(|index, _id, name, arguments| {
            tracing::info!(index, name, arguments, "tool call complete");
        })
        .on_stream_end(|text, tool_calls| {
            tracing::info!(
                chars = text.chars().count(),
                tool_calls = tool_calls.map_or(0, <[_]>::len),
                "stream end"
            );
        });

    let mut processor = StreamProcessor::new(handlers).with_chunk_strategy(strategy.build()?);

    let reads = stream::iter(std::iter::from_fn(move || {
        let mut buf = [0u8; READ_SIZE];
        match body.read(&mut buf) {
            Ok(0) => None,
            Ok(n) => Some(Ok(Bytes::copy_from_slice(&buf[..n]))),
            Err(err) => Some(Err(StreamError::from(err))),
        }
    }));

    let result = match format {
        BodyFormat::Sse => processor.process(DecodedStream::sse(reads)).await?,
        BodyFormat::Ndjson => processor.process(DecodedStream::ndjson(reads)).await?,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
