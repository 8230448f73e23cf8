//! Emission cadence for text updates.
//!
//! A [`ChunkStrategy`] decides whether the processor should notify its
//! text-update handler after a text fragment. Text is always accumulated;
//! the strategy only controls how often observers hear about it. The
//! processor flushes once more when the source ends, so a deferred update is
//! never lost.

use chunkflow_core::{ChunkflowError, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Decides when accumulated text should be emitted.
pub trait ChunkStrategy: Send {
    /// Called for every text fragment with the incoming `chunk` and the
    /// accumulated text after reconciliation.
    fn should_emit(&mut self, chunk: &str, accumulated: &str) -> bool;

    /// Called at the start of every processing run.
    fn reset(&mut self) {}
}

impl<S: ChunkStrategy + ?Sized> ChunkStrategy for Box<S> {
    fn should_emit(&mut self, chunk: &str, accumulated: &str) -> bool {
        (**self).should_emit(chunk, accumulated)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Emit on every text fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateStrategy;

impl ChunkStrategy for ImmediateStrategy {
    fn should_emit(&mut self, _chunk: &str, _accumulated: &str) -> bool {
        true
    }
}

/// Emit when a fragment contains sentence or clause punctuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationStrategy;

impl PunctuationStrategy {
    const MARKS: [char; 7] = ['.', ',', '!', '?', ';', ':', '\n'];
}

impl ChunkStrategy for PunctuationStrategy {
    fn should_emit(&mut self, chunk: &str, _accumulated: &str) -> bool {
        chunk.contains(&Self::MARKS[..])
    }
}

/// Emit on every `size`-th text fragment.
#[derive(Debug, Clone)]
pub struct BatchStrategy {
    size: usize,
    seen: usize,
}

impl BatchStrategy {
    /// Create a batch strategy. A size of zero behaves like one.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            seen: 0,
        }
    }

    /// Get the batch size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for BatchStrategy {
    fn default() -> Self {
        Self::new(5)
    }
}

impl ChunkStrategy for BatchStrategy {
    fn should_emit(&mut self, _chunk: &str, _accumulated: &str) -> bool {
        self.seen += 1;
        if self.seen >= self.size {
            self.seen = 0;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.seen = 0;
    }
}

/// Emit when a fragment ends on whitespace, so observers never see half a word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBoundaryStrategy;

impl ChunkStrategy for WordBoundaryStrategy {
    fn should_emit(&mut self, chunk: &str, _accumulated: &str) -> bool {
        chunk.ends_with(char::is_whitespace)
    }
}

/// Emit at most once per `min_interval`.
#[derive(Debug, Clone)]
pub struct ThrottleStrategy {
    min_interval: Duration,
    last_emit: Option<Instant>,
}

impl ThrottleStrategy {
    /// Create a throttle strategy.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_emit: None,
        }
    }

    /// Get the minimum interval between emissions.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.min_interval
    }
}

impl ChunkStrategy for ThrottleStrategy {
    fn should_emit(&mut self, _chunk: &str, _accumulated: &str) -> bool {
        let can_emit = match self.last_emit {
            Some(last) => last.elapsed() >= self.min_interval,
            None => true,
        };
        if can_emit {
            self.last_emit = Some(Instant::now());
        }
        can_emit
    }

    fn reset(&mut self) {
        self.last_emit = None;
    }
}

/// Emit when any member strategy emits.
///
/// Every member sees every fragment, so stateful members such as
/// [`BatchStrategy`] keep counting even when an earlier member already
/// decided to emit.
#[derive(Default)]
pub struct CompositeStrategy {
    strategies: Vec<Box<dyn ChunkStrategy>>,
}

impl CompositeStrategy {
    /// Create an empty composite. An empty composite never emits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member strategy.
    #[must_use]
    pub fn with(mut self, strategy: impl ChunkStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Number of member strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for CompositeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeStrategy")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

impl ChunkStrategy for CompositeStrategy {
    fn should_emit(&mut self, chunk: &str, accumulated: &str) -> bool {
        self.strategies
            .iter_mut()
            .fold(false, |emit, strategy| strategy.should_emit(chunk, accumulated) | emit)
    }

    fn reset(&mut self) {
        for strategy in &mut self.strategies {
            strategy.reset();
        }
    }
}

/// Serializable description of a chunk strategy.
///
/// ```rust
/// use chunkflow_streaming::strategy::ChunkStrategyConfig;
///
/// let config: ChunkStrategyConfig = serde_json::from_str(
///     r#"{"strategy": "composite", "strategies": [
///         {"strategy": "punctuation"},
///         {"strategy": "batch", "size": 8}
///     ]}"#,
/// ).unwrap();
/// let strategy = config.build().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ChunkStrategyConfig {
    /// [`ImmediateStrategy`].
    #[default]
    Immediate,
    /// [`PunctuationStrategy`].
    Punctuation,
    /// [`BatchStrategy`].
    Batch {
        /// Fragments per emission.
        size: usize,
    },
    /// [`WordBoundaryStrategy`].
    WordBoundary,
    /// [`ThrottleStrategy`].
    Throttle {
        /// Minimum milliseconds between emissions.
        interval_ms: u64,
    },
    /// [`CompositeStrategy`].
    Composite {
        /// Member strategies.
        strategies: Vec<ChunkStrategyConfig>,
    },
}

impl ChunkStrategyConfig {
    /// Build the described strategy.
    ///
    /// Rejects a zero batch size and an empty composite.
    pub fn build(&self) -> Result<Box<dyn ChunkStrategy>> {
        Ok(match self {
            Self::Immediate => Box::new(ImmediateStrategy),
            Self::Punctuation => Box::new(PunctuationStrategy),
            Self::Batch { size: 0 } => {
                return Err(ChunkflowError::configuration("batch size must be at least 1"));
            }
            Self::Batch { size } => Box::new(BatchStrategy::new(*size)),
            Self::WordBoundary => Box::new(WordBoundaryStrategy),
            Self::Throttle { interval_ms } => {
                Box::new(ThrottleStrategy::new(Duration::from_millis(*interval_ms)))
            }
            Self::Composite { strategies } if strategies.is_empty() => {
                return Err(ChunkflowError::configuration(
                    "composite strategy needs at least one member",
                ));
            }
            Self::Composite { strategies } => {
                let mut composite = CompositeStrategy::new();
                for config in strategies {
                    composite.strategies.push(config.build()?);
                }
                Box::new(composite)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_immediate_always_emits() {
        let mut strategy = ImmediateStrategy;
        assert!(strategy.should_emit("a", "a"));
        assert!(strategy.should_emit("", "a"));
    }

    #[rstest]
    #[case("Hello.", true)]
    #[case("Hello, ", true)]
    #[case("wait!", true)]
    #[case("why?", true)]
    #[case("a; b", true)]
    #[case("note:", true)]
    #[case("line\n", true)]
    #[case("Hello", false)]
    #[case("", false)]
    fn test_punctuation(#[case] chunk: &str, #[case] expected: bool) {
        assert_eq!(PunctuationStrategy.should_emit(chunk, chunk), expected);
    }

    #[test]
    fn test_batch_counts_and_resets() {
        let mut strategy = BatchStrategy::new(3);
        let decisions: Vec<bool> = (0..7).map(|_| strategy.should_emit("x", "x")).collect();
        assert_eq!(decisions, vec![false, false, true, false, false, true, false]);

        strategy.reset();
        assert!(!strategy.should_emit("x", "x"));
        assert!(!strategy.should_emit("x", "x"));
        assert!(strategy.should_emit("x", "x"));
    }

    #[test]
    fn test_batch_zero_behaves_like_one() {
        let mut strategy = BatchStrategy::new(0);
        assert_eq!(strategy.size(), 1);
        assert!(strategy.should_emit("x", "x"));
    }

    #[rstest]
    #[case("word ", true)]
    #[case("word\n", true)]
    #[case("word\t", true)]
    #[case("wo", false)]
    #[case("", false)]
    fn test_word_boundary(#[case] chunk: &str, #[case] expected: bool) {
        assert_eq!(WordBoundaryStrategy.should_emit(chunk, chunk), expected);
    }

    #[test]
    fn test_throttle() {
        let mut strategy = ThrottleStrategy::new(Duration::from_secs(3600));
        assert!(strategy.should_emit("a", "a"));
        assert!(!strategy.should_emit("b", "ab"));

        strategy.reset();
        assert!(strategy.should_emit("c", "abc"));

        let mut unthrottled = ThrottleStrategy::new(Duration::ZERO);
        assert!(unthrottled.should_emit("a", "a"));
        assert!(unthrottled.should_emit("b", "ab"));
    }

    #[test]
    fn test_composite_consults_every_member() {
        let mut strategy = CompositeStrategy::new()
            .with(PunctuationStrategy)
            .with(BatchStrategy::new(2));

        // punctuation fires on the first chunk, the batch still counts it
        assert!(strategy.should_emit("Hi.", "Hi."));
        assert!(strategy.should_emit("x", "Hi.x"));
        assert!(!strategy.should_emit("y", "Hi.xy"));

        strategy.reset();
        assert!(!strategy.should_emit("a", "a"));
        assert!(strategy.should_emit("b", "ab"));
    }

    #[test]
    fn test_empty_composite_never_emits() {
        let mut strategy = CompositeStrategy::new();
        assert!(strategy.is_empty());
        assert!(!strategy.should_emit("Hi.", "Hi."));
    }

    #[test]
    fn test_config_deserialize_and_build() {
        let config: ChunkStrategyConfig =
            serde_json::from_str(r#"{"strategy": "batch", "size": 2}"#).unwrap();
        assert_eq!(config, ChunkStrategyConfig::Batch { size: 2 });

        let mut strategy = config.build().unwrap();
        assert!(!strategy.should_emit("a", "a"));
        assert!(strategy.should_emit("b", "ab"));

        let config: ChunkStrategyConfig =
            serde_json::from_str(r#"{"strategy": "word-boundary"}"#).unwrap();
        assert_eq!(config, ChunkStrategyConfig::WordBoundary);
        assert_eq!(ChunkStrategyConfig::default(), ChunkStrategyConfig::Immediate);
    }

    #[test]
    fn test_config_rejects_mistakes() {
        assert!(ChunkStrategyConfig::Batch { size: 0 }.build().is_err());
        assert!(ChunkStrategyConfig::Composite { strategies: vec![] }.build().is_err());

        let nested = ChunkStrategyConfig::Composite {
            strategies: vec![
                ChunkStrategyConfig::Throttle { interval_ms: 10 },
                ChunkStrategyConfig::Batch { size: 0 },
            ],
        };
        assert!(nested.build().is_err());
    }
}
