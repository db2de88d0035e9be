//! Top-level module for the n-gram prediction system.
//!
//! This crate provides a top-k next-word predictor, including:
//! - The external model interface (`LanguageModel`)
//! - A trie-backed probability index (`TrieModel`)
//! - Caller-owned context management (`ContextState`)
//! - A bidirectional vocabulary cache (`Vocabulary`)
//! - A typed model registry for binary loading (`registry`)
//! - The high-level prediction interface (`Predictor`)

/// High-level interface for ranked next-word prediction.
///
/// Exposes context feeding, candidate enumeration over a first-order
/// successor index, and bounded top-k selection with exact scoring.
pub mod predictor;

/// Interface consumed from the external n-gram model engine.
///
/// Everything the predictor needs from an already-loaded model:
/// vocabulary access, state creation, scoring, successor ranges.
pub mod language_model;

/// Memory-resident probability index keyed by word-id n-grams.
///
/// Scores with longest-suffix backoff and serves first-order
/// successor lists for candidate enumeration.
pub mod trie_model;

/// Caller-owned rolling window of recent word ids.
///
/// A plain bounded sequence value with cheap scratch copies;
/// bounded by `order - 1`.
pub mod state;

/// Bidirectional word-string / word-id mapping.
///
/// Built once at predictor construction from the model's
/// vocabulary byte spans. Immutable afterwards.
pub mod vocabulary;

/// Typed registry of supported model binary variants.
///
/// Resolves the on-disk model tag once at load time into a typed
/// handle instead of dispatching on strings at every call site.
pub mod registry;
