//! N-gram-based next-word prediction library.
//!
//! This crate provides a ranked next-word predictor backed by a
//! precomputed n-gram probability index, including:
//! - A vocabulary cache mapping word strings to dense integer ids
//! - Caller-owned rolling context states, advanced one word at a time
//! - Cheap successor-candidate enumeration from a first-order index
//! - Bounded top-k selection with exact full-context scoring
//! - A typed registry for loading model binaries
//!
//! Only the high-level API is exposed publicly. Low-level components
//! are kept internal to ensure consistency and prevent misuse.

/// Prediction core: models, context states and top-k selection.
///
/// This module exposes the high-level predictor interface while keeping
/// internal scoring representations private.
pub mod model;

/// I/O utilities (file listing, path helpers).
///
/// Exposed for the server, which lists and resolves model files.
pub mod io;
