use super::state::ContextState;

/// Interface the predictor consumes from an already-loaded n-gram model.
///
/// The model is assumed memory-resident: every method here is a bounded
/// computation with no I/O. Loading and deserializing a model belongs to
/// the registry, not to this trait.
///
/// All read-side methods take `&self`, so distinct contexts can be
/// scored concurrently against the same model without coordination.
/// `score` mutates only the state passed to it.
pub trait LanguageModel {
	/// Number of words in the model vocabulary.
	fn vocab_size(&self) -> usize;

	/// The contiguous byte blob holding every vocabulary word.
	fn vocab_bytes(&self) -> &[u8];

	/// Byte span `(start, end)` of a word's string inside `vocab_bytes`.
	///
	/// Ids are contiguous over `[0, vocab_size)`; callers must pass a
	/// valid id.
	fn byte_range(&self, word_id: u32) -> (usize, usize);

	/// Order of the model (maximum n-gram length).
	fn order(&self) -> usize;

	/// A fresh, empty context state sized for this model.
	fn initial_state(&self) -> ContextState {
		ContextState::new(self.order().saturating_sub(1))
	}

	/// Scores `word` against the context and advances the state window.
	///
	/// Returns the log-probability of the word following the current
	/// context, and a flag telling whether the word was out of
	/// vocabulary.
	fn score(&self, state: &mut ContextState, word: &[u8]) -> (f32, bool);

	/// Word ids ever observed following `word_id` at the given order
	/// level, sorted ascending.
	///
	/// Level 0 is the first-order continuation set; the predictor only
	/// ever asks for level 0. Levels the model does not materialize
	/// yield an empty slice.
	fn successors(&self, order_level: usize, word_id: u32) -> &[u32];
}
