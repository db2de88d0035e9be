use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::Serialize;

use super::language_model::LanguageModel;
use super::state::ContextState;
use super::trie_model::UNKNOWN_TOKEN;
use super::vocabulary::Vocabulary;

/// What `feed` does with a word that has no vocabulary id.
///
/// # Variants
/// - `Skip`: leave the state untouched and report success. This is the
///   default, matching the historical behavior callers rely on.
/// - `Reject`: leave the state untouched and return an error naming
///   the word.
/// - `Substitute`: advance the state with the configured unknown token
///   instead; falls back to skipping if the vocabulary has no such
///   token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OovPolicy {
	Skip,
	Reject,
	Substitute,
}

/// How `predict` orders candidates whose log-probabilities are equal.
///
/// # Variants
/// - `Arbitrary`: ties resolve in an unspecified order. The default;
///   callers that compare prediction lists should pick one of the
///   deterministic variants instead.
/// - `LowestWordId`: the candidate with the lower word id wins the tie.
/// - `HighestWordId`: the candidate with the higher word id wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreak {
	Arbitrary,
	LowestWordId,
	HighestWordId,
}

impl TieBreak {
	/// Secondary sort key for a candidate; higher keys rank better.
	fn key(&self, word_id: u32) -> u32 {
		match self {
			TieBreak::Arbitrary => 0,
			TieBreak::LowestWordId => !word_id,
			TieBreak::HighestWordId => word_id,
		}
	}
}

/// One ranked prediction returned by `predict`.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Prediction {
	/// The predicted word.
	pub word: String,
	/// Log-probability of the word following the fed context.
	pub log_prob: f32,
}

/// Heap entry for the bounded top-k selection.
///
/// Orders by log-probability first, then by the precomputed tie key,
/// so the heap minimum is always the entry to evict.
struct ScoredCandidate {
	log_prob: f32,
	tie_key: u32,
	word_id: u32,
}

impl PartialEq for ScoredCandidate {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for ScoredCandidate {}

impl PartialOrd for ScoredCandidate {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for ScoredCandidate {
	fn cmp(&self, other: &Self) -> Ordering {
		self.log_prob
			.total_cmp(&other.log_prob)
			.then(self.tie_key.cmp(&other.tie_key))
			.then(self.word_id.cmp(&other.word_id))
	}
}

/// Ranked next-word predictor over an already-loaded n-gram model.
///
/// # Responsibilities
/// - Build and own the vocabulary cache at construction
/// - Advance caller-owned context states one word at a time (`feed`)
/// - Enumerate successor candidates from the first-order index and
///   keep the k best under exact full-context scoring (`predict`)
///
/// # Invariants
/// - `predict` never mutates the caller's state; every candidate is
///   scored against its own scratch copy
/// - The selection heap never holds more than k entries
///
/// `predict` and `feed` take `&self`, so one predictor can serve many
/// independent context states concurrently. A single state must not be
/// fed from two places at once; it belongs to one logical session.
pub struct Predictor<M: LanguageModel> {
	model: M,
	vocab: Vocabulary,
	oov_policy: OovPolicy,
	tie_break: TieBreak,
	unknown_token: String,
}

impl<M: LanguageModel> Predictor<M> {
	/// Builds a predictor against an already-loaded model.
	///
	/// Caches the full vocabulary in both directions; defaults to the
	/// `Skip` OOV policy and `Arbitrary` tie-breaking.
	///
	/// # Errors
	/// Returns an error if the model's vocabulary cannot be
	/// materialized (invalid byte span or non-UTF-8 word).
	pub fn new(model: M) -> Result<Self, String> {
		let vocab = Vocabulary::build(&model)?;
		Ok(Self {
			model,
			vocab,
			oov_policy: OovPolicy::Skip,
			tie_break: TieBreak::Arbitrary,
			unknown_token: UNKNOWN_TOKEN.to_owned(),
		})
	}

	/// Sets the out-of-vocabulary policy applied by `feed`.
	pub fn with_oov_policy(mut self, policy: OovPolicy) -> Self {
		self.oov_policy = policy;
		self
	}

	/// Sets the tie-break rule for equal log-probabilities.
	pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
		self.tie_break = tie_break;
		self
	}

	/// Sets the token fed in place of unknown words under
	/// `OovPolicy::Substitute`.
	pub fn with_unknown_token(mut self, token: &str) -> Self {
		self.unknown_token = token.to_owned();
		self
	}

	/// A fresh, empty context state sized for the model.
	pub fn initial_state(&self) -> ContextState {
		self.model.initial_state()
	}

	/// The vocabulary cache built at construction.
	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocab
	}

	/// The underlying model.
	pub fn model(&self) -> &M {
		&self.model
	}

	/// Advances `state` with one word.
	///
	/// In-vocabulary words are scored through the model (the returned
	/// log-probability is discarded) so the state window moves forward.
	/// Out-of-vocabulary handling follows the configured `OovPolicy`.
	///
	/// # Errors
	/// Only under `OovPolicy::Reject`, when the word has no id.
	pub fn feed(&self, state: &mut ContextState, word: &str) -> Result<(), String> {
		if let Some(id) = self.vocab.lookup(word) {
			self.model.score(state, self.vocab.string_of(id).as_bytes());
			return Ok(());
		}

		match self.oov_policy {
			OovPolicy::Skip => Ok(()),
			OovPolicy::Reject => Err(format!("Word '{}' is not in the vocabulary", word)),
			OovPolicy::Substitute => {
				if let Some(id) = self.vocab.lookup(&self.unknown_token) {
					self.model.score(state, self.vocab.string_of(id).as_bytes());
				}
				Ok(())
			}
		}
	}

	/// Returns the k most probable next words for the fed context,
	/// best first.
	///
	/// Candidates are the first-order continuations of the last fed
	/// word: a deliberate approximation that keeps enumeration
	/// proportional to that word's branching factor `C` rather than
	/// the vocabulary size. Each candidate is then scored with the
	/// full context against a scratch copy of `state`, and a bounded
	/// min-heap keeps the k best, for `O(C log k)` overall.
	///
	/// An empty context yields an empty result: prediction from no
	/// context is unsupported by design. `k == 0` also yields an empty
	/// result. The output length is `min(k, C)` and log-probabilities
	/// are non-increasing.
	pub fn predict(&self, state: &ContextState, k: usize) -> Vec<Prediction> {
		let last = match state.last() {
			Some(id) => id,
			None => return Vec::new(),
		};
		if k == 0 {
			return Vec::new();
		}

		// Preallocate from the bounded side: k is caller-controlled and
		// may be huge, but the heap never outgrows the candidate count.
		let candidates = self.model.successors(0, last);
		let mut heap: BinaryHeap<Reverse<ScoredCandidate>> =
			BinaryHeap::with_capacity(k.min(candidates.len()));
		for &candidate in candidates {
			let mut scratch = state.clone();
			let word = self.vocab.string_of(candidate);
			let (log_prob, _) = self.model.score(&mut scratch, word.as_bytes());

			let scored = ScoredCandidate {
				log_prob,
				tie_key: self.tie_break.key(candidate),
				word_id: candidate,
			};
			if heap.len() < k {
				heap.push(Reverse(scored));
			} else if let Some(Reverse(worst)) = heap.peek() {
				if scored > *worst {
					heap.pop();
					heap.push(Reverse(scored));
				}
			}
		}

		// Ascending over Reverse is descending over the candidates.
		heap.into_sorted_vec()
			.into_iter()
			.map(|Reverse(candidate)| Prediction {
				word: self.vocab.string_of(candidate.word_id).to_owned(),
				log_prob: candidate.log_prob,
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::trie_model::TrieModel;

	/// Vocabulary {the:0, quick:1, brown:2, fox:3, jumps:4} with one
	/// continuation of "fox" and a fan of continuations of "the".
	fn predictor() -> Predictor<TrieModel> {
		let model = TrieModel::from_parts(
			3,
			&["the", "quick", "brown", "fox", "jumps"],
			&[
				(&["the", "quick"], -0.3),
				(&["the", "fox"], -0.7),
				(&["the", "brown"], -1.2),
				(&["the", "jumps"], -2.5),
				(&["quick", "brown"], -0.2),
				(&["brown", "fox"], -0.15),
				(&["fox", "jumps"], -0.1),
			],
		)
		.unwrap();
		Predictor::new(model).unwrap()
	}

	fn seeded(predictor: &Predictor<TrieModel>, context: &[&str]) -> ContextState {
		let mut state = predictor.initial_state();
		for word in context {
			predictor.feed(&mut state, word).unwrap();
		}
		state
	}

	#[test]
	fn full_context_yields_the_single_continuation() {
		let predictor = predictor();
		let state = seeded(&predictor, &["the", "quick", "brown", "fox"]);

		let predictions = predictor.predict(&state, 3);
		assert_eq!(
			predictions,
			vec![Prediction { word: "jumps".to_owned(), log_prob: -0.1 }]
		);
	}

	#[test]
	fn k_zero_yields_nothing() {
		let predictor = predictor();
		let state = seeded(&predictor, &["the", "quick", "brown", "fox"]);
		assert!(predictor.predict(&state, 0).is_empty());
	}

	#[test]
	fn empty_context_yields_nothing_for_every_k() {
		let predictor = predictor();
		let state = predictor.initial_state();
		for k in [0, 1, 5, 100] {
			assert!(predictor.predict(&state, k).is_empty());
		}
	}

	#[test]
	fn output_is_bounded_and_sorted_descending() {
		let predictor = predictor();
		let state = seeded(&predictor, &["the"]);

		// "the" has four continuations.
		let all = predictor.predict(&state, 10);
		assert_eq!(all.len(), 4);
		for pair in all.windows(2) {
			assert!(pair[0].log_prob >= pair[1].log_prob);
		}

		let top = predictor.predict(&state, 2);
		assert_eq!(top.len(), 2);
		assert_eq!(top[0].word, "quick");
		assert_eq!(top[0].log_prob, -0.3);
		assert_eq!(top[1].word, "fox");
	}

	#[test]
	fn huge_k_is_bounded_by_the_candidate_count() {
		let predictor = predictor();
		let state = seeded(&predictor, &["the", "quick", "brown", "fox"]);

		let predictions = predictor.predict(&state, usize::MAX);
		assert_eq!(predictions.len(), 1);
		assert_eq!(predictions[0].word, "jumps");
	}

	#[test]
	fn candidates_come_from_the_last_word_only() {
		let predictor = predictor();
		let state = seeded(&predictor, &["quick", "brown"]);
		assert_eq!(state.last(), predictor.vocabulary().lookup("brown"));

		let successors = predictor.model().successors(0, state.last().unwrap());
		for prediction in predictor.predict(&state, 10) {
			let id = predictor.vocabulary().lookup(&prediction.word).unwrap();
			assert!(successors.contains(&id));
		}
	}

	#[test]
	fn oov_feed_is_a_silent_no_op_by_default() {
		let predictor = predictor();
		let mut state = seeded(&predictor, &["the", "quick", "brown", "fox"]);
		let before_state = state.clone();
		let before = predictor.predict(&state, 3);

		predictor.feed(&mut state, "xyz123").unwrap();
		assert_eq!(state, before_state);
		assert_eq!(predictor.predict(&state, 3), before);
	}

	#[test]
	fn reject_policy_surfaces_the_word() {
		let predictor = predictor().with_oov_policy(OovPolicy::Reject);
		let mut state = predictor.initial_state();

		let err = predictor.feed(&mut state, "xyz123").unwrap_err();
		assert!(err.contains("xyz123"));
		assert!(state.is_empty());
	}

	#[test]
	fn substitute_policy_advances_with_the_unknown_token() {
		let model = TrieModel::from_parts(
			2,
			&["hello", "<unk>"],
			&[(&["<unk>"], -4.0)],
		)
		.unwrap();
		let predictor = Predictor::new(model)
			.unwrap()
			.with_oov_policy(OovPolicy::Substitute);

		let mut state = predictor.initial_state();
		predictor.feed(&mut state, "xyz123").unwrap();
		assert_eq!(state.last(), predictor.vocabulary().lookup("<unk>"));
	}

	#[test]
	fn substitute_without_unknown_token_skips() {
		let predictor = predictor().with_oov_policy(OovPolicy::Substitute);
		let mut state = seeded(&predictor, &["the"]);
		let before = state.clone();

		predictor.feed(&mut state, "xyz123").unwrap();
		assert_eq!(state, before);
	}

	#[test]
	fn ties_resolve_by_the_configured_rule() {
		let model = || {
			TrieModel::from_parts(
				2,
				&["a", "x", "y"],
				&[(&["a", "x"], -0.5), (&["a", "y"], -0.5)],
			)
			.unwrap()
		};

		let lowest = Predictor::new(model())
			.unwrap()
			.with_tie_break(TieBreak::LowestWordId);
		let mut state = lowest.initial_state();
		lowest.feed(&mut state, "a").unwrap();
		assert_eq!(lowest.predict(&state, 1)[0].word, "x");

		let highest = Predictor::new(model())
			.unwrap()
			.with_tie_break(TieBreak::HighestWordId);
		let mut state = highest.initial_state();
		highest.feed(&mut state, "a").unwrap();
		assert_eq!(highest.predict(&state, 1)[0].word, "y");
	}

	#[test]
	fn predict_leaves_the_callers_state_untouched() {
		let predictor = predictor();
		let state = seeded(&predictor, &["the", "quick"]);
		let snapshot = state.clone();

		predictor.predict(&state, 5);
		assert_eq!(state, snapshot);
	}
}
