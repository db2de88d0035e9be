use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::language_model::LanguageModel;
use super::state::ContextState;

/// Log-probability assigned when no entry of the index matches,
/// including fully out-of-vocabulary words.
pub const FLOOR_LOG_PROB: f32 = -10.0;

/// Conventional spelling of the unknown token, when the vocabulary
/// carries one.
pub const UNKNOWN_TOKEN: &str = "<unk>";

/// Memory-resident n-gram probability index.
///
/// Holds precomputed statistics produced by an external estimation
/// step: this type never counts or smooths anything itself, it only
/// serves lookups over tables it was handed.
///
/// # Responsibilities
/// - Store the vocabulary as one byte blob plus an offsets table
/// - Score a word against a context with longest-suffix backoff
/// - Serve the first-order successor list of any word id
///
/// # Invariants
/// - `order >= 2`
/// - `offsets` has `vocab_size + 1` entries and is non-decreasing
/// - Every n-gram key holds between 1 and `order` word ids
/// - Successor lists are sorted ascending with no duplicates
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrieModel {
	/// Maximum n-gram length of the index.
	order: usize,
	/// Every vocabulary word, concatenated.
	vocab_blob: Vec<u8>,
	/// Byte offsets into `vocab_blob`; word `i` spans `offsets[i]..offsets[i + 1]`.
	offsets: Vec<usize>,
	/// Reverse lookup from word string to id, used by `score`.
	lookup: HashMap<String, u32>,
	/// Log-probabilities keyed by word-id n-grams (context suffix + word).
	log_probs: HashMap<Vec<u32>, f32>,
	/// First-order continuations per word id, sorted ascending.
	successors: Vec<Vec<u32>>,
	/// Id of the unknown token, if the vocabulary has one.
	unknown_id: Option<u32>,
}

impl TrieModel {
	/// Assembles a model from an explicit word list and a precomputed
	/// n-gram log-probability table.
	///
	/// Successor lists are derived from every adjacent id pair observed
	/// across the supplied n-grams.
	///
	/// # Errors
	/// - `order` below 2
	/// - duplicate word in `words`
	/// - an n-gram that is empty, longer than `order`, or mentions a
	///   word missing from `words`
	pub fn from_parts(
		order: usize,
		words: &[&str],
		log_probs: &[(&[&str], f32)],
	) -> Result<Self, String> {
		if order < 2 {
			return Err("order must be >= 2".to_owned());
		}

		let mut vocab_blob = Vec::new();
		let mut offsets = Vec::with_capacity(words.len() + 1);
		let mut lookup = HashMap::with_capacity(words.len());
		offsets.push(0);
		for (id, word) in words.iter().enumerate() {
			if lookup.insert((*word).to_owned(), id as u32).is_some() {
				return Err(format!("Duplicate word '{}' in vocabulary", word));
			}
			vocab_blob.extend_from_slice(word.as_bytes());
			offsets.push(vocab_blob.len());
		}

		let mut table = HashMap::with_capacity(log_probs.len());
		let mut followers: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); words.len()];
		for (gram, log_prob) in log_probs {
			if gram.is_empty() || gram.len() > order {
				return Err(format!("N-gram length must be in [1, {}], got {}", order, gram.len()));
			}
			let mut key = Vec::with_capacity(gram.len());
			for word in *gram {
				let id = lookup
					.get(*word)
					.ok_or_else(|| format!("N-gram word '{}' is not in the vocabulary", word))?;
				key.push(*id);
			}
			for pair in key.windows(2) {
				followers[pair[0] as usize].insert(pair[1]);
			}
			table.insert(key, *log_prob);
		}

		let unknown_id = lookup.get(UNKNOWN_TOKEN).copied();
		Ok(Self {
			order,
			vocab_blob,
			offsets,
			lookup,
			log_probs: table,
			successors: followers.into_iter().map(|set| set.into_iter().collect()).collect(),
			unknown_id,
		})
	}

	/// Re-checks the structural invariants of a deserialized index.
	///
	/// `from_parts` establishes these by construction, but bytes from
	/// disk prove nothing: a payload that decodes cleanly can still
	/// break the offsets table or reference ids past the vocabulary.
	/// The registry calls this before handing the model out.
	///
	/// # Errors
	/// Returns an error naming the first violated invariant.
	pub(crate) fn validate(&self) -> Result<(), String> {
		if self.order < 2 {
			return Err(format!("order must be >= 2, got {}", self.order));
		}
		if self.offsets.is_empty() {
			return Err("Offsets table is empty".to_owned());
		}
		if self.offsets[0] != 0 || self.offsets.windows(2).any(|pair| pair[0] > pair[1]) {
			return Err("Offsets table must be non-decreasing from 0".to_owned());
		}
		if self.offsets[self.offsets.len() - 1] != self.vocab_blob.len() {
			return Err("Offsets table does not cover the vocabulary blob".to_owned());
		}

		let vocab_size = self.offsets.len() - 1;
		let in_range = |id: u32| (id as usize) < vocab_size;
		if let Some(&id) = self.lookup.values().find(|&&id| !in_range(id)) {
			return Err(format!("Lookup id {} is outside the vocabulary", id));
		}
		for key in self.log_probs.keys() {
			if key.is_empty() || key.len() > self.order {
				return Err(format!("N-gram key length must be in [1, {}], got {}", self.order, key.len()));
			}
			if let Some(&id) = key.iter().find(|&&id| !in_range(id)) {
				return Err(format!("N-gram id {} is outside the vocabulary", id));
			}
		}
		for list in &self.successors {
			if let Some(&id) = list.iter().find(|&&id| !in_range(id)) {
				return Err(format!("Successor id {} is outside the vocabulary", id));
			}
		}
		if let Some(unknown) = self.unknown_id {
			if !in_range(unknown) {
				return Err(format!("Unknown-token id {} is outside the vocabulary", unknown));
			}
		}

		Ok(())
	}

	/// Looks up the longest recorded suffix of `context + word`.
	///
	/// Tries the full window first, then progressively shorter
	/// suffixes down to the unigram; falls back to the floor constant
	/// when even the unigram is unrecorded.
	fn backoff_score(&self, context: &[u32], word_id: u32) -> f32 {
		let usable = context.len().min(self.order - 1);
		for start in (context.len() - usable)..=context.len() {
			let mut key = context[start..].to_vec();
			key.push(word_id);
			if let Some(log_prob) = self.log_probs.get(&key) {
				return *log_prob;
			}
		}
		FLOOR_LOG_PROB
	}
}

impl LanguageModel for TrieModel {
	fn vocab_size(&self) -> usize {
		self.offsets.len() - 1
	}

	fn vocab_bytes(&self) -> &[u8] {
		&self.vocab_blob
	}

	fn byte_range(&self, word_id: u32) -> (usize, usize) {
		let id = word_id as usize;
		(self.offsets[id], self.offsets[id + 1])
	}

	fn order(&self) -> usize {
		self.order
	}

	fn score(&self, state: &mut ContextState, word: &[u8]) -> (f32, bool) {
		let id = std::str::from_utf8(word)
			.ok()
			.and_then(|word| self.lookup.get(word).copied());

		match id {
			Some(id) => {
				let log_prob = self.backoff_score(state.words(), id);
				state.push(id);
				(log_prob, false)
			}
			None => match self.unknown_id {
				Some(unknown) => {
					let log_prob = self.backoff_score(state.words(), unknown);
					state.push(unknown);
					(log_prob, true)
				}
				// No unknown token: the window cannot advance.
				None => (FLOOR_LOG_PROB, true),
			},
		}
	}

	fn successors(&self, order_level: usize, word_id: u32) -> &[u32] {
		if order_level != 0 {
			return &[];
		}
		self.successors
			.get(word_id as usize)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn model() -> TrieModel {
		TrieModel::from_parts(
			3,
			&["the", "quick", "brown", "fox"],
			&[
				(&["fox"], -3.0),
				(&["quick"], -2.5),
				(&["the", "quick"], -0.3),
				(&["quick", "brown"], -0.2),
				(&["the", "quick", "brown"], -0.05),
				(&["brown", "fox"], -0.15),
			],
		)
		.unwrap()
	}

	#[test]
	fn rejects_order_below_two() {
		assert!(TrieModel::from_parts(1, &["the"], &[]).is_err());
	}

	#[test]
	fn rejects_unknown_ngram_word() {
		assert!(TrieModel::from_parts(2, &["the"], &[(&["the", "cat"], -0.5)]).is_err());
	}

	#[test]
	fn rejects_duplicate_word() {
		assert!(TrieModel::from_parts(2, &["the", "the"], &[]).is_err());
	}

	#[test]
	fn validate_accepts_a_built_model() {
		assert!(model().validate().is_ok());
	}

	#[test]
	fn validate_rejects_broken_invariants() {
		let good = model();

		let mut empty_offsets = good.clone();
		empty_offsets.offsets.clear();
		assert!(empty_offsets.validate().is_err());

		let mut decreasing = good.clone();
		decreasing.offsets = vec![0, 5, 3, 8, good.vocab_blob.len()];
		assert!(decreasing.validate().is_err());

		let mut short_blob = good.clone();
		short_blob.vocab_blob.pop();
		assert!(short_blob.validate().is_err());

		let mut wild_successor = good.clone();
		wild_successor.successors[0].push(99);
		assert!(wild_successor.validate().is_err());

		let mut zero_order = good.clone();
		zero_order.order = 0;
		assert!(zero_order.validate().is_err());
	}

	#[test]
	fn byte_ranges_cover_every_word() {
		let model = model();
		assert_eq!(model.vocab_size(), 4);
		let (start, end) = model.byte_range(1);
		assert_eq!(&model.vocab_bytes()[start..end], b"quick");
	}

	#[test]
	fn backoff_prefers_the_longest_suffix() {
		let model = model();
		let mut state = model.initial_state();
		state.push(0); // the
		state.push(1); // quick

		// Trigram "the quick brown" beats the bigram entry.
		let (log_prob, oov) = model.score(&mut state, b"brown");
		assert!(!oov);
		assert_eq!(log_prob, -0.05);
		assert_eq!(state.words(), &[1, 2]);
	}

	#[test]
	fn backoff_falls_through_to_unigram() {
		let model = model();
		let mut state = model.initial_state();
		state.push(0); // "the fox" and "fox" alone both unrecorded as bigram

		let (log_prob, _) = model.score(&mut state, b"fox");
		assert_eq!(log_prob, -3.0);
	}

	#[test]
	fn unrecorded_word_scores_at_the_floor() {
		let model = model();
		let mut state = model.initial_state();
		let (log_prob, _) = model.score(&mut state, b"the");
		assert_eq!(log_prob, FLOOR_LOG_PROB);
	}

	#[test]
	fn oov_without_unknown_token_leaves_state_unchanged() {
		let model = model();
		let mut state = model.initial_state();
		state.push(3);
		let snapshot = state.clone();

		let (log_prob, oov) = model.score(&mut state, b"xyz123");
		assert!(oov);
		assert_eq!(log_prob, FLOOR_LOG_PROB);
		assert_eq!(state, snapshot);
	}

	#[test]
	fn oov_with_unknown_token_advances_to_it() {
		let model = TrieModel::from_parts(2, &["hello", UNKNOWN_TOKEN], &[(&[UNKNOWN_TOKEN], -4.0)]).unwrap();
		let mut state = model.initial_state();

		let (log_prob, oov) = model.score(&mut state, b"xyz123");
		assert!(oov);
		assert_eq!(log_prob, -4.0);
		assert_eq!(state.last(), Some(1));
	}

	#[test]
	fn successors_come_from_adjacent_pairs_sorted() {
		let model = TrieModel::from_parts(
			3,
			&["a", "z", "m"],
			&[
				(&["a", "z"], -0.5),
				(&["a", "m"], -0.6),
				(&["m", "a", "z"], -0.1),
			],
		)
		.unwrap();

		// "a" is followed by both "z" (1) and "m" (2); "m" by "a" (0).
		assert_eq!(model.successors(0, 0), &[1, 2]);
		assert_eq!(model.successors(0, 2), &[0]);
		assert_eq!(model.successors(0, 1), &[] as &[u32]);
	}

	#[test]
	fn only_level_zero_is_materialized() {
		let model = model();
		assert_eq!(model.successors(1, 0), &[] as &[u32]);
	}
}
