use std::collections::HashMap;

use super::language_model::LanguageModel;

/// Bidirectional mapping between word strings and dense word ids.
///
/// Built once at predictor construction by walking the model's
/// vocabulary byte spans, then immutable. Ids are contiguous over
/// `[0, vocab_size)` and both directions of the mapping agree for
/// every id.
///
/// ## Responsibilities
/// - Materialize each word's byte span into an owned string
/// - Resolve word strings to ids (`lookup`) and ids back to strings
///   (`string_of`)
///
/// The only failure mode after construction is a missed `lookup`,
/// reported through its `Option` return.
pub struct Vocabulary {
	/// Word strings indexed by id.
	strings: Vec<String>,
	/// Reverse mapping from word string to id.
	ids: HashMap<String, u32>,
}

impl Vocabulary {
	/// Builds the cache by materializing every word of the model.
	///
	/// # Errors
	/// Returns an error if a byte span falls outside the vocabulary
	/// blob or does not decode as UTF-8.
	pub fn build<M: LanguageModel>(model: &M) -> Result<Self, String> {
		let size = model.vocab_size();
		let blob = model.vocab_bytes();

		let mut strings = Vec::with_capacity(size);
		let mut ids = HashMap::with_capacity(size);
		for id in 0..size {
			let (start, end) = model.byte_range(id as u32);
			let bytes = blob
				.get(start..end)
				.ok_or_else(|| format!("Byte range {}..{} of word {} is outside the vocabulary blob", start, end, id))?;
			let word = std::str::from_utf8(bytes)
				.map_err(|_| format!("Word {} is not valid UTF-8", id))?;

			strings.push(word.to_owned());
			ids.insert(word.to_owned(), id as u32);
		}

		Ok(Self { strings, ids })
	}

	/// Resolves a word string to its id, if the word is in vocabulary.
	pub fn lookup(&self, word: &str) -> Option<u32> {
		self.ids.get(word).copied()
	}

	/// The word string for an id.
	///
	/// # Panics
	/// Panics if `id` is outside `[0, len)`. The predictor only calls
	/// this with ids obtained from the model, which are always valid.
	pub fn string_of(&self, id: u32) -> &str {
		&self.strings[id as usize]
	}

	/// Number of words in the vocabulary.
	pub fn len(&self) -> usize {
		self.strings.len()
	}

	/// Returns `true` if the vocabulary holds no words.
	pub fn is_empty(&self) -> bool {
		self.strings.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::trie_model::TrieModel;

	fn model() -> TrieModel {
		TrieModel::from_parts(2, &["the", "quick", "brown"], &[]).unwrap()
	}

	#[test]
	fn round_trips_every_word() {
		let vocab = Vocabulary::build(&model()).unwrap();
		for word in ["the", "quick", "brown"] {
			let id = vocab.lookup(word).unwrap();
			assert_eq!(vocab.string_of(id), word);
		}
		assert_eq!(vocab.len(), 3);
	}

	#[test]
	fn ids_are_contiguous_and_agree() {
		let vocab = Vocabulary::build(&model()).unwrap();
		for id in 0..vocab.len() as u32 {
			assert_eq!(vocab.lookup(vocab.string_of(id)), Some(id));
		}
	}

	#[test]
	fn unknown_word_misses() {
		let vocab = Vocabulary::build(&model()).unwrap();
		assert_eq!(vocab.lookup("xyz123"), None);
	}
}
