/// Rolling window of the most recent word ids in a prediction context.
///
/// A `ContextState` holds up to `capacity` word ids (capacity is
/// `order - 1` for a model of order `order`) in the order they were fed.
/// When the window is full, pushing a new id evicts the oldest one.
///
/// The state is a plain value: the caller owns it, clones of it are
/// independent, and two states compare equal exactly when they hold the
/// same window. Candidate scoring always works on a clone so the
/// caller's state is never touched by `predict`.
///
/// ## Invariants
/// - `len() <= capacity()` at all times
/// - Ids are stored oldest-first; `last()` is the most recently fed word
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextState {
	/// Maximum number of word ids the window can hold.
	capacity: usize,
	/// Word ids, oldest first.
	words: Vec<u32>,
}

impl ContextState {
	/// Creates an empty state with the given window capacity.
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			words: Vec::with_capacity(capacity),
		}
	}

	/// Appends a word id, evicting the oldest entry if the window is full.
	///
	/// A zero-capacity state ignores every push.
	pub fn push(&mut self, word_id: u32) {
		if self.capacity == 0 {
			return;
		}
		if self.words.len() == self.capacity {
			self.words.remove(0);
		}
		self.words.push(word_id);
	}

	/// Number of word ids currently in the window.
	pub fn len(&self) -> usize {
		self.words.len()
	}

	/// Returns `true` if no word has been fed yet.
	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}

	/// The most recently fed word id, if any.
	pub fn last(&self) -> Option<u32> {
		self.words.last().copied()
	}

	/// Maximum number of word ids the window can hold.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// The current window, oldest word first.
	pub fn words(&self) -> &[u32] {
		&self.words
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn push_keeps_insertion_order() {
		let mut state = ContextState::new(3);
		state.push(7);
		state.push(1);
		assert_eq!(state.words(), &[7, 1]);
		assert_eq!(state.last(), Some(1));
		assert_eq!(state.len(), 2);
	}

	#[test]
	fn push_evicts_oldest_at_capacity() {
		let mut state = ContextState::new(2);
		state.push(1);
		state.push(2);
		state.push(3);
		assert_eq!(state.words(), &[2, 3]);
		assert_eq!(state.len(), 2);
	}

	#[test]
	fn zero_capacity_ignores_pushes() {
		let mut state = ContextState::new(0);
		state.push(42);
		assert!(state.is_empty());
		assert_eq!(state.last(), None);
	}

	#[test]
	fn clones_are_independent() {
		let mut state = ContextState::new(2);
		state.push(1);
		let snapshot = state.clone();
		state.push(2);
		assert_eq!(snapshot.words(), &[1]);
		assert_ne!(snapshot, state);
	}
}
