use std::path::Path;

use serde::{Deserialize, Serialize};

use super::trie_model::TrieModel;

/// The model binary variants the registry knows about.
///
/// The variant is stored in the file header and resolved exactly once
/// at load time into a typed handle; nothing downstream dispatches on
/// strings.
///
/// # Variants
/// - `TrieProb`: trie index storing log-probabilities; the variant the
///   predictor consumes.
/// - `TrieCount`: trie index storing raw occurrence counts. Recognized
///   so the error names it, but prediction needs probabilities.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelType {
	TrieProb,
	TrieCount,
}

impl ModelType {
	/// Stable textual tag of the variant, used in messages and tooling.
	pub fn tag(&self) -> &'static str {
		match self {
			ModelType::TrieProb => "trie_prob",
			ModelType::TrieCount => "trie_count",
		}
	}

	/// Resolves a textual tag back to its variant.
	///
	/// # Errors
	/// Returns an error naming the tag if it matches no known variant.
	pub fn from_tag(tag: &str) -> Result<Self, String> {
		match tag {
			"trie_prob" => Ok(ModelType::TrieProb),
			"trie_count" => Ok(ModelType::TrieCount),
			other => Err(format!("Unknown model type '{}'", other)),
		}
	}
}

/// On-disk layout of a model binary: a typed header followed by the
/// index payload, postcard-encoded as one value.
#[derive(Serialize, Deserialize, Debug)]
pub struct ModelFile {
	pub model_type: ModelType,
	pub model: TrieModel,
}

/// Loads a model binary and resolves its variant.
///
/// This is the only place the crate touches the filesystem for model
/// data; everything after it operates on the memory-resident index.
///
/// # Errors
/// - file read or deserialization failure
/// - a payload that decodes but violates the index invariants
/// - a variant the predictor cannot consume (`TrieCount`)
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<TrieModel, Box<dyn std::error::Error>> {
	let bytes = std::fs::read(path)?;
	let file: ModelFile = postcard::from_bytes(&bytes)?;

	match file.model_type {
		ModelType::TrieProb => {
			file.model.validate()?;
			Ok(file.model)
		}
		ModelType::TrieCount => Err(format!(
			"Model type '{}' is not supported for prediction",
			file.model_type.tag()
		)
		.into()),
	}
}
