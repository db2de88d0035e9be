use rs_predict_core::model::language_model::LanguageModel;
use rs_predict_core::model::predictor::{OovPolicy, Predictor, TieBreak};
use rs_predict_core::model::trie_model::TrieModel;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Assemble a small in-memory index from precomputed log-probabilities.
    // A real deployment loads one through the registry instead
    // (rs_predict_core::model::registry::load_model).
    let words = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];
    let model = TrieModel::from_parts(3, &words, &[
        (&["the", "quick"][..], -0.9),
        (&["the", "lazy"][..], -1.1),
        (&["quick", "brown"][..], -0.4),
        (&["the", "quick", "brown"][..], -0.2),
        (&["brown", "fox"][..], -0.3),
        (&["quick", "brown", "fox"][..], -0.1),
        (&["fox", "jumps"][..], -0.2),
        (&["jumps", "over"][..], -0.1),
        (&["over", "the"][..], -0.05),
        (&["lazy", "dog"][..], -0.3),
    ])?;

    // Build the predictor; the vocabulary cache is created here, once.
    // Tie-breaking is made deterministic so runs are reproducible.
    let predictor = Predictor::new(model)?
        .with_oov_policy(OovPolicy::Skip)
        .with_tie_break(TieBreak::LowestWordId);

    // Seed a context one word at a time. The state is ours, not the
    // predictor's: each session owns its own.
    let context = ["the", "quick", "brown"];
    let mut state = predictor.initial_state();
    for word in &context {
        predictor.feed(&mut state, word)?;
    }

    println!("Context: {}", context.join(" "));
    println!("Top-3 predictions:");
    for prediction in predictor.predict(&state, 3) {
        println!("  {}\tlogP={}", prediction.word, prediction.log_prob);
    }

    // Unknown words are skipped by default: the predictions are
    // unchanged after feeding one.
    predictor.feed(&mut state, "xyz123")?;
    println!("After an unknown word, the top prediction is still: {}",
        predictor.predict(&state, 1)[0].word);

    // Candidates always come from the last word's first-order
    // successor set; "dog" was never followed by anything here.
    let mut end_state = predictor.initial_state();
    predictor.feed(&mut end_state, "dog")?;
    println!("Predictions after 'dog': {}", predictor.predict(&end_state, 3).len());

    // An empty context never predicts, whatever k is.
    let empty = predictor.model().initial_state();
    assert!(predictor.predict(&empty, 5).is_empty());

    Ok(())
}
