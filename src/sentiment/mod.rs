// Lexicon sentiment: substring marker counting per document and corpus-wide
// polarity.

pub mod lexicon;
pub mod scorer;

pub use lexicon::SentimentLexicon;
pub use scorer::{CountingRule, DocumentSentiment, SentimentConfig, SentimentScorer, SentimentSummary};
