// Text preparation: segmentation, normalization and stopword filtering.

pub mod stopwords;
pub mod tokenizer;
pub mod traits;

pub use stopwords::StopwordFilter;
pub use tokenizer::{RegexSegmenter, Tokenizer};
pub use traits::Segmenter;
