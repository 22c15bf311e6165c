// Topic inference: TF-IDF document-term matrix and LDA over it.

pub mod lda;
pub mod tfidf;

pub use lda::{primary_topic, DocumentTopics, TopicConfig, TopicKeyword, TopicModel};
pub use tfidf::{SparseVector, TermMatrix, TfIdfVectorizer, Vocabulary, VectorizerConfig};
