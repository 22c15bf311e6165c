// Unit tests for the vectorizer and topic model.
//
// Exercises the public contract: empty-vocabulary failure, fixed vocabulary
// after fit, topic-weight rows on the simplex, seeded determinism, keyword
// ordering and the primary-topic tie rule.

use canvass::error::PipelineError;
use canvass::topics::{
    primary_topic, TermMatrix, TfIdfVectorizer, TopicConfig, TopicModel, VectorizerConfig,
};

fn docs(raw: &[&str]) -> Vec<Vec<String>> {
    raw.iter()
        .map(|d| d.split_whitespace().map(str::to_string).collect())
        .collect()
}

fn survey_tokens() -> Vec<Vec<String>> {
    let raw = [
        "parking expensive parking fee",
        "fee parking cost",
        "cost expensive fee",
        "nurse kind nurse helpful",
        "doctor kind helpful",
        "nurse doctor helpful",
        "wait queue long wait",
        "queue long registration",
        "registration wait queue",
    ];
    raw.iter()
        .cycle()
        .take(raw.len() * 3)
        .map(|d| d.split_whitespace().map(str::to_string).collect())
        .collect()
}

fn fit(n_topics: usize, seed: u64) -> (TopicModel, canvass::topics::DocumentTopics) {
    let tokens = survey_tokens();
    let (v, m) = TfIdfVectorizer::fit_transform(&tokens, &VectorizerConfig::default()).unwrap();
    TopicModel::fit(&m, v.vocabulary(), &TopicConfig::new(n_topics).seed(seed)).unwrap()
}

// ============================================================
// Vectorizer
// ============================================================

#[test]
fn all_empty_documents_is_empty_vocabulary() {
    let empty: Vec<Vec<String>> = vec![vec![], vec![], vec![]];
    let err = TfIdfVectorizer::fit(&empty, &VectorizerConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyVocabulary));
}

#[test]
fn vocabulary_is_capped_and_stable() {
    let config = VectorizerConfig {
        max_features: 3,
        ..Default::default()
    };
    let corpus = docs(&["wait wait wait queue queue fee", "wait queue parking", "nurse"]);
    let v = TfIdfVectorizer::fit(&corpus, &config).unwrap();
    assert_eq!(v.vocabulary().len(), 3);
    // Most frequent: wait(4), queue(3), then fee/nurse/parking tie at 1 -> fee
    assert_eq!(v.vocabulary().terms(), &["fee", "queue", "wait"]);
    assert_eq!(v.vocabulary().id("queue"), Some(1));
    assert_eq!(v.vocabulary().id("nurse"), None);
}

#[test]
fn unseen_terms_transform_to_zero_vector() {
    let v = TfIdfVectorizer::fit(&docs(&["wait queue", "fee"]), &VectorizerConfig::default())
        .unwrap();
    let out = v.transform(&["brand".to_string(), "new".to_string()]);
    assert!(out.is_zero());
    assert_eq!(v.vocabulary().len(), 3);
}

// ============================================================
// Topic model
// ============================================================

#[test]
fn topic_weights_lie_on_the_simplex() {
    let (_, topics) = fit(3, 42);
    assert_eq!(topics.n_topics(), 3);
    for row in topics.to_rows() {
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "row sums to {sum}");
        assert!(row.iter().all(|w| *w >= 0.0));
    }
}

#[test]
fn fixed_seed_is_deterministic() {
    let (m1, t1) = fit(3, 5);
    let (m2, t2) = fit(3, 5);
    assert_eq!(t1.weights, t2.weights);
    for k in 0..3 {
        assert_eq!(m1.top_keywords(k, 4), m2.top_keywords(k, 4));
    }
}

#[test]
fn primary_topic_matches_argmax() {
    let (_, topics) = fit(3, 42);
    for (row, primary) in topics.to_rows().iter().zip(topics.primary_topics()) {
        let max = row.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(row[primary], max);
        assert!(row[..primary].iter().all(|w| *w < max));
    }
}

#[test]
fn primary_topic_tie_goes_to_lowest_index() {
    assert_eq!(primary_topic(&[0.5, 0.5]), 0);
    assert_eq!(primary_topic(&[0.2, 0.4, 0.4]), 1);
    assert_eq!(primary_topic(&[1.0]), 0);
}

#[test]
fn keywords_descend_and_are_bounded() {
    let (model, _) = fit(3, 42);
    for k in 0..model.n_topics() {
        let kw = model.top_keywords(k, 4);
        assert_eq!(kw.len(), 4);
        for pair in kw.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }
    assert!(model.top_keywords(99, 4).is_empty());
}

#[test]
fn topic_word_rows_are_distributions() {
    let (model, _) = fit(2, 42);
    let dist = model.topic_word_distribution();
    for row in dist.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn transform_handles_unseen_documents() {
    let tokens = survey_tokens();
    let (v, m) = TfIdfVectorizer::fit_transform(&tokens, &VectorizerConfig::default()).unwrap();
    let (model, _) = TopicModel::fit(&m, v.vocabulary(), &TopicConfig::new(3)).unwrap();

    let unseen = TermMatrix {
        rows: vec![
            v.transform(&["nurse".to_string(), "kind".to_string()]),
            v.transform(&["unknown".to_string()]),
        ],
        n_features: v.vocabulary().len(),
    };
    let topics = model.transform(&unseen);
    assert_eq!(topics.n_docs(), 2);
    // No known terms: uniform
    for w in topics.row(1) {
        assert!((w - 1.0 / 3.0).abs() < 1e-12);
    }
}

#[test]
fn topic_count_above_vocabulary_is_invalid() {
    let corpus = docs(&["wait queue", "fee"]);
    let (v, m) = TfIdfVectorizer::fit_transform(&corpus, &VectorizerConfig::default()).unwrap();
    let err = TopicModel::fit(&m, v.vocabulary(), &TopicConfig::new(4)).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidParameter(_)));
}
