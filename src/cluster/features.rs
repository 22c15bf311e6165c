// Clustering feature matrix.
//
// Columns `topic_0..topic_{K-1}` hold the topic weights. Each fused attribute
// adds one column: missing values imputed with the attribute mean, then
// z-scored and multiplied by `attribute_weight`. A weight of 0 (the default)
// clusters on topics alone.

use ndarray::Array2;

use crate::corpus::Corpus;
use crate::topics::DocumentTopics;

/// Named feature matrix, one row per document.
#[derive(Debug, Clone)]
pub struct ClusterFeatures {
    pub names: Vec<String>,
    pub rows: Array2<f64>,
}

impl ClusterFeatures {
    /// Topic weights only.
    pub fn from_topics(topics: &DocumentTopics) -> Self {
        let names = (0..topics.n_topics()).map(|k| format!("topic_{k}")).collect();
        Self {
            names,
            rows: topics.weights.clone(),
        }
    }

    /// Topic weights fused with the named numeric attributes.
    ///
    /// Attributes that have no numeric value in any document are skipped.
    pub fn fused(
        topics: &DocumentTopics,
        corpus: &Corpus,
        attributes: &[String],
        attribute_weight: f64,
    ) -> Self {
        let base = Self::from_topics(topics);
        if attribute_weight <= 0.0 || attributes.is_empty() {
            return base;
        }

        let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
        for name in attributes {
            let values: Vec<Option<f64>> =
                corpus.documents.iter().map(|d| d.attribute(name)).collect();
            if let Some(column) = standardize(&values) {
                let scaled = column.into_iter().map(|v| v * attribute_weight).collect();
                columns.push((name.clone(), scaled));
            }
        }

        if columns.is_empty() {
            return base;
        }

        let n_docs = base.rows.nrows();
        let n_topics = base.rows.ncols();
        let mut rows = Array2::<f64>::zeros((n_docs, n_topics + columns.len()));
        for d in 0..n_docs {
            for k in 0..n_topics {
                rows[[d, k]] = base.rows[[d, k]];
            }
            for (j, (_, values)) in columns.iter().enumerate() {
                rows[[d, n_topics + j]] = values[d];
            }
        }

        let mut names = base.names;
        names.extend(columns.into_iter().map(|(n, _)| n));
        Self { names, rows }
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }
}

/// Mean-impute then z-score. `None` when no value is present.
fn standardize(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(mean)).collect();
    let var = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / imputed.len() as f64;
    let std = var.sqrt();

    Some(
        imputed
            .into_iter()
            .map(|v| if std > 0.0 { (v - mean) / std } else { 0.0 })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{FieldValue, Record, Schema};
    use ndarray::array;

    fn topics() -> DocumentTopics {
        DocumentTopics {
            weights: array![[0.9, 0.1], [0.2, 0.8], [0.5, 0.5]],
        }
    }

    fn corpus() -> Corpus {
        let schema = Schema::new(["text"]).with_attributes(["age", "city"]);
        let records = vec![
            Record::new(0)
                .with("text", FieldValue::Text("a".into()))
                .with("age", FieldValue::Number(20.0))
                .with("city", FieldValue::Text("Oslo".into())),
            Record::new(1)
                .with("text", FieldValue::Text("b".into()))
                .with("age", FieldValue::Number(40.0))
                .with("city", FieldValue::Text("Rome".into())),
            Record::new(2)
                .with("text", FieldValue::Text("c".into()))
                .with("city", FieldValue::Null),
        ];
        Corpus::from_records(schema, &records).unwrap().0
    }

    #[test]
    fn test_topics_only_when_weight_zero() {
        let f = ClusterFeatures::fused(&topics(), &corpus(), &["age".to_string()], 0.0);
        assert_eq!(f.names, vec!["topic_0", "topic_1"]);
        assert_eq!(f.rows.ncols(), 2);
    }

    #[test]
    fn test_fused_adds_standardized_numeric_columns() {
        let attrs = vec!["age".to_string(), "city".to_string()];
        let f = ClusterFeatures::fused(&topics(), &corpus(), &attrs, 2.0);
        // city has no numeric values and is skipped
        assert_eq!(f.names, vec!["topic_0", "topic_1", "age"]);
        // age: 20, 40, imputed 30 -> z = -1.2247, 1.2247, 0, times weight 2
        assert!((f.rows[[0, 2]] + 2.0 * 1.224_744_871).abs() < 1e-6);
        assert!((f.rows[[1, 2]] - 2.0 * 1.224_744_871).abs() < 1e-6);
        assert!(f.rows[[2, 2]].abs() < 1e-12);
    }
}
