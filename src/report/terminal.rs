// Colored terminal output for analysis reports.
//
// All terminal-specific formatting lives here; main.rs delegates to it after
// the pipeline has finished.

use colored::Colorize;

use super::summary::AnalysisReport;
use crate::error::Warning;
use crate::input::ColumnProfile;
use crate::sentiment::DocumentSentiment;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Counts characters, not bytes, so CJK text never splits mid-character.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Display the full analysis report.
pub fn display_report(report: &AnalysisReport) {
    println!(
        "\n{}",
        format!(
            "=== Survey Analysis ({} documents, {} terms) ===",
            report.documents, report.vocabulary_size
        )
        .bold()
    );
    println!(
        "  {}",
        format!(
            "topics={} clusters={} seed={} counting={:?}  generated {}",
            report.settings.n_topics,
            report.settings.n_clusters,
            report.settings.seed,
            report.settings.counting,
            report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        )
        .dimmed()
    );

    display_topics(report);
    display_sentiment_summary(report);
    display_clusters(report);
    display_warnings(&report.warnings);
}

fn display_topics(report: &AnalysisReport) {
    println!("\n{}", "Topics".bold());
    println!(
        "  {:>5}  {:>10}  {}",
        "Topic".dimmed(),
        "Prevalence".dimmed(),
        "Keywords".dimmed(),
    );
    println!("  {}", "-".repeat(72).dimmed());

    for topic in &report.topics {
        let keywords = truncate_chars(&topic.keywords.join(", "), 56);
        println!(
            "  {:>5}  {:>9.1}%  {}",
            topic.topic_id,
            topic.prevalence * 100.0,
            keywords
        );
    }
}

fn display_sentiment_summary(report: &AnalysisReport) {
    let s = &report.sentiment;
    println!("\n{}", "Sentiment".bold());

    let polarity = format!("{:+.2}", s.polarity_score);
    let colored_polarity = if s.polarity_score > 0.1 {
        polarity.green()
    } else if s.polarity_score < -0.1 {
        polarity.red()
    } else {
        polarity.normal()
    };
    println!(
        "  Polarity: {}  ({} positive / {} negative matches, {} neutral documents)",
        colored_polarity, s.positive_count, s.negative_count, s.neutral_count
    );

    if !s.top_positive.is_empty() {
        println!("  {} {}", "+".green(), format_markers(&s.top_positive));
    }
    if !s.top_negative.is_empty() {
        println!("  {} {}", "-".red(), format_markers(&s.top_negative));
    }
}

fn display_clusters(report: &AnalysisReport) {
    println!("\n{}", "Clusters".bold());
    println!(
        "  {:>7}  {:>5}  {:>6}  {:<20}  {:>9}  {}",
        "Cluster".dimmed(),
        "Size".dimmed(),
        "Share".dimmed(),
        "".dimmed(),
        "Sentiment".dimmed(),
        "Topic".dimmed(),
    );
    println!("  {}", "-".repeat(72).dimmed());

    for cluster in &report.clusters {
        let bar_len = (cluster.percentage / 5.0).round() as usize;
        let topic = cluster
            .dominant_topic_id
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>7}  {:>5}  {:>5.1}%  {:<20}  {:>+9.2}  {}",
            cluster.cluster_id,
            cluster.size,
            cluster.percentage,
            "#".repeat(bar_len.min(20)).cyan(),
            cluster.mean_sentiment,
            topic,
        );

        if !cluster.attribute_means.is_empty() {
            let means: Vec<String> = cluster
                .attribute_means
                .iter()
                .map(|(name, value)| format!("{name}={value:.2}"))
                .collect();
            println!("           {}", means.join("  ").dimmed());
        }
        if !cluster.top_features.is_empty() {
            let features: Vec<String> = cluster
                .top_features
                .iter()
                .map(|(name, value)| format!("{name} ({value:.2})"))
                .collect();
            println!("           {}", features.join(", ").dimmed());
        }
    }
}

fn display_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!();
    for w in warnings {
        println!("  {} {}", "!".yellow().bold(), w);
    }
}

/// Display the column inventory of an input file.
pub fn display_schema(columns: &[ColumnProfile]) {
    println!(
        "\n{}",
        format!("=== Columns ({}) ===", columns.len()).bold()
    );
    println!(
        "  {:<32} {:>8} {:>8} {:>8}  {}",
        "Column".dimmed(),
        "Numeric".dimmed(),
        "Text".dimmed(),
        "Empty".dimmed(),
        "Suggested".dimmed(),
    );
    println!("  {}", "-".repeat(72).dimmed());

    for col in columns {
        let suggestion = if col.looks_numeric() {
            "attribute".cyan()
        } else {
            "text".green()
        };
        println!(
            "  {:<32} {:>8} {:>8} {:>8}  {}",
            truncate_chars(&col.name, 30),
            col.numeric,
            col.text,
            col.empty,
            suggestion,
        );
    }
}

/// Display the sentiment breakdown of a single text.
pub fn display_document_sentiment(text: &str, result: &DocumentSentiment) {
    println!("\n  {}", truncate_chars(text, 120).dimmed());
    let score = format!("{:+}", result.score);
    let colored_score = match result.score {
        s if s > 0 => score.green(),
        s if s < 0 => score.red(),
        _ => score.normal(),
    };
    println!(
        "  Score: {}  (positive {}, negative {})",
        colored_score, result.positive, result.negative
    );
    if !result.positive_markers.is_empty() {
        println!("  {} {}", "+".green(), result.positive_markers.join(", "));
    }
    if !result.negative_markers.is_empty() {
        println!("  {} {}", "-".red(), result.negative_markers.join(", "));
    }
}

fn format_markers(markers: &[(String, usize)]) -> String {
    markers
        .iter()
        .map(|(m, c)| format!("{m} ({c})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("服务很好服务很好", 4), "服务很好...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_format_markers() {
        let m = vec![("good".to_string(), 3), ("fast".to_string(), 1)];
        assert_eq!(format_markers(&m), "good (3), fast (1)");
    }
}
