//! Terminal rendering for analysis results and topic groups.

use chrono::NaiveDate;
use feedpulse_core::{OverallSentiment, TopicGroups, TopicSummary};
use feedpulse_server::Mode;

const MAX_REMARK_CHARS: usize = 60;

/// Print topic summaries as a vertical card per topic group.
pub fn print_summaries(date: NaiveDate, mode: Mode, summaries: &[TopicSummary]) {
    let source = match mode {
        Mode::Live => "live responses",
        Mode::Historical => "historical dataset",
    };
    println!("=== {date} ({source}) ===");
    println!();

    for s in summaries {
        println!("{}", s.topic_group);
        println!("  {:<26} {}", "positive", s.positive_count);
        println!("  {:<26} {}", "neutral", s.neutral_count);
        println!("  {:<26} {}", "negative", s.negative_count);
        println!("  {:<26} {:+}", "overall", s.overall_score);
        if let Some(remark) = &s.example_positive_remark {
            println!("  {:<26} {}", "example positive", truncate(remark, MAX_REMARK_CHARS));
        }
        if let Some(remark) = &s.example_negative_remark {
            println!("  {:<26} {}", "example negative", truncate(remark, MAX_REMARK_CHARS));
        }
        println!();
    }

    let total: usize = summaries.iter().map(TopicSummary::total).sum();
    println!("{} topics, {total} responses", summaries.len());
}

/// Print score-based sentiment, one row per topic group.
pub fn print_overall(date: NaiveDate, overall: &[OverallSentiment]) {
    println!("=== {date} overall sentiment ===");
    println!();
    println!(
        "  {:<40} {:>7}  {:<8} {:>5} {:>5} {:>5} {:>9}",
        "topic", "score", "label", "pos", "neu", "neg", "sentences"
    );
    for o in overall {
        let score = o
            .overall_score
            .map_or_else(|| "-".to_string(), |s| format!("{s:.3}"));
        println!(
            "  {:<40} {:>7}  {:<8} {:>5} {:>5} {:>5} {:>9}",
            truncate(&o.topic_group, 40),
            score,
            o.label.as_str(),
            o.positive_count,
            o.neutral_count,
            o.negative_count,
            o.total_sentences
        );
    }
}

/// Print the topic id table, flagging ids claimed by more than one group.
pub fn print_topic_groups(topics: &TopicGroups) {
    for group in topics.groups() {
        let ids: Vec<String> = group.ids.iter().map(i64::to_string).collect();
        println!("  {:<40} {}", truncate(&group.name, 40), ids.join(", "));
    }

    let overlaps = topics.overlaps();
    if overlaps.is_empty() {
        return;
    }
    println!();
    println!("Overlapping ids (first group wins)");
    for (id, groups) in overlaps {
        println!("  {:<6} {}", id, groups.join(" | "));
    }
}

/// Shorten to `max` characters, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
