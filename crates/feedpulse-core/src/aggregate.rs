//! Per-topic aggregation of classified feedback.
//!
//! Three views over the same records:
//! - [`summarize_live`]: counts plus first positive/negative exemplar remark,
//!   topics in first-appearance order.
//! - [`summarize_historical`]: the (topic, sentiment) pivot, topics sorted.
//! - [`overall_by_topic`]: mean of the continuous sentiment score per topic.
//!
//! Empty input always yields empty output.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::record::{FeedbackRecord, NEUTRAL_BAND, SentimentLabel};

/// Sentiment counts for one topic group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    pub topic_group: String,
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
    /// `positive_count - negative_count`.
    pub overall_score: i64,
    pub example_positive_remark: Option<String>,
    pub example_negative_remark: Option<String>,
}

impl TopicSummary {
    fn new(topic_group: &str) -> Self {
        Self {
            topic_group: topic_group.to_string(),
            positive_count: 0,
            neutral_count: 0,
            negative_count: 0,
            overall_score: 0,
            example_positive_remark: None,
            example_negative_remark: None,
        }
    }

    fn tally(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive_count += 1,
            SentimentLabel::Neutral => self.neutral_count += 1,
            SentimentLabel::Negative => self.negative_count += 1,
        }
        self.overall_score = self.positive_count as i64 - self.negative_count as i64;
    }

    /// Number of records counted into this summary.
    pub fn total(&self) -> usize {
        self.positive_count + self.neutral_count + self.negative_count
    }
}

/// Live-mode summary: groups in first-appearance order, with the first
/// positive and first negative remark of each group as exemplars.
pub fn summarize_live(records: &[FeedbackRecord]) -> Vec<TopicSummary> {
    let mut summaries: Vec<TopicSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let i = *index.entry(record.topic_group.as_str()).or_insert_with(|| {
            summaries.push(TopicSummary::new(&record.topic_group));
            summaries.len() - 1
        });
        let summary = &mut summaries[i];
        summary.tally(record.sentiment_label);

        let exemplar = match record.sentiment_label {
            SentimentLabel::Positive => &mut summary.example_positive_remark,
            SentimentLabel::Negative => &mut summary.example_negative_remark,
            SentimentLabel::Neutral => continue,
        };
        if exemplar.is_none() {
            *exemplar = Some(record.remark_text.clone());
        }
    }

    summaries
}

/// Historical-mode summary: the (topic, sentiment) count pivot, topics sorted.
pub fn summarize_historical(records: &[FeedbackRecord]) -> Vec<TopicSummary> {
    let mut by_topic: BTreeMap<&str, TopicSummary> = BTreeMap::new();
    for record in records {
        by_topic
            .entry(record.topic_group.as_str())
            .or_insert_with(|| TopicSummary::new(&record.topic_group))
            .tally(record.sentiment_label);
    }
    by_topic.into_values().collect()
}

/// Label for the mean sentence score of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverallLabel {
    Positive,
    Neutral,
    Negative,
}

impl OverallLabel {
    pub fn from_mean(mean: f64) -> Self {
        if mean > NEUTRAL_BAND {
            Self::Positive
        } else if mean < -NEUTRAL_BAND {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

/// Score-based sentiment for one topic group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallSentiment {
    pub topic_group: String,
    /// Mean of the present scores, rounded to 3 decimals. `None` when no
    /// record in the group carries a score.
    pub overall_score: Option<f64>,
    pub label: OverallLabel,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub total_sentences: usize,
}

#[derive(Default)]
struct ScoreAccum {
    sum: f64,
    scored: usize,
    positive: usize,
    negative: usize,
    zero: usize,
    total: usize,
}

/// Sentence-level scoring: mean `sentiment_score` per topic, topics sorted.
///
/// Counts are of strictly positive, strictly negative and exactly-zero
/// scores; rows without a finite score only count towards `total_sentences`.
pub fn overall_by_topic(records: &[FeedbackRecord]) -> Vec<OverallSentiment> {
    let mut by_topic: BTreeMap<&str, ScoreAccum> = BTreeMap::new();

    for record in records {
        let acc = by_topic.entry(record.topic_group.as_str()).or_default();
        acc.total += 1;
        if let Some(score) = record.sentiment_score.filter(|s| s.is_finite()) {
            acc.sum += score;
            acc.scored += 1;
            if score > 0.0 {
                acc.positive += 1;
            } else if score < 0.0 {
                acc.negative += 1;
            } else {
                acc.zero += 1;
            }
        }
    }

    by_topic
        .into_iter()
        .map(|(topic, acc)| {
            let mean = (acc.scored > 0).then(|| acc.sum / acc.scored as f64);
            OverallSentiment {
                topic_group: topic.to_string(),
                overall_score: mean.map(round3),
                label: mean.map_or(OverallLabel::Neutral, OverallLabel::from_mean),
                positive_count: acc.positive,
                negative_count: acc.negative,
                neutral_count: acc.zero,
                total_sentences: acc.total,
            }
        })
        .collect()
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Parallel per-topic count arrays for the sentiment chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub topics: Vec<String>,
    pub positive: Vec<usize>,
    pub neutral: Vec<usize>,
    pub negative: Vec<usize>,
}

/// Pivot records into [`ChartSeries`], topics sorted ascending.
pub fn chart_series(records: &[FeedbackRecord]) -> ChartSeries {
    let mut series = ChartSeries::default();
    for summary in summarize_historical(records) {
        series.topics.push(summary.topic_group);
        series.positive.push(summary.positive_count);
        series.neutral.push(summary.neutral_count);
        series.negative.push(summary.negative_count);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(topic: &str, label: SentimentLabel, remark: &str, score: Option<f64>) -> FeedbackRecord {
        FeedbackRecord {
            timestamp: NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            remark_text: remark.to_string(),
            topic_id: None,
            topic_group: topic.to_string(),
            sentiment_label: label,
            sentiment_score: score,
            session: None,
        }
    }

    fn scored(topic: &str, score: f64) -> FeedbackRecord {
        record(topic, SentimentLabel::from_score(score), "", Some(score))
    }

    use SentimentLabel::{Negative, Neutral, Positive};

    fn sample() -> Vec<FeedbackRecord> {
        vec![
            record("Wi-Fi", Negative, "network kept dropping", None),
            record("Labs", Positive, "loved the lab", None),
            record("Wi-Fi", Negative, "no internet", None),
            record("Wi-Fi", Positive, "wifi fixed quickly", None),
            record("Labs", Neutral, "labs were ok", None),
            record("Labs", Positive, "more labs please", None),
        ]
    }

    #[test]
    fn live_summary_keeps_first_appearance_order() {
        let summaries = summarize_live(&sample());
        let topics: Vec<&str> = summaries.iter().map(|s| s.topic_group.as_str()).collect();
        assert_eq!(topics, vec!["Wi-Fi", "Labs"]);
    }

    #[test]
    fn live_summary_picks_first_exemplars() {
        let summaries = summarize_live(&sample());
        let wifi = &summaries[0];
        assert_eq!(wifi.example_negative_remark.as_deref(), Some("network kept dropping"));
        assert_eq!(wifi.example_positive_remark.as_deref(), Some("wifi fixed quickly"));

        let labs = &summaries[1];
        assert_eq!(labs.example_positive_remark.as_deref(), Some("loved the lab"));
        assert_eq!(labs.example_negative_remark, None);
    }

    #[test]
    fn live_summary_counts() {
        let summaries = summarize_live(&sample());
        let wifi = &summaries[0];
        assert_eq!((wifi.positive_count, wifi.neutral_count, wifi.negative_count), (1, 0, 2));
        assert_eq!(wifi.overall_score, -1);
        let labs = &summaries[1];
        assert_eq!((labs.positive_count, labs.neutral_count, labs.negative_count), (2, 1, 0));
        assert_eq!(labs.overall_score, 2);
    }

    #[test]
    fn historical_summary_sorted_without_exemplars() {
        let summaries = summarize_historical(&sample());
        let topics: Vec<&str> = summaries.iter().map(|s| s.topic_group.as_str()).collect();
        assert_eq!(topics, vec!["Labs", "Wi-Fi"]);
        assert!(summaries.iter().all(|s| s.example_positive_remark.is_none()));
    }

    #[test]
    fn counts_partition_each_group() {
        let records = sample();
        for summaries in [summarize_live(&records), summarize_historical(&records)] {
            for s in &summaries {
                let in_group = records.iter().filter(|r| r.topic_group == s.topic_group).count();
                assert_eq!(s.total(), in_group);
                assert_eq!(s.overall_score, s.positive_count as i64 - s.negative_count as i64);
            }
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(summarize_live(&[]).is_empty());
        assert!(summarize_historical(&[]).is_empty());
        assert!(overall_by_topic(&[]).is_empty());
        assert_eq!(chart_series(&[]), ChartSeries::default());
    }

    #[test]
    fn mean_labelling_thresholds() {
        let records = vec![
            scored("a", 0.1),
            scored("a", 0.2),
            scored("b", -0.1),
            scored("b", 0.0),
            scored("c", -0.2),
            scored("c", -0.1),
        ];
        let overall = overall_by_topic(&records);
        let labels: Vec<OverallLabel> = overall.iter().map(|o| o.label).collect();
        assert_eq!(
            labels,
            vec![OverallLabel::Positive, OverallLabel::Neutral, OverallLabel::Negative]
        );
        assert_eq!(overall[0].overall_score, Some(0.15));
        assert_eq!(overall[1].overall_score, Some(-0.05));
        assert_eq!(overall[2].overall_score, Some(-0.15));
    }

    #[test]
    fn overall_counts_sign_of_scores() {
        let records = vec![
            scored("a", 0.4),
            scored("a", 0.0),
            scored("a", -0.3),
            scored("a", 0.2),
            record("a", Neutral, "", None),
        ];
        let overall = &overall_by_topic(&records)[0];
        assert_eq!(overall.positive_count, 2);
        assert_eq!(overall.negative_count, 1);
        assert_eq!(overall.neutral_count, 1);
        assert_eq!(overall.total_sentences, 5);
        assert_eq!(overall.overall_score, Some(0.075));
        assert_eq!(overall.label, OverallLabel::Positive);
    }

    #[test]
    fn overall_without_scores_is_neutral_and_unscored() {
        let records = vec![record("a", Positive, "", None)];
        let overall = &overall_by_topic(&records)[0];
        assert_eq!(overall.overall_score, None);
        assert_eq!(overall.label, OverallLabel::Neutral);
        assert_eq!(overall.total_sentences, 1);
    }

    #[test]
    fn non_finite_scores_are_ignored() {
        let records = vec![scored("a", f64::NAN), scored("a", 0.4), scored("a", f64::INFINITY)];
        let overall = &overall_by_topic(&records)[0];
        assert_eq!(overall.overall_score, Some(0.4));
        assert_eq!(overall.label, OverallLabel::Positive);
        assert_eq!(overall.positive_count, 1);
        assert_eq!(overall.neutral_count, 0);
        assert_eq!(overall.total_sentences, 3);
    }

    #[test]
    fn chart_series_is_parallel_and_sorted() {
        let series = chart_series(&sample());
        assert_eq!(series.topics, vec!["Labs", "Wi-Fi"]);
        assert_eq!(series.positive, vec![2, 1]);
        assert_eq!(series.neutral, vec![1, 0]);
        assert_eq!(series.negative, vec![0, 2]);
    }

    #[test]
    fn overall_label_serializes_capitalized() {
        let json = serde_json::to_string(&OverallLabel::Negative).unwrap();
        assert_eq!(json, "\"Negative\"");
    }
}
