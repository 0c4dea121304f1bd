//! Lexicon-based sentiment scoring.
//!
//! Sums word valences over the remark, flips and damps a valence when one of
//! the three preceding tokens is a negation, nudges it away from zero after a
//! booster word, then squashes the sum into `[-1, 1]` with
//! `s / sqrt(s² + ALPHA)`. Labels use the shared ±0.05 neutral band.
//!
//! This is the default sentiment classifier when no ONNX model is configured.

use std::collections::HashMap;

use crate::classify::{Sentiment, SentimentClassifier};

const ALPHA: f64 = 15.0;
const NEGATION_SCALAR: f64 = -0.74;
const BOOST: f64 = 0.293;
const NEGATION_WINDOW: usize = 3;

const POSITIVE: &[(&str, f64)] = &[
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("best", 3.2),
    ("better", 1.9),
    ("clear", 1.6),
    ("effective", 2.1),
    ("engaging", 1.9),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("excellent", 2.7),
    ("fantastic", 2.6),
    ("fine", 0.8),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("helpful", 1.7),
    ("informative", 1.8),
    ("interactive", 1.4),
    ("interesting", 1.7),
    ("like", 1.5),
    ("liked", 1.8),
    ("love", 3.2),
    ("loved", 2.9),
    ("nice", 1.8),
    ("ok", 0.9),
    ("okay", 0.9),
    ("perfect", 2.7),
    ("satisfied", 1.8),
    ("superb", 2.7),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("useful", 1.9),
    ("well", 1.1),
    ("wonderful", 2.7),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("awful", -2.0),
    ("bad", -2.5),
    ("boring", -1.3),
    ("confusing", -1.3),
    ("difficult", -1.5),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("hate", -2.7),
    ("insufficient", -1.5),
    ("issue", -1.0),
    ("issues", -1.0),
    ("lack", -1.4),
    ("lacking", -1.4),
    ("noisy", -1.0),
    ("poor", -2.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("rushed", -1.2),
    ("slow", -1.0),
    ("terrible", -2.1),
    ("tired", -1.6),
    ("tiring", -1.2),
    ("unclear", -1.4),
    ("waste", -1.8),
    ("worst", -3.1),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "without", "cannot", "can't", "cant", "don't", "dont",
    "didn't", "didnt", "isn't", "isnt", "wasn't", "wasnt", "weren't", "werent",
];

const BOOSTERS: &[&str] = &["very", "really", "extremely", "highly", "so", "super"];

/// Word-lexicon sentiment scorer.
#[derive(Debug, Clone)]
pub struct LexiconSentiment {
    valences: HashMap<String, f64>,
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        let valences = POSITIVE
            .iter()
            .chain(NEGATIVE)
            .map(|(w, v)| ((*w).to_string(), *v))
            .collect();
        Self { valences }
    }
}

impl LexiconSentiment {
    /// Add or override a word's valence.
    pub fn with_word(mut self, word: &str, valence: f64) -> Self {
        self.valences.insert(word.to_lowercase(), valence);
        self
    }

    /// Compound polarity score in `[-1, 1]`.
    pub fn score(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        let mut sum = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.valences.get(token.as_str()) else {
                continue;
            };
            let mut valence = base;

            if i > 0 && BOOSTERS.contains(&tokens[i - 1].as_str()) {
                valence += BOOST.copysign(valence);
            }

            let window = &tokens[i.saturating_sub(NEGATION_WINDOW)..i];
            if window.iter().any(|t| NEGATIONS.contains(&t.as_str())) {
                valence *= NEGATION_SCALAR;
            }

            sum += valence;
        }

        normalize(sum)
    }
}

impl SentimentClassifier for LexiconSentiment {
    fn classify(&self, text: &str) -> anyhow::Result<Sentiment> {
        Ok(Sentiment::from_score(self.score(text)))
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize(sum: f64) -> f64 {
    if sum == 0.0 {
        return 0.0;
    }
    (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}
