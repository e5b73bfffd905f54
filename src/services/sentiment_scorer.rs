//! Headline sentiment scoring.
//!
//! The pipeline only depends on the [`SentimentScorer`] trait. The bundled
//! implementation runs VADER locally and nudges the compound score with
//! finance vocabulary that the general-purpose lexicon underweights.

use vader_sentiment::SentimentIntensityAnalyzer;

use crate::errors::AppError;
use crate::models::{SentimentLabel, SentimentScore};

/// Longest text passed to the analyzer, in characters.
pub const MAX_TEXT_CHARS: usize = 512;

/// Scores at or beyond this magnitude get a directional label.
pub const LABEL_THRESHOLD: f64 = 0.05;

const KEYWORD_WEIGHT: f64 = 0.5;

const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("surge", 0.4),
    ("surges", 0.4),
    ("soar", 0.5),
    ("soars", 0.5),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("jump", 0.3),
    ("jumps", 0.3),
    ("beat", 0.3),
    ("beats", 0.3),
    ("upgrade", 0.3),
    ("upgraded", 0.3),
    ("outperform", 0.3),
    ("record high", 0.4),
    ("all-time high", 0.5),
    ("buyback", 0.2),
    ("raises guidance", 0.4),
    ("bullish", 0.5),
    ("breakthrough", 0.4),
    ("partnership", 0.2),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("crash", -0.5),
    ("crashes", -0.5),
    ("tumble", -0.4),
    ("tumbles", -0.4),
    ("slump", -0.4),
    ("slumps", -0.4),
    ("miss", -0.3),
    ("misses", -0.3),
    ("downgrade", -0.3),
    ("downgraded", -0.3),
    ("lawsuit", -0.4),
    ("recall", -0.3),
    ("probe", -0.3),
    ("fraud", -0.5),
    ("layoffs", -0.3),
    ("cuts guidance", -0.4),
    ("sell-off", -0.4),
    ("bearish", -0.5),
];

/// Black-box text classifier producing a label and a score in [-1, 1].
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<SentimentScore, AppError>;
}

/// Map a continuous score onto the discrete label set.
pub fn label_for_score(score: f64) -> SentimentLabel {
    if score >= LABEL_THRESHOLD {
        SentimentLabel::Bullish
    } else if score <= -LABEL_THRESHOLD {
        SentimentLabel::Bearish
    } else {
        SentimentLabel::Neutral
    }
}

pub struct VaderSentimentScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderSentimentScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    fn keyword_boost(text: &str) -> f64 {
        let words: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let padded = format!(" {} ", words.join(" "));

        BULLISH_KEYWORDS
            .iter()
            .chain(BEARISH_KEYWORDS.iter())
            .filter(|(keyword, _)| padded.contains(&format!(" {} ", keyword)))
            .map(|(_, weight)| weight)
            .sum()
    }
}

impl Default for VaderSentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for VaderSentimentScorer {
    fn score(&self, text: &str) -> Result<SentimentScore, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SentimentScore {
                label: SentimentLabel::Neutral,
                score: 0.0,
            });
        }

        let text: String = text.chars().take(MAX_TEXT_CHARS).collect();
        let scores = self.analyzer.polarity_scores(&text);
        let compound = scores.get("compound").copied().unwrap_or(0.0);

        let score = (compound + Self::keyword_boost(&text) * KEYWORD_WEIGHT).clamp(-1.0, 1.0);

        Ok(SentimentScore {
            label: label_for_score(score),
            score,
        })
    }
}
