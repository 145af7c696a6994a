use std::cmp::Ordering;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use crate::knowledge::{BiteInfo, KnowledgeBase};

/// Top prediction probability above which full guidance is shown.
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Probability bounds for the presentation tiers of the top predictions.
const TIER_HIGH_THRESHOLD: f32 = 0.75;
const TIER_MEDIUM_THRESHOLD: f32 = 0.4;

/// How many ranked predictions a resolution exposes for display.
const TOP_PREDICTION_COUNT: usize = 3;

/// One classifier output: a vocabulary label and its probability.
///
/// Produced fresh per inference call and discarded after resolution; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub class_name: String,
    pub probability: f32,
}

impl Prediction {
    pub fn new(class_name: impl Into<String>, probability: f32) -> Self {
        Self {
            class_name: class_name.into(),
            probability,
        }
    }
}

/// Presentation tier for a ranked prediction. Used for display coloring
/// only; never consulted by the matching logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::High => write!(f, "high"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::Low => write!(f, "low"),
        }
    }
}

impl ConfidenceTier {
    pub fn for_probability(probability: f32) -> Self {
        if probability > TIER_HIGH_THRESHOLD {
            ConfidenceTier::High
        } else if probability > TIER_MEDIUM_THRESHOLD {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// A prediction with its rank-order tier, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPrediction {
    pub class_name: String,
    pub probability: f32,
    pub tier: ConfidenceTier,
}

/// The resolved guidance view for one prediction list.
///
/// Guidance detail is gated behind the confidence threshold: below it,
/// [`Resolution::guidance`] returns `None` and only the identification name,
/// ranking, and top probability are available. Serialization goes through
/// the same gate, so a low-confidence resolution never emits guidance
/// detail either.
#[derive(Debug, Clone)]
pub struct Resolution {
    info: BiteInfo,
    matched_key: Option<String>,
    is_high_confidence: bool,
    top_predictions: Vec<RankedPrediction>,
}

impl Serialize for Resolution {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Resolution", 5)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("matchedKey", &self.matched_key)?;
        state.serialize_field("isHighConfidence", &self.is_high_confidence)?;
        state.serialize_field("guidance", &self.guidance())?;
        state.serialize_field("topPredictions", &self.top_predictions)?;
        state.end()
    }
}

impl Resolution {
    /// Identification shown to the user regardless of confidence.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Knowledge-base key the top label matched, if any.
    pub fn matched_key(&self) -> Option<&str> {
        self.matched_key.as_deref()
    }

    pub fn is_high_confidence(&self) -> bool {
        self.is_high_confidence
    }

    /// Full guidance record, only when the result is high-confidence.
    pub fn guidance(&self) -> Option<&BiteInfo> {
        if self.is_high_confidence {
            Some(&self.info)
        } else {
            None
        }
    }

    /// Up to the top three predictions in rank order.
    pub fn top_predictions(&self) -> &[RankedPrediction] {
        &self.top_predictions
    }

    /// Probability of the primary classification, if one exists.
    pub fn top_probability(&self) -> Option<f32> {
        self.top_predictions.first().map(|p| p.probability)
    }
}

/// Resolves a prediction list into a guidance view.
///
/// Predictions are ranked by descending probability with a stable sort, so
/// equal probabilities keep their original order. The top label, lowercased,
/// is matched against the knowledge base; a miss returns the fallback record
/// renamed to the raw top label. An empty list resolves to the fallback
/// record under its own name.
pub fn resolve(predictions: &[Prediction], kb: &KnowledgeBase) -> Resolution {
    let mut ranked: Vec<Prediction> = predictions.to_vec();
    ranked.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });

    let top_predictions: Vec<RankedPrediction> = ranked
        .iter()
        .take(TOP_PREDICTION_COUNT)
        .map(|p| RankedPrediction {
            class_name: p.class_name.clone(),
            probability: p.probability,
            tier: ConfidenceTier::for_probability(p.probability),
        })
        .collect();

    let Some(top) = ranked.first() else {
        return Resolution {
            info: kb.fallback().clone(),
            matched_key: None,
            is_high_confidence: false,
            top_predictions,
        };
    };

    let normalized = top.class_name.to_lowercase();
    let (matched_key, info) = match kb.match_label(&normalized) {
        Some((key, info)) => (Some(key.to_string()), info.clone()),
        None => {
            // Keep the raw label so the user sees what the model actually said.
            let mut fallback = kb.fallback().clone();
            fallback.name = top.class_name.clone();
            (None, fallback)
        }
    };

    Resolution {
        info,
        matched_key,
        is_high_confidence: top.probability > HIGH_CONFIDENCE_THRESHOLD,
        top_predictions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Severity;

    fn kb() -> &'static KnowledgeBase {
        KnowledgeBase::builtin()
    }

    #[test]
    fn test_tier_boundaries_are_exclusive() {
        assert_eq!(ConfidenceTier::for_probability(0.76), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::for_probability(0.75), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::for_probability(0.41), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::for_probability(0.4), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::for_probability(0.0), ConfidenceTier::Low);
    }

    #[test]
    fn test_confidence_gate_is_exclusive() {
        let low = resolve(&[Prediction::new("Tick", 0.6)], kb());
        assert!(!low.is_high_confidence());
        assert!(low.guidance().is_none());

        let high = resolve(&[Prediction::new("Tick", 0.601)], kb());
        assert!(high.is_high_confidence());
        assert!(high.guidance().is_some());
    }

    #[test]
    fn test_ranking_is_stable_for_ties() {
        let predictions = [
            Prediction::new("first", 0.2),
            Prediction::new("second", 0.5),
            Prediction::new("third", 0.2),
            Prediction::new("fourth", 0.2),
        ];
        let resolution = resolve(&predictions, kb());
        let names: Vec<&str> = resolution
            .top_predictions()
            .iter()
            .map(|p| p.class_name.as_str())
            .collect();
        // Descending by probability; the tied 0.2 entries keep input order.
        assert_eq!(names, vec!["second", "first", "third"]);
    }

    #[test]
    fn test_mosquito_scenario() {
        let predictions = [
            Prediction::new("Mosquito Bite", 0.82),
            Prediction::new("Ant Bite", 0.10),
            Prediction::new("Tick", 0.08),
        ];
        let resolution = resolve(&predictions, kb());
        assert_eq!(resolution.matched_key(), Some("mosquito"));
        assert!(resolution.is_high_confidence());
        assert_eq!(resolution.name(), "Mosquito Bite");
        let guidance = resolution.guidance().unwrap();
        assert_eq!(guidance.severity, Severity::Low);
        assert_eq!(resolution.top_predictions().len(), 3);
        assert_eq!(resolution.top_predictions()[0].tier, ConfidenceTier::High);
    }

    #[test]
    fn test_unmatched_label_falls_back_with_raw_name() {
        let resolution = resolve(&[Prediction::new("Unknown Marking", 0.35)], kb());
        assert_eq!(resolution.matched_key(), None);
        assert!(!resolution.is_high_confidence());
        // Raw, non-normalized label.
        assert_eq!(resolution.name(), "Unknown Marking");
        assert!(resolution.guidance().is_none());
        assert_eq!(resolution.top_probability(), Some(0.35));
    }

    #[test]
    fn test_key_containing_label_matches() {
        let resolution = resolve(&[Prediction::new("Bed", 0.9)], kb());
        assert_eq!(resolution.matched_key(), Some("bed bug"));
        assert_eq!(resolution.name(), "Bed Bug Bite");
    }

    #[test]
    fn test_empty_predictions_resolve_to_fallback() {
        let resolution = resolve(&[], kb());
        assert_eq!(resolution.name(), "Unidentified Bite");
        assert!(!resolution.is_high_confidence());
        assert!(resolution.top_predictions().is_empty());
        assert_eq!(resolution.top_probability(), None);
    }

    #[test]
    fn test_serialization_respects_the_gate() {
        let low = resolve(&[Prediction::new("Snake", 0.5)], kb());
        let json = serde_json::to_value(&low).unwrap();
        assert!(json["guidance"].is_null());
        assert_eq!(json["name"], "Snake Bite");

        let high = resolve(&[Prediction::new("Snake", 0.9)], kb());
        let json = serde_json::to_value(&high).unwrap();
        assert_eq!(json["guidance"]["severity"], "high");
        assert_eq!(json["topPredictions"][0]["tier"], "high");
    }

    #[test]
    fn test_top_list_caps_at_three() {
        let predictions: Vec<Prediction> = (0..6)
            .map(|i| Prediction::new(format!("class_{}", i), 0.1 * i as f32))
            .collect();
        let resolution = resolve(&predictions, kb());
        assert_eq!(resolution.top_predictions().len(), 3);
        let probs: Vec<f32> = resolution
            .top_predictions()
            .iter()
            .map(|p| p.probability)
            .collect();
        assert!(probs.windows(2).all(|w| w[0] >= w[1]));
    }
}
