use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// How urgently a bite of this kind typically needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// First-aid guidance record for one bite type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiteInfo {
    /// Human-readable identification shown to the user.
    pub name: String,
    pub symptoms: Vec<String>,
    pub treatment: Vec<String>,
    pub seek_doctor: Vec<String>,
    pub severity: Severity,
}

/// Returned when a knowledge base fails its construction invariants.
#[derive(Debug)]
pub struct InvalidKnowledgeBase(String);

impl fmt::Display for InvalidKnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid knowledge base: {}", self.0)
    }
}

impl std::error::Error for InvalidKnowledgeBase {}

/// Static mapping from lowercase bite-type keys to guidance records.
///
/// Entries keep their declaration order, and label matching scans them in
/// that order. Keys must be unique and lowercase, and the reserved
/// [`KnowledgeBase::FALLBACK_KEY`] entry must be present; both are enforced
/// at construction. The base is built once at process start and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<(String, BiteInfo)>,
    fallback_idx: usize,
}

impl KnowledgeBase {
    /// Reserved key whose record is returned when no bite type matches.
    pub const FALLBACK_KEY: &'static str = "unknown";

    pub fn new(entries: Vec<(String, BiteInfo)>) -> Result<Self, InvalidKnowledgeBase> {
        for (i, (key, _)) in entries.iter().enumerate() {
            if key.is_empty() {
                return Err(InvalidKnowledgeBase("empty key".to_string()));
            }
            if *key != key.to_lowercase() {
                return Err(InvalidKnowledgeBase(format!("key '{}' is not lowercase", key)));
            }
            if entries[..i].iter().any(|(k, _)| k == key) {
                return Err(InvalidKnowledgeBase(format!("duplicate key '{}'", key)));
            }
        }
        let fallback_idx = entries
            .iter()
            .position(|(k, _)| k == Self::FALLBACK_KEY)
            .ok_or_else(|| {
                InvalidKnowledgeBase(format!("missing '{}' fallback entry", Self::FALLBACK_KEY))
            })?;
        Ok(Self {
            entries,
            fallback_idx,
        })
    }

    /// The built-in base covering the classifier's vocabulary.
    pub fn builtin() -> &'static KnowledgeBase {
        &BITE_DATABASE
    }

    /// Looks up a record by its exact key.
    pub fn get(&self, key: &str) -> Option<&BiteInfo> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, info)| info)
    }

    /// Matches a lowercased classifier label against the keys.
    ///
    /// A key matches when the label contains it or it contains the label
    /// (bidirectional substring). The first matching key in declaration
    /// order wins; overlapping keys are resolved by that order alone. The
    /// reserved fallback key never participates in matching, so labels the
    /// vocabulary doesn't cover fall through to the caller's fallback
    /// handling instead of silently aliasing onto it.
    pub fn match_label(&self, normalized_label: &str) -> Option<(&str, &BiteInfo)> {
        if normalized_label.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .filter(|(key, _)| key != Self::FALLBACK_KEY)
            .find(|(key, _)| normalized_label.contains(key.as_str()) || key.contains(normalized_label))
            .map(|(key, info)| (key.as_str(), info))
    }

    /// The record behind [`Self::FALLBACK_KEY`].
    pub fn fallback(&self) -> &BiteInfo {
        &self.entries[self.fallback_idx].1
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn record(
    name: &str,
    symptoms: &[&str],
    treatment: &[&str],
    seek_doctor: &[&str],
    severity: Severity,
) -> BiteInfo {
    BiteInfo {
        name: name.to_string(),
        symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        treatment: treatment.iter().map(|s| s.to_string()).collect(),
        seek_doctor: seek_doctor.iter().map(|s| s.to_string()).collect(),
        severity,
    }
}

lazy_static! {
    static ref BITE_DATABASE: KnowledgeBase = KnowledgeBase::new(vec![
        (
            "mosquito".to_string(),
            record(
                "Mosquito Bite",
                &["Red, puffy bump", "Itching", "Localized swelling"],
                &[
                    "Wash with soap and water",
                    "Apply ice pack",
                    "Use anti-itch cream or antihistamine",
                ],
                &[
                    "Signs of infection (pus, warmth)",
                    "Fever",
                    "Severe headache or body aches",
                ],
                Severity::Low,
            ),
        ),
        (
            "tick".to_string(),
            record(
                "Tick Bite",
                &[
                    "Small red bump",
                    "Tick may still be attached",
                    "Red 'bullseye' rash (Lyme disease warning)",
                ],
                &[
                    "Remove tick carefully with tweezers",
                    "Clean area with alcohol",
                    "Save tick for testing if possible",
                ],
                &["Bullseye rash appears", "Flu-like symptoms", "Joint pain"],
                Severity::Medium,
            ),
        ),
        (
            "spider".to_string(),
            record(
                "Spider Bite",
                &[
                    "Redness",
                    "Swelling",
                    "Pain at site",
                    "Two puncture marks (sometimes)",
                ],
                &[
                    "Clean with soap and water",
                    "Apply cool compress",
                    "Elevate the area",
                ],
                &[
                    "Severe pain or cramping",
                    "Difficulty breathing",
                    "Ulceration (open sore) at site",
                ],
                Severity::Medium,
            ),
        ),
        (
            "bed bug".to_string(),
            record(
                "Bed Bug Bite",
                &[
                    "Itchy red welts in a line or zigzag",
                    "Small red bumps",
                    "Blisters",
                ],
                &[
                    "Wash with soap and water",
                    "Apply corticosteroid cream",
                    "Take oral antihistamine",
                ],
                &[
                    "Signs of allergic reaction",
                    "Severe infection from scratching",
                ],
                Severity::Low,
            ),
        ),
        (
            "bee".to_string(),
            record(
                "Bee/Wasp Sting",
                &["Sharp pain", "Redness", "Swelling", "Warmth"],
                &[
                    "Remove stinger (scrape, don't pinch)",
                    "Wash area",
                    "Ice pack",
                ],
                &[
                    "Swelling of face/throat",
                    "Difficulty breathing (Anaphylaxis)",
                    "Dizziness",
                ],
                Severity::Medium,
            ),
        ),
        (
            "ant".to_string(),
            record(
                "Ant Bite (Fire Ant)",
                &[
                    "Red spots",
                    "Pustules (bumps with white fluid)",
                    "Burning sensation",
                    "Itching",
                ],
                &["Wash area", "Cold compress", "Antihistamine for itching"],
                &[
                    "Signs of allergic reaction",
                    "Spreading redness",
                    "Severe swelling",
                ],
                Severity::Low,
            ),
        ),
        (
            "flea".to_string(),
            record(
                "Flea Bite",
                &[
                    "Small red bumps often in clusters",
                    "Usually on ankles/legs",
                    "Intense itching",
                    "Red halo around bite",
                ],
                &[
                    "Do not scratch",
                    "Wash with antiseptic soap",
                    "Apply ice or anti-itch cream",
                ],
                &["Signs of infection", "Tapeworm symptoms (rare)"],
                Severity::Low,
            ),
        ),
        (
            "snake".to_string(),
            record(
                "Snake Bite",
                &[
                    "Two puncture wounds",
                    "Severe pain",
                    "Rapid swelling",
                    "Nausea",
                    "Labored breathing",
                ],
                &[
                    "Keep calm and still",
                    "Remove jewelry/tight clothing",
                    "Keep bite below heart level",
                ],
                &[
                    "IMMEDIATELY call emergency services",
                    "Do not cut or suck the wound",
                ],
                Severity::High,
            ),
        ),
        (
            "unknown".to_string(),
            record(
                "Unidentified Bite",
                &["Visible mark on skin", "Discomfort or itching"],
                &["Keep clean", "Monitor for changes"],
                &["Severe pain", "Spreading redness", "Systemic symptoms"],
                Severity::Medium,
            ),
        ),
    ])
    .expect("built-in knowledge base must satisfy its invariants");
}
