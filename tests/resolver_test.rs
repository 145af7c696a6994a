use biteguard::{resolve, ConfidenceTier, KnowledgeBase, Prediction, Severity};

fn kb() -> &'static KnowledgeBase {
    KnowledgeBase::builtin()
}

#[test]
fn test_ranking_is_non_increasing() {
    let predictions = [
        Prediction::new("Ant Bite", 0.05),
        Prediction::new("Tick", 0.55),
        Prediction::new("Mosquito Bite", 0.25),
        Prediction::new("Flea", 0.15),
    ];
    let resolution = resolve(&predictions, kb());
    let probs: Vec<f32> = resolution
        .top_predictions()
        .iter()
        .map(|p| p.probability)
        .collect();
    assert!(probs.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(resolution.top_predictions()[0].class_name, "Tick");
}

#[test]
fn test_equal_probabilities_keep_input_order() {
    let predictions = [
        Prediction::new("Tick", 0.5),
        Prediction::new("Flea", 0.5),
        Prediction::new("Spider", 0.5),
    ];
    let resolution = resolve(&predictions, kb());
    let names: Vec<&str> = resolution
        .top_predictions()
        .iter()
        .map(|p| p.class_name.as_str())
        .collect();
    assert_eq!(names, vec!["Tick", "Flea", "Spider"]);
    assert_eq!(resolution.matched_key(), Some("tick"));
}

#[test]
fn test_mosquito_end_to_end() {
    let predictions = [
        Prediction::new("Mosquito Bite", 0.82),
        Prediction::new("Ant Bite", 0.10),
        Prediction::new("Tick", 0.08),
    ];
    let resolution = resolve(&predictions, kb());
    assert_eq!(resolution.matched_key(), Some("mosquito"));
    assert!(resolution.is_high_confidence());
    let guidance = resolution.guidance().expect("high confidence exposes guidance");
    assert_eq!(guidance.severity, Severity::Low);
    assert!(!guidance.treatment.is_empty());
}

#[test]
fn test_unknown_marking_end_to_end() {
    let resolution = resolve(&[Prediction::new("Unknown Marking", 0.35)], kb());
    assert_eq!(resolution.name(), "Unknown Marking");
    assert!(!resolution.is_high_confidence());
    assert!(resolution.guidance().is_none());
    assert_eq!(resolution.matched_key(), None);
}

#[test]
fn test_guidance_withheld_at_the_gate() {
    // Exactly at the threshold counts as low confidence.
    let at_gate = resolve(&[Prediction::new("Snake", 0.6)], kb());
    assert!(!at_gate.is_high_confidence());
    assert!(at_gate.guidance().is_none());
    // The identification itself is still available.
    assert_eq!(at_gate.name(), "Snake Bite");

    let above_gate = resolve(&[Prediction::new("Snake", 0.61)], kb());
    assert!(above_gate.is_high_confidence());
    assert_eq!(
        above_gate.guidance().map(|g| g.severity),
        Some(Severity::High)
    );
}

#[test]
fn test_bidirectional_substring_matching() {
    // Label contains key.
    let label_contains = resolve(&[Prediction::new("Fire Ant Bite", 0.9)], kb());
    assert_eq!(label_contains.matched_key(), Some("ant"));
    // Key contains label.
    let key_contains = resolve(&[Prediction::new("Bed", 0.9)], kb());
    assert_eq!(key_contains.matched_key(), Some("bed bug"));
}

#[test]
fn test_matching_is_case_insensitive_but_name_is_raw() {
    let resolution = resolve(&[Prediction::new("MOSQUITO BITE", 0.9)], kb());
    assert_eq!(resolution.matched_key(), Some("mosquito"));
    // Matched records keep the knowledge-base display name.
    assert_eq!(resolution.name(), "Mosquito Bite");

    let fallback = resolve(&[Prediction::new("Weird MARK", 0.9)], kb());
    // Fallback keeps the raw, non-normalized label.
    assert_eq!(fallback.name(), "Weird MARK");
}

#[test]
fn test_display_tiers() {
    let predictions = [
        Prediction::new("Mosquito Bite", 0.80),
        Prediction::new("Tick", 0.45),
        Prediction::new("Flea", 0.12),
    ];
    let resolution = resolve(&predictions, kb());
    let tiers: Vec<ConfidenceTier> = resolution
        .top_predictions()
        .iter()
        .map(|p| p.tier)
        .collect();
    assert_eq!(
        tiers,
        vec![
            ConfidenceTier::High,
            ConfidenceTier::Medium,
            ConfidenceTier::Low
        ]
    );
}

#[test]
fn test_empty_prediction_list() {
    let resolution = resolve(&[], kb());
    assert_eq!(resolution.name(), "Unidentified Bite");
    assert!(!resolution.is_high_confidence());
    assert!(resolution.top_predictions().is_empty());
}
