//! `gesturecall classify`: run the classifier over a recorded result.

use std::error::Error;
use std::path::Path;

use serde_json::{Value, json};

use gesturecall_core::{FingerState, classify, status_text};
use gesturecall_protocols::{DetectionResult, HandObservation};

/// Accepts a full detection result or a bare list of hands.
pub(crate) fn parse_fixture(content: &str) -> Result<Vec<HandObservation>, serde_json::Error> {
    let value: Value = serde_json::from_str(content)?;
    if value.is_array() {
        serde_json::from_value(value)
    } else {
        Ok(serde_json::from_value::<DetectionResult>(value)?.hands)
    }
}

pub(crate) fn report(hands: &[HandObservation]) -> Vec<Value> {
    hands
        .iter()
        .map(|hand| {
            let gesture = classify(hand);
            json!({
                "handedness": hand.handedness,
                "fingers": FingerState::from_landmarks(&hand.landmarks).as_array(),
                "gesture": gesture,
                "status": gesture.map(|g| status_text(hand.handedness, g)),
            })
        })
        .collect()
}

pub(crate) async fn classify_fixture(path: &Path, format: &str) -> Result<(), Box<dyn Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    let hands = parse_fixture(&content)?;
    let rows = report(&hands);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        _ => {
            if rows.is_empty() {
                println!("No hands in {}", path.display());
            }
            for (i, (hand, row)) in hands.iter().zip(&rows).enumerate() {
                let fingers = FingerState::from_landmarks(&hand.landmarks)
                    .as_array()
                    .iter()
                    .map(|&up| if up { '1' } else { '0' })
                    .collect::<String>();
                let status = row["status"].as_str().unwrap_or("no gesture");
                println!("#{} {:?} [{}] {}", i, hand.handedness, fingers, status);
            }
        }
    }
    Ok(())
}
