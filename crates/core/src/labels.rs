//! The fixed disease label set and selection of the winning label from a
//! model's probability output.

use serde::Serialize;

use crate::error::CoreError;

/// Label reported for a leaf with no detected disease.
pub const HEALTHY_LABEL: &str = "Banana Healthy Leaf";

/// Labels in the index order of the model's output layer.
pub const DISEASE_LABELS: [&str; 7] = [
    "Banana Black Sigatoka Disease",
    "Banana Bract Mosaic Virus Disease",
    HEALTHY_LABEL,
    "Banana Insect Pest Disease",
    "Banana Moko Disease",
    "Banana Panama Disease",
    "Banana Yellow Sigatoka Disease",
];

/// Tolerance for probabilities that land a hair outside `[0, 1]` after
/// a softmax in single precision.
const PROBABILITY_EPSILON: f32 = 1e-4;

/// The winning label and its probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: &'static str,
    /// Probability of `label`, in `[0, 1]`.
    pub confidence: f32,
}

impl Classification {
    pub fn is_healthy(&self) -> bool {
        is_healthy(self.label)
    }
}

/// Select the argmax label from a probability distribution over
/// [`DISEASE_LABELS`].
///
/// Returns [`CoreError::Internal`] when the output is malformed: wrong
/// length, non-finite values, or values outside `[0, 1]`.
pub fn classify(probabilities: &[f32]) -> Result<Classification, CoreError> {
    if probabilities.len() != DISEASE_LABELS.len() {
        return Err(CoreError::Internal(format!(
            "Model returned {} scores, expected {}",
            probabilities.len(),
            DISEASE_LABELS.len()
        )));
    }

    let mut best: Option<(usize, f32)> = None;
    for (idx, &p) in probabilities.iter().enumerate() {
        if !p.is_finite() || p < -PROBABILITY_EPSILON || p > 1.0 + PROBABILITY_EPSILON {
            return Err(CoreError::Internal(format!(
                "Model returned out-of-range score {p} at index {idx}"
            )));
        }
        match best {
            Some((_, top)) if top >= p => {}
            _ => best = Some((idx, p)),
        }
    }

    let (idx, p) = best.ok_or_else(|| CoreError::Internal("Model returned no scores".into()))?;
    Ok(Classification {
        label: DISEASE_LABELS[idx],
        confidence: p.clamp(0.0, 1.0),
    })
}

/// Whether `label` denotes a healthy leaf.
pub fn is_healthy(label: &str) -> bool {
    label == HEALTHY_LABEL
}

/// Short human-readable note shown alongside a prediction.
pub fn description(label: &str) -> &'static str {
    match label {
        "Banana Black Sigatoka Disease" => {
            "Fungal leaf spot (Pseudocercospora fijiensis) causing dark streaks and early leaf death."
        }
        "Banana Bract Mosaic Virus Disease" => {
            "Aphid-borne virus producing spindle-shaped mosaic streaks on bracts and petioles."
        }
        HEALTHY_LABEL => "No disease symptoms detected on the leaf.",
        "Banana Insect Pest Disease" => {
            "Feeding damage from insect pests such as leaf beetles or caterpillars."
        }
        "Banana Moko Disease" => {
            "Bacterial wilt (Ralstonia solanacearum) causing yellowing and collapse of leaves."
        }
        "Banana Panama Disease" => {
            "Fusarium wilt causing yellowing from the leaf margins and splitting of the pseudostem."
        }
        "Banana Yellow Sigatoka Disease" => {
            "Fungal leaf spot (Pseudocercospora musae) with pale yellow streaks turning brown."
        }
        _ => "No additional details",
    }
}
