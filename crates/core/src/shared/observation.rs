use serde::{Deserialize, Serialize};

use super::normalized_rect::NormalizedRect;

/// Landmark weights: [left_eye, right_eye, nose, left_mouth, right_mouth].
const LANDMARK_WEIGHTS: [f64; 5] = [2.0, 2.0, 3.0, 1.0, 1.0];

/// 5-point face landmarks in normalized frame coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    /// Points with x <= 0 are treated as invisible.
    pub points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    /// Weighted centroid of visible landmarks, nose weighted heaviest.
    pub fn center(&self) -> Option<(f64, f64)> {
        let mut wx_sum = 0.0;
        let mut wy_sum = 0.0;
        let mut w_sum = 0.0;

        for (i, (x, y)) in self.points.iter().enumerate() {
            if *x > 0.0 {
                let w = LANDMARK_WEIGHTS[i];
                wx_sum += x * w;
                wy_sum += y * w;
                w_sum += w;
            }
        }

        if w_sum == 0.0 {
            return None;
        }
        Some((wx_sum / w_sum, wy_sum / w_sum))
    }
}

/// A recognized text region. Valid for one frame only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextObservation {
    #[serde(default)]
    pub id: u64,
    pub text: String,
    #[serde(rename = "box")]
    pub bounds: NormalizedRect,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

/// A detected face region.
///
/// `id` is only meaningful inside one frame; `tracking_id` is set when an
/// upstream tracker provides identity across frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "box")]
    pub bounds: NormalizedRect,
    pub confidence: f32,
    #[serde(default)]
    pub landmarks: Option<FaceLandmarks>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub tracking_id: Option<u64>,
}

impl FaceObservation {
    /// Face center: landmark centroid when landmarks are visible, otherwise
    /// the center of the clamped box.
    pub fn center(&self) -> (f64, f64) {
        self.landmarks
            .as_ref()
            .and_then(FaceLandmarks::center)
            .unwrap_or_else(|| self.bounds.clamped().center())
    }
}

/// Everything the detectors reported for one frame.
///
/// `sequence` is the producer's logical frame order and must increase.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservations {
    pub sequence: u64,
    #[serde(default)]
    pub texts: Vec<TextObservation>,
    #[serde(default)]
    pub faces: Vec<FaceObservation>,
}

impl FrameObservations {
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.faces.is_empty()
    }
}

fn full_confidence() -> f32 {
    1.0
}
