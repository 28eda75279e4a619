//! Frame-to-frame continuity for face captions.
//!
//! Upstream face IDs are only valid within one frame, so continuity comes
//! either from an explicit tracking ID or from best-effort nearest-box
//! matching. Which one applies is a policy choice.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::shared::normalized_rect::NormalizedRect;
use crate::shared::observation::FaceObservation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceContinuityPolicy {
    /// Continue a caption only when the face carries the same tracking ID.
    TrackingOnly,
    /// Tracking ID first, then the nearest unclaimed caption within range.
    #[default]
    NearestBox,
    /// No continuity: every frame's faces replace the previous set.
    PerFrame,
}

/// An existing caption entry that a new face may continue.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub key: u64,
    pub tracking_id: Option<u64>,
    pub bounds: NormalizedRect,
}

/// For each face, the key of the existing entry it continues, if any.
///
/// Each existing entry is claimed by at most one face per frame. Spatial
/// pairs are assigned greedily by ascending center distance.
pub fn match_faces(
    existing: &[MatchCandidate],
    faces: &[FaceObservation],
    policy: FaceContinuityPolicy,
    max_distance: f64,
) -> Vec<Option<u64>> {
    let mut assigned: Vec<Option<u64>> = vec![None; faces.len()];
    if policy == FaceContinuityPolicy::PerFrame || existing.is_empty() {
        return assigned;
    }

    let mut used: HashSet<u64> = HashSet::new();
    for (fi, face) in faces.iter().enumerate() {
        let Some(tid) = face.tracking_id else {
            continue;
        };
        if let Some(c) = existing
            .iter()
            .find(|c| c.tracking_id == Some(tid) && !used.contains(&c.key))
        {
            assigned[fi] = Some(c.key);
            used.insert(c.key);
        }
    }

    if policy == FaceContinuityPolicy::TrackingOnly {
        return assigned;
    }

    let mut pairs: Vec<(usize, u64, f64)> = Vec::new();
    for (fi, face) in faces.iter().enumerate() {
        if assigned[fi].is_some() {
            continue;
        }
        let bounds = face.bounds.clamped();
        for c in existing {
            if used.contains(&c.key) || conflicting_tracks(face.tracking_id, c.tracking_id) {
                continue;
            }
            let dist = bounds.center_distance(&c.bounds);
            if dist <= max_distance {
                pairs.push((fi, c.key, dist));
            }
        }
    }
    pairs.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    for (fi, key, _) in pairs {
        if assigned[fi].is_none() && !used.contains(&key) {
            assigned[fi] = Some(key);
            used.insert(key);
        }
    }
    assigned
}

fn conflicting_tracks(a: Option<u64>, b: Option<u64>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x != y)
}
