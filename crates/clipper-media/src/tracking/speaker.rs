//! Smart tracking: follow the face that is speaking.
//!
//! Activity blends the instantaneous mouth-opening ratio with the change
//! in mouth height since the previous frame, then mixes in a screen-center
//! preference before picking the winning face.

use super::models::{CropFrame, CropGeometry, FaceLandmarks, TrackerSettings};

/// How far (pixels) a face center may move between frames and still be
/// treated as the same face when computing mouth deltas.
const MATCH_DISTANCE: f64 = 150.0;

/// Activity weight of the mouth-opening ratio.
const RATIO_WEIGHT: f64 = 0.4;
/// Activity weight of the frame-to-frame mouth height change.
const DELTA_WEIGHT: f64 = 0.6;

/// Build the raw crop path from per-frame landmark observations.
pub fn track(
    observations: &[Vec<FaceLandmarks>],
    geometry: &CropGeometry,
    settings: &TrackerSettings,
) -> Vec<CropFrame> {
    let mut path = Vec::with_capacity(observations.len());
    let mut target_x = geometry.frame_width as f64 / 2.0;
    // (center_x, mouth_height) of every face in the previous frame
    let mut previous: Vec<(f64, f64)> = Vec::new();

    for (frame_index, faces) in observations.iter().enumerate() {
        let mut best: Option<(f64, f64, f64)> = None; // (combined, center_x, activity)

        for face in faces {
            let center_x = face.face.center_x();
            let activity = lip_activity(face, &previous);
            let center = center_score(center_x, geometry.frame_width);
            let combined =
                activity * (1.0 - settings.center_weight) + center * settings.center_weight;

            let better = match best {
                Some((best_combined, _, _)) => combined > best_combined,
                None => true,
            };
            if better {
                best = Some((combined, center_x, activity));
            }
        }

        let activity = match best {
            Some((_, center_x, activity)) => {
                target_x = center_x;
                activity
            }
            None => 0.0,
        };

        path.push(CropFrame {
            frame_index,
            crop_x: geometry.clamp_crop_x(target_x),
            activity,
        });

        previous = faces
            .iter()
            .map(|f| (f.face.center_x(), f.mouth_height))
            .collect();
    }

    path
}

/// Lip activity for one face given the previous frame's faces.
fn lip_activity(face: &FaceLandmarks, previous: &[(f64, f64)]) -> f64 {
    let ratio = if face.mouth_width > 0.0 {
        face.mouth_height / face.mouth_width
    } else {
        0.0
    };

    let center_x = face.face.center_x();
    let delta = previous
        .iter()
        .filter(|(px, _)| (px - center_x).abs() <= MATCH_DISTANCE)
        .min_by(|(a, _), (b, _)| {
            (a - center_x).abs().total_cmp(&(b - center_x).abs())
        })
        .map(|(_, prev_height)| (face.mouth_height - prev_height).abs())
        .unwrap_or(0.0);

    RATIO_WEIGHT * ratio + DELTA_WEIGHT * delta
}

/// Preference for faces near the horizontal center of the frame.
fn center_score(center_x: f64, frame_width: u32) -> f64 {
    let half = frame_width as f64 / 2.0;
    (1.0 - (center_x - half).abs() / half).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::models::FaceBox;

    fn landmarks(x: f64, mouth_height: f64, mouth_width: f64) -> FaceLandmarks {
        FaceLandmarks {
            face: FaceBox { x, y: 100.0, width: 100.0, height: 100.0 },
            mouth_height,
            mouth_width,
        }
    }

    #[test]
    fn test_talking_face_beats_still_face() {
        let geometry = CropGeometry::new(1920, 1080);
        let settings = TrackerSettings::default();
        // Both faces equidistant from center; the left one opens its mouth.
        let observations = vec![
            vec![landmarks(400.0, 2.0, 40.0), landmarks(1400.0, 2.0, 40.0)],
            vec![landmarks(400.0, 20.0, 40.0), landmarks(1400.0, 2.0, 40.0)],
        ];
        let path = track(&observations, &geometry, &settings);
        assert_eq!(path[1].crop_x, geometry.clamp_crop_x(450.0));
        assert!(path[1].activity > path[0].activity);
    }

    #[test]
    fn test_center_weight_breaks_ties() {
        let geometry = CropGeometry::new(1920, 1080);
        let settings = TrackerSettings::default();
        // Identical activity; the face nearer the center must win.
        let observations = vec![vec![
            landmarks(100.0, 5.0, 40.0),
            landmarks(900.0, 5.0, 40.0),
        ]];
        let path = track(&observations, &geometry, &settings);
        assert_eq!(path[0].crop_x, geometry.clamp_crop_x(950.0));
    }

    #[test]
    fn test_no_faces_holds_position() {
        let geometry = CropGeometry::new(1920, 1080);
        let settings = TrackerSettings::default();
        let observations = vec![
            vec![landmarks(1500.0, 10.0, 40.0)],
            vec![],
        ];
        let path = track(&observations, &geometry, &settings);
        assert_eq!(path[1].crop_x, path[0].crop_x);
        assert_eq!(path[1].activity, 0.0);
    }

    #[test]
    fn test_zero_mouth_width_is_safe() {
        let geometry = CropGeometry::new(1920, 1080);
        let settings = TrackerSettings::default();
        let observations = vec![vec![landmarks(960.0, 5.0, 0.0)]];
        let path = track(&observations, &geometry, &settings);
        assert!(path[0].activity.is_finite());
    }
}
