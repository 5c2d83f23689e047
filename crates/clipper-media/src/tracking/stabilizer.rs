//! Crop path stabilization: median smoothing followed by shot-locking.

use tracing::debug;

use super::models::{CropFrame, TrackerSettings, TrackingMode};

/// Stabilize a raw crop path.
///
/// First a sliding median removes detection jitter, then shot-locking
/// collapses the path into static camera positions that only move when a
/// sustained, large change occurs. Running the result through this
/// function again yields the same output.
pub fn stabilize(
    frames: &[CropFrame],
    settings: &TrackerSettings,
    mode: TrackingMode,
) -> Vec<CropFrame> {
    if frames.is_empty() {
        return Vec::new();
    }

    let smoothed = smooth_median(frames, settings.smoothing_window(mode));
    lock_shots(&smoothed, settings, mode)
}

/// Sliding-window median smoothing of `crop_x`.
///
/// The window is centered on each frame and truncated at the ends of the
/// clip. Activity values pass through untouched.
pub fn smooth_median(frames: &[CropFrame], window: usize) -> Vec<CropFrame> {
    if frames.is_empty() || window <= 1 {
        return frames.to_vec();
    }

    let half = window / 2;
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(frames.len());
            let mut values: Vec<i32> = frames[lo..hi].iter().map(|f| f.crop_x).collect();
            CropFrame {
                crop_x: median_i32(&mut values),
                ..*frame
            }
        })
        .collect()
}

/// Lock the path into discrete shots.
///
/// A shot change fires only when the shot has held for at least
/// `min_shot_duration` frames AND the smoothed position has drifted past
/// the mode threshold; smart mode additionally requires the frame's face
/// activity to exceed `switch_threshold`. Every frame of a finished shot
/// is overwritten with that shot's median position.
pub fn lock_shots(
    frames: &[CropFrame],
    settings: &TrackerSettings,
    mode: TrackingMode,
) -> Vec<CropFrame> {
    if frames.is_empty() {
        return Vec::new();
    }

    let drift_threshold = settings.shot_change_threshold(mode);
    let mut out = frames.to_vec();
    let mut shot_start = 0usize;
    let mut anchor = frames[0].crop_x as f64;
    let mut shots = 0usize;

    for i in 1..frames.len() {
        let elapsed = i - shot_start;
        let drift = (frames[i].crop_x as f64 - anchor).abs();

        let activity_ok = match mode {
            TrackingMode::Fast => true,
            TrackingMode::Smart => frames[i].activity > settings.switch_threshold,
        };

        if elapsed >= settings.min_shot_duration && drift > drift_threshold && activity_ok {
            flatten_shot(&mut out[shot_start..i]);
            shot_start = i;
            anchor = frames[i].crop_x as f64;
            shots += 1;
        }
    }

    flatten_shot(&mut out[shot_start..]);
    debug!(shots = shots + 1, frames = frames.len(), "Locked crop path into shots");

    out
}

/// Overwrite every frame of a shot with the shot's median position.
fn flatten_shot(shot: &mut [CropFrame]) {
    if shot.is_empty() {
        return;
    }
    let mut values: Vec<i32> = shot.iter().map(|f| f.crop_x).collect();
    let median = median_i32(&mut values);
    for frame in shot {
        frame.crop_x = median;
    }
}

fn median_i32(values: &mut [i32]) -> i32 {
    values.sort_unstable();
    values[values.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(values: &[i32]) -> Vec<CropFrame> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| CropFrame { frame_index: i, crop_x: v, activity: 1.0 })
            .collect()
    }

    #[test]
    fn test_constant_input_is_unchanged() {
        let frames = path(&[500; 300]);
        let settings = TrackerSettings::default();
        let out = stabilize(&frames, &settings, TrackingMode::Fast);
        assert!(out.iter().all(|f| f.crop_x == 500));
        assert_eq!(out.len(), 300);
    }

    #[test]
    fn test_smoothing_removes_single_frame_spike() {
        let mut values = vec![100; 120];
        values[60] = 900;
        let out = smooth_median(&path(&values), 60);
        assert!(out.iter().all(|f| f.crop_x == 100));
    }

    #[test]
    fn test_shot_change_fires_on_sustained_jump() {
        // 200 frames at 100, then 200 frames at 400 (drift 300 > 250).
        let mut values = vec![100; 200];
        values.extend(vec![400; 200]);
        let settings = TrackerSettings::default();
        let out = lock_shots(&path(&values), &settings, TrackingMode::Fast);

        assert!(out[..200].iter().all(|f| f.crop_x == 100));
        assert!(out[200..].iter().all(|f| f.crop_x == 400));
    }

    #[test]
    fn test_small_drift_never_changes_shot() {
        // Drift of 200 stays below the 250 fast threshold.
        let mut values = vec![100; 200];
        values.extend(vec![300; 200]);
        let settings = TrackerSettings::default();
        let out = lock_shots(&path(&values), &settings, TrackingMode::Fast);
        // One shot; everything flattens to the overall median.
        let first = out[0].crop_x;
        assert!(out.iter().all(|f| f.crop_x == first));
    }

    #[test]
    fn test_smart_requires_activity() {
        let mut frames = path(&[100; 200]);
        frames.extend(
            (200..400).map(|i| CropFrame { frame_index: i, crop_x: 400, activity: 0.1 }),
        );
        let settings = TrackerSettings::default();
        let out = lock_shots(&frames, &settings, TrackingMode::Smart);
        // Activity below switch_threshold: the jump is ignored.
        let first = out[0].crop_x;
        assert!(out.iter().all(|f| f.crop_x == first));

        // With speaking activity the change goes through.
        let mut active = path(&[100; 200]);
        active.extend(
            (200..400).map(|i| CropFrame { frame_index: i, crop_x: 400, activity: 0.9 }),
        );
        let out = lock_shots(&active, &settings, TrackingMode::Smart);
        assert_eq!(out[0].crop_x, 100);
        assert_eq!(out[399].crop_x, 400);
    }

    #[test]
    fn test_min_shot_duration_blocks_early_change() {
        // Jump at frame 50, before min_shot_duration (90) has elapsed.
        let mut values = vec![100; 50];
        values.extend(vec![400; 30]);
        values.extend(vec![100; 200]);
        let settings = TrackerSettings::default();
        let out = lock_shots(&path(&values), &settings, TrackingMode::Fast);
        let first = out[0].crop_x;
        assert!(out.iter().all(|f| f.crop_x == first));
    }

    #[test]
    fn test_stabilize_is_idempotent() {
        let mut values = vec![100; 200];
        values.extend(vec![400; 200]);
        let settings = TrackerSettings::default();
        let once = stabilize(&path(&values), &settings, TrackingMode::Fast);
        let twice = stabilize(&once, &settings, TrackingMode::Fast);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_path() {
        let settings = TrackerSettings::default();
        assert!(stabilize(&[], &settings, TrackingMode::Fast).is_empty());
    }
}
