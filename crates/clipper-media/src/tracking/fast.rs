//! Fast tracking: follow the largest face bounding box.

use super::models::{CropFrame, CropGeometry, FaceBox};

/// Build the raw crop path from per-frame bounding boxes.
///
/// Each frame targets the center of its largest face. Frames with no
/// detection hold the previous target; before any detection the path
/// sits at frame center.
pub fn track(observations: &[Vec<FaceBox>], geometry: &CropGeometry) -> Vec<CropFrame> {
    let mut path = Vec::with_capacity(observations.len());
    let mut target_x = geometry.frame_width as f64 / 2.0;

    for (frame_index, faces) in observations.iter().enumerate() {
        if let Some(largest) = faces
            .iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()))
        {
            target_x = largest.center_x();
        }

        path.push(CropFrame {
            frame_index,
            crop_x: geometry.clamp_crop_x(target_x),
            activity: 0.0,
        });
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x: f64, w: f64, h: f64) -> FaceBox {
        FaceBox { x, y: 100.0, width: w, height: h }
    }

    #[test]
    fn test_largest_face_wins() {
        let geometry = CropGeometry::new(1920, 1080);
        let observations = vec![vec![face(100.0, 50.0, 50.0), face(1200.0, 200.0, 200.0)]];
        let path = track(&observations, &geometry);
        // 1200 + 200/2 = 1300 center
        assert_eq!(path[0].crop_x, geometry.clamp_crop_x(1300.0));
    }

    #[test]
    fn test_no_detection_holds_previous_target() {
        let geometry = CropGeometry::new(1920, 1080);
        let observations = vec![
            vec![face(1000.0, 100.0, 100.0)],
            vec![],
            vec![],
        ];
        let path = track(&observations, &geometry);
        assert_eq!(path[1].crop_x, path[0].crop_x);
        assert_eq!(path[2].crop_x, path[0].crop_x);
    }

    #[test]
    fn test_initial_target_is_frame_center() {
        let geometry = CropGeometry::new(1920, 1080);
        let path = track(&[vec![], vec![]], &geometry);
        assert_eq!(path[0].crop_x, geometry.clamp_crop_x(960.0));
        assert_eq!(path[0].crop_x, geometry.centered_crop_x());
    }

    #[test]
    fn test_crop_x_clamped_at_edges() {
        let geometry = CropGeometry::new(1920, 1080);
        let observations = vec![
            vec![face(0.0, 20.0, 20.0)],
            vec![face(1890.0, 30.0, 30.0)],
        ];
        let path = track(&observations, &geometry);
        assert_eq!(path[0].crop_x, 0);
        assert_eq!(
            path[1].crop_x,
            (geometry.frame_width - geometry.crop_width()) as i32
        );
    }
}
