use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates.
///
/// Always normalized so that `x1 <= x2` and `y1 <= y2`. Serialized as the
/// array `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl BoundingBox {
    /// Creates a bounding box from two corners in any order.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Creates a bounding box from floating point corners.
    ///
    /// Coordinates are truncated toward zero, the way detectors' integer
    /// boxes are usually derived.
    pub fn from_xyxy(xyxy: [f32; 4]) -> Self {
        let [x1, y1, x2, y2] = xyxy.map(|v| v as i32);
        Self::new(x1, y1, x2, y2)
    }

    /// Left edge.
    pub fn x1(&self) -> i32 {
        self.x1
    }

    /// Top edge.
    pub fn y1(&self) -> i32 {
        self.y1
    }

    /// Right edge.
    pub fn x2(&self) -> i32 {
        self.x2
    }

    /// Bottom edge.
    pub fn y2(&self) -> i32 {
        self.y2
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> u32 {
        self.x2.abs_diff(self.x1)
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> u32 {
        self.y2.abs_diff(self.y1)
    }

    /// Clips the box to an image of the given size.
    ///
    /// Returns `(x, y, width, height)` of the visible part, or `None` if
    /// nothing of the box lies inside the image.
    pub fn clip(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let clamp = |v: i32, max: u32| v.clamp(0, max.min(i32::MAX as u32) as i32) as u32;

        let x1 = clamp(self.x1, image_width);
        let y1 = clamp(self.y1, image_height);
        let x2 = clamp(self.x2, image_width);
        let y2 = clamp(self.y2, image_height);

        (x2 > x1 && y2 > y1).then(|| (x1, y1, x2 - x1, y2 - y1))
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x1, bbox.y1, bbox.x2, bbox.y2]
    }
}

/// A detected rectangular area of an image.
///
/// Created by the detection stage and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// 1-based position in the detector's emission order.
    pub ordinal: u32,
    /// Location in the source image.
    pub bbox: BoundingBox,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Detector class identifier.
    pub class_id: u32,
    /// Detector class name.
    pub class_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_normalized() {
        let bbox = BoundingBox::new(300, 80, 100, 50);
        assert_eq!(<[i32; 4]>::from(bbox), [100, 50, 300, 80]);
        assert_eq!(bbox.width(), 200);
        assert_eq!(bbox.height(), 30);
    }

    #[test]
    fn float_corners_truncate() {
        let bbox = BoundingBox::from_xyxy([100.9, 50.2, 300.7, 80.99]);
        assert_eq!(<[i32; 4]>::from(bbox), [100, 50, 300, 80]);
    }

    #[test]
    fn serializes_as_four_integers() {
        let bbox = BoundingBox::new(1, 2, 3, 4);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[1,2,3,4]");

        let back: BoundingBox = serde_json::from_str("[3,4,1,2]").unwrap();
        assert_eq!(back, bbox);
    }

    #[test]
    fn clip_handles_out_of_range_boxes() {
        let inside = BoundingBox::new(10, 10, 20, 30);
        assert_eq!(inside.clip(100, 100), Some((10, 10, 10, 20)));

        let overhanging = BoundingBox::new(-5, 90, 50, 150);
        assert_eq!(overhanging.clip(100, 100), Some((0, 90, 50, 10)));

        let outside = BoundingBox::new(200, 200, 300, 300);
        assert_eq!(outside.clip(100, 100), None);

        let degenerate = BoundingBox::new(10, 10, 10, 40);
        assert_eq!(degenerate.clip(100, 100), None);
    }
}
