//! Tensor preparation and YOLOv8 output decoding.
//!
//! Kept free of any ONNX Runtime types so it can be tested on synthetic
//! tensors.

use std::cmp::Ordering;

use idscan_core::RawDetection;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

use crate::{Error, Result};

/// Grey used by Ultralytics to pad letterboxed images.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Number of box coordinates before the class scores in each anchor.
const BOX_FEATURES: usize = 4;

/// How an image was fitted into the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
    width: f32,
    height: f32,
}

impl Letterbox {
    /// Computes the aspect-preserving fit of `width` x `height` into `size`.
    pub(crate) fn fit(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let resized_w = (width as f32 * scale).round();
        let resized_h = (height as f32 * scale).round();

        Self {
            scale,
            pad_x: ((size as f32 - resized_w) / 2.0).floor(),
            pad_y: ((size as f32 - resized_h) / 2.0).floor(),
            width: width as f32,
            height: height as f32,
        }
    }

    fn resized_dimensions(&self) -> (u32, u32) {
        (
            ((self.width * self.scale).round() as u32).max(1),
            ((self.height * self.scale).round() as u32).max(1),
        )
    }

    /// Maps a corner box from model input space back to the original image,
    /// clamped to its bounds.
    fn restore(&self, [x1, y1, x2, y2]: [f32; 4]) -> [f32; 4] {
        let x = |v: f32| ((v - self.pad_x) / self.scale).clamp(0.0, self.width);
        let y = |v: f32| ((v - self.pad_y) / self.scale).clamp(0.0, self.height);
        [x(x1), y(y1), x(x2), y(y2)]
    }
}

/// Converts an image into a normalized `(1, 3, size, size)` CHW tensor.
pub(crate) fn preprocess(image: &RgbImage, size: u32) -> (Array4<f32>, Letterbox) {
    let letterbox = Letterbox::fit(image.width(), image.height(), size);
    let (resized_w, resized_h) = letterbox.resized_dimensions();
    let resized = imageops::resize(image, resized_w, resized_h, FilterType::Triangle);

    let side = size as usize;
    let mut input = Array4::<f32>::from_elem((1, 3, side, side), PAD_VALUE);
    let (pad_x, pad_y) = (letterbox.pad_x as usize, letterbox.pad_y as usize);

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (col, row) = (x as usize + pad_x, y as usize + pad_y);
        if col >= side || row >= side {
            continue;
        }

        for channel in 0..3 {
            input[[0, channel, row, col]] = f32::from(pixel[channel]) / 255.0;
        }
    }

    (input, letterbox)
}

/// Decoding parameters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DecodeOptions {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

/// Decodes a `(1, 4 + C, N)` YOLOv8 output into detections in original
/// image coordinates, strongest first.
pub(crate) fn decode(
    dims: &[i64],
    data: &[f32],
    letterbox: &Letterbox,
    options: DecodeOptions,
) -> Result<Vec<RawDetection>> {
    let [batch, features, anchors] = dims else {
        return Err(Error::invalid_output(format!(
            "expected a rank-3 output, got shape {dims:?}"
        )));
    };

    if *batch != 1 || *features <= BOX_FEATURES as i64 || *anchors < 0 {
        return Err(Error::invalid_output(format!(
            "expected shape (1, 4 + classes, anchors), got {dims:?}"
        )));
    }

    let (features, anchors) = (*features as usize, *anchors as usize);
    if data.len() != features * anchors {
        return Err(Error::invalid_output(format!(
            "output holds {} values, shape {dims:?} needs {}",
            data.len(),
            features * anchors
        )));
    }

    let at = |feature: usize, anchor: usize| data[feature * anchors + anchor];
    let mut candidates = Vec::new();

    for anchor in 0..anchors {
        let (class_id, confidence) = (BOX_FEATURES..features)
            .map(|feature| (feature - BOX_FEATURES, at(feature, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, current| {
                if current.1 > best.1 { current } else { best }
            });

        if !(confidence >= options.confidence_threshold) {
            continue;
        }

        let (cx, cy) = (at(0, anchor), at(1, anchor));
        let (w, h) = (at(2, anchor), at(3, anchor));
        let xyxy = letterbox.restore([
            cx - w / 2.0,
            cy - h / 2.0,
            cx + w / 2.0,
            cy + h / 2.0,
        ]);

        if xyxy[2] <= xyxy[0] || xyxy[3] <= xyxy[1] {
            continue;
        }

        candidates.push(RawDetection::new(xyxy, confidence, class_id as u32));
    }

    let mut detections = non_max_suppression(candidates, options.iou_threshold);
    detections.truncate(options.max_detections);
    Ok(detections)
}

/// Greedy per-class non-maximum suppression. The result is sorted by
/// descending confidence.
pub(crate) fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    iou_threshold: f32,
) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let suppressed = kept.iter().any(|winner| {
            winner.class_id == candidate.class_id
                && iou(&winner.xyxy, &candidate.xyxy) > iou_threshold
        });

        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let width = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let height = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = width * height;

    let area = |r: &[f32; 4]| (r[2] - r[0]) * (r[3] - r[1]);
    let union = area(a) + area(b) - intersection;

    if union <= 0.0 { 0.0 } else { intersection / union }
}
