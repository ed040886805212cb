use std::fmt;

use image::DynamicImage;

use crate::dataset::common_structs::YoloBbox;

/// The two mirror axes, named by the filename suffix they produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

impl FlipAxis {
    /// Stem suffix appended to the outputs of this flip
    pub fn suffix(self) -> &'static str {
        match self {
            FlipAxis::Horizontal => "hf",
            FlipAxis::Vertical => "vf",
        }
    }
}

impl fmt::Display for FlipAxis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FlipAxis::Horizontal => write!(f, "horizontal flip"),
            FlipAxis::Vertical => write!(f, "vertical flip"),
        }
    }
}

/// Mirrors a normalized box across the image center line of the given axis.
/// Only the mirrored center coordinate moves; size and class stay as they
/// are. Out-of-range input is not clamped, it comes out as it went in.
pub fn flip_bb(bb: &YoloBbox, axis: FlipAxis) -> YoloBbox {
    match axis {
        FlipAxis::Horizontal => YoloBbox {
            center_x: 1.0 - bb.center_x,
            ..bb.clone()
        },
        FlipAxis::Vertical => YoloBbox {
            center_y: 1.0 - bb.center_y,
            ..bb.clone()
        },
    }
}

pub fn flip_bbs(bbs: &[YoloBbox], axis: FlipAxis) -> Vec<YoloBbox> {
    let mut flipped = vec![];
    for bb in bbs {
        flipped.push(flip_bb(bb, axis));
    }
    flipped
}

/// The pixel half of the transform. Boxes and pixels must go through the
/// same mirror for the boxes to still enclose their objects afterwards.
pub fn flip_img(img: &DynamicImage, axis: FlipAxis) -> DynamicImage {
    match axis {
        FlipAxis::Horizontal => img.fliph(),
        FlipAxis::Vertical => img.flipv(),
    }
}
