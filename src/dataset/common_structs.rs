use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A bounding box in the YOLO normalized convention: class id first, then
/// box center and size as fractions of the image dimensions, all in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoloBbox {
    pub class: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloBbox {
    /// True when every geometric field is inside the normalized domain and
    /// the box has a positive size
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.center_x)
            && (0.0..=1.0).contains(&self.center_y)
            && self.width > 0.0
            && self.width <= 1.0
            && self.height > 0.0
            && self.height <= 1.0
    }
}

/// An image file together with the label file derived from its stem
#[derive(Debug, Clone, PartialEq)]
pub struct ImgLabelPair {
    pub img_path: PathBuf,
    pub label_path: PathBuf,
    pub stem: String,
    pub ext: String,
}
