//! Offline flip augmentation for YOLO-format object detection datasets:
//! every image with a matching label file gets mirrored copies, boxes
//! remapped to match.

pub mod augment;
pub mod dataset;

pub use augment::{run, run_flip_pass, AugmentError, BatchSummary, PassSummary};
pub use dataset::data_augmenters::flip_augmentations::FlipAxis;
