use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::dataset::common_structs::{ImgLabelPair, YoloBbox};
use crate::dataset::data_augmenters::flip_augmentations::{flip_bbs, flip_img, FlipAxis};
use crate::dataset::data_loaders::image_dir_loader::ImageDirLoader;
use crate::dataset::data_transformers::yolo_txt::{
    parse_yolo_txt, to_yolo_txt, MalformedAnnotation,
};
use crate::dataset::DataLoader;

/// Why a single image pair could not be augmented. None of these abort the
/// batch, the driver records them and moves on to the next image.
#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("no label file at {0:?}")]
    MissingLabel(PathBuf),
    #[error("could not read label file {path:?}: {source}")]
    LabelRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed annotation in {path:?}: {source}")]
    MalformedAnnotation {
        path: PathBuf,
        source: MalformedAnnotation,
    },
    #[error("could not decode image: {0}")]
    ImageDecode(#[source] image::ImageError),
    #[error("flip left a box outside the normalized range: {0:?}")]
    OutOfRangeBox(YoloBbox),
    #[error("could not save flipped image: {0}")]
    ImageEncode(#[source] image::ImageError),
    #[error("could not write label file: {0}")]
    Write(#[source] std::io::Error),
}

/// Outcome counts for one flip pass, with the stems that did not make it
#[derive(Debug, Serialize)]
pub struct PassSummary {
    pub pass: String,
    pub augmented: usize,
    pub missing_label: usize,
    pub failed: usize,
    pub failures: Vec<FailedImg>,
}

#[derive(Debug, Serialize)]
pub struct FailedImg {
    pub stem: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub horizontal: PassSummary,
    pub vertical: PassSummary,
}

/// Runs both augmentation passes over the dataset, horizontal first
pub fn run(image_dir: &Path, label_dir: &Path) -> anyhow::Result<BatchSummary> {
    let horizontal = run_flip_pass(image_dir, label_dir, FlipAxis::Horizontal)?;
    let vertical = run_flip_pass(image_dir, label_dir, FlipAxis::Vertical)?;
    Ok(BatchSummary {
        horizontal,
        vertical,
    })
}

/// One full pass over the image directory, producing `_hf` or `_vf` copies
/// of every image/label pair. Per-image failures are logged with the stem
/// and counted; only failing to list the directory aborts the pass.
pub fn run_flip_pass(
    image_dir: &Path,
    label_dir: &Path,
    axis: FlipAxis,
) -> anyhow::Result<PassSummary> {
    let loader = ImageDirLoader::new(image_dir, label_dir)
        .with_context(|| format!("could not list image dir {:?}", image_dir))?;
    let pb = create_progress_bar(loader.max_elem_index() as u64, axis.suffix());
    let pairs: Vec<ImgLabelPair> = loader.collect();

    let outcomes: Vec<(String, Result<(), AugmentError>)> = pairs
        .par_iter()
        .map(|pair| {
            let res = augment_pair(pair, axis, image_dir, label_dir);
            if let Err(err) = &res {
                match err {
                    AugmentError::MissingLabel(_) => warn!("{}: {}", pair.stem, err),
                    _ => error!("{}: {}", pair.stem, err),
                }
            }
            pb.inc(1);
            (pair.stem.clone(), res)
        })
        .collect();
    pb.finish_and_clear();

    let mut summary = PassSummary {
        pass: axis.to_string(),
        augmented: 0,
        missing_label: 0,
        failed: 0,
        failures: vec![],
    };
    for (stem, res) in outcomes {
        match res {
            Ok(()) => summary.augmented += 1,
            Err(AugmentError::MissingLabel(_)) => summary.missing_label += 1,
            Err(err) => {
                summary.failed += 1;
                summary.failures.push(FailedImg {
                    stem,
                    reason: err.to_string(),
                });
            }
        }
    }
    info!(
        "{}: {} augmented, {} without a label file, {} failed",
        summary.pass, summary.augmented, summary.missing_label, summary.failed
    );
    Ok(summary)
}

/// Flips one image and its boxes, writing `{stem}_{suffix}.{ext}` and
/// `{stem}_{suffix}.txt` next to the originals. Nothing is written until
/// every box has transformed into a valid normalized box.
fn augment_pair(
    pair: &ImgLabelPair,
    axis: FlipAxis,
    image_dir: &Path,
    label_dir: &Path,
) -> Result<(), AugmentError> {
    if !pair.label_path.is_file() {
        return Err(AugmentError::MissingLabel(pair.label_path.clone()));
    }
    let contents =
        fs::read_to_string(&pair.label_path).map_err(|source| AugmentError::LabelRead {
            path: pair.label_path.clone(),
            source,
        })?;
    let bboxes =
        parse_yolo_txt(&contents).map_err(|source| AugmentError::MalformedAnnotation {
            path: pair.label_path.clone(),
            source,
        })?;
    let img = image::open(&pair.img_path).map_err(AugmentError::ImageDecode)?;

    let flipped_bbs = flip_bbs(&bboxes, axis);
    for bb in &flipped_bbs {
        if !bb.is_normalized() {
            return Err(AugmentError::OutOfRangeBox(bb.clone()));
        }
    }
    let flipped_img = flip_img(&img, axis);

    let out_img = image_dir.join(format!("{}_{}.{}", pair.stem, axis.suffix(), pair.ext));
    let out_label = label_dir.join(format!("{}_{}.txt", pair.stem, axis.suffix()));
    flipped_img.save(&out_img).map_err(AugmentError::ImageEncode)?;
    fs::write(&out_label, to_yolo_txt(&flipped_bbs)).map_err(AugmentError::Write)?;
    Ok(())
}

fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(&format!(
        "{{spinner:.green}} [{}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}}",
        label
    )) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::helpers::img_drawing::draw_bb_to_img;
    use image::{GenericImageView, Rgb, RgbImage};
    use tempfile::TempDir;

    fn dataset_dirs(root: &TempDir) -> (PathBuf, PathBuf) {
        let images = root.path().join("images");
        let labels = root.path().join("labels");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&labels).unwrap();
        (images, labels)
    }

    fn save_plain_img(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([10u8, 20, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn pass_writes_flipped_image_and_labels() {
        let root = TempDir::new().unwrap();
        let (images, labels) = dataset_dirs(&root);
        save_plain_img(&images.join("sample.png"), 4, 4);
        fs::write(labels.join("sample.txt"), "0 0.25 0.5 0.5 1\n").unwrap();

        let summary = run_flip_pass(&images, &labels, FlipAxis::Horizontal).unwrap();
        assert_eq!(summary.augmented, 1);
        assert_eq!(summary.missing_label, 0);
        assert_eq!(summary.failed, 0);

        assert!(images.join("sample_hf.png").is_file());
        let out = fs::read_to_string(labels.join("sample_hf.txt")).unwrap();
        let boxes = parse_yolo_txt(&out).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].class, 0);
        assert_eq!(boxes[0].center_x, 0.75);
        assert_eq!(boxes[0].center_y, 0.5);
        assert_eq!(boxes[0].width, 0.5);
        assert_eq!(boxes[0].height, 1.0);

        // originals stay untouched
        assert_eq!(
            fs::read_to_string(labels.join("sample.txt")).unwrap(),
            "0 0.25 0.5 0.5 1\n"
        );
    }

    #[test]
    fn image_without_label_is_skipped_without_output() {
        let root = TempDir::new().unwrap();
        let (images, labels) = dataset_dirs(&root);
        save_plain_img(&images.join("cat.jpg"), 4, 4);

        let summary = run_flip_pass(&images, &labels, FlipAxis::Horizontal).unwrap();
        assert_eq!(summary.augmented, 0);
        assert_eq!(summary.missing_label, 1);
        assert_eq!(summary.failed, 0);
        assert!(!images.join("cat_hf.jpg").exists());
        assert!(!labels.join("cat_hf.txt").exists());
    }

    #[test]
    fn one_bad_pair_does_not_stop_the_rest() {
        let root = TempDir::new().unwrap();
        let (images, labels) = dataset_dirs(&root);
        save_plain_img(&images.join("bad.png"), 4, 4);
        fs::write(labels.join("bad.txt"), "0 0.5 broken 0.2 0.2\n").unwrap();
        save_plain_img(&images.join("good.png"), 4, 4);
        fs::write(labels.join("good.txt"), "2 0.5 0.5 0.25 0.25\n").unwrap();

        let summary = run_flip_pass(&images, &labels, FlipAxis::Vertical).unwrap();
        assert_eq!(summary.augmented, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].stem, "bad");
        assert!(summary.failures[0].reason.contains("malformed annotation"));

        assert!(images.join("good_vf.png").is_file());
        assert!(labels.join("good_vf.txt").is_file());
        assert!(!images.join("bad_vf.png").exists());
        assert!(!labels.join("bad_vf.txt").exists());
    }

    #[test]
    fn boxes_leaving_the_domain_fail_before_anything_is_written() {
        let root = TempDir::new().unwrap();
        let (images, labels) = dataset_dirs(&root);
        save_plain_img(&images.join("weird.png"), 4, 4);
        // center already out of range, the flip keeps it invalid
        fs::write(labels.join("weird.txt"), "0 1.5 0.5 0.2 0.2\n").unwrap();

        let summary = run_flip_pass(&images, &labels, FlipAxis::Horizontal).unwrap();
        assert_eq!(summary.failed, 1);
        assert!(!images.join("weird_hf.png").exists());
        assert!(!labels.join("weird_hf.txt").exists());
    }

    #[test]
    fn run_produces_both_augmentations_and_never_compounds_them() {
        let root = TempDir::new().unwrap();
        let (images, labels) = dataset_dirs(&root);
        save_plain_img(&images.join("sample.png"), 4, 4);
        fs::write(labels.join("sample.txt"), "0 0.25 0.25 0.5 0.5\n").unwrap();

        let batch = run(&images, &labels).unwrap();
        assert_eq!(batch.horizontal.augmented, 1);
        assert_eq!(batch.vertical.augmented, 1);
        assert!(images.join("sample_hf.png").is_file());
        assert!(images.join("sample_vf.png").is_file());
        // the vertical pass must not pick up the horizontal pass output
        assert!(!images.join("sample_hf_vf.png").exists());

        // rerunning overwrites the same outputs instead of stacking suffixes
        let batch = run(&images, &labels).unwrap();
        assert_eq!(batch.horizontal.augmented, 1);
        assert!(!images.join("sample_hf_hf.png").exists());
        assert!(!images.join("sample_vf_hf.png").exists());
    }

    #[test]
    fn flipped_boxes_still_enclose_the_flipped_object() {
        let root = TempDir::new().unwrap();
        let (images, labels) = dataset_dirs(&root);

        // black 8x8 image with a white 2x2 block at x 2..4, y 4..6
        let img = RgbImage::from_fn(8, 8, |x, y| {
            if (2..4).contains(&x) && (4..6).contains(&y) {
                Rgb([255u8, 255, 255])
            } else {
                Rgb([0u8, 0, 0])
            }
        });
        img.save(images.join("block.png")).unwrap();
        fs::write(labels.join("block.txt"), "5 0.375 0.625 0.25 0.25\n").unwrap();

        let summary = run_flip_pass(&images, &labels, FlipAxis::Horizontal).unwrap();
        assert_eq!(summary.augmented, 1);

        let flipped = image::open(images.join("block_hf.png")).unwrap();
        let out = fs::read_to_string(labels.join("block_hf.txt")).unwrap();
        let bb = &parse_yolo_txt(&out).unwrap()[0];
        assert_eq!(bb.class, 5);

        let (w, h) = flipped.dimensions();
        let left = ((bb.center_x - bb.width / 2.0) * f64::from(w)).round() as u32;
        let right = ((bb.center_x + bb.width / 2.0) * f64::from(w)).round() as u32;
        let top = ((bb.center_y - bb.height / 2.0) * f64::from(h)).round() as u32;
        let bottom = ((bb.center_y + bb.height / 2.0) * f64::from(h)).round() as u32;
        for x in 0..w {
            for y in 0..h {
                let white = flipped.get_pixel(x, y)[0] == 255;
                let inside = (left..right).contains(&x) && (top..bottom).contains(&y);
                assert_eq!(white, inside, "pixel ({}, {})", x, y);
            }
        }

        // overlay copy for eyeballing the correspondence
        let mut overlay = flipped;
        draw_bb_to_img(&mut overlay, bb);
        overlay.save(images.join("block_hf_overlay.png")).unwrap();
    }
}
