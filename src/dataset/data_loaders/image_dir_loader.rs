use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use itertools::Itertools;
use lazy_static::lazy_static;
use log::debug;

use crate::dataset::common_structs::ImgLabelPair;
use crate::dataset::DataLoader;

lazy_static! {
    /// Raster formats the image codec is expected to decode
    static ref IMG_EXTENSIONS: HashSet<&'static str> =
        ["jpg", "jpeg", "png", "bmp"].iter().copied().collect();
}

/// Stem suffixes of files this tool writes itself. Those never count as
/// inputs again, so the second pass and reruns do not compound flips.
const AUGMENTED_SUFFIXES: [&str; 2] = ["_hf", "_vf"];

/// Walks the direct children of an image directory and pairs every image
/// with the label file sharing its stem under the label directory
pub struct ImageDirLoader {
    pairs: Vec<ImgLabelPair>,
    next_element_index: usize,
}

impl ImageDirLoader {
    pub fn new(image_dir: &Path, label_dir: &Path) -> io::Result<ImageDirLoader> {
        let mut pairs = vec![];
        for entry in fs::read_dir(image_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let (stem, ext) = match (stem_of(&path), ext_of(&path)) {
                (Some(stem), Some(ext)) => (stem, ext),
                _ => continue,
            };
            if !IMG_EXTENSIONS.contains(ext.to_ascii_lowercase().as_str()) {
                continue;
            }
            if AUGMENTED_SUFFIXES.iter().any(|s| stem.ends_with(s)) {
                debug!("skipping previously augmented image {:?}", path);
                continue;
            }
            let label_path = label_dir.join(format!("{}.txt", stem));
            pairs.push(ImgLabelPair {
                img_path: path,
                label_path,
                stem,
                ext,
            });
        }
        // lexicographic by filename, the batch order is stable between runs
        let pairs = pairs
            .into_iter()
            .sorted_by(|a, b| a.img_path.cmp(&b.img_path))
            .collect();
        Ok(ImageDirLoader {
            pairs,
            next_element_index: 0,
        })
    }
}

fn stem_of(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
}

fn ext_of(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(str::to_owned)
}

impl Iterator for ImageDirLoader {
    type Item = ImgLabelPair;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.pairs.get(self.next_element_index)?.clone();
        self.next_element_index += 1;
        Some(next)
    }
}

impl DataLoader for ImageDirLoader {
    fn next_element_index(&self) -> usize {
        self.next_element_index
    }

    fn max_elem_index(&self) -> usize {
        self.pairs.len()
    }
}
