use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process;

use yoloflip::augment::{self, PassSummary};

/// Flip-augments a YOLO dataset in place: every image with a matching label
/// file gets a horizontally and a vertically mirrored copy, written next to
/// the originals with `_hf`/`_vf` stem suffixes, boxes remapped to match.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the dataset images
    #[arg(default_value = "./dataset/images/")]
    image_dir: PathBuf,

    /// Directory holding the YOLO .txt label files
    #[arg(default_value = "./dataset/labels/")]
    label_dir: PathBuf,
}

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.image_dir.is_dir() {
        error!("image dir does not exist: {}", args.image_dir.display());
        process::exit(1);
    }
    if !args.label_dir.is_dir() {
        error!("label dir does not exist: {}", args.label_dir.display());
        process::exit(1);
    }

    info!(
        "Augmenting images in {} with labels in {}",
        args.image_dir.display(),
        args.label_dir.display()
    );
    match augment::run(&args.image_dir, &args.label_dir) {
        Ok(summary) => {
            report_failures(&summary.horizontal);
            report_failures(&summary.vertical);
        }
        Err(e) => {
            error!("augmentation aborted: {:#}", e);
            process::exit(1);
        }
    }
}

/// Per-pass counts are logged as each pass finishes; this dumps the
/// per-image reasons so a failing pair can be located and fixed
fn report_failures(pass: &PassSummary) {
    if pass.failures.is_empty() {
        return;
    }
    if let Ok(details) = serde_json::to_string_pretty(&pass.failures) {
        info!("{} failures:\n{}", pass.pass, details);
    }
}
