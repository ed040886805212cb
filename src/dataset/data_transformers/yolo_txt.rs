use thiserror::Error;

use crate::dataset::common_structs::YoloBbox;

/// A label line that does not follow the `class cx cy w h` convention
#[derive(Debug, Error)]
#[error("line {line}: {reason}")]
pub struct MalformedAnnotation {
    pub line: usize,
    pub reason: String,
}

/// Parses the contents of a YOLO label file, one box per line:
/// `class_id center_x center_y width height`, whitespace separated.
/// Fields past the fifth are ignored.
pub fn parse_yolo_txt(contents: &str) -> Result<Vec<YoloBbox>, MalformedAnnotation> {
    let mut bboxes = vec![];
    for (idx, line) in contents.lines().enumerate() {
        let bb = parse_line(line).map_err(|reason| MalformedAnnotation {
            line: idx + 1,
            reason,
        })?;
        bboxes.push(bb);
    }
    Ok(bboxes)
}

fn parse_line(line: &str) -> Result<YoloBbox, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(format!("expected 5 fields, got {}", fields.len()));
    }
    let class = fields[0]
        .parse::<u32>()
        .map_err(|e| format!("bad class id {:?}: {}", fields[0], e))?;
    let mut geom = [0f64; 4];
    for (slot, field) in geom.iter_mut().zip(&fields[1..5]) {
        *slot = field
            .parse()
            .map_err(|e| format!("bad coordinate {:?}: {}", field, e))?;
    }
    Ok(YoloBbox {
        class,
        center_x: geom[0],
        center_y: geom[1],
        width: geom[2],
        height: geom[3],
    })
}

/// Serializes boxes back to label-file text, one line per box in the same
/// field order, each line newline terminated. `f64` formatting round-trips,
/// so parse(to_yolo_txt(boxes)) gives the boxes back exactly.
pub fn to_yolo_txt(bboxes: &[YoloBbox]) -> String {
    let mut out = String::new();
    for bb in bboxes {
        out.push_str(&format!(
            "{} {} {} {} {}\n",
            bb.class, bb.center_x, bb.center_y, bb.width, bb.height
        ));
    }
    out
}
