use image::{DynamicImage, GenericImageView, Rgba};
use imageproc::drawing::{draw_hollow_rect_mut, Blend};
use imageproc::rect::Rect;

use crate::dataset::common_structs::YoloBbox;

pub fn draw_bb_to_img(img: &mut DynamicImage, bb: &YoloBbox) {
    draw_bb_to_img_with_color(img, bb, [255, 0, 0, 90]);
}

/// Draws the box outline over the image, converting the normalized center
/// and size back to pixel coordinates
pub fn draw_bb_to_img_with_color(img: &mut DynamicImage, bb: &YoloBbox, rgba_color: [u8; 4]) {
    let (img_width, img_height) = img.dimensions();
    let left = ((bb.center_x - bb.width / 2.0) * f64::from(img_width)).round() as i32;
    let top = ((bb.center_y - bb.height / 2.0) * f64::from(img_height)).round() as i32;
    let width = ((bb.width * f64::from(img_width)).round() as u32).max(1);
    let height = ((bb.height * f64::from(img_height)).round() as u32).max(1);

    let mut img_blend = Blend(img.to_rgba8());
    let rec = Rect::at(left, top).of_size(width, height);
    draw_hollow_rect_mut(&mut img_blend, rec, Rgba(rgba_color));
    std::mem::swap(img, &mut DynamicImage::ImageRgba8(img_blend.0));
}
