use hand_rps_common::gesture::Gesture;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

use crate::features::Features;
use crate::geometry::BoundingBox;

const CONTOUR: Rgb<u8> = Rgb([0, 255, 0]);
const DEFECT: Rgb<u8> = Rgb([255, 0, 0]);
const BOX: Rgb<u8> = Rgb([0, 0, 255]);
const DEFECT_RADIUS: i32 = 8;

const TAG_HEIGHT: u32 = 14;
const TAG_MARGIN: i32 = 2;
const PIP: u32 = 8;
const PIP_GAP: u32 = 4;
const PIP_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

fn tag_color(gesture: Gesture) -> Rgb<u8> {
    match gesture {
        Gesture::Rock => Rgb([255, 140, 0]),
        Gesture::Paper => Rgb([0, 200, 255]),
        Gesture::Scissors => Rgb([255, 0, 200]),
        Gesture::Unknown => Rgb([128, 128, 128]),
    }
}

/// Draw the gesture tag, the hand outline, its bounding box and every
/// accepted finger gap.
pub fn draw_features(frame: &mut RgbImage, features: &Features, gesture: Gesture) {
    draw_tag(frame, &features.bbox, gesture, features.defect_count());

    let points = &features.contour;
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        draw_line_segment_mut(
            frame,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            CONTOUR,
        );
    }

    let bbox = features.bbox;
    if bbox.width > 0 && bbox.height > 0 {
        draw_hollow_rect_mut(
            frame,
            Rect::at(bbox.x, bbox.y).of_size(bbox.width as u32, bbox.height as u32),
            BOX,
        );
    }

    for defect in &features.defects {
        draw_filled_circle_mut(frame, (defect.far.x, defect.far.y), DEFECT_RADIUS, DEFECT);
    }
}

/// Gesture-colored strip above the box, one white pip per finger gap.
fn draw_tag(frame: &mut RgbImage, bbox: &BoundingBox, gesture: Gesture, defects: usize) {
    let pips = PIP_GAP + defects as u32 * (PIP + PIP_GAP);
    let width = (bbox.width.max(1) as u32).max(pips);
    let y = (bbox.y - TAG_HEIGHT as i32 - TAG_MARGIN).max(0);
    draw_filled_rect_mut(
        frame,
        Rect::at(bbox.x, y).of_size(width, TAG_HEIGHT),
        tag_color(gesture),
    );

    let pip_y = y + ((TAG_HEIGHT - PIP) / 2) as i32;
    for i in 0..defects as u32 {
        let x = bbox.x + (PIP_GAP + i * (PIP + PIP_GAP)) as i32;
        draw_filled_rect_mut(frame, Rect::at(x, pip_y).of_size(PIP, PIP), PIP_COLOR);
    }
}
