use crate::export::FieldView;
use glam::Vec2;
use image::{ImageBuffer, Rgb, RgbImage};

/// Speed at which the color ramp saturates (after the x10 gain).
pub const MAX_SPEED: f32 = 10.0;
/// Below this magnitude a cell is drawn as an idle dot.
pub const ARROW_THRESHOLD: f32 = 0.1;

pub const WHITE: [u8; 3] = [255, 255, 255];
pub const GRAY: [u8; 3] = [128, 128, 128];

/// Grey for slow cells, then green -> yellow -> red as speed rises.
pub fn velocity_color(u: f32, v: f32) -> [u8; 3] {
    let speed = u.hypot(v);
    let norm = (speed * 10.0).min(MAX_SPEED) / MAX_SPEED;
    if norm < 0.1 {
        GRAY
    } else if norm < 0.5 {
        let t = norm * 2.0;
        [(255.0 * (1.0 - t)) as u8, (255.0 * t) as u8, 0]
    } else {
        let t = (norm - 0.5) * 2.0;
        [255, (255.0 * (1.0 - t)) as u8, 0]
    }
}

/// Screen-space geometry of one velocity arrow. `+y` points down the grid
/// (increasing row), matching the field's `v` axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowGlyph {
    pub tail: Vec2,
    pub head_base: Vec2,
    pub tip: Vec2,
    pub head_left: Vec2,
    pub head_right: Vec2,
    pub shaft_width: f32,
    pub color: [u8; 3],
}

/// Centre of cell `(row, col)` on a canvas of `cell_size` pixel cells.
pub fn cell_center(row: usize, col: usize, cell_size: f32) -> Vec2 {
    Vec2::new(
        col as f32 * cell_size + cell_size * 0.5,
        row as f32 * cell_size + cell_size * 0.5,
    )
}

/// Arrow for a cell's velocity, or `None` when the cell is idle.
pub fn arrow_glyph(center: Vec2, cell_size: f32, velocity: Vec2) -> Option<ArrowGlyph> {
    let magnitude = velocity.length();
    if magnitude.is_nan() || magnitude < ARROW_THRESHOLD {
        return None;
    }
    let dir = velocity / magnitude;
    let scale = (magnitude * 3.0).min(1.0);

    let shaft_len = cell_size * 0.5 * scale;
    let head_len = cell_size * 0.2 * scale;
    let head_width = cell_size * 0.3 * scale;

    let tail = center - dir * (shaft_len * 0.5);
    let head_base = center + dir * (shaft_len * 0.5);
    let tip = head_base + dir * head_len;
    let perp = dir.perp() * (head_width * 0.5);

    Some(ArrowGlyph {
        tail,
        head_base,
        tip,
        head_left: head_base + perp,
        head_right: head_base - perp,
        shaft_width: (cell_size * 0.1 * scale).max(1.0),
        color: velocity_color(velocity.x, velocity.y),
    })
}

pub struct Renderer {
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// White canvas with one arrow (or idle dot) per cell.
    pub fn render_velocity_field(&self, field: &impl FieldView) -> RgbImage {
        let mut img = ImageBuffer::from_pixel(self.width, self.height, Rgb(WHITE));
        let n = field.size();
        let cell_size = (self.width.min(self.height) as f32 / n as f32).max(1.0);

        for row in 0..n {
            for col in 0..n {
                let idx = row * n + col;
                let center = cell_center(row, col, cell_size);
                let velocity = Vec2::new(field.u()[idx], field.v()[idx]);

                match arrow_glyph(center, cell_size, velocity) {
                    Some(glyph) => draw_arrow(&mut img, &glyph),
                    None => put_pixel(&mut img, center, GRAY),
                }
            }
        }

        img
    }
}

fn put_pixel(img: &mut RgbImage, p: Vec2, color: [u8; 3]) {
    if p.x >= 0.0 && p.y >= 0.0 {
        let (x, y) = (p.x as u32, p.y as u32);
        if x < img.width() && y < img.height() {
            img.put_pixel(x, y, Rgb(color));
        }
    }
}

fn draw_arrow(img: &mut RgbImage, glyph: &ArrowGlyph) {
    draw_segment(img, glyph.tail, glyph.head_base, glyph.shaft_width, glyph.color);
    fill_triangle(img, [glyph.tip, glyph.head_left, glyph.head_right], glyph.color);
}

fn draw_segment(img: &mut RgbImage, a: Vec2, b: Vec2, width: f32, color: [u8; 3]) {
    let steps = (a.distance(b).ceil() as usize).max(1) * 2;
    let half = (width * 0.5).max(0.5);
    for s in 0..=steps {
        let p = a.lerp(b, s as f32 / steps as f32);
        let mut dy = -half;
        while dy <= half {
            let mut dx = -half;
            while dx <= half {
                put_pixel(img, p + Vec2::new(dx, dy), color);
                dx += 1.0;
            }
            dy += 1.0;
        }
    }
}

fn fill_triangle(img: &mut RgbImage, pts: [Vec2; 3], color: [u8; 3]) {
    let min = pts[0].min(pts[1]).min(pts[2]).floor();
    let max = pts[0].max(pts[1]).max(pts[2]).ceil();
    let edge = |a: Vec2, b: Vec2, p: Vec2| (b - a).perp_dot(p - a);
    let area = edge(pts[0], pts[1], pts[2]);
    if area.abs() < f32::EPSILON {
        return;
    }

    let mut y = min.y;
    while y <= max.y {
        let mut x = min.x;
        while x <= max.x {
            let p = Vec2::new(x + 0.5, y + 0.5);
            let w0 = edge(pts[1], pts[2], p) / area;
            let w1 = edge(pts[2], pts[0], p) / area;
            let w2 = edge(pts[0], pts[1], p) / area;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                put_pixel(img, Vec2::new(x, y), color);
            }
            x += 1.0;
        }
        y += 1.0;
    }
}
