use super::canvas::{Canvas, Rgb};
use crate::sim::{DrawSurface, FieldLine, RenderState};

const FIELD_ALPHA: f64 = 0.4;
const FIELD_COLOR: Rgb = (255, 255, 255);

/// HSB with every channel on a 0..=100 scale to 8-bit RGB.
pub fn hsb_to_rgb(h: f64, s: f64, b: f64) -> Rgb {
    let h = (h / 100.0).rem_euclid(1.0);
    let s = (s / 100.0).clamp(0.0, 1.0);
    let v = (b / 100.0).clamp(0.0, 1.0);
    let c = v * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h * 6.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to8 = |f: f64| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to8(r), to8(g), to8(b))
}

impl DrawSurface for Canvas {
    fn draw_particle(&mut self, state: &RenderState) {
        let corners = state.triangle().map(|p| (p.x, p.y));

        let (h, s, b) = state.fill_hsb();
        self.fill_triangle(corners, state.fill_alpha(), hsb_to_rgb(h, s, b));

        let (h, s, b) = state.stroke_hsb();
        let stroke = hsb_to_rgb(h, s, b);
        let alpha = state.stroke_alpha();
        for i in 0..3 {
            self.line(corners[i], corners[(i + 1) % 3], alpha, stroke);
        }
    }

    fn draw_field_line(&mut self, line: &FieldLine) {
        let (dx, dy) = (line.heading.cos() * line.length, line.heading.sin() * line.length);
        let from = (line.center.x, line.center.y);
        self.line(from, (from.0 + dx, from.1 + dy), FIELD_ALPHA, FIELD_COLOR);
    }
}
