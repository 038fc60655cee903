use super::FrameWriter;
use super::canvas::{Canvas, ColorMode};

/// Bit for each dot of a 2x4 braille cell, indexed `[dy][dx]`.
const DOTS: [[u32; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

const BLANK: u32 = 0x2800;

/// Pixels dimmer than this leave their dot unset.
const THRESHOLD: f64 = 0.3;

pub fn render(canvas: &Canvas) -> String {
    let (cols, rows) = canvas.term_size();
    let mut w = FrameWriter::with_capacity(cols * rows * 20);

    for row in 0..rows {
        for col in 0..cols {
            let mut bits = 0u32;
            let mut sum = [0u32; 3];
            let mut lit = 0u32;

            for (dy, line) in DOTS.iter().enumerate() {
                for (dx, &bit) in line.iter().enumerate() {
                    let idx = (row * 4 + dy) * canvas.width + col * 2 + dx;
                    if canvas.pixels[idx] > THRESHOLD {
                        bits |= bit;
                        let (r, g, b) = canvas.colors[idx];
                        sum[0] += r as u32;
                        sum[1] += g as u32;
                        sum[2] += b as u32;
                        lit += 1;
                    }
                }
            }

            if lit > 0 && canvas.color_mode != ColorMode::Mono {
                let avg = |s: u32| (s / lit) as u8;
                let color = canvas.map_color((avg(sum[0]), avg(sum[1]), avg(sum[2])));
                w.set_colors(Some(color), None);
            }
            w.push(char::from_u32(BLANK + bits).unwrap_or(' '));
        }
        w.end_row(row);
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderMode;

    #[test]
    fn lit_pixels_set_their_dots() {
        let mut c = Canvas::new(2, 1, RenderMode::Braille, ColorMode::Mono);
        c.pixels[0] = 1.0; // top-left of cell 0, dot 1
        c.pixels[3 * c.width + 3] = 1.0; // bottom-right of cell 1, dot 8
        let out = c.render();
        assert!(out.starts_with("\u{2801}\u{2880}"));
    }

    #[test]
    fn dim_pixels_stay_blank() {
        let mut c = Canvas::new(1, 1, RenderMode::Braille, ColorMode::TrueColor);
        c.pixels.fill(0.2);
        assert!(c.render().starts_with('\u{2800}'));
    }

    #[test]
    fn colored_cells_emit_sgr() {
        let mut c = Canvas::new(1, 1, RenderMode::Braille, ColorMode::TrueColor);
        c.pixels[0] = 1.0;
        c.colors[0] = (10, 20, 30);
        assert!(c.render().starts_with("\x1b[38;2;10;20;30m\u{2801}"));
    }
}
