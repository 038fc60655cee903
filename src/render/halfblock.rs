use super::FrameWriter;
use super::canvas::{Canvas, ColorMode, Rgb};

/// Below this a half is treated as background. Brightness is carried by the
/// colour itself here, so the cut-off sits far lower than braille's.
const DARK: f64 = 0.02;

fn shade(rgb: Rgb, v: f64) -> Rgb {
    let v = v.clamp(0.0, 1.0);
    let s = |c: u8| (c as f64 * v) as u8;
    (s(rgb.0), s(rgb.1), s(rgb.2))
}

pub fn render(canvas: &Canvas) -> String {
    let (cols, rows) = canvas.term_size();
    let mut w = FrameWriter::with_capacity(cols * rows * 12);

    for row in 0..rows {
        for col in 0..cols {
            let top = row * 2 * canvas.width + col;
            let bot = top + canvas.width;
            let (tv, bv) = (canvas.pixels[top], canvas.pixels[bot]);
            let (top_lit, bot_lit) = (tv >= DARK, bv >= DARK);

            if canvas.color_mode == ColorMode::Mono {
                w.push(match (top_lit, bot_lit) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            } else if !top_lit && !bot_lit {
                w.reset();
                w.push(' ');
            } else {
                let fg = canvas.map_color(shade(canvas.colors[top], tv));
                let bg = canvas.map_color(shade(canvas.colors[bot], bv));
                w.set_colors(Some(fg), Some(bg));
                w.push('▀');
            }
        }
        w.end_row(row);
    }
    w.finish()
}
