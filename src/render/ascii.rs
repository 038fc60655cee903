use super::FrameWriter;
use super::canvas::{Canvas, ColorMode};

const RAMP: &[u8] = b" .:-=+*#%@";

pub fn render(canvas: &Canvas) -> String {
    let (cols, rows) = canvas.term_size();
    let mut w = FrameWriter::with_capacity(cols * rows * 8);

    for row in 0..rows {
        for col in 0..cols {
            let idx = row * canvas.width + col;
            let v = canvas.pixels[idx].clamp(0.0, 1.0);
            let ch = RAMP[(v * (RAMP.len() - 1) as f64) as usize] as char;
            if ch != ' ' && canvas.color_mode != ColorMode::Mono {
                w.set_colors(Some(canvas.map_color(canvas.colors[idx])), None);
            }
            w.push(ch);
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
    fn brightness_walks_the_ramp() {
        let mut c = Canvas::new(3, 1, RenderMode::Ascii, ColorMode::Mono);
        c.pixels.copy_from_slice(&[0.0, 0.5, 1.0]);
        assert!(c.render().starts_with(" =@"));
    }

    #[test]
    fn rows_end_with_cursor_move() {
        let c = Canvas::new(2, 2, RenderMode::Ascii, ColorMode::Mono);
        assert_eq!(c.render(), "  \x1b[2;1H  \x1b[3;1H");
    }
}
