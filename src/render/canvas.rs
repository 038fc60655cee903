use crossterm::style::Color;

/// How sub-cell pixels become terminal characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderMode {
    /// Unicode braille, 2x4 pixels per cell
    Braille,
    /// Half blocks ▀, 1x2 pixels per cell
    HalfBlock,
    /// One pixel per cell drawn with a density ramp
    Ascii,
}

impl RenderMode {
    /// Pixels covered by one terminal cell (columns, rows)
    pub fn cell_pixels(self) -> (usize, usize) {
        match self {
            RenderMode::Braille => (2, 4),
            RenderMode::HalfBlock => (1, 2),
            RenderMode::Ascii => (1, 1),
        }
    }
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Monochrome
    Mono,
    /// ANSI 16 colors
    Ansi16,
    /// 256-color palette
    Ansi256,
    /// 24-bit RGB
    TrueColor,
}

pub type Rgb = (u8, u8, u8);

/// Persistent pixel surface the simulation paints into. Old frames are faded
/// rather than cleared so moving particles leave trails.
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    /// Brightness per pixel, 0.0..=1.0
    pub pixels: Vec<f64>,
    pub colors: Vec<Rgb>,
    pub render_mode: RenderMode,
    pub color_mode: ColorMode,
    /// Round RGB channels to multiples of this step (0 or 1 = off)
    pub color_quant: u8,
}

impl Canvas {
    pub fn new(term_cols: usize, term_rows: usize, render_mode: RenderMode, color_mode: ColorMode) -> Self {
        let (cw, ch) = render_mode.cell_pixels();
        let (width, height) = (term_cols * cw, term_rows * ch);
        Canvas {
            width,
            height,
            pixels: vec![0.0; width * height],
            colors: vec![(0, 0, 0); width * height],
            render_mode,
            color_mode,
            color_quant: 0,
        }
    }

    /// Keep `keep` of every pixel's brightness; the rest fades to black.
    pub fn fade(&mut self, keep: f64) {
        let keep = keep.clamp(0.0, 1.0);
        for p in &mut self.pixels {
            *p *= keep;
        }
    }

    /// Composite `rgb` at opacity `alpha` over the pixel containing (x, y).
    pub fn blend(&mut self, x: f64, y: f64, alpha: f64, rgb: Rgb) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (ix, iy) = (x as usize, y as usize);
        if ix >= self.width || iy >= self.height {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        let idx = iy * self.width + ix;
        let mix = |old: u8, new: u8| (old as f64 + (new as f64 - old as f64) * a).round() as u8;
        let (or, og, ob) = self.colors[idx];
        self.colors[idx] = (mix(or, rgb.0), mix(og, rgb.1), mix(ob, rgb.2));
        self.pixels[idx] += (1.0 - self.pixels[idx]) * a;
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), alpha: f64, rgb: Rgb) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.blend(from.0 + dx * t, from.1 + dy * t, alpha, rgb);
        }
    }

    /// Fill every pixel whose centre lies inside the triangle.
    pub fn fill_triangle(&mut self, corners: [(f64, f64); 3], alpha: f64, rgb: Rgb) {
        let [a, b, c] = corners;
        let edge = |p: (f64, f64), q: (f64, f64), r: (f64, f64)| {
            (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
        };
        let area = edge(a, b, c);
        if area.abs() < f64::EPSILON {
            return;
        }
        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as usize;
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as usize;
        let max_x = a.0.max(b.0).max(c.0).ceil().min(self.width as f64);
        let max_y = a.1.max(b.1).max(c.1).ceil().min(self.height as f64);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        for py in min_y..max_y as usize {
            for px in min_x..max_x as usize {
                let p = (px as f64 + 0.5, py as f64 + 0.5);
                let w0 = edge(b, c, p) * area.signum();
                let w1 = edge(c, a, p) * area.signum();
                let w2 = edge(a, b, p) * area.signum();
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.blend(p.0, p.1, alpha, rgb);
                }
            }
        }
    }

    /// Terminal grid this canvas covers (columns, rows)
    pub fn term_size(&self) -> (usize, usize) {
        let (cw, ch) = self.render_mode.cell_pixels();
        (self.width / cw, self.height / ch)
    }

    /// Centre of a terminal cell in canvas pixels, for mouse input.
    pub fn cell_to_pixel(&self, col: u16, row: u16) -> (f64, f64) {
        let (cw, ch) = self.render_mode.cell_pixels();
        (
            col as f64 * cw as f64 + cw as f64 / 2.0,
            row as f64 * ch as f64 + ch as f64 / 2.0,
        )
    }

    pub fn render(&self) -> String {
        match self.render_mode {
            RenderMode::Braille => super::braille::render(self),
            RenderMode::HalfBlock => super::halfblock::render(self),
            RenderMode::Ascii => super::ascii::render(self),
        }
    }

    pub fn map_color(&self, rgb: Rgb) -> Color {
        let (r, g, b) = if self.color_quant > 1 {
            let q = self.color_quant as u16;
            let snap = |c: u8| ((c as u16 + q / 2) / q * q).min(255) as u8;
            (snap(rgb.0), snap(rgb.1), snap(rgb.2))
        } else {
            rgb
        };
        match self.color_mode {
            ColorMode::Mono => Color::White,
            ColorMode::TrueColor => Color::Rgb { r, g, b },
            ColorMode::Ansi256 => {
                // 6x6x6 cube starting at 16
                let cube = 16 + 36 * (r as u16 / 51) + 6 * (g as u16 / 51) + (b as u16 / 51);
                Color::AnsiValue(cube as u8)
            }
            ColorMode::Ansi16 => nearest_ansi16(r, g, b),
        }
    }
}

fn nearest_ansi16(r: u8, g: u8, b: u8) -> Color {
    let level = (r as u16 + g as u16 + b as u16) / 3;
    let bright = level > 180;
    let max = r.max(g).max(b);
    if level < 48 {
        return Color::Black;
    }
    let spread = max - r.min(g).min(b);
    if spread < 40 {
        return if bright { Color::White } else { Color::Grey };
    }
    let near = |c: u8| c.saturating_add(40) > max;
    let (hr, hg, hb) = (near(r), near(g), near(b));
    match (hr, hg, hb, bright) {
        (true, true, false, true) => Color::Yellow,
        (true, true, false, false) => Color::DarkYellow,
        (true, false, true, true) => Color::Magenta,
        (true, false, true, false) => Color::DarkMagenta,
        (false, true, true, true) => Color::Cyan,
        (false, true, true, false) => Color::DarkCyan,
        (true, _, _, true) => Color::Red,
        (true, _, _, false) => Color::DarkRed,
        (_, true, _, true) => Color::Green,
        (_, true, _, false) => Color::DarkGreen,
        (_, _, _, true) => Color::Blue,
        _ => Color::DarkBlue,
    }
}

/// SGR parameters selecting `color` as foreground (`background = false`) or background.
pub fn sgr(color: Color, background: bool) -> String {
    let base = if background { 40 } else { 30 };
    let code = |n: u8| (base + n as u16).to_string();
    let bright = |n: u8| (base + 60 + n as u16).to_string();
    let lead = if background { 48 } else { 38 };
    match color {
        Color::Rgb { r, g, b } => format!("{};2;{};{};{}", lead, r, g, b),
        Color::AnsiValue(v) => format!("{};5;{}", lead, v),
        Color::Black => code(0),
        Color::DarkRed => code(1),
        Color::DarkGreen => code(2),
        Color::DarkYellow => code(3),
        Color::DarkBlue => code(4),
        Color::DarkMagenta => code(5),
        Color::DarkCyan => code(6),
        Color::Grey => code(7),
        Color::DarkGrey => bright(0),
        Color::Red => bright(1),
        Color::Green => bright(2),
        Color::Yellow => bright(3),
        Color::Blue => bright(4),
        Color::Magenta => bright(5),
        Color::Cyan => bright(6),
        Color::White => bright(7),
        _ => code(7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_size_follows_render_mode() {
        let c = Canvas::new(10, 5, RenderMode::Braille, ColorMode::Mono);
        assert_eq!((c.width, c.height), (20, 20));
        assert_eq!(c.term_size(), (10, 5));
        let c = Canvas::new(10, 5, RenderMode::HalfBlock, ColorMode::Mono);
        assert_eq!((c.width, c.height), (10, 10));
    }

    #[test]
    fn blend_outside_is_ignored() {
        let mut c = Canvas::new(4, 4, RenderMode::Ascii, ColorMode::TrueColor);
        c.blend(-1.0, 0.0, 1.0, (255, 0, 0));
        c.blend(4.0, 0.0, 1.0, (255, 0, 0));
        c.blend(0.0, 100.0, 1.0, (255, 0, 0));
        assert!(c.pixels.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn blend_composites_by_alpha() {
        let mut c = Canvas::new(2, 2, RenderMode::Ascii, ColorMode::TrueColor);
        c.blend(1.2, 0.7, 0.5, (200, 100, 0));
        assert_eq!(c.pixels[1], 0.5);
        assert_eq!(c.colors[1], (100, 50, 0));
        c.blend(1.0, 0.0, 1.0, (10, 20, 30));
        assert_eq!(c.pixels[1], 1.0);
        assert_eq!(c.colors[1], (10, 20, 30));
    }

    #[test]
    fn fade_scales_brightness() {
        let mut c = Canvas::new(2, 1, RenderMode::Ascii, ColorMode::Mono);
        c.pixels[0] = 1.0;
        c.fade(0.8);
        c.fade(0.5);
        assert!((c.pixels[0] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn line_touches_both_ends() {
        let mut c = Canvas::new(10, 10, RenderMode::Ascii, ColorMode::Mono);
        c.line((1.5, 1.5), (7.5, 4.5), 1.0, (255, 255, 255));
        assert_eq!(c.pixels[11], 1.0);
        assert_eq!(c.pixels[4 * 10 + 7], 1.0);
    }

    #[test]
    fn triangle_fills_interior_only() {
        let mut c = Canvas::new(10, 10, RenderMode::Ascii, ColorMode::Mono);
        c.fill_triangle([(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)], 1.0, (255, 255, 255));
        assert_eq!(c.pixels[10 + 1], 1.0);
        assert_eq!(c.pixels[9 * 10 + 9], 0.0);
        // winding order does not matter
        let mut d = Canvas::new(10, 10, RenderMode::Ascii, ColorMode::Mono);
        d.fill_triangle([(0.0, 0.0), (0.0, 8.0), (8.0, 0.0)], 1.0, (255, 255, 255));
        assert_eq!(c.pixels, d.pixels);
    }

    #[test]
    fn mouse_cells_map_to_pixel_centres() {
        let c = Canvas::new(10, 10, RenderMode::Braille, ColorMode::Mono);
        assert_eq!(c.cell_to_pixel(3, 2), (7.0, 10.0));
        let c = Canvas::new(10, 10, RenderMode::HalfBlock, ColorMode::Mono);
        assert_eq!(c.cell_to_pixel(3, 2), (3.5, 5.0));
    }

    #[test]
    fn sgr_codes() {
        assert_eq!(sgr(Color::Rgb { r: 1, g: 2, b: 3 }, false), "38;2;1;2;3");
        assert_eq!(sgr(Color::AnsiValue(42), true), "48;5;42");
        assert_eq!(sgr(Color::DarkRed, false), "31");
        assert_eq!(sgr(Color::White, true), "107");
    }

    #[test]
    fn quantized_colors_snap() {
        let mut c = Canvas::new(1, 1, RenderMode::Ascii, ColorMode::TrueColor);
        c.color_quant = 16;
        assert_eq!(c.map_color((9, 250, 24)), Color::Rgb { r: 16, g: 255, b: 32 });
    }
}
