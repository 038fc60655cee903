use glam::DVec2;
use std::f64::consts::TAU;

use super::noise::NoiseSource;
use super::settings::Settings;

/// A short direction marker for one grid cell, used to visualize the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLine {
    pub center: DVec2,
    pub heading: f64,
    pub length: f64,
}

/// Grid of unit direction vectors stored row-major (`y * columns + x`).
pub struct FlowField {
    columns: usize,
    rows: usize,
    cell_w: f64,
    cell_h: f64,
    vectors: Vec<DVec2>,
}

impl FlowField {
    /// Allocate a `rows x columns` grid sized to the canvas. Vectors start at zero
    /// until the first [`FlowField::build`].
    pub fn new(settings: &Settings) -> Self {
        let columns = settings.columns.max(1);
        let rows = settings.rows.max(1);
        let mut field = FlowField {
            columns,
            rows,
            cell_w: 1.0,
            cell_h: 1.0,
            vectors: vec![DVec2::ZERO; columns * rows],
        };
        field.resize(settings.width, settings.height);
        field
    }

    /// Re-derive the pixel extent of a cell. Cells never shrink below one pixel.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.cell_w = (width / self.columns as f64).floor().max(1.0);
        self.cell_h = (height / self.rows as f64).floor().max(1.0);
    }

    /// Regenerate every cell from noise at temporal coordinate `zoff`.
    ///
    /// The spatial offsets climb over the first half of each axis and fall over
    /// the second half, so the pattern mirrors around the grid centre.
    pub fn build(&mut self, settings: &Settings, noise: &NoiseSource, zoff: f64) {
        let inc = settings.xy_increment;
        let half_cols = self.columns as f64 / 2.0;
        let half_rows = self.rows as f64 / 2.0;

        let mut yoff = 0.0;
        for y in 0..self.rows {
            let mut xoff = 0.0;
            for x in 0..self.columns {
                let angle = noise.sample(xoff, yoff, zoff) * TAU * 2.0;
                self.vectors[y * self.columns + x] = DVec2::new(angle.cos(), angle.sin());
                xoff += if (x as f64) < half_cols { inc } else { -inc };
            }
            yoff += if (y as f64) < half_rows { inc } else { -inc };
        }
    }

    /// Grid cell under a canvas point. Points past an edge (particles in the
    /// wrap margin, or in the strip left over by flooring the cell size) map
    /// to the nearest edge cell.
    pub fn cell_of(&self, point: DVec2) -> (usize, usize) {
        let clamp = |v: f64, cells: usize| v.floor().clamp(0.0, (cells - 1) as f64) as usize;
        (
            clamp(point.x / self.cell_w, self.columns),
            clamp(point.y / self.cell_h, self.rows),
        )
    }

    pub fn vector_at(&self, x: usize, y: usize) -> DVec2 {
        let x = x.min(self.columns - 1);
        let y = y.min(self.rows - 1);
        self.vectors[y * self.columns + x]
    }

    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_w, self.cell_h)
    }

    pub fn vectors(&self) -> &[DVec2] {
        &self.vectors
    }

    /// One line per cell, anchored at the cell centre, one cell wide.
    pub fn lines(&self) -> impl Iterator<Item = FieldLine> + '_ {
        (0..self.rows).flat_map(move |y| {
            (0..self.columns).map(move |x| {
                let v = self.vectors[y * self.columns + x];
                FieldLine {
                    center: DVec2::new(
                        x as f64 * self.cell_w + self.cell_w / 2.0,
                        y as f64 * self.cell_h + self.cell_h / 2.0,
                    ),
                    heading: v.y.atan2(v.x),
                    length: self.cell_w,
                }
            })
        })
    }

    #[cfg(test)]
    pub fn uniform(settings: &Settings, v: DVec2) -> Self {
        let mut field = FlowField::new(settings);
        field.vectors.fill(v);
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(rows: usize, columns: usize) -> Settings {
        Settings {
            rows,
            columns,
            width: 300.0,
            height: 200.0,
            ..Settings::default()
        }
    }

    #[test]
    fn build_fills_every_cell_with_a_unit_vector() {
        for &(r, c) in &[(1, 1), (2, 3), (15, 15), (7, 50)] {
            let s = settings(r, c);
            let noise = NoiseSource::new(9, s.octaves, s.falloff);
            let mut field = FlowField::new(&s);
            field.build(&s, &noise, 0.37);
            assert_eq!(field.vectors().len(), r * c);
            for v in field.vectors() {
                assert!(v.is_finite());
                assert!((v.length() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn two_by_two_scenario_has_no_nan() {
        let s = Settings {
            octaves: 1,
            falloff: 0.5,
            xy_increment: 0.05,
            z_increment: 0.0,
            ..settings(2, 2)
        };
        let noise = NoiseSource::new(0, s.octaves, s.falloff);
        let mut field = FlowField::new(&s);
        field.build(&s, &noise, 0.0);
        assert_eq!(field.vectors().len(), 4);
        assert!(field.vectors().iter().all(|v| !v.is_nan() && v.length() > 0.5));
    }

    #[test]
    fn build_is_deterministic() {
        let s = settings(9, 13);
        let noise = NoiseSource::new(1234, s.octaves, s.falloff);
        let mut a = FlowField::new(&s);
        let mut b = FlowField::new(&s);
        a.build(&s, &noise, 1.5);
        b.build(&s, &noise, 1.5);
        let bits = |f: &FlowField| -> Vec<(u64, u64)> {
            f.vectors().iter().map(|v| (v.x.to_bits(), v.y.to_bits())).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn offsets_mirror_around_the_centre() {
        // Four columns: xoff runs 0, inc, 2inc, inc, so columns 1 and 3 share a sample.
        let s = settings(1, 4);
        let noise = NoiseSource::new(77, s.octaves, s.falloff);
        let mut field = FlowField::new(&s);
        field.build(&s, &noise, 0.2);
        assert_eq!(field.vector_at(1, 0), field.vector_at(3, 0));
    }

    #[test]
    fn cell_size_is_floored() {
        let field = FlowField::new(&settings(3, 7));
        assert_eq!(field.cell_size(), (42.0, 66.0));
    }

    #[test]
    fn tiny_canvas_keeps_one_pixel_cells() {
        let s = Settings {
            width: 3.0,
            height: 2.0,
            ..settings(15, 15)
        };
        assert_eq!(FlowField::new(&s).cell_size(), (1.0, 1.0));
    }

    #[test]
    fn cell_of_floors_by_cell_size() {
        let field = FlowField::new(&settings(4, 6));
        assert_eq!(field.cell_of(DVec2::new(49.9, 50.0)), (0, 1));
        assert_eq!(field.cell_of(DVec2::new(150.0, 199.0)), (3, 3));
    }

    #[test]
    fn cell_of_stays_in_grid_inside_canvas() {
        let s = settings(4, 6);
        let field = FlowField::new(&s);
        for i in 0..300 {
            let p = DVec2::new(i as f64 * 0.999, (i as f64 * 0.66) % 200.0);
            let (x, y) = field.cell_of(p);
            assert!(x < 6 && y < 4, "{:?} -> {:?}", p, (x, y));
        }
    }

    #[test]
    fn canvas_edges_clamp_instead_of_overflowing() {
        let s = settings(4, 7);
        let mut field = FlowField::uniform(&s, DVec2::X);
        field.vectors[4 * 7 - 1] = DVec2::Y;
        // 300 / 7 floors to 42, so x = W would land in cell 7, one past the end
        let (x, y) = field.cell_of(DVec2::new(300.0, 200.0));
        assert_eq!((x, y), (6, 3));
        assert_eq!(field.vector_at(x, y), DVec2::Y);
        assert_eq!(field.cell_of(DVec2::new(-4.0, -1.0)), (0, 0));
        assert_eq!(field.vector_at(100, 100), DVec2::Y);
        assert_eq!(field.vector_at(0, 0), DVec2::X);
    }

    #[test]
    fn lines_cover_every_cell_centre() {
        let s = settings(2, 3);
        let field = FlowField::uniform(&s, DVec2::Y);
        let lines: Vec<_> = field.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].center, DVec2::new(50.0, 50.0));
        assert_eq!(lines[5].center, DVec2::new(250.0, 150.0));
        assert!((lines[0].heading - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(lines[0].length, 100.0);
    }
}
