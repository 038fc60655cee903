use noise::{NoiseFn, Perlin};

/// Octave-blended Perlin noise sampled over (x, y, time).
///
/// Octave `k` runs at frequency `2^k` with amplitude `falloff^k`, each from its
/// own seeded Perlin source. Output is normalized into `0.0..=1.0`.
pub struct NoiseSource {
    seed: u32,
    falloff: f64,
    octaves: Vec<Perlin>,
}

impl NoiseSource {
    pub fn new(seed: u32, octaves: usize, falloff: f64) -> Self {
        let mut source = NoiseSource {
            seed,
            falloff: 0.0,
            octaves: Vec::new(),
        };
        source.set_detail(octaves, falloff);
        source
    }

    /// Change octave count and falloff. Falloff is expected pre-clamped to 0..=1.
    pub fn set_detail(&mut self, octaves: usize, falloff: f64) {
        let octaves = octaves.max(1);
        if octaves != self.octaves.len() {
            self.octaves = (0..octaves)
                .map(|k| Perlin::new(self.seed.wrapping_add(k as u32)))
                .collect();
        }
        self.falloff = falloff;
    }

    pub fn octaves(&self) -> usize {
        self.octaves.len()
    }

    pub fn falloff(&self) -> f64 {
        self.falloff
    }

    pub fn sample(&self, x: f64, y: f64, t: f64) -> f64 {
        let mut total = 0.0;
        let mut weight = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        for source in &self.octaves {
            total += source.get([x * frequency, y * frequency, t * frequency]) * amplitude;
            weight += amplitude;
            amplitude *= self.falloff;
            frequency *= 2.0;
        }
        ((total / weight + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_unit_range() {
        let noise = NoiseSource::new(7, 6, 0.9);
        for i in 0..500 {
            let v = noise.sample(i as f64 * 0.173, i as f64 * 0.091, i as f64 * 0.011);
            assert!((0.0..=1.0).contains(&v), "sample {} out of range", v);
        }
    }

    #[test]
    fn same_inputs_same_output() {
        let a = NoiseSource::new(42, 4, 0.65);
        let b = NoiseSource::new(42, 4, 0.65);
        let p = (1.37, 0.42, 0.25);
        assert_eq!(a.sample(p.0, p.1, p.2).to_bits(), b.sample(p.0, p.1, p.2).to_bits());
    }

    #[test]
    fn nearby_inputs_stay_close() {
        let noise = NoiseSource::new(3, 4, 0.5);
        let a = noise.sample(0.5, 0.5, 0.1);
        let b = noise.sample(0.5005, 0.5, 0.1);
        assert!((a - b).abs() < 0.01);
    }

    #[test]
    fn set_detail_takes_effect_immediately() {
        let mut noise = NoiseSource::new(11, 1, 0.5);
        let coarse = noise.sample(0.3, 0.7, 0.2);
        noise.set_detail(8, 1.0);
        assert_eq!(noise.octaves(), 8);
        assert_eq!(noise.falloff(), 1.0);
        let fine = noise.sample(0.3, 0.7, 0.2);
        assert_ne!(coarse.to_bits(), fine.to_bits());
    }

    #[test]
    fn zero_falloff_is_first_octave_only() {
        let single = NoiseSource::new(5, 1, 0.0);
        let many = NoiseSource::new(5, 6, 0.0);
        let p = (2.3, 1.1, 0.4);
        assert_eq!(single.sample(p.0, p.1, p.2), many.sample(p.0, p.1, p.2));
    }

    #[test]
    fn zero_octaves_are_raised_to_one() {
        let noise = NoiseSource::new(1, 0, 0.5);
        assert_eq!(noise.octaves(), 1);
    }
}
