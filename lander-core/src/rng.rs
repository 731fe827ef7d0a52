/// Xorshift32 generator behind every environment reset.
#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.state
    }

    /// Uniform in `[0, 1)` with 24 bits of resolution.
    pub fn next_unit(&mut self) -> f64 {
        (self.next() >> 8) as f64 / (1u32 << 24) as f64
    }

    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        debug_assert!(max >= min);
        min + (max - min) * self.next_unit()
    }
}
