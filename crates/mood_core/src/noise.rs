//! Seeded 2D gradient noise, its fractal sum and the curl flow derived from it.

const SEED: u32 = 1337;
const OCTAVES: usize = 4;

/// Step used for the finite differences in [`NoiseField::curl`].
pub const CURL_EPSILON: f64 = 0.0007;

/// Permutation-table gradient noise.
///
/// The table is shuffled once from a fixed seed, so two fields always agree
/// on every input. The field is immutable after construction and can be
/// shared freely between render loops.
#[derive(Clone)]
pub struct NoiseField {
    perm: [u8; 512],
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseField {
    pub fn new() -> Self {
        let mut base = [0u8; 256];
        for (i, slot) in base.iter_mut().enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates driven by a 32-bit LCG.
        let mut state = SEED;
        for i in (1..256usize).rev() {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let j = ((state as u64 * (i as u64 + 1)) >> 32) as usize;
            base.swap(i, j);
        }

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = base[i & 255];
        }
        Self { perm }
    }

    /// Classic 2D gradient noise in [-1, 1].
    pub fn gradient_noise(&self, x: f64, y: f64) -> f64 {
        let x_floor = x.floor();
        let y_floor = y.floor();
        let xi = (x_floor as i64 & 255) as usize;
        let yi = (y_floor as i64 & 255) as usize;
        let xf = x - x_floor;
        let yf = y - y_floor;
        let u = fade(xf);
        let v = fade(yf);

        let p = &self.perm;
        let aa = p[xi + p[yi] as usize];
        let ab = p[xi + p[yi + 1] as usize];
        let ba = p[xi + 1 + p[yi] as usize];
        let bb = p[xi + 1 + p[yi + 1] as usize];

        let x1 = lerp(grad(aa, xf, yf), grad(ba, xf - 1.0, yf), u);
        let x2 = lerp(grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0), u);
        lerp(x1, x2, v)
    }

    /// Four octaves of [`gradient_noise`](Self::gradient_noise). Roughly in
    /// [-1, 1]; not renormalized.
    pub fn fractal_noise(&self, x: f64, y: f64) -> f64 {
        let mut sum = 0.0;
        let mut amp = 0.5;
        let mut freq = 1.0;
        for _ in 0..OCTAVES {
            sum += amp * self.gradient_noise(x * freq, y * freq);
            freq *= 2.0;
            amp *= 0.5;
        }
        sum
    }

    /// Unit flow direction at `(x, y)`: the fractal field's gradient rotated
    /// by 90 degrees.
    pub fn curl(&self, x: f64, y: f64) -> (f64, f64) {
        self.curl_with_epsilon(x, y, CURL_EPSILON)
    }

    pub fn curl_with_epsilon(&self, x: f64, y: f64, eps: f64) -> (f64, f64) {
        let n1 = self.fractal_noise(x, y + eps);
        let n2 = self.fractal_noise(x, y - eps);
        let n3 = self.fractal_noise(x + eps, y);
        let n4 = self.fractal_noise(x - eps, y);

        let vx = (n1 - n2) / (2.0 * eps);
        let vy = -(n3 - n4) / (2.0 * eps);

        let mut len = vx.hypot(vy);
        if len == 0.0 || !len.is_finite() {
            len = 1.0;
        }
        (vx / len, vy / len)
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn grad(hash: u8, x: f64, y: f64) -> f64 {
    match hash & 7 {
        0 => x + y,
        1 => x - y,
        2 => -x + y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}
