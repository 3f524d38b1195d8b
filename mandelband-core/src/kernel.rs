/// Computes iteration counts for a rectangular band of pixels.
///
/// The band's top-left pixel sits at plane `(offset_x, offset_y)`; pixel
/// `(px, py)` inside it maps to `(offset_x + px / scale, offset_y + py / scale)`.
/// The returned vector holds `width * height` counts in row-major order, with
/// `max_iterations` marking points that never escaped.
///
/// Implementations run on worker threads, so they must be `Send + Sync`. The
/// scheduler is generic over the kernel for static dispatch.
pub trait TileKernel: Send + Sync {
    fn compute_tile(
        &self,
        width: u32,
        height: u32,
        offset_x: f64,
        offset_y: f64,
        scale: f64,
        max_iterations: u32,
    ) -> Vec<u32>;
}

/// The Mandelbrot escape-time kernel: `z_{n+1} = z_n² + c`, `z₀ = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeTime;

/// Returns `true` if `c` lies inside the main cardioid.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let qx = re - 0.25;
    let im2 = im * im;
    let q = qx * qx + im2;
    q * (q + qx) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

impl EscapeTime {
    /// Number of iterations before `|z|² > 4`, capped at `max_iterations`.
    ///
    /// Uses the three-multiply form: `z²`'s imaginary part is recovered as
    /// `(x + y)² - x² - y²`.
    #[inline]
    pub fn iterate(re: f64, im: f64, max_iterations: u32) -> u32 {
        if in_cardioid(re, im) || in_period2_bulb(re, im) {
            return max_iterations;
        }

        let mut re_sq = 0.0;
        let mut im_sq = 0.0;
        let mut sum_sq = 0.0;
        let mut i = 0;

        while re_sq + im_sq <= 4.0 && i < max_iterations {
            let x = re_sq - im_sq + re;
            let y = sum_sq - re_sq - im_sq + im;
            re_sq = x * x;
            im_sq = y * y;
            sum_sq = (x + y) * (x + y);
            i += 1;
        }
        i
    }
}

impl TileKernel for EscapeTime {
    fn compute_tile(
        &self,
        width: u32,
        height: u32,
        offset_x: f64,
        offset_y: f64,
        scale: f64,
        max_iterations: u32,
    ) -> Vec<u32> {
        let mut counts = Vec::with_capacity(width as usize * height as usize);
        for py in 0..height {
            let im = py as f64 / scale + offset_y;
            for px in 0..width {
                let re = px as f64 / scale + offset_x;
                counts.push(Self::iterate(re, im, max_iterations));
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_interior() {
        assert_eq!(EscapeTime::iterate(0.0, 0.0, 1000), 1000);
    }

    #[test]
    fn period2_bulb_is_interior() {
        assert_eq!(EscapeTime::iterate(-1.0, 0.0, 500), 500);
    }

    #[test]
    fn far_point_escapes_immediately() {
        assert_eq!(EscapeTime::iterate(10.0, 0.0, 1000), 1);
    }

    #[test]
    fn known_escape_count() {
        // c = 1: z₁ = 1, z₂ = 2 (|z|² = 4, still bounded), z₃ = 5.
        assert_eq!(EscapeTime::iterate(1.0, 0.0, 1000), 3);
    }

    #[test]
    fn respects_iteration_cap() {
        // Just outside the set near the cusp; escapes slowly.
        let n = EscapeTime::iterate(0.2501, 0.0, 10);
        assert!(n <= 10);
    }

    #[test]
    fn tile_is_row_major() {
        let k = EscapeTime;
        // One plane unit per pixel starting at (-3, 0): row 0 is the real axis.
        let counts = k.compute_tile(4, 2, -3.0, 0.0, 1.0, 100);
        assert_eq!(counts.len(), 8);
        assert_eq!(counts[0], EscapeTime::iterate(-3.0, 0.0, 100));
        assert_eq!(counts[2], EscapeTime::iterate(-1.0, 0.0, 100));
        assert_eq!(counts[5], EscapeTime::iterate(-2.0, 1.0, 100));
    }

    #[test]
    fn empty_tile() {
        assert!(EscapeTime.compute_tile(0, 5, 0.0, 0.0, 1.0, 10).is_empty());
    }
}
