//! Orbit evaluation: iterate `z <- z^2 + c`, reject obvious in-set starts
//! analytically, detect periodicity, and report how much of the orbit
//! fell inside the viewport. See spec.md §4.2.

use crate::complex::Complex64;
use crate::view::ViewParams;

/// `f32::EPSILON` promoted to `f64`, per Design Notes §9 ("preserve
/// exactly: single reference point, doubling `critical_step`, epsilon =
/// float epsilon").
const CYCLE_EPSILON: f64 = f32::EPSILON as f64;

const ESCAPE_RADIUS_SQR: f64 = 4.0;
const INITIAL_CRITICAL_STEP: u32 = 16;

/// Sentinel "no data yet" center distance, matching the original's
/// `centerDistance = 64.0;` set before the bulb/cardioid checks run.
const SENTINEL_CENTER_DIST: f64 = 64.0;

/// Result of iterating one candidate start point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitResult {
    /// Index of the last *useful* iteration (`high - 1` at most), or `-1`
    /// if the orbit was rejected as in-set (bulb/cardioid/periodic/never
    /// escaped within `high` steps).
    pub max_idx: i64,
    /// Number of orbit points (counting the imaginary-axis mirror) that
    /// fell inside the viewport.
    pub contribute: u32,
    /// Number of iterations actually performed.
    pub calculated: u32,
    /// Smallest squared distance from any orbit point to the view
    /// center, `0.0` once the orbit has passed through the viewport.
    pub min_center_dist: f64,
}

impl OrbitResult {
    pub fn is_useful(&self) -> bool {
        self.max_idx >= 0
    }
}

/// Analytical bulb/cardioid membership tests that let us skip iterating
/// points that are known to lie inside the Mandelbrot set.
fn in_known_bulb(cr: f64, ci: f64) -> bool {
    // Period-2 bulb.
    if (cr + 1.0).powi(2) + ci * ci < 1.0 / 16.0 {
        return true;
    }
    // Main cardioid.
    let q = (cr - 0.25).powi(2) + ci * ci;
    if q * (q + cr - 0.25) < 0.25 * ci * ci {
        return true;
    }
    // Small bulb left of the period-2 bulb.
    if (cr + 1.309).powi(2) + ci * ci < 0.00345 {
        return true;
    }
    // Upper/lower cardioid satellites.
    if (cr + 0.125).powi(2) + (ci - 0.744).powi(2) < 0.0088 {
        return true;
    }
    if (cr + 0.125).powi(2) + (ci + 0.744).powi(2) < 0.0088 {
        return true;
    }
    false
}

/// Whether `z` (or its mirror about the real axis) lands inside the
/// viewport rectangle.
fn inside_viewport(z: Complex64, view: &ViewParams) -> bool {
    if z.re < view.min_re || z.re > view.max_re {
        return false;
    }
    (z.im >= view.min_im && z.im <= view.max_im) || (-z.im >= view.min_im && -z.im <= view.max_im)
}

/// Iterate the orbit of `c` up to `view.high` steps. `sequence` must have
/// length `view.high - view.low`; `sequence[h]` receives `z` at iteration
/// `view.low + h`.
pub fn evaluate(c: Complex64, view: &ViewParams, sequence: &mut [Complex64]) -> OrbitResult {
    if in_known_bulb(c.re, c.im) {
        return OrbitResult {
            max_idx: -1,
            contribute: 0,
            calculated: 0,
            min_center_dist: SENTINEL_CENTER_DIST,
        };
    }

    let center = Complex64::new(view.center_re, view.center_im);
    let mut z = c;
    let mut contribute = 0u32;
    let mut min_center_dist = SENTINEL_CENTER_DIST;
    let mut critical_step = INITIAL_CRITICAL_STEP;
    let mut z_critical = z;

    for i in 0..view.high {
        if i >= view.low {
            sequence[(i - view.low) as usize] = z;
        }

        if inside_viewport(z, view) {
            contribute += 1;
            min_center_dist = 0.0;
        }

        let norm_sqr = z.norm_sqr();
        if min_center_dist != 0.0 && norm_sqr < ESCAPE_RADIUS_SQR {
            let d = (z - center).norm_sqr();
            if d < min_center_dist {
                min_center_dist = d;
            }
        }

        if norm_sqr > ESCAPE_RADIUS_SQR && !inside_viewport(z, view) {
            return OrbitResult {
                max_idx: i as i64 - 1,
                contribute,
                calculated: i + 1,
                min_center_dist,
            };
        }

        if i == critical_step {
            z_critical = z;
        } else if i > critical_step && (z - z_critical).norm_sqr() < CYCLE_EPSILON * CYCLE_EPSILON {
            return OrbitResult { max_idx: -1, contribute, calculated: i + 1, min_center_dist };
        }
        if i == 2 * critical_step {
            critical_step *= 2;
            z_critical = z;
        }

        z = z.step(c);
    }

    OrbitResult { max_idx: -1, contribute, calculated: view.high, min_center_dist }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::IterWindow;

    fn small_view(low: u32, high: u32) -> ViewParams {
        let w = [IterWindow::new(low, high).unwrap(); 3];
        ViewParams::derive(-0.5, 0.0, 200.0, 256, 256, w).unwrap()
    }

    #[test]
    fn main_cardioid_is_rejected() {
        let view = small_view(0, 200);
        let mut seq = vec![Complex64::ZERO; view.sequence_len()];
        let r = evaluate(Complex64::new(0.25, 0.0), &view, &mut seq);
        assert_eq!(r.max_idx, -1);
        assert_eq!(r.contribute, 0);
    }

    #[test]
    fn period_2_bulb_is_rejected() {
        let view = small_view(0, 200);
        let mut seq = vec![Complex64::ZERO; view.sequence_len()];
        let r = evaluate(Complex64::new(-1.0, 0.0), &view, &mut seq);
        assert_eq!(r.max_idx, -1);
    }

    #[test]
    fn escaping_point_reports_nonnegative_max_idx() {
        let view = small_view(0, 200);
        let mut seq = vec![Complex64::ZERO; view.sequence_len()];
        let r = evaluate(Complex64::new(-1.75, 0.0), &view, &mut seq);
        assert!(r.max_idx >= 0);
    }

    #[test]
    fn contribute_never_exceeds_calculated() {
        let view = small_view(0, 500);
        let mut seq = vec![Complex64::ZERO; view.sequence_len()];
        for i in 0..200 {
            let cr = -2.0 + 3.0 * (i as f64 / 200.0);
            let r = evaluate(Complex64::new(cr, 0.05), &view, &mut seq);
            assert!(r.contribute as u32 <= r.calculated);
            assert!(r.calculated <= view.high);
        }
    }

    #[test]
    fn single_step_window_fills_at_most_one_slot() {
        let view = small_view(0, 1);
        let mut seq = vec![Complex64::ZERO; view.sequence_len()];
        assert_eq!(seq.len(), 1);
        let _ = evaluate(Complex64::new(-1.9, 0.0), &view, &mut seq);
    }
}
