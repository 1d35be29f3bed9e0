//! Seed search: find a starting point whose orbit actually visits the
//! viewport, so the Metropolis walk has somewhere useful to start from.
//! See spec.md §4.4.

use crate::complex::Complex64;
use crate::orbit::{evaluate, OrbitResult};
use crate::rng::WorkerRng;
use crate::view::ViewParams;

const FIND_POINT_CAP: u32 = 256;

/// Gaussian-hillclimb from `begin` (commonly the origin) towards a point
/// whose orbit passes through the viewport. Returns the accepted start
/// point and the `OrbitResult` of its orbit (which may report
/// `contribute == 0` on failure — the caller should retry with a fresh
/// `begin` in that case).
pub fn find_point(
    mut begin: Complex64,
    view: &ViewParams,
    rng: &mut WorkerRng,
    sequence: &mut [Complex64],
) -> (Complex64, OrbitResult) {
    let mut best = evaluate(begin, view, sequence);
    let mut best_dist = best.min_center_dist;

    for _ in 0..FIND_POINT_CAP {
        if best_dist <= 0.0 {
            break;
        }
        let radius = 0.25 * best_dist.sqrt();
        let (dx, dy) = rng.gaussian_pair(radius);
        let candidate = Complex64::new(begin.re + dx, begin.im + dy);
        let result = evaluate(candidate, view, sequence);

        if result.is_useful() && result.min_center_dist < best_dist {
            begin = candidate;
            best_dist = result.min_center_dist;
            best = result;
        }
    }

    (begin, best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::IterWindow;

    fn view_centered_in_set() -> ViewParams {
        // A view whose viewport straddles the real axis near the body
        // of the Mandelbrot set, so the seed search should find a
        // contributing orbit quickly.
        let w = [IterWindow::new(0, 400).unwrap(); 3];
        ViewParams::derive(-0.5, 0.0, 150.0, 64, 64, w).unwrap()
    }

    #[test]
    fn find_point_eventually_contributes_or_gives_up_cleanly() {
        let view = view_centered_in_set();
        let mut rng = WorkerRng::new(123, 0);
        let mut seq = vec![Complex64::ZERO; view.sequence_len()];
        let (_, result) = find_point(Complex64::ZERO, &view, &mut rng, &mut seq);
        // Either it found a contributing orbit, or it terminated with a
        // finite `calculated` count — it must never panic or loop forever.
        assert!(result.calculated <= view.high);
    }
}
