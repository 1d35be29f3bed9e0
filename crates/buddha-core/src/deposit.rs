//! Hit deposition into the raw accumulator. See spec.md §4.3.
//!
//! A plain function rather than a macro (Design Notes §9): takes the
//! orbit point and a per-channel mask, and writes both `y` and its
//! mirror across the real axis, exploiting the Buddhabrot's symmetry to
//! double the effective sample count per evaluated orbit.

use crate::complex::Complex64;
use crate::view::ViewParams;

pub type RawBuffer = Vec<u64>;

pub fn new_raw_buffer(view: &ViewParams) -> RawBuffer {
    vec![0u64; 3 * view.size()]
}

/// Deposit one orbit point into `raw`, incrementing each enabled channel
/// for both `z` and its conjugate (`drawPoint(z, mask)` /
/// `drawPoint(conj(z), mask)` land on the same set of cells up to the
/// `y <-> height - 1 - y` reflection).
pub fn draw_point(raw: &mut RawBuffer, view: &ViewParams, z: Complex64, mask: [bool; 3]) {
    if z.re < view.min_re || z.re > view.max_re {
        return;
    }
    let x = ((z.re - view.min_re) * view.scale).floor();
    if x < 0.0 || x >= view.width as f64 {
        return;
    }
    let x = x as usize;

    deposit_row(raw, view, x, z.im, mask);
    deposit_row(raw, view, x, -z.im, mask);
}

fn deposit_row(raw: &mut RawBuffer, view: &ViewParams, x: usize, im: f64, mask: [bool; 3]) {
    if im < view.min_im || im > view.max_im {
        return;
    }
    let y = ((view.max_im - im) * view.scale).floor();
    if y < 0.0 || y >= view.height as f64 {
        return;
    }
    let y = y as usize;
    let base = (y * view.width as usize + x) * 3;
    for (channel, enabled) in mask.iter().enumerate() {
        if *enabled {
            raw[base + channel] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::IterWindow;

    fn view() -> ViewParams {
        let w = [IterWindow::new(0, 10).unwrap(); 3];
        ViewParams::derive(0.0, 0.0, 50.0, 8, 8, w).unwrap()
    }

    #[test]
    fn mirrored_points_hit_mirrored_rows() {
        let view = view();
        let mut raw = new_raw_buffer(&view);
        draw_point(&mut raw, &view, Complex64::new(0.01, 0.03), [true, false, false]);

        let mut raw_conj = new_raw_buffer(&view);
        draw_point(&mut raw_conj, &view, Complex64::new(0.01, -0.03), [true, false, false]);

        assert_eq!(raw, raw_conj);
    }

    #[test]
    fn single_point_increments_two_cells_when_off_axis() {
        let view = view();
        let mut raw = new_raw_buffer(&view);
        draw_point(&mut raw, &view, Complex64::new(0.01, 0.03), [true, true, true]);
        let hit_cells = raw.iter().filter(|&&v| v > 0).count();
        assert_eq!(hit_cells, 2 * 3);
    }

    #[test]
    fn out_of_range_point_is_dropped() {
        let view = view();
        let mut raw = new_raw_buffer(&view);
        draw_point(&mut raw, &view, Complex64::new(100.0, 0.0), [true, true, true]);
        assert!(raw.iter().all(|&v| v == 0));
    }

    #[test]
    fn mask_disables_channels() {
        let view = view();
        let mut raw = new_raw_buffer(&view);
        draw_point(&mut raw, &view, Complex64::new(0.0, 0.0), [true, false, false]);
        let nonzero: Vec<usize> = raw.iter().enumerate().filter(|(_, &v)| v > 0).map(|(i, _)| i % 3).collect();
        assert!(nonzero.iter().all(|&ch| ch == 0));
    }
}
