//! The Metropolis-Hastings sampling batch. See spec.md §4.5.
//!
//! Standard Metropolis acceptance uses an importance ratio; here
//! importance is `maxIdx^2 * contribute`, biasing the walk toward long
//! orbits that actually visit the viewport.

use crate::complex::Complex64;
use crate::deposit::{draw_point, RawBuffer};
use crate::orbit::evaluate;
use crate::rng::WorkerRng;
use crate::seed::find_point;
use crate::view::ViewParams;

/// Per-channel deposit mask for one orbit index: `low_k < i < high_k`.
fn mask_for_index(view: &ViewParams, i: u32) -> [bool; 3] {
    let mut mask = [false; 3];
    for (k, w) in view.windows.iter().enumerate() {
        mask[k] = w.low < i && i < w.high;
    }
    mask
}

/// Run one outer Metropolis batch. Returns the total number of
/// iterations `calculated` across every orbit evaluated, for telemetry.
///
/// `should_continue` is polled once per proposal and should return
/// `false` as soon as the worker has been asked to pause or stop; the
/// batch then returns early with whatever has accumulated so far.
pub fn metropolis(
    view: &ViewParams,
    rng: &mut WorkerRng,
    sequence: &mut [Complex64],
    raw: &mut RawBuffer,
    mut should_continue: impl FnMut() -> bool,
) -> u32 {
    let (mut ok, seed_result) = find_point(Complex64::ZERO, view, rng, sequence);
    let mut total_calculated = seed_result.calculated;
    if seed_result.contribute == 0 {
        return total_calculated;
    }

    let mut max_sel = seed_result.max_idx;
    let mut cnt_sel = seed_result.contribute;

    let proposal_count = (cnt_sel as u64 * 256).max(max_sel.max(0) as u64 * 2);
    let radius = 40.0 / view.scale;

    for _ in 0..proposal_count {
        if !should_continue() {
            break;
        }

        let step = radius * rng.uniform();
        let (dx, dy) = rng.exponential_pair(step);
        let begin_prop = Complex64::new(ok.re + dx, ok.im + dy);

        let prop = evaluate(begin_prop, view, sequence);
        total_calculated += prop.calculated;

        if prop.max_idx <= 0 || prop.contribute == 0 {
            continue;
        }

        // Unconditionally deposit every non-rejected proposal's hits,
        // whether or not it is accepted into the chain (Open Question
        // in spec.md §9: density != stationary distribution, by design).
        if prop.max_idx >= view.low as i64 {
            let span = (prop.max_idx - view.low as i64) as u32;
            let span = span.min(sequence.len() as u32 - 1);
            for h in 0..=span {
                let i = h + view.low;
                let mask = mask_for_index(view, i);
                draw_point(raw, view, sequence[h as usize], mask);
            }
        }

        let alpha = (prop.max_idx as f64).powi(2) * prop.contribute as f64
            / ((max_sel as f64).powi(2) * cnt_sel as f64);
        if alpha > rng.uniform() {
            ok = begin_prop;
            max_sel = prop.max_idx;
            cnt_sel = prop.contribute;
        }
    }

    total_calculated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deposit::new_raw_buffer;
    use crate::view::IterWindow;

    fn view() -> ViewParams {
        let w = [IterWindow::new(0, 300).unwrap(); 3];
        ViewParams::derive(-0.5, 0.0, 150.0, 48, 48, w).unwrap()
    }

    #[test]
    fn metropolis_deposits_into_the_viewport() {
        let view = view();
        let mut rng = WorkerRng::new(99, 0);
        let mut sequence = vec![Complex64::ZERO; view.sequence_len()];
        let mut raw = new_raw_buffer(&view);

        let calculated = metropolis(&view, &mut rng, &mut sequence, &mut raw, || true);
        assert!(calculated > 0);
    }

    #[test]
    fn should_continue_false_stops_early() {
        let view = view();
        let mut rng = WorkerRng::new(5, 0);
        let mut sequence = vec![Complex64::ZERO; view.sequence_len()];
        let mut raw = new_raw_buffer(&view);

        let calculated = metropolis(&view, &mut rng, &mut sequence, &mut raw, || false);
        // find_point + initial seed evaluation still runs; the proposal
        // loop itself must not execute once should_continue returns false.
        assert!(calculated > 0);
    }
}
