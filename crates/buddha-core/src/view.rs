//! View parameters: the rectangle of the complex plane being sampled and
//! the per-channel iteration windows. See spec.md §3.

use std::sync::{Arc, RwLock};

use crate::error::{CoreError, CoreResult};

/// `[low, high)` iteration window for one color channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IterWindow {
    pub low: u32,
    pub high: u32,
}

impl IterWindow {
    pub fn new(low: u32, high: u32) -> CoreResult<Self> {
        if high <= low {
            return Err(CoreError::Configuration(format!(
                "iteration window must have high > low, got [{low}, {high})"
            )));
        }
        Ok(IterWindow { low, high })
    }
}

/// Owned, immutable view state. Published to workers through a
/// `ViewHandle` (see `coordinator.rs`) rather than mutated in place, so a
/// worker reading it mid-batch sees either the old or the new view, never
/// a torn mix of the two (Design Notes §9).
#[derive(Clone, Debug)]
pub struct ViewParams {
    pub center_re: f64,
    pub center_im: f64,
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub windows: [IterWindow; 3],

    // Derived, computed once in `derive()`.
    pub range_re: f64,
    pub range_im: f64,
    pub min_re: f64,
    pub max_re: f64,
    pub min_im: f64,
    pub max_im: f64,
    pub low: u32,
    pub high: u32,
}

impl ViewParams {
    /// Validate and derive a `ViewParams` from raw inputs. Mirrors the
    /// invariants in spec.md §3: `high > low >= 0`, `scale > 0`,
    /// `w*h > 0`.
    pub fn derive(
        center_re: f64,
        center_im: f64,
        scale: f64,
        width: u32,
        height: u32,
        windows: [IterWindow; 3],
    ) -> CoreResult<Self> {
        if scale <= 0.0 {
            return Err(CoreError::Configuration(format!("scale must be > 0, got {scale}")));
        }
        if width == 0 || height == 0 {
            return Err(CoreError::Configuration(format!(
                "width*height must be > 0, got {width}x{height}"
            )));
        }

        let low = windows.iter().map(|w| w.low).min().unwrap();
        let high = windows.iter().map(|w| w.high).max().unwrap();

        let range_re = width as f64 / scale;
        let range_im = height as f64 / scale;
        let min_re = center_re - range_re / 2.0;
        let max_re = center_re + range_re / 2.0;
        let min_im = center_im - range_im / 2.0;
        let max_im = center_im + range_im / 2.0;

        Ok(ViewParams {
            center_re,
            center_im,
            scale,
            width,
            height,
            windows,
            range_re,
            range_im,
            min_re,
            max_re,
            min_im,
            max_im,
            low,
            high,
        })
    }

    pub fn size(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `other` requires a full re-allocation of per-worker
    /// accumulators (dimension change) or just a zeroing (center/scale
    /// change that invalidates existing hits but keeps the buffer size).
    pub fn dimensions_changed(&self, other: &ViewParams) -> bool {
        self.width != other.width || self.height != other.height
    }

    /// Whether `other` invalidates existing accumulator contents: any
    /// change to center, scale, or dimensions (spec.md §3 Lifecycle).
    pub fn invalidates_buffers(&self, other: &ViewParams) -> bool {
        self.dimensions_changed(other)
            || self.center_re != other.center_re
            || self.center_im != other.center_im
            || self.scale != other.scale
    }

    /// Whether `other` requires per-worker sequence buffers to be
    /// resized (combined iteration window width changed).
    pub fn sequence_len_changed(&self, other: &ViewParams) -> bool {
        (self.high - self.low) != (other.high - other.low)
    }

    pub fn sequence_len(&self) -> usize {
        (self.high - self.low) as usize
    }
}

/// Publishes `ViewParams` to workers as an immutable snapshot behind a
/// swappable `Arc`, per Design Notes §9: workers clone the `Arc` once
/// per Metropolis batch rather than reading shared mutable fields, so a
/// `set` mid-batch can at worst hand the next batch a fresher view —
/// never a torn one.
#[derive(Clone)]
pub struct ViewHandle {
    slot: Arc<RwLock<Arc<ViewParams>>>,
}

impl ViewHandle {
    pub fn new(initial: ViewParams) -> Self {
        ViewHandle { slot: Arc::new(RwLock::new(Arc::new(initial))) }
    }

    pub fn current(&self) -> Arc<ViewParams> {
        self.slot.read().unwrap().clone()
    }

    pub fn publish(&self, view: ViewParams) {
        *self.slot.write().unwrap() = Arc::new(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(lo: u32, hi: u32) -> [IterWindow; 3] {
        [IterWindow::new(lo, hi).unwrap(); 3]
    }

    #[test]
    fn rejects_zero_scale() {
        let err = ViewParams::derive(0.0, 0.0, 0.0, 4, 4, windows(0, 10));
        assert!(matches!(err, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn rejects_zero_area() {
        let err = ViewParams::derive(0.0, 0.0, 100.0, 0, 4, windows(0, 10));
        assert!(matches!(err, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn rejects_inverted_window() {
        assert!(IterWindow::new(10, 5).is_err());
        assert!(IterWindow::new(5, 5).is_err());
    }

    #[test]
    fn derives_symmetric_extents() {
        let v = ViewParams::derive(0.0, 0.0, 100.0, 200, 100, windows(0, 10)).unwrap();
        assert_eq!(v.range_re, 2.0);
        assert_eq!(v.range_im, 1.0);
        assert_eq!(v.min_re, -1.0);
        assert_eq!(v.max_re, 1.0);
        assert_eq!(v.min_im, -0.5);
        assert_eq!(v.max_im, 0.5);
    }

    #[test]
    fn combined_window_is_min_low_max_high() {
        let w = [
            IterWindow::new(0, 200).unwrap(),
            IterWindow::new(50, 1000).unwrap(),
            IterWindow::new(100, 5000).unwrap(),
        ];
        let v = ViewParams::derive(0.0, 0.0, 100.0, 4, 4, w).unwrap();
        assert_eq!(v.low, 0);
        assert_eq!(v.high, 5000);
    }

    #[test]
    fn invalidation_tracks_center_scale_dims() {
        let a = ViewParams::derive(0.0, 0.0, 100.0, 4, 4, windows(0, 10)).unwrap();
        let same = ViewParams::derive(0.0, 0.0, 100.0, 4, 4, windows(0, 10)).unwrap();
        assert!(!a.invalidates_buffers(&same));

        let moved = ViewParams::derive(0.1, 0.0, 100.0, 4, 4, windows(0, 10)).unwrap();
        assert!(a.invalidates_buffers(&moved));

        let resized = ViewParams::derive(0.0, 0.0, 100.0, 8, 4, windows(0, 10)).unwrap();
        assert!(a.dimensions_changed(&resized));
        assert!(a.invalidates_buffers(&resized));
    }

    #[test]
    fn view_handle_publishes_latest_snapshot() {
        let handle = ViewHandle::new(ViewParams::derive(0.0, 0.0, 100.0, 4, 4, windows(0, 10)).unwrap());
        let first = handle.current();
        handle.publish(ViewParams::derive(1.0, 0.0, 100.0, 4, 4, windows(0, 10)).unwrap());
        let second = handle.current();
        assert_eq!(first.center_re, 0.0);
        assert_eq!(second.center_re, 1.0);
    }
}
