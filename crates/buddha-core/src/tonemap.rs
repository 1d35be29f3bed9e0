//! Tone-mapping: collapse heavy-tailed hit counts into an 8-bit-per-channel
//! RGB frame. See spec.md §4.7.
//!
//! Passed as configuration rather than process-wide constants (Design
//! Notes §9), so a single process can host more than one view/session
//! with independent contrast/lightness settings.

use crate::deposit::RawBuffer;
use crate::view::ViewParams;

#[derive(Clone, Copy, Debug)]
pub struct ToneMapConfig {
    pub lightness: u32,
    pub contrast: u32,
    pub max_lightness: u32,
    pub max_contrast: u32,
}

impl Default for ToneMapConfig {
    fn default() -> Self {
        ToneMapConfig { lightness: 0, contrast: 0, max_lightness: 200, max_contrast: 300 }
    }
}

impl ToneMapConfig {
    pub fn set_contrast(&mut self, contrast: u32) {
        self.contrast = contrast.min(self.max_contrast);
    }

    pub fn set_lightness(&mut self, lightness: u32) {
        self.lightness = lightness.min(self.max_lightness);
    }
}

/// A rendered frame: `width * height` packed 32-bit words (`r<<16 | g<<8
/// | b`), top-left origin.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

/// Reduce `raw` (interleaved R,G,B counters) into an RGB frame.
pub fn tone_map(raw: &RawBuffer, view: &ViewParams, config: &ToneMapConfig) -> Frame {
    let size = view.size();
    debug_assert_eq!(raw.len(), 3 * size);

    let mut max_channel = [0u64; 3];
    for px in 0..size {
        for ch in 0..3 {
            max_channel[ch] = max_channel[ch].max(raw[px * 3 + ch]);
        }
    }

    let real_lightness =
        config.lightness as f64 / (config.max_lightness as f64 - config.lightness as f64 + 1.0);
    let real_contrast = 2.0 * config.contrast as f64 / config.max_contrast as f64;

    let multiplier: [f64; 3] = std::array::from_fn(|ch| {
        if max_channel[ch] > 0 {
            (view.scale.ln() / (max_channel[ch] as f64).powf(real_contrast)) * 150.0 * real_lightness
        } else {
            0.0
        }
    });

    let mut pixels = vec![0u32; size];
    for px in 0..size {
        let mut word = 0u32;
        for ch in 0..3 {
            let raw_value = raw[px * 3 + ch] as f64;
            let mapped = (raw_value.powf(real_contrast) * multiplier[ch]).min(255.0).max(0.0);
            let byte = mapped as u32;
            word |= byte << (16 - 8 * ch);
        }
        pixels[px] = word;
    }

    Frame { width: view.width, height: view.height, pixels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::IterWindow;

    fn view() -> ViewParams {
        let w = [IterWindow::new(0, 10).unwrap(); 3];
        ViewParams::derive(0.0, 0.0, 50.0, 4, 4, w).unwrap()
    }

    #[test]
    fn all_zero_counters_yield_black_frame() {
        let view = view();
        let raw = vec![0u64; 3 * view.size()];
        let frame = tone_map(&raw, &view, &ToneMapConfig::default());
        assert!(frame.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn output_channels_stay_within_byte_range() {
        let view = view();
        let mut raw = vec![0u64; 3 * view.size()];
        for (i, v) in raw.iter_mut().enumerate() {
            *v = (i as u64 + 1) * 10_000;
        }
        let mut config = ToneMapConfig::default();
        config.set_contrast(300);
        config.set_lightness(200);
        let frame = tone_map(&raw, &view, &config);
        for &p in &frame.pixels {
            let r = (p >> 16) & 0xFF;
            let g = (p >> 8) & 0xFF;
            let b = p & 0xFF;
            assert!(r <= 255 && g <= 255 && b <= 255);
        }
    }

    #[test]
    fn contrast_and_lightness_clamp_to_configured_maxima() {
        let mut config = ToneMapConfig::default();
        config.set_contrast(10_000);
        config.set_lightness(10_000);
        assert_eq!(config.contrast, config.max_contrast);
        assert_eq!(config.lightness, config.max_lightness);
    }
}
