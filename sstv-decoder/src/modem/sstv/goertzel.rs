//! Narrowband tone analysis: single-bin Goertzel power, Hann-windowed peak
//! frequency estimation and a narrowband SNR estimate.
//!
//! Window functions and per-length bin tables are built once per length and
//! cached process-wide, since they are read-only after construction.

use std::collections::HashMap;
use std::sync::{
    Mutex,
    OnceLock,
};

pub const SAMPLE_RATE: f32 = 44_100.0;

/// Coefficients for the Goertzel recurrence at one target frequency.
#[derive(Clone, Copy, Debug)]
pub struct GoertzelBin {
    pub freq: f32,
    cos_w: f32,
    sin_w: f32,
    coeff: f32,
}

impl GoertzelBin {
    pub fn new(freq: f32) -> Self {
        let w = 2.0 * std::f32::consts::PI * freq / SAMPLE_RATE;
        let (sin_w, cos_w) = w.sin_cos();
        Self {
            freq,
            cos_w,
            sin_w,
            coeff: 2.0 * cos_w,
        }
    }
}

/// Single-bin power over `data` at `bin`'s frequency. O(N), O(1) state, no
/// allocation.
pub fn goertzel_power(data: &[f32], bin: &GoertzelBin) -> f32 {
    let mut q1 = 0.0f32;
    let mut q2 = 0.0f32;
    for &x in data {
        let q0 = bin.coeff * q1 - q2 + x;
        q2 = q1;
        q1 = q0;
    }
    let real = q1 - q2 * bin.cos_w;
    let imag = q2 * bin.sin_w;
    real * real + imag * imag
}

pub fn hann_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0; length.max(1)];
    }
    (0..length)
        .map(|i| {
            0.5 * (1.0
                - (2.0 * std::f32::consts::PI * i as f32 / (length as f32 - 1.0)).cos())
        })
        .collect()
}

/// Goertzel bins covering `[fmin, fmax]` at the DFT bin spacing of a
/// `length`-sample window, plus the integer bin index each one corresponds
/// to.
pub fn build_bins_for_window(length: usize, fmin: f32, fmax: f32) -> (Vec<GoertzelBin>, Vec<i64>) {
    let kmin = (fmin * length as f32 / SAMPLE_RATE).ceil() as i64;
    let kmax = (fmax * length as f32 / SAMPLE_RATE).floor() as i64;
    let mut bins = Vec::new();
    let mut indices = Vec::new();
    let mut k = kmin;
    while k <= kmax {
        let freq = k as f32 * SAMPLE_RATE / length as f32;
        bins.push(GoertzelBin::new(freq));
        indices.push(k);
        k += 1;
    }
    (bins, indices)
}

const FREQ_MIN: f32 = 1500.0;
const FREQ_MAX: f32 = 2300.0;

struct WindowCacheEntry {
    hann: Vec<f32>,
    bins: Vec<GoertzelBin>,
    indices: Vec<i64>,
}

static WINDOW_CACHE: OnceLock<Mutex<HashMap<usize, &'static WindowCacheEntry>>> = OnceLock::new();

/// Returns the cached Hann window and video-band (1500-2300 Hz) Goertzel
/// bins for `length`, building and leaking them on first use. Leaking is
/// fine here: the set of distinct window lengths used by a running decoder
/// is small and fixed (see `WINDOW_LENGTHS`), so this amounts to one-time
/// process-wide initialization.
pub fn get_window_cache(length: usize) -> (&'static [f32], &'static [GoertzelBin], &'static [i64]) {
    let cache = WINDOW_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap();
    let entry = guard.entry(length).or_insert_with(|| {
        let hann = hann_window(length);
        let (bins, indices) = build_bins_for_window(length, FREQ_MIN, FREQ_MAX);
        Box::leak(Box::new(WindowCacheEntry {
            hann,
            bins,
            indices,
        }))
    });
    (&entry.hann, &entry.bins, &entry.indices)
}

/// Quadratic-log-interpolated peak frequency over a Hann-windowed block.
/// Clamps the refined bin to the table's own span.
pub fn estimate_freq_bins(
    window: &[i16],
    hann: &[f32],
    bins: &[GoertzelBin],
    indices: &[i64],
    length: usize,
) -> f32 {
    let mut weighted = Vec::with_capacity(window.len());
    for (i, &x) in window.iter().enumerate() {
        weighted.push(x as f32 * hann[i]);
    }
    let mut powers = Vec::with_capacity(bins.len());
    let mut max_idx = 0usize;
    let mut max_val = 0.0f32;
    for (i, b) in bins.iter().enumerate() {
        let val = goertzel_power(&weighted, b);
        powers.push(val);
        if val > max_val {
            max_val = val;
            max_idx = i;
        }
    }
    let peak_bin = if max_idx == 0 || max_idx >= powers.len() - 1 {
        indices[max_idx] as f32
    } else {
        let p0 = powers[max_idx - 1];
        let p1 = powers[max_idx];
        let p2 = powers[max_idx + 1];
        let mut peak = indices[max_idx] as f32;
        if p0 > 0.0 && p1 > 0.0 && p2 > 0.0 {
            let denom = 2.0 * ((p1 * p1) / (p0 * p2)).ln();
            if denom != 0.0 {
                peak = indices[max_idx] as f32 + (p2 / p0).ln() / denom;
            }
        }
        peak
    };
    peak_bin * SAMPLE_RATE / length as f32
}

/// Narrowband SNR at `center_idx`, `None` if the window would run off
/// either end of the buffer.
pub fn estimate_snr(
    samples: &[i16],
    center_idx: usize,
    hann: &[f32],
    bins_video: &[GoertzelBin],
    bins_noise: &[GoertzelBin],
    length: usize,
) -> Option<f32> {
    let half = length / 2;
    if center_idx < half || center_idx + half >= samples.len() {
        return None;
    }
    let window = &samples[center_idx - half..center_idx - half + length];
    let weighted: Vec<f32> = window
        .iter()
        .enumerate()
        .map(|(i, &x)| x as f32 * hann[i])
        .collect();
    let p_video: f32 = bins_video.iter().map(|b| goertzel_power(&weighted, b)).sum();
    let p_noise: f32 = bins_noise.iter().map(|b| goertzel_power(&weighted, b)).sum();
    let video_bins = bins_video.len() as f32;
    let noise_bins = bins_noise.len() as f32;
    if noise_bins == 0.0 || video_bins == 0.0 {
        return None;
    }
    let receiver_bins = video_bins + noise_bins;
    let p_noise_est = p_noise * (receiver_bins / noise_bins);
    let p_signal = p_video - p_noise * (video_bins / noise_bins);
    if p_noise_est <= 0.0 {
        return Some(0.0);
    }
    let ratio = (p_signal / p_noise_est).max(0.01);
    Some(10.0 * ratio.log10())
}

/// `{48, 64, 96, 128, 256, 512, 1024}`, selected by `select_window_index`.
pub const WINDOW_LENGTHS: [usize; 7] = [48, 64, 96, 128, 256, 512, 1024];

pub fn select_window_index(snr_db: Option<f32>) -> usize {
    let Some(snr_db) = snr_db else {
        return 3;
    };
    if snr_db >= 20.0 {
        0
    } else if snr_db >= 10.0 {
        1
    } else if snr_db >= 9.0 {
        2
    } else if snr_db >= 3.0 {
        3
    } else if snr_db >= -5.0 {
        4
    } else if snr_db >= -10.0 {
        5
    } else {
        6
    }
}

const PIXEL_BIN_STEP: f32 = 25.0;

/// Builds the coarse 25 Hz-spaced bin ladder across `[fmin, fmax]` used by
/// the sync tone classifier and by [`estimate_freq`].
pub fn build_coarse_bins(fmin: f32, fmax: f32) -> Vec<GoertzelBin> {
    let count = ((fmax - fmin) / PIXEL_BIN_STEP) as usize + 1;
    (0..count)
        .map(|i| GoertzelBin::new(fmin + i as f32 * PIXEL_BIN_STEP))
        .collect()
}

/// Coarse peak-frequency estimate: argmax over `bins` plus a 3-point linear
/// interpolation against its immediate neighbors. Distinct from
/// [`estimate_freq_bins`]'s quadratic-log refinement; used where the
/// original reference used a fixed bin ladder rather than a per-window
/// Goertzel table (sync tone classification, header-shift sampling).
pub fn estimate_freq(window: &[f32], bins: &[GoertzelBin]) -> f32 {
    let mut max_val = 0.0f32;
    let mut max_idx = 0usize;
    let mags: Vec<f32> = bins
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let val = goertzel_power(window, b);
            if val > max_val {
                max_val = val;
                max_idx = i;
            }
            val
        })
        .collect();
    let left = if max_idx > 0 { max_idx - 1 } else { max_idx };
    let right = if max_idx + 1 < bins.len() {
        max_idx + 1
    } else {
        max_idx
    };
    let y1 = mags[left];
    let y2 = mags[max_idx];
    let y3 = mags[right];
    let denom = y1 + y2 + y3;
    let mut peak = max_idx as f32;
    if denom > 0.0 {
        peak += (y3 - y1) / denom;
    }
    let freq = FREQ_MIN + peak * PIXEL_BIN_STEP;
    freq.clamp(FREQ_MIN, FREQ_MAX)
}

/// Maps a video-band frequency to an 8-bit intensity.
pub fn freq_to_intensity(freq: f32) -> u8 {
    let freq = freq.clamp(FREQ_MIN, FREQ_MAX);
    let ratio = (freq - FREQ_MIN) / (FREQ_MAX - FREQ_MIN);
    (ratio * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn synth_tone(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin() * 10_000.0)
            .collect()
    }

    #[test]
    fn goertzel_peaks_at_the_right_bin() {
        let data = synth_tone(1900.0, 256);
        let on_bin = GoertzelBin::new(1900.0);
        let off_bin = GoertzelBin::new(1500.0);
        assert!(goertzel_power(&data, &on_bin) > goertzel_power(&data, &off_bin) * 10.0);
    }

    #[test]
    fn estimate_freq_bins_recovers_tone() {
        let len = 512usize;
        let data_f32 = synth_tone(2100.0, len);
        let data: Vec<i16> = data_f32.iter().map(|&x| x as i16).collect();
        let hann = hann_window(len);
        let (bins, indices) = build_bins_for_window(len, FREQ_MIN, FREQ_MAX);
        let freq = estimate_freq_bins(&data, &hann, &bins, &indices, len);
        assert_relative_eq!(freq, 2100.0, epsilon = 50.0);
    }

    #[test]
    fn freq_to_intensity_clamps_and_scales() {
        assert_eq!(freq_to_intensity(1500.0), 0);
        assert_eq!(freq_to_intensity(2300.0), 255);
        assert_eq!(freq_to_intensity(1000.0), 0);
        assert_eq!(freq_to_intensity(3000.0), 255);
        let mid = freq_to_intensity(1900.0);
        assert!((120..=135).contains(&mid));
    }

    #[test]
    fn window_cache_is_stable_across_calls() {
        let (hann_a, bins_a, _) = get_window_cache(256);
        let len_a = bins_a.len();
        let (hann_b, bins_b, _) = get_window_cache(256);
        assert_eq!(hann_a.len(), hann_b.len());
        assert_eq!(len_a, bins_b.len());
    }
}
