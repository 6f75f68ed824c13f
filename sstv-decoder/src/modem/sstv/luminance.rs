//! Adaptive-window luminance demodulator: walks the sample buffer in
//! strides of 6, re-selecting a Goertzel window length every 256 samples
//! from a running SNR estimate.

use crate::modem::sstv::goertzel::{
    WINDOW_LENGTHS,
    build_bins_for_window,
    estimate_freq_bins,
    estimate_snr,
    freq_to_intensity,
    get_window_cache,
    hann_window,
};

const STRIDE: usize = 6;
const SNR_REFRESH_SAMPLES: usize = 256;
const SNR_WINDOW: usize = 1024;

/// Produces a per-sample intensity vector the same length as `samples`.
/// `freq_shift` (the header's measured deviation from 1900 Hz) is
/// subtracted from every estimate before clamping to the video band.
pub fn demodulate(samples: &[i16], freq_shift: f32) -> Vec<u8> {
    let mut stored = vec![0u8; samples.len()];
    let mut last_val = 0u8;
    let mut win_idx = 3usize;
    let mut next_snr = 0usize;

    let hann_1024 = hann_window(SNR_WINDOW);
    let (bins_video, _) =
        build_bins_for_window(SNR_WINDOW, 1500.0 + freq_shift, 2300.0 + freq_shift);
    let mut bins_noise = build_bins_for_window(SNR_WINDOW, 400.0 + freq_shift, 800.0 + freq_shift).0;
    bins_noise.extend(build_bins_for_window(SNR_WINDOW, 2700.0 + freq_shift, 3400.0 + freq_shift).0);

    let mut i = 0usize;
    while i < samples.len() {
        if i >= next_snr {
            let snr_db = estimate_snr(samples, i, &hann_1024, &bins_video, &bins_noise, SNR_WINDOW);
            win_idx = crate::modem::sstv::goertzel::select_window_index(snr_db);
            next_snr += SNR_REFRESH_SAMPLES;
        }

        let win_len = WINDOW_LENGTHS[win_idx];
        let (hann, bins, indices) = get_window_cache(win_len);
        let half = win_len / 2;
        let val = if i < half || i + half >= samples.len() {
            last_val
        } else {
            let window = &samples[i - half..i - half + win_len];
            let mut freq = estimate_freq_bins(window, hann, bins, indices, win_len);
            freq = freq.clamp(1500.0 + freq_shift, 2300.0 + freq_shift);
            freq -= freq_shift;
            let val = freq_to_intensity(freq);
            last_val = val;
            val
        };

        let end = (i + STRIDE).min(samples.len());
        stored[i..end].fill(val);
        i += STRIDE;
    }

    stored
}
