//! Sync/slant correction: two interchangeable strategies that turn a raw
//! sample buffer into an effective sample rate, a skip offset and
//! (optionally) an explicit list of per-line sync sample indices.

mod hough;
mod tracker;

use crate::modem::sstv::goertzel::{
    GoertzelBin,
    goertzel_power,
    hann_window,
};
use crate::modem::sstv::modes::ModeSpecification;

pub use hough::locate_sync_hough;
pub use tracker::locate_sync_tracker;

/// Samples are hopped 13 at a time when building the coarse sync-presence
/// bitmap both strategies consume in one form or another.
const SYNC_HOP_SAMPLES: usize = 13;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Global slant search over a coarse sync-presence bitmap.
    Hough,
    /// Per-sample streaming tracker with line-fit regression.
    Tracker,
}

/// Output common to both strategies.
#[derive(Clone, Debug)]
pub struct SyncResult {
    pub rate: f32,
    pub skip: i64,
    /// Only populated by [`SyncStrategy::Tracker`].
    pub sync_positions: Option<Vec<usize>>,
}

pub fn locate(
    strategy: SyncStrategy,
    samples: &[i16],
    mode: &ModeSpecification,
    header_end: usize,
    freq_shift: f32,
) -> SyncResult {
    match strategy {
        SyncStrategy::Hough => locate_sync_hough(samples, mode, freq_shift),
        SyncStrategy::Tracker => locate_sync_tracker(samples, mode, header_end, freq_shift),
    }
}

/// Coarse sync-presence bitmap: one boolean per 13-sample hop over a
/// 64-sample Hann window, true iff `p_sync > 2*p_video`. `p_sync` is
/// widened by probing six tones around 1200 Hz (tolerating +-75 Hz
/// frequency shift) and taking the maximum.
pub(super) fn build_has_sync(samples: &[i16], rate: f32, freq_shift: f32) -> Vec<bool> {
    const WIN: usize = 64;
    let hop = SYNC_HOP_SAMPLES;
    if samples.len() < WIN {
        return Vec::new();
    }
    let hann = hann_window(WIN);
    let bin_width = rate / WIN as f32;
    let k_sync = ((1200.0 + freq_shift) / bin_width).round() as i64;
    let kmin = ((1500.0 + freq_shift) / bin_width).ceil() as i64;
    let kmax = ((2300.0 + freq_shift) / bin_width).floor() as i64;

    let sync_bins: Vec<(GoertzelBin, f32)> = (k_sync - 1..=k_sync + 1)
        .filter(|&k| k >= 0)
        .map(|k| {
            let weight = 1.0 - 0.5 * (k - k_sync).unsigned_abs() as f32;
            (GoertzelBin::new(k as f32 * bin_width), weight)
        })
        .collect();
    let video_bins: Vec<GoertzelBin> = (kmin.max(0)..=kmax)
        .map(|k| GoertzelBin::new(k as f32 * bin_width))
        .collect();

    let mut has_sync = Vec::with_capacity((samples.len() - WIN) / hop + 1);
    let mut start = 0usize;
    while start + WIN <= samples.len() {
        let window = &samples[start..start + WIN];
        let weighted: Vec<f32> = window
            .iter()
            .enumerate()
            .map(|(i, &x)| x as f32 * hann[i])
            .collect();
        let p_sync: f32 = sync_bins
            .iter()
            .map(|(b, w)| goertzel_power(&weighted, b) * w)
            .sum();
        let mut p_video: f32 = video_bins.iter().map(|b| goertzel_power(&weighted, b)).sum();
        if !video_bins.is_empty() {
            p_video /= video_bins.len() as f32;
        }
        p_video = p_video.max(1e-9);
        has_sync.push(p_sync > 2.0 * p_video);
        start += hop;
    }
    has_sync
}

/// Sub-line phase offset: histogram raw sync hits modulo the line period
/// into 512 bins and find the `[+4,-4]` convolution peak.
pub(super) fn compute_sync_phase_offset(
    sync_hit_positions: &[usize],
    base_sample: usize,
    line_samples: i64,
    sync_samples: i64,
) -> i64 {
    const PHASE_BINS: i64 = 512;
    const MIN_HITS: usize = 64;
    if line_samples <= 0 || sync_samples <= 0 {
        return 0;
    }
    let mut bins = vec![0u32; PHASE_BINS as usize];
    let mut hits = 0usize;
    for &pos in sync_hit_positions {
        if pos < base_sample {
            continue;
        }
        let phase = (pos - base_sample) as i64 % line_samples;
        let mut idx = phase * PHASE_BINS / line_samples;
        idx = idx.clamp(0, PHASE_BINS - 1);
        let slot = &mut bins[idx as usize];
        if *slot < 0xFFFF {
            *slot += 1;
        }
        hits += 1;
    }
    if hits < MIN_HITS {
        return 0;
    }

    let sync_bins = sync_samples * PHASE_BINS / line_samples;
    let search_bins = (sync_bins * 2).max(8).min(PHASE_BINS / 2);
    let mut max_conv: Option<i64> = None;
    let mut max_idx = 0i64;
    for i in 0..PHASE_BINS - 7 {
        if i > search_bins && i < (PHASE_BINS - search_bins) {
            continue;
        }
        let sum_a: i64 = bins[i as usize..(i + 4) as usize].iter().map(|&v| v as i64).sum();
        let sum_b: i64 = bins[(i + 4) as usize..(i + 8) as usize]
            .iter()
            .map(|&v| v as i64)
            .sum();
        let conv = sum_a - sum_b;
        let better = match max_conv {
            Some(m) => conv > m,
            None => true,
        };
        if better {
            max_conv = Some(conv);
            max_idx = i + 4;
        }
    }
    let mut fall_bin = max_idx;
    if fall_bin > PHASE_BINS / 2 {
        fall_bin -= PHASE_BINS;
    }
    let fall_samples = fall_bin * line_samples / PHASE_BINS;
    (sync_samples - fall_samples).clamp(0, line_samples)
}
