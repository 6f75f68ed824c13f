//! Orchestrator: ties header detection, sync/slant correction, luminance
//! demodulation, pixel-grid sampling and post-filtering together for a
//! single frame.

use image::RgbImage;

use crate::modem::sstv::goertzel::{
    SAMPLE_RATE,
    estimate_freq_bins,
    get_window_cache,
};
use crate::modem::sstv::header::HeaderDetector;
use crate::modem::sstv::modes::ModeSpecification;
use crate::modem::sstv::postfilter;
use crate::modem::sstv::sampler;
use crate::modem::sstv::sync;
pub use crate::modem::sstv::sync::SyncStrategy;
use crate::modem::sstv::{
    self,
    luminance,
};

/// A borrowed PCM sample buffer paired with its sample rate.
#[derive(Clone, Copy, Debug)]
pub struct Samples<'a> {
    pub data: &'a [i16],
    pub sample_rate: f32,
}

impl<'a> Samples<'a> {
    pub fn new(data: &'a [i16]) -> Self {
        Self {
            data,
            sample_rate: SAMPLE_RATE,
        }
    }
}

/// Runtime knobs for [`decode_scottie1`].
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    pub strategy: SyncStrategy,
    /// Header detection gives up after this many samples and proceeds with
    /// `header_end = 0`.
    pub header_timeout_samples: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strategy: SyncStrategy::Hough,
            header_timeout_samples: (SAMPLE_RATE * 5.0) as usize,
        }
    }
}

/// Orchestrator output.
#[derive(Debug)]
pub struct DecodedFrame {
    pub image: RgbImage,
    /// True iff at least one sync was accepted and a frame began.
    pub receiving: bool,
    /// Populated only when [`SyncStrategy::Tracker`] was used.
    pub sync_positions: Option<Vec<usize>>,
}

pub fn decode_scottie1(samples: Samples<'_>, options: DecodeOptions) -> DecodedFrame {
    let mode = ModeSpecification::SCOTTIE_1;
    let data = samples.data;

    let header_end = detect_header_end(data, options.header_timeout_samples);

    let expected_frame = (SAMPLE_RATE * mode.line_time * mode.num_lines as f32 + 0.5) as usize;
    let trimmed_applied = header_end > 0
        && header_end < data.len()
        && data.len() - header_end >= (expected_frame as f32 * 0.8) as usize;
    let trimmed: &[i16] = if trimmed_applied { &data[header_end..] } else { data };

    let mut freq_shift = estimate_header_shift(trimmed);
    if freq_shift.abs() > 200.0 {
        freq_shift = 0.0;
    }
    tracing::debug!(header_end, freq_shift, trimmed_len = trimmed.len(), "header stage done");

    // If the buffer wasn't trimmed, `trimmed` still carries the VIS header,
    // so the tracker must be told where it ends to avoid locking onto the
    // header's own 1200 Hz break pulse as a spurious first sync line.
    let sync_header_end = if trimmed_applied { 0 } else { header_end };
    let sync_result = sync::locate(options.strategy, trimmed, &mode, sync_header_end, freq_shift);
    tracing::debug!(
        rate = sync_result.rate,
        skip = sync_result.skip,
        has_positions = sync_result.sync_positions.is_some(),
        "sync stage done"
    );

    let luminance = luminance::demodulate(trimmed, freq_shift);

    let raw = sampler::sample_raw_image(&mode, sync_result.rate, sync_result.skip, &luminance);
    let mut canvas = sampler::paste_into_canvas(&raw);
    postfilter::smooth(&mut canvas);

    let receiving = match &sync_result.sync_positions {
        Some(positions) => !positions.is_empty(),
        None => header_end > 0,
    };

    DecodedFrame {
        image: canvas,
        receiving,
        sync_positions: sync_result.sync_positions,
    }
}

fn detect_header_end(samples: &[i16], timeout: usize) -> usize {
    let mut detector = HeaderDetector::new();
    for (idx, &s) in samples.iter().enumerate() {
        if idx >= timeout {
            break;
        }
        if let Some(end) = detector.push(s, idx) {
            return end;
        }
    }
    0
}

/// Mean deviation of the 1900 Hz leader tone from nominal, bounded by the
/// caller to +-200 Hz.
fn estimate_header_shift(samples: &[i16]) -> f32 {
    const WIN: usize = 1024;
    const HOP: usize = 256;
    let (hann, bins, indices) = get_window_cache(WIN);
    let max_samples = samples.len().min((SAMPLE_RATE * 2.0) as usize);
    if max_samples < WIN {
        return 0.0;
    }
    let mut peaks = Vec::new();
    let mut start = 0usize;
    while start + WIN <= max_samples {
        let window = &samples[start..start + WIN];
        let freq = estimate_freq_bins(window, hann, bins, indices, WIN);
        if (1700.0..=2100.0).contains(&freq) {
            peaks.push(freq);
            if peaks.len() >= 20 {
                break;
            }
        }
        start += HOP;
    }
    if peaks.len() < 5 {
        return 0.0;
    }
    peaks.iter().sum::<f32>() / peaks.len() as f32 - sstv::LEADER_TONE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_produces_fixed_size_panel_canvas() {
        let frame = decode_scottie1(Samples::new(&[]), DecodeOptions::default());
        assert_eq!(frame.image.width(), sampler::OUT_WIDTH);
        assert_eq!(frame.image.height(), sampler::OUT_HEIGHT);
        assert!(!frame.receiving);
    }

    #[test]
    fn all_zero_input_is_not_receiving() {
        let samples = vec![0i16; SAMPLE_RATE as usize * 2];
        let frame = decode_scottie1(Samples::new(&samples), DecodeOptions::default());
        assert!(!frame.receiving);
        for y in 0..frame.image.height() {
            assert_eq!(*frame.image.get_pixel(0, y), sampler::PANEL_BG);
        }
    }

    #[test]
    fn tracker_strategy_reports_sync_positions_field() {
        let samples = vec![0i16; 1000];
        let options = DecodeOptions {
            strategy: SyncStrategy::Tracker,
            ..DecodeOptions::default()
        };
        let frame = decode_scottie1(Samples::new(&samples), options);
        assert!(frame.sync_positions.is_some());
    }
}
