//! Strategy B: per-sample streaming sync detector plus a line-fit tracker
//! that produces an explicit `sync_positions` sequence alongside the
//! `(rate, skip)` pair Strategy A also yields.

use crate::modem::sstv::goertzel::{
    GoertzelBin,
    SAMPLE_RATE,
    goertzel_power,
};
use crate::modem::sstv::modes::ModeSpecification;
use crate::scanner::Scanner;

use super::{
    SyncResult,
    compute_sync_phase_offset,
};

const WINDOW_SAMPLES: usize = 400;
const HOP_SAMPLES: usize = 80;
const SCORE_RATIO: f32 = 1.6;
const TONE_DETECT_RATIO: f32 = 1.6;
const TONE_TOTAL_RATIO: f32 = 0.55;
const MIN_SYNC_GAP_MS: f32 = 420.0;
const SCORE_WINDOW: usize = 64;
const SCORE_HOP: usize = 13;
const WINDOW_PCT: f32 = 0.12;
const MAX_FIT: u32 = 24;

/// Streaming tone classifier: slides a 400-sample window hopping every 80
/// samples and declares a sync candidate when the widened-1200Hz/video
/// power ratio and dominance tests both pass.
struct SyncDetector {
    bin_1100: GoertzelBin,
    bin_1200: GoertzelBin,
    bin_1300: GoertzelBin,
    bin_1150: GoertzelBin,
    bin_1175: GoertzelBin,
    bin_1225: GoertzelBin,
    bin_1250: GoertzelBin,
    bin_1275: GoertzelBin,
    video_bins: [GoertzelBin; 5],
    buf: Box<[i16; WINDOW_SAMPLES]>,
    pos: usize,
    fill: usize,
    hop: usize,
    window: Vec<i16>,
}

impl SyncDetector {
    fn new() -> Self {
        Self {
            bin_1100: GoertzelBin::new(1100.0),
            bin_1200: GoertzelBin::new(1200.0),
            bin_1300: GoertzelBin::new(1300.0),
            bin_1150: GoertzelBin::new(1150.0),
            bin_1175: GoertzelBin::new(1175.0),
            bin_1225: GoertzelBin::new(1225.0),
            bin_1250: GoertzelBin::new(1250.0),
            bin_1275: GoertzelBin::new(1275.0),
            video_bins: [
                GoertzelBin::new(1500.0),
                GoertzelBin::new(1700.0),
                GoertzelBin::new(1900.0),
                GoertzelBin::new(2100.0),
                GoertzelBin::new(2300.0),
            ],
            buf: Box::new([0; WINDOW_SAMPLES]),
            pos: 0,
            fill: 0,
            hop: 0,
            window: vec![0; WINDOW_SAMPLES],
        }
    }

    /// Feeds one sample; returns `true` exactly when a sync candidate
    /// fires on this call (the window having just completed a hop).
    fn push(&mut self, sample: i16) -> bool {
        self.buf[self.pos] = sample;
        self.pos = (self.pos + 1) % WINDOW_SAMPLES;
        if self.fill < WINDOW_SAMPLES {
            self.fill += 1;
            return false;
        }
        self.hop += 1;
        if self.hop < HOP_SAMPLES {
            return false;
        }
        self.hop = 0;
        for (j, slot) in self.window.iter_mut().enumerate() {
            *slot = self.buf[(self.pos + j) % WINDOW_SAMPLES];
        }
        self.classify(&weighted_copy(&self.window))
    }

    fn classify(&self, window_f32: &[f32]) -> bool {
        let p1100 = goertzel_power(window_f32, &self.bin_1100);
        let mut p1200 = goertzel_power(window_f32, &self.bin_1200);
        for b in [
            &self.bin_1150,
            &self.bin_1175,
            &self.bin_1225,
            &self.bin_1250,
            &self.bin_1275,
        ] {
            p1200 = p1200.max(goertzel_power(window_f32, b));
        }
        let p1300 = goertzel_power(window_f32, &self.bin_1300);
        let total = p1100 + p1200 + p1300;
        let other_max = p1100.max(p1300);
        let mut p_video: f32 = self
            .video_bins
            .iter()
            .map(|b| goertzel_power(window_f32, b))
            .sum();
        p_video /= self.video_bins.len() as f32;
        p_video = p_video.max(1e-9);
        let score_hit = p1200 / p_video > SCORE_RATIO;
        score_hit && p1200 > other_max * TONE_DETECT_RATIO && p1200 > total * TONE_TOTAL_RATIO
    }

    fn score_at(&self, samples: &[i16], end_idx: usize) -> Option<(f32, bool)> {
        if end_idx < SCORE_WINDOW {
            return None;
        }
        let window: Vec<f32> = samples[end_idx - SCORE_WINDOW..end_idx]
            .iter()
            .map(|&x| x as f32)
            .collect();
        let mut p1200 = goertzel_power(&window, &self.bin_1200);
        for b in [
            &self.bin_1150,
            &self.bin_1175,
            &self.bin_1225,
            &self.bin_1250,
            &self.bin_1275,
        ] {
            p1200 = p1200.max(goertzel_power(&window, b));
        }
        let mut p_video: f32 = self.video_bins.iter().map(|b| goertzel_power(&window, b)).sum();
        p_video /= self.video_bins.len() as f32;
        let score = p1200 / (p_video + 1e-9);
        Some((score, score > SCORE_RATIO))
    }
}

fn weighted_copy(window: &[i16]) -> Vec<f32> {
    window.iter().map(|&x| x as f32).collect()
}

impl Scanner<i16> for SyncDetector {
    type Output = bool;

    fn scan(&mut self, sample: i16) -> Self::Output {
        self.push(sample)
    }
}

/// Line tracker: accepts sync candidates whose gap from the last accepted
/// candidate falls in the expected window, fitting `y = a*n + b` by OLS
/// over the first `max_fit` accepts, then tracking with an exponentially
/// smoothed slope thereafter.
struct LineTracker {
    expected_samples: f32,
    window_pct: f32,
    count: u32,
    fit_count: u32,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_xy: f64,
    slope: f64,
    intercept: f64,
    fit_ready: bool,
    last_sample: Option<i64>,
    miss: u32,
}

impl LineTracker {
    fn new(expected_samples: f32) -> Self {
        Self {
            expected_samples,
            window_pct: WINDOW_PCT,
            count: 0,
            fit_count: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_xx: 0.0,
            sum_xy: 0.0,
            slope: 0.0,
            intercept: 0.0,
            fit_ready: false,
            last_sample: None,
            miss: 0,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.expected_samples);
    }

    fn accept(&mut self, sample_index: usize) -> bool {
        if self.expected_samples <= 0.0 {
            self.last_sample = Some(sample_index as i64);
            self.count += 1;
            return true;
        }
        let min_window = self.expected_samples * (1.0 - self.window_pct);
        let max_window = self.expected_samples * (1.0 + self.window_pct);

        let Some(last) = self.last_sample else {
            self.last_sample = Some(sample_index as i64);
            self.fit_count += 1;
            self.count = 1;
            return true;
        };
        let delta = sample_index as i64 - last;
        if !self.fit_ready {
            if (delta as f32) < min_window {
                self.miss += 1;
                return false;
            }
        } else if (delta as f32) < min_window || (delta as f32) > max_window {
            self.miss += 1;
            return false;
        }

        let x = self.count as f64;
        let y = sample_index as f64;
        if !self.fit_ready {
            self.sum_x += x;
            self.sum_y += y;
            self.sum_xx += x * x;
            self.sum_xy += x * y;
            self.fit_count += 1;
            if self.fit_count >= MAX_FIT {
                let n = self.fit_count as f64;
                let denom = n * self.sum_xx - self.sum_x * self.sum_x;
                if denom != 0.0 {
                    self.slope = (n * self.sum_xy - self.sum_x * self.sum_y) / denom;
                    self.intercept = (self.sum_y - self.slope * self.sum_x) / n;
                    let min_slope = (self.expected_samples * (1.0 - self.window_pct)) as f64;
                    let max_slope = (self.expected_samples * (1.0 + self.window_pct)) as f64;
                    self.slope = self.slope.clamp(min_slope, max_slope);
                    self.fit_ready = true;
                }
            }
        } else {
            let pred = self.slope * x + self.intercept;
            let err = y - pred;
            let window = (self.expected_samples * self.window_pct) as f64;
            if window > 0.0 && (err < -window || err > window) {
                self.miss += 1;
                if self.miss > 3 {
                    self.reset();
                }
                return false;
            }
            let alpha = 0.02;
            self.slope = self.slope * (1.0 - alpha) + delta as f64 * alpha;
            self.intercept = y - self.slope * x;
            self.miss = 0;
        }
        self.last_sample = Some(sample_index as i64);
        self.count += 1;
        true
    }
}

pub fn locate_sync_tracker(
    samples: &[i16],
    mode: &ModeSpecification,
    header_end: usize,
    _freq_shift: f32,
) -> SyncResult {
    let min_sync_gap = (SAMPLE_RATE * (MIN_SYNC_GAP_MS / 1000.0)) as i64;
    let expected_line_samples = (mode.line_time * SAMPLE_RATE).round();

    let mut detector = SyncDetector::new();
    let mut tracker = LineTracker::new(expected_line_samples);
    let mut last_sync_index: i64 = -min_sync_gap;
    let mut sync_positions: Vec<usize> = Vec::new();

    for (idx, &mono) in samples.iter().enumerate() {
        if idx < header_end {
            continue;
        }
        let hit = detector.push(mono);
        if !hit {
            continue;
        }
        if idx as i64 - last_sync_index <= min_sync_gap {
            continue;
        }
        let delta = idx as i64 - last_sync_index;
        if last_sync_index >= 0 {
            let min_window = (expected_line_samples * (1.0 - WINDOW_PCT)).max(0.0);
            let max_window = expected_line_samples * (1.0 + WINDOW_PCT);
            if (delta as f32) < min_window || (max_window > 0.0 && delta as f32 > max_window) {
                continue;
            }
        }
        last_sync_index = idx as i64;
        if tracker.accept(idx) {
            sync_positions.push(idx);
        }
    }

    if sync_positions.len() >= 2 {
        let n = sync_positions.len();
        let (mut sum_x, mut sum_y, mut sum_xx, mut sum_xy) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for (i, &pos) in sync_positions.iter().enumerate() {
            let x = i as f64;
            let y = pos as f64;
            sum_x += x;
            sum_y += y;
            sum_xx += x * x;
            sum_xy += x * y;
        }
        let denom = n as f64 * sum_xx - sum_x * sum_x;
        if denom != 0.0 {
            let a = (n as f64 * sum_xy - sum_x * sum_y) / denom;
            let b = (sum_y - a * sum_x) / n as f64;
            for (i, pos) in sync_positions.iter_mut().enumerate() {
                *pos = (a * i as f64 + b + 0.5) as usize;
            }
        }
    }

    let score_detector = SyncDetector::new();
    let score_start = header_end.max(SCORE_WINDOW);
    let mut has_sync_positions = Vec::new();
    let mut end_idx = score_start;
    while end_idx < samples.len() {
        if let Some((_, valid)) = score_detector.score_at(samples, end_idx) {
            if valid {
                has_sync_positions.push(end_idx);
            }
        }
        end_idx += SCORE_HOP;
    }

    let line_samples = if tracker.fit_ready && tracker.slope > 0.0 {
        tracker.slope.round() as i64
    } else if sync_positions.len() > 1 {
        let diffs: Vec<i64> = sync_positions
            .windows(2)
            .map(|w| w[1] as i64 - w[0] as i64)
            .collect();
        diffs.iter().sum::<i64>() / diffs.len() as i64
    } else {
        expected_line_samples as i64
    };

    let base_sample = sync_positions.first().copied().unwrap_or(header_end);
    let sync_samples = (SAMPLE_RATE * (9.0 / 1000.0) + 0.5) as i64;
    let phase_offset = compute_sync_phase_offset(&has_sync_positions, base_sample, line_samples, sync_samples);

    let scale = if line_samples > 0 {
        (expected_line_samples as f64 / line_samples as f64).clamp(0.95, 1.05)
    } else {
        1.0
    };
    let rate = SAMPLE_RATE * scale as f32;

    let color_len = mode.pixel_time * mode.pixels_per_line as f32;
    let sync_start_in_line = mode.sep_time + color_len + mode.sep_time + color_len;
    let skip = base_sample as i64 - (rate * sync_start_in_line).round() as i64 - phase_offset;

    tracing::debug!(
        accepted = sync_positions.len(),
        line_samples,
        rate,
        skip,
        "tracker sync locked"
    );

    SyncResult {
        rate,
        skip,
        sync_positions: Some(sync_positions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_tracker_rejects_early_gaps() {
        let mut tracker = LineTracker::new(1000.0);
        assert!(tracker.accept(0));
        // A candidate far too close to the previous one (spurious mid-line
        // burst) must be rejected.
        assert!(!tracker.accept(100));
        assert!(tracker.accept(1000));
    }

    #[test]
    fn empty_input_yields_no_positions() {
        let result = locate_sync_tracker(&[], &ModeSpecification::SCOTTIE_1, 0, 0.0);
        assert!(result.sync_positions.unwrap().is_empty());
    }
}
