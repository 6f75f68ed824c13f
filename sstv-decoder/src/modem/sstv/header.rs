//! Four-state header recognizer: Leader1 -> Break -> Leader2 -> VisStart.
//!
//! Hops a 512-sample circular buffer every 256 samples and classifies the
//! dominant tone among 1100/1200/1300/1900 Hz at each hop.

use crate::modem::sstv::goertzel::{
    GoertzelBin,
    goertzel_power,
};
use crate::modem::sstv::{
    LEADER_BREAK_TIME,
    LEADER_TIME,
    SAMPLE_RATE,
    VIS_BIT_TIME,
};
use crate::scanner::Scanner;

const WINDOW_SAMPLES: usize = 512;
const HOP_SAMPLES: usize = 256;
const TONE_DETECT_RATIO: f32 = 1.3;
const TONE_TOTAL_RATIO: f32 = 0.45;

/// The ten 30-ms VIS bit/start/stop slots consumed past the hop at which
/// VisStart's hop count is satisfied.
const VIS_SLOTS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Leader1,
    Break,
    Leader2,
    VisStart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tone {
    Hz1100,
    Hz1200,
    Hz1300,
    Hz1900,
}

fn classify(p1100: f32, p1200: f32, p1300: f32, p1900: f32) -> Option<Tone> {
    let total = p1100 + p1200 + p1300 + p1900;
    let candidates = [
        (Tone::Hz1100, p1100),
        (Tone::Hz1200, p1200),
        (Tone::Hz1300, p1300),
        (Tone::Hz1900, p1900),
    ];
    let (tone, max_val) = candidates
        .iter()
        .copied()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .unwrap();
    let other_max = candidates
        .iter()
        .filter(|(t, _)| *t != tone)
        .map(|(_, p)| *p)
        .fold(0.0f32, f32::max);
    if max_val > other_max * TONE_DETECT_RATIO && max_val > total * TONE_TOTAL_RATIO {
        Some(tone)
    } else {
        None
    }
}

/// Streaming header detector: push samples one at a time, get `Some(header_end)`
/// once VIS onset has been confirmed.
pub struct HeaderDetector {
    bin_1100: GoertzelBin,
    bin_1200: GoertzelBin,
    bin_1300: GoertzelBin,
    bin_1900: GoertzelBin,
    buf: Box<[i16; WINDOW_SAMPLES]>,
    pos: usize,
    fill: usize,
    hop: usize,
    state: State,
    count: u32,
    leader_windows: u32,
    break_windows: u32,
    vis_start_windows: u32,
    header_end: Option<usize>,
}

impl Default for HeaderDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderDetector {
    pub fn new() -> Self {
        let hop_ms = 1000.0 * HOP_SAMPLES as f32 / SAMPLE_RATE;
        Self {
            bin_1100: GoertzelBin::new(1100.0),
            bin_1200: GoertzelBin::new(1200.0),
            bin_1300: GoertzelBin::new(1300.0),
            bin_1900: GoertzelBin::new(1900.0),
            buf: Box::new([0; WINDOW_SAMPLES]),
            pos: 0,
            fill: 0,
            hop: 0,
            state: State::Leader1,
            count: 0,
            leader_windows: ((LEADER_TIME * 1000.0 / hop_ms) + 0.5).max(1.0) as u32,
            break_windows: ((LEADER_BREAK_TIME * 1000.0 / hop_ms) + 0.5).max(1.0) as u32,
            vis_start_windows: ((VIS_BIT_TIME * 1000.0 / hop_ms) + 0.5).max(1.0) as u32,
            header_end: None,
        }
    }

    /// Feeds one sample at absolute buffer index `sample_index`. Returns
    /// `Some(header_end)` the first time VIS onset is confirmed; every
    /// subsequent call returns the same value without further work.
    pub fn push(&mut self, sample: i16, sample_index: usize) -> Option<usize> {
        if let Some(end) = self.header_end {
            return Some(end);
        }
        self.buf[self.pos] = sample;
        self.pos = (self.pos + 1) % WINDOW_SAMPLES;
        if self.fill < WINDOW_SAMPLES {
            self.fill += 1;
            return None;
        }
        self.hop += 1;
        if self.hop < HOP_SAMPLES {
            return None;
        }
        self.hop = 0;

        let mut window = vec![0.0f32; WINDOW_SAMPLES];
        for (j, slot) in window.iter_mut().enumerate() {
            let idx = (self.pos + j) % WINDOW_SAMPLES;
            *slot = self.buf[idx] as f32;
        }
        let p1100 = goertzel_power(&window, &self.bin_1100);
        let p1200 = goertzel_power(&window, &self.bin_1200);
        let p1300 = goertzel_power(&window, &self.bin_1300);
        let p1900 = goertzel_power(&window, &self.bin_1900);
        let tone = classify(p1100, p1200, p1300, p1900);

        match self.state {
            State::Leader1 => self.advance(tone == Some(Tone::Hz1900), State::Break),
            State::Break => self.advance(tone == Some(Tone::Hz1200), State::Leader2),
            State::Leader2 => self.advance(tone == Some(Tone::Hz1900), State::VisStart),
            State::VisStart => {
                if tone == Some(Tone::Hz1200) {
                    self.count += 1;
                    if self.count >= self.vis_start_windows {
                        let vis_start = sample_index.saturating_sub(WINDOW_SAMPLES);
                        let end = vis_start
                            + (SAMPLE_RATE * (VIS_BIT_TIME) * VIS_SLOTS as f32) as usize;
                        self.header_end = Some(end);
                        tracing::debug!(header_end = end, "header vis onset confirmed");
                        return Some(end);
                    }
                } else {
                    self.count = 0;
                }
            }
        }
        None
    }

    fn advance(&mut self, matched: bool, next: State) {
        if matched {
            self.count += 1;
            let required = match self.state {
                State::Leader1 | State::Leader2 => self.leader_windows,
                State::Break => self.break_windows,
                State::VisStart => self.vis_start_windows,
            };
            if self.count >= required {
                let from = self.state;
                tracing::debug!(?from, to = ?next, "header state transition");
                self.state = next;
                self.count = 0;
            }
        } else {
            self.count = 0;
        }
    }
}

impl Scanner<(i16, usize)> for HeaderDetector {
    type Output = Option<usize>;

    fn scan(&mut self, (sample, index): (i16, usize)) -> Self::Output {
        self.push(sample, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_burst(freq: f32, duration_s: f32) -> Vec<i16> {
        let n = (SAMPLE_RATE * duration_s) as usize;
        (0..n)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin() * 12_000.0
            })
            .map(|x| x as i16)
            .collect()
    }

    #[test]
    fn detects_a_clean_header() {
        let mut samples = tone_burst(1900.0, 0.32);
        samples.extend(tone_burst(1200.0, 0.015));
        samples.extend(tone_burst(1900.0, 0.32));
        samples.extend(tone_burst(1200.0, 0.05));
        samples.extend(tone_burst(1500.0, 1.0));

        let mut detector = HeaderDetector::new();
        let mut end = None;
        for (i, &s) in samples.iter().enumerate() {
            if let Some(e) = detector.push(s, i) {
                end = Some(e);
                break;
            }
        }
        assert!(end.is_some());
        assert!(end.unwrap() < samples.len());
    }

    #[test]
    fn leader_only_never_confirms() {
        let samples = tone_burst(1900.0, 2.0);
        let mut detector = HeaderDetector::new();
        let mut end = None;
        for (i, &s) in samples.iter().enumerate() {
            end = detector.push(s, i);
            if end.is_some() {
                break;
            }
        }
        assert!(end.is_none());
    }
}
