//! Synthetic Scottie 1 signal generation for tests only. This is
//! deliberately not part of the crate's public API: the decoder never
//! produces audio.

use sstv_decoder::modem::sstv::modes::ModeSpecification;

pub const SAMPLE_RATE: f32 = 44_100.0;

fn tone_samples(freq: f32, duration_s: f32, phase0: &mut f32, out: &mut Vec<i16>) {
    let n = (SAMPLE_RATE * duration_s).round() as usize;
    let step = 2.0 * std::f32::consts::PI * freq / SAMPLE_RATE;
    for _ in 0..n {
        out.push(((*phase0).sin() * 12_000.0) as i16);
        *phase0 += step;
    }
}

/// Appends a clean calibration header: Leader1(1900, 300ms), Break(1200,
/// 10ms), Leader2(1900, 300ms), ten 30ms VIS slots at 1200 Hz.
pub fn push_header(out: &mut Vec<i16>) {
    let mut phase = 0.0;
    tone_samples(1900.0, 0.300, &mut phase, out);
    tone_samples(1200.0, 0.010, &mut phase, out);
    tone_samples(1900.0, 0.300, &mut phase, out);
    for _ in 0..10 {
        tone_samples(1200.0, 0.030, &mut phase, out);
    }
}

/// Maps an intensity in [0,255] to its video-band frequency.
pub fn intensity_to_freq(intensity: u8) -> f32 {
    1500.0 + intensity as f32 / 255.0 * 800.0
}

/// Encodes `pixel_at(x, y) -> (r, g, b)` as a Scottie 1 frame (no header),
/// one constant-frequency tone per pixel.
pub fn encode_scottie1(pixel_at: impl Fn(u32, u32) -> (u8, u8, u8)) -> Vec<i16> {
    let mode = ModeSpecification::SCOTTIE_1;
    let mut out = Vec::new();
    let mut phase = 0.0;
    for y in 0..mode.num_lines {
        tone_samples(1500.0, mode.sep_time, &mut phase, &mut out);
        for x in 0..mode.pixels_per_line {
            let (_, g, _) = pixel_at(x, y);
            tone_samples(
                intensity_to_freq(g),
                mode.pixel_time,
                &mut phase,
                &mut out,
            );
        }
        tone_samples(1500.0, mode.sep_time, &mut phase, &mut out);
        for x in 0..mode.pixels_per_line {
            let (_, _, b) = pixel_at(x, y);
            tone_samples(
                intensity_to_freq(b),
                mode.pixel_time,
                &mut phase,
                &mut out,
            );
        }
        tone_samples(1200.0, mode.sync_time, &mut phase, &mut out);
        tone_samples(1500.0, mode.porch_time, &mut phase, &mut out);
        for x in 0..mode.pixels_per_line {
            let (r, _, _) = pixel_at(x, y);
            tone_samples(
                intensity_to_freq(r),
                mode.pixel_time,
                &mut phase,
                &mut out,
            );
        }
    }
    out
}

pub fn with_header(mut frame: Vec<i16>) -> Vec<i16> {
    let mut out = Vec::with_capacity(frame.len() + 60_000);
    push_header(&mut out);
    out.append(&mut frame);
    out
}

/// Adds Gaussian-ish noise at roughly the given SNR (dB), using a simple
/// deterministic LCG so tests are reproducible without an RNG dependency.
pub fn add_noise(samples: &mut [i16], snr_db: f32) {
    let signal_power: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum::<f64>()
        / samples.len().max(1) as f64;
    let noise_power = signal_power / 10f64.powf(snr_db as f64 / 10.0);
    let noise_amp = noise_power.sqrt();

    let mut state: u64 = 0x2545F4914F6CDD1D;
    for s in samples.iter_mut() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let r = ((state >> 33) as f64 / u32::MAX as f64) * 2.0 - 1.0;
        let noisy = *s as f64 + r * noise_amp * 1.7;
        *s = noisy.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
    }
}
