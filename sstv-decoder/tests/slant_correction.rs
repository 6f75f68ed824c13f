mod common;

use sstv_decoder::{
    DecodeOptions,
    Samples,
    SyncStrategy,
    decode_scottie1,
};

/// Resamples a PCM buffer to simulate a capture device clock running at
/// `ratio` times nominal (linear interpolation).
fn resample(samples: &[i16], ratio: f64) -> Vec<i16> {
    let out_len = (samples.len() as f64 / ratio) as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_pos = i as f64 * ratio;
        let i0 = src_pos.floor() as usize;
        let i1 = (i0 + 1).min(samples.len() - 1);
        let t = src_pos - i0 as f64;
        let v = samples[i0.min(samples.len() - 1)] as f64 * (1.0 - t) + samples[i1] as f64 * t;
        out.push(v.round() as i16);
    }
    out
}

/// RMS error across the decoded 240x192 image region, matching spec.md
/// §8 scenario 3's acceptance metric.
fn image_rms(a: &image::RgbImage, b: &image::RgbImage) -> f64 {
    let mut sum_sq = 0f64;
    let mut count = 0u64;
    for y in 0..192u32 {
        for x in 24..264u32 {
            let pa = a.get_pixel(x, y);
            let pb = b.get_pixel(x, y);
            for c in 0..3 {
                let d = pa.0[c] as f64 - pb.0[c] as f64;
                sum_sq += d * d;
                count += 1;
            }
        }
    }
    (sum_sq / count as f64).sqrt()
}

#[test]
fn hough_strategy_compensates_a_two_percent_slow_clock() {
    let pattern = |x: u32, y: u32| {
        let v = (((x * 7 + y * 3) % 256) as u8).max(if x < 160 { 40 } else { 0 });
        (v, v, v)
    };
    let frame = common::encode_scottie1(pattern);
    let samples = common::with_header(frame);

    let options = DecodeOptions {
        strategy: SyncStrategy::Hough,
        ..DecodeOptions::default()
    };
    let reference = decode_scottie1(Samples::new(&samples), options);

    let drifted = resample(&samples, 1.02);
    let decoded = decode_scottie1(Samples::new(&drifted), options);

    let rms = image_rms(&decoded.image, &reference.image);
    assert!(rms <= 6.0, "rms={rms}");
}

#[test]
fn tracker_strategy_produces_monotonic_sync_positions_with_bounded_gaps() {
    let frame = common::encode_scottie1(|_, y| {
        let v = (y % 256) as u8;
        (v, v, v)
    });
    let samples = common::with_header(frame);

    let options = DecodeOptions {
        strategy: SyncStrategy::Tracker,
        ..DecodeOptions::default()
    };
    let decoded = decode_scottie1(Samples::new(&samples), options);
    let positions = decoded.sync_positions.expect("tracker always reports positions");

    if positions.len() >= 2 {
        let nominal_line_samples = (sstv_decoder::modem::sstv::SAMPLE_RATE * 0.42838) as i64;
        for w in positions.windows(2) {
            let gap = w[1] as i64 - w[0] as i64;
            assert!(gap > 0, "positions must be strictly increasing: {w:?}");
            assert!(
                (gap - nominal_line_samples).abs() < nominal_line_samples,
                "gap {gap} too far from nominal {nominal_line_samples}"
            );
        }
    }
}
