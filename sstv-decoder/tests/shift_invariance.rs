mod common;

use sstv_decoder::{
    DecodeOptions,
    Samples,
    decode_scottie1,
};

fn with_leading_silence(base: &[i16], shift: usize) -> Vec<i16> {
    let mut out = vec![0i16; shift];
    out.extend_from_slice(base);
    out
}

/// Shifts landing on the header detector's own 256-sample hop boundary
/// reconstruct the exact same sequence of analysis windows as the
/// unshifted buffer, just `shift` samples later, so the decoded image is
/// bit-for-bit identical.
#[test]
fn header_hop_aligned_shifts_decode_bit_for_bit() {
    let frame = common::encode_scottie1(|x, y| {
        let v = (((x * 5 + y * 11) % 256) as u8).max(10);
        (v, v, v)
    });
    let samples = common::with_header(frame);
    let baseline = decode_scottie1(Samples::new(&samples), DecodeOptions::default());

    const HOP_SAMPLES: usize = 256;
    for &hops in &[1usize, 7, 39] {
        let shift = hops * HOP_SAMPLES;
        assert!(shift <= 10_000);
        let shifted_samples = with_leading_silence(&samples, shift);
        let decoded = decode_scottie1(Samples::new(&shifted_samples), DecodeOptions::default());

        assert_eq!(decoded.image.as_raw(), baseline.image.as_raw(), "shift={shift}");
    }
}

/// Arbitrary, non-hop-aligned shifts up to 10_000 samples of leading
/// silence still let the header detector find and absorb the offset: the
/// decoded image is effectively unchanged, modulo the few-sample jitter
/// the 256-sample analysis-window hop can introduce at an unaligned
/// boundary.
#[test]
fn arbitrary_shifts_up_to_10_000_samples_are_absorbed() {
    let frame = common::encode_scottie1(|x, y| {
        let v = (((x * 5 + y * 11) % 256) as u8).max(10);
        (v, v, v)
    });
    let samples = common::with_header(frame);
    let baseline = decode_scottie1(Samples::new(&samples), DecodeOptions::default());

    for &shift in &[1usize, 100, 4_999, 9_999, 10_000] {
        let shifted_samples = with_leading_silence(&samples, shift);
        let decoded = decode_scottie1(Samples::new(&shifted_samples), DecodeOptions::default());

        assert!(decoded.receiving, "shift={shift}");
        let mut max_diff = 0i32;
        for y in (0..192u32).step_by(3) {
            for x in (24..264u32).step_by(3) {
                let a = baseline.image.get_pixel(x, y);
                let b = decoded.image.get_pixel(x, y);
                for c in 0..3 {
                    max_diff = max_diff.max((a.0[c] as i32 - b.0[c] as i32).abs());
                }
            }
        }
        assert!(max_diff <= 24, "shift={shift} max_diff={max_diff}");
    }
}
