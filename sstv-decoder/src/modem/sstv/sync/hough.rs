//! Strategy A: global slant search (Hough-style accumulator) over a coarse
//! sync-presence bitmap. Preferred for noisy input; yields only
//! `(rate, skip)`, no individual sync positions.

use crate::modem::sstv::goertzel::SAMPLE_RATE;
use crate::modem::sstv::modes::ModeSpecification;

use super::{
    SYNC_HOP_SAMPLES,
    SyncResult,
    build_has_sync,
};

const MIN_SLANT_DEG: i64 = 30;
const MAX_SLANT_DEG: i64 = 150;
const MAX_RETRIES: u32 = 3;

pub fn locate_sync_hough(samples: &[i16], mode: &ModeSpecification, freq_shift: f32) -> SyncResult {
    let has_sync = build_has_sync(samples, SAMPLE_RATE, freq_shift);
    if has_sync.is_empty() {
        return SyncResult {
            rate: SAMPLE_RATE,
            skip: 0,
            sync_positions: None,
        };
    }

    let line_width = (mode.line_time / mode.sync_time * 4.0 + 0.5) as i64;
    if line_width <= 0 {
        return SyncResult {
            rate: SAMPLE_RATE,
            skip: 0,
            sync_positions: None,
        };
    }

    let mut rate = SAMPLE_RATE;
    let mut retries = 0u32;
    loop {
        let mut sync_img = vec![vec![false; mode.num_lines as usize]; line_width as usize];
        for y in 0..mode.num_lines as usize {
            for x in 0..line_width as usize {
                let t = (y as f32 + x as f32 / line_width as f32) * mode.line_time;
                let idx = (t * rate / SYNC_HOP_SAMPLES as f32) as i64;
                if idx >= 0 && (idx as usize) < has_sync.len() && has_sync[idx as usize] {
                    sync_img[x][y] = true;
                }
            }
        }

        let bucket_count = ((MAX_SLANT_DEG - MIN_SLANT_DEG) * 2) as usize;
        let mut accum = vec![vec![0u32; bucket_count]; (line_width + 1) as usize];
        let mut d_most = 0usize;
        let mut q_most = 0i64;
        for cy in 0..mode.num_lines as i64 {
            for cx in 0..line_width {
                if !sync_img[cx as usize][cy as usize] {
                    continue;
                }
                for q in MIN_SLANT_DEG * 2..MAX_SLANT_DEG * 2 {
                    let angle = (q as f32 / 2.0).to_radians();
                    let d = (line_width as f32 + (-(cx as f32) * angle.sin() + cy as f32 * angle.cos()))
                        .round() as i64;
                    if d > 0 && d < line_width {
                        let bucket = (q - MIN_SLANT_DEG * 2) as usize;
                        accum[d as usize][bucket] += 1;
                        let best_bucket = (q_most - MIN_SLANT_DEG * 2).max(0) as usize;
                        if accum[d as usize][bucket] > accum[d_most][best_bucket] {
                            d_most = d as usize;
                            q_most = q;
                        }
                    }
                }
            }
        }

        if q_most == 0 {
            break;
        }

        let slant_angle = q_most as f32 / 2.0;
        if slant_angle > 89.0 && slant_angle < 91.0 {
            break;
        }
        if retries >= MAX_RETRIES {
            rate = SAMPLE_RATE;
            break;
        }
        rate += (90.0 - slant_angle).to_radians().tan() / line_width as f32 * rate;
        retries += 1;
        tracing::debug!(retries, slant_angle, rate, "slant retry");
    }

    const PHASE_COLUMNS: usize = 700;
    let mut x_acc = vec![0u32; PHASE_COLUMNS];
    for y in 0..mode.num_lines as usize {
        for (x, slot) in x_acc.iter_mut().enumerate() {
            let t = y as f32 * mode.line_time + x as f32 / PHASE_COLUMNS as f32 * mode.line_time;
            let idx = (t * rate / SYNC_HOP_SAMPLES as f32) as i64;
            if idx >= 0 && (idx as usize) < has_sync.len() && has_sync[idx as usize] {
                *slot += 1;
            }
        }
    }

    let mut max_conv: Option<i64> = None;
    let mut xmax = 0usize;
    for x in 0..PHASE_COLUMNS - 8 {
        let sum_a: i64 = x_acc[x..x + 4].iter().map(|&v| v as i64).sum();
        let sum_b: i64 = x_acc[x + 4..x + 8].iter().map(|&v| v as i64).sum();
        let conv = sum_a - sum_b;
        let better = match max_conv {
            Some(m) => conv > m,
            None => true,
        };
        if better {
            max_conv = Some(conv);
            xmax = x + 4;
        }
    }
    if xmax > 350 {
        xmax -= 350;
    }

    let mut s = xmax as f32 / PHASE_COLUMNS as f32 * mode.line_time - mode.sync_time;
    if mode.name.starts_with("Scottie") {
        s = s - mode.pixel_time * mode.pixels_per_line as f32 / 2.0 + mode.porch_time * 2.0;
    }
    let skip = (s * rate).round() as i64;

    SyncResult {
        rate,
        skip,
        sync_positions: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_returns_nominal_rate() {
        let result = locate_sync_hough(&[], &ModeSpecification::SCOTTIE_1, 0.0);
        assert_eq!(result.rate, SAMPLE_RATE);
        assert_eq!(result.skip, 0);
        assert!(result.sync_positions.is_none());
    }

    #[test]
    fn silence_yields_no_slant() {
        let samples = vec![0i16; SAMPLE_RATE as usize];
        let result = locate_sync_hough(&samples, &ModeSpecification::SCOTTIE_1, 0.0);
        assert!((result.rate - SAMPLE_RATE).abs() / SAMPLE_RATE <= 0.05);
    }
}
