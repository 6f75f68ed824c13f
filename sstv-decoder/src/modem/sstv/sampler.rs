//! Pixel-grid sampler: a pure indexed mapping from (line, channel, column)
//! to a sample instant, followed by a bilinear resize into the fixed
//! output canvas.

use image::{
    Rgb,
    RgbImage,
};

use crate::modem::sstv::image::Channel;
use crate::modem::sstv::modes::{
    ColorFormat,
    ModeSpecification,
};
use crate::util::lerp;

pub const OUT_WIDTH: u32 = 288;
pub const OUT_HEIGHT: u32 = 192;
pub const OUT_IMAGE_WIDTH: u32 = 240;
pub const PAD_X: u32 = (OUT_WIDTH - OUT_IMAGE_WIDTH) / 2;

/// R=250, G=240, B=216.
pub const PANEL_BG: Rgb<u8> = Rgb([0xFA, 0xF0, 0xD8]);

/// Per-channel start offset within a line, in seconds. Scottie's sync
/// pulse sits between Blue and Red, so channel start order does not match
/// channel emission order 0/1/2 == Green/Blue/Red in the naive way the
/// Robot-family modes would compute it.
fn channel_starts(mode: &ModeSpecification) -> [f32; 3] {
    let color_len = mode.pixel_time * mode.pixels_per_line as f32;
    match mode.color_format {
        ColorFormat::Gbr => {
            let g = mode.sep_time;
            let b = g + color_len + mode.sep_time;
            let r = b + color_len + mode.sync_time + mode.porch_time;
            [g, b, r]
        }
        ColorFormat::Rgb => {
            let r = mode.sync_time + mode.porch_time;
            let g = r + color_len + mode.sep_time;
            let b = g + color_len + mode.sep_time;
            [r, g, b]
        }
    }
}

fn channel_for_slot(mode: &ModeSpecification, slot: usize) -> Channel {
    match (mode.color_format, slot) {
        (ColorFormat::Gbr, 0) => Channel::Green,
        (ColorFormat::Gbr, 1) => Channel::Blue,
        (ColorFormat::Gbr, _) => Channel::Red,
        (ColorFormat::Rgb, 0) => Channel::Red,
        (ColorFormat::Rgb, 1) => Channel::Green,
        (ColorFormat::Rgb, _) => Channel::Blue,
    }
}

/// Samples the raw `pixels_per_line x num_lines` image from `luminance`
/// given the slant-corrected `rate` and `skip`. Pixels whose computed
/// sample index falls outside the buffer are left black.
pub fn sample_raw_image(
    mode: &ModeSpecification,
    rate: f32,
    skip: i64,
    luminance: &[u8],
) -> RgbImage {
    let mut raw = RgbImage::new(mode.pixels_per_line, mode.num_lines);
    let chan_start = channel_starts(mode);
    let color_len = mode.pixel_time * mode.pixels_per_line as f32;

    for y in 0..mode.num_lines {
        for slot in 0..3usize {
            let channel = channel_for_slot(mode, slot);
            for x in 0..mode.pixels_per_line {
                let t = y as f32 * mode.line_time
                    + chan_start[slot]
                    + (x as f32 - 0.5) / mode.pixels_per_line as f32 * color_len;
                let sample_idx = (rate as f64 * t as f64).round() as i64 + skip;
                if sample_idx < 0 || sample_idx as usize >= luminance.len() {
                    continue;
                }
                let val = luminance[sample_idx as usize];
                let pixel = raw.get_pixel_mut(x, y);
                match channel {
                    Channel::Green => pixel.0[1] = val,
                    Channel::Blue => pixel.0[2] = val,
                    Channel::Red => pixel.0[0] = val,
                }
            }
        }
    }
    raw
}

/// Bilinear-resizes `raw` to `OUT_IMAGE_WIDTH x OUT_HEIGHT` and pastes it at
/// `(PAD_X, 0)` into a fresh `OUT_WIDTH x OUT_HEIGHT` canvas whose border is
/// `PANEL_BG`.
pub fn paste_into_canvas(raw: &RgbImage) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(OUT_WIDTH, OUT_HEIGHT, PANEL_BG);
    let scaled = bilinear_resize(raw, OUT_IMAGE_WIDTH, OUT_HEIGHT);
    for y in 0..OUT_HEIGHT {
        for x in 0..OUT_IMAGE_WIDTH {
            canvas.put_pixel(PAD_X + x, y, *scaled.get_pixel(x, y));
        }
    }
    canvas
}

fn bilinear_resize(src: &RgbImage, out_w: u32, out_h: u32) -> RgbImage {
    let (sw, sh) = (src.width(), src.height());
    let mut dst = RgbImage::new(out_w, out_h);
    if sw == 0 || sh == 0 {
        return dst;
    }
    let x_scale = sw as f32 / out_w as f32;
    let y_scale = sh as f32 / out_h as f32;
    for oy in 0..out_h {
        let sy = ((oy as f32 + 0.5) * y_scale - 0.5).max(0.0);
        let y0 = sy.floor() as u32;
        let y1 = (y0 + 1).min(sh - 1);
        let ty = sy - y0 as f32;
        for ox in 0..out_w {
            let sx = ((ox as f32 + 0.5) * x_scale - 0.5).max(0.0);
            let x0 = sx.floor() as u32;
            let x1 = (x0 + 1).min(sw - 1);
            let tx = sx - x0 as f32;

            let p00 = src.get_pixel(x0, y0).0;
            let p10 = src.get_pixel(x1, y0).0;
            let p01 = src.get_pixel(x0, y1).0;
            let p11 = src.get_pixel(x1, y1).0;

            let mut out = [0u8; 3];
            for c in 0..3 {
                let top = lerp(tx, p00[c] as f32, p10[c] as f32);
                let bottom = lerp(tx, p01[c] as f32, p11[c] as f32);
                out[c] = lerp(ty, top, bottom).round().clamp(0.0, 255.0) as u8;
            }
            dst.put_pixel(ox, oy, Rgb(out));
        }
    }
    dst
}
