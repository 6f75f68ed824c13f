//! 3-tap `[1, 1, 1]/3` horizontal mean filter over the 240-column image
//! region, border pixels clamped to the nearest in-region pixel.

use image::RgbImage;

use crate::modem::sstv::sampler::{
    OUT_IMAGE_WIDTH,
    PAD_X,
};

pub fn smooth(canvas: &mut RgbImage) {
    if canvas.width() < PAD_X + OUT_IMAGE_WIDTH {
        return;
    }
    for y in 0..canvas.height() {
        let row: Vec<[u8; 3]> = (0..OUT_IMAGE_WIDTH)
            .map(|x| canvas.get_pixel(PAD_X + x, y).0)
            .collect();
        for x in 0..OUT_IMAGE_WIDTH as usize {
            let x0 = x.saturating_sub(1);
            let x2 = (x + 1).min(OUT_IMAGE_WIDTH as usize - 1);
            let mut out = [0u8; 3];
            for c in 0..3 {
                let sum = row[x0][c] as u32 + row[x][c] as u32 + row[x2][c] as u32;
                out[c] = (sum / 3) as u8;
            }
            canvas.put_pixel(PAD_X + x as u32, y, image::Rgb(out));
        }
    }
}
