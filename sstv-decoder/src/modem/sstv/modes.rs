//! Mode timing law.
//!
//! Adapted from [here][1]. [Vis codes][2]
//!
//! [1]: https://github.com/windytan/slowrx/blob/master/modespec.c
//! [2]: https://web.archive.org/web/20050306193820/http://www.tima.com/~djones/vis.txt

#[derive(Clone, Copy, Debug)]
pub struct ModeSpecification {
    pub name: &'static str,
    pub short_name: &'static str,
    pub sync_time: f32,
    pub porch_time: f32,
    pub sep_time: f32,
    pub pixel_time: f32,
    pub line_time: f32,
    pub pixels_per_line: u32,
    pub num_lines: u32,
    pub color_format: ColorFormat,
    pub vis_code: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    /// Channels are transmitted Green, Blue, Red — with the line sync
    /// pulse between Blue and Red rather than at the head of the line.
    Gbr,
    Rgb,
}

impl ModeSpecification {
    /// N7CXI, 2000
    pub const SCOTTIE_1: Self = Self {
        name: "Scottie S1",
        short_name: "S1",
        sync_time: 9e-3,
        porch_time: 1.5e-3,
        sep_time: 1.5e-3,
        pixel_time: 0.4320e-3,
        line_time: 428.38e-3,
        pixels_per_line: 320,
        num_lines: 256,
        color_format: ColorFormat::Gbr,
        vis_code: 0x3c,
    };
}

#[cfg(test)]
mod tests {
    use crate::modem::sstv::modes::ModeSpecification;

    #[test]
    fn scottie_1_vis_code() {
        assert_eq!(ModeSpecification::SCOTTIE_1.vis_code, 0x3c);
    }

    #[test]
    fn scottie_1_line_time_matches_timing_law() {
        let m = ModeSpecification::SCOTTIE_1;
        let color_len = m.pixel_time * m.pixels_per_line as f32;
        let line = m.sep_time + color_len + m.sep_time + color_len + m.sync_time
            + m.porch_time
            + color_len;
        assert!((line - m.line_time).abs() < 1e-4);
    }
}
