//! The three channels a GBR/RGB SSTV line carries, in their emission order
//! on the wire (not their storage order in an RGB pixel).

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Channel {
    #[default]
    Green,
    Blue,
    Red,
}
