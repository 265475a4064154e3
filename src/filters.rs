use serde::{Serialize, Deserialize};

/// Whole-surface filters applied to the base image layer. The math is pure
/// per-pixel so a filter action can precompute its after-snapshot once; undo
/// restores the before-snapshot and never re-derives an inverse.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Grayscale,
    Invert,
    Sepia,
}

impl FilterKind {
    pub fn from_name(name: &str) -> Option<FilterKind> {
        match name {
            "grayscale" => Some(FilterKind::Grayscale),
            "invert" => Some(FilterKind::Invert),
            "sepia" => Some(FilterKind::Sepia),
            _ => None,
        }
    }

    pub fn apply(self, pixels: &mut [u8]) {
        for px in pixels.chunks_exact_mut(4) {
            let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
            match self {
                FilterKind::Grayscale => {
                    let luma = ((r * 299 + g * 587 + b * 114) / 1000) as u8;
                    px[0] = luma;
                    px[1] = luma;
                    px[2] = luma;
                }
                FilterKind::Invert => {
                    px[0] = 255 - px[0];
                    px[1] = 255 - px[1];
                    px[2] = 255 - px[2];
                }
                FilterKind::Sepia => {
                    px[0] = ((r * 393 + g * 769 + b * 189) / 1000).min(255) as u8;
                    px[1] = ((r * 349 + g * 686 + b * 168) / 1000).min(255) as u8;
                    px[2] = ((r * 272 + g * 534 + b * 131) / 1000).min(255) as u8;
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> CropRegion {
        CropRegion { x, y, width, height }
    }

    /// Clamps the region to a surface of the given dimensions.
    pub fn clamped(self, max_width: u32, max_height: u32) -> CropRegion {
        let x = self.x.min(max_width);
        let y = self.y.min(max_height);
        CropRegion {
            x,
            y,
            width: self.width.min(max_width - x),
            height: self.height.min(max_height - y),
        }
    }
}
