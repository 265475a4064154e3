use image::{Rgba, RgbaImage};
use crate::actions::{DrawingAction, Snapshot};
use crate::filters::CropRegion;
use crate::types::parse_color;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompositeMode {
    /// Normal alpha blending.
    SourceOver,
    /// Eraser: knocks alpha out of the destination.
    DestinationOut,
}

/// Paint state for exactly one action's rendering. A fresh `Paint` is built
/// per action, so composite mode and dash pattern can never leak from one
/// action into the next.
#[derive(Clone, Copy, Debug)]
pub struct Paint {
    pub color: [u8; 4],
    pub mode: CompositeMode,
    pub width: f64,
    pub dash: Option<[f64; 2]>,
}

impl Paint {
    pub fn for_action(action: &DrawingAction) -> Paint {
        let width = action.width.max(1.0);
        Paint {
            color: parse_color(&action.color),
            mode: if action.kind.is_eraser() {
                CompositeMode::DestinationOut
            } else {
                CompositeMode::SourceOver
            },
            width,
            dash: action.style.dash_pattern(width),
        }
    }

    pub fn solid(color: &str, width: f64) -> Paint {
        Paint {
            color: parse_color(color),
            mode: CompositeMode::SourceOver,
            width: width.max(1.0),
            dash: None,
        }
    }

    pub fn without_dash(mut self) -> Paint {
        self.dash = None;
        self
    }
}

/// An explicitly owned raster layer. All paint lands here; there is no
/// ambient context anywhere in the crate.
#[derive(Clone, Debug)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Surface {
        Surface { pixels: RgbaImage::new(width, height) }
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Surface {
        let mut surface = Surface::new(snapshot.width, snapshot.height);
        surface.restore(snapshot);
        surface
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.width(),
            height: self.height(),
            pixels: self.pixels.as_raw().clone(),
        }
    }

    /// Byte-exact restore, resizing the surface to the snapshot's dimensions.
    /// An inconsistent snapshot is ignored.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        if !snapshot.is_consistent() {
            return;
        }
        if let Some(img) = RgbaImage::from_raw(snapshot.width, snapshot.height, snapshot.pixels.clone()) {
            self.pixels = img;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width() || y >= self.height() {
            return [0, 0, 0, 0];
        }
        self.pixels.get_pixel(x, y).0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.pixels.as_raw().clone()
    }

    pub fn blend_pixel(&mut self, x: i64, y: i64, color: [u8; 4], mode: CompositeMode) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
        match mode {
            CompositeMode::SourceOver => {
                let sa = color[3] as u32;
                if sa == 0 {
                    return;
                }
                if sa == 255 {
                    dst.0 = color;
                    return;
                }
                let da = dst.0[3] as u32;
                let out_a = sa + da * (255 - sa) / 255;
                if out_a == 0 {
                    dst.0 = [0, 0, 0, 0];
                    return;
                }
                for c in 0..3 {
                    let s = color[c] as u32;
                    let d = dst.0[c] as u32;
                    dst.0[c] = ((s * sa + d * da * (255 - sa) / 255) / out_a) as u8;
                }
                dst.0[3] = out_a as u8;
            }
            CompositeMode::DestinationOut => {
                let sa = color[3] as u32;
                dst.0[3] = (dst.0[3] as u32 * (255 - sa) / 255) as u8;
            }
        }
    }

    /// Stamps one hard-edged circular dab. Replay renders strokes by walking
    /// dabs along the path, so the same action list always lands on the same
    /// pixels.
    pub fn stamp_dab(&mut self, cx: f64, cy: f64, radius: f64, paint: &Paint) {
        let r = radius.max(0.5);
        let r2 = r * r;
        let min_x = (cx - r).floor() as i64;
        let max_x = (cx + r).ceil() as i64;
        let min_y = (cy - r).floor() as i64;
        let max_y = (cy + r).ceil() as i64;
        for iy in min_y..=max_y {
            for ix in min_x..=max_x {
                let dx = ix as f64 + 0.5 - cx;
                let dy = iy as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(ix, iy, paint.color, paint.mode);
                }
            }
        }
    }

    /// Source-over composite of `top` onto this surface (export path).
    pub fn composite_over(&mut self, top: &Surface) {
        let w = self.width().min(top.width());
        let h = self.height().min(top.height());
        for y in 0..h {
            for x in 0..w {
                self.blend_pixel(x as i64, y as i64, top.pixel(x, y), CompositeMode::SourceOver);
            }
        }
    }

    pub fn cropped(&self, region: &CropRegion) -> Snapshot {
        let region = region.clamped(self.width(), self.height());
        let mut out = RgbaImage::new(region.width, region.height);
        for y in 0..region.height {
            for x in 0..region.width {
                out.put_pixel(x, y, *self.pixels.get_pixel(region.x + x, region.y + y));
            }
        }
        Snapshot { width: region.width, height: region.height, pixels: out.into_raw() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_out_clears_alpha() {
        let mut s = Surface::new(4, 4);
        s.blend_pixel(1, 1, [255, 0, 0, 255], CompositeMode::SourceOver);
        assert_eq!(s.pixel(1, 1), [255, 0, 0, 255]);
        s.blend_pixel(1, 1, [0, 0, 0, 255], CompositeMode::DestinationOut);
        assert_eq!(s.pixel(1, 1)[3], 0);
    }

    #[test]
    fn restore_is_byte_exact() {
        let mut s = Surface::new(3, 3);
        s.blend_pixel(2, 0, [10, 20, 30, 255], CompositeMode::SourceOver);
        let snap = s.snapshot();
        s.clear();
        assert_eq!(s.pixel(2, 0), [0, 0, 0, 0]);
        s.restore(&snap);
        assert_eq!(s.to_vec(), snap.pixels);
    }

    #[test]
    fn out_of_bounds_blend_is_a_noop() {
        let mut s = Surface::new(2, 2);
        s.blend_pixel(-1, 0, [255, 255, 255, 255], CompositeMode::SourceOver);
        s.blend_pixel(5, 5, [255, 255, 255, 255], CompositeMode::SourceOver);
        assert!(s.to_vec().iter().all(|&b| b == 0));
    }
}
