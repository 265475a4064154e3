use std::io::Cursor;
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use crate::actions::Snapshot;
use crate::engine::AnnotationEngine;
use crate::raster::Surface;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode png: {0}")]
    Encode(image::ImageError),
    #[error("raster buffer has inconsistent dimensions")]
    InvalidDimensions,
}

#[wasm_bindgen]
impl AnnotationEngine {
    /// Decodes PNG/JPEG bytes into the base layer via a logged load action.
    pub fn load_image(&mut self, data: &[u8]) -> String {
        match decode_snapshot(data) {
            Ok(snapshot) => {
                let (width, height) = (snapshot.width, snapshot.height);
                if self.load_base(snapshot) {
                    format!("{{\"success\": true, \"width\": {}, \"height\": {}}}", width, height)
                } else {
                    "{ \"error\": \"Empty image\" }".to_string()
                }
            }
            Err(e) => format!("{{\"error\": \"{}\"}}", e),
        }
    }

    /// The exported artifact: base layer, drawing layer, and every live
    /// vector element composited into a single PNG. The action log is a
    /// session-local editing aid and is not part of the output.
    pub fn export_png(&self) -> Vec<u8> {
        encode_png(&self.composited()).unwrap_or_default()
    }

    pub fn export_data_url(&self) -> String {
        match encode_png(&self.composited()) {
            Ok(bytes) => format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(bytes)),
            Err(_) => String::new(),
        }
    }
}

impl AnnotationEngine {
    fn composited(&self) -> Surface {
        let mut out = self.base.clone();
        out.composite_over(&self.drawing);
        if !self.elements.is_empty() {
            let mut overlay = Surface::new(self.drawing.width(), self.drawing.height());
            self.elements.render_all(&mut overlay, self.font.as_ref());
            out.composite_over(&overlay);
        }
        out
    }
}

pub(crate) fn decode_snapshot(data: &[u8]) -> Result<Snapshot, IoError> {
    let rgba = image::load_from_memory(data)?.to_rgba8();
    Ok(Snapshot {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

pub(crate) fn encode_png(surface: &Surface) -> Result<Vec<u8>, IoError> {
    let img = RgbaImage::from_raw(surface.width(), surface.height(), surface.to_vec())
        .ok_or(IoError::InvalidDimensions)?;
    let mut bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(IoError::Encode)?;
    Ok(bytes)
}
