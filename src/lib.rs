pub mod types;
pub mod actions;
pub mod elements;
pub mod history;
pub mod raster;
pub mod replay;
pub mod filters;
pub mod engine;
pub mod commands;
pub mod io;

pub use engine::AnnotationEngine;
pub use actions::*;
pub use elements::{Element, ElementShape, ElementStore, MIN_ELEMENT_SIZE};
pub use filters::{CropRegion, FilterKind};
pub use history::History;
pub use raster::{CompositeMode, Paint, Surface};
pub use types::*;
