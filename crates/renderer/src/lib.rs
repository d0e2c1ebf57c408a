//! Trail rendering for the particle animation.
//!
//! - [`ColorScale`]: velocity magnitude to colour bucket
//! - [`TrailCanvas`]: the drawing surface the animator composites onto
//! - [`PixmapCanvas`]: tiny-skia implementation for headless hosts
//! - [`png`]: frame export

pub mod color_scale;
pub mod error;
pub mod png;
pub mod trails;

pub use color_scale::{parse_css_color, ColorScale, DEFAULT_COLOR_SCALE};
pub use error::RenderError;
pub use trails::{PixmapCanvas, Segment, TrailCanvas};
