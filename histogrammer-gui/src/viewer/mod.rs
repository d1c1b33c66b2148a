//! Plot rendering for histogram views.

mod colormap;
mod surface;
mod texture;

pub use colormap::Colormap;
pub use surface::{EguiSurface, PlotInteraction};
pub use texture::color_map_image;
