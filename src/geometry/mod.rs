pub mod hit_testing;
pub mod shapes;
pub mod transform;

pub use shapes::Corner;
pub use transform::{Rotation, ViewTransform, clamp_pixel_ratio, fit_to_width};
