mod shape;
mod circle;
mod polygon;

pub use self::shape::Shape;
pub use self::circle::CircleShape;
pub use self::polygon::{PolygonShape, MAX_POLYGON_VERTICES};
