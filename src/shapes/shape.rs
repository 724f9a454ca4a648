use crate::math::{Aabb2, Transform2, Vector2};
use std::fmt::Debug;

/// Base trait for the 2D shapes particle operations are given
///
/// The engine uses shapes two ways: as a region to fill when creating a
/// particle group and as a region to clear in `destroy_particles_in_shape`.
pub trait Shape: Send + Sync + Debug + 'static {
    /// Returns the type name of the shape
    fn shape_type(&self) -> &'static str;

    /// Returns true if the world-space point lies inside the shape placed at `transform`
    fn test_point(&self, transform: &Transform2, point: Vector2) -> bool;

    /// Returns the world-space bounding box of the shape placed at `transform`
    fn compute_aabb(&self, transform: &Transform2) -> Aabb2;

    /// Clone the shape to create a new box
    fn clone_shape(&self) -> Box<dyn Shape>;
}
