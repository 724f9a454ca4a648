use crate::shapes::Shape;
use crate::math::{Aabb2, Transform2, Vector2};

/// A solid circle
#[derive(Debug, Clone)]
pub struct CircleShape {
    /// Center in local space
    center: Vector2,

    /// The radius of the circle
    radius: f32,
}

impl CircleShape {
    /// Creates a circle centered on the local origin
    pub fn new(radius: f32) -> Self {
        Self::with_center(Vector2::zero(), radius)
    }

    /// Creates a circle with a local-space center offset
    pub fn with_center(center: Vector2, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Returns the radius of the circle
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Returns the local-space center
    pub fn get_center(&self) -> Vector2 {
        self.center
    }
}

impl Shape for CircleShape {
    fn shape_type(&self) -> &'static str {
        "Circle"
    }

    fn test_point(&self, transform: &Transform2, point: Vector2) -> bool {
        let center = transform.transform_point(self.center);
        center.distance_squared(&point) <= self.radius * self.radius
    }

    fn compute_aabb(&self, transform: &Transform2) -> Aabb2 {
        let center = transform.transform_point(self.center);
        let r = Vector2::new(self.radius, self.radius);
        Aabb2::new(center - r, center + r)
    }

    fn clone_shape(&self) -> Box<dyn Shape> {
        Box::new(self.clone())
    }
}
