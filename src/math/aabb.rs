use crate::math::Vector2;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Axis-aligned bounding box in 2D
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb2 {
    /// Lower corner
    pub min: Vector2,

    /// Upper corner
    pub max: Vector2,
}

impl Aabb2 {
    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB from a set of points
    pub fn from_points(points: &[Vector2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;

        let mut min = *first;
        let mut max = *first;
        for point in rest {
            min = min.min(point);
            max = max.max(point);
        }

        Some(Self { min, max })
    }

    /// Returns the center of the AABB
    #[inline]
    pub fn center(&self) -> Vector2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the extents of the AABB in each dimension
    #[inline]
    pub fn extents(&self) -> Vector2 {
        self.max - self.min
    }

    /// Returns true if the point lies inside or on the boundary
    #[inline]
    pub fn contains_point(&self, point: Vector2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}
