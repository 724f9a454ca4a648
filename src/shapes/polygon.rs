use crate::shapes::Shape;
use crate::math::{Aabb2, Transform2, Vector2};
use crate::error::ParticleError;
use crate::Result;

/// Maximum number of vertices on a convex polygon
pub const MAX_POLYGON_VERTICES: usize = 8;

/// A solid convex polygon with counter-clockwise winding
#[derive(Debug, Clone)]
pub struct PolygonShape {
    /// Vertices in local space
    vertices: Vec<Vector2>,

    /// Outward edge normals, `normals[i]` belongs to the edge `vertices[i] -> vertices[i + 1]`
    normals: Vec<Vector2>,
}

impl PolygonShape {
    /// Creates a convex polygon from counter-clockwise vertices
    pub fn new(vertices: &[Vector2]) -> Result<Self> {
        if vertices.len() < 3 || vertices.len() > MAX_POLYGON_VERTICES {
            return Err(ParticleError::InvalidParameter(format!(
                "polygon needs 3..={} vertices, got {}",
                MAX_POLYGON_VERTICES,
                vertices.len()
            )));
        }

        let count = vertices.len();
        let mut normals = Vec::with_capacity(count);
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            if edge.length_squared() <= crate::math::EPSILON {
                return Err(ParticleError::InvalidParameter(
                    "polygon has a degenerate edge".to_string(),
                ));
            }
            normals.push(Vector2::new(edge.y, -edge.x).normalize());
        }

        // Every vertex must sit behind every edge for a convex CCW polygon
        for i in 0..count {
            for (j, v) in vertices.iter().enumerate() {
                if j == i || j == (i + 1) % count {
                    continue;
                }
                if normals[i].dot(&(*v - vertices[i])) > 0.0 {
                    return Err(ParticleError::InvalidParameter(
                        "polygon must be convex with counter-clockwise winding".to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            vertices: vertices.to_vec(),
            normals,
        })
    }

    /// Creates an axis-aligned box centered on the local origin
    pub fn new_box(half_width: f32, half_height: f32) -> Self {
        Self::new_oriented_box(half_width, half_height, Vector2::zero(), 0.0)
    }

    /// Creates a box with a local center offset and rotation
    pub fn new_oriented_box(
        half_width: f32,
        half_height: f32,
        center: Vector2,
        angle: f32,
    ) -> Self {
        let hx = half_width.abs();
        let hy = half_height.abs();
        let xf = Transform2::new(center, angle);
        let corners = [
            Vector2::new(-hx, -hy),
            Vector2::new(hx, -hy),
            Vector2::new(hx, hy),
            Vector2::new(-hx, hy),
        ];
        let local_normals = [
            Vector2::new(0.0, -1.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(-1.0, 0.0),
        ];

        Self {
            vertices: corners.iter().map(|c| xf.transform_point(*c)).collect(),
            normals: local_normals.iter().map(|n| xf.rotation.rotate(*n)).collect(),
        }
    }

    /// Returns the local-space vertices
    pub fn get_vertices(&self) -> &[Vector2] {
        &self.vertices
    }
}

impl Shape for PolygonShape {
    fn shape_type(&self) -> &'static str {
        "Polygon"
    }

    fn test_point(&self, transform: &Transform2, point: Vector2) -> bool {
        let local = transform.inverse_transform_point(point);
        self.vertices
            .iter()
            .zip(&self.normals)
            .all(|(v, n)| n.dot(&(local - *v)) <= 0.0)
    }

    fn compute_aabb(&self, transform: &Transform2) -> Aabb2 {
        let world: Vec<Vector2> = self
            .vertices
            .iter()
            .map(|v| transform.transform_point(*v))
            .collect();
        Aabb2::from_points(&world).unwrap_or(Aabb2::new(transform.position, transform.position))
    }

    fn clone_shape(&self) -> Box<dyn Shape> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_clockwise_winding() {
        let cw = [Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0), Vector2::new(1.0, 0.0)];
        assert!(PolygonShape::new(&cw).is_err());
    }

    #[test]
    fn box_contains_its_center_and_edges() {
        let b = PolygonShape::new_box(1.0, 0.5);
        let xf = Transform2::identity();
        assert!(b.test_point(&xf, Vector2::zero()));
        assert!(b.test_point(&xf, Vector2::new(1.0, 0.5)));
        assert!(!b.test_point(&xf, Vector2::new(1.01, 0.0)));
    }

    #[test]
    fn rotated_box_bounds() {
        let b = PolygonShape::new_box(1.0, 1.0);
        let xf = Transform2::new(Vector2::zero(), std::f32::consts::FRAC_PI_4);
        let aabb = b.compute_aabb(&xf);
        let half_diag = 2.0_f32.sqrt();
        assert!((aabb.max.x - half_diag).abs() < 1e-5);
        assert!((aabb.min.y + half_diag).abs() < 1e-5);
    }
}
