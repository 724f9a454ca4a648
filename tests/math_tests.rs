use liquidfun_bind::math::{
    byte_to_unit, unit_to_byte, Aabb2, Color, ParticleColor, Transform2, Vector2,
};
use liquidfun_bind::shapes::{CircleShape, PolygonShape, Shape};
use std::f32::consts::PI;
use approx::assert_relative_eq;
use rand::Rng;

#[test]
fn test_vector2_operations() {
    let v1 = Vector2::new(1.0, 2.0);
    let v2 = Vector2::new(4.0, 5.0);

    // Addition
    let sum = v1 + v2;
    assert_eq!(sum, Vector2::new(5.0, 7.0));

    // Subtraction
    let diff = v2 - v1;
    assert_eq!(diff, Vector2::new(3.0, 3.0));

    // Scalar multiplication
    assert_eq!(v1 * 2.0, Vector2::new(2.0, 4.0));

    // Dot and cross products
    assert_eq!(v1.dot(&v2), 14.0);
    assert_eq!(v1.cross(&v2), 1.0 * 5.0 - 2.0 * 4.0);

    // Angular velocity crossed with a lever arm
    assert_eq!(Vector2::cross_scalar(2.0, Vector2::new(1.0, 0.0)), Vector2::new(0.0, 2.0));

    // Normalize
    let normalized = v1.normalize();
    assert_relative_eq!(normalized.length(), 1.0);
    assert_relative_eq!(normalized.x, v1.x / v1.length());
}

#[test]
fn test_transform2_operations() {
    let transform = Transform2::new(Vector2::new(1.0, 2.0), PI / 2.0);

    // Rotate 90 degrees, then translate
    let point = transform.transform_point(Vector2::new(1.0, 0.0));
    assert_relative_eq!(point.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(point.y, 3.0, epsilon = 1e-5);

    let back = transform.inverse_transform_point(point);
    assert_relative_eq!(back.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(back.y, 0.0, epsilon = 1e-5);

    // nalgebra interop keeps the isometry
    let iso = transform.to_nalgebra();
    let round = Transform2::from_nalgebra(&iso);
    assert_relative_eq!(round.get_angle(), PI / 2.0, epsilon = 1e-5);
    assert_eq!(round.position, transform.position);
}

#[test]
fn test_aabb2_operations() {
    let corners = [Vector2::new(-1.0, 2.0), Vector2::new(3.0, -2.0), Vector2::zero()];
    let aabb = Aabb2::from_points(&corners).unwrap();

    assert_eq!(aabb.center(), Vector2::new(1.0, 0.0));
    assert_eq!(aabb.extents(), Vector2::new(4.0, 4.0));
    assert!(aabb.contains_point(Vector2::new(3.0, 2.0)));
    assert!(!aabb.contains_point(Vector2::new(3.1, 0.0)));
    assert!(Aabb2::from_points(&[]).is_none());
}

#[test]
fn test_color_conversion_is_truncating() {
    assert_eq!(ParticleColor::from(Color::WHITE), ParticleColor::new(255, 255, 255, 255));
    assert_eq!(
        ParticleColor::from(Color::new(0.5, 0.25, 0.0, 1.0)),
        ParticleColor::new(127, 63, 0, 255)
    );
    assert_eq!(Color::from(ParticleColor::new(255, 0, 0, 255)), Color::new(1.0, 0.0, 0.0, 1.0));

    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let unit: f32 = rng.gen();
        let back = byte_to_unit(unit_to_byte(unit));
        assert!((unit - back).abs() <= 1.0 / 255.0 + 1.0e-6);
    }
}

#[test]
fn test_shape_point_tests() {
    let circle = CircleShape::new(1.0);
    let moved = Transform2::from_position(Vector2::new(5.0, 0.0));
    assert!(circle.test_point(&moved, Vector2::new(5.5, 0.5)));
    assert!(!circle.test_point(&moved, Vector2::new(0.0, 0.0)));

    let bounds = circle.compute_aabb(&moved);
    assert_eq!(bounds.min, Vector2::new(4.0, -1.0));
    assert_eq!(bounds.max, Vector2::new(6.0, 1.0));

    let block = PolygonShape::new_box(2.0, 0.5);
    let turned = Transform2::new(Vector2::zero(), PI / 2.0);
    assert!(block.test_point(&Transform2::identity(), Vector2::new(1.9, 0.0)));
    assert!(!block.test_point(&turned, Vector2::new(1.9, 0.0)));
    assert!(block.test_point(&turned, Vector2::new(0.0, 1.9)));

    // Clockwise winding is rejected
    let clockwise = [Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0), Vector2::new(1.0, 0.0)];
    assert!(PolygonShape::new(&clockwise).is_err());
    assert_eq!(block.clone_shape().shape_type(), block.shape_type());
}
