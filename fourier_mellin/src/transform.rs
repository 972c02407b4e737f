//! Similarity transform recovered by registration.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign};

use glam::{DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Translation, rotation and uniform scale about the image centre, plus the
/// confidence of the registration that produced it.
///
/// A point `p`, given relative to the image centre, maps to
/// `scale * R(rotation) * p + (x, y)` with
/// `R(θ) = [[cos θ, -sin θ], [sin θ, cos θ]]` in pixel coordinates
/// (x right, y down). Rotation is in degrees.
///
/// Two ways to chain transforms:
/// - `a + b` / [`then`](Self::then): apply `a` first, then `b`.
/// - `a * b` / [`compose`](Self::compose): matrix product, `b` first.
///
/// Chaining keeps the lower of the two responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    x: f64,
    y: f64,
    rotation: f64,
    scale: f64,
    response: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transform(x={:.2}, y={:.2}, rot={:.3}°, scale={:.4}, response={:.3})",
            self.x, self.y, self.rotation, self.scale, self.response
        )
    }
}

impl Transform {
    /// # Panics
    /// Panics if `scale` is not a positive finite number.
    pub fn new(x: f64, y: f64, rotation: f64, scale: f64, response: f64) -> Self {
        assert!(
            scale > 0.0 && scale.is_finite(),
            "Scale must be positive and finite"
        );
        Self {
            x,
            y,
            rotation,
            scale,
            response,
        }
    }

    /// No motion, full confidence. Neutral element for chaining.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0, 1.0)
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 1.0, 1.0)
    }

    /// Rotation (degrees) and scale about the centre, no translation.
    pub fn rotation_scale(rotation: f64, scale: f64) -> Self {
        Self::new(0.0, 0.0, rotation, scale, 1.0)
    }

    /// Recover the parameters of a similarity matrix.
    ///
    /// Rotation comes back normalized to `(-180, 180]`.
    pub fn from_matrix(matrix: DMat3, response: f64) -> Self {
        let a = matrix.x_axis.x;
        let c = matrix.x_axis.y;
        Self::new(
            matrix.z_axis.x,
            matrix.z_axis.y,
            c.atan2(a).to_degrees(),
            a.hypot(c),
            response,
        )
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Translation as a vector.
    #[inline]
    pub fn offset(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Degrees.
    #[inline]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn response(&self) -> f64 {
        self.response
    }

    pub fn with_response(self, response: f64) -> Self {
        Self { response, ..self }
    }

    /// Homogeneous 3x3 matrix acting on centre-relative column vectors.
    pub fn matrix(&self) -> DMat3 {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let (sc, ss) = (self.scale * cos, self.scale * sin);
        DMat3::from_cols(
            DVec3::new(sc, ss, 0.0),
            DVec3::new(-ss, sc, 0.0),
            DVec3::new(self.x, self.y, 1.0),
        )
    }

    /// Map a centre-relative point.
    pub fn apply(&self, p: DVec2) -> DVec2 {
        self.matrix().transform_point2(p)
    }

    /// The transform that undoes this one. Keeps the response.
    pub fn inverse(&self) -> Self {
        Self::from_matrix(self.matrix().inverse(), self.response)
    }

    /// `self * other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self::from_matrix(
            self.matrix() * other.matrix(),
            self.response.min(other.response),
        )
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &Self) -> Self {
        next.compose(self)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

impl MulAssign for Transform {
    fn mul_assign(&mut self, rhs: Transform) {
        *self = self.compose(&rhs);
    }
}

impl Add for Transform {
    type Output = Transform;

    fn add(self, rhs: Transform) -> Transform {
        self.then(&rhs)
    }
}

impl AddAssign for Transform {
    fn add_assign(&mut self, rhs: Transform) {
        *self = self.then(&rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn assert_params(t: &Transform, x: f64, y: f64, rotation: f64, scale: f64) {
        assert!((t.x() - x).abs() < EPSILON, "x: {t}");
        assert!((t.y() - y).abs() < EPSILON, "y: {t}");
        assert!((t.rotation() - rotation).abs() < EPSILON, "rotation: {t}");
        assert!((t.scale() - scale).abs() < EPSILON, "scale: {t}");
    }

    #[test]
    fn test_identity_is_default() {
        let t = Transform::default();
        assert_params(&t, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(t.response(), 1.0);
        assert_eq!(t.apply(DVec2::new(5.0, 7.0)), DVec2::new(5.0, 7.0));
    }

    #[test]
    fn test_rotation_90_maps_x_axis_down() {
        let p = Transform::rotation_scale(90.0, 1.0).apply(DVec2::new(1.0, 0.0));
        assert!(p.x.abs() < EPSILON);
        assert!((p.y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_rotations_add_up() {
        let (r1, r2) = (17.0, 22.0);
        let t1 = Transform::new(0.0, 0.0, r1, 1.0, 0.0);
        let t2 = Transform::new(0.0, 0.0, r2, 1.0, 0.0);

        let t3 = t1 * t2 * t2 * t1 * t2;
        assert_params(&t3, 0.0, 0.0, 2.0 * r1 + 3.0 * r2, 1.0);
    }

    #[test]
    fn test_scales_multiply() {
        let t1 = Transform::new(0.0, 0.0, 17.0, 1.1, 0.0);
        let t2 = Transform::new(0.0, 0.0, 22.0, 0.93, 0.0);

        let t3 = t1 * t2 * t2 * t1 * t2;
        let s3 = 1.1f64.powi(2) * 0.93f64.powi(3);
        assert_params(&t3, 0.0, 0.0, 100.0, s3);
    }

    #[test]
    fn test_offsets_add_up() {
        let t1 = Transform::new(17.0, 12.0, 0.0, 1.0, 0.0);
        let t2 = Transform::new(22.0, 4.0, 0.0, 1.0, 0.0);

        let t3 = t1 * t2 * t2 * t1 * t2;
        assert_params(&t3, 2.0 * 17.0 + 3.0 * 22.0, 2.0 * 12.0 + 3.0 * 4.0, 0.0, 1.0);
    }

    #[test]
    fn test_rotation_carries_offsets() {
        let step = Transform::new(3.0, 0.0, 90.0, 1.0, 0.0);
        let t3 = Transform::identity() * step * step * step;
        assert_params(&t3, 0.0, 3.0, -90.0, 1.0);
    }

    #[test]
    fn test_full_turn_returns_to_identity() {
        let step = Transform::new(1.2345, 0.0, 45.0, 1.0, 0.0);
        let mut t = Transform::identity();
        for _ in 0..8 {
            t *= step;
        }
        assert_params(&t, 0.0, 0.0, 0.0, 1.0);

        let step = Transform::new(100.0, -30.0, 3.6, 1.0, 0.0);
        let mut t = Transform::identity();
        for _ in 0..100 {
            t *= step;
        }
        assert_params(&t, 0.0, 0.0, 0.0, 1.0);
    }

    #[test]
    fn test_inverse_cancels() {
        let t = Transform::new(-12.0, 34.0, -12.34, 1.234, 0.7);
        let inv = t.inverse();
        assert_eq!(inv.response(), 0.7);

        let round_trip = t * t * inv * inv * inv * inv * t * t;
        assert_params(&round_trip, 0.0, 0.0, 0.0, 1.0);
        assert_params(&(t * inv), 0.0, 0.0, 0.0, 1.0);
        assert_params(&(inv * t), 0.0, 0.0, 0.0, 1.0);
    }

    #[test]
    fn test_random_walk_accumulates_rotation_and_scale() {
        let xs = [3.14, 2.71, 1.41, 0.57, 4.67, 5.23, 6.78, 7.89, 8.12, 9.34];
        let ys = [0.45, 1.67, 2.89, 3.01, 4.23, 5.34, 6.45, 7.56, 8.67, 9.78];
        let rs = [0.12, 1.23, 2.34, 3.45, 4.56, 5.67, 6.78, 7.89, 8.90, 9.01];
        let ss = [1.11, 2.22, 3.33, 4.44, 5.55, 6.66, 7.77, 8.88, 9.99, 10.10];

        let mut t = Transform::identity();
        for i in 0..10 {
            t *= Transform::new(xs[i], ys[i], rs[i], ss[i], 0.0);
        }

        let rotation: f64 = rs.iter().sum();
        let scale: f64 = ss.iter().product();
        assert!((t.rotation() - rotation).abs() < EPSILON);
        assert!((t.scale() - scale).abs() / scale < 1e-12);
    }

    #[test]
    fn test_then_applies_left_operand_first() {
        let a = Transform::new(4.0, -2.0, 30.0, 1.5, 0.9);
        let b = Transform::new(-1.0, 6.0, -75.0, 0.8, 0.6);
        let p = DVec2::new(2.5, -7.0);

        let expected = b.apply(a.apply(p));
        assert!(((a + b).apply(p) - expected).length() < 1e-9);
        assert!((a.then(&b).apply(p) - expected).length() < 1e-9);
        assert!(((b * a).apply(p) - expected).length() < 1e-9);
        assert_eq!((a + b).response(), 0.6);
    }

    #[test]
    fn test_composition_is_associative() {
        let a = Transform::new(1.0, 2.0, 10.0, 1.1, 1.0);
        let b = Transform::new(-3.0, 0.5, -40.0, 0.9, 1.0);
        let c = Transform::new(7.0, -4.0, 95.0, 1.3, 1.0);
        let p = DVec2::new(-11.0, 3.0);

        let left = ((a * b) * c).apply(p);
        let right = (a * (b * c)).apply(p);
        assert!((left - right).length() < 1e-9);
    }

    #[test]
    fn test_matrix_round_trip() {
        let t = Transform::new(5.5, -2.25, 123.0, 0.75, 0.4);
        let back = Transform::from_matrix(t.matrix(), t.response());
        assert_params(&back, 5.5, -2.25, 123.0, 0.75);
        assert_eq!(back.response(), 0.4);
    }

    #[test]
    fn test_from_matrix_normalizes_rotation() {
        let t = Transform::new(0.0, 0.0, 270.0, 1.0, 1.0);
        let back = Transform::from_matrix(t.matrix(), 1.0);
        assert!((back.rotation() + 90.0).abs() < EPSILON);
    }

    #[test]
    fn test_serde_plain_fields() {
        let t = Transform::new(1.5, -2.0, 15.0, 1.2, 0.8);
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "x": 1.5,
                "y": -2.0,
                "rotation": 15.0,
                "scale": 1.2,
                "response": 0.8,
            })
        );

        let back: Transform = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_display() {
        let t = Transform::new(1.0, -2.5, 15.0, 1.2, 0.875);
        assert_eq!(
            t.to_string(),
            "Transform(x=1.00, y=-2.50, rot=15.000°, scale=1.2000, response=0.875)"
        );
    }

    #[test]
    #[should_panic(expected = "Scale must be positive and finite")]
    fn test_rejects_zero_scale() {
        let _ = Transform::new(0.0, 0.0, 0.0, 0.0, 1.0);
    }
}
