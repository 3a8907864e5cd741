use std::ops::Mul;

/// Two-dimensional vector with `y` pointing up.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians.
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    /// Z component of the 3D cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn test_scale() {
        let v = Vec2::new(1.0, -2.0) * 2.0;
        assert_eq!(v, Vec2::new(2.0, -4.0));
    }

    #[test]
    fn test_cross() {
        let a = Vec2::new(3.0, -2.0);
        let b = Vec2::new(1.0, 2.0);
        assert_eq!(a.cross(b), 8.0);
        assert_eq!(b.cross(a), -8.0);
    }

    #[test]
    fn test_from_angle() {
        let v = Vec2::from_angle(0.0);
        assert!((v.x - 1.0).abs() < 1e-12 && v.y.abs() < 1e-12);
        let v = Vec2::from_angle(FRAC_PI_2);
        assert!(v.x.abs() < 1e-12 && (v.y - 1.0).abs() < 1e-12);
    }
}
