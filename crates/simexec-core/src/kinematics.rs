//! Minimal vector and kinematic-state types.
//!
//! Positions are in a flat local tangent frame (metres, x north, y east,
//! z down). Orientation is Euler angles `[roll, pitch, yaw]` in radians.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Three-component vector.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec3(pub [f64; 3]);

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Vec3 = Vec3([0.0; 3]);

    /// Construct from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// X component.
    pub fn x(&self) -> f64 {
        self.0[0]
    }

    /// Y component.
    pub fn y(&self) -> f64 {
        self.0[1]
    }

    /// Z component.
    pub fn z(&self) -> f64 {
        self.0[2]
    }

    /// Dot product.
    pub fn dot(&self, rhs: &Vec3) -> f64 {
        self.0[0] * rhs.0[0] + self.0[1] * rhs.0[1] + self.0[2] * rhs.0[2]
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3([self.0[0] - rhs.0[0], self.0[1] - rhs.0[1], self.0[2] - rhs.0[2]])
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3([-self.0[0], -self.0[1], -self.0[2]])
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f64) -> Vec3 {
        Vec3([self.0[0] * s, self.0[1] * s, self.0[2] * s])
    }
}

/// Position, velocity, acceleration, orientation and angular velocity of
/// a player.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Kinematics {
    /// Position (m).
    pub position: Vec3,
    /// Velocity (m/s).
    pub velocity: Vec3,
    /// Acceleration (m/s²).
    pub acceleration: Vec3,
    /// Euler angles `[roll, pitch, yaw]` (rad).
    pub euler: Vec3,
    /// Body angular rates (rad/s).
    pub angular_velocity: Vec3,
}

impl Kinematics {
    /// Stationary state at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Constant-acceleration integration over `dt` seconds.
    pub fn integrate(&mut self, dt: f64) {
        self.position += self.velocity * dt + self.acceleration * (0.5 * dt * dt);
        self.velocity += self.acceleration * dt;
        self.euler += self.angular_velocity * dt;
    }
}

/// Rotate a body-frame vector into the world frame using Euler angles
/// (3-2-1 yaw, pitch, roll sequence).
pub fn body_to_world(euler: &Vec3, v: &Vec3) -> Vec3 {
    let (sr, cr) = euler.0[0].sin_cos();
    let (sp, cp) = euler.0[1].sin_cos();
    let (sy, cy) = euler.0[2].sin_cos();
    let [x, y, z] = v.0;
    Vec3([
        cp * cy * x + (sr * sp * cy - cr * sy) * y + (cr * sp * cy + sr * sy) * z,
        cp * sy * x + (sr * sp * sy + cr * cy) * y + (cr * sp * sy - sr * cy) * z,
        -sp * x + sr * cp * y + cr * cp * z,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrate_constant_acceleration() {
        let mut k = Kinematics {
            velocity: Vec3::new(10.0, 0.0, 0.0),
            acceleration: Vec3::new(2.0, 0.0, 0.0),
            ..Kinematics::default()
        };
        k.integrate(1.0);
        assert!((k.position.x() - 11.0).abs() < 1e-12);
        assert!((k.velocity.x() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn body_to_world_yaw_90() {
        let euler = Vec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let w = body_to_world(&euler, &Vec3::new(1.0, 0.0, 0.0));
        assert!(w.x().abs() < 1e-12);
        assert!((w.y() - 1.0).abs() < 1e-12);
    }
}
