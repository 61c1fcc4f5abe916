//! Dead-reckoning extrapolation and output threshold checks.
//!
//! Algorithms follow the DIS numbering: the first letter says whether
//! orientation is fixed (F) or rotating (R), the second whether position
//! uses velocity only (P) or velocity and acceleration (V), and the third
//! whether rates are expressed in world (W) or body (B) coordinates.

use simexec_core::kinematics::body_to_world;
use simexec_core::{Kinematics, Vec3};

/// Dead-reckoning algorithm selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DrAlgorithm {
    /// Unspecified; treated as [`Static`](DrAlgorithm::Static).
    Other = 0,
    /// No motion.
    Static = 1,
    /// Fixed orientation, constant velocity, world frame.
    Fpw = 2,
    /// Rotating, constant velocity, world frame.
    Rpw = 3,
    /// Rotating, constant acceleration, world frame.
    #[default]
    Rvw = 4,
    /// Fixed orientation, constant acceleration, world frame.
    Fvw = 5,
    /// Fixed orientation, constant velocity, body frame.
    Fpb = 6,
    /// Rotating, constant velocity, body frame.
    Rpb = 7,
    /// Rotating, constant acceleration, body frame.
    Rvb = 8,
    /// Fixed orientation, constant acceleration, body frame.
    Fvb = 9,
}

impl DrAlgorithm {
    /// Decode a wire value. Unknown values map to [`Other`](DrAlgorithm::Other).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Static,
            2 => Self::Fpw,
            3 => Self::Rpw,
            4 => Self::Rvw,
            5 => Self::Fvw,
            6 => Self::Fpb,
            7 => Self::Rpb,
            8 => Self::Rvb,
            9 => Self::Fvb,
            _ => Self::Other,
        }
    }

    /// Whether orientation is extrapolated from angular velocity.
    pub fn rotates(self) -> bool {
        matches!(self, Self::Rpw | Self::Rvw | Self::Rpb | Self::Rvb)
    }

    /// Whether position uses acceleration.
    pub fn uses_acceleration(self) -> bool {
        matches!(self, Self::Rvw | Self::Fvw | Self::Rvb | Self::Fvb)
    }

    /// Whether rates are in body coordinates.
    pub fn is_body_frame(self) -> bool {
        matches!(self, Self::Fpb | Self::Rpb | Self::Rvb | Self::Fvb)
    }

    /// Whether the entity is extrapolated at all.
    pub fn is_static(self) -> bool {
        matches!(self, Self::Other | Self::Static)
    }
}

/// Extrapolate `from` forward by `dt` seconds. The result is in world
/// coordinates regardless of the algorithm's frame.
pub fn extrapolate(from: &Kinematics, algorithm: DrAlgorithm, dt: f64) -> Kinematics {
    if algorithm.is_static() || !dt.is_finite() || dt <= 0.0 {
        return *from;
    }
    let (velocity, acceleration) = if algorithm.is_body_frame() {
        (
            body_to_world(&from.euler, &from.velocity),
            body_to_world(&from.euler, &from.acceleration),
        )
    } else {
        (from.velocity, from.acceleration)
    };
    let acceleration = if algorithm.uses_acceleration() {
        acceleration
    } else {
        Vec3::ZERO
    };
    let mut out = Kinematics {
        position: from.position,
        velocity,
        acceleration,
        euler: from.euler,
        angular_velocity: from.angular_velocity,
    };
    out.position += velocity * dt + acceleration * (0.5 * dt * dt);
    out.velocity += acceleration * dt;
    if algorithm.rotates() {
        out.euler += from.angular_velocity * dt;
    }
    out
}

/// Output thresholds that trigger an entity-state update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrThresholds {
    /// Position error (m).
    pub max_position_error: f64,
    /// Orientation error (rad) on any axis.
    pub max_orientation_error: f64,
    /// Heartbeat: longest interval between updates (s).
    pub max_time: f64,
}

impl Default for DrThresholds {
    fn default() -> Self {
        Self {
            max_position_error: 3.0,
            max_orientation_error: 3f64.to_radians(),
            max_time: 5.0,
        }
    }
}

fn angle_error(a: f64, b: f64) -> f64 {
    let d = (a - b + std::f64::consts::PI).rem_euclid(std::f64::consts::TAU) - std::f64::consts::PI;
    d.abs()
}

/// Why an update is due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateReason {
    /// Extrapolated position drifted past the threshold.
    Position,
    /// Extrapolated orientation drifted past the threshold.
    Orientation,
    /// The heartbeat interval elapsed.
    Heartbeat,
}

/// Compare the remote view (extrapolated from the last sent state) with
/// the actual state.
pub fn update_reason(
    sent: &Kinematics,
    algorithm: DrAlgorithm,
    elapsed: f64,
    actual: &Kinematics,
    thresholds: &DrThresholds,
) -> Option<UpdateReason> {
    if elapsed >= thresholds.max_time {
        return Some(UpdateReason::Heartbeat);
    }
    let predicted = extrapolate(sent, algorithm, elapsed);
    if (predicted.position - actual.position).length() > thresholds.max_position_error {
        return Some(UpdateReason::Position);
    }
    let worst = (0..3)
        .map(|i| angle_error(predicted.euler.0[i], actual.euler.0[i]))
        .fold(0.0, f64::max);
    if worst > thresholds.max_orientation_error {
        return Some(UpdateReason::Orientation);
    }
    None
}
