//! State marker components.
//!
//! These components indicate the current support state of a locomotion
//! controller. They are added and removed by the state sync system from the
//! controller's classification results, so gameplay code can filter on them
//! in queries.

use bevy::prelude::*;

/// Marker component indicating the actor stands on walkable ground.
///
/// Mutually exclusive with [`Airborne`] and [`OnSteepSlope`].
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use fps_locomotion::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the actor has no ground contact.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the actor touches ground too steep to stand on.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct OnSteepSlope {
    /// Slope angle in degrees.
    pub angle_degrees: f32,
}

/// Marker component indicating a wall lies in the movement direction.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct TouchingWall {
    /// Normal of the wall surface.
    pub normal: Vec3,
}

impl Default for TouchingWall {
    fn default() -> Self {
        Self { normal: Vec3::Z }
    }
}

impl TouchingWall {
    pub fn new(normal: Vec3) -> Self {
        Self { normal }
    }

    /// How directly `direction` (normalized, horizontal) drives into the wall.
    /// `1.0` is head-on, `0.0` or less is parallel or away.
    pub fn facing(&self, direction: Vec3) -> f32 {
        direction.dot(-self.normal).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_wall_new() {
        let wall = TouchingWall::new(Vec3::X);
        assert_eq!(wall.normal, Vec3::X);
    }

    #[test]
    fn touching_wall_facing_head_on() {
        let wall = TouchingWall::new(Vec3::X);
        assert_eq!(wall.facing(Vec3::NEG_X), 1.0);
    }

    #[test]
    fn touching_wall_facing_away() {
        let wall = TouchingWall::new(Vec3::X);
        assert_eq!(wall.facing(Vec3::X), 0.0);
        assert_eq!(wall.facing(Vec3::Z), 0.0);
    }

    #[test]
    fn steep_slope_carries_angle() {
        let steep = OnSteepSlope { angle_degrees: 60.0 };
        assert_eq!(steep.angle_degrees, 60.0);
    }
}
