//! Ground and wall classification.
//!
//! These structures turn raw probe results into the states the integrator
//! branches on. Both are recomputed from scratch every tick.

use bevy::prelude::*;

use crate::probe::{GroundQuery, ProbeHit};

/// Tolerance (degrees) on slope comparisons, so a surface exactly at the
/// limit is not pushed over it by `acos` rounding.
pub const SLOPE_EPSILON_DEGREES: f32 = 1e-3;

/// Ground support state of the actor.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundState {
    /// Standing on walkable ground.
    Grounded,
    /// No ground contact.
    #[default]
    Airborne,
    /// Touching ground too steep to stand on.
    OnSteepSlope,
}

/// Ground classification for one tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct GroundInfo {
    pub state: GroundState,
    /// Usable ground normal. `Vec3::Y` when none was recovered.
    pub normal: Vec3,
    /// Angle between the normal and up, in degrees.
    pub slope_angle_degrees: f32,
    /// Whether the slope is shallow enough to cancel sliding entirely.
    pub within_no_slide: bool,
}

impl Default for GroundInfo {
    fn default() -> Self {
        Self::airborne()
    }
}

impl GroundInfo {
    /// No ground contact.
    pub fn airborne() -> Self {
        Self {
            state: GroundState::Airborne,
            normal: Vec3::Y,
            slope_angle_degrees: 0.0,
            within_no_slide: false,
        }
    }

    /// Check if the actor stands on walkable ground.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.state == GroundState::Grounded
    }

    /// Check if the actor is touching ground too steep to stand on.
    #[inline]
    pub fn is_on_steep_slope(&self) -> bool {
        self.state == GroundState::OnSteepSlope
    }

    /// Check if the actor has no ground contact at all.
    #[inline]
    pub fn is_airborne(&self) -> bool {
        self.state == GroundState::Airborne
    }
}

/// Classify a ground query.
///
/// `ignore_ground` forces an airborne result, used right after a jump launch.
/// A contact without a usable normal counts as flat ground.
pub fn classify(
    query: &GroundQuery,
    max_slope_angle: f32,
    no_slide_angle: f32,
    ignore_ground: bool,
) -> GroundInfo {
    if ignore_ground || !query.hit {
        return GroundInfo::airborne();
    }

    let normal = query.normal.and_then(|n| n.try_normalize()).unwrap_or(Vec3::Y);
    let slope_angle_degrees = slope_angle_degrees(normal);

    let state = if slope_angle_degrees > max_slope_angle + SLOPE_EPSILON_DEGREES {
        GroundState::OnSteepSlope
    } else {
        GroundState::Grounded
    };

    GroundInfo {
        state,
        normal,
        slope_angle_degrees,
        within_no_slide: slope_angle_degrees <= no_slide_angle + SLOPE_EPSILON_DEGREES,
    }
}

/// Angle between a unit normal and world up, in degrees.
#[inline]
pub fn slope_angle_degrees(normal: Vec3) -> f32 {
    normal.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Wall detection for one tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct WallInfo {
    /// Whether a wall lies in the wish direction.
    pub near: bool,
    /// Normal of the wall surface. Zero when `near` is false.
    pub normal: Vec3,
}

impl WallInfo {
    pub fn new(normal: Vec3) -> Self {
        Self { near: true, normal }
    }

    /// Wall normal, if a wall was detected.
    pub fn wall_normal(&self) -> Option<Vec3> {
        self.near.then_some(self.normal)
    }
}

/// Classify a wall sweep hit. Only surfaces steeper than the walkable limit
/// count as walls.
pub fn classify_wall(hit: Option<&ProbeHit>, max_slope_angle: f32) -> WallInfo {
    hit.and_then(ProbeHit::usable_normal)
        .filter(|&n| slope_angle_degrees(n) > max_slope_angle + SLOPE_EPSILON_DEGREES)
        .map(WallInfo::new)
        .unwrap_or_default()
}
