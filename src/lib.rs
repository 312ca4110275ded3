//! # `fps_locomotion`
//!
//! A first-person locomotion controller for Bevy with physics backend abstraction.
//!
//! This crate provides a responsive, tuneable capsule controller that:
//! - Detects ground with an overlap test and recovers the slope from a sphere sweep
//! - Classifies ground as walkable, steep or absent, and cancels sliding on shallow slopes
//! - Honors jumps with coyote time and input buffering
//! - Gates sprinting behind a stamina pool with exhaustion lockout
//! - Stops head-on into walls and slides along them otherwise
//! - Publishes jump, landing and footstep events for audio and UI
//! - Abstracts the physics backend (Rapier3D and a static half-space world included)
//!
//! ## Architecture
//!
//! Every fixed tick runs the same pipeline:
//! 1. The backend's sensor system probes the collision world into [`SensorReadings`]
//! 2. The classifier turns the readings into ground and wall state
//! 3. The jump window decides whether to launch, the stamina gate whether to sprint
//! 4. The integrator computes the new velocity and position from the wish direction
//! 5. Events and facts are diffed from the previous tick
//! 6. The backend receives the velocity, launch nudge, damping and friction
//!
//! Steps 2 to 5 are plain Rust over [`Locomotion`] and [`BodyState`]; the Bevy
//! systems only move data in and out.
//!
//! [`SensorReadings`]: probe::SensorReadings
//! [`Locomotion`]: controller::Locomotion
//! [`BodyState`]: integrator::BodyState
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use fps_locomotion::prelude::*;
//!
//! // Create controller components for a player
//! let config = LocomotionConfig::player().with_jump(1.2, 0.3);
//! let bundle = LocomotionBundle::new(config);
//! assert_eq!(bundle.locomotion.stamina.current, 100.0);
//!
//! // These can be spawned together with a backend's physics components
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod config;
pub mod controller;
pub mod detection;
pub mod events;
pub mod input;
pub mod integrator;
pub mod intent;
pub mod jump;
pub mod look;
pub mod probe;
pub mod stamina;
pub mod state;
pub mod static_world;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::LocomotionBackend;
    pub use crate::config::{CapsuleShape, ConfigError, LocomotionConfig, SprintMode};
    pub use crate::controller::{Locomotion, LocomotionBundle};
    pub use crate::detection::{GroundInfo, GroundState, WallInfo};
    pub use crate::events::{Footstep, Jumped, LandedHard, LocomotionFacts};
    pub use crate::input::{
        BindingSlot, KeyBindings, KeyboardMouseInputPlugin, LocalPlayer, LocomotionAction,
    };
    pub use crate::integrator::BodyState;
    pub use crate::intent::LocomotionInput;
    pub use crate::jump::JumpPhysics;
    pub use crate::look::LookSettings;
    pub use crate::probe::{GeometryProbe, SensorReadings};
    pub use crate::stamina::StaminaPhase;
    pub use crate::state::{Airborne, Grounded, OnSteepSlope, TouchingWall};
    pub use crate::static_world::{StaticBody, StaticPlane, StaticWorld, StaticWorldBackend};
    pub use crate::{LocomotionPlugin, LocomotionSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// System sets for the locomotion pipeline, run chained in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Config maintenance and pulling body state from the backend.
    Preparation,
    /// Backend collision queries.
    Sensors,
    /// The per-tick controller pipeline and event emission.
    Locomotion,
    /// State marker components.
    StateSync,
    /// Pushing the result back to the backend.
    FinalApplication,
}

/// Main plugin for the locomotion controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (collision queries, velocity application, etc.).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use fps_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(LocomotionPlugin::<Rapier3dBackend>::default())
///     .add_plugins(KeyboardMouseInputPlugin)
///     .run();
/// ```
pub struct LocomotionPlugin<B: backend::LocomotionBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionBackend> Default for LocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionBackend> Plugin for LocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<controller::Locomotion>();
        app.register_type::<integrator::BodyState>();
        app.register_type::<intent::LocomotionInput>();
        app.register_type::<probe::SensorReadings>();
        app.register_type::<events::LocomotionFacts>();
        app.register_type::<look::LookSettings>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::OnSteepSlope>();
        app.register_type::<state::TouchingWall>();

        app.add_event::<events::Jumped>();
        app.add_event::<events::LandedHard>();
        app.add_event::<events::Footstep>();

        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Preparation,
                LocomotionSet::Sensors,
                LocomotionSet::Locomotion,
                LocomotionSet::StateSync,
                LocomotionSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::sanitize_changed_configs,
                systems::sync_body_from_backend::<B>,
            )
                .chain()
                .in_set(LocomotionSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            systems::locomotion_tick.in_set(LocomotionSet::Locomotion),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(LocomotionSet::StateSync),
        );
        app.add_systems(
            FixedUpdate,
            systems::commit_body::<B>.in_set(LocomotionSet::FinalApplication),
        );

        // Look runs every frame; the fixed tick reads the facing it leaves behind.
        app.add_systems(Update, look::apply_look);
    }
}
