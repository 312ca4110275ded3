//! Keyboard and mouse input.
//!
//! Samples `ButtonInput<KeyCode>` and accumulated mouse motion into the
//! [`LocomotionInput`] of entities marked [`LocalPlayer`], through a
//! rebindable [`KeyBindings`] table. Add [`KeyboardMouseInputPlugin`] for a
//! local player; other input sources write `LocomotionInput` directly.

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;

use crate::intent::LocomotionInput;
use crate::look::apply_look;

/// Logical actions the controller reads.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocomotionAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Run,
    Jump,
}

impl LocomotionAction {
    pub const ALL: [Self; 6] = [
        Self::MoveForward,
        Self::MoveBackward,
        Self::MoveLeft,
        Self::MoveRight,
        Self::Run,
        Self::Jump,
    ];
}

/// Which of an action's two keys to change.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BindingSlot {
    Primary,
    Secondary,
}

/// Keys bound to one action.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionBinding {
    pub primary: Option<KeyCode>,
    pub secondary: Option<KeyCode>,
}

impl ActionBinding {
    pub fn new(primary: KeyCode) -> Self {
        Self {
            primary: Some(primary),
            secondary: None,
        }
    }

    fn slot_mut(&mut self, slot: BindingSlot) -> &mut Option<KeyCode> {
        match slot {
            BindingSlot::Primary => &mut self.primary,
            BindingSlot::Secondary => &mut self.secondary,
        }
    }

    /// Whether either key is bound to `key`.
    pub fn uses(&self, key: KeyCode) -> bool {
        self.primary == Some(key) || self.secondary == Some(key)
    }

    /// Whether either bound key is held.
    pub fn pressed(&self, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.primary.is_some_and(|k| keyboard.pressed(k))
            || self.secondary.is_some_and(|k| keyboard.pressed(k))
    }
}

/// Key bindings for the locomotion actions.
#[derive(Resource, Reflect, Debug, Clone, PartialEq)]
#[reflect(Resource)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KeyBindings {
    pub move_forward: ActionBinding,
    pub move_backward: ActionBinding,
    pub move_left: ActionBinding,
    pub move_right: ActionBinding,
    pub run: ActionBinding,
    pub jump: ActionBinding,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_forward: ActionBinding::new(KeyCode::KeyW),
            move_backward: ActionBinding::new(KeyCode::KeyS),
            move_left: ActionBinding::new(KeyCode::KeyA),
            move_right: ActionBinding::new(KeyCode::KeyD),
            run: ActionBinding::new(KeyCode::ShiftLeft),
            jump: ActionBinding::new(KeyCode::Space),
        }
    }
}

impl KeyBindings {
    pub fn binding(&self, action: LocomotionAction) -> &ActionBinding {
        match action {
            LocomotionAction::MoveForward => &self.move_forward,
            LocomotionAction::MoveBackward => &self.move_backward,
            LocomotionAction::MoveLeft => &self.move_left,
            LocomotionAction::MoveRight => &self.move_right,
            LocomotionAction::Run => &self.run,
            LocomotionAction::Jump => &self.jump,
        }
    }

    fn binding_mut(&mut self, action: LocomotionAction) -> &mut ActionBinding {
        match action {
            LocomotionAction::MoveForward => &mut self.move_forward,
            LocomotionAction::MoveBackward => &mut self.move_backward,
            LocomotionAction::MoveLeft => &mut self.move_left,
            LocomotionAction::MoveRight => &mut self.move_right,
            LocomotionAction::Run => &mut self.run,
            LocomotionAction::Jump => &mut self.jump,
        }
    }

    /// Which action, if any, a key is bound to.
    pub fn action_for(&self, key: KeyCode) -> Option<LocomotionAction> {
        LocomotionAction::ALL
            .into_iter()
            .find(|&action| self.binding(action).uses(key))
    }

    /// Bind `key` to one slot of `action`, or clear the slot with `None`.
    ///
    /// A key can only drive one action: if another action already uses it,
    /// that binding is cleared and the action is returned.
    pub fn rebind(
        &mut self,
        action: LocomotionAction,
        slot: BindingSlot,
        key: Option<KeyCode>,
    ) -> Option<LocomotionAction> {
        if key.is_some() && *self.binding_mut(action).slot_mut(slot) == key {
            return None;
        }

        let moved_from = key.and_then(|key| {
            let other = LocomotionAction::ALL
                .into_iter()
                .filter(|&a| a != action)
                .find(|&a| self.binding(a).uses(key))?;
            let binding = self.binding_mut(other);
            if binding.primary == Some(key) {
                binding.primary = None;
            } else {
                binding.secondary = None;
            }
            Some(other)
        });

        *self.binding_mut(action).slot_mut(slot) = key;

        if let (Some(from), Some(key)) = (moved_from, key) {
            debug!("rebound {key:?} from {from:?} to {action:?}");
        }
        moved_from
    }

    /// Whether an action's key is held.
    pub fn pressed(&self, action: LocomotionAction, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.binding(action).pressed(keyboard)
    }

    /// `+1`, `-1` or `0` from a pair of opposing actions. Both held cancel.
    pub fn axis(
        &self,
        positive: LocomotionAction,
        negative: LocomotionAction,
        keyboard: &ButtonInput<KeyCode>,
    ) -> f32 {
        match (self.pressed(positive, keyboard), self.pressed(negative, keyboard)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

/// Marker for the entity driven by the local keyboard and mouse.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LocalPlayer;

/// Plugin that feeds keyboard and mouse into [`LocalPlayer`] entities.
///
/// Expects Bevy's `InputPlugin` (part of `DefaultPlugins`) to be present.
pub struct KeyboardMouseInputPlugin;

impl Plugin for KeyboardMouseInputPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<KeyBindings>();
        app.register_type::<LocalPlayer>();
        app.init_resource::<KeyBindings>();

        app.add_systems(Update, sample_keyboard_mouse.before(apply_look));
    }
}

/// Copy the current keyboard and mouse state into the local player's input.
pub fn sample_keyboard_mouse(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    bindings: Res<KeyBindings>,
    mut q_players: Query<&mut LocomotionInput, With<LocalPlayer>>,
) {
    use LocomotionAction::*;

    let axis = Vec2::new(
        bindings.axis(MoveRight, MoveLeft, &keyboard),
        bindings.axis(MoveForward, MoveBackward, &keyboard),
    );
    let run = bindings.pressed(Run, &keyboard);
    let jump = bindings.pressed(Jump, &keyboard);

    for mut input in &mut q_players {
        input.set_move_axis(axis);
        input.set_run_held(run);
        input.set_jump_held(jump);
        input.add_look_delta(mouse_motion.delta);
    }
}
