use bevy::input::gamepad::{GamepadConnection, GamepadEvent};
use bevy::input::mouse::{MouseMotion, MouseWheel};
use std::time::Duration;

use bevy::prelude::*;
use bevy_egui::EguiContexts;
use thiserror::Error;

use crate::dispatch::ClosePanel;
use crate::loading::RestartEvent;
use crate::ui::{SessionSettings, Toasts};
use crate::{AppState, FrameSet, MainCamera};

#[derive(Resource, Clone, Debug)]
pub struct Keybinds {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub jump: KeyCode,
    pub interact: KeyCode,
    pub close: KeyCode,
    pub controls: KeyCode,
    pub mute: KeyCode,
    pub restart: KeyCode,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            jump: KeyCode::Space,
            interact: KeyCode::KeyE,
            close: KeyCode::Escape,
            controls: KeyCode::KeyH,
            mute: KeyCode::KeyM,
            restart: KeyCode::KeyR,
        }
    }
}

/// Rebindable avatar actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    Interact,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Forward,
        Action::Backward,
        Action::Left,
        Action::Right,
        Action::Jump,
        Action::Interact,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Action::Forward => "Forward",
            Action::Backward => "Backward",
            Action::Left => "Left",
            Action::Right => "Right",
            Action::Jump => "Jump",
            Action::Interact => "Interact",
        }
    }
}

impl Keybinds {
    pub fn get(&self, action: Action) -> KeyCode {
        match action {
            Action::Forward => self.forward,
            Action::Backward => self.backward,
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Jump => self.jump,
            Action::Interact => self.interact,
        }
    }

    fn set(&mut self, action: Action, key: KeyCode) {
        let slot = match action {
            Action::Forward => &mut self.forward,
            Action::Backward => &mut self.backward,
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            Action::Jump => &mut self.jump,
            Action::Interact => &mut self.interact,
        };
        *slot = key;
    }

    /// Name of whatever already listens to `key`, ignoring `action` itself.
    fn owner_of(&self, key: KeyCode, action: Action) -> Option<&'static str> {
        let reserved = [
            (self.close, "Close panel"),
            (self.controls, "Controls"),
            (self.mute, "Mute"),
            (self.restart, "Restart"),
        ];
        let actions = Action::ALL
            .into_iter()
            .filter(|a| *a != action)
            .map(|a| (self.get(a), a.label()));
        reserved
            .into_iter()
            .chain(actions)
            .find(|(bound, _)| *bound == key)
            .map(|(_, owner)| owner)
    }

    pub fn try_set(&mut self, action: Action, key: KeyCode) -> Result<(), RebindError> {
        if let Some(owner) = self.owner_of(key, action) {
            return Err(RebindError::InUse(owner));
        }
        self.set(action, key);
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RebindError {
    #[error("already used for {0}")]
    InUse(&'static str),
}

/// Action waiting for its new key, armed from the controls window.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRebind(pub Option<Action>);

/// Short on-screen name: `KeyE` shows as "E", `Digit1` as "1".
pub fn key_label(key: KeyCode) -> String {
    match key {
        KeyCode::Space => "Space".into(),
        KeyCode::Escape => "Esc".into(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::ArrowUp => "Up".into(),
        KeyCode::ArrowDown => "Down".into(),
        KeyCode::ArrowLeft => "Left".into(),
        KeyCode::ArrowRight => "Right".into(),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => "Shift".into(),
        KeyCode::ControlLeft | KeyCode::ControlRight => "Ctrl".into(),
        KeyCode::AltLeft | KeyCode::AltRight => "Alt".into(),
        other => {
            let name = format!("{other:?}");
            name.strip_prefix("Key")
                .or_else(|| name.strip_prefix("Digit"))
                .unwrap_or(name.as_str())
                .to_string()
        }
    }
}

/// Per-frame snapshot of the avatar's controls.
///
/// Directional and jump flags mirror the held keys. `interact` is latched on
/// the key-down edge and stays set while the key is held, until the avatar
/// consumes it or the key is released.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub interact: bool,
}

impl InputState {
    pub fn sample(&mut self, keys: &ButtonInput<KeyCode>, binds: &Keybinds) {
        self.forward = keys.pressed(binds.forward);
        self.backward = keys.pressed(binds.backward);
        self.left = keys.pressed(binds.left);
        self.right = keys.pressed(binds.right);
        self.jump = keys.pressed(binds.jump);

        if keys.just_pressed(binds.interact) {
            self.interact = true;
        } else if !keys.pressed(binds.interact) {
            self.interact = false;
        }
    }

    /// Unit movement direction on the ground plane, or zero.
    pub fn direction(&self) -> Vec3 {
        let mut dir = Vec3::ZERO;
        if self.forward {
            dir.z -= 1.0;
        }
        if self.backward {
            dir.z += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir.normalize_or_zero()
    }
}

#[derive(Resource)]
pub struct ActiveGamepad(pub Gamepad);

#[derive(Resource, Clone, Debug)]
pub struct CameraSettings {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    /// Radians per pixel of mouse drag.
    pub rotate_speed: f32,
    /// Fraction of the distance removed per wheel notch.
    pub zoom_step: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            min_distance: 5.0,
            max_distance: 20.0,
            min_polar: 0.05,
            max_polar: std::f32::consts::FRAC_PI_2 - 0.1,
            rotate_speed: 0.005,
            zoom_step: 0.1,
        }
    }
}

/// Camera orbiting a fixed target. `polar` is measured down from +Y.
#[derive(Component, Clone, Copy, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub polar: f32,
    pub distance: f32,
}

impl OrbitCamera {
    pub fn looking_from(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(f32::EPSILON);
        Self {
            target,
            yaw: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
            distance,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_y, cos_y) = self.yaw.sin_cos();
        self.target + self.distance * Vec3::new(sin_p * sin_y, cos_p, sin_p * cos_y)
    }

    pub fn rotate(&mut self, delta: Vec2, settings: &CameraSettings) {
        self.yaw -= delta.x * settings.rotate_speed;
        self.polar = (self.polar - delta.y * settings.rotate_speed)
            .clamp(settings.min_polar, settings.max_polar);
    }

    pub fn zoom(&mut self, notches: f32, settings: &CameraSettings) {
        self.distance = (self.distance * (1.0 - notches * settings.zoom_step))
            .clamp(settings.min_distance, settings.max_distance);
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }
}

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Keybinds>()
            .init_resource::<PendingRebind>()
            .init_resource::<InputState>()
            .init_resource::<CameraSettings>()
            .add_systems(Update, (gamepad_connections, camera_controls))
            .add_systems(
                Update,
                (
                    capture_rebind,
                    (
                        capture_input,
                        close_trigger,
                        controls_toggle,
                        mute_toggle,
                        restart_trigger,
                    ),
                )
                    .chain()
                    .in_set(FrameSet::Input)
                    .run_if(in_state(AppState::Exploring)),
            );
    }
}

/// Hands the next key press to a pending rebind. The press is consumed, so
/// the triggers below never see it.
fn capture_rebind(
    mut pending: ResMut<PendingRebind>,
    mut keys: ResMut<ButtonInput<KeyCode>>,
    mut keybinds: ResMut<Keybinds>,
    mut toasts: ResMut<Toasts>,
) {
    let Some(action) = pending.0 else {
        return;
    };
    let Some(key) = keys.get_just_pressed().next().copied() else {
        return;
    };
    keys.clear_just_pressed(key);
    pending.0 = None;

    if key == keybinds.close {
        debug!("rebind of {} cancelled", action.label());
        return;
    }
    match keybinds.try_set(action, key) {
        Ok(()) => info!("rebound {} to {}", action.label(), key_label(key)),
        Err(err) => {
            warn!("cannot bind {} to {key:?}: {err}", action.label());
            toasts.push(
                format!("{} is {err}", key_label(key)),
                None,
                Duration::from_secs(3),
            );
        }
    }
}

fn capture_input(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    mut input: ResMut<InputState>,
) {
    input.sample(&keys, &keybinds);
}

fn camera_controls(
    mut scroll_evr: EventReader<MouseWheel>,
    mut motion: EventReader<MouseMotion>,
    buttons: Res<ButtonInput<MouseButton>>,
    settings: Res<CameraSettings>,
    mut contexts: EguiContexts,
    mut q_cam: Query<(&mut OrbitCamera, &mut Transform), With<MainCamera>>,
) {
    // Drags and scrolls over egui panels belong to egui.
    if contexts.ctx_mut().wants_pointer_input() {
        scroll_evr.clear();
        motion.clear();
        return;
    }

    let Ok((mut orbit, mut transform)) = q_cam.get_single_mut() else {
        return;
    };

    let notches: f32 = scroll_evr.read().map(|ev| ev.y).sum();
    if notches != 0.0 {
        orbit.zoom(notches, &settings);
    }

    let drag: Vec2 = motion.read().map(|m| m.delta).sum();
    if buttons.pressed(MouseButton::Left) && drag != Vec2::ZERO {
        orbit.rotate(drag, &settings);
    }

    if orbit.is_changed() {
        *transform = orbit.transform();
    }
}

fn close_trigger(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    mut ev_close: EventWriter<ClosePanel>,
) {
    if keys.just_pressed(keybinds.close) {
        ev_close.send(ClosePanel);
    }
}

fn controls_toggle(
    mut session: ResMut<SessionSettings>,
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
) {
    if keys.just_pressed(keybinds.controls) {
        session.show_controls = !session.show_controls;
    }
}

fn mute_toggle(
    mut session: ResMut<SessionSettings>,
    mut toasts: ResMut<Toasts>,
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
) {
    if keys.just_pressed(keybinds.mute) {
        session.toggle_mute(&mut toasts);
    }
}

fn restart_trigger(
    mut ev_restart: EventWriter<RestartEvent>,
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
) {
    if keys.just_pressed(keybinds.restart) {
        ev_restart.send(RestartEvent);
    }
}

fn gamepad_connections(
    mut commands: Commands,
    active: Option<Res<ActiveGamepad>>,
    mut evr_gamepad: EventReader<GamepadEvent>,
) {
    for ev in evr_gamepad.read() {
        // only connection changes matter here
        let GamepadEvent::Connection(ev_conn) = ev else {
            continue;
        };
        match &ev_conn.connection {
            GamepadConnection::Connected(info) => {
                debug!(
                    "gamepad connected: {:?}, name: {}",
                    ev_conn.gamepad, info.name,
                );
                // the first pad to show up gets the haptic pulses
                if active.is_none() {
                    commands.insert_resource(ActiveGamepad(ev_conn.gamepad));
                }
            }
            GamepadConnection::Disconnected => {
                debug!("gamepad disconnected: {:?}", ev_conn.gamepad);
                // stop pulsing a pad that is gone; a later connection takes over
                if let Some(ActiveGamepad(old)) = active.as_deref() {
                    if *old == ev_conn.gamepad {
                        commands.remove_resource::<ActiveGamepad>();
                    }
                }
            }
        }
    }
}
