use bevy::prelude::*;

use crate::dispatch::ZoneInteracted;
use crate::input::InputState;
use crate::scene::SceneEntity;
use crate::zones::{ZoneId, ZoneRegistry};
use crate::{AppState, FrameSet};

pub struct AvatarPlugin;
impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AvatarSettings>()
            .init_resource::<NearbyZone>()
            .add_systems(OnEnter(AppState::Exploring), spawn_avatar)
            .add_systems(OnExit(AppState::Exploring), |mut nearby: ResMut<NearbyZone>| {
                nearby.0 = None;
            })
            .add_systems(
                Update,
                (
                    step_avatar.in_set(FrameSet::Simulate),
                    update_nearby_indicator.in_set(FrameSet::Present),
                )
                    .run_if(in_state(AppState::Exploring)),
            );
    }
}

/// Movement tuning. Velocities are per-step displacements, so every rate
/// here is multiplied by the frame's `dt` before it is applied.
#[derive(Resource, Clone, Debug)]
pub struct AvatarSettings {
    pub speed: f32,
    pub jump_impulse: f32,
    pub gravity: f32,
    /// Highest point from which a jump may start.
    pub ground_epsilon: f32,
    /// Half extent of the square the avatar is confined to.
    pub boundary: f32,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            speed: 5.0,
            jump_impulse: 5.0,
            gravity: 15.0,
            ground_epsilon: 0.5,
            boundary: 9.0,
        }
    }
}

/// Zone the avatar currently stands in, if any.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearbyZone(pub Option<ZoneId>);

#[derive(Component, Debug, Clone, Default)]
pub struct AvatarState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub airborne: bool,
    /// Yaw in radians, 0 facing +Z.
    pub facing: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub nearby: Option<ZoneId>,
    pub interacted: Option<ZoneId>,
}

#[derive(Component)]
pub struct NearbyIndicator;

impl AvatarState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..default()
        }
    }

    pub fn step(
        &mut self,
        input: &mut InputState,
        dt: f32,
        settings: &AvatarSettings,
        zones: &ZoneRegistry,
    ) -> StepOutcome {
        let direction = input.direction();

        self.velocity.x = direction.x * settings.speed * dt;
        self.velocity.z = direction.z * settings.speed * dt;

        if input.jump && !self.airborne && self.position.y <= settings.ground_epsilon {
            self.velocity.y = settings.jump_impulse * dt;
            self.airborne = true;
        }

        if self.position.y > 0.0 {
            self.velocity.y -= settings.gravity * dt;
        } else if self.velocity.y <= 0.0 {
            // On or below the ground and not rising.
            self.position.y = 0.0;
            self.velocity.y = 0.0;
            self.airborne = false;
        }

        self.position += self.velocity;

        if direction != Vec3::ZERO {
            self.facing = direction.x.atan2(direction.z);
        }

        let b = settings.boundary;
        self.position.x = self.position.x.clamp(-b, b);
        self.position.z = self.position.z.clamp(-b, b);

        let nearby = zones.nearest_within(self.position).map(|z| z.id);
        let interacted = match nearby {
            Some(id) if input.interact => {
                input.interact = false;
                Some(id)
            }
            _ => None,
        };

        StepOutcome { nearby, interacted }
    }
}

fn spawn_avatar(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut input: ResMut<InputState>,
) {
    *input = InputState::default();

    let body = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x8b, 0x5c, 0xf6),
        perceptual_roughness: 0.2,
        metallic: 0.8,
        ..default()
    });
    let head = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0xa7, 0x8b, 0xfa),
        perceptual_roughness: 0.2,
        metallic: 0.5,
        ..default()
    });
    let glow = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        emissive: LinearRgba::WHITE * 4.0,
        unlit: true,
        ..default()
    });

    commands
        .spawn((
            SpatialBundle::default(),
            AvatarState::at(Vec3::ZERO),
            SceneEntity,
            Name::new("Avatar"),
        ))
        .with_children(|parent| {
            parent.spawn(PbrBundle {
                mesh: meshes.add(Capsule3d::new(0.3, 1.0)),
                material: body,
                transform: Transform::from_xyz(0.0, 0.75, 0.0),
                ..default()
            });
            parent.spawn(PbrBundle {
                mesh: meshes.add(Sphere::new(0.25)),
                material: head,
                transform: Transform::from_xyz(0.0, 1.5, 0.0),
                ..default()
            });
            parent
                .spawn((
                    PbrBundle {
                        mesh: meshes.add(Sphere::new(0.1)),
                        material: glow,
                        transform: Transform::from_xyz(0.0, 2.2, 0.0),
                        visibility: Visibility::Hidden,
                        ..default()
                    },
                    NearbyIndicator,
                ))
                .with_children(|light| {
                    light.spawn(PointLightBundle {
                        point_light: PointLight {
                            color: Color::WHITE,
                            intensity: 40_000.0,
                            range: 3.0,
                            ..default()
                        },
                        ..default()
                    });
                });
        });
}

fn step_avatar(
    time: Res<Time>,
    settings: Res<AvatarSettings>,
    zones: Res<ZoneRegistry>,
    mut input: ResMut<InputState>,
    mut nearby: ResMut<NearbyZone>,
    mut avatars: Query<(&mut AvatarState, &mut Transform)>,
    mut ev_interact: EventWriter<ZoneInteracted>,
) {
    let Ok((mut state, mut transform)) = avatars.get_single_mut() else {
        return;
    };

    let outcome = state.step(&mut input, time.delta_seconds(), &settings, &zones);

    transform.translation = state.position;
    transform.rotation = Quat::from_rotation_y(state.facing);

    if nearby.set_if_neq(NearbyZone(outcome.nearby)) {
        debug!("nearby zone: {:?}", outcome.nearby);
    }
    if let Some(zone) = outcome.interacted {
        ev_interact.send(ZoneInteracted { zone });
    }
}

fn update_nearby_indicator(
    nearby: Res<NearbyZone>,
    mut indicators: Query<&mut Visibility, With<NearbyIndicator>>,
) {
    if !nearby.is_changed() {
        return;
    }
    for mut visibility in &mut indicators {
        *visibility = if nearby.0.is_some() {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::Zone;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const DT: f32 = 1.0 / 60.0;

    fn zones() -> ZoneRegistry {
        ZoneRegistry::portfolio().unwrap()
    }

    fn horizontal(v: Vec3) -> Vec2 {
        Vec2::new(v.x, v.z)
    }

    fn step(state: &mut AvatarState, input: &mut InputState, dt: f32) -> StepOutcome {
        state.step(input, dt, &AvatarSettings::default(), &zones())
    }

    #[test]
    fn no_direction_keeps_horizontal_position() {
        let combos = [
            InputState::default(),
            InputState {
                jump: true,
                ..default()
            },
            InputState {
                interact: true,
                ..default()
            },
            InputState {
                jump: true,
                interact: true,
                ..default()
            },
        ];
        for mut input in combos {
            let mut state = AvatarState::at(Vec3::new(1.0, 0.0, -2.0));
            step(&mut state, &mut input, DT);
            assert_eq!(horizontal(state.position), Vec2::new(1.0, -2.0));
        }
    }

    #[test]
    fn diagonal_is_as_fast_as_straight() {
        let settings = AvatarSettings::default();
        let dt = 0.1;

        let mut straight = AvatarState::default();
        let mut input = InputState {
            forward: true,
            ..default()
        };
        step(&mut straight, &mut input, dt);

        let mut diagonal = AvatarState::default();
        let mut input = InputState {
            forward: true,
            right: true,
            ..default()
        };
        step(&mut diagonal, &mut input, dt);

        let expected = settings.speed * dt;
        assert!((horizontal(straight.position).length() - expected).abs() < 1e-5);
        assert!((horizontal(diagonal.position).length() - expected).abs() < 1e-5);
        assert!(diagonal.position.x > 0.0 && diagonal.position.z < 0.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut state = AvatarState::default();
        let mut input = InputState {
            forward: true,
            backward: true,
            ..default()
        };
        step(&mut state, &mut input, DT);
        assert_eq!(state.position, Vec3::ZERO);
    }

    #[test]
    fn facing_follows_movement() {
        let mut state = AvatarState::default();
        let mut input = InputState {
            right: true,
            ..default()
        };
        step(&mut state, &mut input, DT);
        assert!((state.facing - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        // Releasing keys keeps the last heading.
        let mut idle = InputState::default();
        step(&mut state, &mut idle, DT);
        assert!((state.facing - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let mut input = InputState {
            backward: true,
            ..default()
        };
        step(&mut state, &mut input, DT);
        assert!(state.facing.abs() < 1e-6);
    }

    #[test]
    fn jump_from_ground_then_lands() {
        let settings = AvatarSettings::default();
        let mut state = AvatarState::default();
        let mut input = InputState {
            jump: true,
            ..default()
        };

        step(&mut state, &mut input, DT);
        assert!(state.airborne);
        assert!(state.position.y > 0.0);

        // Held key: second step only applies gravity, no fresh impulse.
        step(&mut state, &mut input, DT);
        let expected = settings.jump_impulse * DT - settings.gravity * DT;
        assert!((state.velocity.y - expected).abs() < 1e-6);

        input.jump = false;
        for _ in 0..10 {
            step(&mut state, &mut input, DT);
        }
        assert!(!state.airborne);
        assert_eq!(state.position.y, 0.0);
        assert_eq!(state.velocity.y, 0.0);
    }

    #[test]
    fn jump_requires_ground_and_not_airborne() {
        let mut input = InputState {
            jump: true,
            ..default()
        };

        let mut high = AvatarState::at(Vec3::new(0.0, 0.6, 0.0));
        step(&mut high, &mut input, DT);
        assert!(!high.airborne);
        assert!(high.velocity.y < 0.0);

        let mut falling = AvatarState {
            position: Vec3::new(0.0, 0.2, 0.0),
            airborne: true,
            ..default()
        };
        step(&mut falling, &mut input, DT);
        assert!(falling.velocity.y < 0.0);
    }

    #[test]
    fn zero_dt_jump_does_not_stick_airborne() {
        let mut state = AvatarState::default();
        let mut input = InputState {
            jump: true,
            ..default()
        };
        step(&mut state, &mut input, 0.0);
        step(&mut state, &mut input, DT);
        assert!(state.airborne);
        assert!(state.position.y > 0.0);
    }

    #[test]
    fn boundary_holds_for_random_input() {
        let settings = AvatarSettings::default();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut state = AvatarState::default();
        let mut input = InputState::default();

        for _ in 0..5_000 {
            input.forward = rng.gen_bool(0.5);
            input.backward = rng.gen_bool(0.2);
            input.left = rng.gen_bool(0.3);
            input.right = rng.gen_bool(0.4);
            input.jump = rng.gen_bool(0.1);
            let dt = rng.gen_range(0.0..0.5);
            step(&mut state, &mut input, dt);
            assert!(state.position.x.abs() <= settings.boundary);
            assert!(state.position.z.abs() <= settings.boundary);
        }
    }

    #[test]
    fn walking_into_a_wall_stops_at_the_edge() {
        let mut state = AvatarState::at(Vec3::new(8.99, 0.0, 0.0));
        let mut input = InputState {
            right: true,
            ..default()
        };
        step(&mut state, &mut input, 1.0);
        assert_eq!(state.position.x, 9.0);
    }

    #[test]
    fn interact_fires_once_per_press() {
        let zones = ZoneRegistry::new([Zone::new(ZoneId::ABOUT, Vec3::new(6.0, 0.0, 6.0), 2.0)])
            .unwrap();
        let settings = AvatarSettings::default();

        let mut state = AvatarState::default();
        let idle = state.step(&mut InputState::default(), DT, &settings, &zones);
        assert_eq!(idle.nearby, None);

        state.position = Vec3::new(6.0, 0.0, 6.5);
        let mut input = InputState {
            interact: true,
            ..default()
        };

        let first = state.step(&mut input, DT, &settings, &zones);
        assert_eq!(first.nearby, Some(ZoneId::ABOUT));
        assert_eq!(first.interacted, Some(ZoneId::ABOUT));
        assert!(!input.interact);

        let second = state.step(&mut input, DT, &settings, &zones);
        assert_eq!(second.nearby, Some(ZoneId::ABOUT));
        assert_eq!(second.interacted, None);
    }

    #[test]
    fn interact_outside_zones_does_nothing() {
        let mut state = AvatarState::default();
        let mut input = InputState {
            interact: true,
            ..default()
        };
        for _ in 0..5 {
            let outcome = step(&mut state, &mut input, DT);
            assert_eq!(outcome, StepOutcome::default());
        }
        // Still pressed: fires once the avatar is inside a zone.
        state.position = Vec3::new(0.0, 0.0, -5.5);
        let outcome = step(&mut state, &mut input, DT);
        assert_eq!(outcome.interacted, Some(ZoneId::CONTACT));
        let outcome = step(&mut state, &mut input, DT);
        assert_eq!(outcome.interacted, None);
    }

    #[test]
    fn step_avatar_system_sends_one_event() {
        let mut app = App::new();
        app.add_event::<ZoneInteracted>()
            .init_resource::<Time>()
            .init_resource::<AvatarSettings>()
            .init_resource::<NearbyZone>()
            .insert_resource(zones())
            .insert_resource(InputState {
                interact: true,
                ..default()
            })
            .add_systems(Update, step_avatar);
        app.world_mut().spawn((
            AvatarState::at(Vec3::new(5.0, 0.0, 5.5)),
            Transform::default(),
        ));

        app.update();
        app.update();

        let events = app.world().resource::<Events<ZoneInteracted>>();
        let mut reader = events.get_reader();
        let sent: Vec<ZoneId> = reader.read(events).map(|e| e.zone).collect();
        assert_eq!(sent, vec![ZoneId::ABOUT]);
        assert_eq!(
            *app.world().resource::<NearbyZone>(),
            NearbyZone(Some(ZoneId::ABOUT))
        );
    }
}
