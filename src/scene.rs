use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use rand::Rng;

use crate::content::marker_for;
use crate::zones::{ZoneId, ZoneRegistry};
use crate::AppState;

const GROUND_SIZE: f32 = 20.0;
const GRID_DIVISIONS: usize = 20;
const DECORATION_COUNT: usize = 10;
const STAR_COUNT: usize = 800;

/// Everything spawned for one visit to the scene; despawned on restart.
#[derive(Component)]
pub struct SceneEntity;

#[derive(Component)]
struct GroundRoot;

#[derive(Component)]
pub struct ZoneMarker(pub ZoneId);

pub struct ScenePlugin;
impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::Exploring),
            (spawn_lights, spawn_ground, spawn_markers, spawn_stars),
        )
        .add_systems(OnExit(AppState::Exploring), despawn_scene)
        .add_systems(Update, bob_ground.run_if(in_state(AppState::Exploring)));
    }
}

/// A low box scattered on the floor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoration {
    pub position: Vec3,
    pub size: Vec3,
}

pub fn scatter_decorations(rng: &mut impl Rng, count: usize, half_extent: f32) -> Vec<Decoration> {
    (0..count)
        .map(|_| {
            let side = rng.gen_range(0.3..0.8);
            let height = rng.gen_range(0.1..0.4);
            let x = rng.gen_range(-half_extent..half_extent);
            let z = rng.gen_range(-half_extent..half_extent);
            Decoration {
                position: Vec3::new(x, height / 2.0, z),
                size: Vec3::new(side, height, side),
            }
        })
        .collect()
}

/// Uniform points on a spherical shell between `inner` and `outer`.
pub fn scatter_stars(rng: &mut impl Rng, count: usize, inner: f32, outer: f32) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let dir = loop {
                let v = Vec3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                );
                let len = v.length_squared();
                if len > 1e-4 && len <= 1.0 {
                    break v.normalize();
                }
            };
            dir * rng.gen_range(inner..outer)
        })
        .collect()
}

fn spawn_lights(mut commands: Commands) {
    commands.spawn((
        DirectionalLightBundle {
            directional_light: DirectionalLight {
                illuminance: 4_000.0,
                shadows_enabled: true,
                ..default()
            },
            transform: Transform::from_xyz(5.0, 5.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        SceneEntity,
    ));
}

fn spawn_ground(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let floor = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x1a, 0x1f, 0x35),
        perceptual_roughness: 0.8,
        metallic: 0.2,
        ..default()
    });
    let grid_major = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x8b, 0x5c, 0xf6),
        emissive: LinearRgba::from(Color::srgb_u8(0x8b, 0x5c, 0xf6)) * 2.0,
        unlit: true,
        ..default()
    });
    let grid_minor = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x2f, 0x36, 0x5f),
        unlit: true,
        ..default()
    });
    let block = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x8b, 0x5c, 0xf6),
        emissive: LinearRgba::from(Color::srgb_u8(0x5b, 0x21, 0xb6)) * 0.2,
        perceptual_roughness: 0.5,
        ..default()
    });

    let line_x = meshes.add(Cuboid::new(GROUND_SIZE, 0.005, 0.02));
    let line_z = meshes.add(Cuboid::new(0.02, 0.005, GROUND_SIZE));
    let step = GROUND_SIZE / GRID_DIVISIONS as f32;
    let half = GROUND_SIZE / 2.0;

    let decorations = scatter_decorations(&mut rand::thread_rng(), DECORATION_COUNT, half - 1.0);

    commands
        .spawn((
            SpatialBundle::default(),
            GroundRoot,
            SceneEntity,
            Name::new("Ground"),
        ))
        .with_children(|parent| {
            parent.spawn((
                PbrBundle {
                    mesh: meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE)),
                    material: floor,
                    transform: Transform::from_xyz(0.0, -0.01, 0.0),
                    ..default()
                },
                NotShadowCaster,
            ));

            for i in 0..=GRID_DIVISIONS {
                let offset = -half + i as f32 * step;
                let material = if i == GRID_DIVISIONS / 2 {
                    grid_major.clone()
                } else {
                    grid_minor.clone()
                };
                parent.spawn((
                    PbrBundle {
                        mesh: line_x.clone(),
                        material: material.clone(),
                        transform: Transform::from_xyz(0.0, 0.01, offset),
                        ..default()
                    },
                    NotShadowCaster,
                ));
                parent.spawn((
                    PbrBundle {
                        mesh: line_z.clone(),
                        material,
                        transform: Transform::from_xyz(offset, 0.01, 0.0),
                        ..default()
                    },
                    NotShadowCaster,
                ));
            }

            for deco in decorations {
                parent.spawn(PbrBundle {
                    mesh: meshes.add(Cuboid::from_size(deco.size)),
                    material: block.clone(),
                    transform: Transform::from_translation(deco.position),
                    ..default()
                });
            }
        });
}

fn spawn_markers(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    zones: Res<ZoneRegistry>,
) {
    let pedestal = meshes.add(Cylinder::new(0.85, 1.0));

    for zone in zones.iter() {
        let style = marker_for(zone.id);
        let material = materials.add(StandardMaterial {
            base_color: style.color,
            emissive: LinearRgba::from(style.color) * 0.6,
            perceptual_roughness: 0.4,
            metallic: 0.6,
            ..default()
        });

        commands
            .spawn((
                SpatialBundle::from_transform(Transform::from_xyz(
                    zone.position.x,
                    0.0,
                    zone.position.z,
                )),
                ZoneMarker(zone.id),
                SceneEntity,
                Name::new(format!("Marker {}", zone.id)),
            ))
            .with_children(|parent| {
                parent.spawn(PbrBundle {
                    mesh: pedestal.clone(),
                    material,
                    transform: Transform::from_xyz(0.0, 0.5, 0.0),
                    ..default()
                });
                parent.spawn(PointLightBundle {
                    point_light: PointLight {
                        color: style.color,
                        intensity: 150_000.0,
                        range: 5.0,
                        ..default()
                    },
                    transform: Transform::from_xyz(0.0, 1.0, 0.0),
                    ..default()
                });
            });
    }
}

fn spawn_stars(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mesh = meshes.add(Sphere::new(0.15));
    let material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        emissive: LinearRgba::WHITE * 3.0,
        unlit: true,
        fog_enabled: false,
        ..default()
    });

    for position in scatter_stars(&mut rand::thread_rng(), STAR_COUNT, 60.0, 100.0) {
        commands.spawn((
            PbrBundle {
                mesh: mesh.clone(),
                material: material.clone(),
                transform: Transform::from_translation(position),
                ..default()
            },
            NotShadowCaster,
            SceneEntity,
        ));
    }
}

fn bob_ground(time: Res<Time>, mut ground: Query<&mut Transform, With<GroundRoot>>) {
    for mut t in &mut ground {
        t.translation.y = (time.elapsed_seconds() * 0.2).sin() * 0.03;
    }
}

fn despawn_scene(mut commands: Commands, entities: Query<Entity, With<SceneEntity>>) {
    let mut count = 0;
    for entity in &entities {
        commands.entity(entity).despawn_recursive();
        count += 1;
    }
    debug!("despawned {count} scene roots");
}
