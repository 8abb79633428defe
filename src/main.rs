mod avatar;
mod content;
mod dispatch;
mod input;
mod loading;
mod panels;
mod scene;
mod ui;
mod zones;

use avatar::AvatarPlugin;
use bevy::core_pipeline::bloom::BloomSettings;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::pbr::{FogFalloff, FogSettings};
use bevy::prelude::*;
use dispatch::DispatchPlugin;
use input::{InputPlugin, OrbitCamera};
use loading::LoadingPlugin;
use panels::PanelPlugin;
use scene::ScenePlugin;
use ui::UiPlugin;
use zones::{ZoneRegistry, ZoneRegistryError};

const BACKGROUND: Color = Color::srgb(0.059, 0.090, 0.165);

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Loading,
    Exploring,
}

/// Per-frame ordering: keys are read before the avatar moves, interactions
/// are dispatched before anything is drawn.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Input,
    Simulate,
    Dispatch,
    Present,
}

#[derive(Component)]
pub struct MainCamera;

fn main() -> Result<(), ZoneRegistryError> {
    let zones = ZoneRegistry::portfolio()?;

    App::new()
        .insert_resource(ClearColor(BACKGROUND))
        .insert_resource(Msaa::Sample4)
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 200.0,
        })
        .insert_resource(zones)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "portfolio-walk".into(),
                resolution: (1280., 800.).into(),
                ..default()
            }),
            ..default()
        }))
        .init_state::<AppState>()
        .configure_sets(
            Update,
            (
                FrameSet::Input,
                FrameSet::Simulate,
                FrameSet::Dispatch,
                FrameSet::Present,
            )
                .chain(),
        )
        .add_plugins((
            InputPlugin,
            AvatarPlugin,
            DispatchPlugin,
            PanelPlugin,
            LoadingPlugin,
            ScenePlugin,
            UiPlugin,
        ))
        .add_systems(Startup, setup_camera)
        .run();

    Ok(())
}

fn setup_camera(mut commands: Commands) {
    let orbit = OrbitCamera::looking_from(Vec3::new(0.0, 10.0, 12.0), Vec3::ZERO);
    commands.spawn((
        Camera3dBundle {
            camera: Camera {
                hdr: true,
                ..default()
            },
            tonemapping: Tonemapping::TonyMcMapface,
            transform: orbit.transform(),
            ..default()
        },
        BloomSettings::NATURAL,
        FogSettings {
            color: BACKGROUND,
            falloff: FogFalloff::Linear {
                start: 10.0,
                end: 30.0,
            },
            ..default()
        },
        orbit,
        MainCamera,
    ));
}
