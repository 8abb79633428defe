//! Turns zone interactions into the single active overlay panel.

use std::time::Duration;

use bevy::input::gamepad::{GamepadRumbleIntensity, GamepadRumbleRequest};
use bevy::prelude::*;

use crate::input::ActiveGamepad;
use crate::zones::ZoneId;
use crate::{AppState, FrameSet};

const HAPTIC_PULSE: Duration = Duration::from_millis(50);

/// The avatar pressed interact while inside `zone`.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneInteracted {
    pub zone: ZoneId,
}

#[derive(Event, Clone, Copy, Debug, Default)]
pub struct ClosePanel;

/// Panel currently shown, keyed by zone id. Ids are not checked against the
/// registry; an unknown id simply has no panel to show.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePanel(Option<ZoneId>);

impl ActivePanel {
    pub fn set(&mut self, id: ZoneId) {
        self.0 = Some(id);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn get(&self) -> Option<ZoneId> {
        self.0
    }

    pub fn is(&self, id: ZoneId) -> bool {
        self.0 == Some(id)
    }
}

pub struct DispatchPlugin;
impl Plugin for DispatchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActivePanel>()
            .add_event::<ZoneInteracted>()
            .add_event::<ClosePanel>()
            .add_systems(
                Update,
                dispatch_interactions
                    .in_set(FrameSet::Dispatch)
                    .run_if(in_state(AppState::Exploring)),
            )
            .add_systems(OnExit(AppState::Exploring), |mut active: ResMut<ActivePanel>| {
                active.clear();
            });
    }
}

fn dispatch_interactions(
    mut ev_interact: EventReader<ZoneInteracted>,
    mut ev_close: EventReader<ClosePanel>,
    mut active: ResMut<ActivePanel>,
    gamepad: Option<Res<ActiveGamepad>>,
    mut ev_rumble: EventWriter<GamepadRumbleRequest>,
) {
    // Closes first, so an interaction in the same frame still opens its panel.
    for _ in ev_close.read() {
        if let Some(id) = active.get() {
            debug!("closing panel {id}");
        }
        active.clear();
    }

    for ev in ev_interact.read() {
        info!("zone interaction: {}", ev.zone);
        active.set(ev.zone);

        match gamepad.as_deref() {
            Some(ActiveGamepad(gamepad)) => {
                ev_rumble.send(GamepadRumbleRequest::Add {
                    gamepad: *gamepad,
                    duration: HAPTIC_PULSE,
                    intensity: GamepadRumbleIntensity::weak_motor(0.5),
                });
            }
            None => debug!("no gamepad connected, skipping haptic pulse"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_and_clear_empties() {
        let mut active = ActivePanel::default();
        assert_eq!(active.get(), None);

        active.set(ZoneId::ABOUT);
        assert!(active.is(ZoneId::ABOUT));

        active.set(ZoneId::CONTACT);
        assert_eq!(active.get(), Some(ZoneId::CONTACT));
        assert!(!active.is(ZoneId::ABOUT));

        active.clear();
        assert_eq!(active.get(), None);
    }

    #[test]
    fn unknown_ids_are_accepted() {
        let mut active = ActivePanel::default();
        active.set(ZoneId::new("guestbook"));
        assert_eq!(active.get(), Some(ZoneId::new("guestbook")));
    }

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<ActivePanel>()
            .add_event::<ZoneInteracted>()
            .add_event::<ClosePanel>()
            .add_event::<GamepadRumbleRequest>()
            .add_systems(Update, dispatch_interactions);
        app
    }

    fn rumble_count(app: &App) -> usize {
        let events = app.world().resource::<Events<GamepadRumbleRequest>>();
        events.get_reader().read(events).count()
    }

    #[test]
    fn interaction_opens_panel_without_haptics() {
        let mut app = app();
        app.world_mut().send_event(ZoneInteracted {
            zone: ZoneId::PROJECTS,
        });
        app.update();

        assert_eq!(
            app.world().resource::<ActivePanel>().get(),
            Some(ZoneId::PROJECTS)
        );
        assert_eq!(rumble_count(&app), 0);

        app.world_mut().send_event(ClosePanel);
        app.update();
        assert_eq!(app.world().resource::<ActivePanel>().get(), None);
    }

    #[test]
    fn close_and_open_in_one_frame_leaves_new_panel_open() {
        let mut app = app();
        app.world_mut().resource_mut::<ActivePanel>().set(ZoneId::ABOUT);
        app.world_mut().send_event(ZoneInteracted {
            zone: ZoneId::CONTACT,
        });
        app.world_mut().send_event(ClosePanel);
        app.update();

        assert_eq!(
            app.world().resource::<ActivePanel>().get(),
            Some(ZoneId::CONTACT)
        );
    }

    #[test]
    fn interaction_pulses_connected_gamepad() {
        let mut app = app();
        app.insert_resource(ActiveGamepad(Gamepad::new(0)));
        app.world_mut().send_event(ZoneInteracted {
            zone: ZoneId::ABOUT,
        });
        app.update();

        assert!(app.world().resource::<ActivePanel>().is(ZoneId::ABOUT));
        assert_eq!(rumble_count(&app), 1);
    }
}
