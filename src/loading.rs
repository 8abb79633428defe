//! Intro progress screen shown before the scene is mounted.
//!
//! Purely time based: it does not track asset readiness.

use std::time::Duration;

use bevy::prelude::*;

use crate::AppState;

const TICK: Duration = Duration::from_millis(30);
const TRAILING_DELAY: Duration = Duration::from_millis(500);
const MESSAGE_INTERVAL: Duration = Duration::from_millis(1000);
const MESSAGES: [&str; 4] = [
    "Loading assets...",
    "Building world...",
    "Placing character...",
    "Almost ready...",
];

#[derive(Resource, Debug, Clone)]
pub struct LoadingSequence {
    progress: u8,
    elapsed: Duration,
    tick: Timer,
    trailing: Option<Timer>,
    finished: bool,
}

impl Default for LoadingSequence {
    fn default() -> Self {
        Self {
            progress: 0,
            elapsed: Duration::ZERO,
            tick: Timer::new(TICK, TimerMode::Repeating),
            trailing: None,
            finished: false,
        }
    }
}

impl LoadingSequence {
    /// Percentage, 0 to 100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn message(&self) -> &'static str {
        let index = (self.elapsed.as_millis() / MESSAGE_INTERVAL.as_millis()) as usize;
        MESSAGES[index.min(MESSAGES.len() - 1)]
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns `true` on the single call during which the sequence completes.
    pub fn advance(&mut self, delta: Duration) -> bool {
        if self.finished {
            return false;
        }
        self.elapsed += delta;

        if let Some(trailing) = self.trailing.as_mut() {
            if trailing.tick(delta).finished() {
                self.finished = true;
                return true;
            }
            return false;
        }

        self.tick.tick(delta);
        let ticks = self.tick.times_finished_this_tick();
        self.progress = (u32::from(self.progress) + ticks).min(100) as u8;
        if self.progress == 100 {
            self.trailing = Some(Timer::new(TRAILING_DELAY, TimerMode::Once));
        }
        false
    }
}

/// Tear the scene down and replay the intro.
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct RestartEvent;

pub struct LoadingPlugin;
impl Plugin for LoadingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoadingSequence>()
            .add_event::<RestartEvent>()
            .add_systems(OnEnter(AppState::Loading), |mut seq: ResMut<LoadingSequence>| {
                *seq = LoadingSequence::default();
            })
            .add_systems(Update, run_loading.run_if(in_state(AppState::Loading)))
            .add_systems(Update, handle_restart.run_if(in_state(AppState::Exploring)));
    }
}

fn run_loading(
    time: Res<Time>,
    mut seq: ResMut<LoadingSequence>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if seq.advance(time.delta()) {
        info!("loading finished, mounting scene");
        next_state.set(AppState::Exploring);
    }
}

fn handle_restart(
    mut ev_restart: EventReader<RestartEvent>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if ev_restart.read().count() > 0 {
        info!("restarting");
        next_state.set(AppState::Loading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn counts_up_one_percent_per_tick() {
        let mut seq = LoadingSequence::default();
        assert_eq!(seq.progress(), 0);

        let mut last = 0;
        for i in 1..=100u32 {
            assert!(!seq.advance(ms(30)));
            assert_eq!(u32::from(seq.progress()), i);
            assert!(seq.progress() >= last);
            last = seq.progress();
        }
        assert_eq!(seq.progress(), 100);
        assert!(!seq.is_finished());
    }

    #[test]
    fn completes_once_after_trailing_delay() {
        let mut seq = LoadingSequence::default();
        for _ in 0..100 {
            seq.advance(ms(30));
        }

        assert!(!seq.advance(ms(499)));
        assert!(seq.advance(ms(1)));
        assert!(seq.is_finished());

        assert!(!seq.advance(ms(30)));
        assert!(!seq.advance(ms(5_000)));
        assert_eq!(seq.progress(), 100);
    }

    #[test]
    fn long_frames_count_every_tick_but_cap_at_100() {
        let mut seq = LoadingSequence::default();
        seq.advance(ms(95));
        assert_eq!(seq.progress(), 3);

        seq.advance(ms(60_000));
        assert_eq!(seq.progress(), 100);
        assert!(!seq.is_finished());
    }

    #[test]
    fn status_message_follows_schedule() {
        let mut seq = LoadingSequence::default();
        assert_eq!(seq.message(), "Loading assets...");

        seq.advance(ms(999));
        assert_eq!(seq.message(), "Loading assets...");
        seq.advance(ms(1));
        assert_eq!(seq.message(), "Building world...");
        seq.advance(ms(1_000));
        assert_eq!(seq.message(), "Placing character...");
        seq.advance(ms(1_000));
        assert_eq!(seq.message(), "Almost ready...");
        seq.advance(ms(10_000));
        assert_eq!(seq.message(), "Almost ready...");
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins((StatesPlugin, LoadingPlugin))
            .init_state::<AppState>()
            .init_resource::<Time>();
        app.world_mut().resource_mut::<Time>().advance_by(ms(100));
        app
    }

    fn state(app: &App) -> AppState {
        app.world().resource::<State<AppState>>().get().clone()
    }

    #[test]
    fn loading_hands_over_to_exploring() {
        let mut app = app();
        assert_eq!(state(&app), AppState::Loading);

        for _ in 0..60 {
            app.update();
        }
        assert_eq!(state(&app), AppState::Exploring);
        assert!(app.world().resource::<LoadingSequence>().is_finished());
    }

    #[test]
    fn restart_replays_the_intro() {
        let mut app = app();
        for _ in 0..60 {
            app.update();
        }
        assert_eq!(state(&app), AppState::Exploring);

        app.world_mut().send_event(RestartEvent);
        app.update();
        app.update();

        assert_eq!(state(&app), AppState::Loading);
        assert!(!app.world().resource::<LoadingSequence>().is_finished());
        assert!(app.world().resource::<LoadingSequence>().progress() < 100);
    }
}
