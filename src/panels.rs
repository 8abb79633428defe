//! Mount/unmount bookkeeping for the overlay panels.
//!
//! Each panel runs a small state machine fed with a single "open" flag.
//! Opening and closing both play a fixed-length transition; a panel stays
//! mounted until its exit transition has fully elapsed, and reopening it
//! during that window cancels the pending removal.

use std::time::Duration;

use bevy::prelude::*;

use crate::dispatch::ActivePanel;
use crate::zones::{ZoneId, ZoneRegistry};
use crate::{AppState, FrameSet};

pub const TRANSITION: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PanelPhase {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Clone, Debug)]
pub struct PanelTransition {
    phase: PanelPhase,
    /// Runs during `Opening` and `Closing`; dropped when the phase settles.
    timer: Option<Timer>,
    duration: Duration,
    /// Visibility at the moment the exit transition started.
    fade_from: f32,
}

impl Default for PanelTransition {
    fn default() -> Self {
        Self::new(TRANSITION)
    }
}

impl PanelTransition {
    pub fn new(duration: Duration) -> Self {
        Self {
            phase: PanelPhase::Closed,
            timer: None,
            duration,
            fade_from: 1.0,
        }
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    pub fn is_mounted(&self) -> bool {
        self.phase != PanelPhase::Closed
    }

    /// Feed the current open flag. Only a flip changes anything.
    pub fn set_open(&mut self, open: bool) {
        match (self.phase, open) {
            (PanelPhase::Closed | PanelPhase::Closing, true) => {
                // Reopening mid-exit cancels the removal and starts the enter
                // transition from wherever the fade currently is.
                let start = self.visibility();
                let mut timer = Timer::new(self.duration, TimerMode::Once);
                timer.set_elapsed(self.duration.mul_f32(start));
                self.timer = Some(timer);
                self.phase = PanelPhase::Opening;
            }
            (PanelPhase::Open | PanelPhase::Opening, false) => {
                self.fade_from = self.visibility();
                self.timer = Some(Timer::new(self.duration, TimerMode::Once));
                self.phase = PanelPhase::Closing;
            }
            _ => {}
        }
    }

    /// Advance the running transition. Returns the phase it settled into,
    /// if one completed this tick.
    pub fn tick(&mut self, delta: Duration) -> Option<PanelPhase> {
        let timer = self.timer.as_mut()?;
        if !timer.tick(delta).finished() {
            return None;
        }
        self.timer = None;
        self.phase = match self.phase {
            PanelPhase::Opening => PanelPhase::Open,
            PanelPhase::Closing => PanelPhase::Closed,
            settled => settled,
        };
        Some(self.phase)
    }

    /// 0 when hidden, 1 when fully shown.
    pub fn visibility(&self) -> f32 {
        let progress = self.timer.as_ref().map_or(1.0, |t| t.fraction());
        match self.phase {
            PanelPhase::Closed => 0.0,
            PanelPhase::Open => 1.0,
            PanelPhase::Opening => progress,
            PanelPhase::Closing => self.fade_from * (1.0 - progress),
        }
    }
}

/// One transition per zone, in registry order.
#[derive(Resource, Default, Debug)]
pub struct PanelStack {
    panels: Vec<(ZoneId, PanelTransition)>,
}

impl PanelStack {
    pub fn from_registry(zones: &ZoneRegistry) -> Self {
        Self {
            panels: zones
                .iter()
                .map(|z| (z.id, PanelTransition::default()))
                .collect(),
        }
    }

    pub fn mounted(&self) -> impl Iterator<Item = (ZoneId, &PanelTransition)> {
        self.panels
            .iter()
            .filter(|(_, p)| p.is_mounted())
            .map(|(id, p)| (*id, p))
    }

    pub fn sync(&mut self, active: &ActivePanel, delta: Duration) {
        for (id, panel) in &mut self.panels {
            panel.set_open(active.is(*id));
            if let Some(phase) = panel.tick(delta) {
                debug!("panel {id} is now {phase:?}");
            }
        }
    }

    pub fn reset(&mut self) {
        for (_, panel) in &mut self.panels {
            *panel = PanelTransition::default();
        }
    }
}

pub struct PanelPlugin;
impl Plugin for PanelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanelStack>()
            .add_systems(Startup, init_panels)
            .add_systems(
                Update,
                sync_panels
                    .in_set(FrameSet::Present)
                    .run_if(in_state(AppState::Exploring)),
            )
            .add_systems(OnExit(AppState::Exploring), |mut stack: ResMut<PanelStack>| {
                stack.reset();
            });
    }
}

fn init_panels(mut commands: Commands, zones: Res<ZoneRegistry>) {
    commands.insert_resource(PanelStack::from_registry(&zones));
}

pub(crate) fn sync_panels(time: Res<Time>, active: Res<ActivePanel>, mut stack: ResMut<PanelStack>) {
    stack.sync(&active, time.delta());
}
