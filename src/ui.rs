use std::time::Duration;

use bevy::prelude::*;
use bevy_egui::egui::{self, Align2, Color32, RichText};
use bevy_egui::{EguiContexts, EguiPlugin};

use crate::avatar::NearbyZone;
use crate::content::{marker_for, panel_for, Block, PanelAnchor, PanelContent};
use crate::dispatch::{ActivePanel, ClosePanel};
use crate::input::{key_label, Action, Keybinds, PendingRebind};
use crate::loading::{LoadingSequence, RestartEvent};
use crate::panels::{sync_panels, PanelPhase, PanelStack};
use crate::scene::ZoneMarker;
use crate::{AppState, FrameSet, MainCamera};

const BACKDROP: Color32 = Color32::from_rgb(0x0f, 0x17, 0x2a);
const ACCENT: Color32 = Color32::from_rgb(0xc4, 0xb5, 0xfd);
const PURPLE: Color32 = Color32::from_rgb(0x8b, 0x5c, 0xf6);
const PANEL_WIDTH: f32 = 420.0;

#[derive(Resource, Default, Debug)]
pub struct SessionSettings {
    pub muted: bool,
    pub show_controls: bool,
}

impl SessionSettings {
    pub fn toggle_mute(&mut self, toasts: &mut Toasts) {
        self.muted = !self.muted;
        info!("sound muted: {}", self.muted);
        let text = if self.muted {
            "Sound muted"
        } else {
            "Sound enabled"
        };
        toasts.push(text, None, Duration::from_secs(3));
    }
}

#[derive(Debug)]
pub struct Toast {
    pub text: String,
    pub detail: Option<String>,
    timer: Timer,
}

/// Short-lived notifications stacked in the corner.
#[derive(Resource, Default, Debug)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, text: impl Into<String>, detail: Option<&str>, ttl: Duration) {
        self.items.push(Toast {
            text: text.into(),
            detail: detail.map(str::to_owned),
            timer: Timer::new(ttl, TimerMode::Once),
        });
    }

    pub fn tick(&mut self, delta: Duration) {
        for toast in &mut self.items {
            toast.timer.tick(delta);
        }
        self.items.retain(|t| !t.timer.finished());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<SessionSettings>()
            .init_resource::<Toasts>()
            .add_systems(Update, loading_ui.run_if(in_state(AppState::Loading)))
            .add_systems(OnEnter(AppState::Exploring), welcome_toast)
            .add_systems(OnExit(AppState::Exploring), |mut toasts: ResMut<Toasts>| {
                toasts.clear();
            })
            .add_systems(
                Update,
                (
                    marker_labels_ui,
                    nav_ui,
                    controls_ui,
                    prompt_ui,
                    panels_ui,
                    toasts_ui,
                )
                    .chain()
                    .after(sync_panels)
                    .in_set(FrameSet::Present)
                    .run_if(in_state(AppState::Exploring)),
            );
    }
}

fn welcome_toast(mut toasts: ResMut<Toasts>, keybinds: Res<Keybinds>) {
    let hint = format!(
        "Use {}{}{}{} to move and {} to interact with the glowing spots",
        key_label(keybinds.forward),
        key_label(keybinds.left),
        key_label(keybinds.backward),
        key_label(keybinds.right),
        key_label(keybinds.interact),
    );
    toasts.push(
        "Welcome to my interactive portfolio!",
        Some(hint.as_str()),
        Duration::from_secs(5),
    );
}

fn loading_ui(mut contexts: EguiContexts, seq: Res<LoadingSequence>) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(BACKDROP))
        .show(contexts.ctx_mut(), |ui| {
            ui.add_space(ui.available_height() * 0.35);
            ui.vertical_centered(|ui| {
                ui.set_max_width(420.0);
                ui.label(
                    RichText::new("Interactive Portfolio")
                        .size(32.0)
                        .strong()
                        .color(Color32::WHITE),
                );
                ui.add_space(24.0);
                ui.add(
                    egui::ProgressBar::new(f32::from(seq.progress()) / 100.0)
                        .fill(PURPLE)
                        .desired_height(8.0),
                );
                ui.horizontal(|ui| {
                    ui.label(RichText::new(seq.message()).small().color(ACCENT));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(format!("{}%", seq.progress()))
                                .small()
                                .color(ACCENT),
                        );
                    });
                });
                ui.add_space(24.0);
                ui.label(
                    RichText::new("Use WASD to move, SPACE to jump and E to interact")
                        .small()
                        .color(ACCENT.gamma_multiply(0.7)),
                );
            });
        });
}

fn nav_ui(
    mut contexts: EguiContexts,
    mut session: ResMut<SessionSettings>,
    mut toasts: ResMut<Toasts>,
    mut ev_restart: EventWriter<RestartEvent>,
) {
    egui::TopBottomPanel::top("nav")
        .frame(egui::Frame::none().inner_margin(12.0))
        .show_separator_line(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("My Portfolio")
                        .size(20.0)
                        .strong()
                        .color(Color32::WHITE),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Restart").clicked() {
                        ev_restart.send(RestartEvent);
                    }
                    let mute_label = if session.muted { "Unmute" } else { "Mute" };
                    if ui.button(mute_label).clicked() {
                        session.toggle_mute(&mut toasts);
                    }
                    if ui.button("Controls").clicked() {
                        session.show_controls = !session.show_controls;
                    }
                });
            });
        });
}

fn controls_ui(
    mut contexts: EguiContexts,
    mut session: ResMut<SessionSettings>,
    keybinds: Res<Keybinds>,
    mut pending: ResMut<PendingRebind>,
) {
    if !session.show_controls {
        if pending.0.is_some() {
            pending.0 = None;
        }
        return;
    }

    let mut open = session.show_controls;
    egui::Window::new("Controls")
        .open(&mut open)
        .anchor(Align2::RIGHT_TOP, egui::vec2(-16.0, 64.0))
        .resizable(false)
        .collapsible(false)
        .show(contexts.ctx_mut(), |ui| {
            for action in Action::ALL {
                ui.horizontal(|ui| {
                    ui.label(action.label());
                    let text = if pending.0 == Some(action) {
                        "Press a key...".to_string()
                    } else {
                        key_label(keybinds.get(action))
                    };
                    if ui.button(text).clicked() {
                        pending.0 = Some(action);
                    }
                });
            }
            if pending.0.is_some() {
                ui.label(
                    RichText::new(format!("{} cancels", key_label(keybinds.close)))
                        .small()
                        .color(ACCENT),
                );
            }
            ui.separator();
            ui.label(format!("{}: close panel", key_label(keybinds.close)));
            ui.label(format!("{}: toggle this window", key_label(keybinds.controls)));
            ui.label(format!("{}: mute", key_label(keybinds.mute)));
            ui.label(format!("{}: restart", key_label(keybinds.restart)));
            ui.label("Left drag: orbit camera");
            ui.label("Mouse wheel: zoom");
        });
    session.show_controls = open;
}

fn marker_labels_ui(
    mut contexts: EguiContexts,
    q_cam: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    markers: Query<(&ZoneMarker, &GlobalTransform)>,
) {
    let Ok((camera, cam_transform)) = q_cam.get_single() else {
        return;
    };
    let ctx = contexts.ctx_mut();
    for (marker, transform) in &markers {
        let anchor = transform.translation() + Vec3::Y * 2.2;
        let Some(screen) = camera.world_to_viewport(cam_transform, anchor) else {
            continue;
        };
        let style = marker_for(marker.0);
        egui::Area::new(egui::Id::new(("marker", marker.0.as_str())))
            .fixed_pos(egui::pos2(screen.x, screen.y))
            .pivot(Align2::CENTER_BOTTOM)
            .order(egui::Order::Background)
            .interactable(false)
            .show(ctx, |ui| {
                ui.label(
                    RichText::new(style.label)
                        .size(18.0)
                        .strong()
                        .color(egui_color(style.color)),
                );
            });
    }
}

fn egui_color(color: Color) -> Color32 {
    let c = color.to_srgba();
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(channel(c.red), channel(c.green), channel(c.blue))
}

fn prompt_ui(
    mut contexts: EguiContexts,
    nearby: Res<NearbyZone>,
    active: Res<ActivePanel>,
    keybinds: Res<Keybinds>,
) {
    let Some(zone) = nearby.0 else {
        return;
    };
    if active.is(zone) {
        return;
    }
    egui::Area::new("interact_prompt".into())
        .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -32.0))
        .interactable(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.label(
                RichText::new(format!(
                    "Press {} to view {}",
                    key_label(keybinds.interact),
                    marker_for(zone).label
                ))
                .color(ACCENT),
            );
        });
}

fn panels_ui(
    mut contexts: EguiContexts,
    stack: Res<PanelStack>,
    mut ev_close: EventWriter<ClosePanel>,
) {
    let ctx = contexts.ctx_mut();
    for (id, transition) in stack.mounted() {
        let Some(content) = panel_for(id) else {
            continue;
        };
        // A panel on its way out no longer takes clicks.
        let interactive = transition.phase() != PanelPhase::Closing;
        if show_panel(ctx, id.as_str(), content, transition.visibility(), interactive) {
            ev_close.send(ClosePanel);
        }
    }
}

/// Draws one panel; returns true when its Close button was clicked.
fn show_panel(
    ctx: &egui::Context,
    key: &str,
    content: &PanelContent,
    visibility: f32,
    interactive: bool,
) -> bool {
    let (align, x) = match content.anchor {
        PanelAnchor::Left => (Align2::LEFT_BOTTOM, 48.0),
        PanelAnchor::Center => (Align2::CENTER_BOTTOM, 0.0),
        PanelAnchor::Right => (Align2::RIGHT_BOTTOM, -48.0),
    };
    // Slides up from 40px below its resting place while fading in.
    let y = -96.0 + (1.0 - visibility) * 40.0;

    let mut close = false;
    egui::Area::new(egui::Id::new(("panel", key)))
        .anchor(align, egui::vec2(x, y))
        .order(egui::Order::Foreground)
        .interactable(interactive)
        .show(ctx, |ui| {
            ui.set_opacity(visibility);
            egui::Frame::none()
                .fill(BACKDROP.gamma_multiply(0.9))
                .stroke(egui::Stroke::new(1.0, ACCENT.gamma_multiply(0.3)))
                .rounding(8.0)
                .inner_margin(16.0)
                .show(ui, |ui| {
                    ui.set_width(PANEL_WIDTH);
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(content.title)
                                .size(18.0)
                                .strong()
                                .color(Color32::WHITE),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Close").clicked() {
                                close = true;
                            }
                        });
                    });
                    ui.separator();
                    egui::ScrollArea::vertical()
                        .max_height(260.0)
                        .show(ui, |ui| {
                            for block in content.blocks {
                                show_block(ui, block);
                            }
                        });
                });
        });
    close
}

fn show_block(ui: &mut egui::Ui, block: &Block) {
    match *block {
        Block::Paragraph(text) => {
            ui.label(RichText::new(text).color(ACCENT));
            ui.add_space(8.0);
        }
        Block::Heading(text) => {
            ui.label(RichText::new(text).size(16.0).strong().color(PURPLE));
        }
        Block::Bullets(items) => {
            for item in items {
                ui.label(RichText::new(format!("• {item}")).color(ACCENT));
            }
        }
        Block::Project(title, summary, tags) => {
            ui.label(RichText::new(title).strong().color(PURPLE));
            ui.label(RichText::new(summary).small().color(ACCENT));
            ui.horizontal(|ui| {
                for tag in tags {
                    ui.label(
                        RichText::new(*tag)
                            .small()
                            .color(Color32::WHITE)
                            .background_color(PURPLE.gamma_multiply(0.4)),
                    );
                }
            });
        }
        Block::Link(label, value) => {
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("{label}:")).strong().color(ACCENT));
                ui.label(RichText::new(value).color(PURPLE));
            });
        }
        Block::Separator => {
            ui.separator();
        }
    }
}

fn toasts_ui(mut contexts: EguiContexts, time: Res<Time>, mut toasts: ResMut<Toasts>) {
    toasts.tick(time.delta());
    if toasts.iter().next().is_none() {
        return;
    }
    egui::Area::new("toasts".into())
        .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
        .interactable(false)
        .show(contexts.ctx_mut(), |ui| {
            for toast in toasts.iter() {
                egui::Frame::none()
                    .fill(BACKDROP.gamma_multiply(0.95))
                    .rounding(6.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(&toast.text).strong().color(Color32::WHITE));
                        if let Some(detail) = &toast.detail {
                            ui.label(RichText::new(detail).small().color(ACCENT));
                        }
                    });
                ui.add_space(6.0);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire() {
        let mut toasts = Toasts::default();
        toasts.push("short", None, Duration::from_secs(1));
        toasts.push("long", Some("detail"), Duration::from_secs(5));

        toasts.tick(Duration::from_millis(999));
        assert_eq!(toasts.iter().count(), 2);

        toasts.tick(Duration::from_millis(1));
        let left: Vec<&str> = toasts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(left, vec!["long"]);

        toasts.tick(Duration::from_secs(10));
        assert_eq!(toasts.iter().count(), 0);
    }

    #[test]
    fn welcome_hint_names_keys_plainly() {
        let mut app = App::new();
        app.init_resource::<Toasts>()
            .init_resource::<Keybinds>()
            .add_systems(Update, welcome_toast);
        app.update();

        let toasts = app.world().resource::<Toasts>();
        let details: Vec<&str> = toasts.iter().filter_map(|t| t.detail.as_deref()).collect();
        assert_eq!(
            details,
            vec!["Use WASD to move and E to interact with the glowing spots"]
        );
    }

    #[test]
    fn mute_toggle_announces_new_state() {
        let mut session = SessionSettings::default();
        let mut toasts = Toasts::default();

        session.toggle_mute(&mut toasts);
        assert!(session.muted);
        session.toggle_mute(&mut toasts);
        assert!(!session.muted);

        let texts: Vec<&str> = toasts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Sound muted", "Sound enabled"]);
    }
}
