//! Control surface — egui/eframe application.
//!
//! # Architecture
//!
//! [`VowelscopeApp`] is the top-level [`eframe::App`].  It is deliberately
//! thin: all session logic lives in the controller, reached through two
//! seams:
//!
//! * `command_tx` — sends [`ControlCommand`]s to the session controller.
//! * `state`      — [`SharedState`] observables the controller keeps current
//!   (session phase, connection, live estimate, reference overlay).
//!
//! The chart redraws on every animation tick (~60 fps) regardless of whether
//! new data arrived: the scene is a pure function of the observed state, so
//! the redraw is idempotent.
//!
//! # Controls
//!
//! | Control | Enabled when |
//! |---------|--------------|
//! | Speaker selector | not recording |
//! | Start Recording  | idle **and** connected |
//! | Stop Recording   | recording |

use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::net::ConnectionState;
use crate::plot::{DrawOp, PlotScene};
use crate::session::{ControlCommand, SessionState, SharedState};
use crate::types::{FormantPoint, PlotConfig, SpeakerType, VowelReference};

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

const AXIS_COLOR: egui::Color32 = egui::Color32::from_rgb(0xe5, 0xe5, 0xe5);
const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(0x66, 0x66, 0x66);
const REFERENCE_COLOR: egui::Color32 = egui::Color32::from_rgb(0x9c, 0xa3, 0xaf);
const LIVE_COLOR: egui::Color32 = egui::Color32::from_rgb(0x25, 0x63, 0xeb);
const CANVAS_COLOR: egui::Color32 = egui::Color32::WHITE;

// ---------------------------------------------------------------------------
// Control gating
// ---------------------------------------------------------------------------

/// Start requires an idle session and a live connection; a start while
/// disconnected would be refused anyway, so the button never offers it.
fn can_start(session: SessionState, connection: ConnectionState) -> bool {
    session == SessionState::Idle && connection == ConnectionState::Connected
}

fn can_stop(session: SessionState) -> bool {
    session.is_recording()
}

fn connection_color(connection: ConnectionState) -> egui::Color32 {
    match connection {
        ConnectionState::Connected => egui::Color32::from_rgb(0x22, 0xc5, 0x5e),
        ConnectionState::Disconnected => egui::Color32::from_rgb(0xef, 0x44, 0x44),
    }
}

// ---------------------------------------------------------------------------
// StateSnapshot
// ---------------------------------------------------------------------------

/// Per-frame copy of the observables, taken under one short lock.
struct StateSnapshot {
    session: SessionState,
    connection: ConnectionState,
    speaker: SpeakerType,
    formant: Option<FormantPoint>,
    references: Vec<VowelReference>,
    plot_config: PlotConfig,
    last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// VowelscopeApp
// ---------------------------------------------------------------------------

/// eframe application — the live formant chart and its controls.
pub struct VowelscopeApp {
    /// Observables kept current by the session controller.
    state: SharedState,
    /// Command channel into the session controller.
    command_tx: mpsc::Sender<ControlCommand>,
}

impl VowelscopeApp {
    /// Create a new [`VowelscopeApp`].
    pub fn new(state: SharedState, command_tx: mpsc::Sender<ControlCommand>) -> Self {
        Self { state, command_tx }
    }

    fn snapshot(&self) -> StateSnapshot {
        let st = self.state.lock().unwrap();
        StateSnapshot {
            session: st.session,
            connection: st.connection,
            speaker: st.speaker,
            formant: st.current_formant,
            references: st.references.clone(),
            plot_config: st.plot_config,
            last_error: st.last_error.clone(),
        }
    }

    fn send(&self, command: ControlCommand) {
        // try_send: the UI thread never blocks on the controller.
        if self.command_tx.try_send(command).is_err() {
            log::warn!("ui: command dropped, controller busy or gone");
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn header(&self, ui: &mut egui::Ui, snapshot: &StateSnapshot) {
        ui.horizontal(|ui| {
            ui.heading("Real-Time Formant Analysis");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(snapshot.connection.label());
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter()
                    .circle_filled(rect.center(), 5.0, connection_color(snapshot.connection));
            });
        });
        ui.label("Visualize vowel formants as you speak");
    }

    fn controls(&self, ui: &mut egui::Ui, snapshot: &StateSnapshot) {
        ui.horizontal(|ui| {
            ui.add_enabled_ui(!snapshot.session.is_recording(), |ui| {
                let mut speaker = snapshot.speaker;
                egui::ComboBox::from_label("Speaker type")
                    .selected_text(speaker.label())
                    .show_ui(ui, |ui| {
                        for candidate in SpeakerType::ALL {
                            ui.selectable_value(&mut speaker, candidate, candidate.label());
                        }
                    });
                if speaker != snapshot.speaker {
                    self.send(ControlCommand::SetSpeakerType(speaker));
                }
            });

            ui.separator();

            let start_label = if snapshot.session.is_recording() {
                "Recording…"
            } else {
                "Start Recording"
            };
            if ui
                .add_enabled(
                    can_start(snapshot.session, snapshot.connection),
                    egui::Button::new(start_label),
                )
                .clicked()
            {
                self.send(ControlCommand::StartRecording);
            }

            if ui
                .add_enabled(can_stop(snapshot.session), egui::Button::new("Stop Recording"))
                .clicked()
            {
                self.send(ControlCommand::StopRecording);
            }

            ui.label(snapshot.session.label());
        });

        if let Some(error) = &snapshot.last_error {
            ui.colored_label(egui::Color32::from_rgb(0xf9, 0x73, 0x16), error);
        }
    }

    fn chart(&self, ui: &mut egui::Ui, snapshot: &StateSnapshot) {
        let available = ui.available_size();
        let size = egui::vec2(available.x.max(300.0), available.y.max(240.0));
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());

        let scene = PlotScene::build(
            (size.x, size.y),
            snapshot.formant.as_ref(),
            &snapshot.references,
            &snapshot.plot_config,
        );
        paint_scene(&painter, response.rect.min, &scene);
    }
}

impl eframe::App for VowelscopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snapshot = self.snapshot();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.header(ui, &snapshot);
            ui.separator();
            self.controls(ui, &snapshot);
            ui.separator();
            self.chart(ui, &snapshot);
        });

        // Animation tick: redraw the last-known state whether or not a new
        // estimate arrived.
        ctx.request_repaint_after(Duration::from_millis(16));
    }
}

// ---------------------------------------------------------------------------
// Scene painting
// ---------------------------------------------------------------------------

/// Rasterize a [`PlotScene`] at `origin` — ops are pre-ordered back to
/// front, so this is a straight pass over the list.
fn paint_scene(painter: &egui::Painter, origin: egui::Pos2, scene: &PlotScene) {
    let at = |p: (f32, f32)| egui::pos2(origin.x + p.0, origin.y + p.1);

    for op in &scene.ops {
        match op {
            DrawOp::Clear => {
                let rect = egui::Rect::from_min_size(origin, egui::vec2(scene.size.0, scene.size.1));
                painter.rect_filled(rect, egui::CornerRadius::ZERO, CANVAS_COLOR);
            }
            DrawOp::AxisLine { from, to } => {
                painter.line_segment(
                    [at(*from), at(*to)],
                    egui::Stroke::new(1.0, AXIS_COLOR),
                );
            }
            DrawOp::AxisLabel { text, at: pos, rotated } => {
                let font = egui::FontId::proportional(14.0);
                if *rotated {
                    paint_rotated_label(painter, at(*pos), text, font);
                } else {
                    painter.text(
                        at(*pos),
                        egui::Align2::CENTER_BOTTOM,
                        text,
                        font,
                        LABEL_COLOR,
                    );
                }
            }
            DrawOp::ReferenceMarker { x, y, radius } => {
                painter.circle_filled(at((*x, *y)), *radius, REFERENCE_COLOR);
            }
            DrawOp::ReferenceLabel { text, at: pos } => {
                painter.text(
                    at(*pos),
                    egui::Align2::CENTER_BOTTOM,
                    text,
                    egui::FontId::proportional(16.0),
                    REFERENCE_COLOR,
                );
            }
            DrawOp::LivePoint { x, y, radius } => {
                painter.circle_filled(at((*x, *y)), *radius, LIVE_COLOR);
            }
        }
    }
}

/// Draw `text` rotated 90° counter-clockwise, centered on `center` — the
/// vertical-axis title.
fn paint_rotated_label(
    painter: &egui::Painter,
    center: egui::Pos2,
    text: &str,
    font: egui::FontId,
) {
    let galley = painter.layout_no_wrap(text.to_owned(), font, LABEL_COLOR);
    let size = galley.size();
    // Rotation is about the galley's top-left corner; place it so the
    // rotated block is centered on `center`.
    let pos = egui::pos2(center.x - size.y / 2.0, center.y + size.x / 2.0);
    painter.add(
        egui::epaint::TextShape::new(pos, galley, LABEL_COLOR)
            .with_angle(-std::f32::consts::FRAC_PI_2),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
