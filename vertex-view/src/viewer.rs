//! Interactive vertex-model tissue viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Simulation`] and
//! implements [`eframe::App`] to step, render and tune it through an egui
//! UI.

use eframe::App;
use glam::DVec2;
use vertex_core::{
    config::{Parameters, RunConfig, ScanPolicy},
    geometry,
    integrator::{Simulation, StepReport},
    stats::TissueStats,
    tissue::Tissue,
};

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: a [`Simulation`] plus the [`RunConfig`] used
///   for each step.
/// - The initial tissue, so the run can be reset.
/// - UI state (pan/zoom, timing, overlays).
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render the cells, the box and the short bonds.
///
/// ### Fields
/// - `sim` - The running simulation.
/// - `initial` - Tissue restored by [`Viewer::reset`].
/// - `params` - Editable copy of the parameters, pushed into `sim` before each step.
/// - `run_cfg` - Motility toggle and T1 scan policy for each step.
/// - `seed` - Noise seed used when resetting.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space pan offset in pixels.
/// - `show_vertices` - Draw a dot at every vertex.
///
/// - `last_report` - Outcome of the last step, for the status bar.
/// - `error` - Message of the error that stopped the run, if any.
///
/// - `step_interval` - Target time between automatic steps (seconds).
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_step_dt` - Actual time delta between the last two steps (for display only).
pub struct Viewer {
    sim: Simulation,
    initial: Tissue,
    params: Parameters,
    run_cfg: RunConfig,
    seed: u64,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    show_vertices: bool,

    last_report: Option<StepReport>,
    error: Option<String>,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer for `tissue`, paused at `t = 0`.
    ///
    /// The initial zoom fits the longer box side into about 600 pixels.
    pub fn new(tissue: Tissue, params: Parameters, seed: u64) -> Self {
        let zoom = (600.0 / params.lx.max(params.ly)) as f32;
        Self {
            sim: Simulation::new(tissue.clone(), params, seed),
            initial: tissue,
            params,
            run_cfg: RunConfig {
                seed,
                ..RunConfig::dynamics()
            },
            seed,
            running: false,
            zoom,
            pan: egui::vec2(0.0, 0.0),
            show_vertices: true,
            last_report: None,
            error: None,
            step_interval: 0.05,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        }
    }

    /// Restores the initial tissue and clock, keeping the edited parameters.
    fn reset(&mut self) {
        self.sim = Simulation::new(self.initial.clone(), self.params, self.seed);
        self.last_report = None;
        self.error = None;
        self.running = false;
    }

    /// Advances the simulation by a single step.
    ///
    /// A failed step stops auto-running and keeps the error for display.
    fn step_once(&mut self) {
        self.sim.set_params(self.params);
        match self.sim.step(&self.run_cfg) {
            Ok(report) => self.last_report = Some(report),
            Err(e) => {
                log::error!("step failed at t = {:.2}: {e}", self.sim.time());
                self.error = Some(e.to_string());
                self.running = false;
            }
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The box center is drawn at the center of `rect`, scaled by `zoom`
    /// and offset by `pan`. The y-axis is flipped so that positive y goes
    /// up in world space.
    ///
    /// ### Parameters
    /// - `p` - World-space position.
    /// - `rect` - Screen-space rectangle representing the drawing area.
    ///
    /// ### Returns
    /// The corresponding egui position in screen-space.
    fn world_to_screen(&self, p: DVec2, rect: egui::Rect) -> egui::Pos2 {
        let q = (p - 0.5 * self.params.box_size()).as_vec2();
        let center = rect.center();
        egui::pos2(
            center.x + q.x * self.zoom + self.pan.x,
            center.y - q.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> DVec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        DVec2::new(f64::from(x), f64::from(y)) + 0.5 * self.params.box_size()
    }

    /// Helper to draw a labeled `f64` [`egui::DragValue`].
    fn labeled_drag_f64(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f64,
        range: std::ops::RangeInclusive<f64>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                    self.error = None;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("frame interval = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 5.0..=400.0).text("Zoom"));
                ui.checkbox(&mut self.show_vertices, "Vertices");
            });
        });
    }

    /// Builds the bottom status bar (time, energy, force norm, T1 count).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("t = {:.2}", self.sim.time()));
                ui.label(format!("steps = {}", self.sim.steps()));
                ui.separator();
                ui.label(format!("E = {:.6}", self.sim.energy()));
                if let Some(r) = &self.last_report {
                    ui.label(format!("|F| = {:.3e}", r.force_norm));
                    ui.label(format!("short = {}", r.scan.short_edges));
                }
                ui.label(format!("T1 = {}", self.sim.transitions()));
                ui.separator();
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                if let Some(err) = &self.error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err);
                }
            });
        });
    }

    /// Builds the right-hand panel for mechanical parameters and run options.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Parameters");

                ui.separator();
                ui.label("Mechanics");
                Self::labeled_drag_f64(ui, "ka:", &mut self.params.ka, 0.0..=10.0, 0.01);
                Self::labeled_drag_f64(ui, "gamma:", &mut self.params.gamma, 0.0..=1.0, 0.001);
                Self::labeled_drag_f64(ui, "lambda:", &mut self.params.lambda, -2.0..=2.0, 0.001);

                ui.separator();
                ui.label("Motility");
                ui.checkbox(&mut self.run_cfg.motility, "enabled");
                Self::labeled_drag_f64(ui, "eta:", &mut self.params.eta, 0.0..=5.0, 0.001);

                ui.separator();
                ui.label("Topology");
                Self::labeled_drag_f64(ui, "lmin:", &mut self.params.lmin, 0.0..=1.0, 0.005);
                ui.radio_value(&mut self.run_cfg.scan_policy, ScanPolicy::Sequential, "sequential");
                ui.radio_value(&mut self.run_cfg.scan_policy, ScanPolicy::Deferred, "deferred");

                ui.separator();
                ui.label("Integration");
                Self::labeled_drag_f64(ui, "delta_t:", &mut self.params.delta_t, 0.001..=0.2, 0.001);

                ui.separator();
                let stats = TissueStats::measure(self.sim.tissue(), self.params.box_size());
                ui.label(format!("cells: {}", stats.cells));
                ui.label(format!("mean area: {:.4}", stats.mean_area));
                ui.label(format!("shape index: {:.4}", stats.mean_shape_index));
                ui.label(format!("mean sides: {:.3}", stats.mean_sides));
                ui.label(format!("shortest edge: {:.4}", stats.shortest_edge));

                ui.separator();
                if ui.button("Reset parameters").clicked() {
                    self.params = Parameters::hexagonal(self.params.lx, self.params.ly, self.params.eta);
                }
            });
    }

    /// Draws every cell as its unwrapped loop, the periodic box and short bonds.
    fn draw_tissue(&self, painter: &egui::Painter, rect: egui::Rect) {
        let tissue = self.sim.tissue();
        let box_size = self.params.box_size();

        let corners = [
            DVec2::ZERO,
            DVec2::new(box_size.x, 0.0),
            box_size,
            DVec2::new(0.0, box_size.y),
        ];
        let outline: Vec<egui::Pos2> = corners
            .iter()
            .map(|&c| self.world_to_screen(c, rect))
            .collect();
        painter.add(egui::Shape::closed_line(
            outline,
            egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
        ));

        let cell_stroke = egui::Stroke::new(1.0, egui::Color32::LIGHT_GREEN);
        for poly in tissue.polygons() {
            let pts: Vec<egui::Pos2> = poly
                .unwrapped(&tissue.vertices, box_size)
                .into_iter()
                .map(|p| self.world_to_screen(p, rect))
                .collect();
            painter.add(egui::Shape::closed_line(pts, cell_stroke));
        }

        let short_stroke = egui::Stroke::new(2.5, egui::Color32::RED);
        for &e in tissue.edges() {
            if tissue.edge_length(e, box_size) < self.params.lmin {
                let a = tissue.vertices[e.from];
                let b = a + geometry::periodic_diff(tissue.vertices[e.to], a, box_size);
                painter.line_segment(
                    [self.world_to_screen(a, rect), self.world_to_screen(b, rect)],
                    short_stroke,
                );
            }
        }

        if self.show_vertices {
            for &v in &tissue.vertices {
                painter.circle_filled(self.world_to_screen(v, rect), 2.0, egui::Color32::LIGHT_BLUE);
            }
        }
    }

    /// Builds the central panel where the tissue is drawn and navigated.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(5.0, 400.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            self.draw_tissue(&painter, rect);

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use vertex_core::lattice::Honeycomb;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn viewer() -> Viewer {
        let mut rng = StdRng::seed_from_u64(0);
        let hc = Honeycomb::new(4, 4, 1.0);
        let params = Parameters::hexagonal(hc.box_size.x, hc.box_size.y, 0.01);
        Viewer::new(hc.into_tissue(1.0, &mut rng).unwrap(), params, 0)
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = viewer();
        viewer.zoom = 40.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.5, 1.0),
            DVec2::new(-1.5, 4.25),
        ];

        for p in world_points {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);
            assert!(
                (back - p).abs().max_element() < 1e-4,
                "roundtrip mismatch: p={p:?}, back={back:?}"
            );
        }
    }

    #[test]
    fn box_center_maps_to_rect_center() {
        let viewer = viewer();
        let rect = test_rect();
        let c = viewer.world_to_screen(0.5 * viewer.params.box_size(), rect);
        assert!((c - rect.center()).length() < 1e-3);
    }

    #[test]
    fn step_once_advances_the_clock() {
        let mut viewer = viewer();
        viewer.step_once();
        viewer.step_once();

        assert_eq!(viewer.sim.steps(), 2);
        assert!((viewer.sim.time() - 2.0 * viewer.params.delta_t).abs() < 1e-12);
        let report = viewer.last_report.expect("a report after stepping");
        assert!((report.time - viewer.params.delta_t).abs() < 1e-12);
        assert!(viewer.error.is_none());
    }

    #[test]
    fn reset_restores_the_initial_tissue() {
        let mut viewer = viewer();
        let initial = viewer.sim.tissue().vertices.clone();
        viewer.params.delta_t = 0.02;
        viewer.running = true;
        viewer.step_once();
        assert_ne!(viewer.sim.tissue().vertices, initial);

        viewer.reset();

        assert_eq!(viewer.sim.tissue().vertices, initial);
        assert_eq!(viewer.sim.steps(), 0);
        assert_eq!(viewer.sim.params().delta_t, 0.02);
        assert!(viewer.last_report.is_none());
        assert!(!viewer.running);
    }

    #[test]
    fn edited_parameters_reach_the_simulation() {
        let mut viewer = viewer();
        viewer.params.lmin = 0.3;
        viewer.step_once();
        assert_eq!(viewer.sim.params().lmin, 0.3);
    }
}
