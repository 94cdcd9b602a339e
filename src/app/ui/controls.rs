use eframe::egui::{self, Ui};

use crate::story::ConsequenceStatus;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn chapter_range(&self) -> Option<(u32, u32)> {
        self.chapter_filter.then(|| {
            (
                self.chapter_from.min(self.chapter_to),
                self.chapter_from.max(self.chapter_to),
            )
        })
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search events")
            .on_hover_text("Fuzzy-highlight events by title without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        let mut changed = false;

        ui.label("Consequence statuses");
        ui.horizontal_wrapped(|ui| {
            for status in ConsequenceStatus::ALL {
                let mut shown = self.filter.statuses.contains(&status);
                if ui.checkbox(&mut shown, status.label()).changed() {
                    if shown {
                        self.filter.statuses.insert(status);
                    } else {
                        self.filter.statuses.remove(&status);
                    }
                    changed = true;
                }
            }
        });
        ui.small("Realized consequences become edges only while \"realized\" is shown.");

        ui.separator();

        changed |= ui
            .checkbox(&mut self.chapter_filter, "Limit to chapters")
            .on_hover_text("Events without a chapter number are always shown.")
            .changed();
        ui.add_enabled_ui(self.chapter_filter, |ui| {
            ui.horizontal(|ui| {
                ui.label("from");
                changed |= ui
                    .add(egui::DragValue::new(&mut self.chapter_from).range(1..=9_999))
                    .changed();
                ui.label("to");
                changed |= ui
                    .add(egui::DragValue::new(&mut self.chapter_to).range(1..=9_999))
                    .changed();
            });
        });

        if changed {
            self.graph_dirty = true;
        }

        ui.separator();

        if ui
            .checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Tick the force layout every frame interval.")
            .changed()
        {
            if self.live_physics {
                self.clock.start();
                self.settled = false;
            } else {
                self.clock.stop();
            }
        }

        if ui.button("Reset view").clicked() {
            self.interaction.reset_view();
        }

        ui.collapsing("Physics tuning", |ui| {
            let physics = &mut self.settings.physics;
            let mut tuned = false;
            tuned |= ui
                .add(egui::Slider::new(&mut physics.repulsion, 50.0..=1_500.0).text("Repulsion"))
                .on_hover_text("How strongly events push away from each other.")
                .changed();
            tuned |= ui
                .add(
                    egui::Slider::new(&mut physics.spring_length, 60.0..=400.0)
                        .text("Edge length"),
                )
                .on_hover_text("Rest length of a realized consequence edge.")
                .changed();
            tuned |= ui
                .add(
                    egui::Slider::new(&mut physics.spring_strength, 0.01..=0.3)
                        .text("Edge spring"),
                )
                .changed();
            tuned |= ui
                .add(
                    egui::Slider::new(&mut physics.center_strength, 0.0..=0.05)
                        .text("Centering"),
                )
                .changed();
            tuned |= ui
                .add(
                    egui::Slider::new(&mut physics.damping, 0.5..=0.97)
                        .text("Velocity damping")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("Share of velocity kept after each tick.")
                .changed();
            if tuned {
                self.settled = false;
            }
        });
    }
}
