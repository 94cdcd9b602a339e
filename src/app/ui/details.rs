use eframe::egui::{self, Color32, RichText, Ui};

use crate::story::{Consequence, ConsequenceStatus, EventId, StatusUpdate, StoryEvent};
use crate::util::format_percent;

use super::super::ViewModel;
use super::super::render_utils::{event_type_color, status_color};

impl ViewModel {
    fn event_title(&self, id: EventId) -> String {
        self.events
            .iter()
            .find(|event| event.id == id)
            .map_or_else(|| format!("event #{id}"), |event| event.title.clone())
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        self.draw_notices(ui);

        let Some(selected) = self.interaction.selected() else {
            ui.label("Click an event in the graph to inspect its consequences.");
            return;
        };

        let Some(event) = self.events.iter().find(|event| event.id == selected).cloned() else {
            ui.label("Selected event is no longer loaded.");
            return;
        };

        self.draw_event_summary(ui, &event);

        let outgoing = self
            .consequences
            .iter()
            .filter(|consequence| consequence.source_event_id == selected)
            .cloned()
            .collect::<Vec<_>>();
        let incoming = self
            .consequences
            .iter()
            .filter(|consequence| consequence.target_event_id == Some(selected))
            .cloned()
            .collect::<Vec<_>>();

        ui.separator();
        self.draw_action_inputs(ui, selected);

        ui.separator();
        ui.label(RichText::new("Predicted consequences").strong());
        egui::ScrollArea::vertical()
            .id_salt("consequence_cards")
            .show(ui, |ui| {
                if outgoing.is_empty() {
                    ui.label("No consequences predicted for this event.");
                }
                for consequence in &outgoing {
                    self.draw_consequence_card(ui, consequence);
                }

                if !incoming.is_empty() {
                    ui.add_space(8.0);
                    ui.label(RichText::new("Realized here").strong());
                    for consequence in &incoming {
                        let source = self.event_title(consequence.source_event_id);
                        if ui
                            .link(format!("{source}: {}", consequence.description))
                            .clicked()
                        {
                            self.select_event(consequence.source_event_id);
                        }
                    }
                }
            });
    }

    fn draw_notices(&mut self, ui: &mut Ui) {
        if self.notices.is_empty() {
            return;
        }

        for notice in &self.notices {
            let color = if notice.is_error {
                Color32::from_rgb(240, 120, 110)
            } else {
                Color32::from_rgb(140, 210, 150)
            };
            ui.colored_label(color, notice.text.as_str());
        }
        if ui.small_button("Clear messages").clicked() {
            self.notices.clear();
        }
        ui.separator();
    }

    fn draw_event_summary(&mut self, ui: &mut Ui, event: &StoryEvent) {
        ui.label(RichText::new(event.title.as_str()).strong().size(16.0));
        ui.horizontal(|ui| {
            ui.colored_label(event_type_color(event.event_type), event.event_type.label());
            if let Some(chapter) = event.chapter_number {
                ui.label(format!("chapter {chapter}"));
            }
            ui.label(format!("magnitude {}", format_percent(event.magnitude)));
            if let Some(impact) = event.emotional_impact {
                ui.label(format!("emotional impact {}", format_percent(impact)));
            }
        });
        if !event.description.is_empty() {
            ui.add_space(4.0);
            ui.label(event.description.as_str());
        }

        let links = event
            .causes
            .iter()
            .map(|id| ("caused by", *id))
            .chain(event.effects.iter().map(|id| ("leads to", *id)))
            .collect::<Vec<_>>();
        for (relation, id) in links {
            let title = self.event_title(id);
            if ui.link(format!("{relation} {title}")).clicked() {
                self.select_event(id);
            }
        }
    }

    fn draw_action_inputs(&mut self, ui: &mut Ui, selected: EventId) {
        let target_text = self
            .realize_target
            .map_or_else(|| "choose an event".to_owned(), |id| self.event_title(id));

        egui::ComboBox::from_label("Realized at")
            .selected_text(target_text)
            .show_ui(ui, |ui| {
                for event in self.events.iter().filter(|event| event.id != selected) {
                    ui.selectable_value(
                        &mut self.realize_target,
                        Some(event.id),
                        event.title.as_str(),
                    );
                }
            });

        ui.horizontal(|ui| {
            ui.label("Invalidation reason");
            ui.text_edit_singleline(&mut self.invalidation_reason);
        });
    }

    fn draw_consequence_card(&mut self, ui: &mut Ui, consequence: &Consequence) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.colored_label(status_color(consequence.status), consequence.status.label());
                ui.label(format!("#{}", consequence.id));
                ui.label(consequence.timeframe.label());
            });
            ui.label(consequence.description.as_str());
            ui.label(format!(
                "probability {}  |  severity {}",
                format_percent(consequence.probability),
                format_percent(consequence.severity)
            ));
            if let Some(impact) = &consequence.plot_impact {
                ui.small(impact.as_str());
            }

            match consequence.status {
                ConsequenceStatus::Realized => {
                    if let Some(target) = consequence.target_event_id {
                        ui.label(format!("realized at {}", self.event_title(target)));
                    }
                }
                ConsequenceStatus::Invalidated => {
                    if let Some(reason) = &consequence.invalidation_reason {
                        ui.label(format!("invalidated: {reason}"));
                    }
                }
                ConsequenceStatus::Potential | ConsequenceStatus::Active => {
                    self.draw_transition_buttons(ui, consequence);
                }
            }
        });
    }

    fn draw_transition_buttons(&mut self, ui: &mut Ui, consequence: &Consequence) {
        let id = consequence.id;
        let pending = self.pending.contains(&id);

        ui.add_enabled_ui(!pending, |ui| {
            ui.horizontal(|ui| {
                if consequence.status == ConsequenceStatus::Potential
                    && ui.button("Activate").clicked()
                {
                    self.request_transition(id, StatusUpdate::activate());
                }

                let realize = ui
                    .add_enabled(self.realize_target.is_some(), egui::Button::new("Realize"))
                    .on_disabled_hover_text("Choose the event where it was realized first.");
                if realize.clicked()
                    && let Some(target) = self.realize_target
                {
                    self.request_transition(id, StatusUpdate::realize(target));
                }

                if ui
                    .button("Invalidate")
                    .on_hover_text("Requires an invalidation reason.")
                    .clicked()
                {
                    let reason = self.invalidation_reason.clone();
                    self.request_transition(id, StatusUpdate::invalidate(reason));
                }
            });
        });

        if pending {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.small("waiting for the story service");
            });
        }
    }
}
