use eframe::egui::{self, Ui};

use crate::story::{ConsequenceStatus, EventId, EventType, Timeframe};
use crate::util::{format_percent, truncate_chars};

use super::super::ViewModel;

const PRESSING_ROWS: usize = 5;

fn optional_percent(value: Option<f32>) -> String {
    value.map_or_else(|| "n/a".to_owned(), format_percent)
}

impl ViewModel {
    pub(in crate::app) fn draw_stats(&mut self, ui: &mut Ui) {
        egui::CollapsingHeader::new("Statistics")
            .default_open(true)
            .show(ui, |ui| {
                let consequences = &self.consequence_stats;
                egui::Grid::new("consequence_stats")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        ui.label("Consequences");
                        ui.label(consequences.total.to_string());
                        ui.end_row();
                        for status in ConsequenceStatus::ALL {
                            ui.label(status.label());
                            ui.label(consequences.count(status).to_string());
                            ui.end_row();
                        }
                        for timeframe in Timeframe::ALL {
                            ui.label(timeframe.label());
                            ui.label(consequences.timeframe_count(timeframe).to_string());
                            ui.end_row();
                        }
                        ui.label("Realization rate");
                        ui.label(optional_percent(consequences.realization_rate));
                        ui.end_row();
                        ui.label("Open mean probability");
                        ui.label(optional_percent(consequences.open_mean_probability));
                        ui.end_row();
                        ui.label("Open mean severity");
                        ui.label(optional_percent(consequences.open_mean_severity));
                        ui.end_row();
                    });

                ui.add_space(6.0);
                let events = &self.event_stats;
                egui::Grid::new("event_stats")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        ui.label("Events");
                        ui.label(events.total.to_string());
                        ui.end_row();
                        for event_type in EventType::ALL {
                            let count = events.by_type.get(&event_type).copied().unwrap_or(0);
                            if count > 0 {
                                ui.label(event_type.label());
                                ui.label(count.to_string());
                                ui.end_row();
                            }
                        }
                        ui.label("Mean magnitude");
                        ui.label(optional_percent(events.mean_magnitude));
                        ui.end_row();
                        if let Some((first, last)) = events.chapter_span {
                            ui.label("Chapters");
                            ui.label(format!("{first} to {last}"));
                            ui.end_row();
                        }
                    });

                ui.add_space(6.0);
                ui.label(egui::RichText::new("Most pressing").strong());
                let pressing = self
                    .consequence_stats
                    .most_pressing
                    .iter()
                    .filter_map(|id| self.consequences.iter().find(|c| c.id == *id))
                    .take(PRESSING_ROWS)
                    .map(|c| {
                        (
                            c.source_event_id,
                            format!(
                                "{} ({})",
                                truncate_chars(&c.description, 40),
                                format_percent(c.probability * c.severity)
                            ),
                        )
                    })
                    .collect::<Vec<(EventId, String)>>();

                if pressing.is_empty() {
                    ui.label("No open consequences.");
                }
                for (source, text) in pressing {
                    if ui
                        .link(text)
                        .on_hover_text("Select the event this consequence comes from.")
                        .clicked()
                    {
                        self.select_event(source);
                    }
                }
            });
    }
}
