use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn graph_summary_text(&self) -> String {
        let model = self.simulation.model();
        format!(
            "{} events / {} edges / {} floating",
            model.nodes.len(),
            model.edges.len(),
            model.floating.len()
        )
    }

    pub(in crate::app) fn simulation_status_text(&self) -> String {
        if !self.live_physics {
            "physics paused".to_owned()
        } else if self.settled {
            format!("settled after {} ticks", self.simulation.ticks())
        } else {
            format!("settling, energy {:.2}", self.simulation.kinetic_energy())
        }
    }

    pub(in crate::app) fn stale_text(&self) -> Option<String> {
        self.stale
            .as_ref()
            .map(|reason| format!("stale: {reason}"))
    }
}
