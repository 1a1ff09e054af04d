use tokio::sync::broadcast;

use crate::state::TrialState;

/// Observer of controller state. Never read back by the controller.
pub trait StatePublisher: Send + Sync {
    fn publish(&self, state: &TrialState);
}

impl StatePublisher for broadcast::Sender<TrialState> {
    fn publish(&self, state: &TrialState) {
        let _ = self.send(state.clone());
    }
}
