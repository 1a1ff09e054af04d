#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use apparatus::ApparatusEvent;
use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use trial::{
    Apparatus, Collaborators, ExperimentParams, Phase, PropertyTable, StimulusCorpus, StimulusSet,
    TrialController, TrialLog, TrialOutcomeRecord, TrialRecord, TrialState,
};

/// Something the controller did to the outside world, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Command(String, Value),
    Record(TrialRecord),
}

/// Apparatus and trial log double that journals every call.
#[derive(Default)]
pub struct Recorder {
    pub journal: Mutex<Vec<Entry>>,
    pub feeders: Vec<String>,
}

impl Recorder {
    pub fn entries(&self) -> Vec<Entry> {
        self.journal.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<(String, Value)> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Command(device, state) => Some((device, state)),
                Entry::Record(_) => None,
            })
            .collect()
    }

    pub fn records(&self) -> Vec<TrialRecord> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Record(r) => Some(r),
                Entry::Command(..) => None,
            })
            .collect()
    }

    pub fn outcomes(&self) -> Vec<TrialOutcomeRecord> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                TrialRecord::Outcome(o) => Some(o),
                TrialRecord::Comment(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Apparatus for Recorder {
    async fn change_state(&self, device: &str, state: Value) {
        self.journal
            .lock()
            .unwrap()
            .push(Entry::Command(device.to_string(), state));
    }

    async fn feeders(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.feeders.clone())
    }
}

#[async_trait]
impl TrialLog for Recorder {
    async fn record(&self, record: TrialRecord) -> anyhow::Result<()> {
        self.journal.lock().unwrap().push(Entry::Record(record));
        Ok(())
    }
}

/// Test side of a controller under test.
pub struct Rig {
    pub events: mpsc::UnboundedSender<ApparatusEvent>,
    pub states: broadcast::Receiver<TrialState>,
    pub recorder: Arc<Recorder>,
}

impl Rig {
    pub fn send(&self, event: ApparatusEvent) {
        self.events.send(event).unwrap();
    }

    /// Wait for the next published state in `phase`.
    pub async fn until(&mut self, phase: Phase) -> TrialState {
        loop {
            let state = self.states.recv().await.unwrap();
            if state.phase == Some(phase) {
                return state;
            }
        }
    }
}

/// Single stimulus "A" answered by `peck_center` or `peck_left`.
pub fn stimulus_a(timeout_reward: f64, reinforced: bool) -> Value {
    json!([{
        "name": "A",
        "frequency": 1,
        "responses": {
            "peck_center": { "p_reward": 0.0, "reinforced": false },
            "peck_left": { "reinforced": false },
            "timeout": { "p_reward": timeout_reward, "reinforced": reinforced }
        }
    }])
}

pub fn stimset(stimuli: Value) -> StimulusSet {
    serde_json::from_value(json!({
        "stimulus_root": "/stimuli",
        "experiment": "gng-test",
        "stimuli": stimuli,
    }))
    .unwrap()
}

pub fn params() -> ExperimentParams {
    ExperimentParams {
        subject: "b101".into(),
        user: "tester".into(),
        ..ExperimentParams::default()
    }
}

pub fn rig(
    stimuli: Value,
    params: ExperimentParams,
    properties: PropertyTable,
    feeders: Vec<String>,
) -> (TrialController, Rig) {
    let corpus = StimulusCorpus::new(stimset(stimuli), "unused", StdRng::seed_from_u64(11)).unwrap();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (states_tx, states_rx) = broadcast::channel(256);
    let recorder = Arc::new(Recorder {
        journal: Mutex::new(Vec::new()),
        feeders,
    });
    let controller = TrialController::new(
        params,
        corpus,
        Collaborators {
            events: Box::new(events_rx),
            apparatus: recorder.clone(),
            properties: Arc::new(properties),
            log: recorder.clone(),
            publisher: Arc::new(states_tx),
        },
        StdRng::seed_from_u64(5),
    );
    (
        controller,
        Rig {
            events: events_tx,
            states: states_rx,
            recorder,
        },
    )
}
