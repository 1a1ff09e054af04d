//! The trial loop.
//!
//! [`TrialController`] is a finite state machine with one current phase and
//! at most one pending wait. [`TrialController::run`] repeatedly calls
//! [`TrialController::step`], each step running one phase to completion and
//! returning the next. A trial goes
//!
//! ```text
//! AwaitingInit -> PresentingStimulus -> Interrupted  -> PresentingStimulus ...
//!                                    -> PostStimulus -> Feeding -> Intertrial
//!                                                    -> Intertrial -> AwaitingInit
//! ```
//!
//! with `Sleeping` entered from `AwaitingInit` when the house lights report
//! night.

use std::sync::Arc;

use apparatus::{APLAYER, EXPERIMENT, HOUSE_LIGHTS, KEYS};
use chrono::Utc;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::corpus::{StimulusCorpus, StimulusSpec};
use crate::error::{ConfigurationError, TrialError};
use crate::outcome::{Comment, Response, TIMEOUT, TrialOutcomeRecord, TrialRecord, TrialResult, decide};
use crate::params::ExperimentParams;
use crate::state::{Phase, TrialState};
use crate::traits::{Apparatus, EventSource, StatePublisher, StimulusProperties, TrialLog};
use crate::wait::{Waited, wait_for, wait_until};

/// Everything the controller talks to.
pub struct Collaborators {
    pub events: Box<dyn EventSource>,
    pub apparatus: Arc<dyn Apparatus>,
    pub properties: Arc<dyn StimulusProperties>,
    pub log: Arc<dyn TrialLog>,
    pub publisher: Arc<dyn StatePublisher>,
}

/// Phase the dispatch loop runs next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Start a new trial and wait for the subject to initiate it.
    Init,
    /// Wait for initiation again without starting a new trial.
    Resume,
    Present,
    Feed,
    Intertrial,
    Sleep,
}

/// Drives trials for one experiment.
pub struct TrialController {
    params: ExperimentParams,
    corpus: StimulusCorpus,
    events: Box<dyn EventSource>,
    apparatus: Arc<dyn Apparatus>,
    properties: Arc<dyn StimulusProperties>,
    log: Arc<dyn TrialLog>,
    publisher: Arc<dyn StatePublisher>,
    state: TrialState,
    rng: StdRng,
    /// The last presentation was cut short and may still be playing.
    player_busy: bool,
}

impl TrialController {
    pub fn new(
        params: ExperimentParams,
        corpus: StimulusCorpus,
        collaborators: Collaborators,
        rng: StdRng,
    ) -> Self {
        let Collaborators {
            events,
            apparatus,
            properties,
            log,
            publisher,
        } = collaborators;
        Self {
            params,
            corpus,
            events,
            apparatus,
            properties,
            log,
            publisher,
            state: TrialState::default(),
            rng,
            player_busy: false,
        }
    }

    pub fn state(&self) -> &TrialState {
        &self.state
    }

    pub fn params(&self) -> &ExperimentParams {
        &self.params
    }

    pub fn corpus(&self) -> &StimulusCorpus {
        &self.corpus
    }

    /// Metadata descriptor for the published state.
    pub fn meta(&self) -> Value {
        TrialState::meta()
    }

    /// Prepare the apparatus and emit the starting record.
    ///
    /// Fails if a stimulus has no known duration or no hopper is available.
    pub async fn start(&mut self) -> Result<(), TrialError> {
        if let Some(stim) = self
            .corpus
            .stimuli()
            .iter()
            .find(|s| s.frequency > 0 && self.properties.duration(&s.name).is_none())
        {
            return Err(ConfigurationError::UnknownStimulus(stim.name.to_string()).into());
        }

        match self.apparatus.feeders().await {
            Ok(feeders) if !feeders.is_empty() => {
                info!(?feeders, "available feeders");
                self.params.hoppers = feeders;
            }
            Ok(_) => debug!(hoppers = ?self.params.hoppers, "using configured hoppers"),
            Err(e) => warn!(error = %e, "could not list feeders; using configured hoppers"),
        }
        if self.params.hoppers.is_empty() {
            return Err(ConfigurationError::NoHoppers.into());
        }

        let params = serde_json::to_value(&self.params).map_err(ConfigurationError::Parameters)?;
        self.apparatus.change_state(EXPERIMENT, params.clone()).await;
        self.emit(Comment::Starting {
            subject: self.params.subject.clone(),
            experiment: self.corpus.experiment().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            params,
            stimset: self.corpus.stimuli().to_vec(),
        })
        .await;
        Ok(())
    }

    /// Run trials until an error occurs.
    pub async fn run(&mut self) -> Result<(), TrialError> {
        self.start().await?;
        let mut step = Step::Init;
        loop {
            step = self.step(step).await?;
        }
    }

    /// Run one phase and return the one that follows it.
    pub async fn step(&mut self, step: Step) -> Result<Step, TrialError> {
        match step {
            Step::Init => self.await_init().await,
            Step::Resume => self.resume().await,
            Step::Present => self.present_stimulus().await,
            Step::Feed => self.feed().await,
            Step::Intertrial => self.intertrial().await,
            Step::Sleep => self.sleeping().await,
        }
    }

    /// Emit the stopping record, then put the apparatus back at rest.
    pub async fn shutdown(&mut self) {
        info!(trial = self.state.trial, "stopping");
        self.emit(Comment::Stopping {
            subject: self.params.subject.clone(),
            experiment: self.corpus.experiment().to_string(),
        })
        .await;
        self.apparatus
            .change_state(APLAYER, json!({ "playing": false }))
            .await;
        for hopper in &self.params.hoppers {
            self.apparatus
                .change_state(hopper, json!({ "feeding": false }))
                .await;
        }
    }

    async fn await_init(&mut self) -> Result<Step, TrialError> {
        self.state.trial += 1;
        self.state.last_trial = Some(Utc::now());
        self.enter(Phase::AwaitingInit);
        self.wait_for_init().await
    }

    async fn resume(&mut self) -> Result<Step, TrialError> {
        self.enter(Phase::AwaitingInit);
        self.wait_for_init().await
    }

    async fn wait_for_init(&mut self) -> Result<Step, TrialError> {
        let init_key = self.params.init_key.clone();
        wait_until(self.events.as_mut(), |event| {
            if event.is_from(KEYS) && event.is_set(&init_key) {
                Some(Step::Present)
            } else if event.is_from(HOUSE_LIGHTS) && event.flag("daytime") == Some(false) {
                Some(Step::Sleep)
            } else {
                None
            }
        })
        .await
    }

    async fn sleeping(&mut self) -> Result<Step, TrialError> {
        info!("lights out; sleeping until daytime");
        self.enter(Phase::Sleeping);
        wait_until(self.events.as_mut(), |event| {
            (event.is_from(HOUSE_LIGHTS) && event.flag("daytime") == Some(true)).then_some(())
        })
        .await?;
        info!("daytime");
        Ok(Step::Resume)
    }

    async fn present_stimulus(&mut self) -> Result<Step, TrialError> {
        let stim = self.corpus.next(self.params.replace).clone();
        debug!(stimulus = %stim.name, "next stimulus");
        let duration = self
            .properties
            .duration(&stim.name)
            .ok_or_else(|| ConfigurationError::UnknownStimulus(stim.name.to_string()))?;

        self.state.stimulus = Some(stim.clone());
        self.enter(Phase::PresentingStimulus);
        if self.player_busy {
            self.apparatus
                .change_state(APLAYER, json!({ "playing": false }))
                .await;
        }
        self.apparatus
            .change_state(
                APLAYER,
                json!({
                    "playing": true,
                    "stimulus": stim.name,
                    "root": self.corpus.root().display().to_string(),
                }),
            )
            .await;

        let window = duration + self.params.response_window();
        let waited = wait_for(self.events.as_mut(), window, |event| {
            if !event.is_from(KEYS) {
                return None;
            }
            stim.responses
                .keys()
                .find(|key| key.as_str() != TIMEOUT && event.is_set(key))
                .cloned()
        })
        .await?;

        self.state.stimulus = None;
        let (response, rtime) = match waited {
            Waited::Matched { value, elapsed } => {
                self.enter(Phase::Interrupted);
                (Response::Key(value), Some(elapsed))
            }
            Waited::TimedOut { .. } => {
                self.enter(Phase::PostStimulus);
                (Response::Timeout, None)
            }
        };
        self.player_busy = rtime.is_some();
        Ok(self.resolve(&stim, response, rtime).await)
    }

    /// Decide the outcome of a presentation and record it.
    async fn resolve(
        &mut self,
        stim: &StimulusSpec,
        response: Response,
        rtime: Option<Duration>,
    ) -> Step {
        let entry = stim.responses.get(response.as_str());
        if entry.is_none() && response == Response::Timeout {
            warn!(stimulus = %stim.name, "no timeout response configured; not reinforcing");
        }
        let reinforced = entry.is_some_and(|r| r.reinforced);
        let draw: f64 = self.rng.gen_range(0.0..1.0);
        let result = decide(&response, entry, draw);
        debug!(
            response = %response,
            p_feed = entry.map_or(0.0, |r| r.reward_probability()),
            draw,
            ?result,
            "outcome"
        );

        self.emit(TrialOutcomeRecord {
            trial: self.state.trial,
            experiment: self.corpus.experiment().to_string(),
            subject: self.params.subject.clone(),
            stimulus: stim.name.clone(),
            response: response.as_str().to_string(),
            reinforced,
            result,
            rtime: rtime.map(|d| d.as_millis() as u64),
        })
        .await;

        match result {
            TrialResult::Interrupt => Step::Present,
            TrialResult::Feed => Step::Feed,
            TrialResult::NoFeed => Step::Intertrial,
        }
    }

    async fn feed(&mut self) -> Result<Step, TrialError> {
        let hopper = self
            .params
            .hoppers
            .choose(&mut self.rng)
            .cloned()
            .ok_or(ConfigurationError::NoHoppers)?;
        info!(%hopper, duration = self.params.feed_duration, "feeding");
        self.enter(Phase::Feeding);

        // The raise is part of this phase: dropping the phase drops it too.
        let command = json!({ "feeding": true, "interval": self.params.feed_duration });
        let delay = self.params.feed_delay();
        let apparatus = &self.apparatus;
        let raise = async {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            apparatus.change_state(&hopper, command).await;
        };
        let lowered = wait_until(self.events.as_mut(), |event| {
            (event.is_from(&hopper) && event.flag("feeding") == Some(false)).then_some(())
        });
        let ((), lowered) = tokio::join!(raise, lowered);
        lowered?;
        self.state.last_feed = Some(Utc::now());
        self.publish();
        Ok(Step::Intertrial)
    }

    async fn intertrial(&mut self) -> Result<Step, TrialError> {
        let iti = self.params.min_iti();
        debug!(?iti, "intertrial");
        self.enter(Phase::Intertrial);
        tokio::time::sleep(iti).await;
        Ok(Step::Init)
    }

    /// Switch phase. Events that arrived while no wait was active are
    /// dropped so they cannot satisfy the next wait.
    fn enter(&mut self, phase: Phase) {
        self.events.discard_pending();
        self.state.phase = Some(phase);
        self.publish();
    }

    fn publish(&self) {
        self.publisher.publish(&self.state);
    }

    async fn emit(&self, record: impl Into<TrialRecord>) {
        if let Err(e) = self.log.record(record.into()).await {
            warn!(error = %e, "trial record not delivered");
        }
    }
}
