use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use apparatus::ApparatusBus;
use clap::Parser;
use dotenvy::dotenv;
use noisy_gng::{
    BusStatePublisher, HEARTBEAT_INTERVAL, JsonlTrialLog, SimulatedApparatus, TracingTrialLog,
    init_logging, listen_keys, settings, spawn_heartbeat,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::BufReader;
use tokio::sync::broadcast;
use tracing::{error, info};
use trial::{
    Collaborators, ExperimentParams, PropertyTable, StimulusCorpus, TrialController, TrialLog,
    check_subject,
};

/// Run a GNG task for noise invariance.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Subject identifier
    subject: String,
    /// Person to notify about this subject
    user: String,
    /// Stimulus set (JSON)
    stimset: PathBuf,
    /// Response window duration (in ms)
    #[arg(long, default_value_t = trial::params::DEFAULT_RESPONSE_WINDOW)]
    response_window: u64,
    /// Feeding duration for reinforced trials (in ms)
    #[arg(long, default_value_t = trial::params::DEFAULT_FEED_DURATION)]
    feed_duration: u64,
    /// Time between the decision to feed and raising the hopper (in ms)
    #[arg(long, default_value_t = 0)]
    feed_delay: u64,
    /// Draw stimuli with replacement (the default)
    #[arg(long, overrides_with = "no_replace")]
    replace: bool,
    /// Draw stimuli without replacement
    #[arg(long, overrides_with = "replace")]
    no_replace: bool,
    /// Stimulus property table (JSON, durations in seconds)
    #[arg(long)]
    stim_props: PathBuf,
    /// Append trial records to this JSON-lines file
    #[arg(long)]
    trial_log: Option<PathBuf>,
    /// Seed for the random source
    #[arg(long)]
    seed: Option<u64>,
    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn replacing(&self) -> bool {
        self.replace || !self.no_replace
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let (log_lines, _) = broadcast::channel(256);
    init_logging(cli.debug, log_lines);

    let mut params = ExperimentParams {
        subject: check_subject(&cli.subject)?,
        user: cli.user.clone(),
        response_window: cli.response_window,
        feed_duration: cli.feed_duration,
        feed_delay: cli.feed_delay,
        replace: cli.replacing(),
        ..ExperimentParams::default()
    };

    let mut rng = match settings::seed(cli.seed) {
        Some(seed) => {
            info!(seed, "seeding random source");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let corpus = StimulusCorpus::load(&cli.stimset, StdRng::from_rng(&mut rng)?)?;
    corpus
        .validate()
        .with_context(|| format!("refusing to run {}", cli.stimset.display()))?;
    params.merge(corpus.parameters())?;
    let properties = PropertyTable::load(&cli.stim_props)?;
    info!(stimuli = properties.len(), "loaded stimulus properties");

    let bus = ApparatusBus::default();
    let apparatus = Arc::new(SimulatedApparatus::spawn(bus.clone(), params.hoppers.clone()));
    tokio::spawn(listen_keys(BufReader::new(tokio::io::stdin()), bus.clone()));

    let log: Arc<dyn TrialLog> = match settings::trial_log(cli.trial_log) {
        Some(path) => {
            info!(path = %path.display(), "writing trial data");
            Arc::new(JsonlTrialLog::open(&path).await?)
        }
        None => Arc::new(TracingTrialLog),
    };

    let mut controller = TrialController::new(
        params,
        corpus,
        Collaborators {
            events: Box::new(bus.subscribe_events()),
            apparatus,
            properties: Arc::new(properties),
            log: log.clone(),
            publisher: Arc::new(BusStatePublisher::new(bus.clone())),
        },
        rng,
    );
    info!(meta = %controller.meta(), experiment = %controller.corpus().experiment(), "starting");
    let heartbeat = spawn_heartbeat(log, controller.params().subject.clone(), HEARTBEAT_INTERVAL);

    let finished = tokio::select! {
        res = controller.run() => Some(res),
        _ = shutdown_signal() => None,
    };
    heartbeat.abort();
    controller.shutdown().await;
    if let Some(Err(e)) = finished {
        error!(error = %e, "trial loop stopped");
        return Err(e.into());
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
