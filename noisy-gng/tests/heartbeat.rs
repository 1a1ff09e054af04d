use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use noisy_gng::spawn_heartbeat;
use trial::{Comment, TrialLog, TrialRecord};

#[derive(Default)]
struct Collect(Mutex<Vec<TrialRecord>>);

#[async_trait]
impl TrialLog for Collect {
    async fn record(&self, record: TrialRecord) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(record);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn beats_once_per_interval() {
    let log = Arc::new(Collect::default());
    let handle = spawn_heartbeat(log.clone(), "b7".into(), Duration::from_secs(60));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(log.0.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_secs(100)).await;
    let beats = log.0.lock().unwrap().clone();
    assert_eq!(beats.len(), 2);
    assert_eq!(
        beats[0],
        TrialRecord::Comment(Comment::Heartbeat {
            subject: "b7".into()
        })
    );
    handle.abort();
}
