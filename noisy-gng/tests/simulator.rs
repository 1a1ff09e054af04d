use std::time::Duration;

use apparatus::{ApparatusBus, ApparatusEvent, HOUSE_LIGHTS, KEYS};
use noisy_gng::{SimulatedApparatus, listen_keys};
use serde_json::json;
use trial::Apparatus;

#[tokio::test(start_paused = true)]
async fn hopper_comes_down_after_interval() {
    let bus = ApparatusBus::default();
    let mut events = bus.subscribe_events();
    let sim = SimulatedApparatus::spawn(bus.clone(), vec!["feeder_left".into()]);
    tokio::task::yield_now().await;

    sim.change_state("feeder_left", json!({ "feeding": true, "interval": 4000 }))
        .await;
    let start = tokio::time::Instant::now();
    let evt = events.recv().await.unwrap();
    assert_eq!(evt, ApparatusEvent::new("feeder_left", json!({ "feeding": false })));
    assert!(start.elapsed() >= Duration::from_millis(4000));
}

#[tokio::test]
async fn reports_configured_feeders() {
    let sim = SimulatedApparatus::spawn(ApparatusBus::default(), vec!["a".into(), "b".into()]);
    assert_eq!(sim.feeders().await.unwrap(), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn operator_lines_become_events() {
    let bus = ApparatusBus::default();
    let mut events = bus.subscribe_events();
    let input: &[u8] = b"peck_center\n\nnight\n  day \npeck_left\n";
    listen_keys(input, bus.clone()).await;

    let got: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert_eq!(
        got,
        vec![
            ApparatusEvent::new(KEYS, json!({ "peck_center": true })),
            ApparatusEvent::new(HOUSE_LIGHTS, json!({ "daytime": false })),
            ApparatusEvent::new(HOUSE_LIGHTS, json!({ "daytime": true })),
            ApparatusEvent::new(KEYS, json!({ "peck_left": true })),
        ]
    );
}
