use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Value, json};
use tokio::time::Instant;

use super::*;
use crate::config::{MunicipalityId, MunicipalityIdInput, PollConfig, validate_instance};
use crate::error::FetchErrorKind;
use crate::publisher::FixedClock;
use crate::upstream::Document;

const MINUTE: Duration = Duration::from_secs(60);

#[derive(Clone)]
enum Step {
    Doc(Value),
    Fail(u16),
    Slow(Duration, Value),
}

/// Replays a script of upstream answers; the last step repeats
struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap()
        }
    }

    /// Minutes between `origin` and each fetch
    fn call_minutes(&self, origin: Instant) -> Vec<u64> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.duration_since(origin).as_secs() / 60)
            .collect()
    }
}

#[async_trait::async_trait]
impl StationSource for ScriptedSource {
    async fn fetch(&self, _municipality_id: MunicipalityId) -> Result<Document> {
        self.calls.lock().unwrap().push(Instant::now());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let result = match self.next_step() {
            Step::Doc(doc) => Ok(doc),
            Step::Fail(status) => Err(EessError::http_status(status, "http://upstream.test/4284")),
            Step::Slow(delay, doc) => {
                tokio::time::sleep(delay).await;
                Ok(doc)
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn doc(stations: &[(&str, &str)]) -> Value {
    let list: Vec<Value> = stations
        .iter()
        .map(|(name, price)| {
            json!({
                "Rótulo": name,
                "Latitud": "40,1",
                "Longitud (WGS84)": "-3,7",
                "Dirección": "X",
                "Horario": "L-D:24H",
                "Precio Gasolina 95 E5": price,
            })
        })
        .collect();
    json!({ "ListaEESSPrecio": list, "ResultadoConsulta": "OK" })
}

fn instance() -> InstanceConfig {
    validate_instance("Madrid", &MunicipalityIdInput::Number(4284), "G95").unwrap()
}

async fn start(
    source: &Arc<ScriptedSource>,
    clock: &Arc<FixedClock>,
) -> Result<PollerHandle> {
    PricePoller::start(
        instance(),
        source.clone(),
        clock.clone(),
        PollerSettings::default(),
    )
    .await
}

async fn wait_status(handle: &PollerHandle, f: impl FnMut(&PollerStatus) -> bool) {
    let mut rx = handle.subscribe_status();
    rx.wait_for(f).await.unwrap();
}

fn last_update(handle: &PollerHandle) -> String {
    handle.state().attributes().unwrap().last_update.clone()
}

#[tokio::test(start_paused = true)]
async fn first_refresh_publishes_before_start_returns() {
    let source = ScriptedSource::new(vec![Step::Doc(doc(&[("A", "1,459")]))]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));

    let mut handle = start(&source, &clock).await.unwrap();

    assert_eq!(handle.state().price(), Some(1.459));
    assert_eq!(last_update(&handle), "2026-10-18 10:00:00");
    let status = handle.status();
    assert_eq!(status.state, PollerState::Ready);
    assert_eq!(status.total_cycles, 1);
    assert_eq!(status.interval_secs, 1800);
    assert_eq!(status.last_success.as_deref(), Some("2026-10-18 10:00:00"));
    assert!(handle.is_running());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn startup_failure_returns_error() {
    let source = ScriptedSource::new(vec![Step::Fail(503)]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));

    let err = start(&source, &clock).await.unwrap_err();
    assert_eq!(err.fetch_kind(), Some(FetchErrorKind::HttpStatus));
    assert!(err.to_string().contains("503"));
}

#[tokio::test(start_paused = true)]
async fn failed_cycle_keeps_previous_result() {
    let source = ScriptedSource::new(vec![
        Step::Doc(doc(&[("A", "1,50")])),
        Step::Fail(500),
    ]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let mut handle = start(&source, &clock).await.unwrap();

    clock.advance(chrono::Duration::minutes(30));
    wait_status(&handle, |s| s.failed_cycles == 1).await;

    assert_eq!(handle.state().price(), Some(1.50));
    assert_eq!(last_update(&handle), "2026-10-18 10:00:00");
    let status = handle.status();
    assert_eq!(status.total_cycles, 2);
    assert!(status.last_error.unwrap().contains("500"));
    assert_eq!(status.last_success.as_deref(), Some("2026-10-18 10:00:00"));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn empty_result_publishes_no_data() {
    let source = ScriptedSource::new(vec![
        Step::Doc(doc(&[("A", "1,50")])),
        Step::Doc(doc(&[("A", "")])),
    ]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let mut handle = start(&source, &clock).await.unwrap();
    assert!(!handle.state().is_no_data());

    let mut published = handle.subscribe();
    published.wait_for(|s| s.is_no_data()).await.unwrap();
    assert_eq!(handle.status().total_cycles, 2);
    assert!(handle.state().is_no_data());
    assert_eq!(handle.status().failed_cycles, 0);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn ticks_stay_on_schedule_and_overruns_are_skipped() {
    let source = ScriptedSource::new(vec![
        Step::Doc(doc(&[("A", "1,50")])),
        Step::Slow(45 * MINUTE, doc(&[("A", "1,49")])),
        Step::Doc(doc(&[("A", "1,48")])),
    ]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let origin = Instant::now();
    let mut handle = start(&source, &clock).await.unwrap();

    wait_status(&handle, |s| s.total_cycles == 3).await;

    // The 60 minute tick fell inside the slow cycle
    assert_eq!(source.call_minutes(origin), vec![0, 30, 90]);
    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(handle.status().overrun_count, 1);
    assert_eq!(handle.state().price(), Some(1.48));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_first_refresh_skips_the_elapsed_tick() {
    let source = ScriptedSource::new(vec![
        Step::Slow(45 * MINUTE, doc(&[("A", "1,50")])),
        Step::Doc(doc(&[("A", "1,49")])),
    ]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let origin = Instant::now();
    let mut handle = start(&source, &clock).await.unwrap();

    // The 30 minute tick fell inside the first refresh
    wait_status(&handle, |s| s.total_cycles == 2).await;
    assert_eq!(source.call_minutes(origin), vec![0, 60]);
    assert_eq!(handle.status().overrun_count, 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_in_flight_fetch() {
    let source = ScriptedSource::new(vec![
        Step::Doc(doc(&[("A", "1,50")])),
        Step::Slow(60 * MINUTE, doc(&[("A", "0,99")])),
    ]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let mut handle = start(&source, &clock).await.unwrap();

    wait_status(&handle, |s| s.state == PollerState::Polling).await;
    handle.shutdown().await;

    assert_eq!(handle.state().price(), Some(1.50));
    let status = handle.status();
    assert_eq!(status.state, PollerState::Stopped);
    assert_eq!(status.failed_cycles, 1);
    assert_eq!(status.last_error.as_deref(), Some("Cycle cancelled"));
    assert!(!handle.is_running());
    assert!(!handle.request_refresh());

    // Second call is a no-op
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_runs_out_of_schedule() {
    let source = ScriptedSource::new(vec![
        Step::Doc(doc(&[("A", "1,50")])),
        Step::Doc(doc(&[("A", "1,40")])),
    ]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let origin = Instant::now();
    let mut handle = start(&source, &clock).await.unwrap();

    assert!(handle.request_refresh());
    wait_status(&handle, |s| s.total_cycles == 2).await;

    assert_eq!(handle.state().price(), Some(1.40));
    assert_eq!(source.call_minutes(origin), vec![0, 0]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn refresh_requests_during_a_cycle_coalesce() {
    let source = ScriptedSource::new(vec![
        Step::Doc(doc(&[("A", "1,50")])),
        Step::Slow(10 * MINUTE, doc(&[("A", "1,45")])),
        Step::Doc(doc(&[("A", "1,40")])),
    ]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let mut handle = start(&source, &clock).await.unwrap();

    assert!(handle.request_refresh());
    wait_status(&handle, |s| s.state == PollerState::Polling).await;
    for _ in 0..3 {
        assert!(handle.request_refresh());
    }
    wait_status(&handle, |s| s.total_cycles == 3).await;

    tokio::time::sleep(MINUTE).await;
    assert_eq!(handle.status().total_cycles, 3);
    assert_eq!(source.calls.lock().unwrap().len(), 3);
    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn last_update_never_goes_backwards() {
    let source = ScriptedSource::new(vec![Step::Doc(doc(&[("A", "1,50")]))]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let mut handle = start(&source, &clock).await.unwrap();

    clock.set(at(9, 0));
    assert!(handle.request_refresh());
    wait_status(&handle, |s| s.total_cycles == 2).await;
    assert_eq!(last_update(&handle), "2026-10-18 10:00:00");

    clock.set(at(11, 0));
    assert!(handle.request_refresh());
    wait_status(&handle, |s| s.total_cycles == 3).await;
    assert_eq!(last_update(&handle), "2026-10-18 11:00:00");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_task() {
    let source = ScriptedSource::new(vec![Step::Doc(doc(&[("A", "1,50")]))]);
    let clock = Arc::new(FixedClock::new(at(10, 0)));
    let handle = start(&source, &clock).await.unwrap();

    let mut status = handle.subscribe_status();
    drop(handle);
    status
        .wait_for(|s| s.state == PollerState::Stopped)
        .await
        .unwrap();
}

#[test]
fn settings_follow_poll_config() {
    assert_eq!(PollerSettings::default().interval, DEFAULT_POLL_INTERVAL);
    let settings = PollerSettings::from_config(&PollConfig { interval_secs: 600 });
    assert_eq!(settings.interval, Duration::from_secs(600));
    assert_eq!(
        PollerSettings::default()
            .with_interval(MINUTE)
            .interval,
        MINUTE
    );
}
