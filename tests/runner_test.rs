use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crazyflie_hover::flight::{FlightPlan, PhaseKind, Setpoint, DEFAULT_PERIOD};
use crazyflie_hover::runner::{FlightRunner, FlightTarget, FlightWorker, SetpointSink};
use crazyflie_hover::{Error, Result};
use tokio::time::Instant;

/// Records every setpoint with the time it was sent, optionally failing after a number of sends
#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(Instant, Setpoint)>>,
    disconnects: Mutex<Vec<Instant>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    fn failing_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Default::default()
        }
    }

    fn setpoints(&self) -> Vec<Setpoint> {
        self.sent.lock().unwrap().iter().map(|(_, sp)| *sp).collect()
    }
}

#[async_trait]
impl SetpointSink for RecordingSink {
    async fn send_setpoint(&self, setpoint: Setpoint) -> Result<()> {
        let mut sent = self.sent.lock().unwrap();
        if Some(sent.len()) == self.fail_after {
            return Err(Error::Disconnected);
        }
        sent.push((Instant::now(), setpoint));
        Ok(())
    }
}

#[async_trait]
impl FlightTarget for RecordingSink {
    async fn disconnect(&self) {
        self.disconnects.lock().unwrap().push(Instant::now());
    }
}

#[tokio::test(start_paused = true)]
async fn sends_the_whole_plan_in_order() {
    let plan = FlightPlan::hover_demo(DEFAULT_PERIOD);
    let runner = FlightRunner::new(RecordingSink::default());

    let report = runner.run(&plan).await;

    assert!(report.is_complete());
    assert_eq!(
        report.completed,
        vec![
            PhaseKind::Unlock,
            PhaseKind::TakeOff,
            PhaseKind::Hover,
            PhaseKind::Advance,
            PhaseKind::Land,
            PhaseKind::ZeroOut,
        ]
    );

    let sent = runner.into_inner().setpoints();
    assert_eq!(sent, plan.setpoints().collect::<Vec<_>>());
    assert_eq!(report.sent, sent.len());
    assert_eq!(sent.first(), Some(&Setpoint::ZERO));
    assert_eq!(sent.last(), Some(&Setpoint::ZERO));
}

#[tokio::test(start_paused = true)]
async fn setpoints_are_one_period_apart() {
    let period = Duration::from_millis(100);
    let plan = FlightPlan::hover_demo(period);
    let sink = Arc::new(RecordingSink::default());
    let start = Instant::now();

    FlightRunner::new(sink.clone()).run(&plan).await;

    let times: Vec<Instant> = sink.sent.lock().unwrap().iter().map(|(t, _)| *t).collect();
    assert_eq!(times[0], start);
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], period);
    }
    // The hold after the final zero setpoint lets it leave before the link is closed
    assert_eq!(Instant::now() - start, plan.duration());
}

#[tokio::test(start_paused = true)]
async fn thrust_profile_per_phase() {
    let plan = FlightPlan::hover_demo(DEFAULT_PERIOD);
    let runner = FlightRunner::new(RecordingSink::default());
    runner.run(&plan).await;
    let thrusts: Vec<u16> = runner.into_inner().setpoints().iter().map(|sp| sp.thrust).collect();

    let (unlock, rest) = thrusts.split_at(1);
    let (take_off, rest) = rest.split_at(5);
    let (hover, rest) = rest.split_at(32);
    let (advance, rest) = rest.split_at(5);
    let (land, zero_out) = rest.split_at(28);

    assert_eq!(unlock, [0]);
    assert!(take_off.iter().all(|t| *t == 40000));
    assert_eq!(&hover[..4], [32000, 35000, 32000, 35000]);
    assert_eq!(advance, [35000, 35000, 35000, 35000, 40000]);
    let expected_land: Vec<u16> = (0..14).flat_map(|i| [33000 - 100 * i; 2]).collect();
    assert_eq!(land, expected_land.as_slice());
    assert_eq!(zero_out, [0]);
}

#[tokio::test(start_paused = true)]
async fn skipping_the_advance_phase() {
    let plan = FlightPlan::hover_demo(DEFAULT_PERIOD).without(PhaseKind::Advance);
    let runner = FlightRunner::new(RecordingSink::default());

    let report = runner.run(&plan).await;

    assert!(!report.completed.contains(&PhaseKind::Advance));
    assert_eq!(report.sent, 1 + 5 + 32 + 28 + 1);
    // Hover is directly followed by landing
    let sent = runner.into_inner().setpoints();
    assert_eq!(sent[37].thrust, 35000);
    assert_eq!(sent[38].thrust, 33000);
}

#[tokio::test(start_paused = true)]
async fn stops_at_the_first_failed_send() {
    let plan = FlightPlan::hover_demo(DEFAULT_PERIOD);
    // Unlock and take off go through, the link disappears at the start of hover
    let runner = FlightRunner::new(RecordingSink::failing_after(6));

    let report = runner.run(&plan).await;

    assert!(!report.is_complete());
    assert_eq!(report.sent, 6);
    assert_eq!(report.completed, vec![PhaseKind::Unlock, PhaseKind::TakeOff]);
    assert!(matches!(report.aborted, Some((PhaseKind::Hover, Error::Disconnected))));
    assert_eq!(runner.into_inner().setpoints().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn worker_disconnects_once_after_the_last_hold() {
    let period = Duration::from_millis(100);
    let plan = FlightPlan::hover_demo(period);
    let target = Arc::new(RecordingSink::default());
    let start = Instant::now();

    let report = FlightWorker::start(target.clone(), plan.clone()).join().await.unwrap();

    assert!(report.is_complete());
    let disconnects = target.disconnects.lock().unwrap().clone();
    assert_eq!(disconnects.len(), 1);

    let (last_sent, last_setpoint) = *target.sent.lock().unwrap().last().unwrap();
    assert_eq!(last_setpoint, Setpoint::ZERO);
    assert_eq!(disconnects[0], last_sent + period);
    assert_eq!(disconnects[0], start + plan.duration());
}

#[tokio::test(start_paused = true)]
async fn worker_disconnects_after_an_aborted_flight() {
    let period = Duration::from_millis(100);
    let target = Arc::new(RecordingSink::failing_after(6));
    let start = Instant::now();

    let report = FlightWorker::start(target.clone(), FlightPlan::hover_demo(period))
        .join()
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.sent, 6);
    let disconnects = target.disconnects.lock().unwrap().clone();
    assert_eq!(disconnects, vec![start + period * 6]);
}
