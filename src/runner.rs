//! # Flight runner
//!
//! Executes a [FlightPlan] by sending each setpoint to a [SetpointSink] and holding for the step duration. The run
//! is strictly sequential and has no feedback: the only way it ends early is a failed send, which happens when the
//! link to the Crazyflie is gone.
//!
//! [FlightWorker] runs a plan on a background task against a [FlightTarget], usually a connected [Crazyflie], and
//! disconnects it once the plan is done, so that the task that handled the connection is never blocked by the flight.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::flight::{FlightPlan, PhaseKind, Setpoint};
use crate::{Crazyflie, Error, Result};

/// Anything that accepts RPYT setpoints
///
/// Implemented by the [Commander](crate::subsystems::commander::Commander).
#[async_trait]
pub trait SetpointSink: Send + Sync {
    /// Send one setpoint
    async fn send_setpoint(&self, setpoint: Setpoint) -> Result<()>;
}

#[async_trait]
impl<T: SetpointSink + ?Sized> SetpointSink for Arc<T> {
    async fn send_setpoint(&self, setpoint: Setpoint) -> Result<()> {
        (**self).send_setpoint(setpoint).await
    }
}

/// A setpoint receiver that can be disconnected once the flight is over
///
/// Implemented by [Crazyflie].
#[async_trait]
pub trait FlightTarget: SetpointSink {
    /// Close the connection
    async fn disconnect(&self);
}

#[async_trait]
impl SetpointSink for Crazyflie {
    async fn send_setpoint(&self, setpoint: Setpoint) -> Result<()> {
        self.commander.send_setpoint(setpoint).await
    }
}

#[async_trait]
impl FlightTarget for Crazyflie {
    async fn disconnect(&self) {
        Crazyflie::disconnect(self).await
    }
}

/// Outcome of a flight run
#[derive(Debug)]
pub struct FlightReport {
    /// Number of setpoints successfully sent
    pub sent: usize,
    /// Phases flown to completion, in order
    pub completed: Vec<PhaseKind>,
    /// Phase that was running when a send failed, with the error
    pub aborted: Option<(PhaseKind, Error)>,
}

impl FlightReport {
    /// True if every phase of the plan was flown
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Sends a flight plan, phase by phase
pub struct FlightRunner<S> {
    sink: S,
}

impl<S: SetpointSink> FlightRunner<S> {
    /// Create a runner sending to `sink`
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Fly the plan
    ///
    /// Stops at the first failed send and reports it in [FlightReport::aborted].
    pub async fn run(&self, plan: &FlightPlan) -> FlightReport {
        let mut report = FlightReport {
            sent: 0,
            completed: Vec::new(),
            aborted: None,
        };

        for phase in plan.phases() {
            log::info!("Phase {} ({} setpoints)", phase.kind, phase.len());

            for step in &phase.steps {
                if let Err(e) = self.sink.send_setpoint(step.setpoint).await {
                    log::warn!("Phase {} aborted after {} setpoints: {}", phase.kind, report.sent, e);
                    report.aborted = Some((phase.kind, e));
                    return report;
                }
                report.sent += 1;
                log::trace!("{:?}", step.setpoint);

                sleep(step.hold).await;
            }

            report.completed.push(phase.kind);
        }

        report
    }

    /// Consume the runner and return the sink
    pub fn into_inner(self) -> S {
        self.sink
    }
}

/// Handle on a flight running in the background
///
/// The worker owns a reference to the target and disconnects it when the plan is done, whether it completed or not.
pub struct FlightWorker {
    task: JoinHandle<FlightReport>,
}

impl FlightWorker {
    /// Start flying `plan` on a new task
    pub fn start<T: FlightTarget + 'static>(target: Arc<T>, plan: FlightPlan) -> Self {
        let task = tokio::spawn(async move {
            let report = FlightRunner::new(target.clone()).run(&plan).await;

            target.disconnect().await;
            report
        });

        Self { task }
    }

    /// Wait for the flight to end
    pub async fn join(self) -> Result<FlightReport> {
        Ok(self.task.await?)
    }
}
