//! # Scripted flight plan
//!
//! A flight plan is an open-loop script: an ordered list of [Phase], each made of [Step]s. A step is one setpoint
//! followed by a hold time during which nothing else is sent. There is no feedback, the Crazyflie simply receives the
//! setpoints at the scripted pace.
//!
//! [FlightPlan::hover_demo()] builds the take-off, hover, advance and land sequence flown by the `hover` binary:
//! ```
//! # use std::time::Duration;
//! use crazyflie_hover::flight::{FlightPlan, PhaseKind};
//!
//! let plan = FlightPlan::hover_demo(Duration::from_millis(100));
//! assert_eq!(plan.phase(PhaseKind::TakeOff).unwrap().len(), 5);
//! ```

use std::fmt;
use std::time::Duration;

/// Period between two setpoints in the demo sequence
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

const ROLL: f32 = 1.0;
const PITCH: f32 = 3.0;
const YAWRATE: f32 = 0.0;

const TAKE_OFF_THRUST: u16 = 40000;
const TAKE_OFF_COUNT: usize = 5;

const HOVER_LOW_THRUST: u16 = 32000;
const HOVER_HIGH_THRUST: u16 = 35000;
const HOVER_COUNT: usize = 16;

const ADVANCE_THRUST: u16 = 35000;
const ADVANCE_COUNT: usize = 4;
const BRAKE_PITCH: f32 = -2.0;
const BRAKE_THRUST: u16 = 40000;

const LAND_START_THRUST: u16 = 33000;
const LAND_THRUST_STEP: u16 = 100;
const LAND_COUNT: usize = 14;

/// Roll/Pitch/Yawrate/Thrust setpoint
///
/// Angles are in degrees, yawrate in degrees per seconds. Thrust is the raw 16 bit motor command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoint {
    /// Roll angle (degrees)
    pub roll: f32,
    /// Pitch angle (degrees)
    pub pitch: f32,
    /// Yaw rate (degrees/second)
    pub yawrate: f32,
    /// Thrust (0 = 0%, 65535 = 100%)
    pub thrust: u16,
}

impl Setpoint {
    /// All-zero setpoint. Sending it unlocks the thrust protection and stops the motors.
    pub const ZERO: Setpoint = Setpoint::new(0.0, 0.0, 0.0, 0);

    /// Create a setpoint
    pub const fn new(roll: f32, pitch: f32, yawrate: f32, thrust: u16) -> Self {
        Self {
            roll,
            pitch,
            yawrate,
            thrust,
        }
    }

    /// Same attitude with a different thrust
    pub const fn with_thrust(self, thrust: u16) -> Self {
        Self { thrust, ..self }
    }

    /// Same thrust with a different pitch
    pub const fn with_pitch(self, pitch: f32) -> Self {
        Self { pitch, ..self }
    }
}

/// One setpoint and the time to wait once it has been sent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Setpoint sent at the start of the step
    pub setpoint: Setpoint,
    /// Time to wait before the next step
    pub hold: Duration,
}

/// Phases of the demo flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Single zero setpoint unlocking the thrust
    Unlock,
    /// Climb at high thrust
    TakeOff,
    /// Alternate around the hover thrust
    Hover,
    /// Move forward, then brake
    Advance,
    /// Slowly decreasing thrust
    Land,
    /// Final zero setpoint stopping the motors
    ZeroOut,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::Unlock => "unlock",
            PhaseKind::TakeOff => "take off",
            PhaseKind::Hover => "hover",
            PhaseKind::Advance => "advance",
            PhaseKind::Land => "land",
            PhaseKind::ZeroOut => "zero out",
        };
        f.write_str(name)
    }
}

/// A named, ordered list of steps
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    /// What this phase does
    pub kind: PhaseKind,
    /// Steps in send order
    pub steps: Vec<Step>,
}

impl Phase {
    /// Empty phase, steps are added with [Phase::then()]
    pub fn new(kind: PhaseKind) -> Self {
        Self {
            kind,
            steps: Vec::new(),
        }
    }

    /// Append one step
    pub fn then(mut self, setpoint: Setpoint, hold: Duration) -> Self {
        self.steps.push(Step { setpoint, hold });
        self
    }

    /// Append `count` identical steps
    pub fn repeat(mut self, setpoint: Setpoint, count: usize, hold: Duration) -> Self {
        self.steps
            .extend(std::iter::repeat(Step { setpoint, hold }).take(count));
        self
    }

    /// Number of setpoints sent by this phase
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the phase sends nothing
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time spent in this phase
    pub fn duration(&self) -> Duration {
        self.steps.iter().map(|s| s.hold).sum()
    }
}

/// Ordered list of phases flown one after the other
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlightPlan {
    phases: Vec<Phase>,
}

impl FlightPlan {
    /// Empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a phase at the end of the plan
    pub fn push(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    /// Take off, hover, advance and land sequence
    ///
    /// Every setpoint is followed by one `period` of hold time. The phases are:
    ///  - **unlock**: one zero setpoint
    ///  - **take off**: 5 setpoints at thrust 40000
    ///  - **hover**: 16 times thrust 32000 then 35000
    ///  - **advance**: 4 setpoints at thrust 35000, then pitch -2 at thrust 40000 to brake
    ///  - **land**: 14 pairs of setpoints starting at thrust 33000, 100 lower for each pair
    ///  - **zero out**: one zero setpoint
    ///
    /// All non-zero setpoints use roll 1, pitch 3 and yawrate 0.
    pub fn hover_demo(period: Duration) -> Self {
        let cruise = Setpoint::new(ROLL, PITCH, YAWRATE, 0);

        let unlock = Phase::new(PhaseKind::Unlock).then(Setpoint::ZERO, period);

        let take_off = Phase::new(PhaseKind::TakeOff).repeat(
            cruise.with_thrust(TAKE_OFF_THRUST),
            TAKE_OFF_COUNT,
            period,
        );

        let mut hover = Phase::new(PhaseKind::Hover);
        for _ in 0..HOVER_COUNT {
            hover = hover
                .then(cruise.with_thrust(HOVER_LOW_THRUST), period)
                .then(cruise.with_thrust(HOVER_HIGH_THRUST), period);
        }

        let advance = Phase::new(PhaseKind::Advance)
            .repeat(cruise.with_thrust(ADVANCE_THRUST), ADVANCE_COUNT, period)
            .then(
                cruise.with_pitch(BRAKE_PITCH).with_thrust(BRAKE_THRUST),
                period,
            );

        let mut land = Phase::new(PhaseKind::Land);
        let mut thrust = LAND_START_THRUST;
        for _ in 0..LAND_COUNT {
            land = land.repeat(cruise.with_thrust(thrust), 2, period);
            thrust -= LAND_THRUST_STEP;
        }

        let zero_out = Phase::new(PhaseKind::ZeroOut).then(Setpoint::ZERO, period);

        Self {
            phases: vec![unlock, take_off, hover, advance, land, zero_out],
        }
    }

    /// The same plan with every phase of the given kind removed
    pub fn without(mut self, kind: PhaseKind) -> Self {
        self.phases.retain(|p| p.kind != kind);
        self
    }

    /// Phases in flight order
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// First phase of the given kind
    pub fn phase(&self, kind: PhaseKind) -> Option<&Phase> {
        self.phases.iter().find(|p| p.kind == kind)
    }

    /// All setpoints in the order they are sent
    pub fn setpoints(&self) -> impl Iterator<Item = Setpoint> + '_ {
        self.phases
            .iter()
            .flat_map(|p| p.steps.iter().map(|s| s.setpoint))
    }

    /// Total scripted time
    pub fn duration(&self) -> Duration {
        self.phases.iter().map(Phase::duration).sum()
    }
}
