//! # Low level setpoint subsystem
//!
//! This subsystem allows to send low-level setpoint. The setpoints are described as low-level in the sense that they
//! are setting the instant target state. As such they likely need to be send very often to have the crazyflie
//! follow the wanted flight profile.
//!
//! The Crazyflie has a couple of safety mechanisms that one needs to be aware of in order to send setpoints:
//!  - A setpoint with thrust=0 must be sent once to unlock the thrust
//!  - In no setpoint are received for 1 seconds, the Crazyflie will reset roll/pitch/yawrate to 0/0/0 and after 2 seconds
//!    will fallback to a lower-priority setpoint which in most case will cut the motors.
//!
//! The following example code would drive the motors in a ramp and then stop:
//! ``` no_run
//! # use tokio::time::{sleep, Duration};
//! # async fn ramp(crazyflie: crazyflie_hover::Crazyflie) -> Result<(), Box<dyn std::error::Error>> {
//! // Unlock the commander
//! crazyflie.commander.setpoint_rpyt(0.0, 0.0, 0.0, 0).await?;
//!
//! // Ramp!
//! for thrust in (0..20_000).step_by(1_000) {
//!     crazyflie.commander.setpoint_rpyt(0.0, 0.0, 0.0, thrust).await?;
//!     sleep(Duration::from_millis(100)).await;
//! }
//!
//! // Stop the motors
//! crazyflie.commander.setpoint_rpyt(0.0, 0.0, 0.0, 0).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use crazyflie_link::Packet;
use flume::Sender;

use crate::flight::Setpoint;
use crate::runner::SetpointSink;
use crate::Result;

use crate::crazyflie::COMMANDER_PORT;

// Channels
const RPYT_CHANNEL: u8 = 0;

/// # Low level setpoint subsystem
///
/// This struct implements methods to send low level setpoints to the Crazyflie.
/// See the [commander module documentation](crate::subsystems::commander) for more context and information.
#[derive(Debug)]
pub struct Commander {
    uplink: Sender<Packet>,
}

impl Commander {
    pub(crate) fn new(uplink: Sender<Packet>) -> Self {
        Self { uplink }
    }
}

/// # Legacy RPY+ setpoint
///
/// This setpoint was originally the only one present in the Crazyflie and has been (ab)used to
/// implement the early position control and other assisted and semi-autonomous mode.
impl Commander {
    /// Sends a Roll, Pitch, Yawrate, and Thrust setpoint to the Crazyflie.
    ///
    /// By default the arguments are interpreted as:
    /// * `roll` - Desired roll angle (degrees)
    /// * `pitch` - Desired pitch angle (degrees)
    /// * `yawrate` - Desired yaw rate (degrees/second)
    /// * `thrust` - Thrust as a 16-bit value (0 = 0% thrust, 65535 = 100% thrust)
    ///
    /// Note: Thrust is locked by default for safety. To unlock, send a setpoint with `thrust = 0` once before sending
    /// nonzero thrust values.
    pub async fn setpoint_rpyt(&self, roll: f32, pitch: f32, yawrate: f32, thrust: u16) -> Result<()> {
        let pk = Packet::new(COMMANDER_PORT, RPYT_CHANNEL, rpyt_payload(roll, pitch, yawrate, thrust));

        self.uplink.send_async(pk).await?;

        Ok(())
    }
}

#[async_trait]
impl SetpointSink for Commander {
    async fn send_setpoint(&self, setpoint: Setpoint) -> Result<()> {
        self.setpoint_rpyt(setpoint.roll, setpoint.pitch, setpoint.yawrate, setpoint.thrust)
            .await
    }
}

// The firmware pitch axis is inverted relative to the client convention.
// `0.0 - pitch` keeps the unlock setpoint free of a negative zero.
fn rpyt_payload(roll: f32, pitch: f32, yawrate: f32, thrust: u16) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 * 3 + 2);
    payload.extend_from_slice(&roll.to_le_bytes());
    payload.extend_from_slice(&(0.0 - pitch).to_le_bytes());
    payload.extend_from_slice(&yawrate.to_le_bytes());
    payload.extend_from_slice(&thrust.to_le_bytes());
    payload
}
