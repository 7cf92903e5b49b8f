//! # Crazyflie subsystems
//!
//! The Crazyflie firmware, as well as the CRTP protocol used to communicate with it, is organized in logical
//! subsystems. Subsystems are greatly independent and each have one logical role.
//!
//! Only the subsystems needed to fly scripted setpoints are implemented here.

pub mod commander;
pub mod console;
