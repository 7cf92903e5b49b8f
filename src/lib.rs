//! # Crazyflie hover
//!
//! This crate connects to a Crazyflie using the [crazyflie-link] crate and flies it through a scripted, open-loop
//! sequence of Roll/Pitch/Yawrate/Thrust setpoints: unlock, take off, hover, advance, land and zero out. The `hover`
//! binary is the ready to fly version of it.
//!
//! ## Usage
//!
//! The basic procedure is:
//!  - Find the link URI to connect, either by [scanning](scan::scan) or as a user input
//!  - Create a [Crazyflie] object from the URI, optionally listening to the [connection events](events)
//!  - Start a [FlightWorker](runner::FlightWorker) with a [FlightPlan](flight::FlightPlan), it disconnects the
//!    Crazyflie once the plan is flown
//!
//! All subsystems functions are only taking an un-mutable reference to self (`&self`), the intention is for the
//! Crazyflie object to be shared between tasks using `Arc<>`.
//!
//! For example:
//! ``` no_run
//! # async fn fly() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use crazyflie_hover::flight::{FlightPlan, DEFAULT_PERIOD};
//! use crazyflie_hover::runner::FlightWorker;
//!
//! let link_context = crazyflie_link::LinkContext::new();
//!
//! let found = crazyflie_hover::scan::scan(&link_context, crazyflie_hover::scan::DEFAULT_ADDRESS).await?;
//!
//! if let Some(uri) = found.first() {
//!     let cf = Arc::new(crazyflie_hover::Crazyflie::connect_from_uri(&link_context, uri).await?);
//!
//!     let report = FlightWorker::start(cf, FlightPlan::hover_demo(DEFAULT_PERIOD)).join().await?;
//!     println!("{} setpoints sent", report.sent);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [crazyflie-link]: https://crates.io/crates/crazyflie-link

#![warn(missing_docs)]

mod crazyflie;
mod error;

pub mod events;
pub mod flight;
pub mod runner;
pub mod scan;
pub mod subsystems;

pub use crate::crazyflie::Crazyflie;
pub use crate::error::{Error, Result};
