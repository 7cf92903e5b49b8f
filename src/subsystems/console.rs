//! # Console subsystem
//!
//! The Crazyflie has a test console that is used to communicate various information
//! and debug message to the ground. Text received from the console is assembled in lines
//! and forwarded to the log with the `crazyflie::console` target.

use crazyflie_link::Packet;
use flume as channel;
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "crazyflie::console";

/// # Access to the console subsystem
///
/// See the [console module documentation](crate::subsystems::console) for more context and information.
pub struct Console {
    _console_task: JoinHandle<()>,
}

impl Console {
    pub(crate) fn new(downlink: channel::Receiver<Packet>) -> Self {
        let _console_task = tokio::spawn(async move {
            let mut lines = LineBuffer::default();
            while let Ok(pk) = downlink.recv_async().await {
                // Decode text from the console
                let text = String::from_utf8_lossy(pk.get_data());

                for line in lines.push(&text) {
                    log::info!(target: LOG_TARGET, "{}", line);
                }
            }
        });

        Self { _console_task }
    }
}

#[derive(Debug, Default)]
struct LineBuffer {
    partial: String,
}

impl LineBuffer {
    /// Append text and return the lines it completed
    fn push(&mut self, text: &str) -> Vec<String> {
        self.partial.push_str(text);

        let mut lines = Vec::new();
        while let Some((line, rest)) = self.partial.split_once('\n') {
            lines.push(line.to_owned());
            self.partial = rest.to_owned();
        }
        lines
    }
}
