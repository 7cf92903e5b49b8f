//! # Connection lifecycle events
//!
//! A [Crazyflie] connection goes through a small lifecycle: it either connects or fails to connect, then, once
//! connected, it is eventually disconnected. A disconnection that was not requested (the Crazyflie went out of range,
//! the radio was unplugged, ...) is reported as a connection loss before the disconnection itself.
//!
//! Interested parties subscribe to a [ConnectionEvents] hub and receive [ConnectionEvent]s over a channel:
//! ``` no_run
//! # async fn watch() -> Result<(), Box<dyn std::error::Error>> {
//! use crazyflie_hover::events::{ConnectionEvent, ConnectionEvents};
//!
//! let events = ConnectionEvents::new();
//! let receiver = events.subscribe();
//!
//! let context = crazyflie_link::LinkContext::new();
//! let cf = crazyflie_hover::Crazyflie::connect_with_events(&context, "radio://0/80/2M/E7E7E7E7E7", &events).await?;
//!
//! while let Ok(event) = receiver.recv_async().await {
//!     println!("{}", event);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [Crazyflie]: crate::Crazyflie

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};

/// Something that happened to a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The link is open and the Crazyflie is ready to receive commands
    Connected {
        /// Link URI
        uri: String,
    },
    /// The link could not be opened
    ConnectionFailed {
        /// Link URI
        uri: String,
        /// Why it failed
        reason: String,
    },
    /// An established link closed without being asked to
    ConnectionLost {
        /// Link URI
        uri: String,
        /// Reason given by the link
        reason: String,
    },
    /// The link is closed. Sent once per established connection, whatever the cause.
    Disconnected {
        /// Link URI
        uri: String,
    },
}

impl ConnectionEvent {
    /// URI of the link this event is about
    pub fn uri(&self) -> &str {
        match self {
            ConnectionEvent::Connected { uri }
            | ConnectionEvent::ConnectionFailed { uri, .. }
            | ConnectionEvent::ConnectionLost { uri, .. }
            | ConnectionEvent::Disconnected { uri } => uri,
        }
    }
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEvent::Connected { uri } => write!(f, "Connected to {}", uri),
            ConnectionEvent::ConnectionFailed { uri, reason } => {
                write!(f, "Connection to {} failed: {}", uri, reason)
            }
            ConnectionEvent::ConnectionLost { uri, reason } => {
                write!(f, "Connection to {} lost: {}", uri, reason)
            }
            ConnectionEvent::Disconnected { uri } => write!(f, "Disconnected from {}", uri),
        }
    }
}

/// Fan-out of connection events to any number of subscribers
///
/// Cloning the hub gives another handle to the same subscriber list. Subscribers that dropped their receiver are
/// forgotten on the next emit.
#[derive(Debug, Clone, Default)]
pub struct ConnectionEvents {
    subscribers: Arc<Mutex<Vec<Sender<ConnectionEvent>>>>,
}

impl ConnectionEvents {
    /// Hub without subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    ///
    /// Only events emitted after this call are received.
    pub fn subscribe(&self) -> Receiver<ConnectionEvent> {
        let (tx, rx) = flume::unbounded();
        self.lock().push(tx);
        rx
    }

    /// Deliver an event to all subscribers
    pub fn emit(&self, event: ConnectionEvent) {
        log::debug!("{:?}", event);
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<ConnectionEvent>>> {
        // A panic while holding the lock cannot leave the list in a broken state
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Lifecycle of one established connection
///
/// Makes sure the end of the connection is reported once, even if both the user and the link watcher end it.
#[derive(Debug)]
pub(crate) struct ConnectionLifecycle {
    uri: String,
    events: ConnectionEvents,
    closed: AtomicBool,
}

impl ConnectionLifecycle {
    pub(crate) fn connected(uri: &str, events: ConnectionEvents) -> Self {
        events.emit(ConnectionEvent::Connected {
            uri: uri.to_owned(),
        });
        Self {
            uri: uri.to_owned(),
            events,
            closed: AtomicBool::new(false),
        }
    }

    /// Report the end of the connection. `lost_reason` is set when the close was not requested.
    ///
    /// Returns false if the end was already reported.
    pub(crate) fn closed(&self, lost_reason: Option<String>) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        if let Some(reason) = lost_reason {
            self.events.emit(ConnectionEvent::ConnectionLost {
                uri: self.uri.clone(),
                reason,
            });
        }
        self.events.emit(ConnectionEvent::Disconnected {
            uri: self.uri.clone(),
        });
        log::info!("Disconnected from {}", self.uri);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "radio://0/80/2M/E7E7E7E7E7";

    #[test]
    fn every_subscriber_gets_the_event() {
        let events = ConnectionEvents::new();
        let a = events.subscribe();
        let b = events.clone().subscribe();

        events.emit(ConnectionEvent::Connected { uri: URI.to_owned() });

        assert_eq!(a.try_recv().unwrap().uri(), URI);
        assert_eq!(b.try_recv().unwrap().uri(), URI);
    }

    #[test]
    fn dropped_subscribers_are_forgotten() {
        let events = ConnectionEvents::new();
        drop(events.subscribe());
        let alive = events.subscribe();

        events.emit(ConnectionEvent::Disconnected { uri: URI.to_owned() });

        assert_eq!(events.lock().len(), 1);
        assert!(alive.try_recv().is_ok());
    }

    #[test]
    fn requested_close_is_not_a_loss() {
        let events = ConnectionEvents::new();
        let rx = events.subscribe();

        let lifecycle = ConnectionLifecycle::connected(URI, events);
        assert!(lifecycle.closed(None));
        assert!(!lifecycle.closed(Some("late watcher".to_owned())));

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                ConnectionEvent::Connected { uri: URI.to_owned() },
                ConnectionEvent::Disconnected { uri: URI.to_owned() },
            ]
        );
    }

    #[test]
    fn unrequested_close_reports_loss_then_disconnect() {
        let events = ConnectionEvents::new();
        let rx = events.subscribe();

        let lifecycle = ConnectionLifecycle::connected(URI, events);
        lifecycle.closed(Some("Too many packets lost".to_owned()));

        let received: Vec<String> = rx.try_iter().map(|e| e.to_string()).collect();
        assert_eq!(
            received,
            vec![
                format!("Connected to {}", URI),
                format!("Connection to {} lost: Too many packets lost", URI),
                format!("Disconnected from {}", URI),
            ]
        );
    }
}
