use crate::subsystems::commander::Commander;
use crate::subsystems::console::Console;

use crate::events::{ConnectionEvent, ConnectionEvents, ConnectionLifecycle};
use crate::{Error, Result};
use flume as channel;
use futures::lock::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub(crate) const CONSOLE_PORT: u8 = 0;
pub(crate) const COMMANDER_PORT: u8 = 3;

const UPLINK_POLL: Duration = Duration::from_millis(100);
const DOWNLINK_POLL: Duration = Duration::from_millis(200);

/// # The Crazyflie
///
/// This struct is one-time use: Creating it will connect to a Crazyflie and once disconnected, either as requested
/// by the lib user or as a result of a connection loss, the object cannot be reconnected. A new one need to be created
/// to connect again.
///
/// See the [crate root documentation](crate) for more context and information.
pub struct Crazyflie {
    /// Commander/setpoint subsystem access
    pub commander: Commander,
    /// Console subsystem access
    pub console: Console,
    uri: String,
    uplink_task: Mutex<Option<JoinHandle<()>>>,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
    watch_task: Mutex<Option<JoinHandle<()>>>,
    disconnect: Arc<AtomicBool>,
    link: Arc<crazyflie_link::Connection>,
    lifecycle: Arc<ConnectionLifecycle>,
}

impl Crazyflie {
    /// Open a Crazyflie connection to a given URI
    ///
    /// Same as [Crazyflie::connect_with_events()] with nobody listening to the connection events.
    pub async fn connect_from_uri(link_context: &crazyflie_link::LinkContext, uri: &str) -> Result<Self> {
        Self::connect_with_events(link_context, uri, &ConnectionEvents::new()).await
    }

    /// Open a Crazyflie connection to a given URI, reporting the connection lifecycle
    ///
    /// [ConnectionEvent::ConnectionFailed] is emitted and an error returned if the link cannot be opened. Otherwise
    /// [ConnectionEvent::Connected] is emitted before this function returns and
    /// [ConnectionEvent::Disconnected] will be emitted once the connection ends, preceded by
    /// [ConnectionEvent::ConnectionLost] if the end was not requested.
    pub async fn connect_with_events(
        link_context: &crazyflie_link::LinkContext,
        uri: &str,
        events: &ConnectionEvents,
    ) -> Result<Self> {
        log::debug!("Opening link {}", uri);

        let link = match link_context.open_link(uri).await {
            Ok(link) => link,
            Err(e) => {
                let error = Error::from(e);
                events.emit(ConnectionEvent::ConnectionFailed {
                    uri: uri.to_owned(),
                    reason: error.to_string(),
                });
                return Err(error);
            }
        };

        Ok(Self::start(uri, link, events.clone()))
    }

    fn start(uri: &str, link: crazyflie_link::Connection, events: ConnectionEvents) -> Self {
        let disconnect = Arc::new(AtomicBool::new(false));
        let link = Arc::new(link);

        // Uplink queue
        let disconnect_uplink = disconnect.clone();
        let (uplink, rx) = channel::unbounded();
        let link_uplink = link.clone();
        let uplink_task = tokio::spawn(async move {
            while !disconnect_uplink.load(Relaxed) {
                match tokio::time::timeout(UPLINK_POLL, rx.recv_async()).await {
                    Ok(Ok(pk)) => {
                        if link_uplink.send_packet(pk).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => (),
                    Ok(Err(flume::RecvError::Disconnected)) => break,
                }
            }
            // Whatever ended the queue, the link has no use anymore
            link_uplink.close().await;
        });

        let commander = Commander::new(uplink);

        let (console_tx, console_downlink) = channel::unbounded();
        let console = Console::new(console_downlink);

        // Downlink dispatcher, packets for other ports are dropped so the link queue stays drained
        let disconnect_downlink = disconnect.clone();
        let link_downlink = link.clone();
        let dispatch_task = tokio::spawn(async move {
            while !disconnect_downlink.load(Relaxed) {
                match tokio::time::timeout(DOWNLINK_POLL, link_downlink.recv_packet()).await {
                    Ok(Ok(pk)) if pk.get_port() == CONSOLE_PORT => {
                        let _ = console_tx.send_async(pk).await;
                    }
                    Ok(Ok(pk)) => log::trace!("Dropping packet for port {}", pk.get_port()),
                    Err(_) => (),
                    Ok(Err(_)) => return, // Link closed
                }
            }
        });

        let lifecycle = Arc::new(ConnectionLifecycle::connected(uri, events));

        // Connection loss watcher
        let link_watch = link.clone();
        let disconnect_watch = disconnect.clone();
        let lifecycle_watch = lifecycle.clone();
        let watch_task = tokio::spawn(async move {
            let reason = link_watch.wait_close().await;
            report_close(&disconnect_watch, &lifecycle_watch, reason);
        });

        log::info!("Connected to {}", uri);

        Crazyflie {
            commander,
            console,
            uri: uri.to_owned(),
            uplink_task: Mutex::new(Some(uplink_task)),
            dispatch_task: Mutex::new(Some(dispatch_task)),
            watch_task: Mutex::new(Some(watch_task)),
            disconnect,
            link,
            lifecycle,
        }
    }

    /// URI of the link this Crazyflie is connected with
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Disconnect the Crazyflie
    ///
    /// The Connection can be ended in two ways: either by dropping the [Crazyflie] object or by calling this
    /// disconnect() function. Once this function return, the Crazyflie is fully disconnected and
    /// [ConnectionEvent::Disconnected] has been emitted.
    ///
    /// Once disconnected, any methods that uses the communication to the Crazyflie will return the error
    /// [Error::Disconnected]
    pub async fn disconnect(&self) {
        // Set disconnect to true, will make both uplink and dispatcher task quit
        self.disconnect.store(true, Relaxed);

        // Wait for both task to finish
        if let Some(uplink_task) = self.uplink_task.lock().await.take() {
            let _ = uplink_task.await;
        }
        if let Some(dispatch_task) = self.dispatch_task.lock().await.take() {
            let _ = dispatch_task.await;
        }

        self.link.close().await;

        self.lifecycle.closed(None);
        if let Some(watch_task) = self.watch_task.lock().await.take() {
            watch_task.abort();
        }
    }

    /// Wait for the Crazyflie to be disconnected
    ///
    /// This function waits for the Crazyflie link to close and for the Crazyflie to fully disconnect. It returns
    /// a string describing the reason for the disconnection.
    pub async fn wait_disconnect(&self) -> String {
        let reason = self.link.wait_close().await;

        report_close(&self.disconnect, &self.lifecycle, reason.clone());
        self.disconnect().await;

        reason
    }
}

// A close that nobody asked for is a connection loss
fn report_close(disconnect: &AtomicBool, lifecycle: &ConnectionLifecycle, reason: String) {
    let requested = disconnect.swap(true, Relaxed);
    if !requested {
        log::warn!("Link closed: {}", reason);
    }
    lifecycle.closed(if requested { None } else { Some(reason) });
}

impl Drop for Crazyflie {
    fn drop(&mut self) {
        self.disconnect.store(true, Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "radio://0/80/2M/E7E7E7E7E7";

    fn connected() -> (ConnectionLifecycle, flume::Receiver<ConnectionEvent>) {
        let events = ConnectionEvents::new();
        let rx = events.subscribe();
        let lifecycle = ConnectionLifecycle::connected(URI, events);
        // Drop the Connected event
        rx.try_recv().unwrap();
        (lifecycle, rx)
    }

    #[test]
    fn unrequested_close_is_reported_as_lost() {
        let (lifecycle, rx) = connected();
        let disconnect = AtomicBool::new(false);

        report_close(&disconnect, &lifecycle, "Too many packets lost".to_owned());

        assert!(disconnect.load(Relaxed));
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                ConnectionEvent::ConnectionLost {
                    uri: URI.to_owned(),
                    reason: "Too many packets lost".to_owned(),
                },
                ConnectionEvent::Disconnected { uri: URI.to_owned() },
            ]
        );
    }

    #[test]
    fn requested_close_is_only_a_disconnection() {
        let (lifecycle, rx) = connected();
        let disconnect = AtomicBool::new(true);

        report_close(&disconnect, &lifecycle, "Link closed by user".to_owned());

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![ConnectionEvent::Disconnected { uri: URI.to_owned() }]
        );
    }

    #[test]
    fn close_after_disconnect_reports_nothing_more() {
        let (lifecycle, rx) = connected();
        let disconnect = AtomicBool::new(false);

        report_close(&disconnect, &lifecycle, "Too many packets lost".to_owned());
        report_close(&disconnect, &lifecycle, "Too many packets lost".to_owned());

        assert_eq!(rx.try_iter().count(), 2);
    }
}
