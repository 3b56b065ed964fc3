//! Connectivity monitoring.
//!
//! [`NetworkMonitor`] is the single source of truth for "are we online",
//! decoupled from any particular connectivity API: whatever platform layer
//! observes reachability feeds transitions in through [`set_online`], and the
//! engine reads the snapshot back out through [`is_online`].
//!
//! Transition notifications fire only on the offline→online **edge**, not on
//! every poll, so re-confirming an already-online link never produces a
//! redundant sync trigger.
//!
//! [`set_online`]: NetworkMonitor::set_online
//! [`is_online`]: NetworkMonitor::is_online

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Events published by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// Connectivity returned after being down.
    CameOnline,
}

/// Edge-triggered connectivity monitor.
#[derive(Debug)]
pub struct NetworkMonitor {
    online: AtomicBool,
    events: broadcast::Sender<NetworkEvent>,
}

impl NetworkMonitor {
    /// Create a monitor with the given initial state.
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            online: AtomicBool::new(initially_online),
            events,
        }
    }

    /// Point-in-time connectivity query.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Record a connectivity observation.
    ///
    /// Publishes [`NetworkEvent::CameOnline`] only when this observation is
    /// an offline→online transition.
    pub fn set_online(&self, online: bool) {
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if online && !was_online {
            tracing::info!("connectivity restored");
            let _ = self.events.send(NetworkEvent::CameOnline);
        } else if !online && was_online {
            tracing::info!("connectivity lost");
        }
    }

    /// Subscribe to transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn reports_initial_state() {
        assert!(NetworkMonitor::new(true).is_online());
        assert!(!NetworkMonitor::new(false).is_online());
    }

    #[tokio::test]
    async fn offline_to_online_edge_fires_once() {
        let monitor = NetworkMonitor::new(false);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);

        assert!(matches!(rx.try_recv(), Ok(NetworkEvent::CameOnline)));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn online_to_online_is_silent() {
        let monitor = NetworkMonitor::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);
        monitor.set_online(true);

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn going_offline_is_silent() {
        let monitor = NetworkMonitor::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_online(false);
        assert!(!monitor.is_online());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn flapping_fires_per_edge() {
        let monitor = NetworkMonitor::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_online(false);
        monitor.set_online(true);
        monitor.set_online(false);
        monitor.set_online(true);

        assert!(matches!(rx.try_recv(), Ok(NetworkEvent::CameOnline)));
        assert!(matches!(rx.try_recv(), Ok(NetworkEvent::CameOnline)));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
