//! Single-slot lifecycle handshake between listener and owner.
//!
//! The listener pushes `Started` immediately before it begins accepting
//! connections and `Stopped` immediately after it stops; the owner blocks on
//! the slot with a timeout. Expiry is reported as [`HandshakeWait::Empty`],
//! never coerced into a signal, so a crashed listener reads as silence
//! rather than a wrong answer.

use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

/// Lifecycle acknowledgement pushed by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSignal {
    Started,
    Stopped,
}

/// Result of waiting on the handshake slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeWait {
    Signal(ServerSignal),
    /// Nothing arrived within the timeout (or the listener is gone).
    Empty,
}

/// Create the bounded, capacity-1 handshake pair.
pub fn channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = sync_channel(1);
    (SignalSender { tx }, SignalReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: SyncSender<ServerSignal>,
}

impl SignalSender {
    /// Push a signal without ever blocking the listener. A full slot means
    /// the owner never drained the previous signal; that is logged, not
    /// waited on.
    pub fn notify(&self, signal: ServerSignal) {
        match self.tx.try_send(signal) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(?signal, "handshake slot full, previous signal never drained");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::trace!(?signal, "handshake owner already gone");
            }
        }
    }
}

#[derive(Debug)]
pub struct SignalReceiver {
    rx: Receiver<ServerSignal>,
}

impl SignalReceiver {
    pub fn wait(&self, timeout: Duration) -> HandshakeWait {
        match self.rx.recv_timeout(timeout) {
            Ok(signal) => HandshakeWait::Signal(signal),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                HandshakeWait::Empty
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_round_trip() {
        let (tx, rx) = channel();
        tx.notify(ServerSignal::Started);
        assert_eq!(
            rx.wait(Duration::from_millis(100)),
            HandshakeWait::Signal(ServerSignal::Started)
        );
    }

    #[test]
    fn expiry_is_empty_not_a_signal() {
        let (_tx, rx) = channel();
        assert_eq!(rx.wait(Duration::from_millis(10)), HandshakeWait::Empty);
    }

    #[test]
    fn dropped_sender_reads_as_empty() {
        let (tx, rx) = channel();
        drop(tx);
        assert_eq!(rx.wait(Duration::from_millis(10)), HandshakeWait::Empty);
    }

    #[test]
    fn full_slot_never_blocks_the_sender() {
        let (tx, rx) = channel();
        tx.notify(ServerSignal::Started);
        tx.notify(ServerSignal::Stopped); // dropped, slot still holds Started
        assert_eq!(
            rx.wait(Duration::from_millis(10)),
            HandshakeWait::Signal(ServerSignal::Started)
        );
        assert_eq!(rx.wait(Duration::from_millis(10)), HandshakeWait::Empty);
    }
}
