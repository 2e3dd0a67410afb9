//! Fixed-interval draining of the event channel.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use super::{EventSink, RunEvent};

/// Default polling interval for sinks (100ms).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Channel state after a drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Senders are still alive; poll again later.
    Open,
    /// Every sender has been dropped and the queue is empty.
    Closed,
}

/// Hand every queued event to `sink` without blocking.
pub fn drain_pending(receiver: &Receiver<RunEvent>, sink: &mut dyn EventSink) -> DrainStatus {
    loop {
        match receiver.try_recv() {
            Ok(event) => sink.handle(event),
            Err(TryRecvError::Empty) => return DrainStatus::Open,
            Err(TryRecvError::Disconnected) => return DrainStatus::Closed,
        }
    }
}

/// Drain the channel every `poll_interval` until all senders are gone.
///
/// Returns the number of polling passes made.
pub fn drain_events(
    receiver: &Receiver<RunEvent>,
    sink: &mut dyn EventSink,
    poll_interval: Duration,
) -> usize {
    let mut passes = 0;
    loop {
        passes += 1;
        if drain_pending(receiver, sink) == DrainStatus::Closed {
            return passes;
        }
        thread::sleep(poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{event_channel, RecordingSink};

    #[test]
    fn test_drain_pending_keeps_order() {
        let (sender, receiver) = event_channel();
        sender.send(RunEvent::OverallText("one".to_string()));
        sender.send(RunEvent::StageText("two".to_string()));

        let mut sink = RecordingSink::default();
        let status = drain_pending(&receiver, &mut sink);

        assert_eq!(status, DrainStatus::Open);
        assert_eq!(
            sink.events,
            vec![
                RunEvent::OverallText("one".to_string()),
                RunEvent::StageText("two".to_string()),
            ]
        );
    }

    #[test]
    fn test_drain_events_returns_when_senders_drop() {
        let (sender, receiver) = event_channel();

        let producer = thread::spawn(move || {
            for i in 0..5 {
                sender.send(RunEvent::StageProgress(i as f64));
                thread::sleep(Duration::from_millis(2));
            }
        });

        let mut sink = RecordingSink::default();
        drain_events(&receiver, &mut sink, Duration::from_millis(1));
        producer.join().unwrap();

        assert_eq!(sink.events.len(), 5);
    }
}
