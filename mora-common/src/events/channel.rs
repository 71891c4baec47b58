//! Per-session event channel
//!
//! Holds the permanent, append-only event log of one session and fans new
//! events out to live subscribers. A subscriber first receives a replay of the
//! log, then the live feed; both are taken under the same lock so the join
//! point has no gap and no duplicate.
//!
//! Delivery to a subscriber goes through a bounded queue. When the queue is
//! full the event is dropped for that subscriber only; the producer never
//! blocks and the permanent log always keeps the event.

use super::SessionEvent;
use futures::stream::Stream;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default per-subscriber queue capacity
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Default idle interval before a keep-alive is emitted
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Ordered event log with replay-then-live fan-out
pub struct EventChannel {
    state: Mutex<ChannelState>,
    subscriber_buffer: usize,
}

struct ChannelState {
    log: Vec<SessionEvent>,
    subscribers: Vec<mpsc::Sender<SessionEvent>>,
    closed: bool,
    dropped: u64,
}

impl EventChannel {
    /// Creates a channel whose subscribers each get a queue of `subscriber_buffer` events
    pub fn new(subscriber_buffer: usize) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                log: Vec::new(),
                subscribers: Vec::new(),
                closed: false,
                dropped: 0,
            }),
            subscriber_buffer: subscriber_buffer.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        // The state stays consistent even if a holder panicked mid-append
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an event to the log and notify live subscribers
    ///
    /// Never blocks. Returns `false` if the channel was already closed by a
    /// terminal event, in which case the event is discarded.
    pub fn append(&self, event: SessionEvent) -> bool {
        let mut state = self.lock();

        if state.closed {
            warn!(
                event_type = event.event_type(),
                "Event appended after terminal event - ignored"
            );
            return false;
        }

        let terminal = event.is_terminal();
        let mut dropped = 0u64;

        state.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                dropped += 1;
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Subscriber disconnected - removing from channel");
                false
            }
        });

        if dropped > 0 {
            warn!(
                event_type = event.event_type(),
                dropped, "Subscriber queue full - event dropped for slow subscriber"
            );
            state.dropped += dropped;
        }

        state.log.push(event);

        if terminal {
            // Releasing the senders ends every live feed once it drains
            state.closed = true;
            state.subscribers.clear();
        }

        true
    }

    /// Subscribe: replay of the current log, then live events
    ///
    /// After a terminal event the subscription carries the replay only.
    pub fn subscribe(&self) -> Subscription {
        let mut state = self.lock();
        let replay = state.log.clone();

        let live = if state.closed {
            None
        } else {
            let (tx, rx) = mpsc::channel(self.subscriber_buffer);
            state.subscribers.push(tx);
            Some(rx)
        };

        Subscription { replay, live }
    }

    /// Copy of the full event log
    pub fn snapshot(&self) -> Vec<SessionEvent> {
        self.lock().log.clone()
    }

    /// Number of events in the log
    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a terminal event has been appended
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of currently attached live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Total events dropped across all slow subscribers
    pub fn dropped_count(&self) -> u64 {
        self.lock().dropped
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

/// Item produced by a subscription stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// A logged session event
    Event(SessionEvent),
    /// Out-of-band liveness signal; never part of the log
    KeepAlive,
}

/// One subscriber's view of a channel
pub struct Subscription {
    replay: Vec<SessionEvent>,
    live: Option<mpsc::Receiver<SessionEvent>>,
}

impl Subscription {
    /// Events that were already in the log at subscribe time
    pub fn replay(&self) -> &[SessionEvent] {
        &self.replay
    }

    /// Whether a live feed follows the replay
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Turn the subscription into a stream of replayed then live items
    ///
    /// The stream ends after a terminal event, or when the channel releases
    /// this subscriber. While the live feed is idle for `keep_alive`, a
    /// [`StreamItem::KeepAlive`] is produced.
    pub fn into_stream(self, keep_alive: Duration) -> impl Stream<Item = StreamItem> {
        let Subscription { replay, live } = self;

        async_stream::stream! {
            for event in replay {
                yield StreamItem::Event(event);
            }

            if let Some(mut rx) = live {
                loop {
                    match tokio::time::timeout(keep_alive, rx.recv()).await {
                        Ok(Some(event)) => {
                            let terminal = event.is_terminal();
                            yield StreamItem::Event(event);
                            if terminal {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(_) => yield StreamItem::KeepAlive,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn thought(n: usize) -> SessionEvent {
        SessionEvent::thought(format!("step {}", n))
    }

    #[test]
    fn test_append_keeps_order() {
        let channel = EventChannel::new(8);
        for i in 0..5 {
            assert!(channel.append(thought(i)));
        }
        let log = channel.snapshot();
        assert_eq!(log.len(), 5);
        for (i, event) in log.iter().enumerate() {
            assert_eq!(event, &thought(i));
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_replay_then_live() {
        let channel = EventChannel::new(8);
        channel.append(thought(0));
        channel.append(thought(1));
        channel.append(thought(2));

        let subscription = channel.subscribe();
        assert_eq!(subscription.replay().len(), 3);
        assert!(subscription.is_live());

        channel.append(thought(3));
        channel.append(SessionEvent::Done);

        let items: Vec<StreamItem> = subscription
            .into_stream(Duration::from_secs(5))
            .collect()
            .await;

        let expected: Vec<StreamItem> = vec![
            StreamItem::Event(thought(0)),
            StreamItem::Event(thought(1)),
            StreamItem::Event(thought(2)),
            StreamItem::Event(thought(3)),
            StreamItem::Event(SessionEvent::Done),
        ];
        assert_eq!(items, expected);
    }

    #[tokio::test]
    async fn test_subscribe_after_terminal_is_replay_only() {
        let channel = EventChannel::new(8);
        channel.append(thought(0));
        channel.append(SessionEvent::Error {
            code: "TRANSCRIPT_ERROR".into(),
            message: "unreachable".into(),
        });
        assert!(channel.is_closed());

        let subscription = channel.subscribe();
        assert!(!subscription.is_live());

        let items: Vec<StreamItem> = subscription
            .into_stream(Duration::from_millis(10))
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(!items.contains(&StreamItem::KeepAlive));
    }

    #[test]
    fn test_append_after_terminal_is_ignored() {
        let channel = EventChannel::new(8);
        channel.append(SessionEvent::Done);
        assert!(!channel.append(thought(1)));
        assert_eq!(channel.len(), 1);
    }

    #[tokio::test]
    async fn test_saturated_subscriber_drops_without_blocking() {
        let channel = EventChannel::new(2);
        let subscription = channel.subscribe();

        for i in 0..10 {
            channel.append(thought(i));
        }
        channel.append(SessionEvent::Done);

        // Log keeps everything
        assert_eq!(channel.len(), 11);
        assert_eq!(channel.dropped_count(), 9);

        // Slow subscriber only sees what fit in its queue, then the feed ends
        let items: Vec<StreamItem> = subscription
            .into_stream(Duration::from_secs(5))
            .collect()
            .await;
        assert_eq!(
            items,
            vec![StreamItem::Event(thought(0)), StreamItem::Event(thought(1))]
        );
    }

    #[tokio::test]
    async fn test_idle_feed_emits_keep_alive() {
        let channel = std::sync::Arc::new(EventChannel::new(8));
        let subscription = channel.subscribe();
        let mut stream = Box::pin(subscription.into_stream(Duration::from_millis(20)));

        let first = stream.next().await;
        assert_eq!(first, Some(StreamItem::KeepAlive));

        channel.append(SessionEvent::Done);
        let mut rest = Vec::new();
        while let Some(item) = stream.next().await {
            rest.push(item);
        }
        assert_eq!(rest.last(), Some(&StreamItem::Event(SessionEvent::Done)));

        // Keep-alives never reach the log
        assert_eq!(channel.len(), 1);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let channel = EventChannel::new(4);
        let subscription = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 1);

        drop(subscription);
        channel.append(thought(0));
        assert_eq!(channel.subscriber_count(), 0);
    }
}
