//! Change notification fan-out.
//!
//! A zero-argument "progression changed" signal. Every fire bumps a generation
//! counter on a `tokio::sync::watch` channel, so subscribers that lag simply
//! see the latest generation and never queue up stale signals. Dropping (or
//! calling [`Subscription::cancel`]) a subscription detaches only that subscriber.

use tokio::sync::watch;

#[derive(Debug)]
pub struct ChangeNotifier {
    tx: watch::Sender<u64>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Signal every subscriber. Works with zero subscribers.
    pub fn notify(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    /// Number of notifications fired so far.
    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> Subscription {
        // Values sent before subscribing count as seen.
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<u64>,
}

impl Subscription {
    /// Wait for the next notification. Returns the generation reached, or
    /// `None` once the notifier is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Non-blocking check; consumes the pending notification if there is one.
    pub fn try_changed(&mut self) -> bool {
        match self.rx.has_changed() {
            Ok(true) => {
                self.rx.borrow_and_update();
                true
            }
            _ => false,
        }
    }

    /// Detach this subscriber. Other subscribers are unaffected.
    pub fn cancel(self) {}
}
