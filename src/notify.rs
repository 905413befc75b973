//! Change notifications.
//!
//! Every successful mutation publishes the [`Address`] it touched. Subscribers
//! register for a scope (a table, or one row) and only see changes that
//! overlap it. Delivery is a broadcast: a slow subscriber lags on its own and
//! never holds up the publisher or the other subscribers.

use log::*;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::address::Address;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub struct ChangeChannel {
    sender: broadcast::Sender<Address>,
}

impl ChangeChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        ChangeChannel { sender }
    }

    pub fn publish(&self, address: Address) {
        // no receivers is not an error, there is just nobody listening yet
        let delivered = self.sender.send(address).unwrap_or(0);
        debug!("change on {} delivered to {} subscribers", address, delivered);
    }

    pub fn subscribe(&self, scope: Address) -> Subscription {
        Subscription {
            scope,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration handle on a [`ChangeChannel`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    scope: Address,
    receiver: broadcast::Receiver<Address>,
}

impl Subscription {
    pub fn scope(&self) -> Address {
        self.scope
    }

    /// Next pending change in scope, without waiting.
    ///
    /// A subscriber that fell behind gets a single change on its own scope in
    /// place of everything it missed.
    pub fn try_next(&mut self) -> Option<Address> {
        loop {
            match self.receiver.try_recv() {
                Ok(address) if address.overlaps(&self.scope) => return Some(address),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("subscriber on {} lagged by {} changes", self.scope, missed);
                    return Some(self.scope);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Consume every pending change. Returns whether any of them was in scope.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while self.try_next().is_some() {
            changed = true;
        }
        changed
    }

    /// Wait for the next change in scope. `None` once the channel is gone.
    pub async fn changed(&mut self) -> Option<Address> {
        loop {
            match self.receiver.recv().await {
                Ok(address) if address.overlaps(&self.scope) => return Some(address),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    warn!("subscriber on {} lagged by {} changes", self.scope, missed);
                    return Some(self.scope);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
