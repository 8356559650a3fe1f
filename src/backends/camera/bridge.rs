// SPDX-License-Identifier: MPL-2.0

//! Callback-to-future bridge
//!
//! Collaborators report results through one-shot callbacks. [`bridge`] pairs a
//! [`Resolver`] (moved into the callback) with a [`Pending`] future the caller
//! awaits. The value is delivered at most once; if the awaiting side has gone
//! away the value is dropped on the spot.

use futures::channel::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why a [`Pending`] did not produce a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abandoned {
    /// The cancellation token fired first
    Cancelled,
    /// The resolver was dropped without resolving
    Dropped,
}

/// Resolving half, moved into the callback
#[derive(Debug)]
pub struct Resolver<T> {
    sender: oneshot::Sender<T>,
    label: &'static str,
}

/// Awaiting half
#[derive(Debug)]
pub struct Pending<T> {
    receiver: oneshot::Receiver<T>,
}

/// Create a connected resolver/pending pair. `label` names the operation in logs.
pub fn bridge<T>(label: &'static str) -> (Resolver<T>, Pending<T>) {
    let (sender, receiver) = oneshot::channel();
    (Resolver { sender, label }, Pending { receiver })
}

impl<T> Resolver<T> {
    /// Deliver the value. Returns false when nobody is waiting any more.
    pub fn resolve(self, value: T) -> bool {
        match self.sender.send(value) {
            Ok(()) => true,
            Err(_) => {
                debug!(operation = self.label, "Result arrived after the caller left");
                false
            }
        }
    }
}

impl<T> Pending<T> {
    /// Wait for the value, giving up when `cancel` fires
    pub async fn wait(self, cancel: &CancellationToken) -> Result<T, Abandoned> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Abandoned::Cancelled),
            result = self.receiver => result.map_err(|_| Abandoned::Dropped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_once() {
        let (resolver, pending) = bridge::<u32>("test");
        assert!(resolver.resolve(7));
        assert_eq!(pending.wait(&CancellationToken::new()).await, Ok(7));
    }

    #[tokio::test]
    async fn test_resolves_from_another_task() {
        let (resolver, pending) = bridge::<&str>("test");
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            resolver.resolve("provider");
        });
        assert_eq!(
            pending.wait(&CancellationToken::new()).await,
            Ok("provider")
        );
    }

    #[tokio::test]
    async fn test_dropped_resolver() {
        let (resolver, pending) = bridge::<u32>("test");
        drop(resolver);
        assert_eq!(
            pending.wait(&CancellationToken::new()).await,
            Err(Abandoned::Dropped)
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_resolution() {
        let (resolver, pending) = bridge::<u32>("test");
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(pending.wait(&cancel).await, Err(Abandoned::Cancelled));
        // The late value is discarded rather than delivered
        assert!(!resolver.resolve(1));
    }
}
