use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast topic with bounded capacity.
/// `T` must be `Send + Sync` because we hop across threads.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes to every current subscriber. Publishing with no subscriber
    /// drops the message.
    pub fn publish(&self, msg: T) {
        let _ = self.tx.send(Arc::new(msg));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

/// Drains `rx` and returns the newest message, if any arrived since the last call.
///
/// Lagging is not an error here: the skipped messages were stale anyway.
pub fn latest<T: Clone>(
    rx: &mut broadcast::Receiver<Arc<T>>,
) -> Result<Option<T>, broadcast::error::TryRecvError> {
    let mut newest = None;
    loop {
        match rx.try_recv() {
            Ok(msg) => newest = Some((*msg).clone()),
            Err(broadcast::error::TryRecvError::Empty) => return Ok(newest),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Receiver lagged, skipping to newer messages");
            }
            Err(e @ broadcast::error::TryRecvError::Closed) => {
                return match newest {
                    Some(_) => Ok(newest),
                    None => Err(e),
                };
            }
        }
    }
}
