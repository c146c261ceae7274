//! Telling interested parties that the gateway table changed.

use tokio::sync::{mpsc, watch};

//------------ GatewayListener -----------------------------------------------

/// A receiver of gateway table change notifications.
///
/// The notification carries no data. A listener is expected to fetch the
/// gateways it is interested in from the
/// [`NetworkManager`](super::manager::NetworkManager) when it sees fit.
///
/// Listeners are called after the manager has released its internal lock,
/// so they may call any method of the manager. They are called from
/// whichever task or thread made the change and should return quickly.
/// When changes race, the listener may be called once for several of them
/// but never for an older table after a newer one.
pub trait GatewayListener: Send + Sync {
    /// Called after a new, different gateway table was published.
    fn gateways_changed(&self);
}

impl<F: Fn() + Send + Sync> GatewayListener for F {
    fn gateways_changed(&self) {
        (self)()
    }
}

impl GatewayListener for mpsc::UnboundedSender<()> {
    fn gateways_changed(&self) {
        // A closed channel just means nobody is listening anymore.
        let _ = self.send(());
    }
}

impl GatewayListener for watch::Sender<u64> {
    fn gateways_changed(&self) {
        self.send_modify(|count| *count = count.wrapping_add(1));
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn closure_listener() {
        let count = Arc::new(AtomicUsize::new(0));
        let listener: Box<dyn GatewayListener> = {
            let count = count.clone();
            Box::new(move || {
                count.fetch_add(1, Ordering::Relaxed);
            })
        };
        listener.gateways_changed();
        listener.gateways_changed();
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn channel_listeners() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.gateways_changed();
        assert_eq!(rx.try_recv(), Ok(()));
        drop(rx);
        tx.gateways_changed();

        let (tx, rx) = watch::channel(0u64);
        tx.gateways_changed();
        tx.gateways_changed();
        assert_eq!(*rx.borrow(), 2);
    }
}
