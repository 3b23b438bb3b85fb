//! One-shot "initialization complete" signal.
//!
//! Checks that depend on every asset being registered wait on an
//! [`InitListener`]. The host fires the paired [`InitTrigger`] once loading
//! is done. Firing consumes the trigger, so the signal can fire at most once.
//! Dropping the trigger without firing releases every waiter with `false`.

use tokio::sync::watch;

/// Name of the lifecycle event this signal stands for.
pub const INIT_COMPLETE: &str = "init_done";

/// Creates a connected trigger/listener pair.
pub fn init_signal() -> (InitTrigger, InitListener) {
    let (tx, rx) = watch::channel(false);
    (InitTrigger { tx }, InitListener { rx })
}

/// Firing side of the init signal. Owned by the host's startup sequence.
#[derive(Debug)]
pub struct InitTrigger {
    tx: watch::Sender<bool>,
}

impl InitTrigger {
    /// Fires the signal. Consumes the trigger.
    pub fn fire(self) {
        tracing::info!("Lifecycle event '{}' fired", INIT_COMPLETE);
        // No listeners left is fine; nothing was waiting.
        let _ = self.tx.send(true);
    }

    /// Returns another listener for this signal.
    pub fn listener(&self) -> InitListener {
        InitListener {
            rx: self.tx.subscribe(),
        }
    }
}

/// Waiting side of the init signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct InitListener {
    rx: watch::Receiver<bool>,
}

impl InitListener {
    /// True once the signal has fired.
    pub fn has_fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits for the signal.
    ///
    /// Returns `true` when it fired, `false` if the trigger was dropped first.
    pub async fn wait(mut self) -> bool {
        let fired = self.rx.wait_for(|fired| *fired).await.is_ok();
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_resolves_after_fire() {
        let (trigger, listener) = init_signal();
        assert!(!listener.has_fired());

        let waiter = tokio::spawn(listener.clone().wait());
        trigger.fire();

        assert!(waiter.await.unwrap());
        assert!(listener.has_fired());
    }

    #[tokio::test]
    async fn test_wait_after_fire_returns_immediately() {
        let (trigger, listener) = init_signal();
        trigger.fire();
        assert!(listener.wait().await);
    }

    #[tokio::test]
    async fn test_dropped_trigger_releases_waiters() {
        let (trigger, listener) = init_signal();
        drop(trigger);
        assert!(!listener.wait().await);
    }

    #[test]
    fn test_extra_listener_sees_fire() {
        let (trigger, _listener) = init_signal();
        let extra = trigger.listener();
        trigger.fire();
        assert!(tokio_test::block_on(extra.wait()));
    }
}
