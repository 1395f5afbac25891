// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-flight gate.
//
// One gate per triggering control. The flag doubles as the observable
// "export in progress" signal the UI binds its disabled state to.

use std::sync::Arc;

use tokio::sync::watch;

/// At most one holder at a time; observers see `true` while held.
#[derive(Debug, Clone)]
pub struct InFlightGate {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for InFlightGate {
    fn default() -> Self {
        Self::new()
    }
}

impl InFlightGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { flag: Arc::new(tx) }
    }

    /// Flip the flag from `false` to `true`. Returns `None` if it was
    /// already set.
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        let acquired = self.flag.send_if_modified(|busy| {
            if *busy {
                false
            } else {
                *busy = true;
                true
            }
        });
        acquired.then(|| InFlightGuard {
            flag: Arc::clone(&self.flag),
        })
    }

    pub fn is_in_flight(&self) -> bool {
        *self.flag.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.flag.subscribe()
    }
}

/// Clears the in-flight flag when dropped, on every exit path.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<watch::Sender<bool>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused() {
        let gate = InFlightGate::new();
        let guard = gate.try_acquire().expect("first");
        assert!(gate.try_acquire().is_none());
        assert!(gate.is_in_flight());
        drop(guard);
        assert!(!gate.is_in_flight());
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn observers_see_both_edges() {
        let gate = InFlightGate::new();
        let mut rx = gate.subscribe();
        assert!(!*rx.borrow_and_update());

        let guard = gate.try_acquire().expect("acquire");
        rx.changed().await.expect("raised");
        assert!(*rx.borrow_and_update());

        drop(guard);
        rx.changed().await.expect("lowered");
        assert!(!*rx.borrow_and_update());
    }
}
