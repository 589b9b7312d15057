//! Overlap policy and the per-job running marker.
//!
//! Each job owns a [`JobGate`]. A firing has to enter the gate before its
//! action is spawned; the returned [`RunPermit`] leaves the gate on drop,
//! including when the action panics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Policy for a firing that arrives while a previous run is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OverlapPolicy {
    /// Drop the firing. At most one instance of the job runs at a time.
    #[default]
    Skip,

    /// Start another instance alongside the running one.
    Concurrent,
}

/// Running/idle marker for one job.
///
/// The in-flight count is the only state and it is changed with atomic
/// operations, so a firing and a completing run cannot both see the job as
/// idle.
#[derive(Debug)]
pub struct JobGate {
    policy: OverlapPolicy,
    in_flight: AtomicUsize,
}

impl JobGate {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Try to start a run.
    ///
    /// Under `Skip` this succeeds only when nothing is in flight (0 -> 1
    /// compare-exchange). Under `Concurrent` it always succeeds.
    pub fn try_enter(self: &Arc<Self>) -> Option<RunPermit> {
        let entered = match self.policy {
            OverlapPolicy::Skip => self
                .in_flight
                .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
            OverlapPolicy::Concurrent => {
                self.in_flight.fetch_add(1, Ordering::AcqRel);
                true
            }
        };

        entered.then(|| RunPermit {
            gate: Arc::clone(self),
        })
    }

    pub fn is_running(&self) -> bool {
        self.in_flight() > 0
    }

    /// Number of runs currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }
}

/// Proof that a run is in flight. Dropping it marks the run finished.
#[derive(Debug)]
pub struct RunPermit {
    gate: Arc<JobGate>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_skip_blocks_second_entry() {
        let gate = Arc::new(JobGate::new(OverlapPolicy::Skip));

        let first = gate.try_enter();
        assert!(first.is_some());
        assert!(gate.is_running());

        assert!(gate.try_enter().is_none());
        assert_eq!(gate.in_flight(), 1);

        drop(first);
        assert!(!gate.is_running());
        assert!(gate.try_enter().is_some());
    }

    #[test]
    fn test_concurrent_counts_every_entry() {
        let gate = Arc::new(JobGate::new(OverlapPolicy::Concurrent));

        let a = gate.try_enter().unwrap();
        let b = gate.try_enter().unwrap();
        assert_eq!(gate.in_flight(), 2);

        drop(a);
        assert!(gate.is_running());
        drop(b);
        assert!(!gate.is_running());
    }

    #[test]
    fn test_permit_released_on_panic() {
        let gate = Arc::new(JobGate::new(OverlapPolicy::Skip));
        let worker_gate = gate.clone();

        let result = thread::spawn(move || {
            let _permit = worker_gate.try_enter().unwrap();
            panic!("job body panicked");
        })
        .join();

        assert!(result.is_err());
        assert!(!gate.is_running());
    }

    #[test]
    fn test_skip_never_admits_two_threads() {
        let gate = Arc::new(JobGate::new(OverlapPolicy::Skip));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let admitted = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = gate.clone();
                let max_seen = max_seen.clone();
                let admitted = admitted.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        if let Some(_permit) = gate.try_enter() {
                            admitted.fetch_add(1, Ordering::SeqCst);
                            max_seen.fetch_max(gate.in_flight(), Ordering::SeqCst);
                            thread::sleep(Duration::from_micros(50));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(admitted.load(Ordering::SeqCst) >= 1);
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(!gate.is_running());
    }

    #[test]
    fn test_default_policy_is_skip() {
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::Skip);
        let gate = JobGate::new(OverlapPolicy::default());
        assert_eq!(gate.policy(), OverlapPolicy::Skip);
    }
}
