use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::render::domain::render_error::RenderError;

/// Bounds how many renders run at once.
///
/// Holds `capacity` tokens in a bounded channel; a job takes one before it
/// submits and the [`RenderPermit`] puts it back when dropped.
#[derive(Clone)]
pub struct RenderAdmission {
    take: Receiver<()>,
    give: Sender<()>,
    capacity: usize,
}

pub struct RenderPermit {
    give: Sender<()>,
}

impl RenderAdmission {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (give, take) = bounded(capacity);
        for _ in 0..capacity {
            let _ = give.send(());
        }
        Self {
            take,
            give,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.take.len()
    }

    /// Block until a slot is free, or until `timeout` elapses.
    pub fn acquire(&self, timeout: Option<Duration>) -> Result<RenderPermit, RenderError> {
        let token = match timeout {
            Some(limit) => self
                .take
                .recv_timeout(limit)
                .map_err(|_| RenderError::AdmissionTimeout(limit)),
            // The pool holds its own sender, so this never disconnects.
            None => self
                .take
                .recv()
                .map_err(|_| RenderError::AdmissionTimeout(Duration::ZERO)),
        };
        token.map(|()| RenderPermit {
            give: self.give.clone(),
        })
    }
}

impl Drop for RenderPermit {
    fn drop(&mut self) {
        let _ = self.give.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_capacity_is_clamped_to_one() {
        let admission = RenderAdmission::new(0);
        assert_eq!(admission.capacity(), 1);
        assert_eq!(admission.available(), 1);
    }

    #[test]
    fn test_permit_returns_slot_on_drop() {
        let admission = RenderAdmission::new(2);
        let first = admission.acquire(None).unwrap();
        let _second = admission.acquire(None).unwrap();
        assert_eq!(admission.available(), 0);

        drop(first);
        assert_eq!(admission.available(), 1);
    }

    #[test]
    fn test_acquire_times_out_when_full() {
        let admission = RenderAdmission::new(1);
        let _held = admission.acquire(None).unwrap();

        let err = admission
            .acquire(Some(Duration::from_millis(50)))
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::AdmissionTimeout(_)));
    }

    #[test]
    fn test_never_more_than_capacity_concurrently() {
        let admission = RenderAdmission::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let admission = admission.clone();
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    let _permit = admission.acquire(None).unwrap();
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(admission.available(), 2);
    }
}
