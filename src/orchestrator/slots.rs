use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct SlotState {
    active: usize,
    peak: usize,
}

/// Counting semaphore bounding how many jobs are in flight at once.
///
/// Acquiring blocks until a slot is free; the returned guard releases the slot when dropped,
/// whatever the job's outcome.
#[derive(Debug)]
pub struct WorkerSlots {
    capacity: usize,
    state: Mutex<SlotState>,
    freed: Condvar,
}

impl WorkerSlots {
    /// Semaphore with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(SlotState::default()),
            freed: Condvar::new(),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Block until a slot is free and take it.
    pub fn acquire(&self) -> SlotGuard<'_> {
        let mut state = self.lock();
        while state.active >= self.capacity {
            state = self
                .freed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        self.take(&mut state);
        SlotGuard { slots: self }
    }

    /// Take a slot if one is free.
    pub fn try_acquire(&self) -> Option<SlotGuard<'_>> {
        let mut state = self.lock();
        if state.active >= self.capacity {
            return None;
        }
        self.take(&mut state);
        Some(SlotGuard { slots: self })
    }

    /// Slots currently held.
    pub fn active(&self) -> usize {
        self.lock().active
    }

    /// Highest number of slots held at the same time.
    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    fn take(&self, state: &mut SlotState) {
        state.active += 1;
        state.peak = state.peak.max(state.active);
    }

    fn release(&self) {
        let mut state = self.lock();
        state.active = state.active.saturating_sub(1);
        drop(state);
        self.freed.notify_one();
    }

    // A panicking job must not wedge the other workers.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A held worker slot.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    slots: &'a WorkerSlots,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slots.release();
    }
}
