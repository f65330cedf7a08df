//! Cancellable one-shot timers behind a trait, so the round loop can run on
//! browser timeouts or on a virtual clock in tests.

use std::collections::BTreeMap;

/// Identifies one armed timer. Never reused within a scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// What a timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTask {
	/// Start the next simulation round.
	AdvanceRound,
	/// Take down the round banner.
	ExpireAnnouncement,
}

/// Source of one-shot timers. Firing only queues the timer; the owner runs
/// it on its next [`Scheduler::take_due`].
pub trait Scheduler {
	/// Arms a one-shot timer.
	fn schedule(&mut self, delay_ms: u32, task: TimerTask) -> TimerHandle;

	/// Disarms a timer. Unknown or already-fired handles are ignored.
	fn cancel(&mut self, handle: TimerHandle);

	/// Timers that have fired since the last call, in firing order.
	fn take_due(&mut self) -> Vec<(TimerHandle, TimerTask)>;
}

/// Virtual-clock scheduler. Time only moves through [`ManualScheduler::advance`].
#[derive(Debug, Default)]
pub struct ManualScheduler {
	now_ms: u64,
	next_id: u64,
	/// Keyed by (deadline, handle) so ties fire in arming order.
	pending: BTreeMap<(u64, TimerHandle), TimerTask>,
	due: Vec<(TimerHandle, TimerTask)>,
}

impl ManualScheduler {
	/// A scheduler at time zero.
	pub fn new() -> Self {
		Self::default()
	}

	/// Virtual time elapsed so far.
	pub fn now_ms(&self) -> u64 {
		self.now_ms
	}

	/// Number of armed timers that have not fired yet.
	pub fn pending(&self) -> usize {
		self.pending.len()
	}

	/// Whether `handle` is armed and has not fired.
	pub fn is_pending(&self, handle: TimerHandle) -> bool {
		self.pending.keys().any(|(_, h)| *h == handle)
	}

	/// Moves the clock forward, firing every timer whose deadline is reached.
	pub fn advance(&mut self, ms: u64) {
		self.now_ms += ms;
		while let Some(entry) = self.pending.first_entry() {
			if entry.key().0 > self.now_ms {
				break;
			}
			let ((_, handle), task) = entry.remove_entry();
			self.due.push((handle, task));
		}
	}
}

impl Scheduler for ManualScheduler {
	fn schedule(&mut self, delay_ms: u32, task: TimerTask) -> TimerHandle {
		self.next_id += 1;
		let handle = TimerHandle(self.next_id);
		self.pending
			.insert((self.now_ms + u64::from(delay_ms), handle), task);
		handle
	}

	fn cancel(&mut self, handle: TimerHandle) {
		self.pending.retain(|(_, h), _| *h != handle);
		self.due.retain(|(h, _)| *h != handle);
	}

	fn take_due(&mut self) -> Vec<(TimerHandle, TimerTask)> {
		std::mem::take(&mut self.due)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fires_in_deadline_order() {
		let mut s = ManualScheduler::new();
		let slow = s.schedule(5000, TimerTask::AdvanceRound);
		let fast = s.schedule(3000, TimerTask::ExpireAnnouncement);

		s.advance(2999);
		assert!(s.take_due().is_empty());

		s.advance(2001);
		assert_eq!(
			s.take_due(),
			vec![
				(fast, TimerTask::ExpireAnnouncement),
				(slow, TimerTask::AdvanceRound)
			]
		);
		assert_eq!(s.pending(), 0);
	}

	#[test]
	fn cancelled_timers_never_fire() {
		let mut s = ManualScheduler::new();
		let h = s.schedule(100, TimerTask::AdvanceRound);
		assert!(s.is_pending(h));
		s.cancel(h);
		s.advance(1000);
		assert!(s.take_due().is_empty());

		// Cancelling after it fired but before it was collected also drops it.
		let h = s.schedule(10, TimerTask::AdvanceRound);
		s.advance(10);
		s.cancel(h);
		assert!(s.take_due().is_empty());
	}
}
