use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;

use crate::flow::{Scheduler, TimerHandle, TimerTask};

type Inbox = Rc<RefCell<Vec<(TimerHandle, TimerTask)>>>;

/// `setTimeout`-backed timers. A fired timeout only records its handle; the
/// animation frame drains the inbox, so no callback touches the session.
#[derive(Default)]
pub struct WebScheduler {
	next_id: u64,
	inbox: Inbox,
	armed: HashMap<TimerHandle, (i32, Closure<dyn FnMut()>)>,
}

impl WebScheduler {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Scheduler for WebScheduler {
	fn schedule(&mut self, delay_ms: u32, task: TimerTask) -> TimerHandle {
		self.next_id += 1;
		let handle = TimerHandle(self.next_id);
		let Some(window) = web_sys::window() else {
			warn!("no window; timer {handle:?} will never fire");
			return handle;
		};

		let inbox = self.inbox.clone();
		let callback = Closure::<dyn FnMut()>::new(move || {
			inbox.borrow_mut().push((handle, task));
		});
		let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
		match window.set_timeout_with_callback_and_timeout_and_arguments_0(
			callback.as_ref().unchecked_ref(),
			delay,
		) {
			Ok(id) => {
				self.armed.insert(handle, (id, callback));
			}
			Err(err) => warn!("failed to arm timer {handle:?}: {err:?}"),
		}
		handle
	}

	fn cancel(&mut self, handle: TimerHandle) {
		if let Some((id, _callback)) = self.armed.remove(&handle) {
			if let Some(window) = web_sys::window() {
				window.clear_timeout_with_handle(id);
			}
		}
		self.inbox.borrow_mut().retain(|(h, _)| *h != handle);
	}

	fn take_due(&mut self) -> Vec<(TimerHandle, TimerTask)> {
		let due = std::mem::take(&mut *self.inbox.borrow_mut());
		for (handle, _) in &due {
			self.armed.remove(handle);
		}
		due
	}
}
