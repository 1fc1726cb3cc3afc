//! Plain task executor.
//!
//! A bounded pool of worker threads with two submission modes:
//!
//! - `ordered`: tasks pushed to the same `OrderedQueue` run sequentially, in
//!   submission order, on some worker thread. Different queues are
//!   independent.
//! - `parallel`: a batch of work items fans out over the pool; the join
//!   callback is invoked exactly once, by whichever worker finishes the last
//!   item, with the first error if any item failed.
//!
//! The executor owns no domain state. Cooperative cancellation is carried by
//! a `StopSignal` polled by the tasks themselves.

#[macro_use]
extern crate log;
extern crate parking_lot;

use std::cmp;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use parking_lot::{Mutex, Condvar};

/// Shared cancellation flag, polled at pipeline stage boundaries.
#[derive(Clone)]
pub struct StopSignal {
	stopped: Arc<AtomicBool>,
}

impl Default for StopSignal {
	fn default() -> Self {
		StopSignal {
			stopped: Arc::new(AtomicBool::new(false)),
		}
	}
}

impl StopSignal {
	pub fn new() -> Self {
		StopSignal::default()
	}

	pub fn stop(&self) {
		self.stopped.store(true, Ordering::SeqCst);
	}

	/// Clears the flag so the owning service can be started again.
	pub fn reset(&self) {
		self.stopped.store(false, Ordering::SeqCst);
	}

	pub fn is_stopped(&self) -> bool {
		self.stopped.load(Ordering::SeqCst)
	}
}

type Task = Box<FnOnce() + Send + 'static>;

struct Shared {
	queue: Mutex<VecDeque<Task>>,
	available: Condvar,
	shutdown: AtomicBool,
}

impl Shared {
	fn push(&self, task: Task) {
		self.queue.lock().push_back(task);
		self.available.notify_one();
	}
}

/// Bounded worker pool.
pub struct Dispatcher {
	shared: Arc<Shared>,
	workers: Vec<thread::JoinHandle<()>>,
}

impl Dispatcher {
	pub fn new(size: usize, name: &str) -> Self {
		let size = cmp::max(1, size);
		let shared = Arc::new(Shared {
			queue: Mutex::new(VecDeque::new()),
			available: Condvar::new(),
			shutdown: AtomicBool::new(false),
		});

		let workers = (0..size).map(|index| {
			let shared = shared.clone();
			thread::Builder::new()
				.name(format!("{} worker #{}", name, index))
				.spawn(move || Dispatcher::worker_proc(shared))
				.expect("Error creating dispatcher thread")
		}).collect();

		Dispatcher {
			shared: shared,
			workers: workers,
		}
	}

	/// Number of worker threads.
	pub fn size(&self) -> usize {
		self.workers.len()
	}

	/// Schedules a task on any worker.
	pub fn execute<F>(&self, f: F) where F: FnOnce() + Send + 'static {
		self.shared.push(Box::new(f));
	}

	/// Creates a new FIFO whose tasks are serialized against one another.
	pub fn ordered(&self) -> OrderedQueue {
		OrderedQueue {
			shared: self.shared.clone(),
			state: Arc::new(OrderedState {
				inner: Mutex::new(OrderedInner {
					pending: VecDeque::new(),
					running: false,
				}),
			}),
		}
	}

	/// Fans `items` out over the pool and joins once.
	///
	/// The join callback receives the first error produced by `work`, and is
	/// invoked by the worker that finishes the last item. Cancellation is
	/// signalled by `work` returning an error; the group result is then that
	/// error, though remaining items still run (each is expected to
	/// short-circuit on the same stop signal).
	pub fn parallel<I, W, J, E>(&self, items: Vec<I>, work: W, join: J)
		where
			I: Send + 'static,
			W: Fn(I) -> Result<(), E> + Send + Sync + 'static,
			J: FnOnce(Result<(), E>) + Send + 'static,
			E: Send + 'static,
	{
		if items.is_empty() {
			join(Ok(()));
			return;
		}

		let state = Arc::new(ParallelState {
			remaining: Mutex::new(items.len()),
			error: Mutex::new(None),
			join: Mutex::new(Some(Box::new(join) as Box<FnOnce(Result<(), E>) + Send>)),
		});
		let work = Arc::new(work);

		for item in items {
			let state = state.clone();
			let work = work.clone();
			self.execute(move || {
				let result = work(item);
				ParallelState::complete(&state, result);
			});
		}
	}

	fn worker_proc(shared: Arc<Shared>) {
		loop {
			let task = {
				let mut queue = shared.queue.lock();
				loop {
					if let Some(task) = queue.pop_front() {
						break Some(task);
					}
					if shared.shutdown.load(Ordering::SeqCst) {
						break None;
					}
					shared.available.wait(&mut queue);
				}
			};

			match task {
				Some(task) => task(),
				None => return,
			}
		}
	}
}

impl Drop for Dispatcher {
	fn drop(&mut self) {
		trace!(target: "dispatcher", "Stopping dispatcher threads");
		self.shared.shutdown.store(true, Ordering::SeqCst);
		self.shared.available.notify_all();
		for worker in self.workers.drain(..) {
			worker.join().expect("Clean shutdown.");
		}
	}
}

/// Per-owner FIFO handle. Tasks pushed here never overlap and run in
/// submission order.
#[derive(Clone)]
pub struct OrderedQueue {
	shared: Arc<Shared>,
	state: Arc<OrderedState>,
}

struct OrderedState {
	inner: Mutex<OrderedInner>,
}

struct OrderedInner {
	pending: VecDeque<Task>,
	running: bool,
}

impl OrderedQueue {
	pub fn push<F>(&self, f: F) where F: FnOnce() + Send + 'static {
		{
			let mut inner = self.state.inner.lock();
			if inner.running {
				inner.pending.push_back(Box::new(f));
				return;
			}
			inner.running = true;
		}

		self.dispatch(Box::new(f));
	}

	fn dispatch(&self, task: Task) {
		let state = self.state.clone();
		self.shared.push(Box::new(move || {
			let mut task = task;
			loop {
				task();

				let next = {
					let mut inner = state.inner.lock();
					match inner.pending.pop_front() {
						Some(next) => next,
						None => {
							inner.running = false;
							return;
						},
					}
				};
				task = next;
			}
		}));
	}
}

struct ParallelState<E> {
	remaining: Mutex<usize>,
	error: Mutex<Option<E>>,
	join: Mutex<Option<Box<FnOnce(Result<(), E>) + Send>>>,
}

impl<E> ParallelState<E> {
	fn complete(state: &Arc<Self>, result: Result<(), E>) {
		if let Err(error) = result {
			let mut first = state.error.lock();
			if first.is_none() {
				*first = Some(error);
			}
		}

		let finished = {
			let mut remaining = state.remaining.lock();
			*remaining -= 1;
			*remaining == 0
		};

		if finished {
			let join = state.join.lock().take().expect("the last completion takes the join exactly once; qed");
			let error = state.error.lock().take();
			join(match error {
				Some(error) => Err(error),
				None => Ok(()),
			});
		}
	}
}
