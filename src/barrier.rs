//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! `OnceBarrier` (component K): a mix of a once-cell and a barrier.
//! `total_arrivals` threads each call `arrive_and_wait`; the thread whose
//! arrival brings the count to zero runs `once` itself before waking the
//! rest, rather than handing it to a dedicated background thread. That
//! ordering matters for the lazy multi-map's finalize step (§4.3): the
//! thread that finishes the hash directory build is on the same path
//! that's about to probe it, so there's no extra wakeup latency on the
//! critical path.

use std::sync::{Condvar, Mutex};

struct State {
    pending: usize,
    once: Option<Box<dyn FnOnce() + Send>>,
}

pub struct OnceBarrier {
    state: Mutex<State>,
    cv: Condvar,
}

impl OnceBarrier {
    pub fn new(total_arrivals: usize, once: impl FnOnce() + Send + 'static) -> Self {
        assert!(total_arrivals > 0, "a barrier needs at least one arrival");
        OnceBarrier {
            state: Mutex::new(State {
                pending: total_arrivals,
                once: Some(Box::new(once)),
            }),
            cv: Condvar::new(),
        }
    }

    /// Register one arrival and block until every arrival has happened
    /// and `once` has run. The arrival that brings `pending` to zero
    /// calls `once` itself, then wakes everyone else.
    pub fn arrive_and_wait(&self) {
        let mut guard = self.state.lock().expect("barrier mutex poisoned");
        guard.pending -= 1;
        if guard.pending == 0 {
            if let Some(f) = guard.once.take() {
                f();
            }
            self.cv.notify_all();
            return;
        }
        let _guard = self
            .cv
            .wait_while(guard, |s| s.pending != 0)
            .expect("barrier mutex poisoned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn once_runs_exactly_once_and_every_arrival_unblocks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_for_once = Arc::clone(&calls);
        let barrier = Arc::new(OnceBarrier::new(4, move || {
            calls_for_once.fetch_add(1, Ordering::SeqCst);
        }));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || barrier.arrive_and_wait())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn single_arrival_runs_once_inline() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_for_once = Arc::clone(&ran);
        let barrier = OnceBarrier::new(1, move || {
            ran_for_once.fetch_add(1, Ordering::SeqCst);
        });
        barrier.arrive_and_wait();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
