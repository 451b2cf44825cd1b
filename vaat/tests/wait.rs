//! The blocking escape hatch: wait and wait_for.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use vaat::{pair, Abandoned, DefaultTag, Future};

#[test]
fn wait_returns_an_already_known_value() {
    assert_eq!(Future::<u32, DefaultTag>::ready(11).wait(), 11);
}

#[test]
fn wait_blocks_until_fulfillment() {
    let (p, f) = pair::<u32, DefaultTag>();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        p.fulfill(5);
    });
    assert_eq!(f.wait(), 5);
    t.join().unwrap();
}

#[test]
fn wait_for_returns_some_before_timeout() {
    let (p, f) = pair::<u32, DefaultTag>();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        p.fulfill(5);
    });
    assert_eq!(f.wait_for(Duration::from_secs(5)), Some(5));
    t.join().unwrap();
}

#[test]
fn wait_for_times_out_on_a_silent_promise() {
    let (p, f) = pair::<u32, DefaultTag>();
    let started = Instant::now();
    assert_eq!(f.wait_for(Duration::from_millis(30)), None);
    assert!(started.elapsed() >= Duration::from_millis(30));
    drop(p);
}

struct LateValue;

static LATE_SWALLOWED: AtomicUsize = AtomicUsize::new(0);

impl Abandoned<DefaultTag> for LateValue {
    fn abandoned_promise() -> Self {
        LateValue
    }

    fn abandoned_future(self) {
        LATE_SWALLOWED.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn value_arriving_after_timeout_counts_as_future_abandonment() {
    let (p, f) = pair::<LateValue, DefaultTag>();
    assert!(f.wait_for(Duration::from_millis(10)).is_none());

    // The waiter detached; the late fulfillment must route to the
    // abandoned-future hook, not vanish.
    p.fulfill(LateValue);
    assert_eq!(LATE_SWALLOWED.load(Ordering::Relaxed), 1);
}

#[test]
fn wait_observes_a_chained_transform() {
    let (p, f) = pair::<u32, DefaultTag>();
    let doubled = f.and_then(|v| v * 2);
    let t = thread::spawn(move || p.fulfill(8));
    assert_eq!(doubled.wait(), 16);
    t.join().unwrap();
}

#[test]
#[cfg_attr(miri, ignore)]
fn many_waiters_wake_independently() {
    let waiters: Vec<_> = (0..8u32)
        .map(|i| {
            let (p, f) = pair::<u32, DefaultTag>();
            let h = thread::spawn(move || assert_eq!(f.wait(), i));
            (p, i, h)
        })
        .collect();

    let mut handles = Vec::new();
    for (p, i, h) in waiters {
        p.fulfill(i);
        handles.push(h);
    }
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn wait_result_is_order_independent() {
    // Fulfill before wait: the inline short path inside finally.
    let (p, f) = pair::<u32, DefaultTag>();
    p.fulfill(1);
    assert_eq!(f.wait(), 1);

    let deliveries = Arc::new(AtomicUsize::new(0));
    let d = deliveries.clone();
    let (p, f) = pair::<u32, DefaultTag>();
    p.fulfill(2);
    f.finally(move |_| {
        d.fetch_add(1, Ordering::Relaxed);
    });
    assert_eq!(deliveries.load(Ordering::Relaxed), 1);
}
