use std::sync::{Arc, Mutex};
use std::thread;

use vaat::DefaultTag;
use vaat_compose::FutureMutex;

#[test]
fn uncontended_lock_resolves_immediately() {
    let mutex = FutureMutex::<DefaultTag>::new();
    let locked = Arc::new(Mutex::new(false));
    let observed = locked.clone();
    mutex.async_lock().finally(move |guard| {
        assert!(guard.holds_lock());
        *observed.lock().unwrap() = true;
    });
    assert!(*locked.lock().unwrap());
}

#[test]
fn try_lock_respects_the_holder() {
    let mutex = FutureMutex::<DefaultTag>::new();
    let guard = mutex.try_lock().unwrap();
    assert!(mutex.try_lock().is_none());
    drop(guard);
    assert!(mutex.try_lock().is_some());
}

#[test]
fn waiters_are_granted_in_fifo_request_order() {
    let mutex = FutureMutex::<DefaultTag>::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = mutex.try_lock().unwrap();

    // Queue N waiters while the lock is held; each records its index and
    // releases immediately, cascading the grant down the queue.
    for i in 0..10u32 {
        let order = order.clone();
        mutex.async_lock().finally(move |guard| {
            order.lock().unwrap().push(i);
            drop(guard);
        });
    }

    assert!(order.lock().unwrap().is_empty());
    drop(first);

    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<u32>>());
}

#[test]
#[cfg_attr(miri, ignore)]
fn critical_sections_never_overlap() {
    let mutex = FutureMutex::<DefaultTag>::new();
    let in_section = Arc::new(Mutex::new(0u32));
    let mut handles = Vec::new();

    for _ in 0..8 {
        let mutex = mutex.clone();
        let in_section = in_section.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                let in_section = in_section.clone();
                mutex.async_lock().finally(move |guard| {
                    {
                        let mut count = in_section.lock().unwrap();
                        *count += 1;
                        assert_eq!(*count, 1);
                        *count -= 1;
                    }
                    drop(guard);
                });
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
    assert!(mutex.try_lock().is_some());
}

#[test]
fn waiters_survive_the_mutex_handle_being_dropped() {
    // The queue lives as long as any guard does; dropping the mutex handle
    // while a holder exists must not strand the waiters.
    let mutex = FutureMutex::<DefaultTag>::new();
    let holder = mutex.try_lock().unwrap();
    let waiter = mutex.async_lock();

    let outcome = Arc::new(Mutex::new(None));
    let seen = outcome.clone();
    waiter.finally(move |guard| {
        *seen.lock().unwrap() = Some(guard.holds_lock());
    });

    drop(mutex);
    drop(holder);

    assert_eq!(*outcome.lock().unwrap(), Some(true));
}

#[test]
fn abandoned_lock_future_yields_an_inert_guard() {
    // A lock future whose promise dies resolves to a guard that holds
    // nothing and unlocks nothing rather than hanging forever.
    use vaat::Future;
    use vaat_compose::LockGuard;

    let guard = Future::<LockGuard<DefaultTag>, DefaultTag>::abandoned().wait();
    assert!(!guard.holds_lock());
}
