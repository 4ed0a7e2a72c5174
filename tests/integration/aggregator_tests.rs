//! Aggregator behaviour across threads: rendezvous publish, concurrent
//! fan-out, lifecycle rules and shutdown without cancellation.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use brewctl::aggregator::{Aggregator, LifecycleState, dispatch_sequence};
use brewctl::error::{Error, LifecycleError};
use brewctl::events::Event;

use super::helpers::{Gate, TIMEOUT, wait_until};

#[test]
fn publish_returns_after_fan_out_is_spawned() {
    let agg = Arc::new(Aggregator::new());
    let gate = Gate::new();
    let entered = Arc::new(AtomicUsize::new(0));
    {
        let gate = gate.clone();
        let entered = Arc::clone(&entered);
        agg.subscribe_fn(
            move |_| {
                entered.fetch_add(1, Ordering::SeqCst);
                gate.wait();
            },
            &[Event::BrewButtonPushed],
        );
    }
    agg.start().unwrap();

    agg.publish(Event::BrewButtonPushed);
    // The handler is counted before publish returns, even if its thread
    // has not been scheduled yet.
    assert_eq!(agg.in_flight(), 1);
    assert_eq!(agg.dispatched(), 1);
    assert!(wait_until(TIMEOUT, || entered.load(Ordering::SeqCst) == 1));

    gate.release();
    assert!(agg.wait_idle(TIMEOUT));
    agg.stop();
}

#[test]
fn slow_handler_does_not_block_the_next_event() {
    let agg = Arc::new(Aggregator::new());
    let gate = Gate::new();
    let fast_hits = Arc::new(AtomicUsize::new(0));
    {
        let gate = gate.clone();
        agg.subscribe_fn(move |_| gate.wait(), &[Event::BoilerEmpty]);
    }
    {
        let fast_hits = Arc::clone(&fast_hits);
        agg.subscribe_fn(
            move |_| {
                fast_hits.fetch_add(1, Ordering::SeqCst);
            },
            &[Event::BoilerNotEmpty],
        );
    }
    agg.start().unwrap();

    agg.publish(Event::BoilerEmpty);
    agg.publish(Event::BoilerNotEmpty);
    assert!(wait_until(TIMEOUT, || fast_hits.load(Ordering::SeqCst) == 1));
    assert_eq!(agg.in_flight(), 1);

    gate.release();
    assert!(agg.wait_idle(TIMEOUT));
    agg.stop();
}

#[test]
fn every_subscriber_sees_every_event_once() {
    let agg = Arc::new(Aggregator::new());
    let seen: Arc<Mutex<Vec<(usize, Event)>>> = Arc::new(Mutex::new(Vec::new()));
    for id in 0..3 {
        let seen = Arc::clone(&seen);
        agg.subscribe_fn(move |e| seen.lock().unwrap().push((id, e)), &Event::ALL);
    }
    agg.start().unwrap();

    for event in Event::ALL {
        agg.publish(event);
    }
    assert!(agg.wait_idle(TIMEOUT));
    agg.stop();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    let mut expected: Vec<(usize, Event)> = (0..3)
        .flat_map(|id| Event::ALL.into_iter().map(move |e| (id, e)))
        .collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn concurrent_publishers_are_all_accepted() {
    let agg = Arc::new(Aggregator::new());
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = Arc::clone(&hits);
        agg.subscribe_fn(
            move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            },
            &Event::ALL,
        );
    }
    agg.start().unwrap();

    let publishers: Vec<_> = (0..4)
        .map(|n| {
            let agg = Arc::clone(&agg);
            thread::spawn(move || {
                for i in 0..25 {
                    agg.publish(Event::ALL[(n + i) % Event::COUNT]);
                }
            })
        })
        .collect();
    for p in publishers {
        p.join().unwrap();
    }

    assert_eq!(agg.dispatched(), 100);
    assert!(agg.wait_idle(TIMEOUT));
    assert_eq!(hits.load(Ordering::SeqCst), 100);
    agg.stop();
}

#[test]
fn publish_before_start_waits_for_start() {
    let agg = Arc::new(Aggregator::new());
    let done = Arc::new(AtomicBool::new(false));
    let publisher = {
        let agg = Arc::clone(&agg);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            agg.publish(Event::WarmerPlateEmpty);
            done.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(30));
    assert!(!done.load(Ordering::SeqCst));

    agg.start().unwrap();
    publisher.join().unwrap();
    assert!(done.load(Ordering::SeqCst));
    assert_eq!(agg.dispatched(), 1);
    agg.stop();
}

#[test]
fn stop_lets_running_handlers_finish() {
    let agg = Arc::new(Aggregator::new());
    let gate = Gate::new();
    let finished = Arc::new(AtomicBool::new(false));
    {
        let gate = gate.clone();
        let finished = Arc::clone(&finished);
        agg.subscribe_fn(
            move |_| {
                gate.wait();
                finished.store(true, Ordering::SeqCst);
            },
            &[Event::WarmerPlatePotEmpty],
        );
    }
    agg.start().unwrap();
    agg.publish(Event::WarmerPlatePotEmpty);

    agg.stop();
    assert_eq!(agg.state(), LifecycleState::Stopped);
    assert!(!agg.wait_idle(Duration::from_millis(20)));

    gate.release();
    assert!(agg.wait_idle(TIMEOUT));
    assert!(finished.load(Ordering::SeqCst));
}

#[test]
fn stopped_aggregator_rejects_start_and_publish() {
    let agg = Arc::new(Aggregator::new());
    agg.start().unwrap();
    agg.stop();

    assert_eq!(
        agg.start(),
        Err(Error::Lifecycle(LifecycleError::Stopped))
    );
    assert_eq!(
        agg.try_publish(Event::BoilerEmpty),
        Err(Error::Lifecycle(LifecycleError::Stopped))
    );
}

#[test]
#[should_panic(expected = "cannot publish BrewButtonPushed")]
fn publish_after_stop_is_fatal() {
    let agg = Arc::new(Aggregator::new());
    agg.start().unwrap();
    agg.stop();
    agg.publish(Event::BrewButtonPushed);
}

#[test]
fn fan_out_begins_in_publish_order() {
    let agg = Arc::new(Aggregator::new());
    let seen: Arc<Mutex<Vec<(u64, Event)>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        agg.subscribe_fn(
            move |e| {
                let seq = dispatch_sequence().expect("handler runs under a dispatch");
                seen.lock().unwrap().push((seq, e));
            },
            &Event::ALL,
        );
    }
    agg.start().unwrap();

    let published: Vec<Event> = (0..40).map(|i| Event::ALL[(i * 3) % Event::COUNT]).collect();
    for event in &published {
        agg.publish(*event);
    }
    assert!(agg.wait_idle(TIMEOUT));
    agg.stop();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort_by_key(|(seq, _)| *seq);
    let seqs: Vec<u64> = seen.iter().map(|(seq, _)| *seq).collect();
    assert_eq!(seqs, (1..=40).collect::<Vec<u64>>());
    let order: Vec<Event> = seen.iter().map(|(_, e)| *e).collect();
    assert_eq!(order, published);
}

#[test]
fn stop_racing_publishers_never_strands_them() {
    for _ in 0..50 {
        let agg = Arc::new(Aggregator::new());
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            agg.subscribe_fn(
                move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                },
                &Event::ALL,
            );
        }
        agg.start().unwrap();

        let accepted = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let publishers: Vec<_> = (0..2)
            .map(|n| {
                let agg = Arc::clone(&agg);
                let accepted = Arc::clone(&accepted);
                let finished = Arc::clone(&finished);
                thread::spawn(move || {
                    let mut i = n;
                    loop {
                        match agg.try_publish(Event::ALL[i % Event::COUNT]) {
                            Ok(()) => {
                                accepted.fetch_add(1, Ordering::SeqCst);
                            }
                            Err(e) => {
                                assert_eq!(e, Error::Lifecycle(LifecycleError::Stopped));
                                break;
                            }
                        }
                        i += 1;
                    }
                    finished.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(2));
        agg.stop();
        assert!(
            wait_until(TIMEOUT, || finished.load(Ordering::SeqCst) == 2),
            "publisher still blocked after stop"
        );
        for p in publishers {
            p.join().unwrap();
        }

        // Every Ok was dispatched and every dispatch was an Ok.
        assert_eq!(accepted.load(Ordering::SeqCst), agg.dispatched());
        assert!(agg.wait_idle(TIMEOUT));
        assert_eq!(hits.load(Ordering::SeqCst) as u64, agg.dispatched());
    }
}

#[test]
fn stop_before_start_releases_waiting_publisher() {
    let agg = Arc::new(Aggregator::new());
    let outcome = Arc::new(Mutex::new(None));
    {
        let agg = Arc::clone(&agg);
        let outcome = Arc::clone(&outcome);
        thread::spawn(move || {
            let result = agg.try_publish(Event::BoilerNotEmpty);
            *outcome.lock().unwrap() = Some(result);
        });
    }

    thread::sleep(Duration::from_millis(30));
    assert!(outcome.lock().unwrap().is_none());

    agg.stop();
    assert!(wait_until(TIMEOUT, || outcome.lock().unwrap().is_some()));
    assert_eq!(
        *outcome.lock().unwrap(),
        Some(Err(Error::Lifecycle(LifecycleError::Stopped)))
    );
    assert_eq!(agg.dispatched(), 0);
}

#[test]
fn publish_waiting_at_stop_panics() {
    let agg = Arc::new(Aggregator::new());
    let publisher = {
        let agg = Arc::clone(&agg);
        thread::spawn(move || agg.publish(Event::WarmerPlatePotNotEmpty))
    };

    thread::sleep(Duration::from_millis(30));
    agg.stop();
    assert!(wait_until(TIMEOUT, || publisher.is_finished()));
    assert!(publisher.join().is_err());
}

#[test]
fn wait_idle_wakes_when_last_handler_finishes() {
    let agg = Arc::new(Aggregator::new());
    let gate = Gate::new();
    {
        let gate = gate.clone();
        agg.subscribe_fn(move |_| gate.wait(), &[Event::BoilerEmpty, Event::BoilerNotEmpty]);
    }
    agg.start().unwrap();
    agg.publish(Event::BoilerEmpty);
    agg.publish(Event::BoilerNotEmpty);
    assert_eq!(agg.in_flight(), 2);

    let releaser = {
        let gate = gate.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            gate.release();
        })
    };

    let started = Instant::now();
    assert!(agg.wait_idle(Duration::from_secs(30)));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(agg.in_flight(), 0);
    releaser.join().unwrap();
    agg.stop();
}
