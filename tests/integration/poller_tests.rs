//! Poller cadence, sampling order and shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use brewctl::aggregator::Aggregator;
use brewctl::config::BrewerConfig;
use brewctl::events::Event;
use brewctl::poller::{Poller, poll_once};

use super::helpers::{RecordingSensors, SensorRead, TIMEOUT, fast_config, wait_until};

#[test]
fn sensors_are_read_boiler_button_plate() {
    let agg = Arc::new(Aggregator::new());
    agg.start().unwrap();
    let sensors = Arc::new(RecordingSensors::new());

    let mut poller = Poller::spawn(Arc::clone(&agg), Arc::clone(&sensors), &fast_config()).unwrap();
    assert!(wait_until(TIMEOUT, || agg.dispatched() >= 9));
    poller.stop();
    agg.stop();

    let reads = sensors.reads();
    assert_eq!(reads.len() % 3, 0);
    for cycle in reads.chunks(3) {
        assert_eq!(
            cycle,
            [SensorRead::Boiler, SensorRead::BrewButton, SensorRead::WarmerPlate]
        );
    }
}

#[test]
fn first_sample_waits_one_period() {
    let agg = Arc::new(Aggregator::new());
    agg.start().unwrap();
    let sensors = Arc::new(RecordingSensors::new());
    let config = BrewerConfig {
        poll_interval_ms: 200,
        ..BrewerConfig::default()
    };

    let mut poller = Poller::spawn(Arc::clone(&agg), Arc::clone(&sensors), &config).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(sensors.reads().is_empty());

    assert!(wait_until(TIMEOUT, || agg.dispatched() >= 3));
    poller.stop();
    agg.stop();
}

#[test]
fn no_cycle_runs_after_stop() {
    let agg = Arc::new(Aggregator::new());
    agg.start().unwrap();
    let sensors = Arc::new(RecordingSensors::new());

    let mut poller = Poller::spawn(Arc::clone(&agg), Arc::clone(&sensors), &fast_config()).unwrap();
    assert!(wait_until(TIMEOUT, || agg.dispatched() >= 3));
    poller.stop();

    let reads = sensors.reads().len();
    let dispatched = agg.dispatched();
    thread::sleep(Duration::from_millis(40));
    assert_eq!(sensors.reads().len(), reads);
    assert_eq!(agg.dispatched(), dispatched);
    agg.stop();
}

#[test]
fn dropping_the_poller_stops_it() {
    let agg = Arc::new(Aggregator::new());
    agg.start().unwrap();
    let sensors = Arc::new(RecordingSensors::new());

    {
        let _poller =
            Poller::spawn(Arc::clone(&agg), Arc::clone(&sensors), &fast_config()).unwrap();
        assert!(wait_until(TIMEOUT, || agg.dispatched() >= 3));
    }

    let dispatched = agg.dispatched();
    thread::sleep(Duration::from_millis(40));
    assert_eq!(agg.dispatched(), dispatched);
    agg.stop();
}

#[test]
fn button_press_is_published_exactly_once() {
    let agg = Arc::new(Aggregator::new());
    let pushes = Arc::new(AtomicUsize::new(0));
    {
        let pushes = Arc::clone(&pushes);
        agg.subscribe_fn(
            move |_| {
                pushes.fetch_add(1, Ordering::SeqCst);
            },
            &[Event::BrewButtonPushed],
        );
    }
    agg.start().unwrap();
    let sensors = RecordingSensors::new();

    sensors.hw.press_brew_button();
    let first = poll_once(&agg, &sensors);
    let second = poll_once(&agg, &sensors);
    assert_eq!(first[1], Event::BrewButtonPushed);
    assert_eq!(second[1], Event::BrewButtonNotPushed);

    assert!(agg.wait_idle(TIMEOUT));
    assert_eq!(pushes.load(Ordering::SeqCst), 1);
    assert_eq!(agg.dispatched(), 6);
    agg.stop();
}

#[test]
fn stop_interrupts_a_long_period() {
    let agg = Arc::new(Aggregator::new());
    agg.start().unwrap();
    let sensors = Arc::new(RecordingSensors::new());
    let config = BrewerConfig {
        poll_interval_ms: 60_000,
        ..BrewerConfig::default()
    };

    let mut poller = Poller::spawn(Arc::clone(&agg), Arc::clone(&sensors), &config).unwrap();
    thread::sleep(Duration::from_millis(20));
    let started = Instant::now();
    poller.stop();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(sensors.reads().is_empty());
    agg.stop();
}
