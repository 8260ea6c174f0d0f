use super::*;

#[test]
fn count_tracks_min_of_writes_and_capacity() {
    let mut buf = TemporalBuffer::new(3);
    for i in 0..5 {
        assert!(buf.add(i * 100, i as f64));
    }
    assert_eq!(buf.count(), 3);
    assert_eq!(buf.capacity(), 3);
    assert_eq!(buf.overwritten(), 2);
    assert_eq!(buf.newest().unwrap().value, 4.0);
    assert_eq!(buf.oldest().unwrap().value, 2.0);
}

#[test]
fn out_of_order_samples_rejected() {
    let mut buf = TemporalBuffer::new(4);
    assert!(buf.add(1000, 1.0));
    assert!(!buf.add(900, 2.0));
    assert_eq!(buf.count(), 1);
    assert_eq!(buf.rejected_out_of_order(), 1);
    // Equal timestamps are in order and accepted.
    assert!(buf.add(1000, 3.0));
    assert_eq!(buf.count(), 2);
}

#[test]
fn timestamps_non_decreasing_after_mixed_writes() {
    let mut buf = TemporalBuffer::new(8);
    for ts in [0, 50, 50, 40, 120, 100, 130] {
        buf.add(ts, ts as f64);
    }
    let stamps: Vec<i64> = buf.values_within(u64::MAX).map(|s| s.timestamp_ms).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(buf.rejected_out_of_order(), 2);
}

#[test]
fn values_within_window_anchored_at_newest() {
    let mut buf = TemporalBuffer::new(10);
    for i in 0..10 {
        buf.add(i * 100, i as f64);
    }
    // newest = 900; window 300ms => [600, 900]
    let values: Vec<f64> = buf.values_within(300).map(|s| s.value).collect();
    assert_eq!(values, vec![6.0, 7.0, 8.0, 9.0]);
}

#[test]
fn threshold_maintained_empty_buffer_is_false() {
    let buf = TemporalBuffer::new(4);
    assert!(!buf.threshold_maintained(0.0, 1000));
}

#[test]
fn threshold_maintained_all_above() {
    let mut buf = TemporalBuffer::new(8);
    for i in 0..5 {
        buf.add(i * 100, 55.0);
    }
    assert!(buf.threshold_maintained(50.0, 500));
}

#[test]
fn threshold_not_maintained_with_one_low_sample() {
    let mut buf = TemporalBuffer::new(8);
    for (i, v) in [55.0, 55.0, 49.0, 55.0, 55.0].iter().enumerate() {
        buf.add(i as i64 * 100, *v);
    }
    assert!(!buf.threshold_maintained(50.0, 500));
}

#[test]
fn threshold_is_strict() {
    let mut buf = TemporalBuffer::new(4);
    buf.add(0, 50.0);
    assert!(!buf.threshold_maintained(50.0, 100));
    buf.add(100, 50.1);
    // The 50.0 sample is still in the window.
    assert!(!buf.threshold_maintained(50.0, 1000));
}

#[test]
fn old_samples_fall_out_of_window() {
    let mut buf = TemporalBuffer::new(16);
    buf.add(0, 10.0);
    buf.add(1000, 60.0);
    buf.add(1100, 61.0);
    // Window of 200ms from newest (1100) excludes the 10.0 at t=0.
    assert!(buf.threshold_maintained(50.0, 200));
    // A wider window pulls the low sample back in.
    assert!(!buf.threshold_maintained(50.0, 2000));
}

#[test]
fn capacity_one_checks_newest_only() {
    let mut buf = TemporalBuffer::new(1);
    buf.add(0, 10.0);
    buf.add(100, 60.0);
    assert_eq!(buf.count(), 1);
    assert!(buf.threshold_maintained(50.0, 10_000));
}

#[test]
fn nan_sample_fails_threshold() {
    let mut buf = TemporalBuffer::new(4);
    buf.add(0, f64::NAN);
    assert!(!buf.threshold_maintained(50.0, 100));
}

#[test]
fn clear_resets_samples_but_keeps_counters() {
    let mut buf = TemporalBuffer::new(2);
    buf.add(0, 1.0);
    buf.add(100, 2.0);
    buf.add(200, 3.0);
    buf.clear();
    assert_eq!(buf.count(), 0);
    assert!(buf.newest().is_none());
    assert_eq!(buf.overwritten(), 1);
    // After clear, any timestamp is in order again.
    assert!(buf.add(0, 4.0));
}

#[test]
fn store_creates_buffers_lazily() {
    let mut store = TemporalStore::new(4);
    assert_eq!(store.sensor_count(), 0);
    assert!(store.buffer("temperature").is_none());
    store.record("temperature", 0, 55.0);
    assert_eq!(store.sensor_count(), 1);
    assert!(store.buffer("temperature").is_some());
}

#[test]
fn store_buffers_are_independent_per_sensor() {
    let mut store = TemporalStore::new(8);
    for i in 0..5 {
        store.record("temp_a", i * 100, 60.0);
        store.record("temp_b", i * 100, 40.0);
    }
    assert!(store.threshold_maintained("temp_a", 50.0, 500));
    assert!(!store.threshold_maintained("temp_b", 50.0, 500));
}

#[test]
fn store_threshold_false_for_unknown_sensor() {
    let store = TemporalStore::new(8);
    assert!(!store.threshold_maintained("ghost", 0.0, 1000));
}
