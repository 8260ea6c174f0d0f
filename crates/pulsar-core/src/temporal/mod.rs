#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// TemporalBuffer — per-sensor ring of timestamped samples
// ---------------------------------------------------------------------------

/// One recorded sensor sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: f64,
}

/// Fixed-capacity ring buffer of time-ordered samples for one sensor.
///
/// The oldest sample is overwritten when the buffer is full. Samples
/// strictly older than the newest recorded timestamp are rejected, so the
/// invariant `timestamps are non-decreasing` holds for everything stored.
/// Window queries are anchored at the newest recorded timestamp, not wall
/// clock, making evaluation insensitive to scheduling jitter between
/// insertion and inspection.
#[derive(Debug)]
pub struct TemporalBuffer {
    capacity: usize,
    samples: VecDeque<Sample>,
    overwritten: u64,
    rejected_out_of_order: u64,
}

impl TemporalBuffer {
    /// Capacity is fixed at construction; zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            overwritten: 0,
            rejected_out_of_order: 0,
        }
    }

    /// Append a sample, overwriting the oldest when full. Returns false
    /// (and counts the rejection) for out-of-order timestamps.
    pub fn add(&mut self, timestamp_ms: i64, value: f64) -> bool {
        if let Some(newest) = self.samples.back()
            && timestamp_ms < newest.timestamp_ms
        {
            self.rejected_out_of_order += 1;
            return false;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
            self.overwritten += 1;
        }
        self.samples.push_back(Sample {
            timestamp_ms,
            value,
        });
        true
    }

    /// All samples with `timestamp >= newest - duration`, in chronological
    /// order. Empty when the buffer is empty.
    pub fn values_within(&self, duration_ms: u64) -> impl Iterator<Item = &Sample> {
        let cutoff = self
            .samples
            .back()
            .map(|s| s.timestamp_ms.saturating_sub_unsigned(duration_ms));
        self.samples
            .iter()
            .filter(move |s| cutoff.is_some_and(|c| s.timestamp_ms >= c))
    }

    /// True iff the window holds at least one sample and every sample in
    /// it is strictly greater than `threshold`.
    pub fn threshold_maintained(&self, threshold: f64, duration_ms: u64) -> bool {
        let mut any = false;
        for sample in self.values_within(duration_ms) {
            if !(sample.value > threshold) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    /// Samples dropped because the buffer was full.
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    /// Samples rejected for arriving out of order.
    pub fn rejected_out_of_order(&self) -> u64 {
        self.rejected_out_of_order
    }
}

// ---------------------------------------------------------------------------
// TemporalStore — lazy per-sensor buffer map
// ---------------------------------------------------------------------------

/// All temporal buffers for a runtime, created lazily on first write and
/// retained for the process lifetime. Buffers never share state across
/// sensors.
#[derive(Debug)]
pub struct TemporalStore {
    capacity: usize,
    buffers: HashMap<String, TemporalBuffer>,
}

impl TemporalStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffers: HashMap::new(),
        }
    }

    /// Record a sample for `sensor`, creating its buffer on first use.
    pub fn record(&mut self, sensor: &str, timestamp_ms: i64, value: f64) -> bool {
        self.buffers
            .entry(sensor.to_string())
            .or_insert_with(|| TemporalBuffer::new(self.capacity))
            .add(timestamp_ms, value)
    }

    pub fn buffer(&self, sensor: &str) -> Option<&TemporalBuffer> {
        self.buffers.get(sensor)
    }

    /// False when the sensor has no buffer yet (no samples recorded).
    pub fn threshold_maintained(&self, sensor: &str, threshold: f64, duration_ms: u64) -> bool {
        self.buffers
            .get(sensor)
            .is_some_and(|b| b.threshold_maintained(threshold, duration_ms))
    }

    pub fn clear(&mut self) {
        for buffer in self.buffers.values_mut() {
            buffer.clear();
        }
    }

    pub fn sensor_count(&self) -> usize {
        self.buffers.len()
    }
}
