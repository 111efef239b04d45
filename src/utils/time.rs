use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// A presentation time that can be expressed in fractional milliseconds.
pub trait MediaTime: Copy {
    fn as_millis_f64(&self) -> f64;
}

impl MediaTime for f64 {
    fn as_millis_f64(&self) -> f64 {
        *self
    }
}

impl MediaTime for Duration {
    fn as_millis_f64(&self) -> f64 {
        self.as_nanos() as f64 / 1_000_000.0
    }
}

/// Converts successive presentation times into RTMP millisecond deltas.
///
/// The sub-millisecond remainder of every step is accumulated and carried
/// into a later delta, so a 29.97 fps cadence does not drift.
#[derive(Debug, Clone)]
pub struct RtmpTimestamp<T: MediaTime> {
    last: Option<f64>,
    fraction: f64,
    _time: PhantomData<T>,
}

impl<T: MediaTime> Default for RtmpTimestamp<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MediaTime> RtmpTimestamp<T> {
    pub fn new() -> Self {
        RtmpTimestamp {
            last: None,
            fraction: 0.0,
            _time: PhantomData,
        }
    }

    /// Return the delta from the previous call in whole milliseconds.
    ///
    /// The first call returns 0. A time at or before the previous one also
    /// returns 0 and leaves the reference point where it was.
    pub fn update(&mut self, next: T) -> u32 {
        let now = next.as_millis_f64();
        let Some(last) = self.last else {
            self.last = Some(now);
            return 0;
        };
        if now <= last {
            return 0;
        }

        let elapsed = now - last;
        let whole = elapsed.floor();
        self.fraction += elapsed - whole;
        let mut delta = whole as u32;
        if self.fraction >= 1.0 {
            delta += 1;
            self.fraction -= 1.0;
        }
        self.last = Some(now);
        delta
    }

    pub fn clear(&mut self) {
        self.last = None;
        self.fraction = 0.0;
    }
}

/// Milliseconds elapsed since `epoch`, wrapped to the 32-bit RTMP clock
pub fn elapsed_ms(epoch: Instant) -> u32 {
    epoch.elapsed().as_millis() as u32
}
