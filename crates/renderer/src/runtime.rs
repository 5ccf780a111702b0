use std::time::Instant;

/// Amplitude of the animated offset, in clip-space units.
pub const OFFSET_AMPLITUDE: f32 = 0.5;

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Timestamp of one display tick expressed as a value over a time scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTimestamp {
    /// Elapsed time in units of `1 / time_scale` seconds.
    pub video_time: i64,
    /// Units per second.
    pub time_scale: i32,
}

impl FrameTimestamp {
    pub fn new(video_time: i64, time_scale: i32) -> Self {
        Self {
            video_time,
            time_scale,
        }
    }

    /// Builds a timestamp from fractional seconds at nanosecond resolution.
    pub fn from_seconds(seconds: f64) -> Self {
        Self::new(
            (seconds * f64::from(NANOS_PER_SECOND)).round() as i64,
            NANOS_PER_SECOND,
        )
    }

    /// Elapsed seconds; a non-positive time scale yields zero.
    pub fn seconds(&self) -> f32 {
        if self.time_scale <= 0 {
            return 0.0;
        }
        (self.video_time as f64 / f64::from(self.time_scale)) as f32
    }
}

/// Offset written to the `p` uniform for a given time in seconds.
pub fn offset_for(seconds: f32) -> [f32; 2] {
    [
        OFFSET_AMPLITUDE * seconds.sin(),
        OFFSET_AMPLITUDE * seconds.cos(),
    ]
}

/// Abstraction over where frame timestamps originate from.
pub trait TimeSource: Send {
    /// Produces the timestamp for the next display tick.
    fn sample(&mut self) -> FrameTimestamp;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self) -> FrameTimestamp {
        let nanos = self.origin.elapsed().as_nanos();
        FrameTimestamp::new(
            i64::try_from(nanos).unwrap_or(i64::MAX),
            NANOS_PER_SECOND,
        )
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    timestamp: FrameTimestamp,
}

impl FixedTimeSource {
    pub fn new(seconds: f32) -> Self {
        Self {
            timestamp: FrameTimestamp::from_seconds(f64::from(seconds)),
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self) -> FrameTimestamp {
        self.timestamp
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource>;

/// Picks the clock for a run: frozen when a fixed time was requested.
pub fn time_source_for(fixed_time: Option<f32>) -> BoxedTimeSource {
    match fixed_time {
        Some(seconds) => Box::new(FixedTimeSource::new(seconds)),
        None => Box::new(SystemTimeSource::new()),
    }
}
