use std::path::PathBuf;
use std::time::{Duration, Instant};

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether frames should animate continuously,
/// be evaluated at a fixed timestamp, or be exported to disk.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Run the render loop continuously, optionally clamping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
    },
    /// Render a single still frame at an optional timestamp.
    Still {
        /// Specific timestamp to evaluate the shader at (seconds).
        time: Option<f32>,
    },
    /// Render a frame on the CPU and write it to disk as PNG.
    Export {
        /// Specific timestamp to evaluate the shader at (seconds).
        time: Option<f32>,
        /// Destination path for the exported file.
        path: PathBuf,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

impl RenderPolicy {
    /// Timestamp a still or export policy evaluates the shader at.
    pub fn fixed_time(&self) -> Option<f32> {
        match self {
            RenderPolicy::Animate { .. } => None,
            RenderPolicy::Still { time } | RenderPolicy::Export { time, .. } => {
                Some(time.unwrap_or(0.0))
            }
        }
    }
}

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
}

impl TimeSample {
    pub fn new(seconds: f32) -> Self {
        Self { seconds }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Creates a system time source initialised to `Instant::now()`.
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
    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.origin.elapsed().as_secs_f32())
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
}

impl FixedTimeSource {
    /// Constructs a fixed time source that always returns the provided time.
    pub fn new(time: f32) -> Self {
        Self { time }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.time)
    }
}

/// Simulated clock driven by the caller; it never runs backwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTimeSource {
    seconds: f32,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward; negative or NaN steps are ignored.
    pub fn advance(&mut self, seconds: f32) {
        if seconds > 0.0 {
            self.seconds += seconds;
        }
    }

    /// Jumps to `seconds` if that is not earlier than the current time.
    pub fn set(&mut self, seconds: f32) {
        if seconds > self.seconds {
            self.seconds = seconds;
        }
    }
}

impl TimeSource for ManualTimeSource {
    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.seconds)
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match policy.fixed_time() {
        None => Box::new(SystemTimeSource::new()),
        Some(time) => Box::new(FixedTimeSource::new(time)),
    }
}

/// Decides when the event loop should request the next redraw.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    policy: RenderPolicy,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(policy: RenderPolicy) -> Self {
        Self {
            policy,
            last_frame: None,
        }
    }

    fn frame_interval(&self) -> Option<Duration> {
        match self.policy {
            RenderPolicy::Animate {
                target_fps: Some(fps),
            } if fps > 0.0 && fps.is_finite() => Some(Duration::from_secs_f32(1.0 / fps)),
            _ => None,
        }
    }

    /// True when a frame is due at `now`.
    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (&self.policy, self.last_frame) {
            (_, None) => true,
            (RenderPolicy::Animate { .. }, Some(last)) => match self.frame_interval() {
                Some(interval) => now >= last + interval,
                None => true,
            },
            (RenderPolicy::Still { .. } | RenderPolicy::Export { .. }, Some(_)) => false,
        }
    }

    /// When the next capped frame becomes due, if the policy has a deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        let last = self.last_frame?;
        match self.policy {
            RenderPolicy::Animate { .. } => self.frame_interval().map(|interval| last + interval),
            _ => None,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_time_never_decreases() {
        let mut source = SystemTimeSource::new();
        let mut last = source.sample();
        for _ in 0..100 {
            let next = source.sample();
            assert!(next.seconds >= last.seconds);
            last = next;
        }
    }

    #[test]
    fn manual_time_ignores_backwards_moves() {
        let mut source = ManualTimeSource::new();
        source.advance(1.0);
        source.advance(-0.5);
        source.set(0.25);
        assert_eq!(source.sample().seconds, 1.0);
        source.set(2.0);
        assert_eq!(source.sample(), TimeSample::new(2.0));
        source.set(f32::NAN);
        assert_eq!(source.sample(), TimeSample::new(2.0));
    }

    #[test]
    fn still_policies_use_fixed_time() {
        let mut source = time_source_for_policy(&RenderPolicy::Still { time: Some(3.5) });
        assert_eq!(source.sample().seconds, 3.5);
        assert_eq!(source.sample().seconds, 3.5);
        let export = RenderPolicy::Export {
            time: None,
            path: PathBuf::from("frame.png"),
        };
        assert_eq!(export.fixed_time(), Some(0.0));
    }

    #[test]
    fn uncapped_animation_is_always_ready() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::default());
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn capped_animation_waits_for_interval() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Animate {
            target_fps: Some(10.0),
        });
        let start = Instant::now();
        scheduler.mark_rendered(start);
        assert!(!scheduler.ready_for_frame(start + Duration::from_millis(50)));
        assert!(scheduler.ready_for_frame(start + Duration::from_millis(150)));
        let deadline = scheduler.next_deadline().unwrap();
        assert!(deadline > start);
        assert!(deadline <= start + Duration::from_millis(101));
    }

    #[test]
    fn still_policy_renders_once() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Still { time: None });
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(!scheduler.ready_for_frame(now + Duration::from_secs(5)));
        scheduler.reset();
        assert!(scheduler.ready_for_frame(now));
    }
}
