use std::time::{Duration, Instant};

const FPS_SAMPLE_COUNT: usize = 60;

/// The elapsed clock counts tenths of a second. Dialogue reveal rates and
/// fade durations are authored in these units.
pub const ELAPSED_UNITS_PER_SECOND: f64 = 10.0;

/// Variable-step frame clock.
///
/// `delta` is measured frame-start to frame-start, so it includes any time
/// spent waiting on the frame cap. `elapsed` is a separate monotonic clock
/// measured from engine start, independent of how deltas are rounded or
/// clamped.
pub struct FrameClock {
    pub max_fps: Option<u32>,
    pub max_delta: f64,
    start: Instant,
    frame_start: Instant,
    started: bool,
    pub delta: f64,
    pub fps: f64,
    pub elapsed: f64,
    pub frame_count: u64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new(max_fps: Option<u32>) -> Self {
        Self::starting_at(Instant::now(), max_fps)
    }

    pub fn starting_at(start: Instant, max_fps: Option<u32>) -> Self {
        Self {
            max_fps,
            max_delta: 0.25,
            start,
            frame_start: start,
            started: false,
            delta: 1.0 / 60.0,
            fps: 60.0,
            elapsed: 0.0,
            frame_count: 0,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    pub fn begin_frame(&mut self) {
        self.begin_frame_at(Instant::now());
    }

    pub fn begin_frame_at(&mut self, now: Instant) {
        if self.started {
            self.delta = now
                .saturating_duration_since(self.frame_start)
                .as_secs_f64();
        }
        self.started = true;
        self.frame_start = now;

        // Long stalls (window drag, breakpoint) would otherwise teleport
        // entities through walls.
        if self.delta > self.max_delta {
            log::warn!(
                "Frame took {:.1}ms, clamping delta to {}ms",
                self.delta * 1000.0,
                self.max_delta * 1000.0
            );
            self.delta = self.max_delta;
        }

        self.elapsed =
            now.saturating_duration_since(self.start).as_secs_f64() * ELAPSED_UNITS_PER_SECOND;
        self.frame_count += 1;
        self.fps = if self.delta > 0.0 {
            1.0 / self.delta
        } else {
            0.0
        };

        self.fps_samples[self.fps_sample_index] = self.delta;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    /// Earliest instant the next frame may start, or `None` when uncapped.
    pub fn next_frame_deadline(&self) -> Option<Instant> {
        let fps = self.max_fps.filter(|&fps| fps > 0)?;
        Some(self.frame_start + Duration::from_secs_f64(1.0 / fps as f64))
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Some(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_measures_between_frame_starts() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start, None);
        clock.begin_frame_at(start);
        clock.begin_frame_at(start + Duration::from_millis(20));
        assert!((clock.delta - 0.020).abs() < 1e-9);
        assert!((clock.fps - 50.0).abs() < 1e-6);
        assert_eq!(clock.frame_count, 2);
    }

    #[test]
    fn delta_is_clamped_after_stall() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start, None);
        clock.begin_frame_at(start);
        clock.begin_frame_at(start + Duration::from_secs(3));
        assert_eq!(clock.delta, clock.max_delta);
    }

    #[test]
    fn elapsed_counts_tenths_of_seconds_since_start() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start, None);
        clock.begin_frame_at(start + Duration::from_millis(1500));
        assert!((clock.elapsed - 15.0).abs() < 1e-9);
        // Unaffected by the delta clamp.
        clock.begin_frame_at(start + Duration::from_secs(10));
        assert!((clock.elapsed - 100.0).abs() < 1e-9);
    }

    #[test]
    fn deadline_only_when_capped() {
        let start = Instant::now();
        let mut uncapped = FrameClock::starting_at(start, None);
        uncapped.begin_frame_at(start);
        assert!(uncapped.next_frame_deadline().is_none());

        let mut capped = FrameClock::starting_at(start, Some(50));
        capped.begin_frame_at(start);
        assert_eq!(
            capped.next_frame_deadline(),
            Some(start + Duration::from_millis(20))
        );
    }
}
