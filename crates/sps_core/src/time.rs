//! Frame clock. One logical tick is one rendered frame; there is no
//! accumulator or sub-stepping, so simulation speed follows the redraw
//! cadence. Wall-clock deltas are only measured for the debug overlay.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Deltas longer than this (window drag, breakpoint) are not fed into the
/// FPS average.
const MAX_SAMPLE_DT: f64 = 0.25;

pub struct FrameClock {
    pub tick_count: u64,
    pub real_dt: f64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Start a new tick: measure wall-clock delta and update the averages.
    pub fn begin_tick(&mut self) {
        let now = Instant::now();
        self.real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.tick_count += 1;

        if self.real_dt > MAX_SAMPLE_DT {
            log::debug!(
                "Frame took {:.1}ms, excluded from FPS average",
                self.real_dt * 1000.0
            );
            return;
        }
        self.record_sample(self.real_dt);
    }

    fn record_sample(&mut self, dt: f64) {
        self.fps_samples[self.fps_sample_index] = dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
