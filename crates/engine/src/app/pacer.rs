use std::time::{Duration, Instant};

use tracing::debug;

use super::Clock;

/// Remaining budget below which a busy wait is considered done.
pub const BUSY_WAIT_TOLERANCE: Duration = Duration::from_micros(10);
const CPU_ESTIMATE_HEADROOM: f64 = 1.20;
const DIAGNOSTICS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    Render,
    Skip,
}

impl FrameDecision {
    pub fn should_render(self) -> bool {
        matches!(self, FrameDecision::Render)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacerSettings {
    pub max_fps: u32,
    pub vsync: bool,
    pub limit_fps: bool,
    pub debug: bool,
}

impl PacerSettings {
    /// `None` means every iteration renders: vsync paces the swap, the cap is
    /// off, or the cap is zero.
    pub fn desired_interval(&self) -> Option<Duration> {
        if self.vsync || !self.limit_fps || self.max_fps == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(1.0 / self.max_fps as f64))
    }
}

/// Hybrid busy-wait/skip frame limiter.
///
/// Each call samples the time since the previous call as the cost of one loop
/// iteration and folds it into an exponential moving average. When the next
/// render is due sooner than another iteration would likely take, the pacer
/// spins until the deadline; otherwise it skips and lets the loop run again.
#[derive(Debug)]
pub struct FramePacer {
    last_render: Instant,
    last_cpu: Instant,
    avg_cpu_frame_time: Duration,
    diagnostics: PacerDiagnostics,
}

#[derive(Debug)]
struct PacerDiagnostics {
    frames_skipped: u64,
    time_waited: Duration,
    last_report: Instant,
}

impl FramePacer {
    pub fn new(now: Instant) -> Self {
        Self {
            last_render: now,
            last_cpu: now,
            avg_cpu_frame_time: Duration::ZERO,
            diagnostics: PacerDiagnostics {
                frames_skipped: 0,
                time_waited: Duration::ZERO,
                last_report: now,
            },
        }
    }

    pub fn last_render(&self) -> Instant {
        self.last_render
    }

    pub fn avg_cpu_frame_time(&self) -> Duration {
        self.avg_cpu_frame_time
    }

    pub fn record_render(&mut self, now: Instant) {
        self.last_render = now;
    }

    pub fn decide<C: Clock + ?Sized>(&mut self, clock: &C, settings: PacerSettings) -> FrameDecision {
        let Some(desired) = settings.desired_interval() else {
            return FrameDecision::Render;
        };

        let mut now = clock.now();
        let last_cpu_frame = now.saturating_duration_since(self.last_cpu);
        self.avg_cpu_frame_time = (self.avg_cpu_frame_time + last_cpu_frame * 4) / 5;
        self.last_cpu = now;

        let mut decision = FrameDecision::Skip;
        let mut render_delta = now.saturating_duration_since(self.last_render);

        if render_delta < desired
            && self.avg_cpu_frame_time.mul_f64(CPU_ESTIMATE_HEADROOM) > desired - render_delta
        {
            self.diagnostics.time_waited += desired - render_delta;
            while desired.saturating_sub(render_delta) > BUSY_WAIT_TOLERANCE {
                now = clock.now();
                render_delta = now.saturating_duration_since(self.last_render);
                clock.relax();
            }

            decision = FrameDecision::Render;
            self.last_cpu = now;
        }

        if decision == FrameDecision::Skip && render_delta > desired {
            decision = FrameDecision::Render;
        }

        if decision == FrameDecision::Skip {
            self.diagnostics.frames_skipped += 1;
        }
        self.diagnostics.maybe_report(clock.now(), settings.debug);

        decision
    }
}

impl PacerDiagnostics {
    fn maybe_report(&mut self, now: Instant, log_enabled: bool) {
        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed < DIAGNOSTICS_INTERVAL {
            return;
        }

        if log_enabled {
            let seconds = DIAGNOSTICS_INTERVAL.as_secs();
            debug!(
                frames_skipped_per_sec = self.frames_skipped / seconds,
                time_waited_per_sec_ms = (self.time_waited / seconds as u32).as_secs_f64() * 1000.0,
                "frame_pacer_stats"
            );
        }
        self.frames_skipped = 0;
        self.time_waited = Duration::ZERO;
        self.last_report = now;
    }
}
