//! Host-side frame driver around a [`Scheduler`].

use tale_core::{ActionError, ActionId, FrameReport, Scheduler};
use tracing::{debug, error, info};

use crate::clock::FrameClock;
use crate::config::{DirectorConfig, RecoveryPolicy};
use crate::error::{Result, RuntimeError};

/// What happened during one [`Director::frame`].
#[derive(Debug)]
pub enum FrameOutcome {
    Ticked(FrameReport),
    /// An action failed and was force-completed.
    Recovered {
        error: ActionError,
        /// The top-level task that was cancelled, if one could be found.
        cancelled: Option<ActionId>,
    },
}

impl FrameOutcome {
    pub fn is_recovered(&self) -> bool {
        matches!(self, FrameOutcome::Recovered { .. })
    }
}

/// Result of [`Director::run_until_idle`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub recovered: u64,
    /// `false` if the frame budget ran out before the scheduler went idle.
    pub completed: bool,
}

/// Owns a scheduler and feeds it one time step per host frame.
pub struct Director {
    scheduler: Scheduler,
    clock: FrameClock,
    recovery: RecoveryPolicy,
    vacuum_on_scene_change: bool,
}

impl Director {
    pub fn new(config: &DirectorConfig) -> Result<Self> {
        if !config.time_scale.is_finite() || config.time_scale < 0.0 {
            return Err(RuntimeError::InvalidTimeScale(config.time_scale));
        }

        Ok(Self {
            scheduler: Scheduler::with_config(&config.scheduler)?,
            clock: FrameClock::new(config.time_scale),
            recovery: config.recovery,
            vacuum_on_scene_change: config.vacuum_on_scene_change,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    pub fn recovery(&self) -> RecoveryPolicy {
        self.recovery
    }

    /// Ticks one frame that took `raw_delta` seconds of wall-clock time.
    pub fn frame(&mut self, raw_delta: f32) -> Result<FrameOutcome> {
        let step = self.clock.advance(raw_delta);

        let error = match self.scheduler.tick_frame(step) {
            Ok(report) => return Ok(FrameOutcome::Ticked(report)),
            Err(error) => error,
        };

        error!(
            frame = self.clock.frames(),
            action = ?error.action_id(),
            cause = %error.root_cause(),
            recovery = %self.recovery,
            "action failed: {error}"
        );

        match self.recovery {
            RecoveryPolicy::Halt => Err(RuntimeError::Halted(error)),
            RecoveryPolicy::ForceComplete => {
                let cancelled = match error.action_id() {
                    Some(id) if self.scheduler.cancel(id) => Some(id),
                    _ => None,
                };
                Ok(FrameOutcome::Recovered { error, cancelled })
            }
        }
    }

    /// Ticks fixed `delta` frames until the scheduler is idle or `max_frames` ran.
    pub fn run_until_idle(&mut self, delta: f32, max_frames: u64) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        while !self.scheduler.is_idle() {
            if summary.frames >= max_frames {
                info!(frames = summary.frames, "frame budget exhausted before the scene finished");
                return Ok(summary);
            }
            if self.frame(delta)?.is_recovered() {
                summary.recovered += 1;
            }
            summary.frames += 1;
        }

        summary.completed = true;
        Ok(summary)
    }

    /// Drops everything in flight and, if configured, shrinks the containers.
    pub fn change_scene(&mut self) {
        self.scheduler.reset();
        if self.vacuum_on_scene_change {
            // Each call halves at most once.
            loop {
                let report = self.scheduler.vacuum();
                if !report.queue && !report.parallel {
                    break;
                }
            }
        }
        debug!(
            queue_capacity = self.scheduler.queue_capacity(),
            parallel_capacity = self.scheduler.parallel_capacity(),
            "scene changed"
        );
    }

    /// The debug overlay text for the current state.
    pub fn overlay(&self) -> String {
        self.scheduler.snapshot().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tale_core::{Action, ActionResult, Frame, WaitTicks};

    struct Broken;

    impl Action for Broken {
        fn run(&mut self, _frame: &mut Frame<'_>) -> ActionResult {
            Err(ActionError::msg("missing sprite"))
        }
    }

    #[test]
    fn force_complete_unblocks_the_queue() {
        let mut director = Director::new(&DirectorConfig::default()).unwrap();
        let broken = director.scheduler_mut().enqueue(Broken);
        director.scheduler_mut().enqueue(WaitTicks::new(1));

        match director.frame(0.016).unwrap() {
            FrameOutcome::Recovered { cancelled, .. } => assert_eq!(cancelled, Some(broken)),
            other => panic!("expected recovery, got {other:?}"),
        }
        assert_eq!(director.scheduler().queue_len(), 1);

        let summary = director.run_until_idle(0.016, 10).unwrap();
        assert!(summary.completed);
        assert_eq!(summary.frames, 1);
    }

    #[test]
    fn halt_returns_the_error() {
        let config = DirectorConfig {
            recovery: RecoveryPolicy::Halt,
            ..DirectorConfig::default()
        };
        let mut director = Director::new(&config).unwrap();
        director.scheduler_mut().enqueue(Broken);

        let err = director.frame(0.016).unwrap_err();
        assert!(matches!(err, RuntimeError::Halted(_)));
        assert_eq!(director.scheduler().queue_len(), 1);
    }

    #[test]
    fn negative_time_scale_is_rejected() {
        let config = DirectorConfig {
            time_scale: -1.0,
            ..DirectorConfig::default()
        };
        assert!(matches!(
            Director::new(&config),
            Err(RuntimeError::InvalidTimeScale(_))
        ));
    }

    #[test]
    fn run_stops_at_frame_budget() {
        let mut director = Director::new(&DirectorConfig::default()).unwrap();
        director.scheduler_mut().enqueue(WaitTicks::new(100));

        let summary = director.run_until_idle(0.016, 5).unwrap();
        assert_eq!(summary.frames, 5);
        assert!(!summary.completed);
    }
}
