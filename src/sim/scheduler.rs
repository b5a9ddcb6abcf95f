//! Frame-paced update loop
//!
//! The host owns the clock and calls `on_frame` once per rendered frame.
//! While running and not paused, each frame runs exactly one logical tick.
//! Pause is only observed at frame boundaries.

use crate::error::ConfigError;

/// The per-tick callback driven by the scheduler
pub trait Updater {
    fn update(&mut self, now: f64);
}

impl<F: FnMut(f64)> Updater for F {
    fn update(&mut self, now: f64) {
        self(now)
    }
}

#[derive(Debug)]
pub struct FrameScheduler<U> {
    updater: Option<U>,
    running: bool,
    paused: bool,
    frames_seen: u64,
    ticks_run: u64,
}

impl<U> Default for FrameScheduler<U> {
    fn default() -> Self {
        Self {
            updater: None,
            running: false,
            paused: false,
            frames_seen: 0,
            ticks_run: 0,
        }
    }
}

impl<U: Updater> FrameScheduler<U> {
    /// Scheduler with no updater installed yet
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_updater(updater: U) -> Self {
        Self {
            updater: Some(updater),
            ..Self::default()
        }
    }

    /// Install (or replace) the updater
    pub fn set_updater(&mut self, updater: U) {
        self.updater = Some(updater);
    }

    pub fn updater(&self) -> Option<&U> {
        self.updater.as_ref()
    }

    pub fn updater_mut(&mut self) -> Option<&mut U> {
        self.updater.as_mut()
    }

    /// Begin ticking; idempotent once running
    pub fn start(&mut self) -> Result<(), ConfigError> {
        if self.updater.is_none() {
            log::warn!("Frame scheduler started without an updater; staying stopped");
            return Err(ConfigError::MissingUpdater);
        }
        if !self.running {
            self.running = true;
            self.paused = false;
            log::info!("Frame scheduler started");
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!(
                "Frame scheduler stopped after {} ticks ({} frames)",
                self.ticks_run,
                self.frames_seen
            );
        }
        self.running = false;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if self.running && !self.paused {
            self.paused = true;
            log::debug!("Frame scheduler paused");
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            log::debug!("Frame scheduler resumed");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Frame callback from the host; returns whether a tick ran
    pub fn on_frame(&mut self, now: f64) -> bool {
        self.frames_seen += 1;
        if !self.running || self.paused {
            return false;
        }
        match self.updater.as_mut() {
            Some(updater) => {
                updater.update(now);
                self.ticks_run += 1;
                true
            }
            None => false,
        }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Stop and hand the updater back
    pub fn into_updater(mut self) -> Option<U> {
        self.stop();
        self.updater.take()
    }
}
