//! Multi-phase boss state machine
//!
//! Phase1 → Phase2 → Phase3 → Defeated, advancing whenever health runs out.
//! Entering a phase swaps the visual, restores that phase's health, clears
//! weakness and stamps every phase-local cooldown with the entry time, so
//! attacks in the new phase are ready only after a full cooldown.

use serde::{Deserialize, Serialize};

use crate::consts::WEAKNESS_MULTIPLIER;
use crate::settings::PhaseTuning;

/// Discrete boss stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    One,
    Two,
    Three,
}

impl Phase {
    /// 1-based phase number
    pub fn number(self) -> u8 {
        match self {
            Phase::One => 1,
            Phase::Two => 2,
            Phase::Three => 3,
        }
    }

    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::One => Some(Phase::Two),
            Phase::Two => Some(Phase::Three),
            Phase::Three => None,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self.number() as usize - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdversaryState {
    Active(Phase),
    /// Terminal
    Defeated,
}

/// Last-use stamps of phase-local attacks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTimers {
    pub last_area: f64,
    pub last_summon: f64,
}

impl PhaseTimers {
    fn stamped(now: f64) -> Self {
        Self {
            last_area: now,
            last_summon: now,
        }
    }
}

/// Entry data for a freshly entered phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseEntered {
    pub phase: Phase,
    pub health: i32,
    pub visual: String,
}

#[derive(Debug, Clone)]
pub struct PhaseMachine {
    state: AdversaryState,
    weakness_exposed: bool,
    entered_at: f64,
    timers: PhaseTimers,
    profiles: [PhaseTuning; 3],
}

impl PhaseMachine {
    /// Start in phase one at `now`
    pub fn new(profiles: [PhaseTuning; 3], now: f64) -> Self {
        Self {
            state: AdversaryState::Active(Phase::One),
            weakness_exposed: false,
            entered_at: now,
            timers: PhaseTimers::stamped(now),
            profiles,
        }
    }

    pub fn state(&self) -> AdversaryState {
        self.state
    }

    /// Current phase, `None` once defeated
    pub fn phase(&self) -> Option<Phase> {
        match self.state {
            AdversaryState::Active(phase) => Some(phase),
            AdversaryState::Defeated => None,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.state == AdversaryState::Defeated
    }

    pub fn weakness_exposed(&self) -> bool {
        self.weakness_exposed
    }

    /// Time the current phase was entered
    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }

    pub fn profile(&self) -> Option<&PhaseTuning> {
        self.phase().map(|phase| &self.profiles[phase.index()])
    }

    /// Health and visual of the initial phase
    pub fn opening(&self) -> PhaseEntered {
        let profile = &self.profiles[Phase::One.index()];
        PhaseEntered {
            phase: Phase::One,
            health: profile.health,
            visual: profile.visual.clone(),
        }
    }

    pub fn timers(&self) -> &PhaseTimers {
        &self.timers
    }

    /// Incoming damage after the weakness multiplier
    pub fn scale_damage(&self, amount: i32) -> i32 {
        if self.weakness_exposed {
            amount * WEAKNESS_MULTIPLIER
        } else {
            amount
        }
    }

    /// Expose weakness once health crosses the phase threshold
    pub fn observe_health(&mut self, health: i32) {
        let Some(profile) = self.profile() else {
            return;
        };
        if !self.weakness_exposed && health <= profile.weakness_threshold {
            self.weakness_exposed = true;
            log::debug!("Boss weakness exposed at {health} health");
        }
    }

    /// Health ran out: enter the next phase, or become defeated (`None`)
    pub fn advance(&mut self, now: f64) -> Option<PhaseEntered> {
        let current = self.phase()?;
        match current.next() {
            Some(next) => {
                let profile = &self.profiles[next.index()];
                self.state = AdversaryState::Active(next);
                self.weakness_exposed = false;
                self.entered_at = now;
                self.timers = PhaseTimers::stamped(now);
                log::info!(
                    "Boss entered phase {} with {} health",
                    next.number(),
                    profile.health
                );
                Some(PhaseEntered {
                    phase: next,
                    health: profile.health,
                    visual: profile.visual.clone(),
                })
            }
            None => {
                self.state = AdversaryState::Defeated;
                self.weakness_exposed = false;
                log::info!("Boss defeated");
                None
            }
        }
    }

    /// Claim the area attack if its cooldown has elapsed
    pub fn try_area_attack(&mut self, now: f64) -> bool {
        let Some(cooldown) = self.profile().map(|p| p.area_cooldown) else {
            return false;
        };
        if now - self.timers.last_area >= cooldown {
            self.timers.last_area = now;
            true
        } else {
            false
        }
    }

    /// Claim a minion summon if this phase summons and its cooldown has elapsed
    pub fn try_summon(&mut self, now: f64) -> bool {
        let Some(cooldown) = self.profile().and_then(|p| p.summon_cooldown) else {
            return false;
        };
        if now - self.timers.last_summon >= cooldown {
            self.timers.last_summon = now;
            true
        } else {
            false
        }
    }
}
