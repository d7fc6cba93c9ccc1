#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave director responsible for emitting wave and spawn commands.
//!
//! The director keeps its own logical clock, accumulated from
//! [`Event::TimeAdvanced`], and holds explicit timestamps for the next wave
//! and for every queued spawn. Nothing advances while the session is not
//! playing, so pausing freezes the schedule without any timer to cancel.

use std::{collections::VecDeque, time::Duration};

use code_defence_core::{Command, EnemyKind, Event, GameConfig, PlayState, Progress};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Scheduling phase of the director.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No session is running.
    Idle,
    /// Waiting for the first wave of a level.
    Scheduling,
    /// Spawns of the current wave are still queued.
    Spawning,
    /// Every spawn of the current wave was issued; waiting for the next wave.
    WaveComplete,
    /// The last wave of the level was issued.
    LevelComplete,
}

/// Pure system that turns elapsed time into wave and spawn commands.
#[derive(Debug)]
pub struct WaveDirector {
    phase: Phase,
    now: Duration,
    next_wave_at: Option<Duration>,
    pending_spawns: VecDeque<Duration>,
    waves_issued: u32,
    rng: ChaCha8Rng,
}

impl WaveDirector {
    /// Creates an idle director whose spawn rolls replay for equal seeds.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            phase: Phase::Idle,
            now: Duration::ZERO,
            next_wave_at: None,
            pending_spawns: VecDeque::new(),
            waves_issued: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Current scheduling phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reading of the director's logical clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Timestamp at which the next wave is due, if one is armed.
    #[must_use]
    pub fn next_wave_at(&self) -> Option<Duration> {
        self.next_wave_at
    }

    /// Number of spawns still queued for the current wave.
    #[must_use]
    pub fn pending_spawns(&self) -> usize {
        self.pending_spawns.len()
    }

    /// Consumes world events and emits the wave and spawn commands that
    /// became due.
    pub fn handle(
        &mut self,
        events: &[Event],
        play_state: PlayState,
        progress: Progress,
        config: &GameConfig,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::PlayStateChanged { from, to } => self.on_transition(*from, *to, config),
                Event::TimeAdvanced { dt } if self.phase != Phase::Idle => {
                    self.now = self.now.saturating_add(*dt);
                }
                _ => {}
            }
        }

        if play_state != PlayState::Playing || self.phase == Phase::Idle {
            return;
        }

        if self.next_wave_at.is_some_and(|due| due <= self.now) {
            self.begin_wave(progress, config, out);
        }

        while self.pending_spawns.front().is_some_and(|due| *due <= self.now) {
            let _ = self.pending_spawns.pop_front();
            if let Some(command) = self.roll_spawn(progress.level, config) {
                out.push(command);
            }
        }

        if self.phase == Phase::Spawning && self.pending_spawns.is_empty() {
            self.phase = Phase::WaveComplete;
        }
    }

    fn on_transition(&mut self, from: PlayState, to: PlayState, config: &GameConfig) {
        match (from, to) {
            (PlayState::Menu, PlayState::Playing) | (PlayState::Victory, PlayState::Playing) => {
                self.clear();
                self.phase = Phase::Scheduling;
                self.next_wave_at = Some(self.now.saturating_add(config.wave_initial_delay()));
            }
            (PlayState::Playing, PlayState::Paused) => {
                self.next_wave_at = None;
            }
            (PlayState::Paused, PlayState::Playing) => {
                if self.phase == Phase::LevelComplete || self.phase == Phase::Idle {
                    return;
                }
                let delay = if self.waves_issued == 0 {
                    config.wave_initial_delay()
                } else {
                    config.wave_interval()
                };
                self.next_wave_at = Some(self.now.saturating_add(delay));
            }
            (_, PlayState::Menu) | (_, PlayState::GameOver) | (_, PlayState::Victory) => {
                self.clear();
            }
            _ => {}
        }
    }

    fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.next_wave_at = None;
        self.pending_spawns.clear();
        self.waves_issued = 0;
    }

    fn begin_wave(&mut self, progress: Progress, config: &GameConfig, out: &mut Vec<Command>) {
        let size = config.wave_size(progress.wave);
        out.push(Command::BeginWave);
        self.waves_issued = self.waves_issued.saturating_add(1);

        let stagger = config.spawn_stagger();
        for index in 0..size {
            let offset = stagger.saturating_mul(index);
            self.pending_spawns
                .push_back(self.now.saturating_add(offset));
        }

        if progress.wave.saturating_add(1) <= progress.max_waves {
            self.next_wave_at = Some(self.now.saturating_add(config.wave_interval()));
            self.phase = Phase::Spawning;
        } else {
            self.next_wave_at = None;
            self.phase = Phase::LevelComplete;
        }
        debug!(wave = progress.wave, size, phase = ?self.phase, "wave scheduled");
    }

    fn roll_spawn(&mut self, level: u32, config: &GameConfig) -> Option<Command> {
        let level_bonus = (f64::from(level) * 0.1).min(1.0);
        let candidates: Vec<EnemyKind> = EnemyKind::ALL
            .into_iter()
            .filter(|kind| self.rng.gen::<f64>() < kind.definition().spawn_weight() + level_bonus)
            .collect();
        if candidates.is_empty() || config.rows == 0 {
            return None;
        }

        let kind = candidates[self.rng.gen_range(0..candidates.len())];
        let row = self.rng.gen_range(0..config.rows);
        Some(Command::SpawnEnemy { kind, row })
    }
}
