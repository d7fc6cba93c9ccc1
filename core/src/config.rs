//! Tunable parameters shared by the world, the systems and the adapters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Resources;

/// Complete set of tunables for a game session.
///
/// Every field has a default matching the shipped game, so adapters may
/// deserialize partial documents and only override what they need.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of a grid cell in world units. Unit ranges are expressed
    /// in multiples of this length.
    pub cell_length: f32,
    /// Resources available when a session starts.
    pub initial_resources: Resources,
    /// Ceiling for cpu usage.
    pub max_cpu: u32,
    /// Ceiling for memory usage.
    pub max_memory: u32,
    /// Base health at the start of a session and the cap for restores.
    pub base_health: u32,
    /// Waves issued during the first level.
    pub max_waves: u32,
    /// Base health lost per breaching enemy before shields apply.
    pub breach_damage: u32,
    /// Delay before the first wave of a level, in milliseconds.
    pub wave_initial_delay_ms: u64,
    /// Interval between successive waves, in milliseconds.
    pub wave_interval_ms: u64,
    /// Stagger between individual spawns of a wave, in milliseconds.
    pub spawn_stagger_ms: u64,
    /// Wave size before the per-wave growth is added.
    pub wave_base_size: u32,
    /// Enemies added to the wave size per wave number.
    pub wave_growth: u32,
    /// Upper bound for the size of any wave.
    pub wave_size_cap: u32,
    /// Projectile travel per reference frame, in world units.
    pub projectile_speed: f32,
    /// Distance under which a projectile hits its target.
    pub hit_radius: f32,
    /// Duration of the reference frame that speeds are expressed against,
    /// in milliseconds.
    pub reference_frame_ms: u64,
    /// Slow factor recovered per reference frame.
    pub slow_recovery: f32,
    /// Probability per frame that a reveal unit uncovers an invisible enemy.
    pub reveal_chance: f64,
    /// Health per second drained from units around an area-damage enemy.
    pub area_damage_per_second: f32,
    /// Waves added to the level length when advancing a level.
    pub level_wave_growth: u32,
    /// Base health restored when advancing a level.
    pub level_health_restore: u32,
    /// Largest frame delta accepted from the host, in milliseconds.
    pub max_frame_delta_ms: u64,
    /// Seed for every random stream in the session.
    pub seed: u64,
}

impl GameConfig {
    /// Delay before the first wave of a level.
    #[must_use]
    pub const fn wave_initial_delay(&self) -> Duration {
        Duration::from_millis(self.wave_initial_delay_ms)
    }

    /// Interval between successive waves.
    #[must_use]
    pub const fn wave_interval(&self) -> Duration {
        Duration::from_millis(self.wave_interval_ms)
    }

    /// Stagger between individual spawns of a wave.
    #[must_use]
    pub const fn spawn_stagger(&self) -> Duration {
        Duration::from_millis(self.spawn_stagger_ms)
    }

    /// Largest frame delta accepted from the host.
    #[must_use]
    pub const fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }

    /// Converts an elapsed duration into a multiple of the reference frame.
    ///
    /// A zero reference frame degrades to one step per call.
    #[must_use]
    pub fn frame_scale(&self, dt: Duration) -> f32 {
        if self.reference_frame_ms == 0 {
            return 1.0;
        }
        (dt.as_secs_f64() * 1000.0 / self.reference_frame_ms as f64) as f32
    }

    /// Number of enemies spawned by the given wave.
    #[must_use]
    pub fn wave_size(&self, wave: u32) -> u32 {
        self.wave_base_size
            .saturating_add(wave.saturating_mul(self.wave_growth))
            .min(self.wave_size_cap)
    }

    /// Total width of the playfield in world units.
    #[must_use]
    pub fn field_width(&self) -> f32 {
        self.columns as f32 * self.cell_length
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: 9,
            rows: 5,
            cell_length: 100.0,
            initial_resources: Resources::new(1000, 0, 0),
            max_cpu: 100,
            max_memory: 100,
            base_health: 100,
            max_waves: 10,
            breach_damage: 10,
            wave_initial_delay_ms: 3_000,
            wave_interval_ms: 10_000,
            spawn_stagger_ms: 800,
            wave_base_size: 5,
            wave_growth: 2,
            wave_size_cap: 20,
            projectile_speed: 8.0,
            hit_radius: 15.0,
            reference_frame_ms: 16,
            slow_recovery: 0.01,
            reveal_chance: 0.1,
            area_damage_per_second: 10.0,
            level_wave_growth: 2,
            level_health_restore: 50,
            max_frame_delta_ms: 100,
            seed: 0x5eed_c0de_d3f3_4ce5,
        }
    }
}
