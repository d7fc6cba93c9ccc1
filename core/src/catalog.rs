//! Static definitions for the defense tools and bug enemies.
//!
//! The catalog is immutable data. Every placed unit and spawned enemy refers
//! back to one of these entries through its [`ToolKind`] or [`EnemyKind`], and
//! level-dependent stats are derived from the base values declared here.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Cost, Reward};

/// Highest level a defense unit can reach through upgrades.
pub const MAX_UNIT_LEVEL: u8 = 3;

/// Shortest fire interval any upgrade may produce.
pub const MIN_FIRE_INTERVAL: Duration = Duration::from_millis(200);

const DAMAGE_GROWTH: f64 = 1.5;
const RANGE_GROWTH: f32 = 1.1;
const FIRE_INTERVAL_GROWTH: f64 = 0.8;
const UPGRADE_COST_GROWTH: f64 = 1.5;

/// Behaviour a placed unit exhibits each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackType {
    /// Fires one projectile at the nearest enemy in range.
    SingleTarget,
    /// Same targeting as [`AttackType::SingleTarget`] with a heavier payload.
    HighDamageSingle,
    /// Fires one projectile at every enemy in range at once.
    AreaOfEffect,
    /// Restores health to a damaged neighbouring unit.
    Heal,
    /// Slows every enemy in range.
    Slow,
    /// Multiplies the damage of neighbouring units.
    Buff,
    /// Uncovers invisible enemies in range.
    Reveal,
    /// Never fires; reduces the damage the base takes from breaches.
    PassiveShield,
}

/// Behavioural tag attached to some enemy types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemySpecial {
    /// Spawns invisible and cannot be targeted until revealed.
    Bypass,
    /// Corrupts the units around the cell the enemy currently overlaps.
    AreaDamage,
}

/// Identifies a placeable defense tool.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// Basic single-target unit.
    Debugger,
    /// Area attacker.
    Formatter,
    /// Healer for neighbouring units.
    VersionControl,
    /// Slowing aura.
    IntelliSense,
    /// Slow, heavy single-target attacker.
    Terminal,
    /// Damage buff aura.
    Extension,
    /// Reveals invisible enemies.
    CodeReview,
    /// Passive base shield.
    Autosave,
}

impl ToolKind {
    /// Every tool in catalog order.
    pub const ALL: [ToolKind; 8] = [
        ToolKind::Debugger,
        ToolKind::Formatter,
        ToolKind::VersionControl,
        ToolKind::IntelliSense,
        ToolKind::Terminal,
        ToolKind::Extension,
        ToolKind::CodeReview,
        ToolKind::Autosave,
    ];

    /// Returns the immutable definition backing this tool.
    #[must_use]
    pub fn definition(self) -> &'static ToolDefinition {
        match self {
            Self::Debugger => &DEBUGGER,
            Self::Formatter => &FORMATTER,
            Self::VersionControl => &VERSION_CONTROL,
            Self::IntelliSense => &INTELLISENSE,
            Self::Terminal => &TERMINAL,
            Self::Extension => &EXTENSION,
            Self::CodeReview => &CODE_REVIEW,
            Self::Autosave => &AUTOSAVE,
        }
    }

    /// Stable kebab-case identifier used by adapters and configuration.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Debugger => "debugger",
            Self::Formatter => "formatter",
            Self::VersionControl => "version-control",
            Self::IntelliSense => "intellisense",
            Self::Terminal => "terminal",
            Self::Extension => "extension",
            Self::CodeReview => "code-review",
            Self::Autosave => "autosave",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Returned when a string does not name a catalog tool.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown tool `{0}`")]
pub struct UnknownToolKind(pub String);

impl FromStr for ToolKind {
    type Err = UnknownToolKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownToolKind(trimmed.to_owned()))
    }
}

/// Immutable description of a defense tool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolDefinition {
    kind: ToolKind,
    name: &'static str,
    cost: Cost,
    damage: u32,
    range: f32,
    fire_interval: Duration,
    attack: AttackType,
    effect: Option<f32>,
}

impl ToolDefinition {
    /// Tool this definition describes.
    #[must_use]
    pub const fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Resources consumed when the tool is placed.
    #[must_use]
    pub const fn cost(&self) -> Cost {
        self.cost
    }

    /// Behaviour dispatched for units built from this tool.
    #[must_use]
    pub const fn attack(&self) -> AttackType {
        self.attack
    }

    /// Heal amount, slow factor, buff multiplier or shield factor.
    #[must_use]
    pub const fn effect(&self) -> Option<f32> {
        self.effect
    }

    /// Derives the stats of a unit built from this tool at the given level.
    ///
    /// Levels below one are treated as level one.
    #[must_use]
    pub fn stats_at(&self, level: u8) -> UnitStats {
        let steps = i32::from(level.max(1) - 1);
        let damage = (f64::from(self.damage) * DAMAGE_GROWTH.powi(steps)).floor() as u32;
        let range = self.range * RANGE_GROWTH.powi(steps);
        let fire_interval = if steps == 0 {
            self.fire_interval
        } else {
            let millis = self.fire_interval.as_millis() as f64 * FIRE_INTERVAL_GROWTH.powi(steps);
            Duration::from_millis(millis.round() as u64).max(MIN_FIRE_INTERVAL)
        };

        UnitStats {
            damage,
            range,
            fire_interval,
        }
    }

    /// Currency required to upgrade a unit currently at `level`.
    ///
    /// Upgrades never consume cpu or memory.
    #[must_use]
    pub fn upgrade_cost(&self, level: u8) -> u32 {
        let scaled = f64::from(self.cost.currency) * UPGRADE_COST_GROWTH.powi(i32::from(level));
        scaled.floor() as u32
    }
}

/// Level-dependent combat stats of a placed unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitStats {
    /// Damage carried by each projectile.
    pub damage: u32,
    /// Reach measured in grid cells.
    pub range: f32,
    /// Minimum time between cooldown-gated actions.
    pub fire_interval: Duration,
}

static DEBUGGER: ToolDefinition = ToolDefinition {
    kind: ToolKind::Debugger,
    name: "Debugger",
    cost: Cost::new(100, 10, 5),
    damage: 25,
    range: 2.0,
    fire_interval: Duration::from_millis(1000),
    attack: AttackType::SingleTarget,
    effect: None,
};

static FORMATTER: ToolDefinition = ToolDefinition {
    kind: ToolKind::Formatter,
    name: "Formatter",
    cost: Cost::new(150, 15, 8),
    damage: 15,
    range: 1.5,
    fire_interval: Duration::from_millis(1500),
    attack: AttackType::AreaOfEffect,
    effect: None,
};

static VERSION_CONTROL: ToolDefinition = ToolDefinition {
    kind: ToolKind::VersionControl,
    name: "Version Control",
    cost: Cost::new(200, 20, 10),
    damage: 0,
    range: 2.0,
    fire_interval: Duration::from_millis(2000),
    attack: AttackType::Heal,
    effect: Some(20.0),
};

static INTELLISENSE: ToolDefinition = ToolDefinition {
    kind: ToolKind::IntelliSense,
    name: "IntelliSense",
    cost: Cost::new(120, 12, 6),
    damage: 10,
    range: 2.5,
    fire_interval: Duration::from_millis(800),
    attack: AttackType::Slow,
    effect: Some(0.5),
};

static TERMINAL: ToolDefinition = ToolDefinition {
    kind: ToolKind::Terminal,
    name: "Terminal",
    cost: Cost::new(300, 25, 15),
    damage: 50,
    range: 1.5,
    fire_interval: Duration::from_millis(2000),
    attack: AttackType::HighDamageSingle,
    effect: None,
};

static EXTENSION: ToolDefinition = ToolDefinition {
    kind: ToolKind::Extension,
    name: "Extension",
    cost: Cost::new(180, 18, 12),
    damage: 5,
    range: 3.0,
    fire_interval: Duration::from_millis(1000),
    attack: AttackType::Buff,
    effect: Some(1.2),
};

static CODE_REVIEW: ToolDefinition = ToolDefinition {
    kind: ToolKind::CodeReview,
    name: "Code Review",
    cost: Cost::new(160, 14, 8),
    damage: 20,
    range: 2.5,
    fire_interval: Duration::from_millis(1200),
    attack: AttackType::Reveal,
    effect: None,
};

static AUTOSAVE: ToolDefinition = ToolDefinition {
    kind: ToolKind::Autosave,
    name: "Autosave",
    cost: Cost::new(250, 22, 18),
    damage: 0,
    range: 0.0,
    fire_interval: Duration::ZERO,
    attack: AttackType::PassiveShield,
    effect: Some(0.8),
};

/// Identifies a bug enemy type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EnemyKind {
    /// Fragile and common.
    SyntaxError,
    /// Fast.
    RuntimeError,
    /// Slow and sturdy.
    LogicBug,
    /// Spawns invisible.
    SecurityVulnerability,
    /// Corrupts nearby units while alive.
    DependencyConflict,
}

impl EnemyKind {
    /// Every enemy type in catalog order.
    pub const ALL: [EnemyKind; 5] = [
        EnemyKind::SyntaxError,
        EnemyKind::RuntimeError,
        EnemyKind::LogicBug,
        EnemyKind::SecurityVulnerability,
        EnemyKind::DependencyConflict,
    ];

    /// Returns the immutable definition backing this enemy type.
    #[must_use]
    pub fn definition(self) -> &'static EnemyTypeDefinition {
        match self {
            Self::SyntaxError => &SYNTAX_ERROR,
            Self::RuntimeError => &RUNTIME_ERROR,
            Self::LogicBug => &LOGIC_BUG,
            Self::SecurityVulnerability => &SECURITY_VULNERABILITY,
            Self::DependencyConflict => &DEPENDENCY_CONFLICT,
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name())
    }
}

/// Immutable description of an enemy type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyTypeDefinition {
    kind: EnemyKind,
    name: &'static str,
    health: u32,
    speed: f32,
    reward: Reward,
    spawn_weight: f64,
    special: Option<EnemySpecial>,
}

impl EnemyTypeDefinition {
    /// Enemy type this definition describes.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Health an enemy of this type spawns with.
    #[must_use]
    pub const fn base_health(&self) -> u32 {
        self.health
    }

    /// World units travelled per reference frame before slow effects.
    #[must_use]
    pub const fn base_speed(&self) -> f32 {
        self.speed
    }

    /// Resources granted when the enemy is destroyed by damage.
    #[must_use]
    pub const fn reward(&self) -> Reward {
        self.reward
    }

    /// Base probability used by the wave director's spawn filter.
    #[must_use]
    pub const fn spawn_weight(&self) -> f64 {
        self.spawn_weight
    }

    /// Optional behavioural tag.
    #[must_use]
    pub const fn special(&self) -> Option<EnemySpecial> {
        self.special
    }
}

static SYNTAX_ERROR: EnemyTypeDefinition = EnemyTypeDefinition {
    kind: EnemyKind::SyntaxError,
    name: "Syntax Error",
    health: 50,
    speed: 1.0,
    reward: Reward::new(20, -2, -1),
    spawn_weight: 0.4,
    special: None,
};

static RUNTIME_ERROR: EnemyTypeDefinition = EnemyTypeDefinition {
    kind: EnemyKind::RuntimeError,
    name: "Runtime Error",
    health: 75,
    speed: 1.5,
    reward: Reward::new(30, -3, -2),
    spawn_weight: 0.3,
    special: None,
};

static LOGIC_BUG: EnemyTypeDefinition = EnemyTypeDefinition {
    kind: EnemyKind::LogicBug,
    name: "Logic Bug",
    health: 120,
    speed: 0.8,
    reward: Reward::new(50, -4, -2),
    spawn_weight: 0.2,
    special: None,
};

static SECURITY_VULNERABILITY: EnemyTypeDefinition = EnemyTypeDefinition {
    kind: EnemyKind::SecurityVulnerability,
    name: "Security Vulnerability",
    health: 90,
    speed: 1.2,
    reward: Reward::new(40, -3, -3),
    spawn_weight: 0.15,
    special: Some(EnemySpecial::Bypass),
};

static DEPENDENCY_CONFLICT: EnemyTypeDefinition = EnemyTypeDefinition {
    kind: EnemyKind::DependencyConflict,
    name: "Dependency Conflict",
    health: 100,
    speed: 1.0,
    reward: Reward::new(35, -5, -3),
    spawn_weight: 0.1,
    special: Some(EnemySpecial::AreaDamage),
};
