#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that resolves defense unit behaviour into world commands.
//!
//! Every frame the resolver first projects auras (buff, slow and reveal) in
//! unit identifier order, then lets units whose cooldown elapsed act. The
//! damage carried by projectiles uses the buff multipliers computed in the
//! same frame's aura pass.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use code_defence_core::{
    AttackType, CellCoord, Command, EnemyId, EnemySnapshot, EnemyView, GameConfig, PlayState,
    UnitId, UnitSnapshot, UnitView, MAX_UNIT_HEALTH,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Combat resolver that owns the random stream used for reveal rolls.
#[derive(Debug)]
pub struct Combat {
    rng: ChaCha8Rng,
    buffs: BTreeMap<UnitId, f32>,
    revealed: BTreeSet<EnemyId>,
}

impl Combat {
    /// Creates a combat resolver whose reveal rolls replay for equal seeds.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            buffs: BTreeMap::new(),
            revealed: BTreeSet::new(),
        }
    }

    /// Emits the commands produced by every operational unit this frame.
    ///
    /// `now` is the simulation clock after the frame's clock advance.
    pub fn handle(
        &mut self,
        play_state: PlayState,
        now: Duration,
        units: &UnitView,
        enemies: &EnemyView,
        config: &GameConfig,
        out: &mut Vec<Command>,
    ) {
        if play_state != PlayState::Playing || units.is_empty() {
            return;
        }

        self.buffs.clear();
        self.revealed.clear();

        for unit in units.iter().filter(|unit| unit.is_operational()) {
            self.project_aura(unit, units, enemies, config, out);
        }

        for unit in units.iter().filter(|unit| unit.is_operational()) {
            if unit.ready_at(now) {
                self.act(unit, units, enemies, config, out);
            }
        }
    }

    fn project_aura(
        &mut self,
        unit: &UnitSnapshot,
        units: &UnitView,
        enemies: &EnemyView,
        config: &GameConfig,
        out: &mut Vec<Command>,
    ) {
        let definition = unit.tool.definition();
        let reach = unit.stats.range * config.cell_length;

        match definition.attack() {
            AttackType::Slow => {
                let factor = definition.effect().unwrap_or(1.0);
                for enemy in in_range(unit, enemies, reach) {
                    out.push(Command::ApplySlow {
                        enemy: enemy.id,
                        factor,
                    });
                }
            }
            AttackType::Buff => {
                let multiplier = definition.effect().unwrap_or(1.0);
                for neighbor in neighbors(unit, units) {
                    let _ = self.buffs.insert(neighbor.id, multiplier);
                    out.push(Command::ApplyBuff {
                        unit: neighbor.id,
                        multiplier,
                    });
                }
            }
            AttackType::Reveal => {
                let chance = config.reveal_chance.clamp(0.0, 1.0);
                for enemy in in_range(unit, enemies, reach) {
                    if enemy.visible || self.revealed.contains(&enemy.id) {
                        continue;
                    }
                    if self.rng.gen_bool(chance) {
                        let _ = self.revealed.insert(enemy.id);
                        out.push(Command::RevealEnemy { enemy: enemy.id });
                    }
                }
            }
            AttackType::SingleTarget
            | AttackType::HighDamageSingle
            | AttackType::AreaOfEffect
            | AttackType::Heal
            | AttackType::PassiveShield => {}
        }
    }

    fn act(
        &self,
        unit: &UnitSnapshot,
        units: &UnitView,
        enemies: &EnemyView,
        config: &GameConfig,
        out: &mut Vec<Command>,
    ) {
        let definition = unit.tool.definition();
        let reach = unit.stats.range * config.cell_length;

        match definition.attack() {
            AttackType::SingleTarget | AttackType::HighDamageSingle => {
                let Some(target) = self.nearest_target(unit, enemies, reach) else {
                    return;
                };
                out.push(Command::FireProjectile {
                    unit: unit.id,
                    target,
                    damage: self.damage(unit),
                });
                out.push(Command::ResetCooldown { unit: unit.id });
            }
            AttackType::AreaOfEffect => {
                let damage = self.damage(unit);
                let mut fired = false;
                for enemy in in_range(unit, enemies, reach).filter(|enemy| self.targetable(enemy)) {
                    out.push(Command::FireProjectile {
                        unit: unit.id,
                        target: enemy.id,
                        damage,
                    });
                    fired = true;
                }
                if fired {
                    out.push(Command::ResetCooldown { unit: unit.id });
                }
            }
            AttackType::Heal => {
                let Some(target) = heal_target(unit, units) else {
                    return;
                };
                out.push(Command::HealUnit {
                    source: unit.id,
                    target,
                    amount: definition.effect().unwrap_or(0.0),
                });
                out.push(Command::ResetCooldown { unit: unit.id });
            }
            AttackType::Slow
            | AttackType::Buff
            | AttackType::Reveal
            | AttackType::PassiveShield => {}
        }
    }

    fn targetable(&self, enemy: &EnemySnapshot) -> bool {
        enemy.visible || self.revealed.contains(&enemy.id)
    }

    fn nearest_target(
        &self,
        unit: &UnitSnapshot,
        enemies: &EnemyView,
        reach: f32,
    ) -> Option<EnemyId> {
        let mut best: Option<(f32, EnemyId)> = None;
        for enemy in in_range(unit, enemies, reach).filter(|enemy| self.targetable(enemy)) {
            let distance = unit.center.distance(enemy.position);
            let closer = match best {
                Some((best_distance, _)) => distance < best_distance,
                None => true,
            };
            if closer {
                best = Some((distance, enemy.id));
            }
        }
        best.map(|(_, id)| id)
    }

    fn damage(&self, unit: &UnitSnapshot) -> u32 {
        let buff = self.buffs.get(&unit.id).copied().unwrap_or(1.0);
        (unit.stats.damage as f32 * buff).floor() as u32
    }
}

/// Alive enemies within `reach` of the unit, in creation order.
fn in_range<'a>(
    unit: &'a UnitSnapshot,
    enemies: &'a EnemyView,
    reach: f32,
) -> impl Iterator<Item = &'a EnemySnapshot> + 'a {
    enemies
        .iter()
        .filter(|enemy| enemy.is_alive())
        .filter(move |enemy| unit.center.distance(enemy.position) <= reach)
}

/// Other units in the 3×3 block around the unit, in row-major order.
fn neighbors<'a>(
    unit: &'a UnitSnapshot,
    units: &'a UnitView,
) -> impl Iterator<Item = &'a UnitSnapshot> + 'a {
    let mut found: Vec<&UnitSnapshot> = units
        .iter()
        .filter(|other| other.id != unit.id && adjacent(unit.cell, other.cell))
        .collect();
    found.sort_by_key(|other| (other.cell.row(), other.cell.column()));
    found.into_iter()
}

fn heal_target(unit: &UnitSnapshot, units: &UnitView) -> Option<UnitId> {
    neighbors(unit, units)
        .find(|other| other.health < MAX_UNIT_HEALTH)
        .map(|other| other.id)
}

fn adjacent(a: CellCoord, b: CellCoord) -> bool {
    a.column().abs_diff(b.column()) <= 1 && a.row().abs_diff(b.row()) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_defence_core::{EnemyFate, EnemyKind, ToolKind, WorldPoint};

    fn unit(id: u32, tool: ToolKind, column: u32, row: u32) -> UnitSnapshot {
        let cell = CellCoord::new(column, row);
        UnitSnapshot {
            id: UnitId::new(id),
            tool,
            cell,
            center: cell.center(100.0),
            level: 1,
            stats: tool.definition().stats_at(1),
            last_fired: None,
            health: MAX_UNIT_HEALTH,
            buff: 1.0,
        }
    }

    fn enemy(id: u32, x: f32, y: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::SyntaxError,
            row: 0,
            position: WorldPoint::new(x, y),
            health: 50,
            max_health: 50,
            slow_factor: 1.0,
            visible: true,
            fate: EnemyFate::Alive,
        }
    }

    fn resolve(units: Vec<UnitSnapshot>, enemies: Vec<EnemySnapshot>) -> Vec<Command> {
        let mut combat = Combat::new(7);
        let mut out = Vec::new();
        combat.handle(
            PlayState::Playing,
            Duration::from_millis(5_000),
            &UnitView::from_snapshots(units),
            &EnemyView::from_snapshots(enemies),
            &GameConfig::default(),
            &mut out,
        );
        out
    }

    #[test]
    fn paused_session_is_silent() {
        let mut combat = Combat::new(1);
        let mut out = Vec::new();
        combat.handle(
            PlayState::Paused,
            Duration::ZERO,
            &UnitView::from_snapshots(vec![unit(0, ToolKind::Debugger, 0, 0)]),
            &EnemyView::from_snapshots(vec![enemy(0, 60.0, 50.0)]),
            &GameConfig::default(),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn nearest_enemy_is_targeted_with_id_tie_break() {
        let out = resolve(
            vec![unit(0, ToolKind::Debugger, 2, 0)],
            vec![
                enemy(5, 400.0, 50.0),
                enemy(3, 150.0, 50.0),
                enemy(4, 350.0, 50.0),
            ],
        );
        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    unit: UnitId::new(0),
                    target: EnemyId::new(3),
                    damage: 25,
                },
                Command::ResetCooldown {
                    unit: UnitId::new(0),
                },
            ]
        );
    }

    #[test]
    fn enemies_beyond_range_are_ignored() {
        let out = resolve(
            vec![unit(0, ToolKind::Debugger, 0, 0)],
            vec![enemy(0, 251.0, 50.0)],
        );
        assert!(out.is_empty());
    }

    #[test]
    fn disabled_units_do_nothing() {
        let mut broken = unit(0, ToolKind::Terminal, 0, 0);
        broken.health = 0.0;
        let out = resolve(vec![broken], vec![enemy(0, 60.0, 50.0)]);
        assert!(out.is_empty());
    }

    #[test]
    fn buff_multiplies_damage_in_the_same_frame() {
        let out = resolve(
            vec![
                unit(0, ToolKind::Debugger, 1, 1),
                unit(1, ToolKind::Extension, 2, 1),
            ],
            vec![enemy(0, 250.0, 150.0)],
        );
        assert_eq!(
            out,
            vec![
                Command::ApplyBuff {
                    unit: UnitId::new(0),
                    multiplier: 1.2,
                },
                Command::FireProjectile {
                    unit: UnitId::new(0),
                    target: EnemyId::new(0),
                    damage: 30,
                },
                Command::ResetCooldown {
                    unit: UnitId::new(0),
                },
            ]
        );
    }

    #[test]
    fn heal_picks_first_damaged_neighbour_in_row_major_order() {
        let mut far = unit(1, ToolKind::Debugger, 5, 2);
        far.health = 10.0;
        let mut below = unit(2, ToolKind::Debugger, 1, 2);
        below.health = 40.0;
        let mut left = unit(3, ToolKind::Debugger, 0, 1);
        left.health = 80.0;

        let out = resolve(
            vec![unit(0, ToolKind::VersionControl, 1, 1), far, below, left],
            Vec::new(),
        );

        assert_eq!(
            out,
            vec![
                Command::HealUnit {
                    source: UnitId::new(0),
                    target: UnitId::new(3),
                    amount: 20.0,
                },
                Command::ResetCooldown {
                    unit: UnitId::new(0),
                },
            ]
        );
    }

    #[test]
    fn healthy_neighbourhood_keeps_heal_cooldown() {
        let out = resolve(
            vec![
                unit(0, ToolKind::VersionControl, 1, 1),
                unit(1, ToolKind::Debugger, 1, 2),
            ],
            Vec::new(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn invisible_enemies_are_never_fired_upon_while_hidden() {
        let mut hidden = enemy(0, 60.0, 50.0);
        hidden.visible = false;
        let out = resolve(vec![unit(0, ToolKind::Terminal, 0, 0)], vec![hidden]);
        assert!(out.is_empty());
    }

    #[test]
    fn certain_reveal_unlocks_targeting_in_the_same_frame() {
        let mut hidden = enemy(0, 150.0, 50.0);
        hidden.visible = false;
        let config = GameConfig {
            reveal_chance: 1.0,
            ..GameConfig::default()
        };
        let mut combat = Combat::new(3);
        let mut out = Vec::new();
        combat.handle(
            PlayState::Playing,
            Duration::ZERO,
            &UnitView::from_snapshots(vec![
                unit(0, ToolKind::Debugger, 0, 0),
                unit(1, ToolKind::CodeReview, 0, 1),
            ]),
            &EnemyView::from_snapshots(vec![hidden]),
            &config,
            &mut out,
        );

        assert_eq!(
            out,
            vec![
                Command::RevealEnemy {
                    enemy: EnemyId::new(0),
                },
                Command::FireProjectile {
                    unit: UnitId::new(0),
                    target: EnemyId::new(0),
                    damage: 25,
                },
                Command::ResetCooldown {
                    unit: UnitId::new(0),
                },
            ]
        );
    }

    #[test]
    fn shields_never_act() {
        let out = resolve(
            vec![unit(0, ToolKind::Autosave, 0, 0)],
            vec![enemy(0, 50.0, 50.0)],
        );
        assert!(out.is_empty());
    }
}
