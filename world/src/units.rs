//! Authoritative defense unit state management utilities.

use std::{collections::BTreeMap, time::Duration};

use code_defence_core::{
    AttackType, CellCoord, ToolKind, UnitId, UnitSnapshot, UnitStats, MAX_UNIT_HEALTH,
    MAX_UNIT_LEVEL,
};

/// State of a placed unit stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct DefenseUnit {
    /// Identifier allocated by the world for the unit.
    pub(crate) id: UnitId,
    /// Tool the unit was built from.
    pub(crate) tool: ToolKind,
    /// Cell occupied by the unit.
    pub(crate) cell: CellCoord,
    /// Current level in `1..=MAX_UNIT_LEVEL`.
    pub(crate) level: u8,
    stats: UnitStats,
    last_fired: Option<Duration>,
    health: f32,
    buff: f32,
}

impl DefenseUnit {
    fn new(id: UnitId, tool: ToolKind, cell: CellCoord) -> Self {
        Self {
            id,
            tool,
            cell,
            level: 1,
            stats: tool.definition().stats_at(1),
            last_fired: None,
            health: MAX_UNIT_HEALTH,
            buff: 1.0,
        }
    }

    /// Whether another level is available.
    pub(crate) fn can_upgrade(&self) -> bool {
        self.level < MAX_UNIT_LEVEL
    }

    /// Raises the unit by one level, recomputing its stats. Returns the new
    /// level, or `None` when the unit is already at the highest level.
    pub(crate) fn upgrade(&mut self) -> Option<u8> {
        if !self.can_upgrade() {
            return None;
        }
        self.level += 1;
        self.stats = self.tool.definition().stats_at(self.level);
        Some(self.level)
    }

    /// Restores health, clamped to the maximum. Returns whether the health changed.
    pub(crate) fn heal(&mut self, amount: f32) -> bool {
        let healed = (self.health + amount.max(0.0)).min(MAX_UNIT_HEALTH);
        let changed = healed > self.health;
        self.health = healed;
        changed
    }

    /// Drains health, clamped at zero.
    pub(crate) fn corrupt(&mut self, amount: f32) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
    }

    pub(crate) fn reset_cooldown(&mut self, now: Duration) {
        self.last_fired = Some(now);
    }

    pub(crate) fn set_buff(&mut self, multiplier: f32) {
        self.buff = multiplier;
    }

    pub(crate) fn is_operational(&self) -> bool {
        self.health > 0.0
    }

    /// Breach damage multiplier contributed by an operational shield unit.
    pub(crate) fn shield_factor(&self) -> Option<f32> {
        let definition = self.tool.definition();
        if definition.attack() == AttackType::PassiveShield && self.is_operational() {
            definition.effect()
        } else {
            None
        }
    }

    pub(crate) fn snapshot(&self, cell_length: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            tool: self.tool,
            cell: self.cell,
            center: self.cell.center(cell_length),
            level: self.level,
            stats: self.stats,
            last_fired: self.last_fired,
            health: self.health,
            buff: self.buff,
        }
    }
}

/// Registry that stores units and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, DefenseUnit>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    /// Creates an empty unit registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    /// Stores a fresh level-one unit and returns its identifier.
    pub(crate) fn insert(&mut self, tool: ToolKind, cell: CellCoord) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, DefenseUnit::new(id, tool, cell));
        id
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&DefenseUnit> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut DefenseUnit> {
        self.entries.get_mut(&id)
    }

    /// Units in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &DefenseUnit> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut DefenseUnit> {
        self.entries.values_mut()
    }

    /// Strongest breach damage reduction among operational shields.
    pub(crate) fn shield_factor(&self) -> f32 {
        self.iter()
            .filter_map(DefenseUnit::shield_factor)
            .fold(1.0, f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = UnitRegistry::new();
        let first = registry.insert(ToolKind::Debugger, CellCoord::new(0, 0));
        let second = registry.insert(ToolKind::Formatter, CellCoord::new(1, 0));

        assert_eq!(first, UnitId::new(0));
        assert_eq!(second, UnitId::new(1));
        let ids: Vec<UnitId> = registry.iter().map(|unit| unit.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn upgrade_stops_at_maximum_level() {
        let mut registry = UnitRegistry::new();
        let id = registry.insert(ToolKind::Debugger, CellCoord::new(0, 0));
        let unit = registry.get_mut(id).expect("unit");

        assert_eq!(unit.upgrade(), Some(2));
        assert_eq!(unit.snapshot(100.0).stats.damage, 37);
        assert_eq!(unit.upgrade(), Some(3));
        assert!(!unit.can_upgrade());
        assert_eq!(unit.upgrade(), None);
        assert_eq!(unit.level, MAX_UNIT_LEVEL);
    }

    #[test]
    fn heal_clamps_to_maximum_health() {
        let mut registry = UnitRegistry::new();
        let id = registry.insert(ToolKind::Terminal, CellCoord::new(2, 2));
        let unit = registry.get_mut(id).expect("unit");

        assert!(!unit.heal(20.0));
        unit.corrupt(30.0);
        assert!(unit.heal(20.0));
        assert!(unit.heal(20.0));
        assert_eq!(unit.snapshot(100.0).health, MAX_UNIT_HEALTH);
    }

    #[test]
    fn corrupted_unit_is_disabled() {
        let mut registry = UnitRegistry::new();
        let id = registry.insert(ToolKind::Autosave, CellCoord::new(0, 1));
        assert_eq!(registry.shield_factor(), 0.8);

        registry.get_mut(id).expect("unit").corrupt(250.0);

        let unit = registry.get(id).expect("unit");
        assert!(!unit.is_operational());
        assert_eq!(unit.snapshot(100.0).health, 0.0);
        assert_eq!(registry.shield_factor(), 1.0);
    }

    #[test]
    fn snapshot_reports_cell_centre_and_cooldown() {
        let mut registry = UnitRegistry::new();
        let id = registry.insert(ToolKind::Debugger, CellCoord::new(3, 1));
        let unit = registry.get_mut(id).expect("unit");
        unit.reset_cooldown(Duration::from_millis(640));
        unit.set_buff(1.2);

        let snapshot = unit.snapshot(100.0);
        assert_eq!(snapshot.center.x, 350.0);
        assert_eq!(snapshot.center.y, 150.0);
        assert_eq!(snapshot.last_fired, Some(Duration::from_millis(640)));
        assert_eq!(snapshot.buff, 1.2);
    }
}
