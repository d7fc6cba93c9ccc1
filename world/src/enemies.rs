//! Enemy state, movement and the roster that owns it.

use code_defence_core::{EnemyFate, EnemyId, EnemyKind, EnemySnapshot, EnemySpecial, WorldPoint};

/// State of a single enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct EnemyUnit {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    row: u32,
    pub(crate) position: WorldPoint,
    health: u32,
    max_health: u32,
    slow_factor: f32,
    visible: bool,
    pub(crate) fate: EnemyFate,
}

impl EnemyUnit {
    fn spawn(id: EnemyId, kind: EnemyKind, row: u32, position: WorldPoint) -> Self {
        let definition = kind.definition();
        Self {
            id,
            kind,
            row,
            position,
            health: definition.base_health(),
            max_health: definition.base_health(),
            slow_factor: 1.0,
            visible: definition.special() != Some(EnemySpecial::Bypass),
            fate: EnemyFate::Alive,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.fate == EnemyFate::Alive
    }

    /// Keeps the strongest slow seen so far.
    pub(crate) fn apply_slow(&mut self, factor: f32) {
        self.slow_factor = self.slow_factor.min(factor.clamp(0.0, 1.0));
    }

    /// Marks the enemy as targetable. Returns whether it was hidden before.
    pub(crate) fn reveal(&mut self) -> bool {
        let was_hidden = !self.visible;
        self.visible = true;
        was_hidden
    }

    /// Relaxes the slow factor, then moves toward the base by `scale`
    /// reference frames. Returns `true` once the enemy reached the base.
    pub(crate) fn advance(&mut self, scale: f32, recovery: f32) -> bool {
        self.slow_factor = (self.slow_factor + recovery * scale).min(1.0);
        let speed = self.kind.definition().base_speed();
        self.position.x -= speed * self.slow_factor * scale;
        self.position.x <= 0.0
    }

    /// Applies damage, returning the health left. The enemy is killed when
    /// its health reaches zero while it is still alive.
    pub(crate) fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 && self.is_alive() {
            self.fate = EnemyFate::Killed;
        }
        self.health
    }

    /// Removes the enemy at the base without a kill.
    pub(crate) fn breach(&mut self) {
        self.health = 0;
        self.fate = EnemyFate::Breached;
    }

    pub(crate) fn special(&self) -> Option<EnemySpecial> {
        self.kind.definition().special()
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            row: self.row,
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            slow_factor: self.slow_factor,
            visible: self.visible,
            fate: self.fate,
        }
    }
}

/// Ordered collection of enemies. Entries stay sorted by identifier because
/// identifiers grow monotonically and removals preserve order.
#[derive(Debug)]
pub(crate) struct EnemyRoster {
    entries: Vec<EnemyUnit>,
    next_enemy_id: EnemyId,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    /// Creates a new enemy and returns its identifier.
    pub(crate) fn spawn(&mut self, kind: EnemyKind, row: u32, position: WorldPoint) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        self.entries.push(EnemyUnit::spawn(id, kind, row, position));
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&EnemyUnit> {
        self.index(id).map(|index| &self.entries[index])
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut EnemyUnit> {
        self.index(id).map(|index| &mut self.entries[index])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &EnemyUnit> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut EnemyUnit> {
        self.entries.iter_mut()
    }

    /// Removes every enemy that is no longer alive, in creation order.
    pub(crate) fn take_departed(&mut self) -> Vec<EnemyUnit> {
        let (alive, departed): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(EnemyUnit::is_alive);
        self.entries = alive;
        departed
    }

    /// Discards every enemy. Identifier allocation continues.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    fn index(&self, id: EnemyId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |enemy| enemy.id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_with(kinds: &[EnemyKind]) -> (EnemyRoster, Vec<EnemyId>) {
        let mut roster = EnemyRoster::new();
        let ids = kinds
            .iter()
            .map(|kind| roster.spawn(*kind, 0, WorldPoint::new(900.0, 50.0)))
            .collect();
        (roster, ids)
    }

    #[test]
    fn bypass_enemies_spawn_hidden() {
        let (mut roster, ids) =
            roster_with(&[EnemyKind::SyntaxError, EnemyKind::SecurityVulnerability]);
        assert!(roster.get(ids[0]).expect("enemy").snapshot().visible);

        let hidden = roster.get_mut(ids[1]).expect("enemy");
        assert!(!hidden.snapshot().visible);
        assert!(hidden.reveal());
        assert!(!hidden.reveal());
        assert!(hidden.snapshot().visible);
    }

    #[test]
    fn strongest_slow_wins() {
        let (mut roster, ids) = roster_with(&[EnemyKind::LogicBug]);
        let enemy = roster.get_mut(ids[0]).expect("enemy");
        enemy.apply_slow(0.5);
        enemy.apply_slow(0.3);
        enemy.apply_slow(0.5);
        assert_eq!(enemy.snapshot().slow_factor, 0.3);
    }

    #[test]
    fn slow_recovers_before_movement_is_scaled() {
        let (mut roster, ids) = roster_with(&[EnemyKind::RuntimeError]);
        let enemy = roster.get_mut(ids[0]).expect("enemy");
        enemy.apply_slow(0.5);

        assert!(!enemy.advance(2.0, 0.01));

        let snapshot = enemy.snapshot();
        assert!((snapshot.position.x - 898.44).abs() < 1e-4);
        assert!((snapshot.slow_factor - 0.52).abs() < 1e-6);
    }

    #[test]
    fn slow_recovery_is_capped() {
        let (mut roster, ids) = roster_with(&[EnemyKind::SyntaxError]);
        let enemy = roster.get_mut(ids[0]).expect("enemy");
        enemy.apply_slow(0.99);
        let _ = enemy.advance(10.0, 0.01);
        assert_eq!(enemy.snapshot().slow_factor, 1.0);
    }

    #[test]
    fn lethal_damage_kills_exactly_once() {
        let (mut roster, ids) = roster_with(&[EnemyKind::SyntaxError]);
        let enemy = roster.get_mut(ids[0]).expect("enemy");

        assert_eq!(enemy.take_damage(30), 20);
        assert!(enemy.is_alive());
        assert_eq!(enemy.take_damage(30), 0);
        assert_eq!(enemy.fate, EnemyFate::Killed);

        enemy.breach();
        let departed = roster.take_departed();
        assert_eq!(departed.len(), 1);
        assert!(roster.take_departed().is_empty());
    }

    #[test]
    fn breached_enemy_is_not_a_kill() {
        let (mut roster, ids) = roster_with(&[EnemyKind::LogicBug]);
        let enemy = roster.get_mut(ids[0]).expect("enemy");
        enemy.position.x = 0.5;

        assert!(enemy.advance(1.0, 0.01));
        enemy.breach();
        let _ = enemy.take_damage(10);

        assert_eq!(enemy.fate, EnemyFate::Breached);
    }

    #[test]
    fn departed_enemies_leave_in_creation_order() {
        let (mut roster, ids) = roster_with(&[
            EnemyKind::SyntaxError,
            EnemyKind::RuntimeError,
            EnemyKind::LogicBug,
            EnemyKind::SyntaxError,
        ]);
        let _ = roster.get_mut(ids[2]).expect("enemy").take_damage(500);
        roster.get_mut(ids[0]).expect("enemy").breach();

        let departed: Vec<EnemyId> = roster.take_departed().iter().map(|enemy| enemy.id).collect();
        assert_eq!(departed, vec![ids[0], ids[2]]);

        let remaining: Vec<EnemyId> = roster.iter().map(|enemy| enemy.id).collect();
        assert_eq!(remaining, vec![ids[1], ids[3]]);
        assert!(roster.get(ids[3]).is_some());
        assert!(roster.get(ids[2]).is_none());
    }
}
