//! Homing projectiles fired by defense units.

use code_defence_core::{EnemyId, ProjectileId, ProjectileSnapshot, UnitId, WorldPoint};

/// Result of advancing a projectile by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlightOutcome {
    /// Still travelling.
    InFlight,
    /// Reached its target and must apply its payload.
    Hit,
    /// Lost its target and was discarded.
    Expired,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    source: UnitId,
    pub(crate) target: EnemyId,
    pub(crate) position: WorldPoint,
    target_position: WorldPoint,
    pub(crate) damage: u32,
    completed: bool,
}

impl Projectile {
    /// Advances the projectile toward the current position of its target.
    ///
    /// `target` is `None` when the target left the field or is no longer
    /// alive, which expires the projectile.
    pub(crate) fn advance(
        &mut self,
        target: Option<WorldPoint>,
        step: f32,
        hit_radius: f32,
    ) -> FlightOutcome {
        if self.completed {
            return FlightOutcome::Expired;
        }

        let Some(target) = target else {
            self.completed = true;
            return FlightOutcome::Expired;
        };
        self.target_position = target;

        let distance = self.position.distance(self.target_position);
        if distance < hit_radius || distance <= f32::EPSILON {
            self.completed = true;
            return FlightOutcome::Hit;
        }

        let travel = step.max(0.0).min(distance);
        let ratio = travel / distance;
        self.position.x += (self.target_position.x - self.position.x) * ratio;
        self.position.y += (self.target_position.y - self.position.y) * ratio;
        FlightOutcome::InFlight
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            source: self.source,
            target: self.target,
            position: self.position,
            damage: self.damage,
        }
    }
}

/// Projectiles in flight, ordered by identifier.
#[derive(Debug)]
pub(crate) struct ProjectileRoster {
    entries: Vec<Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    /// Launches a projectile from `origin` toward `target_position`.
    pub(crate) fn launch(
        &mut self,
        source: UnitId,
        target: EnemyId,
        origin: WorldPoint,
        target_position: WorldPoint,
        damage: u32,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        self.entries.push(Projectile {
            id,
            source,
            target,
            position: origin,
            target_position,
            damage,
            completed: false,
        });
        id
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.entries.iter_mut()
    }

    pub(crate) fn remove_completed(&mut self) {
        self.entries.retain(|projectile| !projectile.completed);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
