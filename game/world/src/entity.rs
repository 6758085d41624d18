use common::{EntityId, Material, Vector2, Zero};
use physics::{CircularBody, Force};

/// Kind-specific state beyond the shared `Entity` fields. The Python source gives every kind its
/// own `EntityModel` subclass with its own behaviour methods (`runAI`, `reactToCollision`,
/// `onAttackRequest`); here the behaviour lives in `simulation`, dispatched over this enum, while
/// `Entity` itself stays a plain data record. Ground truth: `bunny/world.py`.
#[derive(Clone, Debug)]
pub enum EntityKind {
    Generic,
    Bunny { carrots: u32 },
    ZombieFox { change_direction_cooldown: f32 },
    Carrot,
}

/// Shared state of every living creature (`CreatureModel` in the source): health tracking and the
/// two cooldowns every creature counts down every physics tick.
#[derive(Copy, Clone, Debug)]
pub struct CreatureState {
    pub max_health: u32,
    pub health: u32,
    pub damage_cooldown: f32,
    pub attack_cooldown: f32,
}

impl CreatureState {
    pub fn new(max_health: u32) -> Self {
        Self {
            max_health,
            health: max_health,
            damage_cooldown: 0.0,
            attack_cooldown: 0.0,
        }
    }
}

/// Anything that can exist in an [`Area`](crate::Area). Ground truth: `infiniworld/models/
/// entity.py::EntityModel`. `body.forces[0]` is always the walk force (`Force::Constant`),
/// `body.forces[1]` the tile-friction force (`Force::KineticFriction`) — fixed slots, not a
/// lookup, since every entity has exactly these two and nothing else pushes into `forces`.
#[derive(Clone, Debug)]
pub struct Entity {
    pub id: EntityId,
    pub area: Option<common::AreaId>,
    pub age: f32,
    pub name: &'static str,
    pub body: CircularBody,
    pub walk_strength: f32,
    pub exists: bool,
    pub is_moving: bool,
    pub kind: EntityKind,
    pub creature: Option<CreatureState>,
}

/// A constructor capable of producing a fresh entity given the id the world assigns it.
/// Spawners hold one of these (ground truth: `SpawnerModel.factory`, a bound class reference in
/// the source) to create entities without knowing their concrete kind.
pub type EntityFactory = fn(EntityId) -> Entity;

const WALK_FORCE_SLOT: usize = 0;
const FRICTION_FORCE_SLOT: usize = 1;

impl Entity {
    fn new(
        id: EntityId,
        name: &'static str,
        mass: f32,
        radius: f32,
        solid: bool,
        material: Material,
        walk_strength: f32,
        kind: EntityKind,
        creature: Option<CreatureState>,
    ) -> Self {
        let mut body = CircularBody::new(mass, Vector2::zero(), solid, material, radius);
        body.body.forces.push(Force::Constant(Vector2::zero()));
        body.body.forces.push(Force::KineticFriction(0.0));
        Self {
            id,
            area: None,
            age: 0.0,
            name,
            body,
            walk_strength,
            exists: true,
            is_moving: false,
            kind,
            creature,
        }
    }

    /// A bare, uninteresting entity. Ground truth: `EntityModel` base defaults (mass 1, radius
    /// 0.5, walk strength 0, solid, flesh).
    pub fn generic(id: EntityId) -> Self {
        Self::new(
            id,
            "Entity",
            1.0,
            0.5,
            true,
            Material::FLESH,
            0.0,
            EntityKind::Generic,
            None,
        )
    }

    /// Ground truth: `BunnyModel` constants.
    pub fn bunny(id: EntityId) -> Self {
        Self::new(
            id,
            "Bunny",
            1.0,
            0.3,
            true,
            Material::FLESH,
            50.0,
            EntityKind::Bunny { carrots: 0 },
            Some(CreatureState::new(10)),
        )
    }

    /// Ground truth: `ZombieFoxModel` constants.
    pub fn zombie_fox(id: EntityId) -> Self {
        Self::new(
            id,
            "Zombie fox",
            3.0,
            0.5,
            true,
            Material::FLESH,
            30.0,
            EntityKind::ZombieFox {
                change_direction_cooldown: 0.0,
            },
            Some(CreatureState::new(1)),
        )
    }

    /// Ground truth: `CarrotModel` constants. Non-solid: never initiates a collision, only reacts
    /// to being collided with.
    pub fn carrot(id: EntityId) -> Self {
        Self::new(
            id,
            "Carrot",
            1.0,
            0.5,
            false,
            Material::FLESH,
            30.0,
            EntityKind::Carrot,
            None,
        )
    }

    pub fn set_walk_force(&mut self, force: Vector2) {
        self.body.body.forces[WALK_FORCE_SLOT] = Force::Constant(force);
    }

    pub fn walk_force(&self) -> Vector2 {
        match self.body.body.forces[WALK_FORCE_SLOT] {
            Force::Constant(v) => v,
            _ => unreachable!("slot 0 is always the walk force"),
        }
    }

    pub fn set_friction(&mut self, mu: f32) {
        self.body.body.forces[FRICTION_FORCE_SLOT] = Force::KineticFriction(mu);
    }

    pub fn summary(&self) -> common::EntitySummary {
        common::EntitySummary {
            entity_id: self.id,
            name: self.name,
            area_id: self.area,
            pos: self.body.body.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entities_have_full_health() {
        let bunny = Entity::bunny(EntityId(0));
        assert_eq!(bunny.creature.unwrap().health, 10);

        let fox = Entity::zombie_fox(EntityId(1));
        assert_eq!(fox.creature.unwrap().health, 1);
    }

    #[test]
    fn carrot_is_not_solid() {
        let carrot = Entity::carrot(EntityId(2));
        assert!(!carrot.body.body.solid);
    }

    #[test]
    fn walk_force_round_trips() {
        let mut entity = Entity::generic(EntityId(0));
        entity.set_walk_force(Vector2::new(1.0, 2.0));
        assert_eq!(entity.walk_force(), Vector2::new(1.0, 2.0));
    }
}
