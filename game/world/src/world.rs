use std::collections::HashMap;

use common::{AreaId, EntityId};
use event::{Event, EventBus};
use slog_scope::debug;

use crate::area::Area;
use crate::entity::{Entity, EntityFactory};
use crate::Error;

/// The unique, authoritative top-level representation of the game world: owns every entity and
/// area, and is the only thing allowed to create or destroy either. Ground truth:
/// `infiniworld/models/world.py::WorldModel`.
#[derive(Default)]
pub struct World {
    next_entity_id: u32,
    next_area_id: u32,
    entities: HashMap<EntityId, Entity>,
    areas: HashMap<AreaId, Area>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(&id)
    }

    /// Mutable access to an area, for world generation to install its tile map into before any
    /// entity is placed there.
    pub fn area_mut(&mut self, id: AreaId) -> Option<&mut Area> {
        self.areas.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Every currently-existing area's id, in ascending order — used by the rules layer to drive
    /// physics over every area once per tick without needing its own bookkeeping of which areas
    /// exist.
    pub fn area_ids(&self) -> Vec<AreaId> {
        let mut ids: Vec<AreaId> = self.areas.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn create_area(&mut self) -> AreaId {
        let id = AreaId(self.next_area_id);
        self.next_area_id += 1;
        self.areas.insert(id, Area::new(id));
        debug!("area created"; "area" => %id);
        id
    }

    /// Creates a new entity via `factory` (typically `Entity::bunny`, `Entity::zombie_fox`, ...),
    /// not yet placed in any area. Posts `EntityCreated`.
    pub fn create_entity(&mut self, factory: EntityFactory, bus: &EventBus) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        let entity = factory(id);
        self.entities.insert(id, entity);
        debug!("entity created"; "entity" => %id);
        bus.post(Event::EntityCreated { entity_id: id });
        id
    }

    /// Removes an entity from the world forever: takes it out of its area (if any) and out of
    /// `entities`. Posts `EntityDestroyed`. Ground truth: `WorldModel.destroyEntity`.
    pub fn destroy_entity(&mut self, id: EntityId, bus: &EventBus) -> Result<(), Error> {
        let entity = self.entities.remove(&id).ok_or(Error::EntityNotFound(id))?;
        if let Some(area_id) = entity.area {
            if let Some(area) = self.areas.get_mut(&area_id) {
                area.on_entity_removed(id, &self.entities);
            }
        }
        bus.post(Event::EntityDestroyed { entity_id: id });
        Ok(())
    }

    /// Moves `entity_id` into `area_id_new` (or out of every area if `None`). A no-op if already
    /// there. Ground truth: `WorldModel.moveEntityToArea`.
    pub fn move_entity_to_area(
        &mut self,
        entity_id: EntityId,
        area_id_new: Option<AreaId>,
        bus: &EventBus,
    ) -> Result<(), Error> {
        let area_id_old = self
            .entities
            .get(&entity_id)
            .ok_or(Error::EntityNotFound(entity_id))?
            .area;

        if area_id_old == area_id_new {
            return Ok(());
        }

        if let Some(old) = area_id_old {
            self.remove_entity_from_area(entity_id, old, bus)?;
        }
        if let Some(new) = area_id_new {
            self.add_entity_to_area(entity_id, new, bus)?;
        }
        debug!("entity moved to area"; "entity" => %entity_id, "area" => ?area_id_new);
        Ok(())
    }

    fn add_entity_to_area(
        &mut self,
        entity_id: EntityId,
        area_id: AreaId,
        bus: &EventBus,
    ) -> Result<(), Error> {
        let area = self.areas.get_mut(&area_id).ok_or(Error::AreaNotFound(area_id))?;
        if area.entity_ids.contains(&entity_id) {
            return Err(Error::AlreadyInArea(entity_id));
        }
        let entity = self
            .entities
            .get_mut(&entity_id)
            .ok_or(Error::EntityNotFound(entity_id))?;
        entity.area = Some(area_id);
        area.on_entity_added(entity);
        let friction = area
            .tiles
            .tiles
            .get(&crate::tile::tile_coord_at(entity.body.body.pos))
            .map(|t| t.material().friction)
            .unwrap_or(0.0);
        entity.set_friction(friction);

        bus.post(Event::EntityEnteredArea {
            entity_summary: entity.summary(),
        });
        Ok(())
    }

    fn remove_entity_from_area(
        &mut self,
        entity_id: EntityId,
        area_id: AreaId,
        bus: &EventBus,
    ) -> Result<(), Error> {
        let area = self.areas.get_mut(&area_id).ok_or(Error::AreaNotFound(area_id))?;
        if !area.entity_ids.contains(&entity_id) {
            return Err(Error::NotInArea(entity_id));
        }
        area.on_entity_removed(entity_id, &self.entities);
        if let Some(entity) = self.entities.get_mut(&entity_id) {
            entity.area = None;
        }
        bus.post(Event::EntityLeftArea { entity_id, area_id });
        Ok(())
    }

    /// Runs one physics step over every entity in `area_id`, posting `EntityMoved`/
    /// `EntityStopped`, and returns the reaction pairs collected (collider, collidee) for the
    /// caller (`simulation`) to dispatch creature-specific `reactToCollision` logic over. Ground
    /// truth: `AreaModel.runPhysics` plus the per-entity event posting it does inline.
    pub fn step_area_physics(
        &mut self,
        area_id: AreaId,
        timestep: f32,
        bus: &EventBus,
    ) -> Result<Vec<(EntityId, EntityId)>, Error> {
        let area = self.areas.get_mut(&area_id).ok_or(Error::AreaNotFound(area_id))?;
        let result = area.step_physics(timestep, &mut self.entities);

        for (entity_id, pos) in &result.moved {
            bus.post(Event::EntityMoved {
                entity_id: *entity_id,
                pos: *pos,
            });
        }
        for entity_id in &result.stopped {
            bus.post(Event::EntityStopped {
                entity_id: *entity_id,
            });
        }

        Ok(result.reactions)
    }

    /// Advances every entity's age and runs per-entity AI tick bookkeeping shared by every
    /// creature (cooldown decay); creature-specific AI itself lives in `simulation`, dispatched
    /// over `self.entities_mut()`. Ground truth: `EntityModel.onRunPhysicsEvent`'s `self._age +=
    /// timestep` (AI dispatch is `CreatureModel.runAI`, handled by the caller).
    pub fn age_entities(&mut self, timestep: f32) {
        for entity in self.entities.values_mut() {
            if entity.area.is_some() {
                entity.age += timestep;
            }
        }
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// The previous/next (`offset = -1`/`1`) entity id in a stable ascending-id ordering. Ground
    /// truth: `WorldModel.nextEntity`/`nextThing` (the Python dict iteration order it relies on
    /// is itself incidental; a stable sort substitutes for it here deterministically).
    pub fn next_entity(&self, entity_id: Option<EntityId>, offset: i32) -> Option<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort();
        next_thing(&ids, entity_id, offset)
    }

    pub fn next_area(&self, area_id: Option<AreaId>, offset: i32) -> Option<AreaId> {
        let mut ids: Vec<AreaId> = self.areas.keys().copied().collect();
        ids.sort();
        next_thing(&ids, area_id, offset)
    }
}

fn next_thing<T: Copy + Eq>(things: &[T], thing: Option<T>, offset: i32) -> Option<T> {
    if things.is_empty() {
        return None;
    }
    let index = thing.and_then(|t| things.iter().position(|&x| x == t));
    match index {
        None => Some(things[0]),
        Some(i) => {
            let len = things.len() as i32;
            let new_index = (((i as i32 + offset) % len) + len) % len;
            Some(things[new_index as usize])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_thing_wraps_around() {
        let things = [1, 2, 3];
        assert_eq!(next_thing(&things, Some(3), 1), Some(1));
        assert_eq!(next_thing(&things, Some(1), -1), Some(3));
    }

    #[test]
    fn next_thing_missing_returns_first() {
        let things = [1, 2, 3];
        assert_eq!(next_thing(&things, Some(99), 1), Some(1));
        assert_eq!(next_thing(&things, None, -1), Some(1));
    }

    #[test]
    fn next_thing_empty_returns_none() {
        let things: [i32; 0] = [];
        assert_eq!(next_thing(&things, Some(1), 1), None);
    }

    #[test]
    fn create_and_destroy_entity() {
        let bus = EventBus::new();
        let mut world = World::new();
        let id = world.create_entity(Entity::generic, &bus);
        assert!(world.entity(id).is_some());
        world.destroy_entity(id, &bus).unwrap();
        assert!(world.entity(id).is_none());
    }

    #[test]
    fn move_entity_between_areas() {
        let bus = EventBus::new();
        let mut world = World::new();
        let area1 = world.create_area();
        let area2 = world.create_area();
        let id = world.create_entity(Entity::generic, &bus);

        world.move_entity_to_area(id, Some(area1), &bus).unwrap();
        assert!(world.area(area1).unwrap().entity_ids.contains(&id));

        world.move_entity_to_area(id, Some(area2), &bus).unwrap();
        assert!(!world.area(area1).unwrap().entity_ids.contains(&id));
        assert!(world.area(area2).unwrap().entity_ids.contains(&id));
    }
}
