use std::collections::{HashMap, HashSet};

use common::{AreaId, EntityId, InnerSpace, MetricSpace, Vector2, Zero};
use physics::{circle_circle, elastic_collision_velocities, rect_circle, Collision, RectangularBody};

use crate::entity::Entity;
use crate::entitymap::EntityMap;
use crate::tile::{tile_coord_at, tile_coords_around, Tile, TileMap};

const COLLISION_ATTEMPTS: u32 = 5;
const VELOCITY_SNAP: f32 = 0.01;

/// A town, dungeon level, the overworld — anything with its own tile map and entity population.
/// Entities are *owned* by [`World`](crate::World), not by the `Area`: this only tracks
/// membership (`entity_ids`) and the spatial index over it, mirroring the source's own
/// distinction between `WorldModel.entities` (owning dict) and `AreaModel.entities` (a
/// `WeakValueDictionary`, a weak *view*). Ground truth: `infiniworld/models/area.py::AreaModel`.
#[derive(Clone, Debug)]
pub struct Area {
    pub id: AreaId,
    pub tiles: TileMap,
    pub entity_ids: HashSet<EntityId>,
    pub entity_map: EntityMap,
    pub biggest_entity_radius: f32,
}

impl Area {
    pub fn new(id: AreaId) -> Self {
        Self {
            id,
            tiles: TileMap::new(),
            entity_ids: HashSet::new(),
            entity_map: EntityMap::new(),
            biggest_entity_radius: 0.0,
        }
    }

    /// Recomputes `biggest_entity_radius` from scratch. Ground truth:
    /// `findBiggestEntityRadius`, called after every entity removal since the removed entity
    /// might have been the one holding the current maximum.
    fn recompute_biggest_entity_radius(&mut self, entities: &HashMap<EntityId, Entity>) {
        self.biggest_entity_radius = self
            .entity_ids
            .iter()
            .filter_map(|id| entities.get(id))
            .map(|e| e.body.radius)
            .fold(0.0_f32, f32::max);
    }

    pub(crate) fn on_entity_added(&mut self, entity: &Entity) {
        self.entity_ids.insert(entity.id);
        self.entity_map.add(entity.id, entity.body.body.pos);
        if entity.body.radius > self.biggest_entity_radius {
            self.biggest_entity_radius = entity.body.radius;
        }
    }

    pub(crate) fn on_entity_removed(&mut self, entity_id: EntityId, entities: &HashMap<EntityId, Entity>) {
        self.entity_ids.remove(&entity_id);
        self.entity_map.remove(entity_id);
        self.recompute_biggest_entity_radius(entities);
    }

    /// The friction coefficient under `pos`: 0 off the edge of the known map, matching
    /// `affectEntityWithTile`'s `KeyError -> friction = 0` fallback.
    fn friction_at(&self, pos: Vector2) -> f32 {
        let coord = tile_coord_at(pos);
        self.tiles
            .tiles
            .get(&coord)
            .map(|t: &Tile| t.material().friction)
            .unwrap_or(0.0)
    }

    fn solid_tile_coords_near(&self, pos: Vector2, radius: f32) -> HashSet<(i32, i32)> {
        let (x_min, x_max, y_min, y_max) = tile_coords_around(pos, radius);
        let mut coords = HashSet::new();
        for x in x_min..=x_max {
            for y in y_min..=y_max {
                if let Some(tile) = self.tiles.tiles.get(&(x, y)) {
                    if tile.is_solid() {
                        coords.insert((x, y));
                    }
                }
            }
        }
        coords
    }

    fn collisions_with_tiles(&self, collider: &Entity) -> Vec<TaggedCollision> {
        self.solid_tile_coords_near(collider.body.body.pos, collider.body.radius)
            .into_iter()
            .filter_map(|coord| {
                let tile = self.tiles.tiles[&coord];
                let tile_body = RectangularBody::new(
                    f32::INFINITY,
                    Vector2::new(coord.0 as f32, coord.1 as f32),
                    true,
                    tile.material(),
                    1.0,
                    1.0,
                );
                rect_circle(&tile_body, &collider.body).map(|collision| TaggedCollision {
                    collision,
                    collidee: None,
                    collidee_solid: true,
                    collidee_material: tile.material(),
                })
            })
            .collect()
    }

    fn collisions_with_entities(
        &self,
        collider: &Entity,
        entities: &HashMap<EntityId, Entity>,
    ) -> Vec<TaggedCollision> {
        let radius = collider.body.radius + self.biggest_entity_radius;
        self.entity_map
            .get_near(collider.body.body.pos, radius)
            .into_iter()
            .filter_map(|candidate_id| {
                if candidate_id == collider.id {
                    return None;
                }
                let candidate = entities.get(&candidate_id)?;
                if !candidate.exists {
                    return None;
                }
                circle_circle(&candidate.body, &collider.body).map(|collision| TaggedCollision {
                    collision,
                    collidee: Some(candidate_id),
                    collidee_solid: candidate.body.body.solid,
                    collidee_material: candidate.body.body.material,
                })
            })
            .collect()
    }

    /// One round of detect-and-correct-against-the-closest-solid-collision. Returns whether a
    /// solid collision was corrected, plus every non-solid collidee touched this round (for the
    /// caller's later reaction pass). Ground truth: `AreaModel.processCollisions`.
    fn process_collisions(
        &mut self,
        collider_id: EntityId,
        entities: &mut HashMap<EntityId, Entity>,
        reactions: &mut Vec<(EntityId, EntityId)>,
    ) -> bool {
        let collider = &entities[&collider_id];
        if !collider.body.body.solid {
            return false;
        }

        let mut collisions = self.collisions_with_tiles(collider);
        collisions.extend(self.collisions_with_entities(collider, entities));

        // Sorted descending by distance so the closest is popped (from the end) first, per the
        // source's own `sorted(..., reverse=True)` / `.pop()` pairing.
        collisions.sort_by(|a, b| {
            b.collision
                .distance
                .partial_cmp(&a.collision.distance)
                .unwrap()
        });

        let mut result = false;
        while let Some(tagged) = collisions.pop() {
            if let Some(collidee_id) = tagged.collidee {
                reactions.push((collider_id, collidee_id));
            }
            if tagged.collidee_solid {
                let collider = entities.get_mut(&collider_id).unwrap();
                collider.body.body.pos += tagged.collision.penetration;
                self.entity_map.mov(collider_id, collider.body.body.pos);

                if let Some(collidee_id) = tagged.collidee {
                    let normal = tagged.collision.penetration.normalize();
                    let (collider_entity, collidee_entity) =
                        two_mut(entities, collider_id, collidee_id);
                    let (v1, v2) = elastic_collision_velocities(
                        &collider_entity.body.body,
                        &collidee_entity.body.body,
                        normal,
                    );
                    collider_entity.body.body.vel = v1;
                    collidee_entity.body.body.vel = v2;
                } else {
                    // Colliding with an immovable tile: same formula with an infinite-mass
                    // stand-in collidee at rest.
                    let normal = tagged.collision.penetration.normalize();
                    let wall = physics::Body::new(
                        f32::INFINITY,
                        Vector2::zero(),
                        true,
                        tagged.collidee_material,
                    );
                    let collider = entities.get_mut(&collider_id).unwrap();
                    let (v1, _) = elastic_collision_velocities(&collider.body.body, &wall, normal);
                    collider.body.body.vel = v1;
                }

                result = true;
                break;
            }
        }

        let collider = entities.get_mut(&collider_id).unwrap();
        if collider.body.body.vel.magnitude() < VELOCITY_SNAP {
            collider.body.body.vel = Vector2::zero();
        }

        result
    }

    /// Integrates `entity_id` over `timestep`, subdividing into substeps when the tentative move
    /// would exceed its radius, then runs up to [`COLLISION_ATTEMPTS`] rounds of detect-correct.
    /// Returns `true` if the entity ended up stuck (moved back to its pre-integration position).
    /// Ground truth: `AreaModel.moveEntityByPhysics`.
    fn move_entity_by_physics(
        &mut self,
        entity_id: EntityId,
        timestep: f32,
        entities: &mut HashMap<EntityId, Entity>,
        reactions: &mut Vec<(EntityId, EntityId)>,
    ) -> bool {
        let (pos, vel, radius) = {
            let entity = &entities[&entity_id];
            (entity.body.body.pos, entity.body.body.vel, entity.body.radius)
        };
        let (new_pos, new_vel) = entities[&entity_id].body.body.integrate(timestep);

        if new_pos == pos && new_vel == vel {
            return false;
        }

        let distance = new_pos.distance(pos);
        if distance > radius {
            let iterations = (distance / radius).ceil() as u32;
            for _ in 0..iterations {
                let stuck =
                    self.move_entity_by_physics(entity_id, timestep / iterations as f32, entities, reactions);
                if stuck {
                    return true;
                }
            }
            return false;
        }

        let pos_before = pos;

        {
            let entity = entities.get_mut(&entity_id).unwrap();
            entity.body.body.pos = new_pos;
            entity.body.body.vel = new_vel;
        }
        self.entity_map.mov(entity_id, new_pos);

        let mut attempts = COLLISION_ATTEMPTS;
        let mut collided = true;
        while attempts > 0 && collided {
            collided = self.process_collisions(entity_id, entities, reactions);
            attempts -= 1;
        }

        if collided && attempts == 0 {
            let entity = entities.get_mut(&entity_id).unwrap();
            entity.body.body.pos = pos_before;
            entity.body.body.vel = Vector2::zero();
            self.entity_map.mov(entity_id, pos_before);
            return true;
        }

        false
    }

    /// Moves every existing entity in the area by `timestep`. Returns, per moved entity, whether
    /// it actually changed position this tick (callers post `EntityMoved`) and the reaction pairs
    /// collected along the way (collider, collidee), for a separate rules pass to react to.
    /// Ground truth: `AreaModel.runPhysics`.
    pub fn step_physics(
        &mut self,
        timestep: f32,
        entities: &mut HashMap<EntityId, Entity>,
    ) -> AreaStepResult {
        let mut moved = Vec::new();
        let mut stopped = Vec::new();
        let mut reactions = Vec::new();

        let ids: Vec<EntityId> = self.entity_ids.iter().copied().collect();
        for entity_id in ids {
            let exists = entities.get(&entity_id).map(|e| e.exists).unwrap_or(false);
            if !exists {
                continue;
            }

            let before = entities[&entity_id].body.body.pos;
            self.move_entity_by_physics(entity_id, timestep, entities, &mut reactions);
            let entity = entities.get_mut(&entity_id).unwrap();
            let after = entity.body.body.pos;

            if before != after {
                entity.is_moving = true;
                moved.push((entity_id, after));
                let friction = self.friction_at(after);
                entities.get_mut(&entity_id).unwrap().set_friction(friction);
            }

            let entity = entities.get_mut(&entity_id).unwrap();
            if entity.is_moving && entity.body.body.vel == Vector2::zero() {
                entity.is_moving = false;
                stopped.push(entity_id);
            }
        }

        AreaStepResult {
            moved,
            stopped,
            reactions,
        }
    }
}

struct TaggedCollision {
    collision: Collision,
    collidee: Option<EntityId>,
    collidee_solid: bool,
    collidee_material: common::Material,
}

/// Result of one `Area::step_physics` call, for the caller to turn into bus events and creature
/// reactions.
pub struct AreaStepResult {
    pub moved: Vec<(EntityId, Vector2)>,
    pub stopped: Vec<EntityId>,
    pub reactions: Vec<(EntityId, EntityId)>,
}

fn two_mut<'a>(
    map: &'a mut HashMap<EntityId, Entity>,
    a: EntityId,
    b: EntityId,
) -> (&'a mut Entity, &'a mut Entity) {
    assert_ne!(a, b, "cannot borrow the same entity twice");
    // SAFETY-free approach: split via `get_many_mut`-style manual juggling isn't available on
    // stable `HashMap`, so fetch both raw pointers after confirming distinctness, then
    // dereference. Both keys are known present and distinct, so the two mutable borrows never
    // alias.
    let ptr_a: *mut Entity = map.get_mut(&a).expect("collider must exist") as *mut _;
    let ptr_b: *mut Entity = map.get_mut(&b).expect("collidee must exist") as *mut _;
    unsafe { (&mut *ptr_a, &mut *ptr_b) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AreaId;

    #[test]
    fn entity_at_rest_does_not_move() {
        let mut area = Area::new(AreaId(0));
        let mut entities = HashMap::new();
        let mut e = Entity::generic(EntityId(0));
        e.body.body.pos = Vector2::new(0.0, 0.0);
        area.on_entity_added(&e);
        entities.insert(e.id, e);

        let result = area.step_physics(1.0 / 20.0, &mut entities);
        assert!(result.moved.is_empty());
        assert!(result.reactions.is_empty());
    }

    #[test]
    fn entity_bounces_off_solid_tile() {
        let mut area = Area::new(AreaId(0));
        area.tiles.tiles.insert(
            (1, 0),
            Tile::new(common::TileNature::Stone, 1),
        );

        let mut entities = HashMap::new();
        let mut e = Entity::generic(EntityId(0));
        e.body.body.pos = Vector2::new(0.3, 0.0);
        e.body.body.vel = Vector2::new(5.0, 0.0);
        area.on_entity_added(&e);
        entities.insert(e.id, e);

        for _ in 0..20 {
            area.step_physics(1.0 / 20.0, &mut entities);
        }

        // Must never have tunnelled past the solid tile's near edge.
        let pos = entities[&EntityId(0)].body.body.pos;
        assert!(pos.x < 0.5);
    }
}
