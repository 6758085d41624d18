use std::cell::RefCell;
use std::rc::Rc;

use common::{AreaId, EntityId, InnerSpace, MetricSpace, Rng, SmallRng, Vector2, Zero};
use event::{Event, EventBus, EventType, Subscriber};
use world::{EntityKind, EntityFactory, World};

use crate::input::PlayerController;

/// Every creature shares this damage-immunity window after being hit, regardless of kind. Ground
/// truth: `CreatureModel.DAMAGE_COOLDOWN`, never overridden by either `BunnyModel` or
/// `ZombieFoxModel`.
const DAMAGE_COOLDOWN: f32 = 0.5;
/// Ground truth: `BunnyModel.ATTACK_COOLDOWN`.
const BUNNY_ATTACK_COOLDOWN: f32 = 0.3;
/// Ground truth: `CreatureModel.ATTACK_COOLDOWN`, inherited unmodified by `ZombieFoxModel`.
const FOX_ATTACK_COOLDOWN: f32 = 0.5;
const FOX_PERCEPTION_RADIUS: f32 = 4.0;
/// `(fox_radius + bunny_radius) * 1.1`. Ground truth: `ZombieFoxModel.ATTACK_RADIUS`.
const FOX_ATTACK_RADIUS: f32 = (0.5 + 0.3) * 1.1;
const FOX_CHANGE_DIRECTION_COOLDOWN: f32 = 2.0;

const SHOCKWAVE_RADIUS: f32 = 8.0;
const SHOCKWAVE_BASE: f32 = 60.0;
const SHOCKWAVE_IMPULSE_MAX: f32 = 20.0;
const SHOCKWAVE_ATTACK_THRESHOLD: f32 = SHOCKWAVE_IMPULSE_MAX * 0.6;

/// Creates entities into an area on a timer while `active`, going permanently inactive once the
/// game is over. Ground truth: `bunny/world.py::SpawnerModel`.
pub struct Spawner {
    area: AreaId,
    coords: Vec<(i32, i32)>,
    factory: EntityFactory,
    period: f32,
    timer: f32,
    active: bool,
}

impl Spawner {
    pub fn new(area: AreaId, coords: Vec<(i32, i32)>, factory: EntityFactory, period: f32) -> Self {
        Self {
            area,
            coords,
            factory,
            period,
            timer: 0.0,
            active: true,
        }
    }
}

/// Holds the `World` and everything that animates it: creature AI, the shockwave attack, carrot
/// pickup, spawners, and forwarding of the lifecycle/query requests the world itself can't answer
/// without kind-specific rules (`AttackRequest` needs to know which entity is a bunny). Ground
/// truth: `bunny/world.py` (`BunnyModel`/`ZombieFoxModel`/`CarrotModel`/`SpawnerModel`) plus the
/// forwarding handlers of `infiniworld/models/world.py::WorldModel`.
pub struct Simulation {
    bus: Rc<EventBus>,
    world: RefCell<World>,
    player: Rc<PlayerController>,
    spawners: RefCell<Vec<Spawner>>,
    rng: RefCell<SmallRng>,
}

impl Simulation {
    pub fn new(
        bus: Rc<EventBus>,
        world: World,
        player: Rc<PlayerController>,
        spawners: Vec<Spawner>,
        rng: SmallRng,
    ) -> Rc<Self> {
        Rc::new(Self {
            bus,
            world: RefCell::new(world),
            player,
            spawners: RefCell::new(spawners),
            rng: RefCell::new(rng),
        })
    }

    pub fn world(&self) -> std::cell::Ref<'_, World> {
        self.world.borrow()
    }

    pub fn world_mut(&self) -> std::cell::RefMut<'_, World> {
        self.world.borrow_mut()
    }

    /// One `RunPhysics` tick: ages entities, decays cooldowns, runs creature AI, steps every
    /// area's physics, reacts to the collisions that physics turned up, then runs spawners.
    /// Ground truth: the union of `EntityModel.onRunPhysicsEvent`, `AreaModel.onRunPhysicsEvent`
    /// and `SpawnerModel.onRunPhysicsEvent`, given one coherent order since this engine has a
    /// single rules subscriber rather than one per entity.
    fn tick(&self, timestep: f32) {
        {
            let mut world = self.world.borrow_mut();
            world.age_entities(timestep);

            let mut ids: Vec<EntityId> = world.entities().map(|e| e.id).collect();
            ids.sort();

            for id in &ids {
                if let Some(entity) = world.entity_mut(*id) {
                    if entity.area.is_none() {
                        continue;
                    }
                    if let Some(creature) = entity.creature.as_mut() {
                        creature.damage_cooldown = (creature.damage_cooldown - timestep).max(0.0);
                        creature.attack_cooldown = (creature.attack_cooldown - timestep).max(0.0);
                    }
                    if let EntityKind::ZombieFox { change_direction_cooldown } = &mut entity.kind {
                        *change_direction_cooldown = (*change_direction_cooldown - timestep).max(0.0);
                    }
                }
            }

            let mut rng = self.rng.borrow_mut();
            for id in &ids {
                let (in_area, is_fox) = match world.entity(*id) {
                    Some(e) => (e.area.is_some(), matches!(e.kind, EntityKind::ZombieFox { .. })),
                    None => continue,
                };
                if in_area && is_fox {
                    self.fox_ai(&mut world, *id, &mut rng);
                }
            }
        }

        let area_ids = self.world.borrow().area_ids();
        for area_id in area_ids {
            let reactions = {
                let mut world = self.world.borrow_mut();
                world.step_area_physics(area_id, timestep, &self.bus).unwrap_or_default()
            };
            for (collider_id, collidee_id) in reactions {
                self.react_to_collision(collider_id, collidee_id);
            }
        }

        self.tick_spawners(timestep);
    }

    /// Ground truth: `ZombieFoxModel.runAI`. Looks for the closest living bunny within
    /// perception; attacks if in range and off cooldown, otherwise closes the distance; failing
    /// to find one, wanders once its change-direction cooldown expires.
    fn fox_ai(&self, world: &mut World, fox_id: EntityId, rng: &mut SmallRng) {
        let (area_id, pos) = match world.entity(fox_id) {
            Some(e) => (e.area, e.body.body.pos),
            None => return,
        };
        let area_id = match area_id {
            Some(a) => a,
            None => return,
        };

        let mut candidates: Vec<EntityId> = match world.area(area_id) {
            Some(area) => area.entity_map.get_near(pos, FOX_PERCEPTION_RADIUS).into_iter().collect(),
            None => return,
        };
        candidates.sort();

        let mut closest: Option<(EntityId, f32, Vector2)> = None;
        for id in candidates.drain(..) {
            if id == fox_id {
                continue;
            }
            if let Some(candidate) = world.entity(id) {
                if candidate.exists && matches!(candidate.kind, EntityKind::Bunny { .. }) {
                    let dist = candidate.body.body.pos.distance(pos);
                    let better = match &closest {
                        Some((_, best, _)) => dist < *best,
                        None => true,
                    };
                    if better {
                        closest = Some((id, dist, candidate.body.body.pos));
                    }
                }
            }
        }

        if let Some((bunny_id, dist, bunny_pos)) = closest {
            let attack_ready = world
                .entity(fox_id)
                .and_then(|e| e.creature)
                .map(|c| c.attack_cooldown == 0.0)
                .unwrap_or(false);

            if dist <= FOX_ATTACK_RADIUS && attack_ready {
                if let Some(fox) = world.entity_mut(fox_id) {
                    if let Some(creature) = fox.creature.as_mut() {
                        creature.attack_cooldown = FOX_ATTACK_COOLDOWN;
                    }
                    fox.set_walk_force(Vector2::zero());
                }
                self.bus.post(Event::Attack {
                    attacker: fox_id,
                    victim: bunny_id,
                });
            } else {
                let direction = bunny_pos - pos;
                if direction != Vector2::zero() {
                    if let Some(fox) = world.entity_mut(fox_id) {
                        let strength = fox.walk_strength;
                        fox.set_walk_force(direction.normalize() * strength);
                    }
                }
            }
            return;
        }

        let change_direction_ready = match world.entity(fox_id).map(|e| &e.kind) {
            Some(EntityKind::ZombieFox { change_direction_cooldown }) => *change_direction_cooldown == 0.0,
            _ => false,
        };
        if !change_direction_ready {
            return;
        }

        let nominal = FOX_CHANGE_DIRECTION_COOLDOWN * (0.8 + 0.4 * rng.gen::<f32>());
        let angle = rng.gen::<f32>() * 2.0 * std::f32::consts::PI;
        let direction = Vector2::new(angle.cos(), angle.sin());

        if let Some(fox) = world.entity_mut(fox_id) {
            if let EntityKind::ZombieFox { change_direction_cooldown } = &mut fox.kind {
                *change_direction_cooldown = nominal;
            }
            let strength = fox.walk_strength;
            fox.set_walk_force(direction * strength);
        }
    }

    /// Ground truth: `CarrotModel.reactToCollision`; every other kind inherits
    /// `EntityModel.reactToCollision`'s no-op. Runs after the physics step that discovered the
    /// touch, per §4.3 step 8, and only if both participants still exist.
    fn react_to_collision(&self, collider_id: EntityId, collidee_id: EntityId) {
        let mut world = self.world.borrow_mut();
        let (collider_exists, collidee_exists, collider_is_bunny, collidee_is_carrot) = {
            let collider = world.entity(collider_id);
            let collidee = world.entity(collidee_id);
            match (collider, collidee) {
                (Some(c), Some(d)) => (
                    c.exists,
                    d.exists,
                    matches!(c.kind, EntityKind::Bunny { .. }),
                    matches!(d.kind, EntityKind::Carrot),
                ),
                _ => return,
            }
        };

        if !collider_exists || !collidee_exists || !collider_is_bunny || !collidee_is_carrot {
            return;
        }

        if let Some(carrot) = world.entity_mut(collidee_id) {
            carrot.exists = false;
        }
        self.bus.post(Event::DestroyEntityRequest { entity_id: collidee_id });

        if let Some(bunny) = world.entity_mut(collider_id) {
            if let EntityKind::Bunny { carrots } = &mut bunny.kind {
                *carrots += 1;
            }
        }
        let carrots = match world.entity(collider_id).map(|e| &e.kind) {
            Some(EntityKind::Bunny { carrots }) => *carrots,
            _ => 0,
        };
        self.bus.post(Event::Carrot { amount: carrots });
        change_health(&mut world, &self.bus, collider_id, 1);
        self.bus.post(Event::StatusText {
            text: "Om nom nom!".to_string(),
        });
    }

    /// Ground truth: `BunnyModel.onAttackRequest`.
    fn on_attack_request(&self, attacker: EntityId) {
        let mut world = self.world.borrow_mut();

        let (area_id, pos) = match world.entity(attacker) {
            Some(e) if matches!(e.kind, EntityKind::Bunny { .. }) => (e.area, e.body.body.pos),
            _ => return,
        };
        let area_id = match area_id {
            Some(a) => a,
            None => return,
        };

        let attack_cooldown = world.entity(attacker).and_then(|e| e.creature).map(|c| c.attack_cooldown);
        if attack_cooldown.unwrap_or(0.0) > 0.0 {
            self.bus.post(Event::StatusText {
                text: "Too soon!".to_string(),
            });
            return;
        }

        let carrots = match world.entity(attacker).map(|e| &e.kind) {
            Some(EntityKind::Bunny { carrots }) => *carrots,
            _ => 0,
        };
        if carrots == 0 {
            self.bus.post(Event::StatusText {
                text: "Not enough carrots!".to_string(),
            });
            return;
        }

        if let Some(bunny) = world.entity_mut(attacker) {
            if let Some(creature) = bunny.creature.as_mut() {
                creature.attack_cooldown = BUNNY_ATTACK_COOLDOWN;
            }
            if let EntityKind::Bunny { carrots } = &mut bunny.kind {
                *carrots -= 1;
            }
        }
        let carrots_left = match world.entity(attacker).map(|e| &e.kind) {
            Some(EntityKind::Bunny { carrots }) => *carrots,
            _ => 0,
        };

        self.bus.post(Event::StatusText {
            text: "Psy-wave!".to_string(),
        });
        self.bus.post(Event::ShockWave { entity_id: attacker });
        self.bus.post(Event::Carrot { amount: carrots_left });

        let mut targets: Vec<EntityId> = match world.area(area_id) {
            Some(area) => area.entity_map.get_near(pos, SHOCKWAVE_RADIUS).into_iter().collect(),
            None => return,
        };
        targets.sort();

        for id in targets.drain(..) {
            if id == attacker {
                continue;
            }
            let (exists, solid, target_pos, one_over_mass) = match world.entity(id) {
                Some(e) => (e.exists, e.body.body.solid, e.body.body.pos, e.body.body.one_over_mass),
                None => continue,
            };
            if !exists || !solid {
                continue;
            }

            let difference = target_pos - pos;
            let distance = difference.magnitude();
            // Coincident centers: no direction to push along, so no impulse is applied (a
            // degenerate case the literal source doesn't actually guard against, per §7).
            if distance == 0.0 {
                continue;
            }

            let magnitude = (SHOCKWAVE_BASE * one_over_mass / distance.sqrt()).min(SHOCKWAVE_IMPULSE_MAX);
            let impulse = difference.normalize() * magnitude;

            if let Some(target) = world.entity_mut(id) {
                target.body.body.vel += impulse;
            }

            if magnitude >= SHOCKWAVE_ATTACK_THRESHOLD {
                self.bus.post(Event::Attack { attacker, victim: id });
            }
        }
    }

    fn tick_spawners(&self, timestep: f32) {
        let mut spawners = self.spawners.borrow_mut();
        if spawners.iter().all(|s| !s.active || s.coords.is_empty()) {
            return;
        }

        let mut world = self.world.borrow_mut();
        let mut rng = self.rng.borrow_mut();

        for spawner in spawners.iter_mut() {
            if !spawner.active || spawner.coords.is_empty() {
                continue;
            }
            spawner.timer += timestep;
            let how_many = (spawner.timer / spawner.period).floor().max(0.0) as u32;
            spawner.timer %= spawner.period;

            for _ in 0..how_many {
                let idx = rng.gen_range(0, spawner.coords.len());
                let coord = spawner.coords[idx];
                let id = world.create_entity(spawner.factory, &self.bus);
                if let Some(entity) = world.entity_mut(id) {
                    entity.body.body.pos = Vector2::new(coord.0 as f32, coord.1 as f32);
                }
                let _ = world.move_entity_to_area(id, Some(spawner.area), &self.bus);
            }
        }
    }
}

/// Ground truth: `CreatureModel.setHealth`: clamps to `[0, max]`, posts `Health` only if the
/// clamped value actually changed, and on reaching zero tombstones the entity and posts
/// `CreatureDied` before `DestroyEntityRequest`.
fn set_health(world: &mut World, bus: &EventBus, id: EntityId, requested: i32) {
    let entity = match world.entity_mut(id) {
        Some(e) => e,
        None => return,
    };
    let creature = match entity.creature.as_mut() {
        Some(c) => c,
        None => return,
    };

    let clamped = requested.clamp(0, creature.max_health as i32) as u32;
    if clamped == creature.health {
        return;
    }
    creature.health = clamped;
    bus.post(Event::Health { entity_id: id, health: clamped });

    if clamped == 0 {
        entity.exists = false;
        bus.post(Event::CreatureDied { entity_id: id });
        bus.post(Event::DestroyEntityRequest { entity_id: id });
    }
}

/// Ground truth: `CreatureModel.changeHealth`.
fn change_health(world: &mut World, bus: &EventBus, id: EntityId, delta: i32) {
    let current = world.entity(id).and_then(|e| e.creature).map(|c| c.health as i32);
    if let Some(current) = current {
        set_health(world, bus, id, current + delta);
    }
}

impl Subscriber for Simulation {
    fn handled_types(&self) -> &'static [EventType] {
        &[
            EventType::RunPhysics,
            EventType::DestroyEntityRequest,
            EventType::AttackRequest,
            EventType::Attack,
            EventType::MoveEntityRequest,
            EventType::HealthRequest,
            EventType::AreaContentRequest,
            EventType::EntitySummaryRequest,
            EventType::GameOver,
            EventType::CreateAreaCommand,
            EventType::CreateEntityCommand,
            EventType::ViewNextAreaCommand,
            EventType::ControlNextEntityCommand,
            EventType::MoveEntityToNextAreaCommand,
        ]
    }

    fn handle(&self, event: &Event) {
        match event {
            Event::RunPhysics { timestep } => self.tick(*timestep),
            Event::DestroyEntityRequest { entity_id } => {
                let _ = self.world.borrow_mut().destroy_entity(*entity_id, &self.bus);
            }
            Event::AttackRequest { attacker } => self.on_attack_request(*attacker),
            Event::Attack { attacker: _, victim } => {
                let mut world = self.world.borrow_mut();
                let damage_ready = world
                    .entity(*victim)
                    .and_then(|e| e.creature)
                    .map(|c| c.damage_cooldown == 0.0)
                    .unwrap_or(false);
                if damage_ready {
                    if let Some(e) = world.entity_mut(*victim) {
                        if let Some(creature) = e.creature.as_mut() {
                            creature.damage_cooldown = DAMAGE_COOLDOWN;
                        }
                    }
                    change_health(&mut world, &self.bus, *victim, -1);
                }
            }
            Event::MoveEntityRequest { entity_id, force } => {
                if let Some(entity) = self.world.borrow_mut().entity_mut(*entity_id) {
                    let strength = entity.walk_strength;
                    entity.set_walk_force(*force * strength);
                }
            }
            Event::HealthRequest { entity_id } => {
                if let Some(health) = self.world.borrow().entity(*entity_id).and_then(|e| e.creature).map(|c| c.health) {
                    self.bus.post(Event::Health { entity_id: *entity_id, health });
                }
            }
            Event::AreaContentRequest { area_id } => {
                let world = self.world.borrow();
                if let Some(area) = world.area(*area_id) {
                    let entities = area
                        .entity_ids
                        .iter()
                        .filter_map(|id| world.entity(*id))
                        .map(|e| e.summary())
                        .collect();
                    self.bus.post(Event::AreaContentEvent {
                        area_id: *area_id,
                        entities,
                        tilemap: area.tiles.summary(),
                    });
                }
            }
            Event::EntitySummaryRequest { entity_id } => {
                if let Some(summary) = self.world.borrow().entity(*entity_id).map(|e| e.summary()) {
                    self.bus.post(Event::EntitySummaryEvent { summary });
                }
            }
            Event::GameOver => {
                for spawner in self.spawners.borrow_mut().iter_mut() {
                    spawner.active = false;
                }
            }
            Event::CreateAreaCommand => {
                self.world.borrow_mut().create_area();
            }
            Event::CreateEntityCommand => {
                self.world.borrow_mut().create_entity(world::Entity::generic, &self.bus);
            }
            Event::ViewNextAreaCommand { offset } => {
                let next = self.world.borrow().next_area(self.player.viewed_area(), *offset);
                if let Some(area_id) = next {
                    self.bus.post(Event::ViewArea { area_id });
                }
            }
            Event::ControlNextEntityCommand { offset } => {
                let next = self.world.borrow().next_entity(self.player.controlled_entity(), *offset);
                if let Some(entity_id) = next {
                    self.bus.post(Event::ControlEntity { entity_id });
                }
            }
            Event::MoveEntityToNextAreaCommand { offset } => {
                let entity_id = match self.player.controlled_entity() {
                    Some(id) => id,
                    None => return,
                };
                let world = self.world.borrow();
                let current_area = world.entity(entity_id).and_then(|e| e.area);
                let next_area = world.next_area(current_area, *offset);
                drop(world);
                let _ = self.world.borrow_mut().move_entity_to_area(entity_id, next_area, &self.bus);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SeedableRng;
    use world::Entity;

    fn new_simulation() -> (Rc<EventBus>, Rc<Simulation>, Rc<PlayerController>) {
        let bus = EventBus::new();
        let player = PlayerController::new(bus.clone());
        let world = World::new();
        let rng = SmallRng::seed_from_u64(0);
        let sim = Simulation::new(bus.clone(), world, player.clone(), Vec::new(), rng);
        (bus, sim, player)
    }

    fn place_area_with_bunny(sim: &Rc<Simulation>, bus: &Rc<EventBus>, pos: Vector2) -> (AreaId, EntityId) {
        let mut world = sim.world_mut();
        let area_id = world.create_area();
        let bunny_id = world.create_entity(Entity::bunny, bus);
        world.entity_mut(bunny_id).unwrap().body.body.pos = pos;
        world.move_entity_to_area(bunny_id, Some(area_id), bus).unwrap();
        (area_id, bunny_id)
    }

    #[test]
    fn carrot_pickup_heals_and_increments_counter() {
        let (bus, sim, _player) = new_simulation();
        let sim_dyn: Rc<dyn Subscriber> = sim.clone();
        bus.register(&sim_dyn).unwrap();

        let (area_id, bunny_id) = place_area_with_bunny(&sim, &bus, Vector2::new(0.0, 0.0));

        // Bunny is already at full health; push it down a little so the heal has an effect to
        // observe alongside the carrot counter.
        {
            let mut world = sim.world_mut();
            let bunny = world.entity_mut(bunny_id).unwrap();
            bunny.creature.as_mut().unwrap().health = 9;
        }

        let carrot_id = {
            let mut world = sim.world_mut();
            let id = world.create_entity(Entity::carrot, &bus);
            world.entity_mut(id).unwrap().body.body.pos = Vector2::new(0.4, 0.0);
            world.move_entity_to_area(id, Some(area_id), &bus).unwrap();
            id
        };

        sim.world_mut().entity_mut(bunny_id).unwrap().body.body.vel = Vector2::new(1.0, 0.0) * 50.0;

        bus.post(Event::RunPhysics { timestep: 1.0 / 20.0 });
        bus.pump();

        assert!(!sim.world().entity(carrot_id).map(|e| e.exists).unwrap_or(false));
        let bunny = sim.world();
        let bunny = bunny.entity(bunny_id).unwrap();
        assert_eq!(bunny.creature.unwrap().health, 10);
        assert!(matches!(bunny.kind, EntityKind::Bunny { carrots: 1 }));
    }

    #[test]
    fn fox_attack_request_is_refused_without_carrots() {
        let (bus, sim, _player) = new_simulation();
        let sim_dyn: Rc<dyn Subscriber> = sim.clone();
        bus.register(&sim_dyn).unwrap();

        let (_area, bunny_id) = place_area_with_bunny(&sim, &bus, Vector2::new(0.0, 0.0));

        struct Catcher(RefCell<Vec<Event>>);
        impl Subscriber for Catcher {
            fn handled_types(&self) -> &'static [EventType] {
                &[EventType::StatusText]
            }
            fn handle(&self, event: &Event) {
                self.0.borrow_mut().push(event.clone());
            }
        }
        let catcher = Rc::new(Catcher(RefCell::new(Vec::new())));
        let catcher_dyn: Rc<dyn Subscriber> = catcher.clone();
        bus.register(&catcher_dyn).unwrap();

        bus.post(Event::AttackRequest { attacker: bunny_id });
        bus.pump();

        let messages = catcher.0.borrow();
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], Event::StatusText { text } if text == "Not enough carrots!"));
    }

    #[test]
    fn shockwave_pushes_nearby_solid_entities_away() {
        let (bus, sim, _player) = new_simulation();
        let sim_dyn: Rc<dyn Subscriber> = sim.clone();
        bus.register(&sim_dyn).unwrap();

        let (area_id, bunny_id) = place_area_with_bunny(&sim, &bus, Vector2::new(0.0, 0.0));
        sim.world_mut().entity_mut(bunny_id).unwrap().kind = EntityKind::Bunny { carrots: 1 };

        let fox_id = {
            let mut world = sim.world_mut();
            let id = world.create_entity(Entity::zombie_fox, &bus);
            world.entity_mut(id).unwrap().body.body.pos = Vector2::new(1.0, 0.0);
            world.move_entity_to_area(id, Some(area_id), &bus).unwrap();
            id
        };

        bus.post(Event::AttackRequest { attacker: bunny_id });
        bus.pump();

        let world = sim.world();
        let fox = world.entity(fox_id).unwrap();
        assert!(fox.body.body.vel.x > 0.0, "shockwave should push the fox away from the bunny");
    }

    #[test]
    fn spawner_creates_entity_after_period_elapses() {
        let (bus, sim, _player) = new_simulation();
        let sim_dyn: Rc<dyn Subscriber> = sim.clone();
        bus.register(&sim_dyn).unwrap();

        let area_id = sim.world_mut().create_area();
        sim.spawners.borrow_mut().push(Spawner::new(
            area_id,
            vec![(0, 0)],
            Entity::zombie_fox,
            1.0,
        ));

        let before = sim.world().entities().count();
        bus.post(Event::RunPhysics { timestep: 0.5 });
        bus.pump();
        assert_eq!(sim.world().entities().count(), before);

        bus.post(Event::RunPhysics { timestep: 0.5 });
        bus.pump();
        assert_eq!(sim.world().entities().count(), before + 1);
    }

    #[test]
    fn spawner_goes_inactive_on_game_over() {
        let (bus, sim, _player) = new_simulation();
        let sim_dyn: Rc<dyn Subscriber> = sim.clone();
        bus.register(&sim_dyn).unwrap();

        let area_id = sim.world_mut().create_area();
        sim.spawners.borrow_mut().push(Spawner::new(
            area_id,
            vec![(0, 0)],
            Entity::zombie_fox,
            1.0,
        ));

        bus.post(Event::GameOver);
        bus.pump();

        let before = sim.world().entities().count();
        bus.post(Event::RunPhysics { timestep: 10.0 });
        bus.pump();
        assert_eq!(sim.world().entities().count(), before);
    }

    #[test]
    fn fox_attacks_bunny_in_range_and_bunny_loses_health_on_cooldown() {
        let (bus, sim, _player) = new_simulation();
        let sim_dyn: Rc<dyn Subscriber> = sim.clone();
        bus.register(&sim_dyn).unwrap();

        let (area_id, bunny_id) = place_area_with_bunny(&sim, &bus, Vector2::new(0.0, 0.0));
        let _fox_id = {
            let mut world = sim.world_mut();
            let id = world.create_entity(Entity::zombie_fox, &bus);
            world.entity_mut(id).unwrap().body.body.pos = Vector2::new(0.5, 0.0);
            world.move_entity_to_area(id, Some(area_id), &bus).unwrap();
            id
        };

        for _ in 0..20 {
            bus.post(Event::RunPhysics { timestep: 1.0 / 20.0 });
            bus.pump();
        }

        let world = sim.world();
        let bunny = world.entity(bunny_id).unwrap();
        assert!(bunny.creature.unwrap().health < 10, "bunny should have taken at least one hit");
    }

    #[test]
    fn entity_summary_request_replies_with_summary() {
        let (bus, sim, _player) = new_simulation();
        let sim_dyn: Rc<dyn Subscriber> = sim.clone();
        bus.register(&sim_dyn).unwrap();

        let (_area, bunny_id) = place_area_with_bunny(&sim, &bus, Vector2::new(1.0, 2.0));

        struct Catcher(RefCell<Option<Event>>);
        impl Subscriber for Catcher {
            fn handled_types(&self) -> &'static [EventType] {
                &[EventType::EntitySummaryEvent]
            }
            fn handle(&self, event: &Event) {
                *self.0.borrow_mut() = Some(event.clone());
            }
        }
        let catcher = Rc::new(Catcher(RefCell::new(None)));
        let catcher_dyn: Rc<dyn Subscriber> = catcher.clone();
        bus.register(&catcher_dyn).unwrap();

        bus.post(Event::EntitySummaryRequest { entity_id: bunny_id });
        bus.pump();

        let event = catcher.0.borrow();
        match event.as_ref().unwrap() {
            Event::EntitySummaryEvent { summary } => {
                assert_eq!(summary.entity_id, bunny_id);
                assert_eq!(summary.name, "Bunny");
            }
            _ => panic!("expected EntitySummaryEvent"),
        }
    }

    #[test]
    fn destroy_entity_request_removes_entity() {
        let (bus, sim, _player) = new_simulation();
        let sim_dyn: Rc<dyn Subscriber> = sim.clone();
        bus.register(&sim_dyn).unwrap();

        let (_area, bunny_id) = place_area_with_bunny(&sim, &bus, Vector2::new(0.0, 0.0));
        bus.post(Event::DestroyEntityRequest { entity_id: bunny_id });
        bus.pump();

        assert!(sim.world().entity(bunny_id).is_none());
    }
}
