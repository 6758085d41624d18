use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use common::{AreaId, EntityId, Vector2};
use event::{Event, EventBus, EventType, Subscriber};
use slog_scope::debug;

// Keycodes, lifted straight from the source's pygame-derived constant set
// (`infiniworld/controllers/keyboard.py`). Only the handful actually bound by a preset below.
const KEY_ESCAPE: i32 = 27;
const KEY_SPACE: i32 = 32;
const KEY_RETURN: i32 = 13;
const KEY_P: i32 = 112;
const KEY_M: i32 = 109;
const KEY_W: i32 = 119;
const KEY_A: i32 = 97;
const KEY_S: i32 = 115;
const KEY_D: i32 = 100;

/// Translates raw `KeyDown`/`KeyUp` events into game commands via a fixed keycode table. Ground
/// truth: `infiniworld/controllers/keyboard.py::KeyboardController`, with the four concrete
/// presets from `bunny/controllers/keyboard.py`.
pub struct KeyboardController {
    bus: Rc<EventBus>,
    key_down: HashMap<i32, Event>,
    key_up: HashMap<i32, Event>,
}

impl KeyboardController {
    fn new(bus: Rc<EventBus>, key_down: HashMap<i32, Event>, key_up: HashMap<i32, Event>) -> Rc<Self> {
        Rc::new(Self { bus, key_down, key_up })
    }

    /// Ground truth: `StartScreenKeyboardController`.
    pub fn start_screen(bus: Rc<EventBus>) -> Rc<Self> {
        let mut down = HashMap::new();
        down.insert(KEY_ESCAPE, Event::Quit);
        down.insert(KEY_RETURN, Event::StartGameCommand);
        down.insert(KEY_SPACE, Event::StartGameCommand);
        down.insert(KEY_M, Event::ScreenShotCommand);
        Self::new(bus, down, HashMap::new())
    }

    /// Ground truth: `GameScreenKeyboardController`.
    pub fn game_screen(bus: Rc<EventBus>) -> Rc<Self> {
        let mut down = HashMap::new();
        down.insert(KEY_ESCAPE, Event::Quit);
        down.insert(KEY_SPACE, Event::FireCommand);
        down.insert(KEY_M, Event::ScreenShotCommand);
        down.insert(KEY_P, Event::TogglePausePhysicsCommand);
        down.insert(KEY_D, Event::StartMovingEastCommand);
        down.insert(KEY_W, Event::StartMovingNorthCommand);
        down.insert(KEY_A, Event::StartMovingWestCommand);
        down.insert(KEY_S, Event::StartMovingSouthCommand);

        let mut up = HashMap::new();
        up.insert(KEY_D, Event::StopMovingEastCommand);
        up.insert(KEY_W, Event::StopMovingNorthCommand);
        up.insert(KEY_A, Event::StopMovingWestCommand);
        up.insert(KEY_S, Event::StopMovingSouthCommand);

        Self::new(bus, down, up)
    }

    /// Ground truth: `PauseScreenKeyboardController`.
    pub fn pause_screen(bus: Rc<EventBus>) -> Rc<Self> {
        let mut down = HashMap::new();
        down.insert(KEY_ESCAPE, Event::Quit);
        down.insert(KEY_SPACE, Event::TogglePausePhysicsCommand);
        down.insert(KEY_P, Event::TogglePausePhysicsCommand);
        down.insert(KEY_M, Event::ScreenShotCommand);
        Self::new(bus, down, HashMap::new())
    }

    /// Ground truth: `GameOverScreenKeyboardController`.
    pub fn game_over_screen(bus: Rc<EventBus>) -> Rc<Self> {
        let mut down = HashMap::new();
        down.insert(KEY_ESCAPE, Event::Quit);
        down.insert(KEY_M, Event::ScreenShotCommand);
        Self::new(bus, down, HashMap::new())
    }
}

impl Subscriber for KeyboardController {
    fn handled_types(&self) -> &'static [EventType] {
        &[EventType::KeyDown, EventType::KeyUp]
    }

    fn handle(&self, event: &Event) {
        match event {
            Event::KeyDown { key } => {
                if let Some(mapped) = self.key_down.get(key) {
                    self.bus.post(mapped.clone());
                }
            }
            Event::KeyUp { key } => {
                if let Some(mapped) = self.key_up.get(key) {
                    self.bus.post(mapped.clone());
                }
            }
            _ => {}
        }
    }
}

/// Middle man between translated input commands and the entity the player controls: knows which
/// of the world's many entities is "the player" and turns direction-flag and fire commands into
/// `MoveEntityRequest`/`AttackRequest`, normalizing diagonal movement. Ground truth:
/// `infiniworld/controllers/player.py::PlayerController`.
pub struct PlayerController {
    bus: Rc<EventBus>,
    entity_id: Cell<Option<EntityId>>,
    area_id: Cell<Option<AreaId>>,
    going_north: Cell<bool>,
    going_south: Cell<bool>,
    going_east: Cell<bool>,
    going_west: Cell<bool>,
}

const ONE_OVER_SQRT_2: f32 = std::f32::consts::FRAC_1_SQRT_2;

impl PlayerController {
    pub fn new(bus: Rc<EventBus>) -> Rc<Self> {
        Rc::new(Self {
            bus,
            entity_id: Cell::new(None),
            area_id: Cell::new(None),
            going_north: Cell::new(false),
            going_south: Cell::new(false),
            going_east: Cell::new(false),
            going_west: Cell::new(false),
        })
    }

    pub fn controlled_entity(&self) -> Option<EntityId> {
        self.entity_id.get()
    }

    pub fn viewed_area(&self) -> Option<AreaId> {
        self.area_id.get()
    }

    /// Recomputes the push direction from the four flags and posts `MoveEntityRequest`, unless no
    /// entity is currently controlled. Ground truth: `PlayerController.moveEntity`.
    fn move_entity(&self) {
        let entity_id = match self.entity_id.get() {
            Some(id) => id,
            None => return,
        };

        let mut x = (self.going_east.get() as i32 - self.going_west.get() as i32) as f32;
        let mut y = (self.going_north.get() as i32 - self.going_south.get() as i32) as f32;
        if x != 0.0 && y != 0.0 {
            x *= ONE_OVER_SQRT_2;
            y *= ONE_OVER_SQRT_2;
        }

        self.bus.post(Event::MoveEntityRequest {
            entity_id,
            force: Vector2::new(x, y),
        });
    }
}

impl Subscriber for PlayerController {
    fn handled_types(&self) -> &'static [EventType] {
        &[
            EventType::StartMovingEastCommand,
            EventType::StartMovingNorthCommand,
            EventType::StartMovingWestCommand,
            EventType::StartMovingSouthCommand,
            EventType::StopMovingEastCommand,
            EventType::StopMovingNorthCommand,
            EventType::StopMovingWestCommand,
            EventType::StopMovingSouthCommand,
            EventType::FireCommand,
            EventType::ViewArea,
            EventType::ControlEntity,
            EventType::CreatureDied,
        ]
    }

    fn handle(&self, event: &Event) {
        match event {
            Event::StartMovingEastCommand => {
                if !self.going_east.get() {
                    self.going_east.set(true);
                    self.move_entity();
                }
            }
            Event::StartMovingNorthCommand => {
                if !self.going_north.get() {
                    self.going_north.set(true);
                    self.move_entity();
                }
            }
            Event::StartMovingWestCommand => {
                if !self.going_west.get() {
                    self.going_west.set(true);
                    self.move_entity();
                }
            }
            Event::StartMovingSouthCommand => {
                if !self.going_south.get() {
                    self.going_south.set(true);
                    self.move_entity();
                }
            }
            Event::StopMovingEastCommand => {
                if self.going_east.get() {
                    self.going_east.set(false);
                    self.move_entity();
                }
            }
            Event::StopMovingNorthCommand => {
                if self.going_north.get() {
                    self.going_north.set(false);
                    self.move_entity();
                }
            }
            Event::StopMovingWestCommand => {
                if self.going_west.get() {
                    self.going_west.set(false);
                    self.move_entity();
                }
            }
            Event::StopMovingSouthCommand => {
                if self.going_south.get() {
                    self.going_south.set(false);
                    self.move_entity();
                }
            }
            Event::FireCommand => {
                if let Some(entity_id) = self.entity_id.get() {
                    self.bus.post(Event::AttackRequest { attacker: entity_id });
                }
            }
            Event::ViewArea { area_id } => {
                self.area_id.set(Some(*area_id));
                debug!("viewing area"; "area" => %area_id);
            }
            Event::ControlEntity { entity_id } => {
                self.entity_id.set(Some(*entity_id));
                debug!("controlling entity"; "entity" => %entity_id);
            }
            Event::CreatureDied { entity_id } => {
                if self.entity_id.get() == Some(*entity_id) {
                    self.bus.post(Event::GameOver);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_screen_maps_escape_to_quit() {
        let bus = EventBus::new();
        let controller = KeyboardController::game_screen(bus.clone());
        let controller_dyn: Rc<dyn Subscriber> = controller.clone();
        bus.register(&controller_dyn).unwrap();

        struct Catcher(std::cell::RefCell<Vec<Event>>);
        impl Subscriber for Catcher {
            fn handled_types(&self) -> &'static [EventType] {
                &[EventType::Quit]
            }
            fn handle(&self, event: &Event) {
                self.0.borrow_mut().push(event.clone());
            }
        }
        let catcher = Rc::new(Catcher(std::cell::RefCell::new(Vec::new())));
        let catcher_dyn: Rc<dyn Subscriber> = catcher.clone();
        bus.register(&catcher_dyn).unwrap();

        bus.post(Event::KeyDown { key: KEY_ESCAPE });
        bus.pump();

        assert!(matches!(catcher.0.borrow()[0], Event::Quit));
    }

    #[test]
    fn unmapped_key_is_ignored() {
        let bus = EventBus::new();
        let controller = KeyboardController::start_screen(bus.clone());
        let controller_dyn: Rc<dyn Subscriber> = controller.clone();
        bus.register(&controller_dyn).unwrap();

        // Never panics, never posts anything observable; W isn't bound on the start screen.
        bus.post(Event::KeyDown { key: KEY_W });
        bus.pump();
    }

    #[test]
    fn repeated_start_moving_does_not_repost() {
        let bus = EventBus::new();
        let player = PlayerController::new(bus.clone());
        player.entity_id.set(Some(EntityId(0)));
        let player_dyn: Rc<dyn Subscriber> = player.clone();
        bus.register(&player_dyn).unwrap();

        struct Counter(Cell<u32>);
        impl Subscriber for Counter {
            fn handled_types(&self) -> &'static [EventType] {
                &[EventType::MoveEntityRequest]
            }
            fn handle(&self, _: &Event) {
                self.0.set(self.0.get() + 1);
            }
        }
        let counter = Rc::new(Counter(Cell::new(0)));
        let counter_dyn: Rc<dyn Subscriber> = counter.clone();
        bus.register(&counter_dyn).unwrap();

        bus.post(Event::StartMovingEastCommand);
        bus.post(Event::StartMovingEastCommand);
        bus.pump();

        assert_eq!(counter.0.get(), 1);
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let bus = EventBus::new();
        let player = PlayerController::new(bus.clone());
        player.entity_id.set(Some(EntityId(0)));
        let player_dyn: Rc<dyn Subscriber> = player.clone();
        bus.register(&player_dyn).unwrap();

        struct Catcher(std::cell::RefCell<Option<Vector2>>);
        impl Subscriber for Catcher {
            fn handled_types(&self) -> &'static [EventType] {
                &[EventType::MoveEntityRequest]
            }
            fn handle(&self, event: &Event) {
                if let Event::MoveEntityRequest { force, .. } = event {
                    *self.0.borrow_mut() = Some(*force);
                }
            }
        }
        let catcher = Rc::new(Catcher(std::cell::RefCell::new(None)));
        let catcher_dyn: Rc<dyn Subscriber> = catcher.clone();
        bus.register(&catcher_dyn).unwrap();

        bus.post(Event::StartMovingNorthCommand);
        bus.post(Event::StartMovingEastCommand);
        bus.pump();

        let force = catcher.0.borrow().unwrap();
        assert!((force.x - ONE_OVER_SQRT_2).abs() < 1e-6);
        assert!((force.y - ONE_OVER_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn creature_died_posts_game_over_only_for_controlled_entity() {
        let bus = EventBus::new();
        let player = PlayerController::new(bus.clone());
        player.entity_id.set(Some(EntityId(5)));
        let player_dyn: Rc<dyn Subscriber> = player.clone();
        bus.register(&player_dyn).unwrap();

        struct Catcher(Cell<u32>);
        impl Subscriber for Catcher {
            fn handled_types(&self) -> &'static [EventType] {
                &[EventType::GameOver]
            }
            fn handle(&self, _: &Event) {
                self.0.set(self.0.get() + 1);
            }
        }
        let catcher = Rc::new(Catcher(Cell::new(0)));
        let catcher_dyn: Rc<dyn Subscriber> = catcher.clone();
        bus.register(&catcher_dyn).unwrap();

        bus.post(Event::CreatureDied { entity_id: EntityId(999) });
        bus.pump();
        assert_eq!(catcher.0.get(), 0);

        bus.post(Event::CreatureDied { entity_id: EntityId(5) });
        bus.pump();
        assert_eq!(catcher.0.get(), 1);
    }
}
