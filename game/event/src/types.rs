use common::{AreaId, EntityId, EntitySummary, TileMapSummary, Vector2};
use strum_macros::EnumDiscriminants;

/// Every event that flows through the bus, spanning timing signals from the game loop, commands
/// translated from keyboard input, and the observable state changes the world model and
/// simulation rules emit. Grounded in `infiniworld/events.py` and `infiniworld/models/events.py`,
/// with the `bunny/world.py` events folded in (`Health`, `Carrot`, `ShockWave`, `CreatureDied`).
#[derive(EnumDiscriminants, Clone, Debug)]
#[strum_discriminants(
    name(EventType),
    derive(Hash, Eq, PartialEq, Clone, Copy, Debug)
)]
#[non_exhaustive]
pub enum Event {
    // --- timing / loop ---
    /// The last event the loop processes before terminating.
    Quit,
    /// Periodic prompt for the external input source to poll devices and post KeyDown/KeyUp.
    ProcessInputs,
    /// Broadcast each render tick with the physics interpolation ratio in `[0,1]`.
    RenderFrame { ratio: f32 },
    /// Broadcast each physics tick.
    RunPhysics { timestep: f32 },
    PausePhysicsRequest { paused: bool },
    PhysicsPaused { paused: bool },

    // --- raw input, posted by the external input source ---
    KeyDown { key: i32 },
    KeyUp { key: i32 },

    // --- commands, posted by keyboard/player controllers ---
    StartGameCommand,
    StartMovingEastCommand,
    StartMovingNorthCommand,
    StartMovingWestCommand,
    StartMovingSouthCommand,
    StopMovingEastCommand,
    StopMovingNorthCommand,
    StopMovingWestCommand,
    StopMovingSouthCommand,
    FireCommand,
    CreateAreaCommand,
    CreateEntityCommand,
    ViewNextAreaCommand { offset: i32 },
    ControlNextEntityCommand { offset: i32 },
    MoveEntityToNextAreaCommand { offset: i32 },
    TogglePausePhysicsCommand,
    ScreenShotCommand,

    // --- world/entity lifecycle ---
    ViewArea { area_id: AreaId },
    ControlEntity { entity_id: EntityId },
    EntityCreated { entity_id: EntityId },
    DestroyEntityRequest { entity_id: EntityId },
    EntityDestroyed { entity_id: EntityId },
    MoveEntityRequest { entity_id: EntityId, force: Vector2 },
    EntityMoved { entity_id: EntityId, pos: Vector2 },
    EntityStopped { entity_id: EntityId },
    EntityEnteredArea { entity_summary: EntitySummary },
    EntityLeftArea { entity_id: EntityId, area_id: AreaId },
    AreaContentRequest { area_id: AreaId },
    AreaContentEvent {
        area_id: AreaId,
        entities: Vec<EntitySummary>,
        tilemap: TileMapSummary,
    },
    EntitySummaryRequest { entity_id: EntityId },
    EntitySummaryEvent { summary: EntitySummary },

    // --- combat ---
    AttackRequest { attacker: EntityId },
    Attack { attacker: EntityId, victim: EntityId },
    HealthRequest { entity_id: EntityId },
    Health { entity_id: EntityId, health: u32 },
    CreatureDied { entity_id: EntityId },
    ShockWave { entity_id: EntityId },
    Carrot { amount: u32 },

    // --- misc / HUD ---
    GameOver,
    StatusText { text: String },

    #[doc(hidden)]
    #[cfg(test)]
    DummyA,
    #[doc(hidden)]
    #[cfg(test)]
    DummyB,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        EventType::from(self)
    }

    /// Mirrors the source's per-event `to_log` flag: high-frequency timing/position events are
    /// excluded from the event trace log so it stays readable.
    pub fn should_log(&self) -> bool {
        !matches!(
            self,
            Event::ProcessInputs
                | Event::RenderFrame { .. }
                | Event::RunPhysics { .. }
                | Event::MoveEntityRequest { .. }
                | Event::EntityMoved { .. }
                | Event::EntityStopped { .. }
                | Event::StartMovingEastCommand
                | Event::StartMovingNorthCommand
                | Event::StartMovingWestCommand
                | Event::StartMovingSouthCommand
                | Event::StopMovingEastCommand
                | Event::StopMovingNorthCommand
                | Event::StopMovingWestCommand
                | Event::StopMovingSouthCommand
                | Event::KeyDown { .. }
                | Event::KeyUp { .. }
        )
    }
}
