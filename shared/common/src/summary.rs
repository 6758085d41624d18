use std::collections::HashMap;

use crate::{AreaId, EntityId, TileNature, Vector2};

/// Payload of `EntityEnteredAreaEvent`/`AreaContentEvent`: `{entity_id, name, area_id, pos}` as
/// in `EntityModel.makeSummary`.
#[derive(Clone, Debug)]
pub struct EntitySummary {
    pub entity_id: EntityId,
    pub name: &'static str,
    pub area_id: Option<AreaId>,
    pub pos: Vector2,
}

/// Reply payload of `AreaContentRequest`: a coordinate -> (nature, height) mapping, as in
/// `TileMap.makeSummary`.
pub type TileMapSummary = HashMap<(i32, i32), (TileNature, u8)>;
