use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{PlayerId, RoomId};

/// One sampled point of a drawing gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub stroke_width: f64,
    pub starts_new_stroke: bool,
}

/// A batch of points accepted from the drawer, numbered in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Stroke {
    pub seq: u32,
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub points: Vec<StrokePoint>,
}
