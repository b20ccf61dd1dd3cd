use sketch_types::{PlayerId, RoomId, Stroke, StrokePoint};

use crate::SessionError;

pub const MAX_POINTS_PER_STROKE: usize = 4096;
/// Points the canvas may hold before the drawer has to clear it. The round
/// transition clears it as well.
pub const MAX_POINTS_PER_CANVAS: usize = 65_536;

/// Reject batches a renderer could not draw.
pub fn validate_points(points: &[StrokePoint]) -> Result<(), SessionError> {
    if points.is_empty() {
        return Err(SessionError::InvalidStroke("no points".to_string()));
    }
    if points.len() > MAX_POINTS_PER_STROKE {
        return Err(SessionError::InvalidStroke(format!(
            "more than {} points in one batch",
            MAX_POINTS_PER_STROKE
        )));
    }
    for (index, point) in points.iter().enumerate() {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(SessionError::InvalidStroke(format!(
                "point {} has a non-finite coordinate",
                index
            )));
        }
        if !point.stroke_width.is_finite() || point.stroke_width < 0.0 {
            return Err(SessionError::InvalidStroke(format!(
                "point {} has an invalid width",
                index
            )));
        }
        if point.color.trim().is_empty() {
            return Err(SessionError::InvalidStroke(format!(
                "point {} has no color",
                index
            )));
        }
    }
    Ok(())
}

/// Append-only record of the strokes accepted for the current round.
/// Sequence numbers keep increasing across clears.
#[derive(Debug, Default, Clone)]
pub struct StrokeLog {
    strokes: Vec<Stroke>,
    point_count: usize,
    next_seq: u32,
}

impl StrokeLog {
    /// Refuse a batch that would push the canvas past its point budget.
    pub fn check_capacity(&self, incoming: usize) -> Result<(), SessionError> {
        if self.point_count + incoming > MAX_POINTS_PER_CANVAS {
            return Err(SessionError::InvalidStroke(format!(
                "canvas is full ({} points), clear it first",
                MAX_POINTS_PER_CANVAS
            )));
        }
        Ok(())
    }

    pub fn append(&mut self, room_id: RoomId, player_id: PlayerId, points: Vec<StrokePoint>) -> Stroke {
        let stroke = Stroke {
            seq: self.next_seq,
            room_id,
            player_id,
            points,
        };
        self.next_seq += 1;
        self.point_count += stroke.points.len();
        self.strokes.push(stroke.clone());
        stroke
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.point_count = 0;
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

/// A single canvas instruction. Every op carries its own pen so a color or
/// width change inside an open path renders the same everywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOp {
    MoveTo { x: f64, y: f64, color: String, width: f64 },
    LineTo { x: f64, y: f64, color: String, width: f64 },
}

/// Turn an ordered stroke log into canvas instructions. A path opens on the
/// first point and on every point flagged `starts_new_stroke`; all other
/// points extend the open path, including across batch boundaries.
pub fn replay(strokes: &[Stroke]) -> Vec<PathOp> {
    let mut ops = Vec::new();
    let mut path_open = false;

    for point in strokes.iter().flat_map(|stroke| stroke.points.iter()) {
        if point.starts_new_stroke || !path_open {
            ops.push(PathOp::MoveTo {
                x: point.x,
                y: point.y,
                color: point.color.clone(),
                width: point.stroke_width,
            });
            path_open = true;
        } else {
            ops.push(PathOp::LineTo {
                x: point.x,
                y: point.y,
                color: point.color.clone(),
                width: point.stroke_width,
            });
        }
    }

    ops
}
