//! Static table geometry: felt bounds, pockets, kitchen and spots.
//!
//! Nothing here changes at runtime. A `Table` is built once per match and
//! shared by reference with the stepper, the predictor and the rules.

use tenball_shared::vec2::{distance, vec2, Vec2};

pub const TABLE_WIDTH: f64 = 600.0;
pub const TABLE_HEIGHT: f64 = 300.0;
pub const BALL_DIAMETER: f64 = 15.0;
pub const BALL_RADIUS: f64 = BALL_DIAMETER / 2.0;

pub const FELT_LEFT: f64 = 30.0;
pub const FELT_RIGHT: f64 = 570.77;
pub const FELT_TOP: f64 = 24.5;
pub const FELT_BOTTOM: f64 = 270.18;

/// Right edge of the kitchen (the head string)
pub const HEAD_STRING_X: f64 = 160.0;

pub const CORNER_MARGIN_FACTOR: f64 = 3.0;
pub const SIDE_MARGIN_FACTOR: f64 = 1.8;
pub const POCKET_DROP_FUDGE: f64 = BALL_RADIUS * 0.1;

/// Corner pocket centers sit this far outside the felt corner on each axis
const CORNER_POCKET_INSET: f64 = 10.0;
/// Side pocket centers sit this far outside the long rail
const SIDE_POCKET_INSET: f64 = 15.5;

/// Axis-aligned rectangle in table coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Shrink every edge by `inset`.
    pub fn inset(&self, inset: f64) -> Rect {
        Rect {
            left: self.left + inset,
            right: self.right - inset,
            top: self.top + inset,
            bottom: self.bottom - inset,
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.left, self.right, self.top, self.bottom]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PocketKind {
    Corner,
    Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PocketId {
    TopLeft,
    TopSide,
    TopRight,
    BottomLeft,
    BottomSide,
    BottomRight,
}

impl PocketId {
    pub const ALL: [PocketId; 6] = [
        PocketId::TopLeft,
        PocketId::TopSide,
        PocketId::TopRight,
        PocketId::BottomLeft,
        PocketId::BottomSide,
        PocketId::BottomRight,
    ];

    pub fn kind(self) -> PocketKind {
        match self {
            PocketId::TopSide | PocketId::BottomSide => PocketKind::Side,
            _ => PocketKind::Corner,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pocket {
    pub id: PocketId,
    pub center: Vec2,
    pub capture_margin: f64,
    pub kind: PocketKind,
}

impl Pocket {
    fn new(id: PocketId, center: Vec2) -> Self {
        let kind = id.kind();
        let factor = match kind {
            PocketKind::Corner => CORNER_MARGIN_FACTOR,
            PocketKind::Side => SIDE_MARGIN_FACTOR,
        };
        Self {
            id,
            center,
            capture_margin: BALL_DIAMETER * factor,
            kind,
        }
    }

    /// Distance from the center inside which a ball may drop.
    pub fn capture_radius(&self) -> f64 {
        self.capture_margin + POCKET_DROP_FUDGE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub width: f64,
    pub height: f64,
    pub ball_diameter: f64,
    pub felt: Rect,
    pub kitchen: Rect,
    pub foot_spot: Vec2,
    /// Where a scratched cue ball comes back to
    pub default_cue_position: Vec2,
    pub pockets: [Pocket; 6],
}

impl Default for Table {
    fn default() -> Self {
        Self::standard()
    }
}

impl Table {
    pub fn standard() -> Self {
        let felt = Rect {
            left: FELT_LEFT,
            right: FELT_RIGHT,
            top: FELT_TOP,
            bottom: FELT_BOTTOM,
        };
        let mid_x = (FELT_LEFT + FELT_RIGHT) / 2.0;
        let left = FELT_LEFT - CORNER_POCKET_INSET;
        let right = FELT_RIGHT + CORNER_POCKET_INSET;
        let top = FELT_TOP - CORNER_POCKET_INSET;
        let bottom = FELT_BOTTOM + CORNER_POCKET_INSET;

        Self {
            width: TABLE_WIDTH,
            height: TABLE_HEIGHT,
            ball_diameter: BALL_DIAMETER,
            felt,
            kitchen: Rect {
                left: FELT_LEFT,
                right: HEAD_STRING_X,
                top: FELT_TOP,
                bottom: FELT_BOTTOM,
            },
            foot_spot: vec2(450.0, 150.0),
            default_cue_position: vec2(100.0, 150.0),
            pockets: [
                Pocket::new(PocketId::TopLeft, vec2(left, top)),
                Pocket::new(PocketId::TopSide, vec2(mid_x, FELT_TOP - SIDE_POCKET_INSET)),
                Pocket::new(PocketId::TopRight, vec2(right, top)),
                Pocket::new(PocketId::BottomLeft, vec2(left, bottom)),
                Pocket::new(
                    PocketId::BottomSide,
                    vec2(mid_x, FELT_BOTTOM + SIDE_POCKET_INSET),
                ),
                Pocket::new(PocketId::BottomRight, vec2(right, bottom)),
            ],
        }
    }

    pub fn ball_radius(&self) -> f64 {
        self.ball_diameter / 2.0
    }

    pub fn pocket(&self, id: PocketId) -> &Pocket {
        &self.pockets[id.index()]
    }

    /// Region a ball center can occupy without touching a cushion.
    pub fn playable(&self) -> Rect {
        self.felt.inset(self.ball_radius())
    }

    /// Region a cue ball may be placed in during the break.
    pub fn kitchen_playable(&self) -> Rect {
        self.kitchen.inset(self.ball_radius())
    }

    /// Pocket whose capture radius contains `p`, ignoring approach direction.
    pub fn pocket_at(&self, p: Vec2) -> Option<PocketId> {
        self.pockets
            .iter()
            .find(|pocket| distance(p, pocket.center) < pocket.capture_radius())
            .map(|pocket| pocket.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pocket_order_matches_ids() {
        let table = Table::standard();
        for id in PocketId::ALL {
            assert_eq!(table.pocket(id).id, id);
        }
    }

    #[test]
    fn margins_follow_kind() {
        let table = Table::standard();
        let corner = table.pocket(PocketId::TopLeft);
        let side = table.pocket(PocketId::BottomSide);
        assert_eq!(corner.kind, PocketKind::Corner);
        assert_eq!(side.kind, PocketKind::Side);
        assert!((corner.capture_margin - 45.0).abs() < 1e-9);
        assert!((side.capture_margin - 27.0).abs() < 1e-9);
        assert!((side.capture_radius() - 27.75).abs() < 1e-9);
    }

    #[test]
    fn side_pockets_centered_on_long_rails() {
        let table = Table::standard();
        let top = table.pocket(PocketId::TopSide).center;
        let bottom = table.pocket(PocketId::BottomSide).center;
        assert!((top.x - 300.385).abs() < 1e-9);
        assert!((top.y - 9.0).abs() < 1e-9);
        assert!((bottom.y - 285.68).abs() < 1e-9);
    }

    #[test]
    fn spots_are_on_the_felt_and_clear_of_pockets() {
        let table = Table::standard();
        assert!(table.playable().contains(table.foot_spot));
        assert!(table.kitchen_playable().contains(table.default_cue_position));
        assert!(table.pocket_at(table.foot_spot).is_none());
        assert!(table.pocket_at(table.default_cue_position).is_none());
    }

    #[test]
    fn felt_corner_is_inside_corner_capture() {
        let table = Table::standard();
        let corner = vec2(FELT_LEFT + BALL_RADIUS, FELT_TOP + BALL_RADIUS);
        assert_eq!(table.pocket_at(corner), Some(PocketId::TopLeft));
    }
}
