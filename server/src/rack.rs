//! Racking and spotting.

use crate::ball::{BallId, BallSet};
use crate::table::{Rect, Table};
use rand::seq::SliceRandom;
use rand::Rng;
use tenball_shared::vec2::{distance, vec2, Vec2};

/// Center-to-center spacing of racked balls
pub const RACK_GAP: f64 = crate::table::BALL_DIAMETER + 0.5;
/// Per-axis jitter applied to every racked ball
pub const RACK_JITTER: f64 = 0.15;

/// Search resolution when looking for a free spot
const SPOT_STEP: f64 = 0.5;

const APEX_SLOT: usize = 0;
const TEN_SLOT: usize = 4;
const BACK_CORNER_SLOTS: [usize; 2] = [6, 9];
const OPEN_SLOTS: [usize; 6] = [1, 2, 3, 5, 7, 8];

/// The ten rack slots, row by row from the apex toward the foot rail.
pub fn rack_slots(apex: Vec2) -> [Vec2; 10] {
    let row_step = RACK_GAP * (3.0_f64.sqrt() / 2.0);
    let mut slots = [Vec2::ZERO; 10];
    let mut i = 0;
    for row in 0..4 {
        for k in 0..=row {
            slots[i] = vec2(
                apex.x + row as f64 * row_step,
                apex.y + (k as f64 - row as f64 / 2.0) * RACK_GAP,
            );
            i += 1;
        }
    }
    slots
}

/// Ten-ball rack: 1 on the apex over the foot spot, 10 in the middle of the
/// third row, 2 and 3 on the back corners, 4 through 9 anywhere else. Cue ball
/// waits at the default kitchen position.
pub fn rack_layout(table: &Table, rng: &mut impl Rng) -> Vec<(BallId, Vec2)> {
    let slots = rack_slots(table.foot_spot);

    let mut corners = [BallId(2), BallId(3)];
    corners.shuffle(rng);
    let mut rest: Vec<BallId> = (4..=9).map(BallId).collect();
    rest.shuffle(rng);

    let mut placed = vec![(BallId(1), APEX_SLOT), (BallId::TEN, TEN_SLOT)];
    placed.extend(corners.iter().copied().zip(BACK_CORNER_SLOTS));
    placed.extend(rest.into_iter().zip(OPEN_SLOTS));

    let mut layout = Vec::with_capacity(placed.len() + 1);
    layout.push((BallId::CUE, table.default_cue_position));
    for (ball, slot) in placed {
        let jitter = vec2(
            rng.gen_range(-RACK_JITTER..=RACK_JITTER),
            rng.gen_range(-RACK_JITTER..=RACK_JITTER),
        );
        layout.push((ball, slots[slot] + jitter));
    }
    layout
}

fn is_clear(balls: &BallSet, p: Vec2, ignore: BallId, diameter: f64) -> bool {
    balls
        .active()
        .filter(|b| b.id != ignore)
        .all(|b| distance(b.position, p) >= diameter)
}

/// Nearest point to `preferred` on its horizontal line, searched first in
/// `direction` (+1 or -1 along x) then the other way, that is inside
/// `region` and clear of every active ball except `ignore`.
pub fn free_spot_on_line(
    balls: &BallSet,
    region: Rect,
    preferred: Vec2,
    direction: f64,
    ignore: BallId,
    diameter: f64,
) -> Vec2 {
    let span = (region.right - region.left).max(0.0);
    let max_steps = (span / SPOT_STEP).ceil() as usize;
    for dir in [direction, -direction] {
        for step in 0..=max_steps {
            let p = vec2(preferred.x + dir * step as f64 * SPOT_STEP, preferred.y);
            if !region.contains(p) {
                break;
            }
            if is_clear(balls, p, ignore, diameter) {
                return p;
            }
        }
    }
    preferred
}

/// Where a spotted ball goes: the foot spot, or behind it toward the foot rail.
pub fn spot_position(balls: &BallSet, table: &Table, ball: BallId) -> Vec2 {
    free_spot_on_line(
        balls,
        table.playable(),
        table.foot_spot,
        1.0,
        ball,
        table.ball_diameter,
    )
}

/// Where a scratched cue ball comes back: the default kitchen position, or
/// the nearest free point toward the head rail.
pub fn cue_restore_position(balls: &BallSet, table: &Table) -> Vec2 {
    let playable = table.playable();
    let region = Rect {
        right: table.kitchen.right.min(playable.right),
        ..playable
    };
    free_spot_on_line(
        balls,
        region,
        table.default_cue_position,
        -1.0,
        BallId::CUE,
        table.ball_diameter,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn position_of(layout: &[(BallId, Vec2)], id: BallId) -> Vec2 {
        layout.iter().find(|(b, _)| *b == id).unwrap().1
    }

    #[test]
    fn slots_form_a_triangle() {
        let slots = rack_slots(vec2(450.0, 150.0));
        assert_eq!(slots[0], vec2(450.0, 150.0));
        assert!((slots[4].y - 150.0).abs() < 1e-9);
        assert!(slots[6].y < slots[9].y);
        assert!((slots[6].x - slots[9].x).abs() < 1e-9);
        for i in 0..10 {
            for j in (i + 1)..10 {
                assert!(distance(slots[i], slots[j]) >= RACK_GAP - 1e-9);
            }
        }
    }

    #[test]
    fn rack_follows_ten_ball_order() {
        let table = Table::standard();
        let layout = rack_layout(&table, &mut test_rng());
        assert_eq!(layout.len(), 11);

        let slots = rack_slots(table.foot_spot);
        let near = |id: BallId, slot: usize| {
            distance(position_of(&layout, id), slots[slot]) <= RACK_JITTER * 2.0_f64.sqrt() + 1e-9
        };
        assert!(near(BallId(1), APEX_SLOT));
        assert!(near(BallId::TEN, TEN_SLOT));
        for id in [BallId(2), BallId(3)] {
            assert!(BACK_CORNER_SLOTS.iter().any(|&s| near(id, s)), "{} not on a corner", id);
        }
        for n in 4..=9 {
            assert!(OPEN_SLOTS.iter().any(|&s| near(BallId(n), s)));
        }
        assert_eq!(position_of(&layout, BallId::CUE), table.default_cue_position);
    }

    #[test]
    fn racked_balls_never_overlap() {
        let table = Table::standard();
        let mut rng = test_rng();
        for _ in 0..20 {
            let layout = rack_layout(&table, &mut rng);
            for (i, (_, a)) in layout.iter().enumerate() {
                for (_, b) in layout.iter().skip(i + 1) {
                    assert!(distance(*a, *b) > table.ball_diameter);
                }
            }
        }
    }

    #[test]
    fn same_seed_same_rack() {
        let table = Table::standard();
        let a = rack_layout(&table, &mut test_rng());
        let b = rack_layout(&table, &mut test_rng());
        assert_eq!(a, b);
    }

    #[test]
    fn spot_moves_behind_an_occupied_foot_spot() {
        let table = Table::standard();
        let balls = BallSet::from_layout(&[(BallId(4), table.foot_spot)]);
        let p = spot_position(&balls, &table, BallId::TEN);
        assert!((p.y - table.foot_spot.y).abs() < 1e-9);
        assert!(p.x >= table.foot_spot.x + table.ball_diameter);
        assert!(p.x < table.foot_spot.x + table.ball_diameter + 1.0);
    }

    #[test]
    fn spot_uses_foot_spot_when_free() {
        let table = Table::standard();
        let balls = BallSet::from_layout(&[(BallId::CUE, vec2(100.0, 150.0))]);
        assert_eq!(spot_position(&balls, &table, BallId::TEN), table.foot_spot);
    }

    #[test]
    fn cue_restore_avoids_blockers() {
        let table = Table::standard();
        let balls = BallSet::from_layout(&[(BallId(2), table.default_cue_position)]);
        let p = cue_restore_position(&balls, &table);
        assert!(p.x <= table.default_cue_position.x - table.ball_diameter);
        assert!(table.kitchen.contains(p));
    }
}
