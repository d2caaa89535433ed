//! Collision detection and response for axis-aligned geometry
//!
//! Champions are AABBs of side `PLAYER_SIZE` centred on their position;
//! walls and cover are AABBs. Response is a minimum-translation push-out
//! along a single axis.

use glam::Vec2;

use super::geometry::Rect;

/// Axis a push-out was resolved along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Result of pushing a box out of an obstacle
#[derive(Debug, Clone, Copy)]
pub struct PushOut {
    /// Corrected centre position
    pub position: Vec2,
    /// Axis the correction was applied on
    pub axis: Axis,
}

/// AABB of a square footprint centred on `center`
#[inline]
pub fn footprint(center: Vec2, size: f32) -> Rect {
    Rect::centered(center, size)
}

/// Minimum-translation push-out of a square box (half extent `half`) from
/// `obstacle`.
///
/// Compares the smaller horizontal overlap with the smaller vertical overlap
/// and resolves along the smaller one; ties resolve vertically. The box is
/// placed flush against the nearer obstacle edge on that axis. When both
/// edges are equally near (centres aligned on that axis) the box goes to the
/// side facing `interior`.
pub fn push_out(center: Vec2, half: f32, obstacle: &Rect, interior: Vec2) -> PushOut {
    let overlap_left = (center.x + half) - obstacle.left();
    let overlap_right = obstacle.right() - (center.x - half);
    let overlap_top = (center.y + half) - obstacle.top();
    let overlap_bottom = obstacle.bottom() - (center.y - half);

    let min_x = overlap_left.min(overlap_right);
    let min_y = overlap_top.min(overlap_bottom);

    let mut position = center;
    if min_x < min_y {
        let toward_left = if overlap_left == overlap_right {
            interior.x < center.x
        } else {
            overlap_left < overlap_right
        };
        position.x = if toward_left {
            obstacle.left() - half
        } else {
            obstacle.right() + half
        };
        PushOut {
            position,
            axis: Axis::X,
        }
    } else {
        let toward_top = if overlap_top == overlap_bottom {
            interior.y < center.y
        } else {
            overlap_top < overlap_bottom
        };
        position.y = if toward_top {
            obstacle.top() - half
        } else {
            obstacle.bottom() + half
        };
        PushOut {
            position,
            axis: Axis::Y,
        }
    }
}

/// Point-vs-champion hit test: inclusive, so a point exactly `radius` away hits
#[inline]
pub fn within_radius(point: Vec2, center: Vec2, radius: f32) -> bool {
    point.distance_squared(center) <= radius * radius
}

/// Displace `target` away from `source` by `distance` (no-op if they coincide)
pub fn knockback(target: Vec2, source: Vec2, distance: f32) -> Vec2 {
    target + (target - source).normalize_or_zero() * distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_out_resolves_smaller_axis() {
        // Box centred at (95, 150), half 10: overlaps the obstacle's left edge by 15
        let obstacle = Rect::new(90.0, 100.0, 100.0, 100.0);
        let result = push_out(Vec2::new(95.0, 150.0), 10.0, &obstacle, Vec2::ZERO);
        assert_eq!(result.axis, Axis::X);
        assert!((result.position.x - 80.0).abs() < 0.001);
        assert!((result.position.y - 150.0).abs() < 0.001);
    }

    #[test]
    fn test_push_out_vertical() {
        let obstacle = Rect::new(0.0, 100.0, 300.0, 50.0);
        // Just under the bottom edge
        let result = push_out(Vec2::new(150.0, 155.0), 10.0, &obstacle, Vec2::ZERO);
        assert_eq!(result.axis, Axis::Y);
        assert!((result.position.y - 160.0).abs() < 0.001);
        assert!(!footprint(result.position, 20.0).overlaps(&obstacle));
    }

    #[test]
    fn test_equal_overlap_resolves_vertically() {
        // Corner overlap of 5 on both axes
        let obstacle = Rect::new(100.0, 100.0, 50.0, 50.0);
        let result = push_out(Vec2::new(95.0, 95.0), 10.0, &obstacle, Vec2::ZERO);
        assert_eq!(result.axis, Axis::Y);
        assert!((result.position.y - 90.0).abs() < 0.001);
    }

    #[test]
    fn test_aligned_centres_push_toward_interior() {
        // Box exactly covering a 20-thick bottom wall band
        let wall = Rect::new(0.0, 580.0, 1000.0, 20.0);
        let result = push_out(Vec2::new(500.0, 590.0), 10.0, &wall, Vec2::new(500.0, 300.0));
        assert_eq!(result.axis, Axis::Y);
        assert!((result.position.y - 570.0).abs() < 0.001);
    }

    #[test]
    fn test_within_radius_is_inclusive() {
        assert!(within_radius(Vec2::new(20.0, 0.0), Vec2::ZERO, 20.0));
        assert!(!within_radius(Vec2::new(20.1, 0.0), Vec2::ZERO, 20.0));
    }

    #[test]
    fn test_knockback_moves_away() {
        let moved = knockback(Vec2::new(10.0, 0.0), Vec2::ZERO, 150.0);
        assert!((moved.x - 160.0).abs() < 0.001);
        assert_eq!(knockback(Vec2::ONE, Vec2::ONE, 50.0), Vec2::ONE);
    }
}
