//! Arena geometry: static walls, destructible cover and the queries the rest
//! of the simulation runs against them (movement resolution, projectile
//! impact, line of sight).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{footprint, push_out};
use super::geometry::{Rect, segment_intersects_rect};
use super::quadtree::SpatialIndex;
use crate::consts::*;
use crate::error::ConfigError;

/// Upper bound on sequential push-out passes in `resolve_player_move`
const MAX_RESOLVE_PASSES: usize = 4;

/// Named arena layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArenaLayout {
    #[default]
    Classic,
    Maze,
    Open,
}

impl ArenaLayout {
    pub const ALL: [ArenaLayout; 3] = [ArenaLayout::Classic, ArenaLayout::Maze, ArenaLayout::Open];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArenaLayout::Classic => "Classic",
            ArenaLayout::Maze => "Maze",
            ArenaLayout::Open => "Open",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(ArenaLayout::Classic),
            "maze" => Some(ArenaLayout::Maze),
            "open" => Some(ArenaLayout::Open),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Self::from_str(s).ok_or_else(|| ConfigError::UnknownLayout(s.to_string()))
    }

    /// Wall and cover rectangles for this layout
    pub fn descriptor(&self) -> LayoutDescriptor {
        let mut walls = outer_walls().to_vec();
        let cover = match self {
            ArenaLayout::Classic => vec![
                Rect::new(300.0, 200.0, 80.0, 80.0),
                Rect::new(620.0, 200.0, 80.0, 80.0),
                Rect::new(300.0, 320.0, 80.0, 80.0),
                Rect::new(620.0, 320.0, 80.0, 80.0),
                Rect::new(460.0, 260.0, 80.0, 80.0),
            ],
            ArenaLayout::Maze => {
                walls.extend([
                    Rect::new(200.0, 100.0, WALL_THICKNESS, 200.0),
                    Rect::new(400.0, 200.0, WALL_THICKNESS, 200.0),
                    Rect::new(600.0, 100.0, WALL_THICKNESS, 200.0),
                    Rect::new(800.0, 200.0, WALL_THICKNESS, 200.0),
                ]);
                vec![
                    Rect::new(150.0, 150.0, 60.0, 60.0),
                    Rect::new(350.0, 250.0, 60.0, 60.0),
                    Rect::new(550.0, 150.0, 60.0, 60.0),
                    Rect::new(750.0, 250.0, 60.0, 60.0),
                ]
            }
            ArenaLayout::Open => vec![
                Rect::new(200.0, 200.0, 100.0, 100.0),
                Rect::new(700.0, 200.0, 100.0, 100.0),
                Rect::new(450.0, 350.0, 100.0, 100.0),
            ],
        };
        LayoutDescriptor { walls, cover }
    }
}

fn outer_walls() -> [Rect; 4] {
    [
        Rect::new(0.0, 0.0, ARENA_WIDTH, WALL_THICKNESS),
        Rect::new(0.0, ARENA_HEIGHT - WALL_THICKNESS, ARENA_WIDTH, WALL_THICKNESS),
        Rect::new(0.0, 0.0, WALL_THICKNESS, ARENA_HEIGHT),
        Rect::new(ARENA_WIDTH - WALL_THICKNESS, 0.0, WALL_THICKNESS, ARENA_HEIGHT),
    ]
}

/// Raw geometry an arena is built from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub walls: Vec<Rect>,
    pub cover: Vec<Rect>,
}

/// A destructible cover piece
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cover {
    pub rect: Rect,
    pub health: f32,
    pub max_health: f32,
    pub destroyed: bool,
}

impl Cover {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            health: COVER_HEALTH,
            max_health: COVER_HEALTH,
            destroyed: false,
        }
    }

    /// Solid for collision and line of sight
    #[inline]
    pub fn is_live(&self) -> bool {
        self.health > 0.0
    }

    pub fn health_pct(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

/// Handle stored in the spatial index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Obstacle {
    Wall(usize),
    Cover(usize),
}

/// What a projectile hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Impact {
    Wall,
    /// Cover piece at `index`; `destroyed` is set on the hit that emptied it
    Cover { index: usize, destroyed: bool },
}

/// Read-only arena state for presentation
#[derive(Debug, Clone, Serialize)]
pub struct ArenaView {
    pub walls: Vec<Rect>,
    pub cover: Vec<CoverView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverView {
    pub rect: Rect,
    pub health_pct: f32,
    pub destroyed: bool,
}

/// The playing field
#[derive(Debug, Clone)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    layout: ArenaLayout,
    walls: Vec<Rect>,
    cover: Vec<Cover>,
    index: SpatialIndex<Obstacle>,
}

impl Arena {
    pub fn new(layout: ArenaLayout) -> Self {
        let mut arena = Self::from_descriptor(layout.descriptor());
        arena.layout = layout;
        arena
    }

    /// Build from explicit geometry (arena sized by the global constants)
    pub fn from_descriptor(descriptor: LayoutDescriptor) -> Self {
        let mut arena = Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            layout: ArenaLayout::default(),
            walls: descriptor.walls,
            cover: descriptor.cover.into_iter().map(Cover::new).collect(),
            index: SpatialIndex::new(Rect::new(0.0, 0.0, ARENA_WIDTH, ARENA_HEIGHT)),
        };
        arena.rebuild_index();
        arena
    }

    pub fn layout(&self) -> ArenaLayout {
        self.layout
    }

    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    /// Every cover piece, destroyed ones included
    pub fn cover(&self) -> &[Cover] {
        &self.cover
    }

    /// Clear and refill the spatial index from walls and live cover
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, wall) in self.walls.iter().enumerate() {
            self.index.insert(*wall, Obstacle::Wall(i));
        }
        for (i, cover) in self.cover.iter().enumerate() {
            if cover.is_live() {
                self.index.insert(cover.rect, Obstacle::Cover(i));
            }
        }
    }

    fn obstacle_rect(&self, obstacle: Obstacle) -> Rect {
        match obstacle {
            Obstacle::Wall(i) => self.walls[i],
            Obstacle::Cover(i) => self.cover[i].rect,
        }
    }

    /// Index candidates that might overlap `query`, in retrieval order
    pub fn candidates(&self, query: &Rect) -> Vec<Obstacle> {
        self.index.retrieve(query)
    }

    /// Walls followed by live cover
    pub fn solid_obstacles(&self) -> Vec<Rect> {
        self.walls
            .iter()
            .copied()
            .chain(self.cover.iter().filter(|c| c.is_live()).map(|c| c.rect))
            .collect()
    }

    /// Clamp a champion into the arena, then push it out of every solid
    /// obstacle it overlaps, one obstacle at a time in index order.
    pub fn resolve_player_move(&self, position: Vec2, size: f32) -> Vec2 {
        let half = size / 2.0;
        let interior = Vec2::new(self.width / 2.0, self.height / 2.0);
        let mut pos = crate::clamp_to_bounds(position, self.width, self.height, half);

        for _ in 0..MAX_RESOLVE_PASSES {
            let mut corrected = false;
            for obstacle in self.index.retrieve(&footprint(pos, size)) {
                let rect = self.obstacle_rect(obstacle);
                if footprint(pos, size).overlaps(&rect) {
                    pos = push_out(pos, half, &rect, interior).position;
                    corrected = true;
                }
            }
            if !corrected {
                break;
            }
        }
        pos
    }

    /// Test a projectile's AABB against walls and live cover.
    ///
    /// A cover hit subtracts `damage` from that cover; emptying it marks it
    /// destroyed and drops it from the index. Walls never take damage.
    pub fn check_projectile_impact(&mut self, position: Vec2, damage: f32) -> Option<Impact> {
        let bounds = footprint(position, PROJECTILE_SIZE);
        let mut hits: Vec<Obstacle> = self
            .index
            .retrieve(&bounds)
            .into_iter()
            .filter(|&o| bounds.overlaps(&self.obstacle_rect(o)))
            .collect();
        // Walls first, then cover in list order
        hits.sort();

        match hits.first().copied()? {
            Obstacle::Wall(_) => Some(Impact::Wall),
            Obstacle::Cover(index) => {
                let cover = &mut self.cover[index];
                cover.health -= damage;
                let destroyed = !cover.is_live();
                if destroyed {
                    cover.health = cover.health.max(0.0);
                    cover.destroyed = true;
                    log::debug!("Cover {} destroyed at {:?}", index, cover.rect.center());
                    self.rebuild_index();
                }
                Some(Impact::Cover { index, destroyed })
            }
        }
    }

    /// True if the segment `a`-`b` crosses no edge of any solid obstacle
    pub fn has_line_of_sight(&self, a: Vec2, b: Vec2) -> bool {
        let min = a.min(b) - Vec2::ONE;
        let max = a.max(b) + Vec2::ONE;
        let query = Rect::new(min.x, min.y, max.x - min.x, max.y - min.y);

        !self
            .index
            .retrieve(&query)
            .into_iter()
            .any(|o| segment_intersects_rect(a, b, &self.obstacle_rect(o)))
    }

    /// Live cover containing `point` (edges inclusive)
    pub fn cover_at(&self, point: Vec2) -> Option<&Cover> {
        self.cover
            .iter()
            .find(|c| c.is_live() && c.rect.contains_point(point))
    }

    /// Restore every cover piece to full health
    pub fn repair_all_cover(&mut self) {
        for cover in &mut self.cover {
            cover.health = cover.max_health;
            cover.destroyed = false;
        }
        self.rebuild_index();
        log::info!("Arena reset ({} cover pieces repaired)", self.cover.len());
    }

    /// Overwrite cover health from an authoritative list (by index)
    pub fn sync_cover_health(&mut self, health: &[f32]) {
        let mut changed = false;
        for (cover, &value) in self.cover.iter_mut().zip(health) {
            let value = value.clamp(0.0, cover.max_health);
            if cover.health != value {
                cover.health = value;
                cover.destroyed = value <= 0.0;
                changed = true;
            }
        }
        if changed {
            self.rebuild_index();
        }
    }

    pub fn view(&self) -> ArenaView {
        ArenaView {
            walls: self.walls.clone(),
            cover: self
                .cover
                .iter()
                .map(|c| CoverView {
                    rect: c.rect,
                    health_pct: c.health_pct(),
                    destroyed: c.destroyed,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn single_cover_arena() -> Arena {
        Arena::from_descriptor(LayoutDescriptor {
            walls: outer_walls().to_vec(),
            cover: vec![Rect::new(400.0, 250.0, 100.0, 100.0)],
        })
    }

    #[test]
    fn test_layout_names() {
        assert_eq!(ArenaLayout::from_str("MAZE"), Some(ArenaLayout::Maze));
        assert!(matches!(
            ArenaLayout::parse("volcano"),
            Err(ConfigError::UnknownLayout(_))
        ));
        for layout in ArenaLayout::ALL {
            assert_eq!(ArenaLayout::from_str(layout.as_str()), Some(layout));
        }
    }

    #[test]
    fn test_layout_geometry() {
        let classic = Arena::new(ArenaLayout::Classic);
        assert_eq!(classic.walls().len(), 4);
        assert_eq!(classic.cover().len(), 5);
        let maze = Arena::new(ArenaLayout::Maze);
        assert_eq!(maze.walls().len(), 8);
        assert_eq!(maze.cover().len(), 4);
        assert_eq!(Arena::new(ArenaLayout::Open).cover().len(), 3);
    }

    #[test]
    fn test_resolve_clamps_into_bounds() {
        let arena = single_cover_arena();
        let pos = arena.resolve_player_move(Vec2::new(-50.0, 700.0), PLAYER_SIZE);
        // Clamped, then pushed clear of the left and bottom walls
        assert!((pos.x - 30.0).abs() < 0.001);
        assert!((pos.y - 570.0).abs() < 0.001);
    }

    #[test]
    fn test_resolve_pushes_out_of_cover() {
        let arena = single_cover_arena();
        // 5 units into the cover's left edge
        let pos = arena.resolve_player_move(Vec2::new(395.0, 300.0), PLAYER_SIZE);
        assert!((pos.x - 390.0).abs() < 0.001);
        assert!((pos.y - 300.0).abs() < 0.001);
    }

    #[test]
    fn test_wall_blocks_without_damage() {
        let mut arena = single_cover_arena();
        let impact = arena.check_projectile_impact(Vec2::new(5.0, 300.0), 1000.0);
        assert_eq!(impact, Some(Impact::Wall));
        assert_eq!(arena.walls().len(), 4);
        assert!(arena.check_projectile_impact(Vec2::new(200.0, 300.0), 10.0).is_none());
    }

    #[test]
    fn test_cover_destroyed_at_zero_is_not_solid() {
        let mut arena = single_cover_arena();
        let inside = Vec2::new(402.0, 300.0);

        assert_eq!(
            arena.check_projectile_impact(inside, 25.0),
            Some(Impact::Cover { index: 0, destroyed: false })
        );
        assert!((arena.cover()[0].health_pct() - 0.5).abs() < 0.001);
        assert_eq!(
            arena.check_projectile_impact(inside, 25.0),
            Some(Impact::Cover { index: 0, destroyed: true })
        );

        let cover = arena.cover()[0].clone();
        assert_eq!(cover.health, 0.0);
        assert!(cover.destroyed);
        // Still listed, but not solid
        assert_eq!(arena.cover().len(), 1);
        assert!(arena.check_projectile_impact(inside, 25.0).is_none());
        assert!(!arena.candidates(&cover.rect).contains(&Obstacle::Cover(0)));
        assert!(arena.cover_at(Vec2::new(450.0, 300.0)).is_none());
        assert!(arena.has_line_of_sight(Vec2::new(300.0, 300.0), Vec2::new(600.0, 300.0)));
        let moved = arena.resolve_player_move(Vec2::new(450.0, 300.0), PLAYER_SIZE);
        assert_eq!(moved, Vec2::new(450.0, 300.0));

        arena.repair_all_cover();
        assert!(arena.cover()[0].is_live());
        assert!(!arena.cover()[0].destroyed);
        assert!(!arena.has_line_of_sight(Vec2::new(300.0, 300.0), Vec2::new(600.0, 300.0)));
    }

    #[test]
    fn test_line_of_sight() {
        let arena = single_cover_arena();
        assert!(!arena.has_line_of_sight(Vec2::new(300.0, 300.0), Vec2::new(600.0, 300.0)));
        assert!(arena.has_line_of_sight(Vec2::new(300.0, 100.0), Vec2::new(600.0, 100.0)));
    }

    #[test]
    fn test_sync_cover_health() {
        let mut arena = Arena::new(ArenaLayout::Open);
        arena.sync_cover_health(&[50.0, 0.0, 10.0]);
        assert!(arena.cover()[1].destroyed);
        assert_eq!(arena.solid_obstacles().len(), 4 + 2);
        let view = arena.view();
        assert!((view.cover[2].health_pct - 0.2).abs() < 0.001);
    }

    proptest! {
        #[test]
        fn prop_resolved_position_is_clear_and_in_bounds(
            x in -100.0f32..1100.0,
            y in -100.0f32..700.0,
            open in any::<bool>(),
        ) {
            let layout = if open { ArenaLayout::Open } else { ArenaLayout::Classic };
            let arena = Arena::new(layout);
            let pos = arena.resolve_player_move(Vec2::new(x, y), PLAYER_SIZE);

            let half = PLAYER_SIZE / 2.0;
            prop_assert!(pos.x >= half && pos.x <= arena.width - half);
            prop_assert!(pos.y >= half && pos.y <= arena.height - half);
            let bounds = footprint(pos, PLAYER_SIZE);
            for rect in arena.solid_obstacles() {
                prop_assert!(!bounds.overlaps(&rect), "{:?} overlaps {:?}", pos, rect);
            }
        }
    }
}
