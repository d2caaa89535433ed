//! Quadrant tree over the arena bounds
//!
//! A derived, disposable broad-phase structure: the arena clears and refills it
//! whenever its solid geometry changes, so there is no removal primitive.
//! `retrieve` returns a superset of the stored rectangles overlapping the
//! query; false positives are fine, false negatives are not.

use super::geometry::Rect;

/// Objects a node holds before it tries to split
pub const DEFAULT_MAX_OBJECTS: usize = 10;
/// Deepest level a node may split to
pub const DEFAULT_MAX_LEVEL: u32 = 5;

#[derive(Debug, Clone)]
struct Node<T> {
    bounds: Rect,
    level: u32,
    objects: Vec<(Rect, T)>,
    /// Quadrants: 0 = top-right, 1 = top-left, 2 = bottom-left, 3 = bottom-right
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Copy> Node<T> {
    fn new(bounds: Rect, level: u32) -> Self {
        Self {
            bounds,
            level,
            objects: Vec::new(),
            children: None,
        }
    }

    fn split(&mut self) {
        let w = self.bounds.width / 2.0;
        let h = self.bounds.height / 2.0;
        let x = self.bounds.x;
        let y = self.bounds.y;
        let level = self.level + 1;

        self.children = Some(Box::new([
            Node::new(Rect::new(x + w, y, w, h), level),
            Node::new(Rect::new(x, y, w, h), level),
            Node::new(Rect::new(x, y + h, w, h), level),
            Node::new(Rect::new(x + w, y + h, w, h), level),
        ]));
    }

    /// Quadrant that fully contains `rect`, or None if it straddles a midline
    fn quadrant_of(&self, rect: &Rect) -> Option<usize> {
        let vertical_mid = self.bounds.x + self.bounds.width / 2.0;
        let horizontal_mid = self.bounds.y + self.bounds.height / 2.0;

        let top = rect.y < horizontal_mid && rect.bottom() < horizontal_mid;
        let bottom = rect.y > horizontal_mid;

        if rect.x < vertical_mid && rect.right() < vertical_mid {
            if top {
                return Some(1);
            } else if bottom {
                return Some(2);
            }
        } else if rect.x > vertical_mid {
            if top {
                return Some(0);
            } else if bottom {
                return Some(3);
            }
        }
        None
    }

    fn insert(&mut self, rect: Rect, item: T, max_objects: usize, max_level: u32) {
        let index = self.quadrant_of(&rect);
        if let (Some(children), Some(index)) = (self.children.as_mut(), index) {
            children[index].insert(rect, item, max_objects, max_level);
            return;
        }

        self.objects.push((rect, item));

        if self.objects.len() > max_objects && self.level < max_level {
            if self.children.is_none() {
                self.split();
            }

            // Hand down everything that fits a single quadrant; straddlers stay
            // here. Children take the objects as-is and split on their own
            // next insert.
            let objects = std::mem::take(&mut self.objects);
            for (rect, item) in objects {
                let index = self.quadrant_of(&rect);
                match (self.children.as_mut(), index) {
                    (Some(children), Some(index)) => children[index].objects.push((rect, item)),
                    _ => self.objects.push((rect, item)),
                }
            }
        }
    }

    fn retrieve(&self, query: &Rect, out: &mut Vec<T>) {
        out.extend(self.objects.iter().map(|&(_, item)| item));

        if let Some(children) = self.children.as_ref() {
            match self.quadrant_of(query) {
                Some(index) => children[index].retrieve(query, out),
                None => {
                    for child in children.iter() {
                        child.retrieve(query, out);
                    }
                }
            }
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map(|c| c.iter().map(Node::node_count).sum())
            .unwrap_or(0)
    }

    fn len(&self) -> usize {
        self.objects.len()
            + self
                .children
                .as_ref()
                .map(|c| c.iter().map(Node::len).sum())
                .unwrap_or(0)
    }
}

/// Hierarchical rectangle index keyed by a small copyable handle
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    root: Node<T>,
    max_objects: usize,
    max_level: u32,
}

impl<T: Copy> SpatialIndex<T> {
    pub fn new(bounds: Rect) -> Self {
        Self::with_limits(bounds, DEFAULT_MAX_OBJECTS, DEFAULT_MAX_LEVEL)
    }

    pub fn with_limits(bounds: Rect, max_objects: usize, max_level: u32) -> Self {
        Self {
            root: Node::new(bounds, 0),
            max_objects,
            max_level,
        }
    }

    /// Place a rectangle (with its handle) in the tree
    pub fn insert(&mut self, rect: Rect, item: T) {
        self.root.insert(rect, item, self.max_objects, self.max_level);
    }

    /// Handles of every stored rectangle that might overlap `query`
    pub fn retrieve(&self, query: &Rect) -> Vec<T> {
        let mut out = Vec::new();
        self.root.retrieve(query, &mut out);
        out
    }

    /// Drop all objects and children
    pub fn clear(&mut self) {
        self.root = Node::new(self.root.bounds, 0);
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total nodes in the tree (1 for an unsplit root; each split adds 4)
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arena_bounds() -> Rect {
        Rect::new(0.0, 0.0, 1000.0, 600.0)
    }

    #[test]
    fn test_empty_and_clear() {
        let mut index: SpatialIndex<usize> = SpatialIndex::new(arena_bounds());
        assert!(index.is_empty());
        index.insert(Rect::new(10.0, 10.0, 5.0, 5.0), 0);
        assert_eq!(index.len(), 1);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.node_count(), 1);
        assert!(index.retrieve(&arena_bounds()).is_empty());
    }

    #[test]
    fn test_eleventh_insert_splits_once() {
        // A row of unit rects well inside the top-left quadrant
        let mut index = SpatialIndex::with_limits(arena_bounds(), 10, 5);
        for i in 0..10 {
            index.insert(Rect::new(10.0 + i as f32 * 20.0, 10.0, 1.0, 1.0), i);
            assert_eq!(index.node_count(), 1);
        }
        index.insert(Rect::new(210.0, 10.0, 1.0, 1.0), 10);
        assert_eq!(index.node_count(), 5);
        assert_eq!(index.len(), 11);

        // The overfull child only splits on its own next insert
        index.insert(Rect::new(230.0, 10.0, 1.0, 1.0), 11);
        assert_eq!(index.node_count(), 9);
        assert_eq!(index.len(), 12);
        assert!(index.retrieve(&Rect::new(5.0, 5.0, 6.0, 6.0)).contains(&0));
    }

    #[test]
    fn test_straddler_stays_in_parent_and_is_found() {
        let mut index = SpatialIndex::with_limits(arena_bounds(), 1, 5);
        // Crosses the root's vertical midline at x = 500
        let straddler = Rect::new(490.0, 100.0, 20.0, 20.0);
        index.insert(straddler, 0);
        index.insert(Rect::new(10.0, 10.0, 5.0, 5.0), 1);
        index.insert(Rect::new(900.0, 500.0, 5.0, 5.0), 2);

        // Query fully in the top-right quadrant, overlapping the straddler
        let found = index.retrieve(&Rect::new(505.0, 105.0, 2.0, 2.0));
        assert!(found.contains(&0));
        // Each object stored exactly once
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_query_descends_only_into_matching_quadrant() {
        let mut index = SpatialIndex::with_limits(arena_bounds(), 1, 5);
        index.insert(Rect::new(10.0, 10.0, 5.0, 5.0), 1);
        index.insert(Rect::new(900.0, 500.0, 5.0, 5.0), 2);

        let found = index.retrieve(&Rect::new(20.0, 20.0, 5.0, 5.0));
        assert!(!found.contains(&2));
    }

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (0.0f32..990.0, 0.0f32..590.0, 0.5f32..120.0, 0.5f32..120.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_no_false_negatives(
            rects in prop::collection::vec(rect_strategy(), 1..60),
            query in rect_strategy(),
            max_objects in 1usize..12,
        ) {
            let mut index = SpatialIndex::with_limits(arena_bounds(), max_objects, 5);
            for (i, r) in rects.iter().enumerate() {
                index.insert(*r, i);
            }
            prop_assert_eq!(index.len(), rects.len());

            let found = index.retrieve(&query);
            for (i, r) in rects.iter().enumerate() {
                if r.overlaps(&query) {
                    prop_assert!(found.contains(&i), "rect {} {:?} missing for {:?}", i, r, query);
                }
            }
        }
    }
}
