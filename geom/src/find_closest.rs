use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use crate::{Bounds, Pt2D};

/// A spatial index of bounding boxes, answering "which keys have a box containing this point".
/// Callers do the precise geometric test on the few candidates returned.
pub struct FindClosest<K> {
    rtree: RTree<GeomWithData<Rectangle<[f64; 2]>, K>>,
}

impl<K> FindClosest<K>
where
    K: Clone + std::fmt::Debug,
{
    pub fn new() -> FindClosest<K> {
        FindClosest {
            rtree: RTree::new(),
        }
    }

    /// Bulk-loads all of the boxes at once, which builds a better tree than repeated `add`.
    pub fn bulk_load(items: Vec<(K, Bounds)>) -> FindClosest<K> {
        let items = items
            .into_iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(key, b)| GeomWithData::new(to_rect(&b), key))
            .collect();
        FindClosest {
            rtree: RTree::bulk_load(items),
        }
    }

    pub fn add(&mut self, key: K, bounds: &Bounds) {
        if bounds.is_empty() {
            warn!("Not indexing {:?}; it has empty bounds", key);
            return;
        }
        self.rtree.insert(GeomWithData::new(to_rect(bounds), key));
    }

    /// All keys whose box, grown by `buffer`, contains the point.
    pub fn candidates(&self, pt: Pt2D, buffer: f64) -> Vec<K> {
        let envelope = AABB::from_corners(
            [pt.x() - buffer, pt.y() - buffer],
            [pt.x() + buffer, pt.y() + buffer],
        );
        self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|item| item.data.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }
}

impl<K: Clone + std::fmt::Debug> Default for FindClosest<K> {
    fn default() -> FindClosest<K> {
        FindClosest::new()
    }
}

fn to_rect(b: &Bounds) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([b.min_x, b.min_y], [b.max_x, b.max_y])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_in_boxes() {
        let mut index = FindClosest::new();
        index.add("a", &Bounds::from(&[Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 10.0)]));
        index.add("b", &Bounds::from(&[Pt2D::new(20.0, 0.0), Pt2D::new(30.0, 10.0)]));
        assert_eq!(index.candidates(Pt2D::new(5.0, 5.0), 0.0), vec!["a"]);
        assert!(index.candidates(Pt2D::new(15.0, 5.0), 1.0).is_empty());
        let mut both = index.candidates(Pt2D::new(15.0, 5.0), 6.0);
        both.sort();
        assert_eq!(both, vec!["a", "b"]);
    }
}
