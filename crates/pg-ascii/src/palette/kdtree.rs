//! Arbre k-d à 3 dimensions sur l'espace RGB.
//!
//! Nodes live in a flat `Vec` and reference children by index. The tree is
//! built once per palette and only read afterwards, so it can be shared
//! across rayon workers without locking.

use pg_core::color::Rgb;

#[derive(Clone, Debug)]
struct Node {
    point: Rgb,
    /// Index de l'entrée dans la palette d'origine.
    index: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Static k-d tree answering exact nearest-neighbour queries.
///
/// Ties on distance go to the lowest original index, so the result matches a
/// linear scan that keeps the first minimum.
///
/// # Example
/// ```
/// use pg_ascii::palette::kdtree::KdTree;
/// use pg_core::color::Rgb;
/// let tree = KdTree::build(&[Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)]);
/// assert_eq!(tree.nearest(Rgb::new(200, 180, 220)), Some((1, 9875)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl KdTree {
    /// Build over `points`; entry `i` is reported as index `i`.
    #[must_use]
    pub fn build(points: &[Rgb]) -> Self {
        let mut items: Vec<(Rgb, usize)> = points.iter().copied().zip(0..).collect();
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            root: None,
        };
        tree.root = tree.build_rec(&mut items, 0);
        tree
    }

    fn build_rec(&mut self, items: &mut [(Rgb, usize)], depth: usize) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let axis = depth % 3;
        items.sort_unstable_by_key(|&(p, i)| (p.channel(axis), i));
        let median = items.len() / 2;
        let (point, index) = items[median];

        let slot = self.nodes.len();
        self.nodes.push(Node {
            point,
            index,
            axis,
            left: None,
            right: None,
        });
        let (lower, rest) = items.split_at_mut(median);
        let left = self.build_rec(lower, depth + 1);
        let right = self.build_rec(&mut rest[1..], depth + 1);
        self.nodes[slot].left = left;
        self.nodes[slot].right = right;
        Some(slot)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nearest point to `target` as `(original index, squared distance)`.
    ///
    /// `None` only for an empty tree.
    #[must_use]
    pub fn nearest(&self, target: Rgb) -> Option<(usize, u32)> {
        let root = self.root?;
        let mut best = (usize::MAX, u32::MAX);
        self.search(root, target, &mut best);
        Some(best)
    }

    fn search(&self, slot: usize, target: Rgb, best: &mut (usize, u32)) {
        let node = &self.nodes[slot];
        let d = node.point.distance_sq(target);
        if d < best.1 || (d == best.1 && node.index < best.0) {
            *best = (node.index, d);
        }

        let diff = i32::from(target.channel(node.axis)) - i32::from(node.point.channel(node.axis));
        let (near, far) = if diff < 0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(n) = near {
            self.search(n, target, best);
        }
        // `<=` : un point à égale distance derrière le plan peut avoir un index plus petit.
        let plane = (diff * diff) as u32;
        if let Some(f) = far.filter(|_| plane <= best.1) {
            self.search(f, target, best);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(points: &[Rgb], target: Rgb) -> (usize, u32) {
        let mut best = (usize::MAX, u32::MAX);
        for (i, p) in points.iter().enumerate() {
            let d = p.distance_sq(target);
            if d < best.1 {
                best = (i, d);
            }
        }
        best
    }

    fn scattered_points() -> Vec<Rgb> {
        // Générateur congruentiel : déterministe, sans dépendance.
        let mut state = 0x2545_f491_u32;
        let mut next = || {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        };
        (0..150).map(|_| Rgb::new(next(), next(), next())).collect()
    }

    #[test]
    fn empty_tree_has_no_neighbour() {
        let tree = KdTree::build(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.nearest(Rgb::new(1, 2, 3)), None);
    }

    #[test]
    fn agrees_with_linear_scan() {
        let points = scattered_points();
        let tree = KdTree::build(&points);
        assert_eq!(tree.len(), points.len());
        for r in (0..=255).step_by(17) {
            for g in (0..=255).step_by(51) {
                for b in (0..=255).step_by(85) {
                    let t = Rgb::new(r as u8, g as u8, b as u8);
                    let (i, d) = tree.nearest(t).unwrap();
                    let (_, expected) = brute_force(&points, t);
                    assert_eq!(d, expected, "distance pour {t:?}");
                    assert_eq!(points[i].distance_sq(t), d);
                }
            }
        }
    }

    #[test]
    fn ties_go_to_lowest_index() {
        // 10 est à égale distance de 8 et 12.
        let points = [Rgb::new(12, 12, 12), Rgb::new(8, 8, 8), Rgb::new(200, 0, 0)];
        let tree = KdTree::build(&points);
        assert_eq!(tree.nearest(Rgb::new(10, 10, 10)), Some((0, 12)));

        let reversed = [Rgb::new(8, 8, 8), Rgb::new(12, 12, 12)];
        let tree = KdTree::build(&reversed);
        assert_eq!(tree.nearest(Rgb::new(10, 10, 10)), Some((0, 12)));
    }

    #[test]
    fn exact_points_are_found_at_distance_zero() {
        let points = scattered_points();
        let tree = KdTree::build(&points);
        for p in &points {
            let (i, d) = tree.nearest(*p).unwrap();
            assert_eq!(d, 0);
            assert_eq!(points[i], *p);
        }
    }
}
