use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 10;

/// Square cell anchored at its minimum corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct QuadBounds {
    min: Vec2,
    side: f32,
}

impl QuadBounds {
    /// Smallest padded square around `points`; `None` when empty or any point is not finite.
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().try_fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), point| point.is_finite().then(|| (min.min(*point), max.max(*point))),
        )?;
        if !min.is_finite() {
            return None;
        }

        Some(Self {
            min: min - Vec2::splat(1.0),
            side: (max - min).max_elem().max(1.0) + 2.0,
        })
    }

    fn center(self) -> Vec2 {
        self.min + Vec2::splat(self.side * 0.5)
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = point - self.min;
        (0.0..=self.side).contains(&offset.x) && (0.0..=self.side).contains(&offset.y)
    }

    /// Bit 0 selects the right half, bit 1 the lower half.
    fn quadrant_for(self, point: Vec2) -> usize {
        let center = self.center();
        usize::from(point.x >= center.x) | (usize::from(point.y >= center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let side = self.side * 0.5;
        let step = vec2((quadrant & 1) as f32, (quadrant >> 1) as f32);
        Self {
            min: self.min + step * side,
            side,
        }
    }

    pub(super) fn side_length(self) -> f32 {
        self.side
    }
}

/// Barnes-Hut cell: aggregate mass and centre of mass of the nodes beneath it. Only leaves
/// keep their node indices.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        Some(Self::grow(bounds, (0..positions.len()).collect(), positions, 0))
    }

    fn grow(bounds: QuadBounds, indices: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = indices.len() as f32;
        let center_of_mass = if indices.is_empty() {
            Vec2::ZERO
        } else {
            indices
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / mass
        };

        let mut children: [Option<Box<QuadNode>>; 4] = Default::default();
        let buckets = (depth < MAX_DEPTH && indices.len() > LEAF_CAPACITY)
            .then(|| spread_into_quadrants(bounds, &indices, positions))
            .flatten();
        let indices = match buckets {
            Some(buckets) => {
                for (quadrant, bucket) in buckets.into_iter().enumerate() {
                    if !bucket.is_empty() {
                        children[quadrant] = Some(Box::new(Self::grow(
                            bounds.child(quadrant),
                            bucket,
                            positions,
                            depth + 1,
                        )));
                    }
                }
                Vec::new()
            }
            None => indices,
        };

        Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children,
        }
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Sorts `indices` by quadrant. `None` when they all share one quadrant, which happens for
/// stacked points and would only push the same set one level deeper.
fn spread_into_quadrants(
    bounds: QuadBounds,
    indices: &[usize],
    positions: &[Vec2],
) -> Option<[Vec<usize>; 4]> {
    let mut buckets: [Vec<usize>; 4] = Default::default();
    let mut first = None;
    let mut spread = false;
    for &index in indices {
        let quadrant = bounds.quadrant_for(positions[index]);
        spread |= *first.get_or_insert(quadrant) != quadrant;
        buckets[quadrant].push(index);
    }
    spread.then_some(buckets)
}
