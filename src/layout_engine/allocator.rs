//! Partitions the union of output rectangles into disjoint viewport areas.

use serde::{Deserialize, Serialize};

use crate::model::{Rect, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputId(pub u32);

impl std::fmt::Display for OutputId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "output-{}", self.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub id: OutputId,
    pub area: Rect,
}

impl Output {
    pub fn new(id: u32, area: Rect) -> Self { Output { id: OutputId(id), area } }
}

/// Each output, in order, claims whatever part of its area earlier outputs
/// left free. One output can yield several allocations, or none when it is
/// fully covered.
pub fn allocate(outputs: &[Output]) -> Vec<(OutputId, Rect)> {
    let mut claimed = Region::new();
    let mut allocations = Vec::new();
    for output in outputs {
        if output.area.is_null() {
            continue;
        }
        let mut free = Region::from(output.area);
        free.subtract(&claimed);
        for rect in free.rects() {
            allocations.push((output.id, *rect));
        }
        claimed.add(&free);
    }
    allocations
}

/// Bounding box of every output.
pub fn extents(outputs: &[Output]) -> Rect {
    outputs.iter().fold(Rect::default(), |acc, o| acc.union(&o.area))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Point;

    /// Small deterministic generator so the property runs are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: i32) -> i32 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) % bound as u64) as i32
        }
    }

    fn random_outputs(rng: &mut Lcg, n: usize) -> Vec<Output> {
        (0..n)
            .map(|i| {
                let area = Rect::new(rng.next(200), rng.next(200), 1 + rng.next(120), 1 + rng.next(120));
                Output::new(i as u32, area)
            })
            .collect()
    }

    fn covered(rects: &[Rect], p: Point) -> usize { rects.iter().filter(|r| r.contains(p)).count() }

    #[test]
    fn single_output_is_kept_whole() {
        let outputs = [Output::new(3, Rect::new(0, 0, 1920, 1080))];
        assert_eq!(allocate(&outputs), vec![(OutputId(3), Rect::new(0, 0, 1920, 1080))]);
    }

    #[test]
    fn mirrored_output_gets_nothing() {
        let outputs = [
            Output::new(0, Rect::new(0, 0, 1920, 1080)),
            Output::new(1, Rect::new(0, 0, 1920, 1080)),
        ];
        assert_eq!(allocate(&outputs), vec![(OutputId(0), Rect::new(0, 0, 1920, 1080))]);
    }

    #[test]
    fn overlapping_output_loses_shared_part() {
        let outputs = [
            Output::new(0, Rect::new(0, 0, 100, 100)),
            Output::new(1, Rect::new(50, 0, 100, 100)),
        ];
        let allocs = allocate(&outputs);
        assert_eq!(allocs[0], (OutputId(0), Rect::new(0, 0, 100, 100)));
        let rest: Vec<_> = allocs[1..].iter().map(|(_, r)| *r).collect();
        assert!(allocs[1..].iter().all(|(id, _)| *id == OutputId(1)));
        assert_eq!(rest.iter().map(Rect::area).sum::<i64>(), 50 * 100);
    }

    #[test]
    fn allocations_are_disjoint_and_cover_inputs() {
        let mut rng = Lcg(0x7ab7);
        for round in 0..200 {
            let n = 1 + round % 8;
            let outputs = random_outputs(&mut rng, n);
            let allocs: Vec<Rect> = allocate(&outputs).into_iter().map(|(_, r)| r).collect();

            for (i, a) in allocs.iter().enumerate() {
                assert!(!a.is_null());
                for b in &allocs[i + 1..] {
                    assert!(!a.overlaps(b), "{a} overlaps {b} in {outputs:?}");
                }
            }

            let bounds = extents(&outputs);
            for y in (bounds.y..bounds.bottom()).step_by(3) {
                for x in (bounds.x..bounds.right()).step_by(3) {
                    let p = Point::new(x, y);
                    let in_input = outputs.iter().any(|o| o.area.contains(p));
                    let hits = covered(&allocs, p);
                    assert_eq!(hits, usize::from(in_input), "point {p:?} in {outputs:?}");
                }
            }

            let input_area: Region = outputs.iter().map(|o| o.area).collect();
            let output_area: i64 = allocs.iter().map(Rect::area).sum();
            assert_eq!(output_area, input_area.area());
        }
    }
}
