//! Port Index (`SPEC_FULL.md` §4.2): flattens every element's per-direction
//! port counts into a dense global numbering, giving O(1) neighbor
//! enumeration and O(1) global-port-id lookup in either direction.

use crate::domain_types::{Direction, ElementIndex, GlobalPortId, PortNumber};

/// One direction's flattening: a cumulative offset array plus its inverse.
#[derive(Debug, Clone, Default)]
struct DirectionIndex {
    /// `e2g[i+1] - e2g[i]` is element `i`'s port count in this direction.
    /// Length `N + 1`.
    e2g: Vec<usize>,
    /// Maps each global port id back to its owning element. Length
    /// `e2g[N]`.
    g2e: Vec<ElementIndex>,
}

impl DirectionIndex {
    fn build(counts: &[usize]) -> Self {
        let mut e2g = Vec::with_capacity(counts.len() + 1);
        e2g.push(0);
        for &count in counts {
            e2g.push(e2g.last().expect("e2g never empty") + count);
        }
        let total = *e2g.last().expect("e2g never empty");
        let mut g2e = Vec::with_capacity(total);
        for (element, &count) in counts.iter().enumerate() {
            g2e.extend(std::iter::repeat(ElementIndex::new(element)).take(count));
        }
        Self { e2g, g2e }
    }

    fn global(&self, element: ElementIndex, port: PortNumber) -> Option<GlobalPortId> {
        let base = *self.e2g.get(element.as_usize())?;
        let next = *self.e2g.get(element.as_usize() + 1)?;
        let gid = base + port.as_usize();
        (gid < next).then(|| GlobalPortId::new(gid))
    }

    fn neighbors(&self, element: ElementIndex) -> std::ops::Range<usize> {
        let base = self.e2g.get(element.as_usize()).copied().unwrap_or(0);
        let next = self
            .e2g
            .get(element.as_usize() + 1)
            .copied()
            .unwrap_or(base);
        base..next
    }

    fn port_count(&self, element: ElementIndex) -> usize {
        self.neighbors(element).len()
    }

    fn owner(&self, gid: GlobalPortId) -> Option<(ElementIndex, PortNumber)> {
        let element = *self.g2e.get(gid.as_usize())?;
        let base = self.e2g[element.as_usize()];
        Some((element, PortNumber::new(gid.as_usize() - base)))
    }

    fn total(&self) -> usize {
        self.g2e.len()
    }
}

/// The dense, bidirectional port numbering for one router (`SPEC_FULL.md`
/// §4.2). Built once, after the port-count notification and range-check
/// passes have settled each element's declared port counts.
#[derive(Debug, Clone, Default)]
pub struct PortIndex {
    input: DirectionIndex,
    output: DirectionIndex,
}

impl PortIndex {
    /// Builds the index from each element's final `(input_count,
    /// output_count)` pair, in element-index order.
    #[must_use]
    pub fn build(counts: &[(usize, usize)]) -> Self {
        let inputs: Vec<usize> = counts.iter().map(|&(i, _)| i).collect();
        let outputs: Vec<usize> = counts.iter().map(|&(_, o)| o).collect();
        Self {
            input: DirectionIndex::build(&inputs),
            output: DirectionIndex::build(&outputs),
        }
    }

    fn index(&self, direction: Direction) -> &DirectionIndex {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    /// The global port id of `(element, direction, port)`, or `None` if the
    /// element or port doesn't exist in this direction.
    #[must_use]
    pub fn global(&self, element: ElementIndex, direction: Direction, port: PortNumber) -> Option<GlobalPortId> {
        self.index(direction).global(element, port)
    }

    /// The contiguous range of global port ids belonging to `element` in
    /// `direction` — its neighbor-enumeration slice.
    #[must_use]
    pub fn neighbors(&self, element: ElementIndex, direction: Direction) -> std::ops::Range<usize> {
        self.index(direction).neighbors(element)
    }

    /// How many ports `element` has in `direction`.
    #[must_use]
    pub fn port_count(&self, element: ElementIndex, direction: Direction) -> usize {
        self.index(direction).port_count(element)
    }

    /// Resolves a global port id in `direction` back to `(element, port)`.
    #[must_use]
    pub fn owner(&self, direction: Direction, gid: GlobalPortId) -> Option<(ElementIndex, PortNumber)> {
        self.index(direction).owner(gid)
    }

    /// Total number of ports in `direction`, across every element.
    #[must_use]
    pub fn total(&self, direction: Direction) -> usize {
        self.index(direction).total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_and_inverts() {
        // element 0: 2 in / 1 out, element 1: 0 in / 3 out
        let idx = PortIndex::build(&[(2, 1), (0, 3)]);
        assert_eq!(
            idx.global(ElementIndex::new(1), Direction::Output, PortNumber::new(2)),
            Some(GlobalPortId::new(3))
        );
        assert_eq!(
            idx.owner(Direction::Output, GlobalPortId::new(3)),
            Some((ElementIndex::new(1), PortNumber::new(2)))
        );
        assert_eq!(idx.neighbors(ElementIndex::new(1), Direction::Output), 1..4);
        assert_eq!(idx.total(Direction::Input), 2);
    }

    #[test]
    fn out_of_range_port_is_none() {
        let idx = PortIndex::build(&[(1, 0)]);
        assert!(idx.global(ElementIndex::new(0), Direction::Input, PortNumber::new(5)).is_none());
    }
}
