//! Connection Table (`SPEC_FULL.md` §2, §3, §4.1 step 1, §4.4): the
//! ordered, deduplicated list of directed element-port edges the graph is
//! built from.

use crate::domain_types::{ElementIndex, PortNumber};
use std::collections::HashSet;

/// One endpoint of a [`Connection`]: an element and a local port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// The element this endpoint belongs to.
    pub element: ElementIndex,
    /// The port local to that element.
    pub port: PortNumber,
}

impl Endpoint {
    /// Builds an endpoint.
    #[must_use]
    pub const fn new(element: ElementIndex, port: PortNumber) -> Self {
        Self { element, port }
    }
}

/// A directed edge from an output port to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// The source (output) endpoint.
    pub from: Endpoint,
    /// The sink (input) endpoint.
    pub to: Endpoint,
}

/// The router's connection table: insertion-ordered, deduplicated at
/// insertion time (`SPEC_FULL.md` §8 property 3).
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    edges: Vec<Connection>,
    seen: HashSet<Connection>,
}

impl ConnectionTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge, silently collapsing an exact duplicate
    /// (`SPEC_FULL.md` §4.1 "`add_connection`").
    pub fn add(&mut self, from: Endpoint, to: Endpoint) {
        let connection = Connection { from, to };
        if self.seen.insert(connection) {
            self.edges.push(connection);
        }
    }

    /// All edges, in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Connection] {
        &self.edges
    }

    /// Drops the connections at the given indices (validation pass
    /// failures), keeping the remaining edges in their relative order.
    pub fn retain_indices_not_in(&mut self, dropped: &HashSet<usize>) {
        let mut kept = Vec::with_capacity(self.edges.len());
        for (i, edge) in self.edges.drain(..).enumerate() {
            if dropped.contains(&i) {
                self.seen.remove(&edge);
            } else {
                kept.push(edge);
            }
        }
        self.edges = kept;
    }

    /// Number of edges currently in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the table has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_connections_collapse() {
        let mut table = ConnectionTable::new();
        let from = Endpoint::new(ElementIndex::new(0), PortNumber::new(0));
        let to = Endpoint::new(ElementIndex::new(1), PortNumber::new(0));
        table.add(from, to);
        table.add(from, to);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut table = ConnectionTable::new();
        for i in 0..5 {
            table.add(
                Endpoint::new(ElementIndex::new(0), PortNumber::new(i)),
                Endpoint::new(ElementIndex::new(1), PortNumber::new(i)),
            );
        }
        let ports: Vec<_> = table.edges().iter().map(|c| c.from.port.as_usize()).collect();
        assert_eq!(ports, vec![0, 1, 2, 3, 4]);
    }

    proptest::proptest! {
        // `SPEC_FULL.md` §8 property 3: for any sequence of `add_connection`
        // calls, the edge set is insertion-ordered and deduplicated.
        #[test]
        fn any_sequence_stays_ordered_and_deduplicated(
            pairs in proptest::collection::vec((0u8..4, 0u8..4, 0u8..4, 0u8..4), 0..30)
        ) {
            let mut table = ConnectionTable::new();
            let mut first_seen = Vec::new();
            for &(fe, fp, te, tp) in &pairs {
                let from = Endpoint::new(ElementIndex::new(fe.into()), PortNumber::new(fp.into()));
                let to = Endpoint::new(ElementIndex::new(te.into()), PortNumber::new(tp.into()));
                table.add(from, to);
                let connection = Connection { from, to };
                if !first_seen.contains(&connection) {
                    first_seen.push(connection);
                }
            }
            proptest::prop_assert_eq!(table.edges(), first_seen.as_slice());
        }
    }
}
