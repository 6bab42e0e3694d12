//! Processing Resolver (`SPEC_FULL.md` §4.3): assigns every port a definite
//! push/pull polarity, propagating through both user connections and each
//! element's internally-declared port-to-port flow until fixed point.

use crate::connection::ConnectionTable;
use crate::domain_types::{Direction, ElementIndex, GlobalPortId, Polarity, PortNumber};
use crate::error::{ConflictKind, RouterError};
use crate::port_index::PortIndex;
use crate::registry::ElementRegistry;
use std::collections::HashSet;

/// One propagation edge: an output global port id and an input global port
/// id it's connected to, tagged with whether it's user-supplied or
/// synthesized from an element's `port_flow`.
#[derive(Debug, Clone, Copy)]
struct Edge {
    output: GlobalPortId,
    input: GlobalPortId,
    aggregated: bool,
    /// Index into the connection table, for direct edges only — used to
    /// mark the connection dead on conflict.
    connection_index: Option<usize>,
}

/// Polarity assigned to every port, indexed by global port id per
/// direction.
#[derive(Debug, Clone)]
pub struct ResolvedPolarity {
    /// Resolved polarity of every input port, indexed by global input id.
    pub input: Vec<Polarity>,
    /// Resolved polarity of every output port, indexed by global output id.
    pub output: Vec<Polarity>,
}

impl ResolvedPolarity {
    /// This element's resolved input polarities, in port order.
    #[must_use]
    pub fn element_inputs(&self, ports: &PortIndex, element: ElementIndex) -> Vec<Polarity> {
        ports
            .neighbors(element, Direction::Input)
            .map(|gid| self.input[gid])
            .collect()
    }

    /// This element's resolved output polarities, in port order.
    #[must_use]
    pub fn element_outputs(&self, ports: &PortIndex, element: ElementIndex) -> Vec<Polarity> {
        ports
            .neighbors(element, Direction::Output)
            .map(|gid| self.output[gid])
            .collect()
    }
}

/// Result of running the resolver to fixed point.
#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    /// Connection-table indices that disagreed on a definite polarity and
    /// must be dropped before completeness checking.
    pub dead_connections: HashSet<usize>,
    /// `ProcessingConflict` errors, direct and aggregated.
    pub errors: Vec<RouterError>,
}

/// Runs the port-flow-aware fixed-point polarity resolver.
pub struct ProcessingResolver;

impl ProcessingResolver {
    /// Gathers declared polarities, synthesizes internal-flow edges, and
    /// propagates both alongside user connections until no pass changes
    /// anything (`SPEC_FULL.md` §4.3 steps 1-4).
    #[must_use]
    pub fn resolve(
        ports: &PortIndex,
        connections: &ConnectionTable,
        elements: &ElementRegistry,
    ) -> (ResolvedPolarity, ResolveOutcome) {
        let mut polarity = Self::gather_declared(ports, elements);
        let edges = Self::build_edges(ports, connections, elements);
        let outcome = Self::propagate(ports, &mut polarity, &edges);
        (polarity, outcome)
    }

    fn gather_declared(ports: &PortIndex, elements: &ElementRegistry) -> ResolvedPolarity {
        let mut input = vec![Polarity::Agnostic; ports.total(Direction::Input)];
        let mut output = vec![Polarity::Agnostic; ports.total(Direction::Output)];

        for (idx, entry) in elements.iter() {
            let in_count = ports.port_count(idx, Direction::Input);
            let out_count = ports.port_count(idx, Direction::Output);
            let vector = entry.read().processing_vector(in_count, out_count);

            for (p, &polarity_value) in vector.inputs.iter().enumerate() {
                if let Some(gid) = ports.global(idx, Direction::Input, PortNumber::new(p)) {
                    input[gid.as_usize()] = polarity_value;
                }
            }
            for (p, &polarity_value) in vector.outputs.iter().enumerate() {
                if let Some(gid) = ports.global(idx, Direction::Output, PortNumber::new(p)) {
                    output[gid.as_usize()] = polarity_value;
                }
            }
        }

        ResolvedPolarity { input, output }
    }

    fn build_edges(ports: &PortIndex, connections: &ConnectionTable, elements: &ElementRegistry) -> Vec<Edge> {
        let mut edges = Vec::new();

        for (i, connection) in connections.edges().iter().enumerate() {
            let Some(output_gid) = ports.global(connection.from.element, Direction::Output, connection.from.port) else {
                continue;
            };
            let Some(input_gid) = ports.global(connection.to.element, Direction::Input, connection.to.port) else {
                continue;
            };
            edges.push(Edge {
                output: output_gid,
                input: input_gid,
                aggregated: false,
                connection_index: Some(i),
            });
        }

        for (idx, entry) in elements.iter() {
            let in_count = ports.port_count(idx, Direction::Input);
            let out_count = ports.port_count(idx, Direction::Output);
            for p in 0..in_count {
                let flow = entry.read().port_flow(Direction::Input, PortNumber::new(p), out_count);
                let Some(input_gid) = ports.global(idx, Direction::Input, PortNumber::new(p)) else {
                    continue;
                };
                for o in flow.reached() {
                    let Some(output_gid) = ports.global(idx, Direction::Output, PortNumber::new(o)) else {
                        continue;
                    };
                    edges.push(Edge {
                        output: output_gid,
                        input: input_gid,
                        aggregated: true,
                        connection_index: None,
                    });
                }
            }
        }

        edges
    }

    fn propagate(ports: &PortIndex, polarity: &mut ResolvedPolarity, edges: &[Edge]) -> ResolveOutcome {
        let mut outcome = ResolveOutcome::default();
        let mut dead_edges: HashSet<usize> = HashSet::new();

        loop {
            let mut changed = false;

            for (edge_index, edge) in edges.iter().enumerate() {
                if dead_edges.contains(&edge_index) {
                    continue;
                }
                let out_polarity = polarity.output[edge.output.as_usize()];
                let in_polarity = polarity.input[edge.input.as_usize()];

                match (out_polarity.is_definite(), in_polarity.is_definite()) {
                    (true, false) => {
                        polarity.input[edge.input.as_usize()] = out_polarity;
                        changed = true;
                    }
                    (false, true) => {
                        polarity.output[edge.output.as_usize()] = in_polarity;
                        changed = true;
                    }
                    (true, true) if out_polarity != in_polarity => {
                        dead_edges.insert(edge_index);
                        if let Some(connection_index) = edge.connection_index {
                            outcome.dead_connections.insert(connection_index);
                        }
                        let (from_element, from_port) = ports
                            .owner(Direction::Output, edge.output)
                            .unwrap_or((ElementIndex::new(0), PortNumber::new(0)));
                        let (to_element, to_port) = ports
                            .owner(Direction::Input, edge.input)
                            .unwrap_or((ElementIndex::new(0), PortNumber::new(0)));
                        outcome.errors.push(RouterError::ProcessingConflict {
                            from_element,
                            from_port,
                            to_element,
                            to_port,
                            kind: if edge.aggregated { ConflictKind::Aggregated } else { ConflictKind::Direct },
                        });
                        changed = true;
                    }
                    _ => {}
                }
            }

            if !changed {
                break;
            }
        }

        outcome
    }
}
