//! Connection Completeness, Uniqueness, and transitive reachability
//! (`SPEC_FULL.md` §4.4).

use crate::connection::ConnectionTable;
use crate::domain_types::{Direction, ElementIndex, PortNumber};
use crate::element::Element;
use crate::error::RouterError;
use crate::port_index::PortIndex;
use crate::processing::ResolvedPolarity;
use crate::registry::ElementRegistry;
use std::collections::{HashSet, VecDeque};

/// A caller-supplied predicate that stops the BFS from expanding past an
/// element (`SPEC_FULL.md` §4.4 "a caller-supplied stop predicate").
pub type ElementFilter<'a> = &'a dyn Fn(ElementIndex) -> bool;

/// Drops and reports connections that reuse a push-output or pull-input
/// port (`SPEC_FULL.md` §4.4). Keeps only the first connection seen on
/// each such port, in table order.
#[must_use]
pub fn check_uniqueness(ports: &PortIndex, connections: &ConnectionTable, polarity: &ResolvedPolarity) -> (HashSet<usize>, Vec<RouterError>) {
    let mut dropped = HashSet::new();
    let mut errors = Vec::new();
    let mut seen_push_outputs = HashSet::new();
    let mut seen_pull_inputs = HashSet::new();

    for (i, connection) in connections.edges().iter().enumerate() {
        if let Some(gid) = ports.global(connection.from.element, Direction::Output, connection.from.port) {
            if polarity.output[gid.as_usize()] == crate::domain_types::Polarity::Push && !seen_push_outputs.insert(gid) {
                dropped.insert(i);
                errors.push(RouterError::PushOutputReused {
                    element: connection.from.element,
                    port: connection.from.port,
                });
                continue;
            }
        }
        if let Some(gid) = ports.global(connection.to.element, Direction::Input, connection.to.port) {
            if polarity.input[gid.as_usize()] == crate::domain_types::Polarity::Pull && !seen_pull_inputs.insert(gid) {
                dropped.insert(i);
                errors.push(RouterError::PullInputReused {
                    element: connection.to.element,
                    port: connection.to.port,
                });
            }
        }
    }

    (dropped, errors)
}

/// Reports every port that participates in no connection at all
/// (`SPEC_FULL.md` §4.4, §8 "Zero elements" exempted trivially since it has
/// no ports to check).
#[must_use]
pub fn check_unused(ports: &PortIndex, connections: &ConnectionTable, registry: &ElementRegistry) -> Vec<RouterError> {
    let mut used_inputs = vec![false; ports.total(Direction::Input)];
    let mut used_outputs = vec![false; ports.total(Direction::Output)];

    for connection in connections.edges() {
        if let Some(gid) = ports.global(connection.from.element, Direction::Output, connection.from.port) {
            used_outputs[gid.as_usize()] = true;
        }
        if let Some(gid) = ports.global(connection.to.element, Direction::Input, connection.to.port) {
            used_inputs[gid.as_usize()] = true;
        }
    }

    let mut errors = Vec::new();
    for (index, _) in registry.iter() {
        for port in 0..ports.port_count(index, Direction::Input) {
            let gid = ports.global(index, Direction::Input, PortNumber::new(port)).expect("in range");
            if !used_inputs[gid.as_usize()] {
                errors.push(RouterError::PortUnused {
                    element: index,
                    direction: Direction::Input,
                    port: PortNumber::new(port),
                });
            }
        }
        for port in 0..ports.port_count(index, Direction::Output) {
            let gid = ports.global(index, Direction::Output, PortNumber::new(port)).expect("in range");
            if !used_outputs[gid.as_usize()] {
                errors.push(RouterError::PortUnused {
                    element: index,
                    direction: Direction::Output,
                    port: PortNumber::new(port),
                });
            }
        }
    }

    errors
}

/// Finds every element (and the ports along the way) reachable from
/// `(start_element, start_port)` in `direction`, expanding across
/// connections and each element's internal `port_flow`
/// (`SPEC_FULL.md` §4.4).
///
/// `direction` selects which way the walk runs: `Output` walks downstream
/// from an output port (following connections forward, then each element's
/// own input-to-output fan-out); `Input` walks upstream from an input port
/// (following connections backward to their source, then each element's
/// own output-to-input fan-in). The frontier is bipartite: an item on the
/// "connection" side of `direction` crosses edges in the connection table,
/// an item on the other side crosses within an element via `port_flow`.
#[must_use]
pub fn reachable(
    ports: &PortIndex,
    connections: &ConnectionTable,
    registry: &ElementRegistry,
    start: (ElementIndex, PortNumber),
    direction: Direction,
    stop: ElementFilter<'_>,
) -> HashSet<ElementIndex> {
    let mut visited_elements = HashSet::new();
    let mut visited_frontier: HashSet<(ElementIndex, Direction, usize)> = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back((start.0, direction, start.1.as_usize()));
    visited_frontier.insert((start.0, direction, start.1.as_usize()));

    while let Some((element, side, port)) = queue.pop_front() {
        if side == direction {
            // On the side connections cross: downstream follows `from`
            // forward to `to`; upstream follows `to` backward to `from`.
            for connection in connections.edges() {
                let (matches, neighbor_element, neighbor_side, neighbor_port) = match direction {
                    Direction::Output => (
                        connection.from.element == element && connection.from.port.as_usize() == port,
                        connection.to.element,
                        Direction::Input,
                        connection.to.port.as_usize(),
                    ),
                    Direction::Input => (
                        connection.to.element == element && connection.to.port.as_usize() == port,
                        connection.from.element,
                        Direction::Output,
                        connection.from.port.as_usize(),
                    ),
                };
                if matches && !stop(neighbor_element) {
                    visited_elements.insert(neighbor_element);
                    let key = (neighbor_element, neighbor_side, neighbor_port);
                    if visited_frontier.insert(key) {
                        queue.push_back(key);
                    }
                }
            }
        } else {
            // On the other side, cross within the element via `port_flow`:
            // downstream asks the input side which outputs it fans into;
            // upstream asks the output side which inputs feed into it.
            let Some(entry) = registry.entry(element) else {
                continue;
            };
            let (query_direction, opposite_count, landing_side) = match direction {
                Direction::Output => (Direction::Input, ports.port_count(element, Direction::Output), Direction::Output),
                Direction::Input => (Direction::Output, ports.port_count(element, Direction::Input), Direction::Input),
            };
            let flow = entry.read().port_flow(query_direction, PortNumber::new(port), opposite_count);
            for reached in flow.reached() {
                let key = (element, landing_side, reached);
                if visited_frontier.insert(key) {
                    queue.push_back(key);
                }
            }
        }
    }

    visited_elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Endpoint;
    use crate::domain_types::Polarity;
    use crate::element::{Element, PortFlow, ProcessingVector};

    struct Chain {
        inputs: usize,
        outputs: usize,
    }

    impl Element for Chain {
        fn class_name(&self) -> &str {
            "Chain"
        }
        fn input_spec(&self) -> crate::domain_types::PortSpec {
            crate::domain_types::PortSpec::Fixed(self.inputs)
        }
        fn output_spec(&self) -> crate::domain_types::PortSpec {
            crate::domain_types::PortSpec::Fixed(self.outputs)
        }
        fn processing_vector(&self, inputs: usize, outputs: usize) -> ProcessingVector {
            ProcessingVector::uniform(inputs, outputs, Polarity::Push)
        }
        fn port_flow(&self, _direction: Direction, _port: PortNumber, opposite_count: usize) -> PortFlow {
            PortFlow::all(opposite_count)
        }
    }

    #[test]
    fn downstream_reaches_through_agnostic_element() {
        let mut registry = ElementRegistry::new();
        registry.add(Box::new(Chain { inputs: 0, outputs: 1 }), "S", "", "");
        registry.add(Box::new(Chain { inputs: 1, outputs: 1 }), "Q", "", "");
        registry.add(Box::new(Chain { inputs: 1, outputs: 0 }), "D", "", "");

        let ports = PortIndex::build(&[(0, 1), (1, 1), (1, 0)]);
        let mut connections = ConnectionTable::new();
        connections.add(
            Endpoint::new(ElementIndex::new(0), PortNumber::new(0)),
            Endpoint::new(ElementIndex::new(1), PortNumber::new(0)),
        );
        connections.add(
            Endpoint::new(ElementIndex::new(1), PortNumber::new(0)),
            Endpoint::new(ElementIndex::new(2), PortNumber::new(0)),
        );

        let downstream = reachable(
            &ports,
            &connections,
            &registry,
            (ElementIndex::new(0), PortNumber::new(0)),
            Direction::Output,
            &|_| false,
        );

        assert_eq!(downstream, HashSet::from([ElementIndex::new(1), ElementIndex::new(2)]));
    }

    #[test]
    fn upstream_walks_backward_through_agnostic_element() {
        let mut registry = ElementRegistry::new();
        registry.add(Box::new(Chain { inputs: 0, outputs: 1 }), "S", "", "");
        registry.add(Box::new(Chain { inputs: 1, outputs: 1 }), "Q", "", "");
        registry.add(Box::new(Chain { inputs: 1, outputs: 0 }), "D", "", "");

        let ports = PortIndex::build(&[(0, 1), (1, 1), (1, 0)]);
        let mut connections = ConnectionTable::new();
        connections.add(
            Endpoint::new(ElementIndex::new(0), PortNumber::new(0)),
            Endpoint::new(ElementIndex::new(1), PortNumber::new(0)),
        );
        connections.add(
            Endpoint::new(ElementIndex::new(1), PortNumber::new(0)),
            Endpoint::new(ElementIndex::new(2), PortNumber::new(0)),
        );

        let upstream = reachable(
            &ports,
            &connections,
            &registry,
            (ElementIndex::new(2), PortNumber::new(0)),
            Direction::Input,
            &|_| false,
        );

        assert_eq!(upstream, HashSet::from([ElementIndex::new(0), ElementIndex::new(1)]));
    }

    #[test]
    fn unused_ports_are_reported() {
        let mut registry = ElementRegistry::new();
        registry.add(Box::new(Chain { inputs: 1, outputs: 1 }), "a", "", "");
        let ports = PortIndex::build(&[(1, 1)]);
        let connections = ConnectionTable::new();
        let errors = check_unused(&ports, &connections, &registry);
        assert_eq!(errors.len(), 2);
    }
}
