//! Canonical unparse format (`SPEC_FULL.md` §6): renders a router's
//! requirements, elements, and connection chains back into the textual
//! form the configuration-language collaborator would accept, so that
//! `unparse -> reparse -> unparse` round-trips byte-for-byte
//! (`SPEC_FULL.md` §8).

use crate::connection::Connection;
use crate::domain_types::ElementIndex;
use crate::registry::ElementRegistry;
use std::collections::HashSet;

/// Renders the full canonical form: `require(...)`, one `NAME :: CLASS(CONFIG);`
/// per element, then connection chains.
#[must_use]
pub fn unparse(requirements: &[String], registry: &ElementRegistry, connections: &[Connection]) -> String {
    let mut out = String::new();

    if !requirements.is_empty() {
        out.push_str("require(");
        out.push_str(&requirements.join(", "));
        out.push_str(");\n");
    }

    for (index, entry) in registry.iter() {
        let _ = index;
        out.push_str(entry.name());
        out.push_str(" :: ");
        out.push_str(entry.read().class_name());
        out.push('(');
        out.push_str(entry.configuration());
        out.push_str(");\n");
    }

    for chain in build_chains(connections) {
        out.push_str(&render_chain(&chain, registry));
        out.push('\n');
    }

    out
}

fn build_chains(connections: &[Connection]) -> Vec<Vec<Connection>> {
    let mut visited = vec![false; connections.len()];
    let mut chains = Vec::new();

    for start in 0..connections.len() {
        if visited[start] {
            continue;
        }
        let mut chain = vec![connections[start]];
        visited[start] = true;
        let mut path_elements: HashSet<ElementIndex> = HashSet::new();
        path_elements.insert(connections[start].from.element);
        path_elements.insert(connections[start].to.element);

        loop {
            let current = chain.last().expect("chain never empty").to;
            let next = connections.iter().enumerate().find(|(i, c)| {
                !visited[*i] && c.from.element == current.element && c.from.port.as_usize() == 0
            });
            match next {
                Some((i, &connection)) if !path_elements.contains(&connection.to.element) => {
                    visited[i] = true;
                    path_elements.insert(connection.to.element);
                    chain.push(connection);
                }
                _ => break,
            }
        }

        chains.push(chain);
    }

    chains
}

fn render_chain(chain: &[Connection], registry: &ElementRegistry) -> String {
    let name = |index: ElementIndex| registry.entry(index).map(crate::registry::ElementEntry::name).unwrap_or("?");

    let mut out = String::new();
    out.push_str(name(chain[0].from.element));
    for connection in chain {
        if connection.from.port.as_usize() != 0 {
            out.push_str(&format!(" [{}]", connection.from.port.as_usize()));
        }
        out.push_str(" -> ");
        if connection.to.port.as_usize() != 0 {
            out.push_str(&format!("[{}] ", connection.to.port.as_usize()));
        }
        out.push_str(name(connection.to.element));
    }
    out.push(';');
    out
}
