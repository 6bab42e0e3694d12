//! Name Resolution (`SPEC_FULL.md` §4.6): lexical scoping for slash-
//! delimited compound element paths.

use crate::domain_types::ElementIndex;
use crate::error::RouterError;

/// Repeatedly searches `context + "/" + name`, then strips the last path
/// component from `context` and retries, until a match is found or
/// `context` is exhausted (`SPEC_FULL.md` §4.6, §8 property 6).
///
/// # Errors
/// Returns [`RouterError::AmbiguousName`] if two elements match at the same
/// scope, or [`RouterError::NameNotFound`] if no scope matches at all.
pub fn find(names: &[(ElementIndex, String)], name: &str, context: &str) -> Result<ElementIndex, RouterError> {
    let mut scope = context.to_string();

    loop {
        let candidate = if scope.is_empty() {
            name.to_string()
        } else {
            format!("{scope}/{name}")
        };

        let matches: Vec<ElementIndex> = names
            .iter()
            .filter(|(_, candidate_name)| candidate_name == &candidate)
            .map(|(index, _)| *index)
            .collect();

        match matches.len() {
            0 => {}
            1 => return Ok(matches[0]),
            _ => {
                return Err(RouterError::AmbiguousName {
                    name: name.to_string(),
                    context: scope,
                })
            }
        }

        if scope.is_empty() {
            break;
        }
        scope = match scope.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        };
    }

    Err(RouterError::NameNotFound {
        name: name.to_string(),
        context: context.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pairs: &[(usize, &str)]) -> Vec<(ElementIndex, String)> {
        pairs
            .iter()
            .map(|&(i, n)| (ElementIndex::new(i), n.to_string()))
            .collect()
    }

    #[test]
    fn resolves_innermost_scope_first() {
        let names = names(&[(0, "a/b/target"), (1, "a/target"), (2, "target")]);
        assert_eq!(find(&names, "target", "a/b").unwrap(), ElementIndex::new(0));
        assert_eq!(find(&names, "target", "a").unwrap(), ElementIndex::new(1));
        assert_eq!(find(&names, "target", "c").unwrap(), ElementIndex::new(2));
    }

    #[test]
    fn falls_back_through_parent_scopes() {
        let names = names(&[(0, "target")]);
        assert_eq!(find(&names, "target", "a/b/c").unwrap(), ElementIndex::new(0));
    }

    #[test]
    fn ambiguity_is_reported_at_the_matching_scope() {
        let names = names(&[(0, "a/target"), (1, "a/target")]);
        let err = find(&names, "target", "a").unwrap_err();
        assert!(matches!(err, RouterError::AmbiguousName { .. }));
    }

    #[test]
    fn not_found_exhausts_every_scope() {
        let names = names(&[(0, "other")]);
        let err = find(&names, "target", "a/b").unwrap_err();
        assert!(matches!(err, RouterError::NameNotFound { .. }));
    }
}
