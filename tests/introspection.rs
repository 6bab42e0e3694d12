//! Introspection surface end-to-end (`SPEC_FULL.md` §6, §8): the
//! `version`/`config`/`flatconfig`/`list`/`requirements` read handlers and
//! the `stop` write handler, all reached through `Router::call_read`/
//! `call_write` against `ElementIndex::ROOT` rather than the lower-level
//! `unparse`/`list` accessors directly.

mod support;

use elementgraph::{CollectingErrorSink, ElementIndex, PortNumber, Router, RouterConfig};
use support::PolarityElement;

#[test]
fn list_handler_reports_count_then_one_name_per_line() {
    let mut router = Router::new(RouterConfig::default());
    router.add_element(Box::new(PolarityElement::source(1)), "s", "", "").unwrap();
    router.add_element(Box::new(PolarityElement::sink(1)), "d", "", "").unwrap();
    let s = ElementIndex::new(0);
    let d = ElementIndex::new(1);
    router.add_connection(s, PortNumber::new(0), d, PortNumber::new(0)).unwrap();
    let mut errors = CollectingErrorSink::new();
    router.initialize(&mut errors).unwrap();

    let list = router.call_read(ElementIndex::ROOT, "list", None).unwrap();
    assert_eq!(list, "2\ns\nd\n");
}

#[test]
fn requirements_handler_renders_one_word_per_line() {
    let mut router = Router::new(RouterConfig::default());
    router.add_requirement("ip").unwrap();
    router.add_requirement("tcp").unwrap();
    let mut errors = CollectingErrorSink::new();
    router.initialize(&mut errors).unwrap();

    let requirements = router.call_read(ElementIndex::ROOT, "requirements", None).unwrap();
    assert_eq!(requirements, "ip\ntcp");
}

#[test]
fn config_handler_echoes_the_recorded_original_source_verbatim() {
    let mut router = Router::new(RouterConfig::default());
    router.set_original_source("s :: Source; d :: Sink; s -> d;").unwrap();
    let mut errors = CollectingErrorSink::new();
    router.initialize(&mut errors).unwrap();

    let config = router.call_read(ElementIndex::ROOT, "config", None).unwrap();
    assert_eq!(config, "s :: Source; d :: Sink; s -> d;");
}

#[test]
fn flatconfig_handler_matches_the_router_unparse() {
    let mut router = Router::new(RouterConfig::default());
    router.add_element(Box::new(PolarityElement::source(1)), "s", "", "").unwrap();
    router.add_element(Box::new(PolarityElement::sink(1)), "d", "", "").unwrap();
    let s = ElementIndex::new(0);
    let d = ElementIndex::new(1);
    router.add_connection(s, PortNumber::new(0), d, PortNumber::new(0)).unwrap();
    let mut errors = CollectingErrorSink::new();
    router.initialize(&mut errors).unwrap();

    let flatconfig = router.call_read(ElementIndex::ROOT, "flatconfig", None).unwrap();
    assert_eq!(flatconfig, router.unparse());
    assert!(flatconfig.contains("s :: Source();"));
    assert!(flatconfig.contains("s -> d;"));
}

#[test]
fn version_handler_matches_the_crate_version() {
    let router = Router::new(RouterConfig::default());
    let version = router.call_read(ElementIndex::ROOT, "version", None).unwrap();
    assert_eq!(version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn root_introspection_handlers_remain_callable_after_rollback() {
    // A router that fails to initialize is Dead, but version/config/list/
    // flatconfig/requirements must still answer for error introspection
    // (SPEC_FULL.md `Open Question` decision: rollback keeps defaults).
    let mut router = Router::new(RouterConfig::default());
    router.add_element(Box::new(PolarityElement::source(1)), "s", "", "").unwrap();
    // `s`'s single output is left unconnected: initialize fails on "unused".
    let mut errors = CollectingErrorSink::new();
    assert!(router.initialize(&mut errors).is_err());

    let list = router.call_read(ElementIndex::ROOT, "list", None).unwrap();
    assert_eq!(list, "1\ns\n");
    let version = router.call_read(ElementIndex::ROOT, "version", None).unwrap();
    assert_eq!(version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn unparse_is_stable_across_repeated_calls() {
    let mut router = Router::new(RouterConfig::default());
    router.add_requirement("ip").unwrap();
    router.add_element(Box::new(PolarityElement::source(1)), "s", "", "").unwrap();
    router.add_element(Box::new(PolarityElement::sink(1)), "d", "", "").unwrap();
    let s = ElementIndex::new(0);
    let d = ElementIndex::new(1);
    router.add_connection(s, PortNumber::new(0), d, PortNumber::new(0)).unwrap();
    let mut errors = CollectingErrorSink::new();
    router.initialize(&mut errors).unwrap();

    let first = router.unparse();
    let second = router.unparse();
    assert_eq!(first, second, "unparse must be idempotent for an unchanged, frozen graph");
}
