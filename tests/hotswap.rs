//! Hotswap end-to-end (`SPEC_FULL.md` §3, §9): a successor router pulls
//! per-element state from a still-`LIVE` predecessor, matched by name, and
//! rejects the call outside `LIVE`.

mod support;

use elementgraph::{CollectingErrorSink, Router, RouterConfig, RouterError, RouterState};
use std::sync::Arc;
use support::{HotswapElement, PolarityElement, Trace};

#[test]
fn hotswap_from_requires_a_live_router() {
    let predecessor = Arc::new(Router::new(RouterConfig::default()));
    let successor = Router::new(RouterConfig::default());
    let err = successor.hotswap_from(predecessor).unwrap_err();
    assert!(matches!(err, RouterError::WrongState));
}

#[test]
fn hotswap_pulls_state_from_a_same_named_predecessor_element() {
    let mut predecessor = Router::new(RouterConfig::default());
    predecessor
        .add_element(Box::new(PolarityElement::sink(0)), "worker", "", "")
        .unwrap();
    let mut predecessor_errors = CollectingErrorSink::new();
    predecessor.initialize(&mut predecessor_errors).unwrap();
    let predecessor = Arc::new(predecessor);
    assert_eq!(predecessor.state(), RouterState::Live);

    let trace = Trace::new();
    let mut successor = Router::new(RouterConfig::default());
    successor
        .add_element(Box::new(HotswapElement::new("worker", &trace)), "worker", "", "")
        .unwrap();
    let mut successor_errors = CollectingErrorSink::new();
    successor.initialize(&mut successor_errors).unwrap();

    successor.hotswap_from(predecessor).expect("a live successor can hotswap from a live predecessor");

    assert_eq!(trace.events(), vec!["take_state:from:Sink".to_string()]);
}

#[test]
fn hotswap_is_a_no_op_when_no_predecessor_element_shares_the_name() {
    let mut predecessor = Router::new(RouterConfig::default());
    predecessor
        .add_element(Box::new(PolarityElement::sink(0)), "unrelated", "", "")
        .unwrap();
    let mut predecessor_errors = CollectingErrorSink::new();
    predecessor.initialize(&mut predecessor_errors).unwrap();
    let predecessor = Arc::new(predecessor);

    let trace = Trace::new();
    let mut successor = Router::new(RouterConfig::default());
    successor
        .add_element(Box::new(HotswapElement::new("worker", &trace)), "worker", "", "")
        .unwrap();
    let mut successor_errors = CollectingErrorSink::new();
    successor.initialize(&mut successor_errors).unwrap();

    successor.hotswap_from(predecessor).unwrap();
    assert!(trace.events().is_empty());
}
