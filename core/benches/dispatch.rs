//! Dispatch benchmarks: pattern resolution and full-document processing.
//!
//! Measures: exact vs. wildcard lookup, registry size scaling, event-stream
//! processing with object creation, and trace overhead.

use std::sync::Arc;

use trellis::prelude::*;
use trellis::rules::{CallMethod, ObjectCreate, SetNext};

fn main() {
    divan::main();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
struct Item {
    name: String,
}
impl BeanType for Item {
    const TYPE_NAME: &'static str = "bench.Item";
}

#[derive(Debug, Default)]
struct List {
    items: Vec<Item>,
}
impl BeanType for List {
    const TYPE_NAME: &'static str = "bench.List";
}

#[derive(Debug)]
struct Noop;
impl Rule for Noop {}

fn resolver() -> Arc<ClassResolver> {
    Arc::new(
        ClassResolverBuilder::new()
            .class(
                ClassBuilder::<Item>::new()
                    .default_constructor()
                    .method("setName", |i: &mut Item, name: String| i.name = name)
                    .build(),
            )
            .class(
                ClassBuilder::<List>::new()
                    .default_constructor()
                    .method("addItem", |l: &mut List, Child(item): Child<Item>| {
                        l.items.push(item)
                    })
                    .build(),
            )
            .build(),
    )
}

fn list_rules() -> Arc<PatternRegistry> {
    let mut rules = PatternRegistry::new();
    rules.add("list", ObjectCreate::new("bench.List"));
    rules.add("list/item", ObjectCreate::new("bench.Item"));
    rules.add("list/item", SetNext::new("addItem", "bench.Item"));
    rules.add("list/item/name", CallMethod::new("setName", 0));
    Arc::new(rules)
}

fn list_events(n: usize) -> Vec<Event> {
    let mut events = vec![Event::start("list")];
    for i in 0..n {
        events.push(Event::start("item"));
        events.push(Event::start("name"));
        events.push(Event::text(&format!("item-{i}")));
        events.push(Event::end("name"));
        events.push(Event::end("item"));
    }
    events.push(Event::end("list"));
    events
}

fn wide_registry(n: usize) -> PatternRegistry {
    let mut rules = PatternRegistry::new();
    for i in 0..n {
        rules.add(&format!("root/section-{i}/entry"), Noop);
        rules.add(&format!("*/suffix-{i}"), Noop);
        rules.add(&format!("root/prefix-{i}/*"), Noop);
    }
    rules
}

// ═══════════════════════════════════════════════════════════════════════════════
// Pattern resolution
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 100, 1000])]
fn match_exact(bencher: divan::Bencher, n: usize) {
    let rules = wide_registry(n);
    let path = format!("root/section-{}/entry", n / 2);
    bencher.bench_local(|| rules.match_path(divan::black_box(&path), None));
}

#[divan::bench(args = [10, 100, 1000])]
fn match_suffix(bencher: divan::Bencher, n: usize) {
    let rules = wide_registry(n);
    let path = format!("root/a/b/suffix-{}", n / 2);
    bencher.bench_local(|| rules.match_path(divan::black_box(&path), None));
}

#[divan::bench(args = [10, 100, 1000])]
fn match_prefix(bencher: divan::Bencher, n: usize) {
    let rules = wide_registry(n);
    let path = format!("root/prefix-{}/x/y", n / 2);
    bencher.bench_local(|| rules.match_path(divan::black_box(&path), None));
}

#[divan::bench(args = [10, 100, 1000])]
fn match_miss(bencher: divan::Bencher, n: usize) {
    let rules = wide_registry(n);
    bencher.bench_local(|| rules.match_path(divan::black_box("other/path/here"), None));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Document processing
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 100, 1000])]
fn parse_events(bencher: divan::Bencher, n: usize) {
    let rules = list_rules();
    let resolver = resolver();
    bencher
        .with_inputs(|| list_events(n))
        .bench_local_values(|events| {
            let mut digester = Digester::new(Arc::clone(&rules), Arc::clone(&resolver));
            digester.parse_events(events)
        });
}

#[divan::bench(args = [10, 100, 1000])]
fn parse_events_traced(bencher: divan::Bencher, n: usize) {
    let rules = list_rules();
    let resolver = resolver();
    bencher
        .with_inputs(|| list_events(n))
        .bench_local_values(|events| {
            let mut digester = Digester::new(Arc::clone(&rules), Arc::clone(&resolver));
            digester.enable_trace();
            digester.parse_events(events)
        });
}

#[divan::bench(args = [10, 100, 1000])]
fn parse_xml(bencher: divan::Bencher, n: usize) {
    let rules = list_rules();
    let resolver = resolver();
    let mut xml = String::from("<list>");
    for i in 0..n {
        xml.push_str(&format!("<item><name>item-{i}</name></item>"));
    }
    xml.push_str("</list>");
    bencher.bench_local(|| {
        let mut digester = Digester::new(Arc::clone(&rules), Arc::clone(&resolver));
        digester.parse_str(divan::black_box(&xml))
    });
}
