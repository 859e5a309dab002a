use criterion::{black_box, criterion_group, criterion_main, Criterion};
use facade_ast::Node;
use facade_evaluator::Evaluator;
use facade_runtime::{Runtime, Value};
use serde_json::json;

fn list_template() -> Node {
    Node::tag("ul").with_children(vec![Node::each(
        "items",
        "item",
        Some("index"),
        Node::block(vec![Node::tag("li")
            .with_attr("class", "index % 2 ? 'odd' : 'even'")
            .with_attr("[title]", "item.title")
            .with_children(vec![Node::code("item.title", true, true)])]),
    )])
}

fn evaluate_list(c: &mut Criterion) {
    let template = list_template();
    let items: Vec<_> = (0..100).map(|i| json!({ "title": format!("Item {}", i) })).collect();
    let globals = match Value::from(json!({ "items": items })) {
        Value::Map(map) => map,
        _ => unreachable!(),
    };

    let runtime = Runtime::virtual_dom();
    let evaluator = Evaluator::new(&runtime);

    c.bench_function("evaluate_list", |b| {
        b.iter(|| evaluator.render(black_box(&template), globals.clone()))
    });
}

fn evaluate_simple_tag(c: &mut Criterion) {
    let template = Node::tag("button")
        .with_attr("class", "'primary'")
        .with_children(vec![Node::text("Click me")]);

    let runtime = Runtime::virtual_dom();
    let evaluator = Evaluator::new(&runtime);

    c.bench_function("evaluate_simple_tag", |b| {
        b.iter(|| evaluator.render(black_box(&template), Default::default()))
    });
}

criterion_group!(benches, evaluate_simple_tag, evaluate_list);
criterion_main!(benches);
