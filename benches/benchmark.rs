use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use gumshoe::engine::{interpret, Engine};
use gumshoe::normalize::normalize;
use gumshoe::persist::{PersistenceMode, Persistor};
use gumshoe::settings::{Limits, Settings};

const QUERIES: [&str; 6] = [
    "db.getCollectionNames()",
    "db.crime.find({}, {})",
    "db.person.find({name: /^Jer/i, age: {$gt: 30}}, {name: 1}).sort({\"age\": -1}).limit(5)",
    "db.person.distinct('address.city')",
    "db.interview.count()",
    "db.solution.find({\"name\": \"Jeremy Bowers\"})",
];

fn interpretation(c: &mut Criterion) {
    let limits = Limits::default();
    c.bench_function("interpret queries", |b| {
        b.iter(|| {
            for query in QUERIES {
                let _ = black_box(interpret(Some(black_box(query)), &limits));
            }
        })
    });
    c.bench_function("normalize shell literal", |b| {
        b.iter(|| normalize(black_box("{ name: /bowers$/i, \"address.city\": \"SQL City\", age: { $gte: 30 } }")).len())
    });
}

fn evaluation(c: &mut Criterion) {
    let store = Persistor::new(PersistenceMode::InMemory).expect("store");
    let people: Vec<String> = (0..500)
        .map(|i| format!(r#"{{"_id": "p{i}", "name": "Person {i}", "age": {}}}"#, 18 + i % 60))
        .collect();
    store
        .seed_from_str(&format!(r#"{{"person": [{}]}}"#, people.join(",")))
        .expect("seed");
    let settings = Settings::default();
    let engine = Engine::new(&store, &settings);
    c.bench_function("evaluate find over 500 people", |b| {
        b.iter(|| {
            engine
                .evaluate(Some(black_box("db.person.find({age: {$gte: 40}}).sort({\"age\": 1}).limit(10)")))
                .map(|_| ())
        })
    });
}

criterion_group!(benches, interpretation, evaluation);
criterion_main!(benches);
