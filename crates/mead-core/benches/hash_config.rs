use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mead_core::{hash_config, ExclusionKeys};
use serde_json::{json, Map, Value};

fn wide_config(sections: usize) -> Value {
    let mut root = Map::new();
    for idx in (0..sections).rev() {
        root.insert(
            format!("section_{idx:03}"),
            json!({
                "hsz": idx,
                "dropout": 0.5,
                "layers": [{"type": "lstm", "bidirectional": true}, {"type": "crf"}],
                "name": format!("block-{idx}"),
            }),
        );
    }
    root.insert("train".into(), json!({"epochs": 10, "verbose": true, "nsteps": 100}));
    Value::Object(root)
}

fn hash_config_bench(c: &mut Criterion) {
    let config = wide_config(200);
    let keys = ExclusionKeys::default();
    c.bench_function("hash_config_200_sections", |b| {
        b.iter(|| {
            let fingerprint = hash_config(black_box(&config), &keys).unwrap();
            black_box(fingerprint);
        });
    });
}

criterion_group!(benches, hash_config_bench);
criterion_main!(benches);
