use criterion::{criterion_group, criterion_main, Criterion};
use music_model_core::{
    Attribute, Builder, Entity, EntityQuery, Interval, MetricalDuration, Model, Path, Pitch, Scope,
};

fn mk_model(size: u64) -> Model {
    let mut builder = Builder::new();
    for index in 0..size {
        let lower = MetricalDuration::new(index, 16);
        let upper = MetricalDuration::new(index + 1 + index % 4, 16);
        let interval = match Interval::new(lower, upper) {
            Ok(interval) => interval,
            Err(err) => panic!("benchmark interval should be valid: {err}"),
        };
        let performer = if index % 2 == 0 { "P" } else { "Q" };
        let instrument = if index % 3 == 0 { "I" } else { "J" };
        let path = Path::new(performer, instrument, 0);
        let (attribute, kind) = if index % 5 == 0 {
            (Attribute::Text("accent".to_string()), "articulation")
        } else {
            #[allow(clippy::cast_precision_loss)]
            let note_number = 48.0 + (index % 24) as f64;
            (Attribute::Pitch(Pitch::new(note_number)), "pitch")
        };
        if let Err(err) = builder.add(attribute, kind, Entity::new(interval, path)) {
            panic!("benchmark fixture should build: {err}");
        }
    }
    builder.build()
}

fn window(lower: u64, upper: u64) -> Interval {
    match Interval::new(MetricalDuration::new(lower, 16), MetricalDuration::new(upper, 16)) {
        Ok(interval) => interval,
        Err(err) => panic!("benchmark window should be valid: {err}"),
    }
}

fn bench_interval_query(c: &mut Criterion) {
    let model = mk_model(10_000);
    let query = EntityQuery::new(window(2_000, 4_000));

    c.bench_function("interval_query_10000_entities", |b| {
        b.iter(|| {
            let matched = model.entities(&query);
            if matched.is_empty() {
                panic!("interval benchmark query matched nothing");
            }
        });
    });
}

fn bench_scoped_kind_query(c: &mut Criterion) {
    let model = mk_model(10_000);
    let query = EntityQuery::new(window(0, 10_000))
        .performed_by(Scope::instrument("P", "I"))
        .including(["pitch"]);

    c.bench_function("scoped_kind_query_10000_entities", |b| {
        b.iter(|| {
            let matched = model.entities(&query);
            if matched.is_empty() {
                panic!("scoped benchmark query matched nothing");
            }
        });
    });
}

criterion_group!(query_benches, bench_interval_query, bench_scoped_kind_query);
criterion_main!(query_benches);
