use bacsim::prelude::*;
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn increase_benchmark(c: &mut Criterion) {
    let table = BacTable::embedded().unwrap();
    let poly = Polynomial::fallback();

    c.bench_function("BacTable lookup", |b| {
        b.iter(|| table.increase(black_box(2.3), black_box(163.0)))
    });

    c.bench_function("Polynomial evaluate", |b| {
        b.iter(|| poly.increase(black_box(2.3), black_box(163.0)))
    });

    c.bench_function("Polynomial fit", |b| {
        b.iter(|| Polynomial::fit(black_box(&table), 3))
    });
}

fn session_benchmark(c: &mut Criterion) {
    let model = BacConfig::default().build().unwrap();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
    let beer = Drink::new("lager", 12.0, 5.0);

    c.bench_function("Person 100 drinks", |b| {
        b.iter(|| {
            let mut person = Person::new("bench", 30, 170.0, &model).starting_at(start);
            for i in 0..100 {
                person
                    .record_drink(&beer, Some(start + Duration::minutes(20 * i)))
                    .unwrap();
            }
            black_box(person.current_bac());
        })
    });
}

criterion_group!(benches, increase_benchmark, session_benchmark);
criterion_main!(benches);
