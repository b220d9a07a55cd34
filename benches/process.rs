//! Benchmark: parameter expansion alone versus a full processing cycle
//! (expand, bind, validate, extract) on a medium registration form, plus
//! the redisplay projection on an already-processed form.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use formtree::{expand, Constraint, FieldSpec, FlatParams, Form, FormSpec, Submission, Value};

/// A registration-style form: scalars, one compound, one repeatable.
fn build_form() -> Form {
    Form::build(FormSpec::new(vec![
        FieldSpec::text("username").required().check(Constraint::Length {
            min: Some(3),
            max: Some(32),
        }),
        FieldSpec::text("email").required(),
        FieldSpec::integer("age").check(Constraint::Range {
            min: Some(13),
            max: Some(130),
        }),
        FieldSpec::boolean("newsletter"),
        FieldSpec::compound(
            "address",
            vec![
                FieldSpec::text("street"),
                FieldSpec::text("city"),
                FieldSpec::text("zip"),
            ],
        ),
        FieldSpec::repeatable("interests", FieldSpec::text("interest")),
    ]))
    .expect("build")
}

fn build_params() -> FlatParams {
    let mut params = FlatParams::new();
    params.insert("username".to_string(), Value::from("ada_lovelace"));
    params.insert("email".to_string(), Value::from("ada@example.com"));
    params.insert("age".to_string(), Value::from("36"));
    params.insert("newsletter".to_string(), Value::from("on"));
    params.insert(
        "address.street".to_string(),
        Value::from("12 St James Square"),
    );
    params.insert("address.city".to_string(), Value::from("London"));
    params.insert("address.zip".to_string(), Value::from("SW1Y 4JH"));
    for i in 0..8 {
        params.insert(format!("interests.{}", i), Value::from(format!("topic-{}", i)));
    }
    params
}

fn bench_process(c: &mut Criterion) {
    let params = build_params();

    let mut warmup = build_form();
    let ok = warmup
        .process(Submission::new().flat(params.clone()))
        .expect("process");
    eprintln!(
        "process bench: {} flat params, valid={} (one warm-up pass)",
        params.len(),
        ok
    );

    c.bench_function("expand_flat_params", |b| {
        b.iter(|| {
            let nested = expand(black_box(&params)).expect("expand");
            black_box(nested)
        });
    });

    c.bench_function("process_full_cycle", |b| {
        let mut form = build_form();
        b.iter(|| {
            let ok = form
                .process(Submission::new().flat(params.clone()))
                .expect("process");
            black_box(ok)
        });
    });

    c.bench_function("fill_in_form", |b| {
        let mut form = build_form();
        form.process(Submission::new().flat(params.clone()))
            .expect("process");
        b.iter(|| black_box(form.fif()));
    });
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
