use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use perivis_core::{Phase, Shape, Trial};
use perivis_render::ShapeRenderer;

fn harness() -> (ShapeRenderer, Vec<u8>) {
    let renderer = ShapeRenderer::new(1280, 720);
    let frame = vec![0u8; 4 * 1280 * 720];
    (renderer, frame)
}

pub fn bench_render_frame(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_frame");
    g.sample_size(60);

    g.bench_function("blank", |b| {
        b.iter_batched(
            harness,
            |(mut r, mut frame)| {
                let _ = r.render_frame(black_box(Phase::Blank), None, &mut frame);
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("display_single", |b| {
        b.iter_batched(
            harness,
            |(mut r, mut frame)| {
                let trial = Trial::new(Shape::Star, 135);
                let _ = r.render_frame(black_box(Phase::Display), Some(&trial), &mut frame);
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("display_dual", |b| {
        b.iter_batched(
            harness,
            |(mut r, mut frame)| {
                let mut trial = Trial::new(Shape::Cross, 270);
                trial.fixation_shape = Some(Shape::Triangle);
                let _ = r.render_frame(black_box(Phase::Display), Some(&trial), &mut frame);
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("choice_row", |b| {
        b.iter_batched(
            harness,
            |(mut r, mut frame)| {
                let _ = r.render_frame(black_box(Phase::Choice), None, &mut frame);
            },
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_render_frame);
criterion_main!(benches);
