use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vhs_pipeline::{video::Frame, FramePipeline, Preset};

fn test_frame(width: u32, height: u32) -> Frame {
    let mut frame = Frame::new_black(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = ((x ^ y) & 0xff) as u8;
            frame.set_pixel(x, y, [v, v / 2, 255 - v, 255]);
        }
    }
    frame
}

fn bench_process_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_frame");
    let frame = test_frame(640, 480);

    for preset in Preset::ALL {
        let mut pipeline = FramePipeline::seeded(&preset.settings(), 42);
        group.bench_with_input(BenchmarkId::from_parameter(preset), &frame, |b, frame| {
            b.iter(|| pipeline.process_frame(black_box(frame.clone())))
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let settings = Preset::Degraded.settings();
    c.bench_function("compile_filter_graph", |b| {
        b.iter(|| vhs_pipeline::compile(black_box(&settings)))
    });
}

criterion_group!(benches, bench_process_frame, bench_compile);
criterion_main!(benches);
