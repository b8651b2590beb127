use criterion::{Criterion, black_box, criterion_group, criterion_main};
use piano_listen_core::{DetectionPipeline, DetectorConfig};

fn generate_sine(sample_rate: f64, frequency: f64, sample_count: usize) -> Vec<f32> {
    (0..sample_count)
        .map(|i| (0.5 * (2.0 * std::f64::consts::PI * frequency * i as f64 / sample_rate).sin()) as f32)
        .collect()
}

fn bench_process(c: &mut Criterion) {
    // One block must finish well inside frame_size / sample_rate (~46ms).
    let config = DetectorConfig::default();
    let mut pipeline = DetectionPipeline::with_standard_table(config).unwrap();
    let tone = generate_sine(config.sample_rate as f64, 523.25, config.frame_size);
    let silence = vec![0.0_f32; config.frame_size];

    c.bench_function("process 2048 tone", |b| {
        b.iter(|| pipeline.process(black_box(&tone)).unwrap())
    });
    c.bench_function("process 2048 silence", |b| {
        b.iter(|| pipeline.process(black_box(&silence)).unwrap())
    });
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
