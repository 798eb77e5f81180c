//! Benchmarks for the sequential and parallel field engines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use efield_core::{
    Charge, ElectricField, LineCharge, ParallelElectricField, PointCharge, PointChargeFlatland,
    SequentialElectricField, ViewportConfig,
};

fn charges() -> Vec<Charge> {
    vec![
        PointChargeFlatland::new(2.0, [0.0, 0.0]).into(),
        PointCharge::new(-1.0, [2.0, 1.0]).into(),
        LineCharge::new(1.0, [-1.0, -2.0], [-1.0, 2.0]).into(),
    ]
}

fn viewport(resolution: usize) -> ViewportConfig {
    ViewportConfig {
        x_min: -40.0,
        x_max: 40.0,
        x_offset: 2.0,
        y_min: -30.0,
        y_max: 30.0,
        y_offset: 0.0,
        zoom: 6.0,
        elements_between_limits: resolution,
    }
}

fn bench_engines(c: &mut Criterion) {
    for resolution in [100, 200, 400] {
        let grid = viewport(resolution).sample_grid().unwrap();
        let cells = resolution * resolution * charges().len();

        let mut group = c.benchmark_group(format!("field_{}x{}", resolution, resolution));
        group.throughput(Throughput::Elements(cells as u64));
        group.sample_size(20);

        group.bench_function("sequential", |b| {
            let engine = SequentialElectricField::new(grid.clone(), charges()).unwrap();
            b.iter(|| black_box(engine.calculate().unwrap()));
        });

        // Speedup should grow with the budget, then flatten past the core count
        let mut engine = ParallelElectricField::new(grid.clone(), charges()).unwrap();
        for cores in [1, 4, 16, 64, 256, 1024] {
            engine.set_number_of_cores(cores).unwrap();
            group.bench_with_input(BenchmarkId::new("parallel", cores), &cores, |b, _| {
                b.iter(|| black_box(engine.calculate().unwrap()));
            });
        }

        group.finish();
    }
}

criterion_group!(benches, bench_engines);
criterion_main!(benches);
