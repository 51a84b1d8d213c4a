// benches/generation.rs - Carving, indexing and lidar throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use maze_car_sim::animation::{Heading, Vec3};
use maze_car_sim::config::LayoutConfig;
use maze_car_sim::lidar::{LidarPointConfig, SensorModel, WallGridRaycaster};
use maze_car_sim::maze::{carver, Maze};
use maze_car_sim::{GridPos, MazeConfig};

fn maze_config(chunk_size: i32, chunks: i32) -> MazeConfig {
    MazeConfig {
        chunk_size,
        size_in_chunks: GridPos::new(chunks, chunks),
        seed: Some(7),
        ..MazeConfig::default()
    }
}

fn bench_carve(c: &mut Criterion) {
    let mut group = c.benchmark_group("carve");
    for (chunk_size, chunks) in [(4, 3), (10, 3), (16, 4)] {
        let config = maze_config(chunk_size, chunks);
        let cells = config.total_cells();
        group.bench_with_input(BenchmarkId::from_parameter(cells), &config, |b, config| {
            b.iter(|| carver::generate(black_box(config)))
        });
    }
    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let config = maze_config(10, 3);
    let data = carver::generate(&config).expect("generation");
    c.bench_function("index_900_cells", |b| {
        b.iter(|| Maze::index(black_box(data.clone()), LayoutConfig::default(), 7))
    });
}

fn bench_lidar(c: &mut Criterion) {
    let maze = Maze::generate(&maze_config(10, 3), LayoutConfig::default()).expect("generation");
    let caster = WallGridRaycaster::new(&maze);
    let mut sensors = SensorModel::new(&[LidarPointConfig::default()]);
    let origin = maze.node(GridPos::new(15, 15)).expect("node").world + Vec3::new(0.0, 0.5, 0.0);

    c.bench_function("lidar_scan_default_point", |b| {
        b.iter(|| sensors.scan(&caster, black_box(origin), Heading::new(0.0)))
    });
}

criterion_group!(benches, bench_carve, bench_index, bench_lidar);
criterion_main!(benches);
