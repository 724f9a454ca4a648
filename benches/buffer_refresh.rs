use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use liquidfun_bind::{ParticleGroupDef, ParticleSystemDef, PolygonShape, World};

fn filled_world(half_extent: f32) -> (World, liquidfun_bind::ParticleSystemHandle) {
    let mut world = World::new();
    let handle = world
        .create_particle_system(&ParticleSystemDef::with_radius(0.05))
        .unwrap();
    let block = ParticleGroupDef::from_shape(PolygonShape::new_box(half_extent, half_extent));
    world
        .particle_system(handle)
        .unwrap()
        .create_particle_group(&block)
        .unwrap();
    (world, handle)
}

fn bench_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_buffers");

    for half_extent in [1.0f32, 2.0, 4.0] {
        let (mut world, handle) = filled_world(half_extent);
        let count = world.particle_system(handle).unwrap().get_particle_count().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let mut system = world.particle_system(handle).unwrap();
                system.refresh_buffers().unwrap();
                black_box(system.position_buffer(false).unwrap().len());
            })
        });
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let (mut world, _) = filled_world(2.0);
    c.bench_function("step_filled_box", |b| {
        b.iter(|| world.step(black_box(1.0 / 60.0)).unwrap())
    });
}

criterion_group!(benches, bench_refresh, bench_step);
criterion_main!(benches);
