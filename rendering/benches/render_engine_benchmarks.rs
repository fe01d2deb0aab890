use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use lantern_ecs::hierarchy::set_parent;
use lantern_ecs::{Entity, World};
use lantern_rendering::{
    ClampNestedScissorViews, ComponentSnapshot, HeadlessBackend, IsDestination, IsMaterial,
    IsMesh, IsRenderer, IsShader, IsViewport, LayerMask, RenderEngine, RendererScissor,
    ScissorRect, SurfaceHandle, SurfaceInUse, register_rendering_components, sort_by_combination,
};

/// One destination with two viewports and `renderers` renderers spread over
/// sixteen materials and eight meshes.
fn scene(renderers: usize) -> World {
    let mut world = World::new();
    register_rendering_components(&mut world);

    let destination = world.spawn();
    world
        .insert(destination, IsDestination::new(HeadlessBackend::LABEL, 1920, 1080))
        .unwrap();
    world.insert(destination, SurfaceInUse(SurfaceHandle(1))).unwrap();

    for (order, mask) in [(0, LayerMask::layer(0)), (1, LayerMask::layer(1))] {
        let viewport = world.spawn();
        let rint = world.add_reference(viewport, destination);
        world
            .insert(
                viewport,
                IsViewport {
                    destination: rint,
                    render_mask: mask,
                    order,
                },
            )
            .unwrap();
    }

    let shader = world.spawn();
    world.insert(shader, IsShader { version: 1 }).unwrap();
    let materials: Vec<Entity> = (0..16)
        .map(|i| {
            let material = world.spawn();
            let vs = world.add_reference(material, shader);
            let fs = world.add_reference(material, shader);
            world
                .insert(
                    material,
                    IsMaterial {
                        render_group: (i % 4) as i8,
                        vertex_shader: vs,
                        fragment_shader: fs,
                    },
                )
                .unwrap();
            material
        })
        .collect();
    let meshes: Vec<Entity> = (0..8)
        .map(|i| {
            let mesh = world.spawn();
            world.insert(mesh, IsMesh { version: i }).unwrap();
            mesh
        })
        .collect();

    for i in 0..renderers {
        let renderer = world.spawn();
        let material = world.add_reference(renderer, materials[i % materials.len()]);
        let mesh = world.add_reference(renderer, meshes[i % meshes.len()]);
        world
            .insert(
                renderer,
                IsRenderer {
                    render_mask: LayerMask::layer((i % 2) as u32),
                    material,
                    mesh,
                },
            )
            .unwrap();
    }
    world
}

// ---------------------------------------------------------------------------
// Engine tick
// ---------------------------------------------------------------------------

fn bench_engine_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_tick");
    for renderers in [1_000, 10_000] {
        let mut world = scene(renderers);
        let mut engine = RenderEngine::new();
        engine.register_backend(HeadlessBackend::default()).unwrap();
        engine.update(&mut world).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(renderers), &renderers, |b, _| {
            b.iter(|| engine.update(black_box(&mut world)).unwrap());
        });
    }
    group.finish();
}

fn bench_engine_tick_with_sort_plugin(c: &mut Criterion) {
    let mut world = scene(10_000);
    let mut engine = RenderEngine::new();
    engine.register_backend(HeadlessBackend::default()).unwrap();
    engine.add_plugin(sort_by_combination);
    engine.update(&mut world).unwrap();

    c.bench_function("engine_tick_sorted_10k", |b| {
        b.iter(|| engine.update(black_box(&mut world)).unwrap());
    });
}

fn bench_snapshot_rebuild(c: &mut Criterion) {
    let world = scene(10_000);
    let mut snapshot = ComponentSnapshot::new();
    c.bench_function("snapshot_rebuild_10k", |b| {
        b.iter(|| snapshot.rebuild(black_box(&world)).unwrap());
    });
}

// ---------------------------------------------------------------------------
// Scissor clamping
// ---------------------------------------------------------------------------

fn bench_scissor_deep_chain(c: &mut Criterion) {
    let mut world = World::new();
    register_rendering_components(&mut world);
    let mut parent: Option<Entity> = None;
    for i in 0..256 {
        let entity = world.spawn();
        let offset = i as f32;
        world
            .insert(
                entity,
                RendererScissor(ScissorRect::new(offset, offset, 1024.0, 1024.0)),
            )
            .unwrap();
        if let Some(parent) = parent {
            set_parent(&mut world, entity, parent);
        }
        parent = Some(entity);
    }

    let mut system = ClampNestedScissorViews::new();
    c.bench_function("scissor_deep_chain_256", |b| {
        b.iter(|| system.update(black_box(&mut world)).unwrap());
    });
}

fn bench_scissor_wide_tree(c: &mut Criterion) {
    let mut world = World::new();
    register_rendering_components(&mut world);
    let root = world.spawn();
    world
        .insert(root, RendererScissor(ScissorRect::new(0.0, 0.0, 1920.0, 1080.0)))
        .unwrap();
    for i in 0..10_000 {
        let entity = world.spawn();
        let x = (i % 100) as f32 * 20.0;
        let y = (i / 100) as f32 * 11.0;
        world
            .insert(entity, RendererScissor(ScissorRect::new(x, y, 40.0, 40.0)))
            .unwrap();
        set_parent(&mut world, entity, root);
    }

    let mut system = ClampNestedScissorViews::new();
    c.bench_function("scissor_wide_tree_10k", |b| {
        b.iter(|| system.update(black_box(&mut world)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_engine_tick,
    bench_engine_tick_with_sort_plugin,
    bench_snapshot_rebuild,
    bench_scissor_deep_chain,
    bench_scissor_wide_tree,
);

criterion_main!(benches);
