use std::{sync::Arc, time::Duration};

use cgmath::{Deg, Point3, Vector3};
use voxel_world::{
    Aabb, BlockSide, BlockType, Camera, ChunkCoordinate, ChunkRenderer, FlatGenerator, Frustum,
    MeshData, Projection, Voxel, VoxelPosition, VoxelTypeRegistry, World, WorldConfig,
};

fn world(height_chunks: i32) -> World {
    World::new(
        WorldConfig {
            world_height_chunks: height_chunks,
            worker_threads: 2,
            mesh_builds_per_frame: -1,
            mesh_uploads_per_frame: -1,
            ..WorldConfig::default()
        },
        Arc::new(VoxelTypeRegistry::builtin()),
        Arc::new(FlatGenerator::new(3, BlockType::STONE.id())),
        None,
    )
    .unwrap()
}

fn settle(world: &World) {
    for _ in 0..64 {
        if world.all_chunks_ready() {
            return;
        }
        world.update();
    }
    panic!("world did not become ready: {:?}", world.stats());
}

#[derive(Default)]
struct RecordingRenderer {
    uploaded: Vec<ChunkCoordinate>,
    drawn: Vec<ChunkCoordinate>,
    released: Vec<ChunkCoordinate>,
}

impl ChunkRenderer for RecordingRenderer {
    fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &MeshData) {
        assert!(!mesh.is_empty());
        self.uploaded.push(coordinate);
    }

    fn draw(&mut self, coordinate: ChunkCoordinate) {
        self.drawn.push(coordinate);
    }

    fn release(&mut self, coordinate: ChunkCoordinate) {
        self.released.push(coordinate);
    }
}

#[test]
fn flat_chunk_get_and_set() {
    let world = world(1);
    world
        .generate_chunk_blocking(ChunkCoordinate::new(0, 0, 0))
        .unwrap();

    for y in 0..16 {
        let voxel = world.get_voxel(VoxelPosition::new(7, y, 9));
        assert_eq!(voxel.is_some(), y < 3, "y = {}", y);
    }

    let dirt = Voxel::new(BlockType::DIRT.id());
    assert_eq!(
        world
            .set_voxel(VoxelPosition::new(0, 4, 0), Some(dirt.clone()))
            .unwrap(),
        None
    );
    assert_eq!(world.get_voxel(VoxelPosition::new(0, 4, 0)), Some(dirt));
    assert_eq!(world.get_voxel(VoxelPosition::new(0, 5, 0)), None);
    // Neighboring chunks were never generated.
    assert_eq!(world.get_voxel(VoxelPosition::new(-1, 0, 0)), None);
}

#[test]
fn raycast_respects_max_distance() {
    let world = world(1);
    world
        .generate_chunk_blocking(ChunkCoordinate::new(0, 0, 0))
        .unwrap();
    let down = Vector3::new(0.0, -1.0, 0.0);

    assert!(world.pick(Point3::new(0.0, 5.0, 0.0), down, 2.0).is_none());
    let hit = world.pick(Point3::new(0.0, 5.0, 0.0), down, 3.0).unwrap();
    assert_eq!(hit.voxel, VoxelPosition::new(0, 2, 0));

    let hit = world.pick(Point3::new(4.5, 5.0, 4.5), down, 3.0).unwrap();
    assert_eq!(hit.voxel, VoxelPosition::new(4, 2, 4));
    assert_eq!(hit.face, BlockSide::TOP);
    assert_eq!(hit.adjacent(), VoxelPosition::new(4, 3, 4));
}

#[test]
fn ungenerated_space_collides() {
    let world = world(1);
    let body = |x: f32, y: f32, z: f32| {
        Aabb::from_center(Point3::new(x, y, z), Vector3::new(0.3, 0.9, 0.3))
    };

    let collision = world.collision_check(&body(5.0, 8.0, 5.0)).unwrap();
    assert!(collision.is_fail_safe());

    world
        .generate_chunk_blocking(ChunkCoordinate::new(0, 0, 0))
        .unwrap();
    assert!(!world.intersects(&body(5.0, 8.0, 5.0)));

    let collision = world.collision_check(&body(5.0, 3.5, 5.0)).unwrap();
    assert!(!collision.is_fail_safe());
    assert_eq!(collision.voxel.y, 2);

    // Below the world is solid, open sky above it is not.
    assert!(world.collision_check(&body(5.0, -4.0, 5.0)).unwrap().is_fail_safe());
    assert!(!world.intersects(&body(5.0, 40.0, 5.0)));
}

#[test]
fn generate_around_and_settle() {
    let world = world(2);
    let center = Point3::new(8.0, 8.0, 8.0);
    assert_eq!(world.generate_chunks_around(center, 1), 10);
    assert_eq!(world.generate_chunks_around(center, 1), 0);
    assert!(world.wait_until_idle_timeout(Duration::from_secs(10)));

    let stats = world.stats();
    assert_eq!(stats.loaded, 10);
    assert_eq!(stats.pending_generation, 0);
    assert!(!world.all_chunks_ready());

    settle(&world);
    assert_eq!(world.stats().ready, 10);
    assert!(world
        .loaded_chunks()
        .iter()
        .all(|c| (0..2).contains(&c.y)));
}

#[test]
fn render_culls_and_releases_evicted_chunks() {
    let world = world(1);
    let near = ChunkCoordinate::new(0, 0, 0);
    let far = ChunkCoordinate::new(12, 0, 0);
    world.generate_chunk_blocking(near).unwrap();
    world.generate_chunk_blocking(far).unwrap();
    settle(&world);

    let camera = Camera::new((8.0, 100.0, 8.0), Deg(0.0), Deg(-89.0));
    let projection = Projection::new(800, 800, Deg(90.0), 0.1, 500.0);
    let frustum = Frustum::from_camera(&camera, &projection);

    let mut renderer = RecordingRenderer::default();
    let stats = world.render(&frustum, &mut renderer);
    assert_eq!(stats.uploaded, 2);
    assert_eq!(stats.drawn, 1);
    assert_eq!(stats.culled, 1);
    assert_eq!(renderer.drawn, vec![near]);

    // Already uploaded meshes are not uploaded again.
    let stats = world.render(&frustum, &mut renderer);
    assert_eq!(stats.uploaded, 0);

    assert_eq!(world.cleanup(&[Point3::new(8.0, 8.0, 8.0)], 2.0), 1);
    assert!(world.chunk(far).is_none());
    let stats = world.render(&frustum, &mut renderer);
    assert_eq!(stats.released, 1);
    assert_eq!(renderer.released, vec![far]);
    assert_eq!(world.render(&frustum, &mut renderer).released, 0);
}

#[test]
fn edits_make_the_world_not_ready_until_updated() {
    let world = world(1);
    world
        .generate_chunk_blocking(ChunkCoordinate::new(0, 0, 0))
        .unwrap();
    settle(&world);

    world
        .set_voxel(VoxelPosition::new(3, 3, 3), Some(Voxel::new(BlockType::WOOD.id())))
        .unwrap();
    assert!(!world.all_chunks_ready());
    let report = world.update();
    assert_eq!(report.lit, 1);
    assert_eq!(report.meshes_built, 1);
    assert!(world.all_chunks_ready());
}
