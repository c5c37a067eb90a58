//! Headless physics stress harness
//!
//! Drops a swarm of random dynamic bodies onto a floor slab and times the
//! full simulation step at increasing object counts. Useful for eyeballing
//! broad-phase scaling and for comparing a compute backend against the
//! CPU path with identical scenes (fixed RNG seed, fixed timestep).
//!
//! Run with `RUST_LOG=debug` to see the world's object-count milestones.

use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scene_engine::config::PhysicsConfig;
use scene_engine::foundation::math::Vec3;
use scene_engine::scene::components::{BoxCollider, Rigidbody, SphereCollider};
use scene_engine::{Component, PhysicsWorld, Scene};

const STEPS: usize = 120;
const SEED: u64 = 42;

fn main() {
    env_logger::init();

    let config = PhysicsConfig::default();
    info!(
        "stress: gravity {:?}, timestep {:.4}s, {} steps per scenario",
        config.gravity, config.timestep, STEPS
    );

    for &count in &[100, 250, 500, 1000, 2000] {
        run_scenario(&config, count);
    }
}

fn run_scenario(config: &PhysicsConfig, count: usize) {
    let mut scene = Scene::new();
    let mut world = PhysicsWorld::with_gravity(config.gravity);

    let floor = scene.spawn("floor");
    {
        let object = scene.get_mut(floor).expect("just spawned");
        object.transform.position = Vec3::new(0.0, -0.5, 0.0);
        object.attach(Component::Collider(
            BoxCollider::new(Vec3::new(400.0, 1.0, 400.0)).into(),
        ));
    }
    world.add_object(&scene, floor);

    // Spawn volume grows with count to keep density roughly constant
    let mut rng = StdRng::seed_from_u64(SEED);
    let spread = 50.0 + count as f32 / 100.0;

    for i in 0..count {
        let id = scene.spawn(&format!("body-{i}"));
        let object = scene.get_mut(id).expect("just spawned");
        object.transform.position = Vec3::new(
            rng.gen_range(-spread..spread) * 0.5,
            rng.gen_range(5.0..25.0),
            rng.gen_range(-spread..spread) * 0.5,
        );
        if i % 2 == 0 {
            let side = rng.gen_range(0.5..1.0);
            object.attach(Component::Collider(
                BoxCollider::new(Vec3::new(side, side, side)).into(),
            ));
        } else {
            object.attach(Component::Collider(
                SphereCollider::new(rng.gen_range(0.25..0.5)).into(),
            ));
        }
        object.attach(Component::Rigidbody(Rigidbody::default()));
        world.add_object(&scene, id);
    }

    let start = Instant::now();
    for _ in 0..STEPS {
        world.update(&mut scene, config.timestep);
    }
    let elapsed = start.elapsed();
    let contact_events = world.drain_contact_events().len();

    // Sanity probe: a straight-down ray must find the floor or a body
    let hit = world.raycast(
        &scene,
        Vec3::new(0.0, 100.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        500.0,
    );
    assert!(hit.is_some(), "downward ray found nothing over the floor");

    println!(
        "{count:5} bodies: {STEPS} steps in {:8.2?} ({:6.3} ms/step) | {contact_events:5} contact events",
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / STEPS as f64,
    );
}
