//! Frame pipeline driven through the recording context.

use playground_tracer::gpu::{
    dispatch_groups, Command, FramePipeline, GpuRecord, KernelProvider, RecordingContext,
};
use playground_tracer::scene::{CameraDesc, Material, MaterialKind, SceneModel, Sphere, MAX_SPHERES};
use playground_tracer::{Error, RaytracerProperties, Vector3};

fn pipeline(ctx: &mut RecordingContext, width: u32, height: u32) -> FramePipeline<RecordingContext> {
    FramePipeline::new(ctx, &KernelProvider::embedded(), width, height).unwrap()
}

/// Frame counter the kernel saw in the last recorded properties upload.
fn uploaded_frame_count(ctx: &RecordingContext) -> u32 {
    ctx.commands()
        .iter()
        .rev()
        .find_map(|c| match c {
            Command::WriteBuffer { label, bytes } if label == "properties" => {
                Some(RaytracerProperties::decode(bytes).unwrap().frame_count)
            }
            _ => None,
        })
        .expect("no properties upload recorded")
}

fn eleven_sphere_scene(width: u32, height: u32) -> SceneModel {
    let mut scene = SceneModel::new(width, height, CameraDesc::default());
    for i in 0..11 {
        let x = i as f32 * 0.3 - 1.5;
        let material = match i % 3 {
            0 => Material::emissive(Vector3::splat(4.0)),
            1 => Material::lambertian(Vector3::new(0.7, 0.3, 0.3)),
            _ => Material::metal(Vector3::splat(0.8), 0.2),
        };
        scene.push(Sphere::new(Vector3::new(x, 0.0, -1.0), 0.25), material).unwrap();
    }
    scene
}

#[test]
fn frame_submits_in_program_order() {
    let mut ctx = RecordingContext::new();
    let mut scene = SceneModel::playground(640, 480);
    let mut pipeline = pipeline(&mut ctx, 640, 480);
    ctx.clear_commands();

    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");

    let kinds: Vec<&str> = ctx
        .commands()
        .iter()
        .map(|c| match c {
            Command::WriteBuffer { label, .. } => label.as_str(),
            Command::BindCompute { .. } => "bind",
            Command::Dispatch { .. } => "dispatch",
            Command::ClearComputeOutput => "clear",
            Command::Draw { .. } => "draw",
            _ => "setup",
        })
        .collect();
    assert_eq!(
        kinds,
        ["properties", "spheres", "materials", "bind", "dispatch", "clear", "draw"]
    );
    assert!(ctx.commands().contains(&Command::Draw {
        target: "backbuffer".into(),
        image_id: pipeline.dispatcher().output().id,
        vertex_count: 6,
    }));
}

#[test]
fn frame_count_increments_once_per_frame() {
    let mut ctx = RecordingContext::new();
    let mut scene = SceneModel::playground(64, 64);
    let mut pipeline = pipeline(&mut ctx, 64, 64);

    for frame in 0..10u32 {
        assert_eq!(scene.frame_count(), frame);
        pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
        assert_eq!(uploaded_frame_count(&ctx), frame);
    }
    assert_eq!(scene.frame_count(), 10);
}

#[test]
fn edit_between_frames_restarts_accumulation() {
    let mut ctx = RecordingContext::new();
    let mut scene = SceneModel::playground(64, 64);
    let mut pipeline = pipeline(&mut ctx, 64, 64);

    for _ in 0..5 {
        pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    }
    assert_eq!(scene.frame_count(), 5);

    scene.set_material_kind(7, MaterialKind::Metal);
    scene.set_fuzziness(7, 0.4);
    assert_eq!(scene.frame_count(), 0);

    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    // the edited scene is dispatched with a fresh counter
    assert_eq!(uploaded_frame_count(&ctx), 0);
    let materials = ctx
        .commands()
        .iter()
        .rev()
        .find_map(|c| match c {
            Command::WriteBuffer { label, bytes } if label == "materials" => Some(bytes.clone()),
            _ => None,
        })
        .unwrap();
    let uploaded = Material::decode(&materials[7 * 32..8 * 32]).unwrap();
    assert_eq!(uploaded.kind, MaterialKind::Metal);
    assert_eq!(uploaded.fuzziness, 0.4);
    assert_eq!(scene.frame_count(), 1);
}

#[test]
fn eleven_sphere_scene_at_odd_width() {
    let mut ctx = RecordingContext::new();
    let mut scene = eleven_sphere_scene(1925, 1080);
    let mut pipeline = pipeline(&mut ctx, 1925, 1080);
    ctx.clear_commands();

    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");

    let writes: Vec<(&str, usize)> = ctx
        .submissions()
        .filter_map(|c| match c {
            Command::WriteBuffer { label, bytes } => Some((label.as_str(), bytes.len())),
            _ => None,
        })
        .collect();
    assert_eq!(writes, [("properties", 128), ("spheres", 11 * 16), ("materials", 11 * 32)]);
    assert!(ctx.commands().contains(&Command::Dispatch { groups: [241, 135, 1] }));
    assert_eq!(dispatch_groups(1925, 1080), [241, 135, 1]);

    for _ in 1..5 {
        pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    }
    assert_eq!(scene.frame_count(), 5);

    scene.set_sphere_center(3, Vector3::new(0.0, 0.5, -1.5));
    assert_eq!(scene.frame_count(), 0);

    ctx.clear_commands();
    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    assert_eq!(uploaded_frame_count(&ctx), 0);
    assert_eq!(scene.frame_count(), 1);
    let spheres = ctx
        .submissions()
        .find_map(|c| match c {
            Command::WriteBuffer { label, bytes } if label == "spheres" => Some(bytes.clone()),
            _ => None,
        })
        .unwrap();
    let moved = Sphere::decode(&spheres[3 * 16..4 * 16]).unwrap();
    assert_eq!(moved.center, Vector3::new(0.0, 0.5, -1.5));
}

#[test]
fn scene_follows_pipeline_size() {
    let mut ctx = RecordingContext::new();
    let mut scene = SceneModel::playground(1920, 1080);
    let mut pipeline = pipeline(&mut ctx, 800, 600);
    let image = pipeline.dispatcher().output().id;

    // same image size, but the scene still has to be brought in line
    assert!(pipeline.resize(&mut ctx, &mut scene, 800, 600).unwrap());
    assert_eq!(pipeline.dispatcher().output().id, image);
    assert_eq!((scene.properties().width, scene.properties().height), (800, 600));
    assert_eq!(scene.properties().camera.aspect_ratio, 800.0 / 600.0);
    assert!(!pipeline.resize(&mut ctx, &mut scene, 800, 600).unwrap());

    ctx.clear_commands();
    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    let uploaded = ctx
        .submissions()
        .find_map(|c| match c {
            Command::WriteBuffer { label, bytes } if label == "properties" => {
                Some(RaytracerProperties::decode(bytes).unwrap())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!((uploaded.width, uploaded.height), (800, 600));
    assert!(ctx.commands().contains(&Command::Dispatch { groups: [100, 75, 1] }));
}

#[test]
fn dispatch_covers_scene_viewport() {
    let mut ctx = RecordingContext::new();
    let mut scene = SceneModel::playground(40, 24);
    let mut pipeline = pipeline(&mut ctx, 64, 64);
    ctx.clear_commands();

    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    assert!(ctx.commands().contains(&Command::Dispatch { groups: [5, 3, 1] }));
}

#[test]
fn capacity_invariant_holds_through_edits() {
    let mut ctx = RecordingContext::new();
    let mut scene = SceneModel::playground(32, 32);
    let mut pipeline = pipeline(&mut ctx, 32, 32);

    while scene.len() < MAX_SPHERES {
        scene.push(Sphere::new(Vector3::ZERO, 0.1), Material::default()).unwrap();
    }
    assert!(matches!(
        scene.push(Sphere::default(), Material::default()),
        Err(Error::CapacityExceeded { capacity: 100, .. })
    ));

    // a full scene still fits the channels
    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    scene.remove(0);
    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");

    assert_eq!(scene.spheres().len(), scene.properties().sphere_count as usize);
    assert_eq!(scene.materials().len(), scene.properties().sphere_count as usize);
    assert_eq!(scene.len(), MAX_SPHERES - 1);
}

#[test]
fn resize_rebinds_and_restarts() {
    let mut ctx = RecordingContext::new();
    let mut scene = SceneModel::playground(64, 64);
    let mut pipeline = pipeline(&mut ctx, 64, 64);
    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");

    assert!(!pipeline.resize(&mut ctx, &mut scene, 64, 64).unwrap());
    assert_eq!(scene.frame_count(), 2);

    assert!(pipeline.resize(&mut ctx, &mut scene, 100, 60).unwrap());
    assert_eq!(scene.frame_count(), 0);
    assert_eq!((scene.properties().width, scene.properties().height), (100, 60));
    assert_eq!(pipeline.dimensions(), (100, 60));

    ctx.clear_commands();
    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    let new_image = pipeline.dispatcher().output().id;
    for command in ctx.commands() {
        match command {
            Command::BindCompute { image_id, .. } | Command::Draw { image_id, .. } => {
                assert_eq!(*image_id, new_image)
            }
            Command::Dispatch { groups } => assert_eq!(*groups, [13, 8, 1]),
            _ => {}
        }
    }
}

#[test]
fn setup_failure_is_reported() {
    for label in ["properties", "spheres", "materials", "raytracer_output", "quad_vertices", "quad_sampler"] {
        let mut ctx = RecordingContext::failing_on(label);
        let err = FramePipeline::new(&mut ctx, &KernelProvider::embedded(), 64, 64).err().unwrap();
        match err {
            Error::ResourceCreation { label: failed, .. } => assert_eq!(failed, label),
            other => panic!("unexpected error for {label}: {other}"),
        }
    }
}

#[test]
fn missing_kernel_override_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = RecordingContext::new();
    let err = FramePipeline::new(&mut ctx, &KernelProvider::from_dir(dir.path()), 64, 64).err().unwrap();
    assert!(matches!(err, Error::KernelNotFound(_)));
}

#[test]
fn empty_scene_renders() {
    let mut ctx = RecordingContext::new();
    let mut scene = SceneModel::new(16, 16, CameraDesc::default());
    let mut pipeline = pipeline(&mut ctx, 16, 16);
    ctx.clear_commands();

    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");
    let sizes: Vec<usize> = ctx
        .submissions()
        .filter_map(|c| match c {
            Command::WriteBuffer { bytes, .. } => Some(bytes.len()),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, [128, 0, 0]);
    assert_eq!(scene.frame_count(), 1);
}
