//! Playground Tracer - interactive progressive GPU ray tracer.

use std::env;

use playground_tracer::gpu::layout::{GpuCamera, GpuMaterial, GpuProperties, GpuSphere};
use playground_tracer::gpu::{dispatch_groups, Command, FramePipeline, KernelProvider, RecordingContext, LAYOUT_VERSION};
use playground_tracer::scene::SceneModel;

const BUILD_DATE: &str = env!("PLAYGROUND_BUILD_DATE");

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "warn",
            _ => filtered_args.push(arg),
        }
    }

    let command = filtered_args.first().copied().unwrap_or("view");
    match command {
        "help" | "h" | "-h" | "--help" => print_usage(&args[0]),
        "--version" | "-V" | "version" => {
            println!("playground-tracer {} (built {})", env!("CARGO_PKG_VERSION"), BUILD_DATE);
        }
        "scene" | "s" => {
            let _trace_guard = init_tracing(level);
            cmd_scene();
        }
        "view" | "v" => {
            if let Err(e) = cmd_view(level) {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    println!("Playground Tracer - progressive GPU ray tracer");
    println!();
    println!("Usage: {} [options] [command]", prog);
    println!();
    println!("Commands:");
    println!("  v, view     Open the interactive viewer (default)");
    println!("  s, scene    Print the default scene, record layouts and one recorded frame");
    println!("  h, help     Show this help");
    println!("  --version   Show version and build date");
    println!();
    println!("Options:");
    println!("  -v, --verbose  Debug output");
    println!("  -vv, --trace   Trace output (very verbose)");
    println!("  -q, --quiet    Warnings and errors only");
    println!();
    println!("Environment:");
    println!("  RUST_LOG                 Log filter (overrides -v/-q)");
    println!("  PLAYGROUND_SHADER_DIR    Directory with raytracer.wgsl / quad.wgsl overrides");
    println!("  PLAYGROUND_TRACE=1       Write a Chrome trace to trace.json");
}

#[cfg(feature = "viewer")]
fn cmd_view(level: &str) -> anyhow::Result<()> {
    let _trace_guard = init_tracing(level);
    let settings = playground_tracer::viewer::Settings::load();
    playground_tracer::viewer::run(settings)
}

#[cfg(not(feature = "viewer"))]
fn cmd_view(_level: &str) -> Result<(), String> {
    Err("built without the `viewer` feature".into())
}

#[cfg(feature = "viewer")]
fn init_tracing(level: &str) -> Option<tracing_chrome::FlushGuard> {
    playground_tracer::viewer::init_tracing(level)
}

#[cfg(not(feature = "viewer"))]
fn init_tracing(level: &str) -> Option<()> {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    None
}

fn cmd_scene() {
    let (width, height) = (1938, 1127);
    let mut scene = SceneModel::playground(width, height);

    println!("Scene: {} spheres at {}x{}", scene.len(), width, height);
    let desc = scene.camera_desc();
    println!(
        "Camera: position {} look_at {} vfov {}° aperture {} focus {}",
        desc.position, desc.look_at, desc.vertical_fov, desc.aperture, desc.focus_distance
    );
    println!();
    println!("  {:>3}  {:<28} {:>7}  {:<10} {:<22} {:>5}", "#", "center", "radius", "material", "albedo", "fuzz");
    for (i, (s, m)) in scene.spheres().iter().zip(scene.materials()).enumerate() {
        println!(
            "  {:>3}  {:<28} {:>7.2}  {:<10} {:<22} {:>5.2}",
            i,
            format!("{}", s.center),
            s.radius,
            m.kind.label(),
            format!("{}", m.albedo),
            m.fuzziness
        );
    }

    println!();
    println!("Record layouts (version {LAYOUT_VERSION}):");
    println!("  properties  {:>4} B", std::mem::size_of::<GpuProperties>());
    println!("  camera      {:>4} B", std::mem::size_of::<GpuCamera>());
    println!("  sphere      {:>4} B", std::mem::size_of::<GpuSphere>());
    println!("  material    {:>4} B", std::mem::size_of::<GpuMaterial>());
    println!("  dispatch    {:?}", dispatch_groups(width, height));

    // One frame through the recording context
    let mut ctx = RecordingContext::new();
    let mut pipeline = match FramePipeline::new(&mut ctx, &KernelProvider::from_env_or(None), width, height) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to build frame pipeline: {e}");
            std::process::exit(1);
        }
    };
    ctx.clear_commands();
    pipeline.render_frame(&mut ctx, &mut scene, "backbuffer");

    println!();
    println!("Recorded frame:");
    for command in ctx.submissions() {
        match command {
            Command::WriteBuffer { label, bytes } => println!("  write_buffer  {label} ({} B)", bytes.len()),
            Command::BindCompute { kernel, .. } => println!("  bind_compute  {kernel}"),
            Command::Dispatch { groups } => println!("  dispatch      {groups:?}"),
            Command::ClearComputeOutput => println!("  clear_compute_output"),
            Command::Draw { target, vertex_count, .. } => println!("  draw          {vertex_count} vertices -> {target}"),
            other => println!("  {other:?}"),
        }
    }
    println!("frame_count after frame: {}", scene.frame_count());
}
