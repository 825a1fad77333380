//! Interactive viewer: eframe window, control panel and ray traced viewport.

mod app;
mod panel;
mod settings;
mod viewport;

pub use panel::FrameStats;
pub use settings::Settings;

use anyhow::Result;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::gpu::wanted_features;

/// Environment variable enabling Chrome trace export (`trace.json`).
pub const TRACE_ENV: &str = "PLAYGROUND_TRACE";

/// Open the viewer window and block until it closes.
pub fn run(settings: Settings) -> Result<()> {
    // Friendly panic handler for GPU errors
    std::panic::set_hook(Box::new(|info| {
        let msg = info
            .payload()
            .downcast_ref::<String>()
            .map(|s| s.as_str())
            .or_else(|| info.payload().downcast_ref::<&str>().copied())
            .unwrap_or("Unknown error");

        if msg.contains("wgpu") || msg.contains("GPU") || msg.contains("shader") {
            eprintln!("\n[GPU Error] {msg}");
            eprintln!("\nCheck kernel overrides in ${} or update the graphics driver.", crate::gpu::kernels::SHADER_DIR_ENV);
        } else {
            eprintln!("\n[Error] {msg}");
            if let Some(loc) = info.location() {
                eprintln!("  at {}:{}:{}", loc.file(), loc.line(), loc.column());
            }
        }
    }));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_title("Playground Tracer"),
        vsync: settings.vsync,
        renderer: eframe::Renderer::Wgpu,
        wgpu_options: egui_wgpu::WgpuConfiguration {
            wgpu_setup: egui_wgpu::WgpuSetup::CreateNew(egui_wgpu::WgpuSetupCreateNew {
                device_descriptor: std::sync::Arc::new(|adapter| {
                    let base_limits = if adapter.get_info().backend == wgpu::Backend::Gl {
                        wgpu::Limits::downlevel_webgl2_defaults()
                    } else {
                        wgpu::Limits::default()
                    };
                    // Request only what the adapter offers; WgpuContext reports what is missing
                    wgpu::DeviceDescriptor {
                        label: Some("playground-tracer device"),
                        required_features: adapter.features() & wanted_features(),
                        required_limits: wgpu::Limits {
                            max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d.min(8192),
                            ..base_limits
                        },
                        ..Default::default()
                    }
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    eframe::run_native(
        "Playground Tracer",
        options,
        Box::new(move |cc| {
            let app = app::PlaygroundApp::new(cc, settings)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run: {}", e))
}

/// Install the global subscriber: fmt output filtered by `RUST_LOG` (or
/// `default_level`), plus Chrome trace export when `PLAYGROUND_TRACE=1`.
/// Keep the returned guard alive until exit so the trace is flushed.
pub fn init_tracing(default_level: &str) -> Option<tracing_chrome::FlushGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt = tracing_subscriber::fmt::layer().with_target(false);

    if std::env::var(TRACE_ENV).ok().as_deref() != Some("1") {
        tracing_subscriber::registry().with(filter).with(fmt).try_init().ok();
        return None;
    }

    let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
        .file("trace.json")
        .build();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .with(chrome_layer)
        .try_init()
        .ok()?;
    Some(guard)
}
