//! Kernel sources.
//!
//! WGSL is embedded at compile time. A directory override lets the kernels
//! be edited without rebuilding: `raytracer.wgsl` and `quad.wgsl` found
//! there replace the embedded versions.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const RAYTRACER_WGSL: &str = include_str!("shaders/raytracer.wgsl");
const QUAD_WGSL: &str = include_str!("shaders/quad.wgsl");

/// Compute entry point in `raytracer.wgsl`.
pub const COMPUTE_ENTRY: &str = "cs_main";
/// Vertex entry point in `quad.wgsl`.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point in `quad.wgsl`.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Environment variable naming a kernel override directory.
pub const SHADER_DIR_ENV: &str = "PLAYGROUND_SHADER_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelId {
    Raytracer,
    Quad,
}

impl KernelId {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Raytracer => "raytracer.wgsl",
            Self::Quad => "quad.wgsl",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            Self::Raytracer => RAYTRACER_WGSL,
            Self::Quad => QUAD_WGSL,
        }
    }
}

/// WGSL source text plus a label for diagnostics.
#[derive(Debug, Clone)]
pub struct KernelSource {
    pub label: String,
    pub code: Cow<'static, str>,
}

/// Resolves [`KernelId`]s to sources.
#[derive(Debug, Clone, Default)]
pub struct KernelProvider {
    dir: Option<PathBuf>,
}

impl KernelProvider {
    /// Embedded sources only.
    pub fn embedded() -> Self {
        Self { dir: None }
    }

    /// Read sources from `dir`; missing files are an error, not a fallback.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()) }
    }

    /// Override directory from `PLAYGROUND_SHADER_DIR`, else `fallback`.
    pub fn from_env_or(fallback: Option<&Path>) -> Self {
        match std::env::var_os(SHADER_DIR_ENV) {
            Some(dir) => Self::from_dir(dir),
            None => Self { dir: fallback.map(Path::to_path_buf) },
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn load(&self, id: KernelId) -> Result<KernelSource> {
        let Some(dir) = &self.dir else {
            return Ok(KernelSource {
                label: id.file_name().to_string(),
                code: Cow::Borrowed(id.embedded()),
            });
        };

        let path = dir.join(id.file_name());
        if !path.is_file() {
            return Err(Error::KernelNotFound(path));
        }
        let code = std::fs::read_to_string(&path)?;
        tracing::info!(path = %path.display(), "loaded kernel override");
        Ok(KernelSource {
            label: path.display().to_string(),
            code: Cow::Owned(code),
        })
    }
}
