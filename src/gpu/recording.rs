//! Device-less [`GpuContext`] that records the command stream.
//!
//! Used by the `scene` CLI command for a headless frame and by tests to
//! check submission order. It enforces the same rules a real device
//! would reject: writes past a buffer's end, binding counts that do not
//! match the kernel, and sampling an image that is still bound as the
//! compute output.

use crate::error::{Error, Result};

use super::context::{
    BorderMode, BufferDesc, BufferKind, ComputeKernelDesc, GpuContext, QuadKernelDesc, SamplerDesc,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBuffer {
    pub label: String,
    pub kind: BufferKind,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedImage {
    /// Unique per created image, so rebinding after a resize is visible
    pub id: usize,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedKernel {
    pub label: String,
    pub entry_points: Vec<String>,
    pub storage_inputs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSampler {
    pub label: String,
    pub border: BorderMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBindings {
    pub kernel: String,
    pub image_id: usize,
}

/// One entry of the recorded stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer { label: String, size: u64 },
    CreateImage { id: usize, width: u32, height: u32 },
    CreateKernel { label: String },
    CreateSampler { border: BorderMode },
    CreateBindings { kernel: String, image_id: usize },
    WriteBuffer { label: String, bytes: Vec<u8> },
    BindCompute { kernel: String, image_id: usize },
    Dispatch { groups: [u32; 3] },
    ClearComputeOutput,
    Draw { target: String, image_id: usize, vertex_count: u32 },
}

impl Command {
    /// True for commands issued per frame rather than at setup.
    pub fn is_submission(&self) -> bool {
        matches!(
            self,
            Self::WriteBuffer { .. }
                | Self::BindCompute { .. }
                | Self::Dispatch { .. }
                | Self::ClearComputeOutput
                | Self::Draw { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<Command>,
    next_image_id: usize,
    /// Image currently bound writable by the compute stage
    bound_output: Option<usize>,
    fail_label: Option<String>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose creation calls fail for resources named `label`.
    pub fn failing_on(label: impl Into<String>) -> Self {
        Self {
            fail_label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Per-frame commands only, setup filtered out.
    pub fn submissions(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| c.is_submission())
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn buffer_size(&self, buffer: &RecordedBuffer) -> u64 {
        buffer.size
    }

    fn check(&self, label: &str) -> Result<()> {
        match &self.fail_label {
            Some(fail) if fail == label => Err(Error::creation(label, "injected device failure")),
            _ => Ok(()),
        }
    }

    fn check_entry(source: &str, label: &str, entry: &str) -> Result<()> {
        if source.contains(&format!("fn {entry}(")) {
            Ok(())
        } else {
            Err(Error::creation(label, format!("entry point '{entry}' not found")))
        }
    }
}

impl GpuContext for RecordingContext {
    type Buffer = RecordedBuffer;
    type Image = RecordedImage;
    type ComputeKernel = RecordedKernel;
    type QuadKernel = RecordedKernel;
    type Sampler = RecordedSampler;
    type Bindings = RecordedBindings;
    type Target = str;

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<RecordedBuffer> {
        self.check(desc.label)?;
        if desc.size == 0 {
            return Err(Error::creation(desc.label, "zero-sized buffer"));
        }
        if let BufferKind::Structured { stride } = desc.kind {
            if stride == 0 || desc.size % stride as u64 != 0 {
                return Err(Error::creation(desc.label, format!("size {} not a multiple of stride {stride}", desc.size)));
            }
        }
        if desc.kind == BufferKind::Vertex && desc.contents.map(<[u8]>::len) != Some(desc.size as usize) {
            return Err(Error::creation(desc.label, "vertex buffer needs initial contents of its full size"));
        }
        self.commands.push(Command::CreateBuffer {
            label: desc.label.to_string(),
            size: desc.size,
        });
        Ok(RecordedBuffer {
            label: desc.label.to_string(),
            kind: desc.kind,
            size: desc.size,
        })
    }

    fn create_image(&mut self, label: &str, width: u32, height: u32) -> Result<RecordedImage> {
        self.check(label)?;
        if width == 0 || height == 0 {
            return Err(Error::creation(label, format!("invalid image size {width}x{height}")));
        }
        let id = self.next_image_id;
        self.next_image_id += 1;
        self.commands.push(Command::CreateImage { id, width, height });
        Ok(RecordedImage {
            id,
            label: label.to_string(),
            width,
            height,
        })
    }

    fn create_compute_kernel(&mut self, desc: &ComputeKernelDesc<'_>) -> Result<RecordedKernel> {
        let label = &desc.source.label;
        self.check(label)?;
        Self::check_entry(&desc.source.code, label, desc.entry_point)?;
        self.commands.push(Command::CreateKernel { label: label.clone() });
        Ok(RecordedKernel {
            label: label.clone(),
            entry_points: vec![desc.entry_point.to_string()],
            storage_inputs: desc.storage_inputs,
        })
    }

    fn create_quad_kernel(&mut self, desc: &QuadKernelDesc<'_>) -> Result<RecordedKernel> {
        let label = &desc.source.label;
        self.check(label)?;
        Self::check_entry(&desc.source.code, label, desc.vertex_entry)?;
        Self::check_entry(&desc.source.code, label, desc.fragment_entry)?;
        self.commands.push(Command::CreateKernel { label: label.clone() });
        Ok(RecordedKernel {
            label: label.clone(),
            entry_points: vec![desc.vertex_entry.to_string(), desc.fragment_entry.to_string()],
            storage_inputs: 0,
        })
    }

    fn create_sampler(&mut self, desc: &SamplerDesc<'_>) -> Result<RecordedSampler> {
        self.check(desc.label)?;
        self.commands.push(Command::CreateSampler { border: desc.border });
        Ok(RecordedSampler {
            label: desc.label.to_string(),
            border: desc.border,
        })
    }

    fn create_compute_bindings(
        &mut self,
        kernel: &RecordedKernel,
        inputs: &[&RecordedBuffer],
        output: &RecordedImage,
    ) -> Result<RecordedBindings> {
        if inputs.len() != kernel.storage_inputs as usize {
            return Err(Error::creation(
                &kernel.label,
                format!("kernel expects {} inputs, got {}", kernel.storage_inputs, inputs.len()),
            ));
        }
        if let Some(bad) = inputs.iter().find(|b| b.kind == BufferKind::Vertex) {
            return Err(Error::creation(&bad.label, "vertex buffer bound as structured input"));
        }
        self.commands.push(Command::CreateBindings {
            kernel: kernel.label.clone(),
            image_id: output.id,
        });
        Ok(RecordedBindings {
            kernel: kernel.label.clone(),
            image_id: output.id,
        })
    }

    fn create_quad_bindings(
        &mut self,
        kernel: &RecordedKernel,
        image: &RecordedImage,
        _sampler: &RecordedSampler,
    ) -> Result<RecordedBindings> {
        self.commands.push(Command::CreateBindings {
            kernel: kernel.label.clone(),
            image_id: image.id,
        });
        Ok(RecordedBindings {
            kernel: kernel.label.clone(),
            image_id: image.id,
        })
    }

    fn write_buffer(&mut self, buffer: &RecordedBuffer, bytes: &[u8]) {
        assert!(
            bytes.len() as u64 <= buffer.size,
            "write of {} bytes overruns '{}' ({} bytes)",
            bytes.len(),
            buffer.label,
            buffer.size
        );
        self.commands.push(Command::WriteBuffer {
            label: buffer.label.clone(),
            bytes: bytes.to_vec(),
        });
    }

    fn bind_compute(&mut self, kernel: &RecordedKernel, bindings: &RecordedBindings) {
        self.bound_output = Some(bindings.image_id);
        self.commands.push(Command::BindCompute {
            kernel: kernel.label.clone(),
            image_id: bindings.image_id,
        });
    }

    fn dispatch(&mut self, groups: [u32; 3]) {
        assert!(self.bound_output.is_some(), "dispatch without a bound compute kernel");
        self.commands.push(Command::Dispatch { groups });
    }

    fn clear_compute_output(&mut self) {
        self.bound_output = None;
        self.commands.push(Command::ClearComputeOutput);
    }

    fn draw(
        &mut self,
        _kernel: &RecordedKernel,
        bindings: &RecordedBindings,
        vertices: &RecordedBuffer,
        target: &str,
        vertex_count: u32,
    ) {
        assert_eq!(vertices.kind, BufferKind::Vertex, "draw from non-vertex buffer '{}'", vertices.label);
        assert_ne!(
            self.bound_output,
            Some(bindings.image_id),
            "image {} sampled while bound as compute output",
            bindings.image_id
        );
        self.commands.push(Command::Draw {
            target: target.to_string(),
            image_id: bindings.image_id,
            vertex_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::kernels::{KernelId, KernelProvider, COMPUTE_ENTRY};

    #[test]
    fn test_failing_on_label() {
        let mut ctx = RecordingContext::failing_on("spheres");
        let desc = BufferDesc {
            label: "spheres",
            kind: BufferKind::Structured { stride: 16 },
            size: 1600,
            contents: None,
        };
        assert!(matches!(ctx.create_buffer(&desc), Err(Error::ResourceCreation { .. })));
        assert!(ctx.commands().is_empty());

        let ok = BufferDesc { label: "materials", ..desc };
        assert!(ctx.create_buffer(&ok).is_ok());
    }

    #[test]
    fn test_stride_mismatch_rejected() {
        let mut ctx = RecordingContext::new();
        let desc = BufferDesc {
            label: "odd",
            kind: BufferKind::Structured { stride: 16 },
            size: 20,
            contents: None,
        };
        assert!(ctx.create_buffer(&desc).is_err());
    }

    #[test]
    fn test_missing_entry_point_rejected() {
        let mut ctx = RecordingContext::new();
        let source = KernelProvider::embedded().load(KernelId::Quad).unwrap();
        let err = ctx
            .create_compute_kernel(&ComputeKernelDesc {
                source: &source,
                entry_point: COMPUTE_ENTRY,
                storage_inputs: 3,
            })
            .unwrap_err();
        assert!(err.to_string().contains("cs_main"));
    }

    #[test]
    #[should_panic(expected = "overruns")]
    fn test_write_past_end_panics() {
        let mut ctx = RecordingContext::new();
        let buffer = ctx
            .create_buffer(&BufferDesc {
                label: "properties",
                kind: BufferKind::Structured { stride: 128 },
                size: 128,
                contents: None,
            })
            .unwrap();
        ctx.write_buffer(&buffer, &[0u8; 129]);
    }
}
