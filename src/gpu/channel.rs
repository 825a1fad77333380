//! Structured buffer channel: fixed-capacity array of GPU records.
//!
//! The device buffer is sized `capacity * stride` once and never resized.
//! Kernels always see all `capacity` elements; the live count travels in
//! `RaytracerProperties::sphere_count`. Slots past the last upload keep
//! stale data.

use std::marker::PhantomData;

use crate::error::{Error, Result};

use super::context::{BufferDesc, BufferKind, GpuContext};
use super::layout::{encode_slice, GpuRecord};

pub struct StructuredBuffer<C: GpuContext, T: GpuRecord> {
    buffer: C::Buffer,
    capacity: usize,
    /// Reused serialization buffer, avoids a per-frame allocation
    scratch: Vec<u8>,
    _record: PhantomData<T>,
}

impl<C: GpuContext, T: GpuRecord> StructuredBuffer<C, T> {
    /// Allocate room for `capacity` records of `T`.
    pub fn create(ctx: &mut C, label: &str, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::creation(label, "structured buffer capacity must be non-zero"));
        }
        let stride = T::stride();
        let size = capacity as u64 * stride as u64;
        let buffer = ctx.create_buffer(&BufferDesc {
            label,
            kind: BufferKind::Structured { stride },
            size,
            contents: None,
        })?;
        tracing::debug!(label, capacity, stride, size, "structured buffer created");

        Ok(Self {
            buffer,
            capacity,
            scratch: Vec::with_capacity(size as usize),
            _record: PhantomData,
        })
    }

    /// Overwrite the first `records.len()` slots.
    ///
    /// # Panics
    /// If `records.len()` exceeds the capacity.
    pub fn upload(&mut self, ctx: &mut C, records: &[T]) {
        assert!(
            records.len() <= self.capacity,
            "{} upload of {} records exceeds capacity {}",
            T::NAME,
            records.len(),
            self.capacity
        );
        self.scratch.clear();
        encode_slice(records, &mut self.scratch);
        ctx.write_buffer(&self.buffer, &self.scratch);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stride(&self) -> u32 {
        T::stride()
    }

    /// Device allocation size; always `capacity * stride`.
    pub fn byte_size(&self) -> u64 {
        self.capacity as u64 * T::stride() as u64
    }

    pub fn buffer(&self) -> &C::Buffer {
        &self.buffer
    }
}
