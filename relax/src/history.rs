use std::time::Instant;

use log::debug;

/// Denoiser's state carried from one frame into the next; each viewport
/// owns one.
#[derive(Clone, Debug)]
pub struct History<T> {
    frame_index: u64,
    timestamp: Option<Instant>,
    buffers: Option<HistoryBuffers<T>>,
}

/// Buffers persisted at the end of a frame.
#[derive(Clone, Debug)]
pub struct HistoryBuffers<T> {
    pub specular: T,
    pub diffuse: T,
    pub specular_responsive: T,
    pub diffuse_responsive: T,
    pub normal_roughness: T,
    pub view_z: T,
    pub hit_distance: T,

    /// Packed `(specular, diffuse)`, see: [`relax_gpu::HistoryLength`]
    pub history_length: T,
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self {
            frame_index: 0,
            timestamp: None,
            buffers: None,
        }
    }

    /// Returns whether all of the history's buffers are present.
    pub fn is_valid(&self) -> bool {
        self.buffers.is_some()
    }

    /// Returns whether the upcoming frame must ignore this history.
    pub fn should_reset(&self, camera_cut: bool) -> bool {
        debug_assert_eq!(
            self.is_valid(),
            self.frame_index != 0,
            "history's buffers are out of sync with its frame index"
        );

        camera_cut || !self.is_valid() || self.frame_index == 0
    }

    /// Number of frames committed so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// When the last frame was committed
    pub fn timestamp(&self) -> Option<Instant> {
        self.timestamp
    }

    pub fn buffers(&self) -> Option<&HistoryBuffers<T>> {
        self.buffers.as_ref()
    }

    /// Replaces all of the buffers and advances to the next frame; the
    /// previous buffers get released here.
    pub fn commit(&mut self, buffers: HistoryBuffers<T>, timestamp: Instant) {
        self.buffers = Some(buffers);
        self.frame_index += 1;
        self.timestamp = Some(timestamp);
    }

    /// Drops all of the buffers, so that the next frame starts from scratch.
    pub fn clear(&mut self) {
        if self.is_valid() {
            debug!("Clearing history (frame_index={})", self.frame_index);
        }

        *self = Self::new();
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns given history buffer, or `fallback` if there's no history.
pub fn import_or_fallback<T>(buffer: Option<&T>, fallback: &T) -> T
where
    T: Clone,
{
    buffer.unwrap_or(fallback).clone()
}
