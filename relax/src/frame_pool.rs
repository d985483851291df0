use glam::UVec2;

use crate::{FrameGraph, TextureDesc};

/// Intermediate textures of a single frame.
///
/// The pool doesn't hold onto what it creates: a texture lives for as long
/// as its handle does, so the ones not moved into the history are released
/// at the end of the frame.
#[derive(Debug)]
pub struct FramePool<T> {
    size: UVec2,
    zero: T,
    created: usize,
}

impl<T> FramePool<T>
where
    T: Clone,
{
    pub fn new<G>(graph: &mut G, size: UVec2) -> Self
    where
        G: FrameGraph<Texture = T>,
    {
        Self {
            size,
            zero: graph.create_texture(&TextureDesc::new("relax_zero", size)),
            created: 0,
        }
    }

    /// Creates a zero-filled texture of the frame's size.
    pub fn create<G>(&mut self, graph: &mut G, label: &str) -> T
    where
        G: FrameGraph<Texture = T>,
    {
        let desc = TextureDesc::new(format!("relax_{label}"), self.size);
        self.created += 1;

        graph.create_texture(&desc)
    }

    /// Returns a texture that's never written to, used in place of missing
    /// inputs or history.
    pub fn zero(&self) -> &T {
        &self.zero
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Returns how many textures have been created so far, not counting
    /// the zero one.
    pub fn created(&self) -> usize {
        self.created
    }
}
