//! Publish-by-swap handle readers and the single writer share.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::buffer::MeshBuffer;

/// The current published [`MeshBuffer`].
///
/// Readers take an `Arc` snapshot and keep it as long as they like; the
/// writer builds the next buffer off to the side and swaps it in, so no
/// reader ever observes a half-written region.  Cloning the handle shares
/// the same slot.
#[derive(Clone, Debug, Default)]
pub struct SharedMesh {
    inner: Arc<RwLock<Arc<MeshBuffer>>>,
}

impl SharedMesh {
    pub fn new(buffer: MeshBuffer) -> Self {
        SharedMesh { inner: Arc::new(RwLock::new(Arc::new(buffer))) }
    }

    /// The buffer as of the last publish.
    pub fn snapshot(&self) -> Arc<MeshBuffer> {
        self.inner.read().clone()
    }

    /// Replace the published buffer, returning the previous one.
    pub fn publish(&self, next: MeshBuffer) -> Arc<MeshBuffer> {
        std::mem::replace(&mut *self.inner.write(), Arc::new(next))
    }

    /// Clone the current buffer, let `f` edit the clone, then publish it.
    ///
    /// The clone shares every attribute chunk with the published buffer;
    /// only chunks `f` writes to are copied, so the cost follows the
    /// regions touched rather than the size of the network.
    pub fn update<R>(&self, f: impl FnOnce(&mut MeshBuffer) -> R) -> R {
        let mut next = (*self.snapshot()).clone();
        let out = f(&mut next);
        self.publish(next);
        out
    }
}
