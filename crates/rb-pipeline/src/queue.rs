//! Edits submitted while a pass is running.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use rb_network::Edit;

/// FIFO of pending edits.  Cloning the handle shares the queue, so a host
/// thread can keep submitting while the pipeline owns the model.
#[derive(Clone, Debug, Default)]
pub struct EditQueue {
    inner: Arc<Mutex<VecDeque<Edit>>>,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, edit: Edit) {
        self.inner.lock().push_back(edit);
    }

    pub fn submit_all(&self, edits: impl IntoIterator<Item = Edit>) {
        self.inner.lock().extend(edits);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Take every pending edit in submission order.
    pub fn drain(&self) -> Vec<Edit> {
        self.inner.lock().drain(..).collect()
    }
}
