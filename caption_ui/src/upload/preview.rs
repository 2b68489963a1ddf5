use crate::upload::{file::ImageFile, state::PreviewHandle};
use bytes::Bytes;
use parking_lot::Mutex;

#[derive(Debug)]
struct LivePreview {
    handle: PreviewHandle,
    bytes: Bytes,
}

/// Holds the one preview the page may display. Publishing a new preview
/// while another is still live releases the older one.
#[derive(Debug, Default)]
pub struct PreviewStore {
    live: Mutex<Option<LivePreview>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, handle: PreviewHandle, file: &ImageFile) {
        let mut live = self.live.lock();
        if let Some(leaked) = live.take() {
            tracing::warn!(
                generation = leaked.handle.generation,
                "Preview published while another was still live, releasing it"
            );
        }
        tracing::debug!(generation = handle.generation, file = %file.name, "Preview published");
        *live = Some(LivePreview {
            handle,
            bytes: file.bytes.clone(),
        });
    }

    /// Returns false when `handle` was not the live preview.
    pub fn release(&self, handle: &PreviewHandle) -> bool {
        let mut live = self.live.lock();
        match live.as_ref() {
            Some(current) if current.handle == *handle => {
                *live = None;
                tracing::debug!(generation = handle.generation, "Preview released");
                true
            }
            _ => false,
        }
    }

    pub fn resolve(&self, generation: u64) -> Option<(PreviewHandle, Bytes)> {
        self.live
            .lock()
            .as_ref()
            .filter(|preview| preview.handle.generation == generation)
            .map(|preview| (preview.handle.clone(), preview.bytes.clone()))
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.resolve(handle.generation)
            .is_some_and(|(live, _)| live == *handle)
    }

    pub fn live_count(&self) -> usize {
        usize::from(self.live.lock().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(generation: u64) -> PreviewHandle {
        PreviewHandle {
            generation,
            mime_type: "image/png".to_string(),
        }
    }

    fn file(content: &'static [u8]) -> ImageFile {
        ImageFile::new("preview.png", "image/png", Bytes::from_static(content))
    }

    #[test]
    fn test_publish_then_resolve() {
        let store = PreviewStore::new();
        store.publish(handle(1), &file(b"one"));

        let (live, bytes) = store.resolve(1).unwrap();
        assert_eq!(live, handle(1));
        assert_eq!(bytes, Bytes::from_static(b"one"));
        assert!(store.resolve(2).is_none());
    }

    #[test]
    fn test_release_invalidates_handle() {
        let store = PreviewStore::new();
        store.publish(handle(1), &file(b"one"));

        assert!(store.release(&handle(1)));
        assert!(!store.is_live(&handle(1)));
        assert!(store.resolve(1).is_none());
        assert!(!store.release(&handle(1)));
    }

    #[test]
    fn test_release_ignores_stale_handle() {
        let store = PreviewStore::new();
        store.publish(handle(2), &file(b"two"));

        assert!(!store.release(&handle(1)));
        assert!(store.is_live(&handle(2)));
    }

    #[test]
    fn test_at_most_one_live_preview() {
        let store = PreviewStore::new();
        store.publish(handle(1), &file(b"one"));
        store.publish(handle(2), &file(b"two"));

        assert_eq!(store.live_count(), 1);
        assert!(!store.is_live(&handle(1)));
        assert!(store.is_live(&handle(2)));
    }
}
