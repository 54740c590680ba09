//! Owning slots for reference-counted native objects.
//!
//! A native handle type is any `Clone` value whose clone retains the
//! underlying object and whose drop releases it (the `windows` crate's COM
//! interfaces behave this way). The slots add assign/release semantics on
//! top: `assign` releases the old object before retaining the new one, and
//! `release` is idempotent.
//!
//! [`ComPtr`] releases on drop. [`LightComPtr`] must be released explicitly;
//! it is meant for long-lived slots whose teardown order is managed by hand,
//! and dropping one that still holds an object is a caller bug.

use std::mem::ManuallyDrop;

/// Owning slot that releases its object on drop.
#[derive(Debug)]
pub struct ComPtr<T: Clone> {
    inner: Option<T>,
}

impl<T: Clone> ComPtr<T> {
    pub fn new() -> Self {
        Self { inner: None }
    }

    /// Take ownership of an already-retained object.
    pub fn from_owned(value: T) -> Self {
        Self { inner: Some(value) }
    }

    /// Release the held object, then retain and store `value`.
    pub fn assign(&mut self, value: Option<&T>) {
        self.release();
        self.inner = value.cloned();
    }

    /// Release the held object and store an already-retained one.
    pub fn replace(&mut self, value: T) {
        self.release();
        self.inner = Some(value);
    }

    /// Release the held object. No-op when empty.
    pub fn release(&mut self) {
        drop(self.inner.take());
    }

    /// Hand the held reference to the caller, leaving the slot empty.
    pub fn take(&mut self) -> Option<T> {
        self.inner.take()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.inner.as_ref()
    }
}

impl<T: Clone> Default for ComPtr<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Owning slot without release-on-drop.
///
/// Dropping a slot that still holds an object leaks the reference and logs a
/// warning; the object is never released implicitly.
#[derive(Debug)]
pub struct LightComPtr<T: Clone> {
    inner: Option<ManuallyDrop<T>>,
}

impl<T: Clone> LightComPtr<T> {
    pub fn new() -> Self {
        Self { inner: None }
    }

    /// Release the held object, then retain and store `value`.
    pub fn assign(&mut self, value: Option<&T>) {
        self.release();
        self.inner = value.map(|v| ManuallyDrop::new(v.clone()));
    }

    /// Release the held object and store an already-retained one.
    pub fn replace(&mut self, value: T) {
        self.release();
        self.inner = Some(ManuallyDrop::new(value));
    }

    /// Release the held object. No-op when empty.
    pub fn release(&mut self) {
        if let Some(value) = self.inner.take() {
            drop(ManuallyDrop::into_inner(value));
        }
    }

    /// Hand the held reference to the caller, leaving the slot empty.
    pub fn take(&mut self) -> Option<T> {
        self.inner.take().map(ManuallyDrop::into_inner)
    }

    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.inner.as_deref()
    }
}

impl<T: Clone> Default for LightComPtr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Drop for LightComPtr<T> {
    fn drop(&mut self) {
        if self.inner.is_some() {
            log::warn!(
                "LightComPtr<{}> dropped while holding a reference; leaking it",
                std::any::type_name::<T>()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn assign_retains_and_release_drops() {
        let object = Arc::new(());
        let mut ptr = ComPtr::new();
        assert!(!ptr.is_valid());

        ptr.assign(Some(&object));
        assert!(ptr.is_valid());
        assert_eq!(Arc::strong_count(&object), 2);

        ptr.release();
        assert!(!ptr.is_valid());
        assert_eq!(Arc::strong_count(&object), 1);

        // Releasing twice and releasing empty are both no-ops
        ptr.release();
        assert_eq!(Arc::strong_count(&object), 1);
    }

    #[test]
    fn assign_releases_previous_object_first() {
        let first = Arc::new(1);
        let second = Arc::new(2);
        let mut ptr = ComPtr::new();

        ptr.assign(Some(&first));
        ptr.assign(Some(&second));
        assert_eq!(Arc::strong_count(&first), 1);
        assert_eq!(Arc::strong_count(&second), 2);
        assert_eq!(**ptr.get().unwrap(), 2);

        ptr.assign(None);
        assert!(!ptr.is_valid());
        assert_eq!(Arc::strong_count(&second), 1);
    }

    #[test]
    fn reassigning_same_object_keeps_one_reference() {
        let object = Arc::new(());
        let mut ptr = ComPtr::new();
        ptr.assign(Some(&object));
        ptr.assign(Some(&object));
        assert_eq!(Arc::strong_count(&object), 2);
    }

    #[test]
    fn com_ptr_releases_on_drop() {
        let object = Arc::new(());
        {
            let _ptr = ComPtr::from_owned(Arc::clone(&object));
            assert_eq!(Arc::strong_count(&object), 2);
        }
        assert_eq!(Arc::strong_count(&object), 1);
    }

    #[test]
    fn take_transfers_ownership() {
        let object = Arc::new(());
        let mut ptr = ComPtr::from_owned(Arc::clone(&object));
        let taken = ptr.take().unwrap();
        assert!(!ptr.is_valid());
        assert_eq!(Arc::strong_count(&object), 2);
        drop(taken);
        assert_eq!(Arc::strong_count(&object), 1);
    }

    #[test]
    fn light_ptr_requires_explicit_release() {
        let object = Arc::new(());
        let mut ptr = LightComPtr::new();
        ptr.assign(Some(&object));
        assert_eq!(Arc::strong_count(&object), 2);
        ptr.release();
        ptr.release();
        assert_eq!(Arc::strong_count(&object), 1);
    }

    #[test]
    fn light_ptr_leaks_when_dropped_holding() {
        let object = Arc::new(());
        {
            let mut ptr = LightComPtr::new();
            ptr.replace(Arc::clone(&object));
        }
        assert_eq!(Arc::strong_count(&object), 2);
    }

    #[test]
    fn light_ptr_take_hands_over_reference() {
        let object = Arc::new(());
        let mut ptr = LightComPtr::new();
        ptr.assign(Some(&object));
        let taken = ptr.take().unwrap();
        assert!(!ptr.is_valid());
        drop(taken);
        assert_eq!(Arc::strong_count(&object), 1);
    }
}
