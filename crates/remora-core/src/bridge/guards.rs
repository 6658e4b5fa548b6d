//! # RAII Guards for Backend Resources
//!
//! A [`ResourceGuard`] owns one backend resource for the duration of a bridge
//! call and releases it when dropped, so enumerators and memory contexts are
//! given back on success, on error, and on early return alike.
//!
//! ## Example
//!
//! ```rust
//! use remora_core::bridge::{BackendResource, ResourceGuard};
//!
//! struct Handle(bool);
//!
//! impl BackendResource for Handle
//! {
//!     fn label(&self) -> &'static str
//!     {
//!         "handle"
//!     }
//!
//!     fn release(&mut self)
//!     {
//!         self.0 = true;
//!     }
//! }
//!
//! let guard = ResourceGuard::new(Box::new(Handle(false)));
//! assert!(!guard.0);
//! drop(guard); // release() runs here
//! ```

use std::ops::{Deref, DerefMut};

use tracing::trace;

use super::backend::BackendResource;

/// RAII guard that releases a backend resource when dropped.
pub struct ResourceGuard<R: BackendResource + ?Sized>
{
    resource: Box<R>,
    active: bool,
}

impl<R: BackendResource + ?Sized> ResourceGuard<R>
{
    /// Take ownership of a freshly acquired resource.
    pub fn new(resource: Box<R>) -> Self
    {
        trace!("acquired backend resource: {}", resource.label());
        Self { resource, active: true }
    }

    /// Release the resource now instead of at scope end.
    pub fn release(mut self)
    {
        self.release_inner();
    }

    fn release_inner(&mut self)
    {
        if self.active {
            self.resource.release();
            self.active = false;
            trace!("released backend resource: {}", self.resource.label());
        }
    }
}

impl<R: BackendResource + ?Sized> Deref for ResourceGuard<R>
{
    type Target = R;

    fn deref(&self) -> &Self::Target
    {
        &self.resource
    }
}

impl<R: BackendResource + ?Sized> DerefMut for ResourceGuard<R>
{
    fn deref_mut(&mut self) -> &mut Self::Target
    {
        &mut self.resource
    }
}

impl<R: BackendResource + ?Sized> Drop for ResourceGuard<R>
{
    fn drop(&mut self)
    {
        self.release_inner();
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Counted(Arc<AtomicUsize>);

    impl BackendResource for Counted
    {
        fn label(&self) -> &'static str
        {
            "counted"
        }

        fn release(&mut self)
        {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_drop_releases_once()
    {
        let releases = Arc::new(AtomicUsize::new(0));
        {
            let _guard = ResourceGuard::new(Box::new(Counted(releases.clone())));
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_early_release_is_not_repeated_on_drop()
    {
        let releases = Arc::new(AtomicUsize::new(0));
        let guard = ResourceGuard::new(Box::new(Counted(releases.clone())));
        guard.release();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_on_error_path()
    {
        fn fails(releases: &Arc<AtomicUsize>) -> Result<(), &'static str>
        {
            let _guard = ResourceGuard::new(Box::new(Counted(releases.clone())));
            let outcome: Result<(), &'static str> = Err("backend failed");
            outcome?;
            Ok(())
        }

        let releases = Arc::new(AtomicUsize::new(0));
        assert!(fails(&releases).is_err());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
