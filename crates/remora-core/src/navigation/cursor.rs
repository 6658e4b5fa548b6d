//! # Fluent Cursors
//!
//! [`Cursor`] and [`CursorSeq`] chain navigation steps on a pending handle
//! (or a pending list of handles) so a multi-step path reads as one
//! expression:
//!
//! ```rust,ignore
//! let children = nav
//!     .at(flow)
//!     .latest_patch()
//!     .list(NextLink::func(|nav, item| nav.at(item).f("data.next").latest_patch().into_future()))
//!     .f("data.boxReference.m_pT")
//!     .vcast()
//!     .await?;
//! ```
//!
//! A failing step fails the rest of the chain. Sequence steps apply to every
//! element and keep element order.

use std::future::IntoFuture;
use std::sync::Arc;

use super::handle::RemoteObject;
use super::navigator::Navigator;
use super::path::FieldPath;
use super::pending::Pending;
use super::sequence::NextLink;
use crate::types::{Address, ScalarValue};

/// A pending handle with navigation steps attached.
#[must_use = "cursors do nothing unless awaited"]
pub struct Cursor
{
    nav: Navigator,
    handle: Pending<'static, RemoteObject>,
}

impl Cursor
{
    /// Cursor over an already pending handle.
    pub fn new(nav: Navigator, handle: Pending<'static, RemoteObject>) -> Self
    {
        Self { nav, handle }
    }

    fn step<F>(self, f: F) -> Self
    where
        F: FnOnce(&Navigator, RemoteObject) -> Pending<'static, RemoteObject> + Send + 'static,
    {
        let nav = self.nav.clone();
        Self {
            handle: self.handle.and_then(move |handle| f(&nav, handle)),
            nav: self.nav,
        }
    }

    /// Field by path (see [`Navigator::field`]).
    pub fn f(self, path: impl Into<FieldPath>) -> Self
    {
        let path = path.into();
        self.step(move |nav, handle| nav.field(handle, path))
    }

    /// Field by path, retyped.
    pub fn field_as(self, path: impl Into<FieldPath>, type_name: &str) -> Self
    {
        let path = path.into();
        let type_name = type_name.to_string();
        self.step(move |nav, handle| nav.field_as(handle, path, &type_name))
    }

    /// Reinterpret the handle as another type at the same address.
    pub fn as_type(self, type_name: &str) -> Self
    {
        let type_name: Arc<str> = Arc::from(type_name);
        Self {
            handle: self.handle.map(move |handle| handle.retyped(type_name)),
            nav: self.nav,
        }
    }

    /// Follow a pointer.
    pub fn deref(self) -> Self
    {
        self.step(|nav, handle| nav.deref(handle))
    }

    /// Downcast to the runtime type.
    pub fn vcast(self) -> Self
    {
        self.step(|nav, handle| nav.downcast(handle))
    }

    /// Resolve the most recent patch.
    pub fn latest_patch(self) -> Self
    {
        self.step(|nav, handle| nav.latest_patch(handle))
    }

    /// Array element `index`.
    pub fn index(self, index: u64) -> Self
    {
        self.step(move |nav, handle| nav.index(handle, index))
    }

    /// Replace a failure anywhere earlier in the chain with `fallback`.
    pub fn or(self, fallback: RemoteObject) -> Self
    {
        Self {
            handle: self.handle.or(fallback),
            nav: self.nav,
        }
    }

    /// Decode the value.
    pub fn value(self) -> Pending<'static, ScalarValue>
    {
        let nav = self.nav;
        self.handle.and_then(move |handle| nav.value(handle))
    }

    /// Read the pointer value.
    pub fn pointer_value(self) -> Pending<'static, Address>
    {
        let nav = self.nav;
        self.handle.and_then(move |handle| nav.pointer_value(handle))
    }

    /// Runtime type name.
    pub fn runtime_type_name(self) -> Pending<'static, String>
    {
        let nav = self.nav;
        self.handle.and_then(move |handle| nav.runtime_type_name(handle))
    }

    /// Walk a linked list starting here.
    pub fn list(self, next: impl Into<NextLink>) -> CursorSeq
    {
        let next = next.into();
        let nav = self.nav.clone();
        CursorSeq::new(
            self.nav,
            self.handle.and_then(move |head| nav.list(head, next).to_vec()),
        )
    }

    /// Elements of the array layout.
    pub fn array(self) -> CursorSeq
    {
        let nav = self.nav.clone();
        CursorSeq::new(self.nav, self.handle.and_then(move |handle| nav.array(handle).to_vec()))
    }

    /// `count` elements starting here.
    pub fn array_n(self, count: u64) -> CursorSeq
    {
        let nav = self.nav.clone();
        CursorSeq::new(
            self.nav,
            self.handle.and_then(move |handle| nav.array_n(handle, count).to_vec()),
        )
    }
}

impl IntoFuture for Cursor
{
    type Output = crate::error::RemoraResult<RemoteObject>;
    type IntoFuture = Pending<'static, RemoteObject>;

    fn into_future(self) -> Self::IntoFuture
    {
        self.handle
    }
}

/// A pending sequence of handles with per-element steps attached.
#[must_use = "cursors do nothing unless awaited"]
pub struct CursorSeq
{
    nav: Navigator,
    items: Pending<'static, Vec<RemoteObject>>,
}

impl CursorSeq
{
    /// Cursor over an already pending sequence.
    pub fn new(nav: Navigator, items: Pending<'static, Vec<RemoteObject>>) -> Self
    {
        Self { nav, items }
    }

    fn each<F>(self, f: F) -> Self
    where
        F: Fn(&Navigator, RemoteObject) -> Pending<'static, RemoteObject> + Send + 'static,
    {
        let nav = self.nav.clone();
        Self {
            items: self.items.map_each(move |handle| f(&nav, handle)),
            nav: self.nav,
        }
    }

    fn each_seq<F>(self, f: F) -> Self
    where
        F: Fn(&Navigator, RemoteObject) -> Pending<'static, Vec<RemoteObject>> + Send + 'static,
    {
        let nav = self.nav.clone();
        Self {
            items: self.items.flat_map_each(move |handle| f(&nav, handle)),
            nav: self.nav,
        }
    }

    /// Field of every element.
    pub fn f(self, path: impl Into<FieldPath>) -> Self
    {
        let path = path.into();
        self.each(move |nav, handle| nav.field(handle, path.clone()))
    }

    /// Field of every element, retyped.
    pub fn field_as(self, path: impl Into<FieldPath>, type_name: &str) -> Self
    {
        let path = path.into();
        let type_name = type_name.to_string();
        self.each(move |nav, handle| nav.field_as(handle, path.clone(), &type_name))
    }

    /// Reinterpret every element.
    pub fn as_type(self, type_name: &str) -> Self
    {
        let type_name: Arc<str> = Arc::from(type_name);
        Self {
            items: self
                .items
                .map(move |items| items.into_iter().map(|h| h.retyped(Arc::clone(&type_name))).collect()),
            nav: self.nav,
        }
    }

    /// Dereference every element.
    pub fn deref(self) -> Self
    {
        self.each(|nav, handle| nav.deref(handle))
    }

    /// Downcast every element.
    pub fn vcast(self) -> Self
    {
        self.each(|nav, handle| nav.downcast(handle))
    }

    /// Latest patch of every element.
    pub fn latest_patch(self) -> Self
    {
        self.each(|nav, handle| nav.latest_patch(handle))
    }

    /// Element `index` of every element.
    pub fn index(self, index: u64) -> Self
    {
        self.each(move |nav, handle| nav.index(handle, index))
    }

    /// Values of every element.
    pub fn value(self) -> Pending<'static, Vec<ScalarValue>>
    {
        let nav = self.nav;
        self.items.map_each(move |handle| nav.value(handle))
    }

    /// Walk a list from every element and concatenate the results.
    pub fn list(self, next: impl Into<NextLink>) -> Self
    {
        let next = next.into();
        self.each_seq(move |nav, handle| nav.list(handle, next.clone()).to_vec())
    }

    /// Array of every element, concatenated.
    pub fn array(self) -> Self
    {
        self.each_seq(|nav, handle| nav.array(handle).to_vec())
    }

    /// `count` elements from every element, concatenated.
    pub fn array_n(self, count: u64) -> Self
    {
        self.each_seq(move |nav, handle| nav.array_n(handle, count).to_vec())
    }

    /// Transform every element with a cursor chain.
    pub fn map<F>(self, f: F) -> Self
    where
        F: Fn(Cursor) -> Cursor + Send + 'static,
    {
        self.each(move |nav, handle| f(nav.at(handle)).into_future())
    }

    /// Expand every element into a sequence and concatenate in order.
    pub fn flat_map<F>(self, f: F) -> Self
    where
        F: Fn(Cursor) -> CursorSeq + Send + 'static,
    {
        self.each_seq(move |nav, handle| f(nav.at(handle)).into_future())
    }

    /// Keep the elements for which `predicate` settles to `true`.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Navigator, RemoteObject) -> Pending<'static, bool> + Send + 'static,
    {
        let nav = self.nav.clone();
        Self {
            items: self.items.filter_each(move |handle| predicate(&nav, handle)),
            nav: self.nav,
        }
    }

    /// Drop NULL elements.
    pub fn non_null(self) -> Self
    {
        Self {
            items: self
                .items
                .map(|items| items.into_iter().filter(|handle| !handle.is_null()).collect()),
            nav: self.nav,
        }
    }

    /// Replace a failure anywhere earlier in the chain with no elements.
    pub fn or_empty(self) -> Self
    {
        Self {
            items: self.items.or_empty(),
            nav: self.nav,
        }
    }
}

impl IntoFuture for CursorSeq
{
    type Output = crate::error::RemoraResult<Vec<RemoteObject>>;
    type IntoFuture = Pending<'static, Vec<RemoteObject>>;

    fn into_future(self) -> Self::IntoFuture
    {
        self.items
    }
}
