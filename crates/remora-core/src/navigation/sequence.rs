//! # Lazy Sequences
//!
//! [`ArrayWalk`] and [`ListWalk`] describe a traversal without performing it.
//! Each call to `to_vec`, `stream` or `.await` walks the debuggee again from
//! the start, so a walk can be kept around and re-run after the target
//! breaks in again.
//!
//! Both walks stop with `SequenceLimitExceeded` once they would produce more
//! than [`crate::config::NavigatorConfig::max_sequence_len`] elements, which
//! catches cyclic lists and garbage length fields.

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};

use super::handle::RemoteObject;
use super::navigator::Navigator;
use super::path::FieldPath;
use super::pending::Pending;
use crate::error::{RemoraError, RemoraResult};
use crate::metadata::{ArrayLength, ArrayStorage};
use crate::types::{Address, ScalarKind};

/// Function deriving the next list element from the current one.
pub type NextFn = Arc<dyn Fn(&Navigator, RemoteObject) -> Pending<'static, RemoteObject> + Send + Sync>;

/// How a list advances from one element to the next.
#[derive(Clone)]
pub enum NextLink
{
    /// Follow a (possibly aliased, possibly dotted) pointer field.
    Path(FieldPath),
    /// Compute the next element, e.g. `item.f("data.next").latest_patch()`.
    Func(NextFn),
}

impl NextLink
{
    /// Wrap a function as a link.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Navigator, RemoteObject) -> Pending<'static, RemoteObject> + Send + Sync + 'static,
    {
        Self::Func(Arc::new(f))
    }
}

impl fmt::Debug for NextLink
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<FieldPath> for NextLink
{
    fn from(path: FieldPath) -> Self
    {
        Self::Path(path)
    }
}

impl From<&str> for NextLink
{
    fn from(path: &str) -> Self
    {
        Self::Path(path.into())
    }
}

impl<const N: usize> From<[&str; N]> for NextLink
{
    fn from(candidates: [&str; N]) -> Self
    {
        Self::Path(candidates.into())
    }
}

/// Walk, previously yielded element, count so far.
type ListState = (ListWalk, Option<RemoteObject>, usize);

/// Restartable walk over a singly linked list.
///
/// Yields the head, then each element reached through the link, stopping at
/// the first NULL. Pointer-typed elements are dereferenced, so the yielded
/// handles are the nodes themselves.
#[derive(Clone, Debug)]
pub struct ListWalk
{
    nav: Navigator,
    head: RemoteObject,
    next: NextLink,
}

impl ListWalk
{
    pub(crate) fn new(nav: Navigator, head: RemoteObject, next: NextLink) -> Self
    {
        Self { nav, head, next }
    }

    /// Stream the elements one read at a time.
    pub fn stream(&self) -> BoxStream<'static, RemoraResult<RemoteObject>>
    {
        let limit = self.nav.config().max_sequence_len;
        stream::try_unfold((self.clone(), None, 0usize), move |(walk, previous, yielded)| {
            walk.step(previous, yielded, limit)
        })
        .boxed()
    }

    /// Walk the whole list.
    pub fn to_vec(&self) -> Pending<'static, Vec<RemoteObject>>
    {
        Pending::new(self.stream().try_collect())
    }

    async fn step(
        self,
        previous: Option<RemoteObject>,
        yielded: usize,
        limit: usize,
    ) -> RemoraResult<Option<(RemoteObject, ListState)>>
    {
        let current = match previous {
            None => self.nav.auto_deref(self.head.clone()).await?,
            Some(previous) => self.advance(previous).await?,
        };
        if current.is_null() {
            return Ok(None);
        }
        if yielded >= limit {
            return Err(RemoraError::SequenceLimitExceeded(limit));
        }
        Ok(Some((current.clone(), (self, Some(current), yielded + 1))))
    }

    async fn advance(&self, current: RemoteObject) -> RemoraResult<RemoteObject>
    {
        let next = match &self.next {
            NextLink::Path(path) => self.nav.resolve_field(current, path).await?,
            NextLink::Func(link) => link(&self.nav, current).await?,
        };
        self.nav.auto_deref(next).await
    }
}

impl IntoFuture for ListWalk
{
    type Output = RemoraResult<Vec<RemoteObject>>;
    type IntoFuture = Pending<'static, Vec<RemoteObject>>;

    fn into_future(self) -> Self::IntoFuture
    {
        self.to_vec()
    }
}

/// Where an array's elements are and how many there are.
#[derive(Debug, Clone)]
struct ArrayPlan
{
    first: RemoteObject,
    stride: u64,
    count: u64,
}

impl ArrayPlan
{
    fn empty() -> Self
    {
        Self {
            first: RemoteObject::null(),
            stride: 0,
            count: 0,
        }
    }

    fn element(&self, index: u64) -> RemoraResult<RemoteObject>
    {
        let address = self
            .first
            .address()
            .element(index, self.stride)
            .ok_or_else(|| RemoraError::InvalidArgument(format!("element {index} of {} overflows", self.first)))?;
        Ok(self.first.at(address))
    }
}

/// Restartable walk over a contiguous array.
///
/// Elements are addressed as `base + index * element_size`; no element memory
/// is read, only the length and storage pointer when the layout calls for
/// them.
#[derive(Clone, Debug)]
pub struct ArrayWalk
{
    nav: Navigator,
    handle: RemoteObject,
    count: Option<u64>,
}

impl ArrayWalk
{
    pub(crate) fn new(nav: Navigator, handle: RemoteObject, count: Option<u64>) -> Self
    {
        Self { nav, handle, count }
    }

    /// Number of elements the walk will produce.
    pub fn len(&self) -> Pending<'static, u64>
    {
        let walk = self.clone();
        Pending::new(async move { Ok(walk.plan().await?.count) })
    }

    /// Stream the element handles.
    pub fn stream(&self) -> BoxStream<'static, RemoraResult<RemoteObject>>
    {
        let walk = self.clone();
        stream::once(async move { walk.plan().await })
            .map_ok(|plan| stream::iter((0..plan.count).map(move |index| plan.element(index))))
            .try_flatten()
            .boxed()
    }

    /// All element handles, in index order.
    pub fn to_vec(&self) -> Pending<'static, Vec<RemoteObject>>
    {
        let walk = self.clone();
        Pending::new(async move {
            let plan = walk.plan().await?;
            (0..plan.count).map(|index| plan.element(index)).collect()
        })
    }

    async fn plan(&self) -> RemoraResult<ArrayPlan>
    {
        let nav = &self.nav;
        let handle = nav.auto_deref(self.handle.clone()).await?;
        if handle.is_null() {
            return Ok(ArrayPlan::empty());
        }

        let layout = if ScalarKind::from_type_name(handle.type_name()).is_some() {
            None
        } else {
            nav.descriptor_of(&handle).await?.array.clone()
        };

        let plan = match (layout, self.count) {
            (Some(layout), explicit) => {
                let base = match &layout.storage {
                    ArrayStorage::Inline => handle.address(),
                    ArrayStorage::Pointer { field } => {
                        let pointer = nav.resolve_field(handle.clone(), &FieldPath::from(field.as_str())).await?;
                        nav.pointer_target(&pointer).await?
                    }
                };
                let count = match (explicit, &layout.length) {
                    (Some(count), _) => count,
                    (None, ArrayLength::Fixed(count)) => *count,
                    (None, ArrayLength::Field(field)) => {
                        let length = nav.resolve_field(handle.clone(), &FieldPath::from(field.as_str())).await?;
                        nav.scalar(&length).await?.as_u64().ok_or_else(|| {
                            RemoraError::InvalidArgument(format!("length field {field} of {handle} is negative"))
                        })?
                    }
                };
                ArrayPlan {
                    first: RemoteObject::new(handle.module(), layout.element_type.as_str(), base),
                    stride: layout.element_size,
                    count: if base == Address::NULL { 0 } else { count },
                }
            }
            (None, Some(count)) => ArrayPlan {
                stride: nav.type_size(handle.module(), handle.type_name()).await?,
                first: handle,
                count,
            },
            (None, None) => {
                return Err(RemoraError::InvalidArgument(format!(
                    "{} has no array layout; give an explicit count",
                    handle.type_name()
                )));
            }
        };

        let limit = nav.config().max_sequence_len;
        if plan.count > limit as u64 {
            return Err(RemoraError::SequenceLimitExceeded(limit));
        }
        Ok(plan)
    }
}

impl IntoFuture for ArrayWalk
{
    type Output = RemoraResult<Vec<RemoteObject>>;
    type IntoFuture = Pending<'static, Vec<RemoteObject>>;

    fn into_future(self) -> Self::IntoFuture
    {
        self.to_vec()
    }
}
