//! # Pending Operations
//!
//! [`Pending`] is a boxed future that settles once to a [`RemoraResult`].
//! Navigation steps return it so chains can be built without awaiting each
//! step by hand:
//!
//! ```rust
//! use remora_core::navigation::Pending;
//!
//! # futures::executor::block_on(async {
//! let doubled = Pending::ready(21).map(|v| v * 2);
//! assert_eq!(doubled.await.unwrap(), 42);
//!
//! let recovered = Pending::<u32>::failed(remora_core::error::RemoraError::InvalidArgument("x".into())).or(7);
//! assert_eq!(recovered.await.unwrap(), 7);
//! # });
//! ```
//!
//! A failure skips every later `map`/`and_then` and surfaces at the end of the
//! chain unless an `or_else`, `or`, `then` or `or_empty` handles it.
//! Sequence combinators keep element order.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::error::{RemoraError, RemoraResult};

/// A navigation result that has not settled yet.
#[must_use = "pending operations do nothing unless awaited"]
pub struct Pending<'a, T>
{
    inner: BoxFuture<'a, RemoraResult<T>>,
}

impl<'a, T: Send + 'a> Pending<'a, T>
{
    /// Wrap any future producing a `RemoraResult`.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = RemoraResult<T>> + Send + 'a,
    {
        Self { inner: future.boxed() }
    }

    /// Already settled with `value`.
    pub fn ready(value: T) -> Self
    {
        Self::new(future::ready(Ok(value)))
    }

    /// Already settled with `error`.
    pub fn failed(error: RemoraError) -> Self
    {
        Self::new(future::ready(Err(error)))
    }

    /// Transform the value.
    pub fn map<U, F>(self, f: F) -> Pending<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        Pending::new(async move { self.inner.await.map(f) })
    }

    /// Continue with another fallible step.
    pub fn and_then<U, F, Fut>(self, f: F) -> Pending<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> Fut + Send + 'a,
        Fut: Future<Output = RemoraResult<U>> + Send + 'a,
    {
        Pending::new(async move { f(self.inner.await?).await })
    }

    /// Continue on both outcomes.
    pub fn then<U, S, E, FutS, FutE>(self, on_success: S, on_failure: E) -> Pending<'a, U>
    where
        U: Send + 'a,
        S: FnOnce(T) -> FutS + Send + 'a,
        E: FnOnce(RemoraError) -> FutE + Send + 'a,
        FutS: Future<Output = RemoraResult<U>> + Send + 'a,
        FutE: Future<Output = RemoraResult<U>> + Send + 'a,
    {
        Pending::new(async move {
            match self.inner.await {
                Ok(value) => on_success(value).await,
                Err(err) => on_failure(err).await,
            }
        })
    }

    /// Recover from a failure with another fallible step.
    pub fn or_else<F, Fut>(self, f: F) -> Self
    where
        F: FnOnce(RemoraError) -> Fut + Send + 'a,
        Fut: Future<Output = RemoraResult<T>> + Send + 'a,
    {
        Pending::new(async move {
            match self.inner.await {
                Ok(value) => Ok(value),
                Err(err) => f(err).await,
            }
        })
    }

    /// Replace a failure with `fallback`.
    pub fn or(self, fallback: T) -> Self
    {
        Pending::new(async move { Ok(self.inner.await.unwrap_or(fallback)) })
    }

    /// Settle every operation, keeping input order; the first failure wins.
    pub fn join_all<I>(operations: I) -> Pending<'a, Vec<T>>
    where
        I: IntoIterator<Item = Pending<'a, T>>,
    {
        Pending::new(future::try_join_all(operations))
    }
}

impl<'a, T: Send + 'a> Pending<'a, Vec<T>>
{
    /// Apply a fallible step to every element, keeping order.
    pub fn map_each<U, F, Fut>(self, f: F) -> Pending<'a, Vec<U>>
    where
        U: Send + 'a,
        F: Fn(T) -> Fut + Send + 'a,
        Fut: Future<Output = RemoraResult<U>> + Send + 'a,
    {
        self.and_then(move |items| future::try_join_all(items.into_iter().map(f)))
    }

    /// Keep the elements for which `predicate` settles to `true`.
    pub fn filter_each<F, Fut>(self, predicate: F) -> Self
    where
        T: Clone,
        F: Fn(T) -> Fut + Send + 'a,
        Fut: Future<Output = RemoraResult<bool>> + Send + 'a,
    {
        self.and_then(move |items| async move {
            let checks: Vec<Fut> = items.iter().cloned().map(&predicate).collect();
            let verdicts = future::try_join_all(checks).await?;
            Ok(items
                .into_iter()
                .zip(verdicts)
                .filter_map(|(item, keep)| keep.then_some(item))
                .collect())
        })
    }

    /// Expand every element into a sequence and concatenate them in order.
    pub fn flat_map_each<U, F, Fut>(self, f: F) -> Pending<'a, Vec<U>>
    where
        U: Send + 'a,
        F: Fn(T) -> Fut + Send + 'a,
        Fut: Future<Output = RemoraResult<Vec<U>>> + Send + 'a,
    {
        self.map_each(f).map(|nested| nested.into_iter().flatten().collect())
    }

    /// Replace a failure with an empty sequence.
    pub fn or_empty(self) -> Self
    {
        self.or(Vec::new())
    }
}

impl<T> Future for Pending<'_, T>
{
    type Output = RemoraResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output>
    {
        self.inner.poll_unpin(cx)
    }
}
