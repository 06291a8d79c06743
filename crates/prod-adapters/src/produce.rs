//! Authoring layer for ordinary async members.
//!
//! Most members of an aggregate are just an async computation with no
//! fallible start step. `Produce` is the convenient `async fn` style trait
//! for writing them; `ProduceProducer` adapts it to the core's two-phase
//! seam with an infallible `start()`.

use std::future::Future;

use async_trait::async_trait;

use prod_core::{Producer, ProducerError, ProducerFuture};

#[async_trait]
pub trait Produce<V>: Send + Sync {
    async fn produce(&self) -> Result<V, ProducerError>;
}

pub struct ProduceProducer<P> {
    inner: P,
}

impl<P> ProduceProducer<P> {
    #[inline]
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<V, P> Producer<V> for ProduceProducer<P>
    where P: Produce<V>,
          V: Send + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, V>, ProducerError> {
        Ok(self.inner.produce())
    }
}

/// Productor a partir de una clausura asíncrona; útil en tests y cableados
/// ad hoc.
pub struct FnProducer<F> {
    f: F,
}

impl<F> FnProducer<F> {
    #[inline]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<V, F, Fut> Producer<V> for FnProducer<F>
    where F: Fn() -> Fut + Send + Sync,
          Fut: Future<Output = Result<V, ProducerError>> + Send + 'static,
          V: Send + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, V>, ProducerError> {
        Ok(Box::pin((self.f)()))
    }
}
