//! Map aggregator without per-entry isolation: key → plain value.
//!
//! Shares the builder and the join barrier with the `Produced` aggregator,
//! but here any member failure fails the whole aggregate. The barrier still
//! waits for everyone (no short-circuit) and the first failure in insertion
//! order is reported, so the error is deterministic.

use std::fmt;

use futures::future::join_all;
use indexmap::IndexMap;
use tracing::debug;

use crate::errors::{BuildError, ComputeError, ProducerError};
use crate::producer::{immediate, Producer, ProducerFuture, SharedProducer};

use super::{start_all, AssociationKey, AssociationSet, AssociationView, Associations};

pub struct MapProducer<K, V> {
    associations: AssociationSet<K, V>,
}

impl<K, V> MapProducer<K, V>
    where K: AssociationKey,
          V: Send + 'static
{
    #[inline]
    pub fn builder(expected: usize) -> MapProducerBuilder<K, V> {
        MapProducerBuilder::new(expected)
    }

    pub fn len(&self) -> usize {
        self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }

    fn fan_out(&self) -> Result<Vec<(K, ProducerFuture<'_, V>)>, ComputeError> {
        start_all(&self.associations)
    }

    pub async fn compute(&self) -> Result<IndexMap<K, V>, ComputeError> {
        let started = self.fan_out()?;
        debug!(members = started.len(), "fan-out completo, esperando la barrera");
        join_values(started).await
    }
}

async fn join_values<K, V>(started: Vec<(K, ProducerFuture<'_, V>)>) -> Result<IndexMap<K, V>, ComputeError>
    where K: AssociationKey,
          V: Send + 'static
{
    let entries = join_all(started.into_iter().map(|(key, fut)| {
                               async move { (key, fut.await) }
                           })).await;

    let mut out = IndexMap::with_capacity(entries.len());
    for (key, result) in entries {
        match result {
            Ok(value) => {
                out.insert(key, value);
            }
            Err(source) => {
                return Err(ComputeError::MemberFailed { key: format!("{key:?}"),
                                                        source });
            }
        }
    }
    Ok(out)
}

impl<K, V> fmt::Debug for MapProducer<K, V>
    where K: fmt::Debug
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapProducer")
         .field("keys", &self.associations.keys().collect::<Vec<_>>())
         .finish()
    }
}

impl<K, V> AssociationView<K, V> for MapProducer<K, V> {
    fn associations(&self) -> Option<&AssociationSet<K, V>> {
        Some(&self.associations)
    }
}

impl<K, V> Producer<IndexMap<K, V>> for MapProducer<K, V>
    where K: AssociationKey,
          V: Send + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, IndexMap<K, V>>, ProducerError> {
        let started = self.fan_out().map_err(ProducerError::new)?;
        Ok(Box::pin(async move { join_values(started).await.map_err(ProducerError::new) }))
    }
}

pub struct MapProducerBuilder<K, V> {
    inner: Associations<K, V>,
}

impl<K, V> fmt::Debug for MapProducerBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapProducerBuilder").field("entries", &self.inner.len()).finish()
    }
}

impl<K, V> MapProducerBuilder<K, V>
    where K: AssociationKey,
          V: Send + 'static
{
    #[inline]
    pub fn new(expected: usize) -> Self {
        Self { inner: Associations::with_capacity(expected) }
    }

    pub fn put<P>(&mut self, key: K, producer: P) -> Result<&mut Self, BuildError>
        where P: Producer<V> + 'static
    {
        self.inner.put_shared(key, std::sync::Arc::new(producer))?;
        Ok(self)
    }

    pub fn put_shared(&mut self, key: K, producer: SharedProducer<V>) -> Result<&mut Self, BuildError> {
        self.inner.put_shared(key, producer)?;
        Ok(self)
    }

    pub fn put_value(&mut self, key: K, value: V) -> Result<&mut Self, BuildError>
        where V: Clone + Sync
    {
        self.inner.put_shared(key, std::sync::Arc::new(immediate(value)))?;
        Ok(self)
    }

    pub fn put_all(&mut self, parent: &dyn AssociationView<K, V>) -> Result<&mut Self, BuildError> {
        self.inner.merge(parent)?;
        Ok(self)
    }

    pub fn build(self) -> Result<MapProducer<K, V>, BuildError> {
        Ok(MapProducer { associations: self.inner.freeze()? })
    }
}
