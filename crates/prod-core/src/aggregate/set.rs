//! Agregador sin claves: contribuciones individuales y de colección que se
//! computan a un conjunto con orden de inserción.
//!
//! Es el pariente multibinding del mapa: cada contribución es un productor
//! independiente, la barrera espera a todas, y cualquier fallo de miembro
//! tumba el agregado (no hay clave tras la cual aislar el fallo). Las
//! contribuciones se etiquetan por posición (`element#i` / `collection#i`)
//! para los diagnósticos.

use std::fmt;

use futures::future::join_all;
use indexmap::IndexSet;
use tracing::debug;

use crate::errors::{ComputeError, ProducerError};
use crate::producer::{immediate, Producer, ProducerFuture, SharedProducer};

pub struct SetProducer<V> {
    individual: Vec<SharedProducer<V>>,
    collections: Vec<SharedProducer<Vec<V>>>,
}

impl<V> SetProducer<V>
    where V: Eq + std::hash::Hash + Send + 'static
{
    #[inline]
    pub fn builder(expected: usize) -> SetProducerBuilder<V> {
        SetProducerBuilder::new(expected)
    }

    pub fn len(&self) -> usize {
        self.individual.len() + self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individual.is_empty() && self.collections.is_empty()
    }

    /// Arranca todas las contribuciones, normalizadas a futuros de `Vec<V>`.
    fn fan_out(&self) -> Result<Vec<(String, ProducerFuture<'_, Vec<V>>)>, ComputeError> {
        let mut started: Vec<(String, ProducerFuture<'_, Vec<V>>)> =
            Vec::with_capacity(self.individual.len() + self.collections.len());

        for (i, producer) in self.individual.iter().enumerate() {
            let label = format!("element#{i}");
            let fut = producer.start().map_err(|e| ComputeError::MemberStart { key: label.clone(),
                                                                               source: e })?;
            started.push((label, Box::pin(async move { fut.await.map(|v| vec![v]) })));
        }
        for (i, producer) in self.collections.iter().enumerate() {
            let label = format!("collection#{i}");
            let fut = producer.start().map_err(|e| ComputeError::MemberStart { key: label.clone(),
                                                                               source: e })?;
            started.push((label, fut));
        }
        Ok(started)
    }

    pub async fn compute(&self) -> Result<IndexSet<V>, ComputeError> {
        let started = self.fan_out()?;
        debug!(contributions = started.len(), "fan-out completo, esperando la barrera");
        join_contributions(started).await
    }
}

async fn join_contributions<V>(started: Vec<(String, ProducerFuture<'_, Vec<V>>)>)
                               -> Result<IndexSet<V>, ComputeError>
    where V: Eq + std::hash::Hash + Send + 'static
{
    let results = join_all(started.into_iter().map(|(label, fut)| {
                               async move { (label, fut.await) }
                           })).await;

    let mut out = IndexSet::new();
    for (label, result) in results {
        match result {
            Ok(values) => out.extend(values),
            Err(source) => {
                return Err(ComputeError::MemberFailed { key: label, source });
            }
        }
    }
    Ok(out)
}

impl<V> fmt::Debug for SetProducer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetProducer")
         .field("individual", &self.individual.len())
         .field("collections", &self.collections.len())
         .finish()
    }
}

impl<V> Producer<IndexSet<V>> for SetProducer<V>
    where V: Eq + std::hash::Hash + Send + Sync + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, IndexSet<V>>, ProducerError> {
        let started = self.fan_out().map_err(ProducerError::new)?;
        Ok(Box::pin(async move { join_contributions(started).await.map_err(ProducerError::new) }))
    }
}

/// Builder del agregador de conjunto. Sin claves no hay centinelas ni
/// duplicados que validar, así que la construcción es infalible.
pub struct SetProducerBuilder<V> {
    individual: Vec<SharedProducer<V>>,
    collections: Vec<SharedProducer<Vec<V>>>,
}

impl<V> SetProducerBuilder<V>
    where V: Eq + std::hash::Hash + Send + 'static
{
    #[inline]
    pub fn new(expected: usize) -> Self {
        Self { individual: Vec::with_capacity(expected),
               collections: Vec::new() }
    }

    /// Añade una contribución individual.
    pub fn add<P>(&mut self, producer: P) -> &mut Self
        where P: Producer<V> + 'static
    {
        self.individual.push(std::sync::Arc::new(producer));
        self
    }

    pub fn add_shared(&mut self, producer: SharedProducer<V>) -> &mut Self {
        self.individual.push(producer);
        self
    }

    pub fn add_value(&mut self, value: V) -> &mut Self
        where V: Clone + Sync
    {
        self.individual.push(std::sync::Arc::new(immediate(value)));
        self
    }

    /// Añade una contribución de colección; sus elementos se aplanan en el
    /// conjunto final tras las contribuciones individuales.
    pub fn add_collection<P>(&mut self, producer: P) -> &mut Self
        where P: Producer<Vec<V>> + 'static
    {
        self.collections.push(std::sync::Arc::new(producer));
        self
    }

    pub fn build(self) -> SetProducer<V> {
        SetProducer { individual: self.individual,
                      collections: self.collections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::immediate_failed;

    #[tokio::test]
    async fn contributions_flatten_in_order_and_dedup() {
        let mut builder = SetProducer::builder(2);
        builder.add_value(1u32).add_value(2u32).add_collection(immediate(vec![3u32, 1]));
        let set = builder.build();

        let result = set.compute().await.unwrap();
        let values: Vec<_> = result.iter().copied().collect();
        // El 1 repetido de la colección no vuelve a entrar.
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn member_failure_fails_aggregate_with_position_label() {
        let mut builder = SetProducer::builder(2);
        builder.add_value(1u32).add(immediate_failed::<u32>(ProducerError::msg("sin datos")));
        let set = builder.build();

        let err = set.compute().await.unwrap_err();
        match err {
            ComputeError::MemberFailed { key, source } => {
                assert_eq!(key, "element#1");
                assert_eq!(source.to_string(), "sin datos");
            }
            other => panic!("se esperaba MemberFailed, llegó {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_set_computes_to_empty() {
        let set: SetProducer<u32> = SetProducer::builder(0).build();
        assert!(set.compute().await.unwrap().is_empty());
    }
}
