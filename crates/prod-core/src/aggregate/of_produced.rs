//! Agregador con aislamiento por entrada: mapa clave → `Produced<V>`.
//!
//! `compute()` arranca todos los miembros, convierte cada futuro en un
//! `Produced` que nunca falla, espera la barrera AND y ensambla el mapa
//! final en el orden de inserción de las asociaciones. El único fallo capaz
//! de tumbar el agregado completo es el arranque síncrono de un miembro
//! (`ComputeError::MemberStart`).

use std::fmt;

use futures::future::join_all;
use indexmap::IndexMap;
use tracing::debug;

use crate::errors::{BuildError, ComputeError, ProducerError};
use crate::produced::Produced;
use crate::producer::{immediate, Producer, ProducerFuture, SharedProducer};

use super::{start_all, AssociationKey, AssociationSet, AssociationView, Associations};

/// Mapa final clave → resultado observado, en el orden del conjunto de
/// asociaciones.
pub type ResultMap<K, V> = IndexMap<K, Produced<V>>;

/// Agregador inmutable; seguro para invocar `compute()` concurrentemente.
pub struct ProducedMapProducer<K, V> {
    associations: AssociationSet<K, V>,
}

impl<K, V> ProducedMapProducer<K, V>
    where K: AssociationKey,
          V: Send + 'static
{
    /// Crea un builder con pista de capacidad para `expected` entradas.
    #[inline]
    pub fn builder(expected: usize) -> ProducedMapBuilder<K, V> {
        ProducedMapBuilder::new(expected)
    }

    pub fn len(&self) -> usize {
        self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }

    /// Fan-out síncrono. Separado de `compute` para que la implementación de
    /// `Producer` conserve la misma asimetría de fallo al componer.
    fn fan_out(&self) -> Result<Vec<(K, ProducerFuture<'_, V>)>, ComputeError> {
        start_all(&self.associations)
    }

    /// Computa el mapa completo.
    ///
    /// Re-invocarlo vuelve a arrancar cada miembro; si se quiere memoizar el
    /// resultado, se envuelve el agregador (o cada miembro) en el adaptador
    /// de memoización externo.
    pub async fn compute(&self) -> Result<ResultMap<K, V>, ComputeError> {
        let started = self.fan_out()?;
        debug!(members = started.len(), "fan-out completo, esperando la barrera");
        let map = join_produced(started).await;
        debug!(entries = map.len(), "fan-in completado");
        Ok(map)
    }
}

/// Barrera AND: espera todas las conversiones y ensambla preservando el
/// orden de entrada. La conversión en sí es total, nunca falla.
async fn join_produced<K, V>(started: Vec<(K, ProducerFuture<'_, V>)>) -> ResultMap<K, V>
    where K: AssociationKey,
          V: Send + 'static
{
    let entries = join_all(started.into_iter().map(|(key, fut)| {
                               async move { (key, Produced::from_result(fut.await)) }
                           })).await;
    entries.into_iter().collect()
}

impl<K, V> fmt::Debug for ProducedMapProducer<K, V>
    where K: fmt::Debug
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducedMapProducer")
         .field("keys", &self.associations.keys().collect::<Vec<_>>())
         .finish()
    }
}

impl<K, V> AssociationView<K, V> for ProducedMapProducer<K, V> {
    fn associations(&self) -> Option<&AssociationSet<K, V>> {
        Some(&self.associations)
    }
}

/// El agregador es, a su vez, un productor del mapa completo, de modo que
/// puede participar como miembro de un agregado mayor o envolverse en el
/// adaptador de memoización. El fan-out ocurre dentro de `start`, así que la
/// asimetría arranque-síncrono/fallo-asíncrono se conserva al anidar.
impl<K, V> Producer<ResultMap<K, V>> for ProducedMapProducer<K, V>
    where K: AssociationKey,
          V: Send + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, ResultMap<K, V>>, ProducerError> {
        let started = self.fan_out().map_err(ProducerError::new)?;
        Ok(Box::pin(async move { Ok(join_produced(started).await) }))
    }
}

/// Builder incremental del agregador. Mutación secuencial de un solo dueño;
/// `build` lo consume y congela el conjunto de asociaciones.
pub struct ProducedMapBuilder<K, V> {
    inner: Associations<K, V>,
}

impl<K, V> fmt::Debug for ProducedMapBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducedMapBuilder").field("entries", &self.inner.len()).finish()
    }
}

impl<K, V> ProducedMapBuilder<K, V>
    where K: AssociationKey,
          V: Send + 'static
{
    #[inline]
    pub fn new(expected: usize) -> Self {
        Self { inner: Associations::with_capacity(expected) }
    }

    /// Asocia `key` con un productor. Falla con `InvalidArgument` ante una
    /// clave centinela, dejando el estado previo intacto; los duplicados se
    /// detectan en `build`.
    pub fn put<P>(&mut self, key: K, producer: P) -> Result<&mut Self, BuildError>
        where P: Producer<V> + 'static
    {
        self.inner.put_shared(key, std::sync::Arc::new(producer))?;
        Ok(self)
    }

    /// Variante para productores ya compartidos.
    pub fn put_shared(&mut self, key: K, producer: SharedProducer<V>) -> Result<&mut Self, BuildError> {
        self.inner.put_shared(key, producer)?;
        Ok(self)
    }

    /// Asocia `key` con un valor ya disponible, envuelto como productor que
    /// resuelve inmediatamente.
    pub fn put_value(&mut self, key: K, value: V) -> Result<&mut Self, BuildError>
        where V: Clone + Sync
    {
        self.inner.put_shared(key, std::sync::Arc::new(immediate(value)))?;
        Ok(self)
    }

    /// Fusiona las asociaciones de un agregador ya construido (composición
    /// por capas: una configuración derivada extiende a su base). El
    /// argumento debe exponer la vista tipada de asociaciones; si no lo
    /// hace, `TypeMismatch`. Las claves repetidas entre capas emergen como
    /// `DuplicateKey` recién en `build`.
    pub fn put_all(&mut self, parent: &dyn AssociationView<K, V>) -> Result<&mut Self, BuildError> {
        self.inner.merge(parent)?;
        Ok(self)
    }

    /// Congela el conjunto y devuelve el agregador inmutable.
    pub fn build(self) -> Result<ProducedMapProducer<K, V>, BuildError> {
        Ok(ProducedMapProducer { associations: self.inner.freeze()? })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::producer::immediate_failed;

    /// Productor que falla en el propio arranque, antes de volverse
    /// esperable.
    struct BrokenStart;

    impl Producer<u32> for BrokenStart {
        fn start(&self) -> Result<ProducerFuture<'_, u32>, ProducerError> {
            Err(ProducerError::msg("no pude arrancar"))
        }
    }

    /// Productor que resuelve tras una pausa, para forzar órdenes de
    /// finalización distintos del orden de inserción.
    struct SlowProducer {
        value: u32,
        delay_ms: u64,
    }

    impl Producer<u32> for SlowProducer {
        fn start(&self) -> Result<ProducerFuture<'_, u32>, ProducerError> {
            let value = self.value;
            let delay = Duration::from_millis(self.delay_ms);
            Ok(Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(value)
            }))
        }
    }

    #[tokio::test]
    async fn result_map_preserves_insertion_order() {
        // Los miembros terminan en orden inverso al de inserción.
        let mut builder = ProducedMapProducer::builder(3);
        builder.put("primero", SlowProducer { value: 1, delay_ms: 30 })
               .unwrap()
               .put("segundo", SlowProducer { value: 2, delay_ms: 15 })
               .unwrap()
               .put("tercero", SlowProducer { value: 3, delay_ms: 1 })
               .unwrap();
        let map = builder.build().unwrap();

        let result = map.compute().await.expect("compute debe completar");
        let keys: Vec<_> = result.keys().copied().collect();
        assert_eq!(keys, vec!["primero", "segundo", "tercero"]);
        assert_eq!(result["tercero"], Produced::succeeded(3));
    }

    #[tokio::test]
    async fn async_failure_is_isolated_per_entry() {
        // Escenario: {"a": ok(1), "b": fail(E)} -> {"a": Success, "b": Failure}
        let mut builder = ProducedMapProducer::builder(2);
        builder.put_value("a", 1u32)
               .unwrap()
               .put("b", immediate_failed(ProducerError::msg("E")))
               .unwrap();
        let map = builder.build().unwrap();

        let result = map.compute().await.expect("el agregado no debe fallar");
        assert_eq!(result.len(), 2);
        assert_eq!(result["a"], Produced::succeeded(1));
        assert_eq!(result["b"].err().unwrap().to_string(), "E");
        let keys: Vec<_> = result.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn sync_start_failure_aborts_whole_compute() {
        let mut builder = ProducedMapProducer::builder(2);
        builder.put_value("sano", 5u32).unwrap().put("roto", BrokenStart).unwrap();
        let map = builder.build().unwrap();

        let err = map.compute().await.expect_err("el agregado completo debe fallar");
        match err {
            ComputeError::MemberStart { key, source } => {
                assert_eq!(key, "\"roto\"");
                assert_eq!(source.to_string(), "no pude arrancar");
            }
            other => panic!("se esperaba MemberStart, llegó {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_key_fails_at_build_not_at_put() {
        let mut builder = ProducedMapProducer::builder(2);
        builder.put_value("k", 1u32).unwrap();
        // El put del duplicado se acepta; el fallo emerge al congelar.
        builder.put_value("k", 2u32).unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(err, BuildError::DuplicateKey("\"k\"".into()));
    }

    #[tokio::test]
    async fn sentinel_key_rejected_without_partial_mutation() {
        let mut builder: ProducedMapBuilder<String, u32> = ProducedMapBuilder::new(2);
        builder.put_value("antes".to_string(), 1).unwrap();
        let err = builder.put_value(String::new(), 2).unwrap_err();
        assert!(matches!(err, BuildError::InvalidArgument(_)));

        // El estado previo queda intacto: solo la entrada anterior sobrevive.
        let map = builder.build().unwrap();
        let result = map.compute().await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["antes"], Produced::succeeded(1));
    }

    #[tokio::test]
    async fn put_all_merges_parent_after_own_entries() {
        // putAll de A {"a": 1} sobre un builder con {"b": 2} -> orden b, a.
        let mut parent_builder = ProducedMapProducer::builder(1);
        parent_builder.put_value("a", 1u32).unwrap();
        let parent = parent_builder.build().unwrap();

        let mut builder = ProducedMapProducer::builder(2);
        builder.put_value("b", 2u32).unwrap();
        builder.put_all(&parent).unwrap();
        let merged = builder.build().unwrap();

        let result = merged.compute().await.unwrap();
        let keys: Vec<_> = result.keys().copied().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(result["b"], Produced::succeeded(2));
        assert_eq!(result["a"], Produced::succeeded(1));
    }

    #[tokio::test]
    async fn put_all_duplicates_surface_at_build() {
        let mut parent_builder = ProducedMapProducer::builder(1);
        parent_builder.put_value("x", 1u32).unwrap();
        let parent = parent_builder.build().unwrap();

        let mut builder = ProducedMapProducer::builder(2);
        builder.put_value("x", 9u32).unwrap();
        builder.put_all(&parent).unwrap(); // el merge en sí no falla
        let err = builder.build().unwrap_err();
        assert_eq!(err, BuildError::DuplicateKey("\"x\"".into()));
    }

    #[tokio::test]
    async fn put_all_without_view_is_type_mismatch() {
        struct Opaque;
        impl AssociationView<&'static str, u32> for Opaque {}

        let mut builder: ProducedMapBuilder<&'static str, u32> = ProducedMapBuilder::new(1);
        let err = builder.put_all(&Opaque).unwrap_err();
        assert_eq!(err, BuildError::TypeMismatch);
    }

    #[tokio::test]
    async fn compute_twice_yields_equal_contents() {
        let mut builder = ProducedMapProducer::builder(2);
        builder.put_value("a", 1u32)
               .unwrap()
               .put("b", immediate_failed(ProducerError::msg("E")))
               .unwrap();
        let map = builder.build().unwrap();

        let first = map.compute().await.unwrap();
        let second = map.compute().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_aggregate_computes_to_empty_map() {
        let builder: ProducedMapBuilder<String, u32> = ProducedMapBuilder::new(0);
        let map = builder.build().unwrap();
        let result = map.compute().await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn aggregate_composes_as_member_of_outer_map() {
        // El mapa interno participa como miembro de otro agregado.
        let mut inner_builder = ProducedMapProducer::builder(1);
        inner_builder.put_value("hoja", 10u32).unwrap();
        let inner = inner_builder.build().unwrap();

        let mut outer_builder: ProducedMapBuilder<&'static str, ResultMap<&'static str, u32>> =
            ProducedMapBuilder::new(1);
        outer_builder.put("interno", inner).unwrap();
        let outer = outer_builder.build().unwrap();

        let result = outer.compute().await.unwrap();
        let inner_map = result["interno"].ok().expect("el mapa interno debe producirse");
        assert_eq!(inner_map["hoja"], Produced::succeeded(10));
    }
}
