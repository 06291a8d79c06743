//! Agregadores fan-out/fan-in sobre conjuntos de asociaciones congelados.
//!
//! Este módulo contiene la maquinaria común:
//! - `AssociationKey`: contrato de las claves (igualdad, hash, y un
//!   predicado de centinela que el builder rechaza en `put`).
//! - `AssociationSet`: mapa inmutable clave → productor, con orden de
//!   inserción (`IndexMap`). Se congela una sola vez al construir el
//!   agregador; las claves duplicadas son un error de construcción, nunca
//!   una sobrescritura silenciosa.
//! - `AssociationView`: la capacidad tipada que un agregador ya construido
//!   expone para que `put_all` pueda fusionar sus asociaciones en un builder
//!   posterior (composición por capas). Un agregador que no la exponga
//!   produce `BuildError::TypeMismatch`.
//! - `Associations`: acumulador mutable de un solo dueño que usan los
//!   builders; la detección de duplicados se difiere a `freeze` para que los
//!   merges por `put_all` puedan aplicarse en secuencia.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::{BuildError, ComputeError};
use crate::producer::{ProducerFuture, SharedProducer};

pub mod map;
pub mod of_produced;
pub mod set;

pub use map::{MapProducer, MapProducerBuilder};
pub use of_produced::{ProducedMapBuilder, ProducedMapProducer, ResultMap};
pub use set::{SetProducer, SetProducerBuilder};

/// Clave de asociación: opaca salvo por igualdad, hash y clonado.
///
/// `is_sentinel` marca valores reservados que no son claves utilizables
/// (p.ej. la cadena vacía); el builder los rechaza con `InvalidArgument` en
/// el momento del `put`.
pub trait AssociationKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {
    /// True si el valor es un centinela no utilizable como clave.
    fn is_sentinel(&self) -> bool {
        false
    }
}

impl AssociationKey for String {
    fn is_sentinel(&self) -> bool {
        self.is_empty()
    }
}

impl AssociationKey for &'static str {
    fn is_sentinel(&self) -> bool {
        self.is_empty()
    }
}

impl AssociationKey for u32 {}
impl AssociationKey for u64 {}
impl AssociationKey for i32 {}
impl AssociationKey for i64 {}
impl AssociationKey for usize {}

/// Conjunto congelado de asociaciones, en orden de inserción.
pub type AssociationSet<K, V> = IndexMap<K, SharedProducer<V>>;

/// Vista tipada sobre las asociaciones internas de un agregador construido.
///
/// Implementarla (sobrescribiendo `associations`) es lo que habilita a un
/// agregador como fuente de `put_all`; la implementación por defecto no
/// expone nada y hace que el merge falle con `TypeMismatch`.
pub trait AssociationView<K, V> {
    fn associations(&self) -> Option<&AssociationSet<K, V>> {
        None
    }
}

/// Acumulador mutable de asociaciones, propiedad exclusiva de un builder.
pub(crate) struct Associations<K, V> {
    entries: Vec<(K, SharedProducer<V>)>,
}

impl<K, V> Associations<K, V> {
    /// `expected` es solo una pista de capacidad, no una cota.
    pub(crate) fn with_capacity(expected: usize) -> Self {
        Self { entries: Vec::with_capacity(expected) }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V> Associations<K, V>
    where K: AssociationKey
{
    /// Registra una asociación. Rechaza claves centinela sin mutar el estado
    /// previo; los duplicados se detectan recién al congelar.
    pub(crate) fn put_shared(&mut self, key: K, producer: SharedProducer<V>) -> Result<(), BuildError> {
        if key.is_sentinel() {
            return Err(BuildError::InvalidArgument(format!("sentinel key {key:?} is not a usable association key")));
        }
        self.entries.push((key, producer));
        Ok(())
    }

    /// Copia todas las asociaciones de un agregador ya construido.
    pub(crate) fn merge(&mut self, parent: &dyn AssociationView<K, V>) -> Result<(), BuildError> {
        let set = parent.associations().ok_or(BuildError::TypeMismatch)?;
        self.entries.reserve(set.len());
        for (key, producer) in set {
            self.entries.push((key.clone(), Arc::clone(producer)));
        }
        Ok(())
    }

    /// Congela el acumulador en un `AssociationSet` inmutable, validando la
    /// unicidad de claves sobre el conjunto completo.
    pub(crate) fn freeze(self) -> Result<AssociationSet<K, V>, BuildError> {
        let mut set = AssociationSet::with_capacity(self.entries.len());
        for (key, producer) in self.entries {
            if set.contains_key(&key) {
                return Err(BuildError::DuplicateKey(format!("{key:?}")));
            }
            set.insert(key, producer);
        }
        Ok(set)
    }
}

/// Fan-out: arranca todos los miembros en orden de inserción. Un fallo
/// síncrono de `start` corta aquí mismo y aborta el agregado completo.
pub(crate) fn start_all<'a, K, V>(associations: &'a AssociationSet<K, V>)
                                  -> Result<Vec<(K, ProducerFuture<'a, V>)>, ComputeError>
    where K: AssociationKey
{
    let mut started = Vec::with_capacity(associations.len());
    for (key, producer) in associations {
        let fut = producer.start().map_err(|e| ComputeError::MemberStart { key: format!("{key:?}"),
                                                                           source: e })?;
        started.push((key.clone(), fut));
    }
    Ok(started)
}
