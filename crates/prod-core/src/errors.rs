//! Errores específicos del core.
//!
//! Se distinguen tres familias:
//! - `BuildError`: errores síncronos y locales del builder (argumentos,
//!   claves duplicadas al congelar, merge incompatible). Nunca dejan el
//!   builder en un estado parcialmente mutado.
//! - `ProducerError`: el fallo de un productor miembro, conservado con su
//!   error original para inspección posterior (vive dentro de
//!   `Produced::Failure`).
//! - `ComputeError`: fallo del agregado completo. El caso `MemberStart` es la
//!   asimetría deliberada del modelo: un fallo síncrono al arrancar un
//!   miembro aborta todo el cómputo en lugar de aislarse por clave.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum BuildError {
    #[error("invalid argument: {0}")] InvalidArgument(String),
    #[error("duplicate key at freeze time: {0}")] DuplicateKey(String),
    #[error("merged aggregator does not expose an association view")] TypeMismatch,
}

/// Fallo de un productor miembro. Clonable (vía `Arc`) para que un resultado
/// memoizado pueda compartirse entre invocaciones.
#[derive(Debug, Error, Clone)]
pub enum ProducerError {
    /// Fallo descrito por un mensaje plano.
    #[error("{0}")]
    Message(String),
    /// Fallo original conservado completo, con cadena `source()` accesible.
    #[error("{0}")]
    Wrapped(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl ProducerError {
    /// Envuelve un error arbitrario conservando su identidad.
    pub fn new<E>(error: E) -> Self
        where E: std::error::Error + Send + Sync + 'static
    {
        Self::Wrapped(Arc::new(error))
    }

    /// Crea un fallo a partir de un mensaje.
    pub fn msg<M: Into<String>>(message: M) -> Self {
        Self::Message(message.into())
    }

    /// Acceso tipado al error original, si este fallo envuelve uno.
    pub fn downcast_ref<E>(&self) -> Option<&E>
        where E: std::error::Error + 'static
    {
        match self {
            Self::Wrapped(inner) => inner.downcast_ref::<E>(),
            Self::Message(_) => None,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum ComputeError {
    /// El arranque síncrono de un miembro falló antes de volverse esperable.
    /// No hay `Produced` para esa clave: el agregado entero falla.
    #[error("member `{key}` failed while starting: {source}")]
    MemberStart {
        key: String,
        #[source]
        source: ProducerError,
    },
    /// Un miembro falló durante su computación. Solo lo reportan los
    /// agregadores sin aislamiento por entrada (`MapProducer`, `SetProducer`).
    #[error("member `{key}` failed: {source}")]
    MemberFailed {
        key: String,
        #[source]
        source: ProducerError,
    },
}

impl ComputeError {
    /// Clave del miembro que provocó el fallo.
    pub fn key(&self) -> &str {
        match self {
            Self::MemberStart { key, .. } | Self::MemberFailed { key, .. } => key,
        }
    }

    /// Fallo original del miembro.
    pub fn member_error(&self) -> &ProducerError {
        match self {
            Self::MemberStart { source, .. } | Self::MemberFailed { source, .. } => source,
        }
    }
}
