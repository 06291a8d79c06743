//! `Produced<V>`: el resultado observado de un productor miembro.
//!
//! Captura exactamente una de dos cosas: el valor producido o el fallo
//! ocurrido al producirlo. El fallo no se re-lanza ni se degrada; queda
//! disponible para que quien consuma el mapa final inspeccione cada entrada
//! por separado.

use crate::errors::ProducerError;

#[derive(Debug, Clone)]
pub enum Produced<V> {
    Success(V),
    Failure(ProducerError),
}

impl<V> Produced<V> {
    /// Construye desde un valor ya disponible.
    #[inline]
    pub fn succeeded(value: V) -> Self {
        Self::Success(value)
    }

    /// Construye desde el fallo de la computación del miembro.
    #[inline]
    pub fn failed(error: ProducerError) -> Self {
        Self::Failure(error)
    }

    /// Conversión total desde el resultado de esperar al miembro. Nunca
    /// falla: cualquier `Err` se vuelve `Failure`.
    pub fn from_result(result: Result<V, ProducerError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Valor producido, si lo hubo.
    pub fn ok(&self) -> Option<&V> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Fallo conservado, si lo hubo.
    pub fn err(&self) -> Option<&ProducerError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<V, ProducerError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(error) => Err(error),
        }
    }
}

impl<V> From<Result<V, ProducerError>> for Produced<V> {
    fn from(result: Result<V, ProducerError>) -> Self {
        Self::from_result(result)
    }
}

/// Igualdad de entradas: los valores se comparan por `==`; dos fallos se
/// consideran iguales si su representación textual coincide.
impl<V: PartialEq> PartialEq for Produced<V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Success(a), Self::Success(b)) => a == b,
            (Self::Failure(a), Self::Failure(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
