//! El seam de productores: la abstracción de tarea asíncrona que consumen
//! los agregadores.
//!
//! Un `Producer<V>` se arranca en dos fases:
//! 1. `start()` — paso síncrono que observa/inicia la computación y devuelve
//!    el futuro del valor. Puede fallar, y ese fallo NO se aísla por clave:
//!    aborta el agregado completo.
//! 2. Esperar el futuro devuelto — cualquier fallo aquí sí queda aislado como
//!    `Produced::Failure` en la entrada correspondiente.
//!
//! El core no crea tareas ni planifica nada: solo arranca productores y
//! compone sus futuros. La memoización del resultado (si se quiere) se
//! superpone con un adaptador externo; aquí `start()` vuelve a computar en
//! cada invocación.

use std::sync::Arc;

use futures::future::{ready, BoxFuture};

use crate::errors::ProducerError;

/// Futuro del valor de un miembro ya arrancado.
pub type ProducerFuture<'a, V> = BoxFuture<'a, Result<V, ProducerError>>;

/// Productor con propiedad compartida, la forma en que un agregador ya
/// construido puede ceder sus asociaciones a un builder posterior.
pub type SharedProducer<V> = Arc<dyn Producer<V>>;

pub trait Producer<V>: Send + Sync {
    /// Arranca u observa la computación del miembro.
    fn start(&self) -> Result<ProducerFuture<'_, V>, ProducerError>;
}

/// Productor que resuelve inmediatamente a un valor ya disponible (el
/// adaptador de valor síncrono que usa `put_value`).
#[derive(Debug, Clone)]
pub struct ImmediateProducer<V> {
    value: V,
}

impl<V> Producer<V> for ImmediateProducer<V>
    where V: Clone + Send + Sync + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, V>, ProducerError> {
        Ok(Box::pin(ready(Ok(self.value.clone()))))
    }
}

/// Envuelve un valor ya disponible como productor.
#[inline]
pub fn immediate<V>(value: V) -> ImmediateProducer<V>
    where V: Clone + Send + Sync + 'static
{
    ImmediateProducer { value }
}

/// Productor cuyo futuro resuelve siempre al fallo dado. El arranque en sí
/// no falla: el fallo es asíncrono y por tanto queda aislado por clave.
#[derive(Debug, Clone)]
pub struct FailedProducer<V> {
    error: ProducerError,
    _value: std::marker::PhantomData<fn() -> V>,
}

impl<V> Producer<V> for FailedProducer<V>
    where V: Send + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, V>, ProducerError> {
        let error = self.error.clone();
        Ok(Box::pin(ready(Err(error))))
    }
}

/// Envuelve un fallo ya conocido como productor.
#[inline]
pub fn immediate_failed<V>(error: ProducerError) -> FailedProducer<V>
    where V: Send + 'static
{
    FailedProducer { error,
                     _value: std::marker::PhantomData }
}
