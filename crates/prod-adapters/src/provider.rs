//! Adaptador de valor síncrono.
//!
//! Un `Provider` entrega el valor en el momento en que se le pide, sin
//! futuro de por medio. Al adaptarlo al seam de productores, `get()` se
//! evalúa dentro de `start()`: si falla, el fallo es síncrono y aborta el
//! agregado completo en lugar de aislarse por clave. Esa es exactamente la
//! semántica del miembro "que revienta al arrancar".

use futures::future::ready;

use prod_core::{Producer, ProducerError, ProducerFuture};

pub trait Provider<V>: Send + Sync {
    fn get(&self) -> Result<V, ProducerError>;
}

/// Cualquier clausura síncrona sirve como provider.
impl<V, F> Provider<V> for F where F: Fn() -> Result<V, ProducerError> + Send + Sync
{
    fn get(&self) -> Result<V, ProducerError> {
        (self)()
    }
}

pub struct ProviderProducer<P> {
    provider: P,
}

impl<P> ProviderProducer<P> {
    #[inline]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<V, P> Producer<V> for ProviderProducer<P>
    where P: Provider<V>,
          V: Send + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, V>, ProducerError> {
        // Evaluación síncrona: el ? de aquí es el que tumba el agregado.
        let value = self.provider.get()?;
        Ok(Box::pin(ready(Ok(value))))
    }
}

/// Adapta un provider síncrono al seam de productores.
#[inline]
pub fn producer_from_provider<P>(provider: P) -> ProviderProducer<P> {
    ProviderProducer::new(provider)
}
