//! Memoización del resultado de un productor.
//!
//! El core re-arranca sus miembros en cada `compute()`; el contrato de
//! "mismo resultado lógico" lo aporta este adaptador. `MemoProducer` cachea
//! el primer `Produced` completado (éxito o fallo asíncrono, ambos valen) y
//! lo re-entrega en todo arranque posterior. Un fallo síncrono del arranque
//! interno NO se cachea: nunca llegó a ser esperable.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::trace;

use prod_core::{Produced, Producer, ProducerError, ProducerFuture, SharedProducer};

pub struct MemoProducer<V> {
    inner: SharedProducer<V>,
    cell: OnceCell<Produced<V>>,
}

impl<V> MemoProducer<V>
    where V: Clone + Send + Sync + 'static
{
    #[inline]
    pub fn new<P>(producer: P) -> Self
        where P: Producer<V> + 'static
    {
        Self::from_shared(Arc::new(producer))
    }

    pub fn from_shared(inner: SharedProducer<V>) -> Self {
        Self { inner,
               cell: OnceCell::new() }
    }

    /// Conveniencia: memoiza y comparte en un solo paso.
    pub fn shared<P>(producer: P) -> SharedProducer<V>
        where P: Producer<V> + 'static
    {
        Arc::new(Self::new(producer))
    }

    /// True si ya hay un resultado observado.
    pub fn is_primed(&self) -> bool {
        self.cell.initialized()
    }
}

impl<V> Producer<V> for MemoProducer<V>
    where V: Clone + Send + Sync + 'static
{
    fn start(&self) -> Result<ProducerFuture<'_, V>, ProducerError> {
        if let Some(cached) = self.cell.get() {
            trace!("resultado memoizado reutilizado");
            let cached = cached.clone();
            return Ok(Box::pin(async move { cached.into_result() }));
        }

        // Primer arranque (o carrera entre primeros arranques: gana el que
        // complete la celda; los futuros perdedores se descartan sin poll).
        let fut = self.inner.start()?;
        Ok(Box::pin(async move {
            let produced = self.cell
                               .get_or_init(|| async { Produced::from_result(fut.await) })
                               .await;
            produced.clone().into_result()
        }))
    }
}
