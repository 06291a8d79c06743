//! ProdFlow Rust Library
//!
//! Este crate actúa como la fachada de ProdFlow:
//! - Re-exporta el núcleo (`prod-core`): agregadores fan-out/fan-in con
//!   clave, el wrapper `Produced` y el seam `Producer`.
//! - Re-exporta los adaptadores (`prod-adapters`): providers síncronos,
//!   autoría asíncrona y memoización.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub use prod_core::{immediate, immediate_failed, AssociationKey, AssociationSet, AssociationView, BuildError,
                    ComputeError, FailedProducer, ImmediateProducer, MapProducer, MapProducerBuilder, Produced,
                    ProducedMapBuilder, ProducedMapProducer, Producer, ProducerError, ProducerFuture, ResultMap,
                    SetProducer, SetProducerBuilder, SharedProducer};

pub use prod_adapters::{producer_from_provider, FnProducer, MemoProducer, Produce, ProduceProducer, Provider,
                        ProviderProducer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_display() {
        let d = BuildError::DuplicateKey("\"db\"".into()).to_string();
        assert_eq!(d, "duplicate key at freeze time: \"db\"");
    }

    #[test]
    fn producer_error_display() {
        let p = ProducerError::msg("fallo").to_string();
        assert_eq!(p, "fallo");
    }
}
