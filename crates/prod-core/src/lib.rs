//! prod-core: Núcleo fan-out/fan-in de productores con clave
pub mod aggregate;
pub mod errors;
pub mod produced;
pub mod producer;

pub use aggregate::{AssociationKey, AssociationSet, AssociationView, MapProducer, MapProducerBuilder,
                    ProducedMapBuilder, ProducedMapProducer, ResultMap, SetProducer, SetProducerBuilder};
pub use errors::{BuildError, ComputeError, ProducerError};
pub use produced::Produced;
pub use producer::{immediate, immediate_failed, FailedProducer, ImmediateProducer, Producer, ProducerFuture,
                   SharedProducer};
