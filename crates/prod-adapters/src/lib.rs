//! prod-adapters: Capa de adaptación Computaciones de usuario ↔ Core
//!
//! Este crate provee:
//! - `Provider` + `ProviderProducer`: el adaptador de valor síncrono. El
//!   provider se evalúa durante `start()`, así que su fallo es un fallo
//!   síncrono de arranque que aborta el agregado completo.
//! - `Produce` + `ProduceProducer`: trait de autoría asíncrona para miembros
//!   ordinarios (el arranque nunca falla; todo fallo queda aislado).
//! - `FnProducer`: productor a partir de una clausura asíncrona.
//! - `MemoProducer`: el colaborador de memoización externo al core; cachea
//!   el primer `Produced` completado y lo re-entrega en arranques
//!   posteriores.
//!
//! Nota: el core solo conoce el seam `Producer::start()`. Aquí no se añade
//! política alguna de reintentos ni timeouts; un miembro que las necesite
//! las trae consigo.

pub mod memo;
pub mod produce;
pub mod provider;

pub use memo::MemoProducer;
pub use produce::{FnProducer, Produce, ProduceProducer};
pub use provider::{producer_from_provider, Provider, ProviderProducer};
