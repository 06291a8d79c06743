use prodflow_rust::{immediate_failed, BuildError, ComputeError, FnProducer, Produced, ProducedMapBuilder,
                    ProducedMapProducer, ProducerError};

// Helper: productor asíncrono que resuelve al valor dado.
fn async_value(value: u32) -> FnProducer<impl Fn() -> std::future::Ready<Result<u32, ProducerError>> + Send + Sync> {
    FnProducer::new(move || std::future::ready(Ok(value)))
}

#[tokio::test]
async fn success_and_failure_entries_coexist() {
    let mut builder = ProducedMapProducer::builder(3);
    builder.put("a".to_string(), async_value(1))
           .unwrap()
           .put("b".to_string(), immediate_failed::<u32>(ProducerError::msg("E")))
           .unwrap()
           .put("c".to_string(), async_value(3))
           .unwrap();
    let aggregate = builder.build().unwrap();

    let result = aggregate.compute().await.expect("los fallos asíncronos no tumban el agregado");
    assert_eq!(result.len(), 3);
    assert_eq!(result["a"], Produced::succeeded(1));
    assert!(result["b"].is_failure());
    assert_eq!(result["b"].err().unwrap().to_string(), "E");
    assert_eq!(result["c"], Produced::succeeded(3));

    // Orden de iteración = orden de inserción, sin importar quién terminó antes.
    let keys: Vec<_> = result.keys().cloned().collect();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn layered_composition_via_put_all() {
    // Base {"a": 1}; derivada con {"b": 2} que la extiende -> orden b, a.
    let mut base = ProducedMapProducer::builder(1);
    base.put_value("a".to_string(), 1u32).unwrap();
    let base = base.build().unwrap();

    let mut derived = ProducedMapProducer::builder(2);
    derived.put_value("b".to_string(), 2u32).unwrap();
    derived.put_all(&base).unwrap();
    let derived = derived.build().unwrap();

    let result = derived.compute().await.unwrap();
    let entries: Vec<_> = result.iter()
                                .map(|(k, v)| (k.clone(), v.ok().copied()))
                                .collect();
    assert_eq!(entries,
               vec![("b".to_string(), Some(2)), ("a".to_string(), Some(1))]);
}

#[tokio::test]
async fn duplicate_across_layers_fails_at_build() {
    let mut base = ProducedMapProducer::builder(1);
    base.put_value("shared".to_string(), 1u32).unwrap();
    let base = base.build().unwrap();

    let mut derived: ProducedMapBuilder<String, u32> = ProducedMapBuilder::new(2);
    derived.put_value("shared".to_string(), 2u32).unwrap();
    derived.put_all(&base).unwrap();

    let err = derived.build().expect_err("no debe producirse un agregador parcialmente válido");
    assert_eq!(err, BuildError::DuplicateKey("\"shared\"".into()));
}

#[tokio::test]
async fn start_failure_aborts_aggregate_without_per_key_outcome() {
    struct ThrowsOnStart;

    impl prodflow_rust::Producer<u32> for ThrowsOnStart {
        fn start(&self) -> Result<prodflow_rust::ProducerFuture<'_, u32>, ProducerError> {
            Err(ProducerError::msg("boom al arrancar"))
        }
    }

    let mut builder = ProducedMapProducer::builder(2);
    builder.put("sano".to_string(), async_value(1)).unwrap().put("x".to_string(), ThrowsOnStart).unwrap();
    let aggregate = builder.build().unwrap();

    let err = aggregate.compute().await.expect_err("el agregado entero debe fallar");
    assert!(matches!(err, ComputeError::MemberStart { .. }));
    assert_eq!(err.member_error().to_string(), "boom al arrancar");
}
