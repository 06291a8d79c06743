//! Demo: composición por capas de un mapa de valores producidos
//! asíncronamente, con aislamiento de fallos por entrada.
//!
//! Construye una capa base de configuración (valores inmediatos), la
//! extiende con una capa derivada que añade miembros asíncronos (uno de
//! ellos memoizado y uno que falla), computa el agregado dos veces y
//! muestra cada entrada del mapa final.

use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use prodflow_rust::{FnProducer, MemoProducer, Produced, ProducedMapProducer, ProducerError};

fn build_base_layer() -> Result<ProducedMapProducer<String, Value>, Box<dyn std::error::Error>> {
    let mut base = ProducedMapProducer::builder(2);
    base.put_value("service.name".to_string(), json!("prodflow-demo"))?
        .put_value("service.replicas".to_string(), json!(3))?;
    Ok(base.build()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let base = build_base_layer()?;

    // Capa derivada: miembros propios primero, luego las entradas de la base.
    let mut derived = ProducedMapProducer::builder(5);
    derived.put("build.info".to_string(),
                MemoProducer::new(FnProducer::new(|| async {
                    info!("computando build.info (solo debería verse una vez)");
                    Ok::<_, ProducerError>(json!({ "commit": "abc1234", "dirty": false }))
                })))?
           .put("upstream.latency_ms".to_string(),
                FnProducer::new(|| async {
                    tokio::time::sleep(std::time::Duration::from_millis(25)).await;
                    Ok::<_, ProducerError>(json!(25))
                }))?
           .put("upstream.health".to_string(),
                FnProducer::new(|| async {
                    Err::<Value, _>(ProducerError::msg("healthcheck timeout"))
                }))?;
    derived.put_all(&base)?;
    let aggregate = derived.build()?;

    for round in 1..=2 {
        println!("--- compute #{round} ---");
        let result = aggregate.compute().await?;
        for (key, outcome) in &result {
            match outcome {
                Produced::Success(value) => println!("  {key} = {value}"),
                Produced::Failure(error) => println!("  {key} FALLÓ: {error}"),
            }
        }
    }

    Ok(())
}
