//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! This facade concentrates all Qdrant interactions behind the
//! [`VectorIndex`] trait, hiding away the verbose builder pattern and keeping
//! the rest of the application decoupled from `qdrant-client`.

use std::collections::HashMap;

use futures::future::BoxFuture;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info, warn};

use crate::config::{DistanceKind, RagConfig};
use crate::errors::RagError;
use crate::vector_index::{ChunkPayload, VectorHit, VectorIndex, VectorPoint};

/// A facade over the Qdrant client bound to one collection.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    ///
    /// Uses the builder-based API of `qdrant-client` and supports
    /// optional API key authentication. No network call is made here.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.vector_store_uri);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(qerr)?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.space.distance,
        })
    }

    fn source_filter(source: &str) -> Filter {
        Filter::must([Condition::matches("source", source.to_string())])
    }
}

impl VectorIndex for QdrantFacade {
    fn ensure_collection(&self, dim: usize) -> BoxFuture<'_, Result<(), RagError>> {
        Box::pin(async move {
            if self
                .client
                .collection_exists(&self.collection)
                .await
                .map_err(qerr)?
            {
                debug!("Collection '{}' already exists", self.collection);
                return Ok(());
            }

            info!(
                "Creating collection '{}' with size={} distance={:?}",
                self.collection, dim, self.distance
            );
            let distance = match self.distance {
                DistanceKind::Cosine => Distance::Cosine,
                DistanceKind::Dot => Distance::Dot,
                DistanceKind::Euclid => Distance::Euclid,
            };
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(dim as u64, distance)),
                )
                .await
                .map_err(qerr)?;
            Ok(())
        })
    }

    fn load_collection(&self) -> BoxFuture<'_, Result<bool, RagError>> {
        // Qdrant keeps collections resident; loading reduces to an existence check.
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(&self.collection)
                .await
                .map_err(qerr)?;
            if !exists {
                warn!("Collection '{}' does not exist", self.collection);
            }
            Ok(exists)
        })
    }

    fn release_collection(&self) -> BoxFuture<'_, Result<(), RagError>> {
        Box::pin(async { Ok(()) })
    }

    fn count_by_source<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            let res = self
                .client
                .count(
                    CountPointsBuilder::new(&self.collection)
                        .filter(Self::source_filter(source))
                        .exact(true),
                )
                .await
                .map_err(qerr)?;
            Ok(res.result.map(|r| r.count).unwrap_or(0))
        })
    }

    fn delete_by_source<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            // Qdrant does not report how many points a filtered delete removed,
            // so the exact count is taken first.
            let matching = self.count_by_source(source).await?;
            if matching == 0 {
                return Ok(0);
            }
            self.client
                .delete_points(
                    DeletePointsBuilder::new(&self.collection)
                        .points(Self::source_filter(source))
                        .wait(true),
                )
                .await
                .map_err(qerr)?;
            info!(%source, removed = matching, "deleted points from '{}'", self.collection);
            Ok(matching)
        })
    }

    fn upsert(&self, points: Vec<VectorPoint>) -> BoxFuture<'_, Result<u64, RagError>> {
        Box::pin(async move {
            if points.is_empty() {
                debug!("No points provided for upsert");
                return Ok(0);
            }
            let n = points.len() as u64;
            let mut structs = Vec::with_capacity(points.len());
            for p in points {
                let payload = Payload::try_from(serde_json::to_value(&p.payload)?)
                    .map_err(|e| RagError::Qdrant(e.to_string()))?;
                structs.push(PointStruct::new(p.id, p.vector, payload));
            }

            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, structs).wait(true))
                .await
                .map_err(qerr)?;
            debug!(n, "upserted points into '{}'", self.collection);
            Ok(n)
        })
    }

    fn search(&self, vector: Vec<f32>, k: u64) -> BoxFuture<'_, Result<Vec<VectorHit>, RagError>> {
        Box::pin(async move {
            let res = self
                .client
                .search_points(
                    SearchPointsBuilder::new(&self.collection, vector, k).with_payload(true),
                )
                .await
                .map_err(qerr)?;

            let mut out = Vec::with_capacity(res.result.len());
            for r in res.result {
                let id = r.id.as_ref().map(point_id_to_string).unwrap_or_default();
                let json = qpayload_to_json(r.payload);
                match payload_from_json(json, &id) {
                    Some(payload) => out.push(VectorHit {
                        score: r.score,
                        payload,
                    }),
                    None => warn!(%id, "skipping point without source/text payload"),
                }
            }
            debug!("Search completed: {} hits returned", out.len());
            Ok(out)
        })
    }
}

fn qerr(e: qdrant_client::QdrantError) -> RagError {
    RagError::Qdrant(e.to_string())
}

fn point_id_to_string(id: &PointId) -> String {
    match &id.point_id_options {
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

/// Rebuilds a [`ChunkPayload`]; `pk` falls back to the point id.
fn payload_from_json(json: serde_json::Value, id: &str) -> Option<ChunkPayload> {
    let source = json.get("source")?.as_str()?.to_string();
    let text = json.get("text")?.as_str()?.to_string();
    let pk = json
        .get("pk")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());
    Some(ChunkPayload { source, text, pk })
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
///
/// Unsupported nested objects/arrays are mapped to `Null`.
fn qpayload_to_json(mut p: HashMap<String, QValue>) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    let mut m = serde_json::Map::new();
    for (k, v) in p.drain() {
        let j = match v.kind {
            Some(K::StringValue(s)) => serde_json::Value::String(s),
            Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
            Some(K::DoubleValue(f)) => serde_json::json!(f),
            Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
            _ => serde_json::Value::Null,
        };
        m.insert(k, j);
    }
    serde_json::Value::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_pk_falls_back_to_point_id() {
        let p = payload_from_json(json!({"source": "data/a.txt", "text": "hi"}), "abc").unwrap();
        assert_eq!(p.pk, "abc");
        assert!(payload_from_json(json!({"text": "hi"}), "abc").is_none());
    }

    #[test]
    fn facade_builds_without_network() {
        let cfg = RagConfig::new_default("http://localhost:6334", "data");
        assert!(QdrantFacade::new(&cfg).is_ok());
    }
}
