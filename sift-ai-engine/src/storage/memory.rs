//! In-memory corpus store.
//!
//! Brute-force cosine ranking over the points it holds, with insertion
//! order preserved so equal scores rank deterministically. Backs the test
//! suite and local runs without an external vector database.

use super::{CorpusStore, DocumentPoint, ScoredPoint, StoreStats};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    points: RwLock<Vec<DocumentPoint>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CorpusStore for InMemoryStore {
    async fn upsert(&self, points: Vec<DocumentPoint>) -> Result<()> {
        let mut held = self.points.write().expect("store lock poisoned");
        for point in points {
            match held
                .iter_mut()
                .find(|existing| existing.document.id == point.document.id)
            {
                Some(existing) => *existing = point,
                None => held.push(point),
            }
        }
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.points.write().expect("store lock poisoned").clear();
        Ok(())
    }

    async fn nearest_neighbors(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>> {
        let held = self.points.read().expect("store lock poisoned");
        let mut scored: Vec<ScoredPoint> = held
            .iter()
            .map(|point| ScoredPoint {
                document: point.document.clone(),
                score: cosine(vector, &point.vector),
            })
            .collect();
        // Stable: ties keep insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            points: self.len(),
            status: "green".to_owned(),
        })
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
