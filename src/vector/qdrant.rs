// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Qdrant REST client

use async_trait::async_trait;
use reqwest::{Certificate, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::database::VectorDatabase;
use super::types::{Distance, ScoredPoint, VectorDbError, VectorPoint};

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionsList {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: &'a [VectorPoint],
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct QdrantErrorBody {
    status: QdrantErrorStatus,
}

#[derive(Debug, Deserialize)]
struct QdrantErrorStatus {
    error: String,
}

pub struct QdrantClient {
    client: Client,
    base_url: String,
}

impl QdrantClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Self::with_root_certificates(base_url, timeout, Vec::new())
    }

    pub fn with_root_certificates(
        base_url: &str,
        timeout: Duration,
        roots: Vec<Certificate>,
    ) -> anyhow::Result<Self> {
        reqwest::Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid URL {}: {}", base_url, e))?;

        let mut builder = Client::builder().timeout(timeout);
        for cert in roots {
            builder = builder.add_root_certificate(cert);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn parse<T: DeserializeOwned>(
        response: Response,
        collection: Option<&str>,
    ) -> Result<T, VectorDbError> {
        let status = response.status();
        if status.is_success() {
            let body: QdrantResponse<T> = response.json().await?;
            return Ok(body.result);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(name) = collection {
                return Err(VectorDbError::CollectionNotFound(name.to_string()));
            }
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<QdrantErrorBody>(&text)
            .map(|body| body.status.error)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    "Unknown error".to_string()
                } else {
                    text
                }
            });
        Err(VectorDbError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl VectorDatabase for QdrantClient {
    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        let url = format!("{}/collections", self.base_url);
        let response = self.client.get(&url).send().await?;
        let list: CollectionsList = Self::parse(response, None).await?;
        Ok(list.collections.into_iter().map(|c| c.name).collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), VectorDbError> {
        let url = format!("{}/collections/{}", self.base_url, name);
        debug!("Creating collection {} ({}-d, {:?})", name, dimension, distance);
        let response = self
            .client
            .put(&url)
            .json(&json!({ "vectors": { "size": dimension, "distance": distance } }))
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(response, None).await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), VectorDbError> {
        let url = format!("{}/collections/{}/points?wait=true", self.base_url, collection);
        let response = self
            .client
            .put(&url)
            .json(&UpsertRequest { points: &points })
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(response, Some(collection)).await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorDbError> {
        let url = format!("{}/collections/{}/points/search", self.base_url, collection);
        let response = self
            .client
            .post(&url)
            .json(&SearchRequest {
                vector,
                limit,
                with_payload: true,
            })
            .send()
            .await?;
        Self::parse(response, Some(collection)).await
    }

    fn name(&self) -> &'static str {
        "Qdrant"
    }
}
