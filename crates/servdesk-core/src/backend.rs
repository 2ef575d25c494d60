// ── Backend seam ──
//
// Resource describes an entity collection; Backend is everything the core
// needs from the network. RestClient implements it for every resource,
// tests substitute in-memory backends.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use servdesk_api::{Attachment, DeleteResponse, ListPage, RestClient};

use crate::error::CoreError;
use crate::model::EntityId;
use crate::validation::Validate;

/// An entity type backed by a REST collection.
pub trait Resource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Body sent on create and update.
    type Draft: Serialize + Validate + Clone + Send + Sync + 'static;

    /// Collection path, e.g. `"services"`.
    const COLLECTION: &'static str;
    /// Lowercase singular noun for messages, e.g. `"service"`.
    const SINGULAR: &'static str;
    /// Lowercase plural noun for messages, e.g. `"services"`.
    const PLURAL: &'static str;

    fn id(&self) -> EntityId;
}

/// Entities with an active/inactive flag that can be flipped in place.
pub trait Toggle: Resource {
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);

    /// Body for `PATCH /{collection}/{id}/status` pinning the new value.
    fn status_body(active: bool) -> serde_json::Value {
        serde_json::json!({ "is_active": active })
    }
}

/// Network operations over one resource collection.
pub trait Backend<T: Resource>: Send + Sync + 'static {
    fn list(
        &self,
        params: Vec<(String, String)>,
    ) -> impl Future<Output = Result<ListPage<T>, CoreError>> + Send;

    fn create(
        &self,
        draft: T::Draft,
        attachments: Vec<Attachment>,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn update(
        &self,
        id: EntityId,
        draft: T::Draft,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn set_status(
        &self,
        id: EntityId,
        body: Option<serde_json::Value>,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn delete(&self, id: EntityId)
    -> impl Future<Output = Result<DeleteResponse, CoreError>> + Send;
}

impl<T: Resource> Backend<T> for RestClient {
    async fn list(&self, params: Vec<(String, String)>) -> Result<ListPage<T>, CoreError> {
        Ok(RestClient::list(self, T::COLLECTION, &params).await?)
    }

    async fn create(&self, draft: T::Draft, attachments: Vec<Attachment>) -> Result<T, CoreError> {
        Ok(RestClient::create(self, T::COLLECTION, &draft, &attachments).await?)
    }

    async fn update(&self, id: EntityId, draft: T::Draft) -> Result<T, CoreError> {
        Ok(RestClient::update(self, T::COLLECTION, &id, &draft).await?)
    }

    async fn set_status(
        &self,
        id: EntityId,
        body: Option<serde_json::Value>,
    ) -> Result<T, CoreError> {
        Ok(RestClient::patch_status(self, T::COLLECTION, &id, body.as_ref()).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<DeleteResponse, CoreError> {
        Ok(RestClient::delete(self, T::COLLECTION, &id).await?)
    }
}
