// ── In-memory backend for unit tests ──

use std::sync::Mutex;
use std::time::Duration;

use servdesk_api::{Attachment, DeleteResponse, ListPage};

use crate::backend::{Backend, Toggle};
use crate::error::CoreError;
use crate::model::{EntityId, Service};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    List(Vec<(String, String)>),
    Create { files: usize },
    Update(EntityId),
    Status(EntityId, Option<serde_json::Value>),
    Delete(EntityId),
}

#[derive(Default)]
struct Script {
    list_delay: Option<Duration>,
    list_error: Option<Option<String>>,
    status_delay: Option<Duration>,
    status_error: Option<Option<String>>,
    delete_error: Option<Option<String>>,
    create_error: Option<Option<String>>,
    update_error: Option<Option<String>>,
}

/// Holds the "server" collection and a one-shot script of delays and
/// failures for the next call of each kind.
pub(crate) struct FakeBackend<T> {
    items: Mutex<Vec<T>>,
    reply: Mutex<Option<T>>,
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
}

fn api_error(message: Option<String>) -> CoreError {
    CoreError::Api {
        message,
        status: Some(500),
    }
}

impl<T: Toggle> FakeBackend<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            reply: Mutex::new(None),
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_items(&self, items: Vec<T>) {
        *self.items.lock().unwrap() = items;
    }

    pub(crate) fn stored(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }

    /// Entity returned by the next create or update.
    pub(crate) fn reply_with(&self, item: T) {
        *self.reply.lock().unwrap() = Some(item);
    }

    pub(crate) fn delay_next_list(&self, delay: Duration) {
        self.script.lock().unwrap().list_delay = Some(delay);
    }

    pub(crate) fn fail_next_list(&self, message: Option<&str>) {
        self.script.lock().unwrap().list_error = Some(message.map(str::to_owned));
    }

    pub(crate) fn delay_next_status(&self, delay: Duration) {
        self.script.lock().unwrap().status_delay = Some(delay);
    }

    pub(crate) fn fail_next_status(&self, message: Option<&str>) {
        self.script.lock().unwrap().status_error = Some(message.map(str::to_owned));
    }

    pub(crate) fn fail_next_delete(&self, message: Option<&str>) {
        self.script.lock().unwrap().delete_error = Some(message.map(str::to_owned));
    }

    pub(crate) fn fail_next_create(&self, message: Option<&str>) {
        self.script.lock().unwrap().create_error = Some(message.map(str::to_owned));
    }

    pub(crate) fn fail_next_update(&self, message: Option<&str>) {
        self.script.lock().unwrap().update_error = Some(message.map(str::to_owned));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl<T: Toggle> Backend<T> for FakeBackend<T> {
    async fn list(&self, params: Vec<(String, String)>) -> Result<ListPage<T>, CoreError> {
        self.record(Call::List(params));
        let (delay, error) = {
            let mut script = self.script.lock().unwrap();
            (script.list_delay.take(), script.list_error.take())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = error {
            return Err(api_error(message));
        }
        Ok(ListPage {
            items: self.stored(),
            pagination: None,
        })
    }

    async fn create(&self, _draft: T::Draft, attachments: Vec<Attachment>) -> Result<T, CoreError> {
        self.record(Call::Create {
            files: attachments.len(),
        });
        if let Some(message) = self.script.lock().unwrap().create_error.take() {
            return Err(api_error(message));
        }
        let created = self
            .reply
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| CoreError::Internal("no reply scripted".into()))?;
        self.items.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: EntityId, _draft: T::Draft) -> Result<T, CoreError> {
        self.record(Call::Update(id.clone()));
        if let Some(message) = self.script.lock().unwrap().update_error.take() {
            return Err(api_error(message));
        }
        let updated = self
            .reply
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| CoreError::Internal("no reply scripted".into()))?;
        let mut items = self.items.lock().unwrap();
        if let Some(slot) = items.iter_mut().find(|i| i.id() == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    async fn set_status(
        &self,
        id: EntityId,
        body: Option<serde_json::Value>,
    ) -> Result<T, CoreError> {
        self.record(Call::Status(id.clone(), body.clone()));
        let (delay, error) = {
            let mut script = self.script.lock().unwrap();
            (script.status_delay.take(), script.status_error.take())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = error {
            return Err(api_error(message));
        }
        let wanted = body
            .as_ref()
            .and_then(|b| b.get("is_active"))
            .and_then(serde_json::Value::as_bool);
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: T::SINGULAR.into(),
                identifier: id.to_string(),
            })?;
        let next = wanted.unwrap_or(!item.is_active());
        item.set_active(next);
        Ok(item.clone())
    }

    async fn delete(&self, id: EntityId) -> Result<DeleteResponse, CoreError> {
        self.record(Call::Delete(id.clone()));
        if let Some(message) = self.script.lock().unwrap().delete_error.take() {
            return Err(api_error(message));
        }
        self.items.lock().unwrap().retain(|i| i.id() != id);
        Ok(DeleteResponse {
            success: true,
            message: Some("Deleted".into()),
        })
    }
}

/// A minimal service row.
pub(crate) fn service(id: u64, name: &str, active: bool) -> Service {
    Service {
        id: EntityId::Number(id),
        name: name.into(),
        description: String::new(),
        price: 100.0,
        category: None,
        category_id: None,
        is_active: active,
        images: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}
