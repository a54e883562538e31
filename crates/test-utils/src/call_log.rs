use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde_json::Value;
use taskdag::context::{Context, ContextUpdate};

/// Shared record of which task bodies ran, in order.
///
/// Hands out closures suitable for `Task::function` / `TaskRegistry::register`
/// that log their task id on every call.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body that records `id` and returns `{ "<id>": "done" }`.
    pub fn succeed(
        &self,
        id: &str,
    ) -> impl Fn(&mut Context) -> anyhow::Result<ContextUpdate> + Send + Sync + use<> {
        let calls = Arc::clone(&self.calls);
        let id = id.to_string();
        move |_ctx: &mut Context| -> anyhow::Result<ContextUpdate> {
            calls.lock().unwrap().push(id.clone());
            let mut update = ContextUpdate::new();
            update.insert(id.clone(), Value::from("done"));
            Ok(update)
        }
    }

    /// Body that records `id` and fails with `message`.
    pub fn fail(
        &self,
        id: &str,
        message: &str,
    ) -> impl Fn(&mut Context) -> anyhow::Result<ContextUpdate> + Send + Sync + use<> {
        let calls = Arc::clone(&self.calls);
        let id = id.to_string();
        let message = message.to_string();
        move |_ctx: &mut Context| -> anyhow::Result<ContextUpdate> {
            calls.lock().unwrap().push(id.clone());
            Err(anyhow!("{}", message))
        }
    }

    /// Ids in the order their bodies ran.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count_of(&self, id: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == id).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}
