use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use quill_rt::log;

use crate::ast::Template;
use crate::error::Error;

type Slot = Arc<OnceLock<Result<Arc<Template>, Error>>>;

/// Memoizes template text to its compiled form. At most one entry per key,
/// and at most one compilation per key even under concurrent first access:
/// the slot is reserved under the map lock, the compile runs inside the
/// slot's `OnceLock` outside it, and late arrivals block on the winner.
#[derive(Default)]
pub struct TemplateCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&self, text: &str) -> Result<Arc<Template>, Error> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|err| err.into_inner());
            slots.entry(text.to_string()).or_default().clone()
        };
        slot.get_or_init(|| {
            log::info(&format!("compiling template ({} bytes)", text.len()));
            crate::compile(text).map(Arc::new)
        })
        .clone()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|err| err.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clear();
    }
}

pub fn snapshot(template: &Template) -> Result<Vec<u8>, String> {
    bincode::serialize(template).map_err(|err| format!("template encode failed: {err}"))
}

pub fn restore(bytes: &[u8]) -> Result<Template, String> {
    bincode::deserialize(bytes).map_err(|err| format!("template decode failed: {err}"))
}
