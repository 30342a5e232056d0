//! Bundled store plugins.

use std::sync::Arc;

use tracing::info;

use vclass_engine::{MutationRecord, Plugin, Result, StoreHandle, Value};

/// Plugin logging every committed mutation through `tracing`
pub fn logger_plugin() -> Plugin {
    Arc::new(|store: &StoreHandle| -> Result<()> {
        store.subscribe(Arc::new(|record: &MutationRecord, state: &Value| {
            info!(
                target: "vclass::mutation",
                kind = %record.kind,
                payload = %record.payload,
                state = %state,
                "mutation committed"
            );
        }));
        Ok(())
    })
}
