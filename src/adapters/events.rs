//! Event sink that writes pack events to the log.

use async_trait::async_trait;
use tracing::info;

use crate::ports::{BoxError, EventSink, PackEvent};

/// Event sink that logs each event on target `gacs_pack::events`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: &PackEvent) -> Result<(), BoxError> {
        let payload = serde_json::to_string(event)?;
        info!(
            target: "gacs_pack::events",
            event = event.name(),
            context_pack_id = %event.id(),
            payload = %payload,
            "pack_event"
        );
        Ok(())
    }
}
