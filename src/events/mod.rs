pub mod console_sink;
pub mod memory_sink;
pub mod types;

pub use self::console_sink::ConsoleEventSink;
pub use self::memory_sink::MemoryEventSink;
pub use self::types::{EngineEvent, EventSink};

use std::sync::{Arc, RwLock};

/// Fans engine events out to every registered sink.
#[derive(Default)]
pub struct EventBus {
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.sinks.write().unwrap().push(sink);
    }

    pub fn emit(&self, event: EngineEvent) {
        for sink in self.sinks.read().unwrap().iter() {
            sink.emit(&event);
        }
    }
}
