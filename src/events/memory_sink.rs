use super::types::{EngineEvent, EventSink};
use std::collections::VecDeque;
use std::sync::RwLock;

/// Capped in-memory event buffer; test code and embedded UIs read it back.
pub struct MemoryEventSink {
    buffer: RwLock<VecDeque<EngineEvent>>,
    capacity: usize,
}

impl MemoryEventSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn get_recent(&self) -> Vec<EngineEvent> {
        let buffer = self.buffer.read().unwrap();
        buffer.iter().cloned().collect()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &EngineEvent) {
        let mut buffer = self.buffer.write().unwrap();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_evicts_oldest() {
        let sink = MemoryEventSink::new(2);
        for id in ["a", "b", "c"] {
            sink.emit(&EngineEvent::OpenConsentUi {
                service_id: id.into(),
            });
        }
        let recent = sink.get_recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(
            recent[0],
            EngineEvent::OpenConsentUi {
                service_id: "b".into()
            }
        );
    }
}
