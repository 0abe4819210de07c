use crate::{Event, EventEnvelope, EventId};

/// Outbound notification channel.
///
/// Components push events as they mutate; the host drains the log once per
/// tick and fans the envelopes out to whoever listens. Nothing downstream may
/// rely on the order in which distinct observers see them.
#[derive(Debug, Default)]
pub struct EventLog {
    tick: u64,
    next_event_id: u64,
    envelopes: Vec<EventEnvelope>,
}

impl EventLog {
    pub fn new(tick: u64, next_event_id: u64) -> Self {
        Self {
            tick,
            next_event_id,
            envelopes: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        let id = EventId(format!("evt_{:06}", self.next_event_id));
        self.next_event_id += 1;
        self.envelopes.push(EventEnvelope {
            id,
            tick: self.tick,
            event,
        });
    }

    pub fn next_event_id(&self) -> u64 {
        self.next_event_id
    }

    pub fn envelopes(&self) -> &[EventEnvelope] {
        &self.envelopes
    }

    /// Iterate the bare events, mostly useful in tests.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.envelopes.iter().map(|e| &e.event)
    }

    pub fn into_envelopes(self) -> Vec<EventEnvelope> {
        self.envelopes
    }
}
