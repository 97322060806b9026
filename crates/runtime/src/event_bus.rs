/// What a routing-trace record is about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Routed,
    Deferred,
    Rejected,
    Duplicate,
    ImportFailed,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Routed => "routed",
            EventKind::Deferred => "deferred",
            EventKind::Rejected => "rejected",
            EventKind::Duplicate => "duplicate",
            EventKind::ImportFailed => "import_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Routing cycle the event belongs to; 0 before the first cycle.
    pub cycle: u64,
    pub kind: EventKind,
    pub message: String,
}

/// In-process routing trace, drained by the host.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, cycle: u64, kind: EventKind, message: impl Into<String>) {
        self.events.push(Event {
            cycle,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, EventKind};

    #[test]
    fn filters_by_kind() {
        let mut bus = EventBus::new();
        bus.emit(2, EventKind::Routed, "zoom=10");
        bus.emit(3, EventKind::Deferred, "map not ready");
        bus.emit(3, EventKind::Rejected, "feature #4: missing id");

        let deferred: Vec<(u64, &str)> = bus
            .of_kind(EventKind::Deferred)
            .map(|e| (e.cycle, e.kind.as_str()))
            .collect();
        assert_eq!(deferred, vec![(3, "deferred")]);
        assert_eq!(bus.of_kind(EventKind::Duplicate).count(), 0);
    }

    #[test]
    fn drain_empties_the_bus() {
        let mut bus = EventBus::new();
        bus.emit(1, EventKind::Duplicate, "a");
        assert_eq!(bus.drain().len(), 1);
        assert!(bus.events().is_empty());
    }
}
