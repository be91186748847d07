//! Gate event model and wire encoding

use axum::response::sse::Event;

/// A gate lifecycle event delivered to display clients.
///
/// Immutable once constructed. Produced by the operator handlers, consumed
/// by subscriber delivery loops; `Keepalive` is synthesized by an idle
/// delivery loop and never enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// Gate opened for a named visitor.
    Opened {
        /// Visitor name shown by display clients. May be empty.
        name: String,
    },
    /// Gate returned to the closed position.
    Closed,
    /// Idle-connection heartbeat, keeps intermediaries from dropping the
    /// stream.
    Keepalive,
}

impl GateEvent {
    /// SSE event name on the wire.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "gate_open",
            Self::Closed => "gate_close",
            Self::Keepalive => "keepalive",
        }
    }

    /// SSE data payload: the visitor name for `Opened`, empty otherwise.
    #[must_use]
    pub fn data(&self) -> &str {
        match self {
            Self::Opened { name } => name,
            Self::Closed | Self::Keepalive => "",
        }
    }

    /// Encode as an SSE wire event.
    #[must_use]
    pub fn into_sse(self) -> Event {
        Event::default().event(self.event_name()).data(self.data())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn event_names_match_the_wire_protocol() {
        let opened = GateEvent::Opened {
            name: "Acme Corp".to_string(),
        };
        assert_eq!(opened.event_name(), "gate_open");
        assert_eq!(GateEvent::Closed.event_name(), "gate_close");
        assert_eq!(GateEvent::Keepalive.event_name(), "keepalive");
    }

    #[test]
    fn only_opened_carries_data() {
        let opened = GateEvent::Opened {
            name: "Acme Corp".to_string(),
        };
        assert_eq!(opened.data(), "Acme Corp");
        assert_eq!(GateEvent::Closed.data(), "");
        assert_eq!(GateEvent::Keepalive.data(), "");
    }

    #[test]
    fn empty_name_is_allowed() {
        let opened = GateEvent::Opened {
            name: String::new(),
        };
        assert_eq!(opened.event_name(), "gate_open");
        assert_eq!(opened.data(), "");
    }
}
