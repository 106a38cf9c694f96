use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// Notifications published by the tenant registry and its connections
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    /// A store connection was established. `tenant` is `None` for the shared connection.
    Connected {
        tenant: Option<String>,
        at: DateTime<Utc>,
    },
    /// Establishment failed, or an established connection reported a driver error
    Error {
        tenant: Option<String>,
        message: String,
    },
}

/// Publishing side of the registry event channel, scoped to one connection
#[derive(Debug, Clone)]
pub struct EventSink {
    tenant: Option<String>,
    sender: broadcast::Sender<RegistryEvent>,
}

impl EventSink {
    pub fn new(tenant: Option<String>, sender: broadcast::Sender<RegistryEvent>) -> Self {
        Self { tenant, sender }
    }

    pub fn connected(&self) {
        self.publish(RegistryEvent::Connected {
            tenant: self.tenant.clone(),
            at: Utc::now(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(RegistryEvent::Error {
            tenant: self.tenant.clone(),
            message: message.into(),
        });
    }

    // No subscribers is not an error: the event is simply dropped.
    fn publish(&self, event: RegistryEvent) {
        let _ = self.sender.send(event);
    }
}
