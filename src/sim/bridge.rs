/// HUD bridge: synchronous publish/subscribe between the core and the HUD.
///
/// Publishers never see subscribers and vice versa; both only hold the
/// bridge (through the context). Delivery order is subscription order.
/// Zero subscribers is fine; a publish then only reaches the debug log.

use crate::sim::event::HudEvent;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&HudEvent)>;

pub struct HudBridge {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl HudBridge {
    pub fn new() -> Self {
        HudBridge { next_id: 1, listeners: Vec::new() }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&HudEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns true if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    #[allow(dead_code)]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn publish(&mut self, event: HudEvent) {
        if log::log_enabled!(log::Level::Debug) {
            match serde_json::to_string(&event) {
                Ok(json) => log::debug!("hud {json}"),
                Err(e) => log::debug!("hud {} (unserializable: {e})", event.name()),
            }
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for HudBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HudBridge")
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}
