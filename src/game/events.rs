/// Tick lifecycle notifications for observers outside the simulation.
///
/// Listeners only receive the tick number; they get no access to the grid, so
/// they cannot change what happens inside a tick.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickEvent {
    /// Emitted before any cell updates of tick `tick`.
    Started { tick: u64 },
    /// Emitted after tick `tick` finished and the counter advanced.
    Ended { tick: u64 },
}

impl TickEvent {
    pub fn tick(&self) -> u64 {
        match *self {
            TickEvent::Started { tick } | TickEvent::Ended { tick } => tick,
        }
    }
}

pub trait TickListener: Send + Sync {
    fn on_tick(&self, event: TickEvent);
}

impl<F> TickListener for F
where
    F: Fn(TickEvent) + Send + Sync,
{
    fn on_tick(&self, event: TickEvent) {
        self(event)
    }
}
