use super::{EventContext, HookDispatcher};

/// An ordered set of listeners behind one dispatcher.
///
/// Listeners run in registration order; the first failure stops the event.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Box<dyn HookDispatcher>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Box<dyn HookDispatcher>) {
        self.listeners.push(listener);
    }

    pub fn with_listener(mut self, listener: Box<dyn HookDispatcher>) -> Self {
        self.register(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl HookDispatcher for ListenerRegistry {
    fn dispatch(&self, event: &str, context: &EventContext<'_>) -> anyhow::Result<()> {
        for listener in &self.listeners {
            listener.dispatch(event, context)?;
        }
        Ok(())
    }
}
