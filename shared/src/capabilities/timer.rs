use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOperation {
    Start { id: u64, millis: u64 },
    Cancel { id: u64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOutput {
    Elapsed { id: u64 },
    Cancelled { id: u64 },
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

/// One-shot timers identified by caller-chosen ids.
#[derive(Capability)]
pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Timer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    /// Sends the event back once `millis` have passed. A cancelled timer sends nothing.
    #[instrument(skip(self, make_event))]
    pub fn start<F>(&self, id: u64, millis: u64, make_event: F)
    where
        F: FnOnce() -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            match context
                .request_from_shell(TimerOperation::Start { id, millis })
                .await
            {
                TimerOutput::Elapsed { .. } => context.update_app(make_event()),
                TimerOutput::Cancelled { .. } => {}
            }
        });
    }

    #[instrument(skip(self))]
    pub fn cancel(&self, id: u64) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(TimerOperation::Cancel { id }).await;
        });
    }
}
