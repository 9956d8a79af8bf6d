//! Session driver - serializes user intents and channel events
//!
//! All controller mutation happens inside [`SessionDriver::run`], so the
//! controller never needs locking.

use tokio::sync::mpsc;
use tracing::debug;

use crate::channel::{ChannelEvent, Connector};
use crate::controller::SessionController;

/// Something the user asked the shell to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    Join,
    /// The draft text changed.
    Draft(String),
    Send(String),
    /// Send whatever is in the draft.
    SubmitDraft,
    End,
    /// The session view is going away.
    Teardown,
}

pub struct SessionDriver<C: Connector> {
    controller: SessionController<C>,
    intents: mpsc::UnboundedReceiver<UserIntent>,
    channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl<C: Connector> SessionDriver<C> {
    pub fn new(
        controller: SessionController<C>,
        intents: mpsc::UnboundedReceiver<UserIntent>,
        channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
    ) -> Self {
        Self {
            controller,
            intents,
            channel_events,
        }
    }

    pub fn controller(&self) -> &SessionController<C> {
        &self.controller
    }

    /// Process events in arrival order until a `Teardown` intent arrives or
    /// every intent sender is dropped. The controller is torn down before
    /// it is returned.
    pub async fn run(mut self) -> SessionController<C> {
        loop {
            tokio::select! {
                intent = self.intents.recv() => match intent {
                    Some(UserIntent::Teardown) | None => break,
                    Some(intent) => self.apply(intent),
                },
                Some(event) = self.channel_events.recv() => {
                    self.controller.handle_channel_event(event);
                }
            }
        }

        self.controller.teardown();
        self.controller
    }

    fn apply(&mut self, intent: UserIntent) {
        let result = match intent {
            UserIntent::Join => self.controller.join().map(|_| ()),
            UserIntent::Draft(text) => {
                self.controller.notify_typing(&text);
                Ok(())
            }
            UserIntent::Send(text) => self.controller.send_message(&text),
            UserIntent::SubmitDraft => self.controller.submit_draft(),
            UserIntent::End => self.controller.end_chat(),
            UserIntent::Teardown => {
                self.controller.teardown();
                Ok(())
            }
        };

        if let Err(e) = result {
            debug!("intent rejected: {e}");
        }
    }
}
