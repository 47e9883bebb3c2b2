pub mod dispatcher;
pub mod error;
pub mod event;
pub mod message;
pub mod mock;
pub mod queue;
pub mod traits;

pub use dispatcher::{Dispatcher, Inlet, Subscription, SubscriptionId};
pub use error::{DispatchError, TransportError};
pub use event::{SharedUpdate, Update};
pub use mock::MockTransport;
pub use message::{Chat, Message, MessageEntity, OutgoingMessage, User, BOT_COMMAND};
pub use queue::{bounded, QueueClosed, QueueReceiver, QueueSender};
pub use traits::{Consumer, Transport};
