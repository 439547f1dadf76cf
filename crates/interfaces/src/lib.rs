pub mod background;
pub mod messages;
pub mod poller;
pub mod traits;

pub use background::BackgroundService;
pub use messages::{BackgroundRequest, BackgroundResponse};
pub use poller::poll_until_settled;
pub use traits::{MessageChannel, ProtocolError};
