//! Asynchronous domain event dispatch

pub mod bus;
pub mod dispatcher;
pub mod handlers;

pub use bus::{event_queue, EventBus, EventReceiver};
pub use dispatcher::{EventDispatcher, EventHandler, HandlerRegistry};
pub use handlers::{register_email_handlers, ActivationEmailHandler, WelcomeEmailHandler};
