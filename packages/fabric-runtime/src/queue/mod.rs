//! In-memory queue fabric: the topic registry (C6), producer/consumer
//! handles (C7), and the request/response correlation template (C8).

pub mod consumer;
pub mod message;
pub mod producer;
pub mod request_response;
pub mod registry;

pub use consumer::QueueConsumer;
pub use message::QueueMessage;
pub use producer::{QueueProducer, SendError, SendResult};
pub use registry::TopicRegistry;
pub use request_response::{RequestResponseConfig, RequestResponseError, RequestResponseTemplate};
