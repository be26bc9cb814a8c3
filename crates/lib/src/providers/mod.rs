//! # External Providers
//!
//! Traits and HTTP clients for every service the pipeline talks to: object
//! storage, the partition API, language models, the processing queue, and the
//! document database contract.

pub mod ai;
pub mod factory;
pub mod gcp_auth;
pub mod partition;
pub mod queue;
pub mod repository;
pub mod storage;

pub use ai::{AiProvider, ChatMessage, ChatRole, CompletionRequest};
pub use partition::{PartitionSettings, Partitioner, UnstructuredClient};
pub use queue::{ChannelPublisher, MessagePublisher, PubSubPublisher, PushEnvelope};
pub use repository::FileRecordRepository;
pub use storage::{GcsObjectStore, ObjectStore};
