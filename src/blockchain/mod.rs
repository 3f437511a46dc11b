pub mod client;
pub mod rpc_client;
pub mod subscription;

pub use client::{ChainClient, ChainReceipt, ChainTransaction};
pub use rpc_client::RpcClient;
pub use subscription::{subscribe, ChainEvent, Subscription, Topic, TRANSFER_EVENT_TOPIC};
