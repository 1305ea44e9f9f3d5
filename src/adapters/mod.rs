// Adapters layer: concrete implementations for external systems (rpc, processes, storage).

pub mod process;
pub mod rpc;
pub mod storage;

pub use process::SystemCommandRunner;
pub use rpc::JsonRpcClient;
pub use storage::LocalStorage;
