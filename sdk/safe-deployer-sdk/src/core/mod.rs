pub mod bundler;
pub mod connection;
pub mod constants;
pub mod network;
pub mod rpc;
pub mod signer;
