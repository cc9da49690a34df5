// jobrelay Infrastructure - HTTP Adapters
// Implements: RemoteStore, ArtifactFetcher

pub mod client;
pub mod fetcher;
pub mod remote_store;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::build_client;
pub use fetcher::HttpArtifactFetcher;
pub use remote_store::HttpRemoteStore;
