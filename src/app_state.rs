use crate::cache::ResponseCache;
use crate::cli::CommandLineArgs;
use crate::document_store::{DocumentStoreClient, DocumentStoreConfig};
use crate::warehouse::{WarehouseClient, WarehouseConfig};

use std::sync::Arc;
use std::time::Duration;

/// Shared application state passed to each request handler.
///
/// The warehouse client is constructed here and handed to the gateway rather than
/// living as hidden process-wide state; its single shared session is guarded
/// internally by a lock.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Warehouse client.
    pub warehouse: WarehouseClient,

    /// Document store client.
    pub documents: DocumentStoreClient,

    /// Response cache for warehouse queries.
    pub cache: ResponseCache,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs) -> Self {
        let warehouse = WarehouseClient::new(WarehouseConfig::from_args(args));
        let documents = DocumentStoreClient::new(DocumentStoreConfig::from_args(args));
        let cache = ResponseCache::new(Duration::from_secs(args.cache_ttl));

        Self {
            args: args.clone(),
            warehouse,
            documents,
            cache,
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
