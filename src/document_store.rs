//! A client for the document store holding supplementary dashboard data.
//!
//! Comments are free-form annotations a user attaches to a data point. They are
//! immutable once stored; there is no update or delete path and no uniqueness
//! constraint.
//!
//! Unlike the warehouse client, this client deliberately opens a fresh connection for
//! every call, mirroring the upstream service, which created a new store client per
//! request. The asymmetry is preserved rather than fixed; the cost is recorded in
//! DESIGN.md.

use crate::cli::CommandLineArgs;
use crate::error::DataServiceError;
use crate::models::CommentRequest;
use crate::warehouse::error_message;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use url::Url;

/// Document store connection settings, taken from the command line.
#[derive(Clone, Debug)]
pub struct DocumentStoreConfig {
    /// Base URL of the document store HTTP API
    pub url: Url,
    pub database: String,
    pub collection: String,
}

impl DocumentStoreConfig {
    pub fn from_args(args: &CommandLineArgs) -> Self {
        Self {
            url: args.document_store_url.clone(),
            database: args.document_database.clone(),
            collection: args.comment_collection.clone(),
        }
    }
}

/// Document store client object.
pub struct DocumentStoreClient {
    config: DocumentStoreConfig,
}

/// The comment document as persisted: the client-supplied fields plus a
/// server-assigned UTC timestamp.
#[derive(Debug, Serialize)]
struct CommentDocument<'a> {
    user_id: &'a str,
    data_point_id: &'a str,
    comment: &'a str,
    /// RFC 3339 UTC insertion timestamp
    timestamp: String,
}

impl DocumentStoreClient {
    pub fn new(config: DocumentStoreConfig) -> Self {
        Self { config }
    }

    /// Open a connection to the document store.
    ///
    /// A new client per call: connections are not reused between requests.
    fn connect(&self) -> reqwest::Client {
        reqwest::Client::new()
    }

    /// Append a comment record to the comment collection.
    ///
    /// The insertion timestamp is assigned here, not taken from the caller.
    pub async fn insert_comment(&self, request: &CommentRequest) -> Result<(), DataServiceError> {
        let client = self.connect();
        let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let document = CommentDocument {
            user_id: &request.user_id,
            data_point_id: &request.data_point_id,
            comment: &request.comment,
            timestamp,
        };
        let url = self
            .config
            .url
            .join(&format!("{}/{}", self.config.database, self.config.collection))?;
        tracing::debug!(data_point_id = %request.data_point_id, "inserting comment");
        let response = client
            .post(url)
            .json(&document)
            .send()
            .await
            .map_err(DataServiceError::StoreConnection)?;
        if !response.status().is_success() {
            return Err(DataServiceError::StoreInsert {
                message: error_message(response).await,
            });
        }
        Ok(())
    }
}
