//! Best-effort artwork metadata retrieval

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::errors::{ListingsError, ListingsResult};
use crate::models::Credentials;
use crate::models::schedules_direct::{ImageCandidate, ShowImages};
use crate::services::program_merger::program_id_root;
use crate::services::transport::Transport;
use crate::utils::http_client::ApiRequest;

/// Artwork candidates keyed by 10-character program root
pub type ArtworkIndex = HashMap<String, Vec<ImageCandidate>>;

pub struct ImageFetcher {
    transport: Arc<Transport>,
}

impl ImageFetcher {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Fetch candidates for `program_ids`
    ///
    /// Failures are logged and produce an empty index; only cancellation is returned.
    pub async fn fetch(
        &self,
        program_ids: &[String],
        token: &str,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> ListingsResult<ArtworkIndex> {
        let roots = distinct_roots(program_ids);
        if roots.is_empty() {
            return Ok(ArtworkIndex::new());
        }

        match self.request(&roots, token, credentials, cancel).await {
            Ok(index) => {
                debug!("Fetched artwork for {} of {} programs", index.len(), roots.len());
                Ok(index)
            }
            Err(ListingsError::Cancelled) => Err(ListingsError::Cancelled),
            Err(e) => {
                error!("Error getting image info from listings service: {}", e);
                Ok(ArtworkIndex::new())
            }
        }
    }

    async fn request(
        &self,
        roots: &[String],
        token: &str,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> ListingsResult<ArtworkIndex> {
        let request = ApiRequest::post_json("metadata/programs", &roots)?.with_token(token);
        let response = self.transport.send(request, true, credentials, cancel).await?;
        let shows: Vec<ShowImages> = response.json("metadata/programs")?;

        let mut index = ArtworkIndex::new();
        for show in shows {
            index.entry(show.program_id).or_default().extend(show.data);
        }
        Ok(index)
    }
}

fn distinct_roots(program_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    program_ids
        .iter()
        .map(|id| program_id_root(id).to_string())
        .filter(|root| seen.insert(root.clone()))
        .collect()
}
