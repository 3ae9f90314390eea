//! Instance tier detection

use crate::catalog::Tier;
use crate::gitlab::GitLabClient;
use crate::gitlab::types::{InstanceMetadata, License};
use tracing::{debug, info};

/// Work out the instance tier from `/metadata` and `/license`.
///
/// Community Edition is always `free`. For Enterprise Edition the license plan
/// decides; when the license is unreadable (non-admin token, gitlab.com) the
/// tier is unknown and `None` is returned.
pub async fn detect_tier(client: &GitLabClient) -> Option<Tier> {
    let metadata: InstanceMetadata = match client.get("/metadata").await {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!(error = %e, "Could not read instance metadata");
            return None;
        }
    };

    if !metadata.enterprise {
        info!(version = %metadata.version, "Detected GitLab Community Edition");
        return Some(Tier::Free);
    }

    let license: License = match client.get("/license").await {
        Ok(license) => license,
        Err(e) => {
            debug!(error = %e, "Could not read license, tier unknown");
            return None;
        }
    };

    if license.expired {
        return Some(Tier::Free);
    }

    let tier = license.plan.as_deref().and_then(|plan| plan.parse().ok());
    if let Some(tier) = tier {
        info!(version = %metadata.version, tier = %tier, "Detected GitLab tier");
    }
    tier
}
