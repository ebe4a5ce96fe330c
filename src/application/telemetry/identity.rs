use crate::domain::repositories::TelemetryIdentityRepository;
use tracing::{error, info};
use uuid::Uuid;

/// Load the persisted telemetry identifier, generating and persisting a new
/// one on first start.
///
/// Returns `None` when the store can't be read or the fresh identifier can't
/// be saved. Uploads are then disabled for the lifetime of the process so the
/// collector never sees a batch under an identifier that would change on the
/// next restart.
pub async fn load_or_create_identifier(
    repository: &dyn TelemetryIdentityRepository,
) -> Option<String> {
    match repository.load().await {
        Ok(Some(id)) if !id.trim().is_empty() => {
            info!("Telemetry identifier loaded: {}", id);
            Some(id)
        }
        Ok(_) => {
            let id = Uuid::new_v4().to_string();
            match repository.save(&id).await {
                Ok(()) => {
                    info!("Telemetry identifier generated: {}", id);
                    Some(id)
                }
                Err(e) => {
                    error!("Failed to persist telemetry identifier: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            error!("Failed to load telemetry identifier: {}", e);
            None
        }
    }
}
