use crate::app::ports::SessionPort;
use crate::config::Endpoints;
use crate::error::{Result, SniperError};
use crate::types::UserProfile;
use tracing::{info, instrument};

/// Resolve the account the session cookie belongs to
#[instrument(skip_all)]
pub async fn resolve_user(session: &dyn SessionPort, endpoints: &Endpoints) -> Result<UserProfile> {
    let url = endpoints.profile_url();
    let response = session.get(&url).await?;

    match response.status {
        401 | 403 => {
            return Err(SniperError::NotAuthenticated(format!(
                "profile request answered {}, is the cookie still valid?",
                response.status
            )))
        }
        _ if !response.is_success() => {
            return Err(SniperError::BadStatus {
                status: response.status,
                url,
            })
        }
        _ => {}
    }

    let profile: UserProfile = response.json().map_err(|e| {
        SniperError::NotAuthenticated(format!("profile response was not a user profile: {}", e))
    })?;
    info!(user_id = profile.id, "Authenticated as {}", profile.name);
    Ok(profile)
}
