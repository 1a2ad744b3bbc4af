//! Startup connection check.

use crate::error::{EngineError, EngineResult};
use hardlinker_api::RemoteApi;
use tracing::{error, info};

/// Verifies the remote is reachable and reports no system errors.
///
/// Listed errors are logged and then cleared on the remote, so a rerun after
/// fixing the cause succeeds.
///
/// # Errors
///
/// Returns [`EngineError::Api`] if any call fails, or
/// [`EngineError::RemoteErrors`] if the remote listed errors.
pub async fn check_connection<A>(api: &A) -> EngineResult<()>
where
    A: RemoteApi + ?Sized,
{
    api.ping().await?;

    let errors = api.list_errors().await?;
    for err in &errors {
        error!(when = %err.when, message = %err.message, "Remote reported error");
    }
    api.clear_errors().await?;

    if errors.is_empty() {
        info!("Connection to remote is healthy");
        Ok(())
    } else {
        Err(EngineError::RemoteErrors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hardlinker_api::{ApiError, MockApi};

    #[tokio::test]
    async fn healthy_remote() {
        let api = MockApi::new();
        assert!(check_connection(&api).await.is_ok());
    }

    #[tokio::test]
    async fn listed_errors_fail_and_are_cleared() {
        let api = MockApi::new();
        api.add_system_error("2024-06-01T12:00:00Z", "folder marker missing");

        let err = check_connection(&api).await.unwrap_err();
        match err {
            EngineError::RemoteErrors(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].message, "folder marker missing");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(check_connection(&api).await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_remote() {
        let api = MockApi::new();
        api.set_unreachable(true);

        let err = check_connection(&api).await.unwrap_err();
        assert!(matches!(err, EngineError::Api(ApiError::Transport(_))));
    }
}
