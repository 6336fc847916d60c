//! The single re-authentication retry used for X.
//!
//! An attempt that fails with HTTP 401 triggers exactly one credential
//! refresh followed by exactly one more attempt with the fresh token. Any
//! other outcome (success, a non-401 failure, a failed refresh, or a second
//! failure) is returned as is. There is no backoff.
use crate::SocialError;
use std::future::Future;

pub async fn with_refresh<T, A, AFut, R, RFut>(
    token: String,
    attempt: A,
    refresh: R,
) -> Result<T, SocialError>
where
    A: Fn(String) -> AFut,
    AFut: Future<Output = Result<T, SocialError>>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = Result<String, SocialError>>,
{
    match attempt(token).await {
        Err(e) if e.is_unauthorized() => {
            tracing::info!(error = %e, "social.auth.refresh");
            let fresh = refresh().await?;
            attempt(fresh).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_common::Network;
    use herald_http::{HttpError, Status};
    use std::sync::Mutex;

    fn unauthorized() -> SocialError {
        SocialError::Http {
            service: "test",
            source: HttpError::Api {
                status: Status::UNAUTHORIZED,
                message: "expired".into(),
                request_id: "r1".into(),
            },
        }
    }

    #[tokio::test]
    async fn success_skips_refresh() {
        let refreshed = Mutex::new(0);
        let out = with_refresh(
            "t1".into(),
            |t| async move { Ok::<_, SocialError>(t) },
            || async {
                *refreshed.lock().unwrap() += 1;
                Ok("t2".to_string())
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "t1");
        assert_eq!(*refreshed.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn unauthorized_refreshes_once_and_retries_with_new_token() {
        let seen = Mutex::new(Vec::new());
        let out = with_refresh(
            "stale".into(),
            |t| {
                seen.lock().unwrap().push(t.clone());
                async move {
                    if t == "stale" {
                        Err(unauthorized())
                    } else {
                        Ok(t)
                    }
                }
            },
            || async { Ok("fresh".to_string()) },
        )
        .await
        .unwrap();
        assert_eq!(out, "fresh");
        assert_eq!(*seen.lock().unwrap(), vec!["stale", "fresh"]);
    }

    #[tokio::test]
    async fn second_unauthorized_is_surfaced() {
        let calls = Mutex::new(0);
        let err = with_refresh(
            "stale".into(),
            |_t| {
                *calls.lock().unwrap() += 1;
                async { Err::<(), _>(unauthorized()) }
            },
            || async { Ok("fresh".to_string()) },
        )
        .await
        .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn other_errors_do_not_refresh() {
        let err = with_refresh(
            "t".into(),
            |_t| async { Err::<(), _>(SocialError::MissingCredentials(Network::X)) },
            || async { Err(SocialError::Config("test", "refresh ran".into())) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SocialError::MissingCredentials(Network::X)));
    }
}
