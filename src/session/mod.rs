//! Session gate and station setup.
//!
//! The scan view is only entered with a signed-in volunteer and a station
//! assignment; both are checked once on entry and never re-validated.

use crate::{
    api::{ApiError, CheckinApi},
    identity::IdentityProvider,
    scan::ScanContext,
    station::{StationAssignment, StationStore, StoreError},
};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

pub const SESSION_EXPIRED: &str = "Session expired. Logging out...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Setup,
    Scan,
}

#[derive(Debug, Clone)]
pub enum GateOutcome {
    Ready(ScanContext),
    Redirect(Route),
}

/// Result of asking the backend who the volunteer is and where they stand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    Assigned(StationAssignment),
    Redirect {
        route: Route,
        notice: Option<&'static str>,
    },
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Could not find your volunteer details.")]
    MissingDetails,
    #[error("Network error. Please check your connection.")]
    Network(#[source] ApiError),
    #[error("Volunteer details are missing. Cannot start scanner.")]
    BlankVolunteer,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Decides whether the scan view may open.
#[instrument(skip_all)]
pub async fn enter_scan_view<I, S>(identity: &I, store: &S) -> GateOutcome
where
    I: IdentityProvider,
    S: StationStore + ?Sized,
{
    let session = match identity.current_session().await {
        Ok(Some(session)) => session,
        Ok(None) => {
            debug!("no session, redirecting to login");
            return GateOutcome::Redirect(Route::Login);
        }
        Err(err) => {
            warn!("session check failed: {err}");
            return GateOutcome::Redirect(Route::Login);
        }
    };

    match store.load() {
        Ok(Some(assignment)) => GateOutcome::Ready(ScanContext {
            session,
            assignment,
        }),
        Ok(None) => {
            debug!("no station assignment, redirecting to setup");
            GateOutcome::Redirect(Route::Setup)
        }
        Err(err) => {
            warn!("station assignment unreadable: {err}");
            GateOutcome::Redirect(Route::Setup)
        }
    }
}

/// Fetches the volunteer's name and station for the signed-in session.
///
/// # Errors
/// Returns [`SetupError::MissingDetails`] when the backend has no complete
/// record and [`SetupError::Network`] for any other failure.
#[instrument(skip_all)]
pub async fn fetch_assignment<I, A>(identity: &I, api: &A) -> Result<SetupOutcome, SetupError>
where
    I: IdentityProvider,
    A: CheckinApi,
{
    let session = match identity.current_session().await {
        Ok(Some(session)) => session,
        Ok(None) | Err(_) => {
            return Ok(SetupOutcome::Redirect {
                route: Route::Login,
                notice: None,
            })
        }
    };

    let info = match api.volunteer_info(&session.access_token).await {
        Ok(info) => info,
        Err(ApiError::Unauthorized { status }) => {
            warn!(status, "volunteer token rejected, signing out");
            if let Err(err) = identity.sign_out().await {
                error!("sign out failed: {err}");
            }
            return Ok(SetupOutcome::Redirect {
                route: Route::Login,
                notice: Some(SESSION_EXPIRED),
            });
        }
        Err(err) => {
            error!("volunteer info failed: {err}");
            return Err(SetupError::Network(err));
        }
    };

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    match (non_empty(info.name), non_empty(info.station)) {
        (Some(volunteer_name), Some(station)) => {
            info!(%station, "volunteer assignment fetched");
            Ok(SetupOutcome::Assigned(StationAssignment {
                volunteer_name,
                station,
            }))
        }
        _ => Err(SetupError::MissingDetails),
    }
}

/// Stores the assignment for the scan view.
///
/// # Errors
/// Rejects a blank volunteer name and reports store failures.
pub fn start_scanning<S>(store: &S, assignment: &StationAssignment) -> Result<Route, SetupError>
where
    S: StationStore + ?Sized,
{
    if assignment.volunteer_name.trim().is_empty() {
        return Err(SetupError::BlankVolunteer);
    }
    store.save(assignment)?;
    Ok(Route::Scan)
}

/// Signs out and forgets the station. Both steps are best effort.
#[instrument(skip_all)]
pub async fn logout<I, S>(identity: &I, store: &S) -> Route
where
    I: IdentityProvider,
    S: StationStore + ?Sized,
{
    if let Err(err) = identity.sign_out().await {
        warn!("sign out failed: {err}");
    }
    if let Err(err) = store.clear() {
        warn!("could not clear station assignment: {err}");
    }
    Route::Login
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        api::{CommitReceipt, PassId, PassLookup, VolunteerInfo},
        identity::Session,
        station::MemoryStationStore,
    };
    use secrecy::SecretString;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    #[derive(Default)]
    struct FakeIdentity {
        session: Option<Session>,
        fail: bool,
        sign_outs: AtomicUsize,
    }

    impl FakeIdentity {
        fn signed_in() -> Self {
            Self {
                session: Some(Session::new(SecretString::from("token".to_string()))),
                ..Self::default()
            }
        }
    }

    impl IdentityProvider for FakeIdentity {
        async fn current_session(&self) -> Result<Option<Session>, ApiError> {
            if self.fail {
                return Err(ApiError::Timeout);
            }
            Ok(self.session.clone())
        }

        async fn sign_out(&self) -> Result<(), ApiError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakeApi {
        volunteer: Mutex<Option<Result<VolunteerInfo, ApiError>>>,
    }

    impl FakeApi {
        fn answering(result: Result<VolunteerInfo, ApiError>) -> Self {
            Self {
                volunteer: Mutex::new(Some(result)),
            }
        }
    }

    impl CheckinApi for FakeApi {
        async fn lookup_pass(
            &self,
            _pass_id: &PassId,
            _token: &SecretString,
        ) -> Result<PassLookup, ApiError> {
            Ok(PassLookup::NotFound)
        }

        async fn mark_present(
            &self,
            _pass_id: &PassId,
            _token: &SecretString,
        ) -> Result<CommitReceipt, ApiError> {
            Ok(CommitReceipt::default())
        }

        async fn volunteer_info(&self, _token: &SecretString) -> Result<VolunteerInfo, ApiError> {
            self.volunteer
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Ok(VolunteerInfo::default()))
        }
    }

    fn gate2() -> StationAssignment {
        StationAssignment {
            volunteer_name: "Meera".to_string(),
            station: "Gate 2".to_string(),
        }
    }

    #[tokio::test]
    async fn gate_requires_session_then_station() {
        let store = MemoryStationStore::default();

        let outcome = enter_scan_view(&FakeIdentity::default(), &store).await;
        assert!(matches!(outcome, GateOutcome::Redirect(Route::Login)));

        let failing = FakeIdentity {
            fail: true,
            ..FakeIdentity::signed_in()
        };
        let outcome = enter_scan_view(&failing, &store).await;
        assert!(matches!(outcome, GateOutcome::Redirect(Route::Login)));

        let outcome = enter_scan_view(&FakeIdentity::signed_in(), &store).await;
        assert!(matches!(outcome, GateOutcome::Redirect(Route::Setup)));

        store.save(&gate2()).unwrap();
        let GateOutcome::Ready(context) = enter_scan_view(&FakeIdentity::signed_in(), &store).await
        else {
            panic!("expected the scan view to open");
        };
        assert_eq!(context.assignment, gate2());
    }

    #[tokio::test]
    async fn complete_volunteer_record_becomes_assignment() {
        let api = FakeApi::answering(Ok(VolunteerInfo {
            name: Some("Meera".to_string()),
            station: Some("Gate 2".to_string()),
        }));
        let outcome = fetch_assignment(&FakeIdentity::signed_in(), &api)
            .await
            .unwrap();
        assert_eq!(outcome, SetupOutcome::Assigned(gate2()));
    }

    #[tokio::test]
    async fn incomplete_volunteer_record_is_missing_details() {
        let api = FakeApi::answering(Ok(VolunteerInfo {
            name: Some("Meera".to_string()),
            station: None,
        }));
        let err = fetch_assignment(&FakeIdentity::signed_in(), &api)
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::MissingDetails));
        assert_eq!(err.to_string(), "Could not find your volunteer details.");
    }

    #[tokio::test]
    async fn rejected_token_signs_out() {
        let identity = FakeIdentity::signed_in();
        let api = FakeApi::answering(Err(ApiError::Unauthorized { status: 401 }));

        let outcome = fetch_assignment(&identity, &api).await.unwrap();

        assert_eq!(
            outcome,
            SetupOutcome::Redirect {
                route: Route::Login,
                notice: Some(SESSION_EXPIRED),
            }
        );
        assert_eq!(identity.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_failure_reads_as_network_error() {
        let api = FakeApi::answering(Err(ApiError::Http {
            status: 500,
            body: "boom".to_string(),
        }));
        let err = fetch_assignment(&FakeIdentity::signed_in(), &api)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Network error. Please check your connection.");
    }

    #[tokio::test]
    async fn setup_without_session_goes_to_login() {
        let api = FakeApi::answering(Ok(VolunteerInfo::default()));
        let outcome = fetch_assignment(&FakeIdentity::default(), &api)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SetupOutcome::Redirect {
                route: Route::Login,
                notice: None,
            }
        );
    }

    #[test]
    fn start_scanning_rejects_blank_volunteer() {
        let store = MemoryStationStore::default();
        let blank = StationAssignment {
            volunteer_name: "  ".to_string(),
            station: "Gate 2".to_string(),
        };
        let err = start_scanning(&store, &blank).unwrap_err();
        assert!(matches!(err, SetupError::BlankVolunteer));
        assert!(store.load().unwrap().is_none());

        assert_eq!(start_scanning(&store, &gate2()).unwrap(), Route::Scan);
        assert_eq!(store.load().unwrap(), Some(gate2()));
    }

    #[tokio::test]
    async fn logout_clears_station() {
        let identity = FakeIdentity::signed_in();
        let store = MemoryStationStore::with(gate2());

        assert_eq!(logout(&identity, &store).await, Route::Login);
        assert!(store.load().unwrap().is_none());
        assert_eq!(identity.sign_outs.load(Ordering::SeqCst), 1);
    }
}
