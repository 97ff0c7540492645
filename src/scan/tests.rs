#![allow(clippy::unwrap_used)]

use super::*;
use crate::api::{ApiError, AttendeeRecord, CommitReceipt, VolunteerInfo};
use crate::scanner::{DecoderEvents, FacingMode};
use secrecy::SecretString;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

#[derive(Default)]
struct ApiScript {
    lookups: VecDeque<Result<PassLookup, ApiError>>,
    commits: VecDeque<Result<CommitReceipt, ApiError>>,
    lookup_calls: Vec<String>,
    commit_calls: Vec<String>,
}

#[derive(Clone, Default)]
struct FakeApi {
    script: Arc<Mutex<ApiScript>>,
}

impl FakeApi {
    fn lookup(&self, result: Result<PassLookup, ApiError>) -> &Self {
        self.script.lock().unwrap().lookups.push_back(result);
        self
    }

    fn commit(&self, result: Result<CommitReceipt, ApiError>) -> &Self {
        self.script.lock().unwrap().commits.push_back(result);
        self
    }

    fn lookup_calls(&self) -> Vec<String> {
        self.script.lock().unwrap().lookup_calls.clone()
    }

    fn commit_calls(&self) -> Vec<String> {
        self.script.lock().unwrap().commit_calls.clone()
    }
}

impl CheckinApi for FakeApi {
    async fn lookup_pass(
        &self,
        pass_id: &PassId,
        _token: &SecretString,
    ) -> Result<PassLookup, ApiError> {
        let mut script = self.script.lock().unwrap();
        script.lookup_calls.push(pass_id.to_string());
        script.lookups.pop_front().unwrap_or(Ok(PassLookup::NotFound))
    }

    async fn mark_present(
        &self,
        pass_id: &PassId,
        _token: &SecretString,
    ) -> Result<CommitReceipt, ApiError> {
        let mut script = self.script.lock().unwrap();
        script.commit_calls.push(pass_id.to_string());
        script
            .commits
            .pop_front()
            .unwrap_or(Ok(CommitReceipt::default()))
    }

    async fn volunteer_info(&self, _token: &SecretString) -> Result<VolunteerInfo, ApiError> {
        Ok(VolunteerInfo::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Mount,
    Start,
    Stop,
    Clear,
}

#[derive(Default)]
struct Camera {
    calls: Vec<Call>,
    senders: Vec<DecoderEvents>,
    failing_starts: usize,
}

#[derive(Clone, Default)]
struct RecordingSurface {
    camera: Arc<Mutex<Camera>>,
}

impl RecordingSurface {
    fn calls(&self) -> Vec<Call> {
        self.camera.lock().unwrap().calls.clone()
    }

    fn fail_next_starts(&self, count: usize) {
        self.camera.lock().unwrap().failing_starts = count;
    }

    /// Pushes an event through the most recent binding's channel.
    fn emit(&self, event: DecoderEvent) -> bool {
        let camera = self.camera.lock().unwrap();
        camera
            .senders
            .last()
            .is_some_and(|sender| sender.send(event).is_ok())
    }

    fn decode(&self, text: &str) -> bool {
        self.emit(DecoderEvent::Decoded(text.to_string()))
    }

    fn first_sender(&self) -> DecoderEvents {
        self.camera.lock().unwrap().senders[0].clone()
    }
}

struct RecordingDecoder {
    camera: Arc<Mutex<Camera>>,
    state: DecoderState,
}

impl CaptureSurface for RecordingSurface {
    type Decoder = RecordingDecoder;

    async fn mount(&self) -> Result<RecordingDecoder, DecoderError> {
        self.camera.lock().unwrap().calls.push(Call::Mount);
        Ok(RecordingDecoder {
            camera: Arc::clone(&self.camera),
            state: DecoderState::NotStarted,
        })
    }
}

impl Decoder for RecordingDecoder {
    async fn start(
        &mut self,
        _facing: FacingMode,
        _config: &ScanConfig,
        events: DecoderEvents,
    ) -> Result<(), DecoderError> {
        let mut camera = self.camera.lock().unwrap();
        camera.calls.push(Call::Start);
        if camera.failing_starts > 0 {
            camera.failing_starts -= 1;
            return Err(DecoderError::CameraUnavailable(
                "NotAllowedError: Permission denied".to_string(),
            ));
        }
        camera.senders.push(events);
        self.state = DecoderState::Scanning;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DecoderError> {
        self.camera.lock().unwrap().calls.push(Call::Stop);
        if self.state != DecoderState::Scanning {
            return Err(DecoderError::NotScanning);
        }
        self.state = DecoderState::Stopped;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), DecoderError> {
        self.camera.lock().unwrap().calls.push(Call::Clear);
        self.state = DecoderState::NotStarted;
        Ok(())
    }

    fn state(&self) -> DecoderState {
        self.state
    }
}

fn context() -> ScanContext {
    ScanContext {
        session: Session::new(SecretString::from("volunteer-token".to_string())),
        assignment: StationAssignment {
            volunteer_name: "Meera".to_string(),
            station: "Gate 2".to_string(),
        },
    }
}

fn config() -> ScanConfig {
    ScanConfig {
        release_delay: Duration::ZERO,
        ..ScanConfig::default()
    }
}

fn attendee_a() -> AttendeeRecord {
    AttendeeRecord {
        name: "A".to_string(),
        roll_no: Some("R1".to_string()),
        dept: Some("CS".to_string()),
        guest_count: Some(2),
        pass_id: None,
    }
}

async fn scanning(
    api: &FakeApi,
    surface: &RecordingSurface,
) -> ScanController<FakeApi, RecordingSurface> {
    let mut controller = ScanController::new(context(), api.clone(), surface.clone(), config());
    controller.init().await;
    assert_eq!(controller.state(), &ScanState::Scanning);
    controller
}

fn modal_result(controller: &ScanController<FakeApi, RecordingSurface>) -> ScanResult {
    controller
        .state()
        .modal()
        .and_then(Modal::result)
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn init_mounts_and_starts_capture() {
    let api = FakeApi::default();
    let surface = RecordingSurface::default();
    let controller = scanning(&api, &surface).await;

    assert_eq!(surface.calls(), vec![Call::Mount, Call::Start]);
    assert_eq!(controller.decoder_state(), Some(DecoderState::Scanning));
}

#[tokio::test]
async fn camera_failure_is_page_level_until_refresh() {
    let api = FakeApi::default();
    let surface = RecordingSurface::default();
    surface.fail_next_starts(1);

    let mut controller = ScanController::new(context(), api.clone(), surface.clone(), config());
    controller.init().await;
    assert_eq!(
        controller.state(),
        &ScanState::CameraUnavailable {
            message: CAMERA_DENIED.to_string()
        }
    );

    // decodes go nowhere while the camera is unavailable
    controller.on_decode(PassId::from("PASS123")).await;
    assert!(api.lookup_calls().is_empty());

    controller.refresh().await;
    assert_eq!(controller.state(), &ScanState::Scanning);
}

#[tokio::test]
async fn lookup_success_opens_confirm_with_camera_stopped() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::Found(attendee_a())));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    assert!(surface.decode("PASS123"));
    assert_eq!(controller.process_pending().await, 1);

    let Some(Modal::Confirm { cycle, attendee }) = controller.state().modal() else {
        panic!("expected confirm, got {:?}", controller.state());
    };
    assert_eq!(cycle.pass_id.as_str(), "PASS123");
    assert_eq!(attendee, &attendee_a());
    assert_eq!(controller.decoder_state(), Some(DecoderState::Stopped));
    assert_eq!(
        surface.calls(),
        vec![Call::Mount, Call::Start, Call::Stop]
    );
}

#[tokio::test]
async fn duplicate_decodes_are_dropped_until_dismiss() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::Found(attendee_a())))
        .lookup(Ok(PassLookup::Found(attendee_a())));
    api.commit(Ok(CommitReceipt::default()));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    for _ in 0..3 {
        assert!(surface.decode("PASS123"));
    }
    assert_eq!(controller.process_pending().await, 3);
    assert_eq!(api.lookup_calls(), vec!["PASS123".to_string()]);

    // a late frame delivered straight to the controller is dropped as well
    controller.on_decode(PassId::from("PASS999")).await;
    controller.confirm().await;
    controller.on_decode(PassId::from("PASS999")).await;
    assert_eq!(api.lookup_calls().len(), 1);

    controller.dismiss().await;
    assert!(surface.decode("PASS456"));
    controller.process_pending().await;
    assert_eq!(
        api.lookup_calls(),
        vec!["PASS123".to_string(), "PASS456".to_string()]
    );
}

#[tokio::test]
async fn lookup_without_name_never_reaches_confirm() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::NotFound));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("BAD1")).await;

    assert!(matches!(controller.state().modal(), Some(Modal::Error(_))));
    let result = modal_result(&controller);
    assert_eq!(result.title, "Invalid QR Code");
    assert_eq!(result.message, "No student record found for this pass ID.");
}

#[tokio::test]
async fn lookup_failure_surfaces_raw_description() {
    let api = FakeApi::default();
    api.lookup(Err(ApiError::Http {
        status: 500,
        body: "boom".to_string(),
    }));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("PASS123")).await;

    let result = modal_result(&controller);
    assert_eq!(result.title, "Scan Error");
    assert_eq!(result.message, "Server returned 500: boom");
}

#[tokio::test]
async fn confirm_commits_and_reports_student() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::Found(attendee_a())));
    api.commit(Ok(CommitReceipt {
        message: Some("Marked present!".to_string()),
        student_name: Some("A".to_string()),
    }));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("PASS123")).await;
    controller.confirm().await;

    assert!(matches!(controller.state().modal(), Some(Modal::Success(_))));
    let result = modal_result(&controller);
    assert_eq!(result.title, "Check-in Successful!");
    assert_eq!(result.message, "Marked present! (Student: A)");
    assert_eq!(api.commit_calls(), vec!["PASS123".to_string()]);
}

#[tokio::test]
async fn sparse_receipt_falls_back_to_defaults() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::Found(attendee_a())));
    api.commit(Ok(CommitReceipt::default()));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("PASS123")).await;
    controller.confirm().await;

    assert_eq!(
        modal_result(&controller).message,
        "Marked present! (Student: A)"
    );
}

#[tokio::test]
async fn rejected_commit_shows_server_error() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::Found(attendee_a())));
    api.commit(Err(ApiError::Rejected {
        status: 409,
        message: "Already checked in".to_string(),
    }));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("PASS123")).await;
    controller.confirm().await;

    assert!(matches!(controller.state().modal(), Some(Modal::Error(_))));
    let result = modal_result(&controller);
    assert_eq!(result.title, "Check-in Failed");
    assert_eq!(result.message, "Already checked in");
}

#[tokio::test]
async fn transient_commit_failure_is_not_retried() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::Found(attendee_a())));
    api.commit(Err(ApiError::Timeout));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("PASS123")).await;
    controller.confirm().await;
    controller.confirm().await;

    assert!(matches!(controller.state().modal(), Some(Modal::Error(_))));
    assert_eq!(api.commit_calls().len(), 1);
}

#[tokio::test]
async fn confirm_outside_confirm_state_is_ignored() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::NotFound));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.confirm().await;
    assert_eq!(controller.state(), &ScanState::Scanning);

    controller.on_decode(PassId::from("BAD1")).await;
    let before = controller.state().clone();
    controller.confirm().await;
    assert_eq!(controller.state(), &before);
    assert!(api.commit_calls().is_empty());
}

#[tokio::test]
async fn dismiss_is_one_stop_then_start() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::NotFound));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("BAD1")).await;
    let before = surface.calls().len();
    controller.dismiss().await;

    let restart = surface.calls()[before..].to_vec();
    assert_eq!(restart, vec![Call::Stop, Call::Clear, Call::Mount, Call::Start]);
    assert_eq!(controller.state(), &ScanState::Scanning);
    assert_eq!(controller.decoder_state(), Some(DecoderState::Scanning));
}

#[tokio::test]
async fn dismiss_is_ignored_while_confirming() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::Found(attendee_a())));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("PASS123")).await;
    let calls = surface.calls();
    controller.dismiss().await;

    assert!(matches!(
        controller.state().modal(),
        Some(Modal::Confirm { .. })
    ));
    assert_eq!(surface.calls(), calls);
}

#[tokio::test]
async fn failed_restart_is_page_level() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::NotFound));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("BAD1")).await;
    surface.fail_next_starts(1);
    controller.dismiss().await;

    assert_eq!(
        controller.state(),
        &ScanState::CameraUnavailable {
            message: CAMERA_RESTART_FAILED.to_string()
        }
    );
    assert_eq!(controller.decoder_state(), None);
}

#[tokio::test]
async fn decode_noise_never_surfaces() {
    let api = FakeApi::default();
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    for message in [
        "NotFoundException: No MultiFormat Readers were able to detect the code.",
        "QR code parse error, error = D",
        "No MultiFormat Readers were able to detect the code.",
        "NotAllowedError: unrelated hiccup",
    ] {
        assert!(surface.emit(DecoderEvent::Error(message.to_string())));
    }
    assert_eq!(controller.process_pending().await, 4);

    assert_eq!(controller.state(), &ScanState::Scanning);
    assert_eq!(controller.decoder_state(), Some(DecoderState::Scanning));
    assert!(api.lookup_calls().is_empty());
}

#[tokio::test]
async fn frames_of_old_binding_never_reach_next_cycle() {
    let api = FakeApi::default();
    api.lookup(Ok(PassLookup::NotFound));
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.on_decode(PassId::from("BAD1")).await;
    controller.dismiss().await;

    let stale = surface.first_sender();
    assert!(stale.send(DecoderEvent::Decoded("PASS123".to_string())).is_err());
    assert_eq!(controller.process_pending().await, 0);
    assert_eq!(api.lookup_calls().len(), 1);
}

#[tokio::test]
async fn next_event_yields_queued_events() {
    let api = FakeApi::default();
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    assert!(surface.decode("PASS123"));
    assert_eq!(
        controller.next_event().await,
        Some(DecoderEvent::Decoded("PASS123".to_string()))
    );
}

#[tokio::test]
async fn teardown_stops_running_capture() {
    let api = FakeApi::default();
    let surface = RecordingSurface::default();
    let mut controller = scanning(&api, &surface).await;

    controller.teardown().await;

    assert_eq!(controller.state(), &ScanState::Stopped);
    assert_eq!(controller.decoder_state(), None);
    assert_eq!(surface.calls(), vec![Call::Mount, Call::Start, Call::Stop]);
}
