//! End-to-end scenarios.
//!
//! Drives the harness the way a UI test suite does between scenarios:
//!
//! 1. Reset leftovers from a previous run
//! 2. Provision the instruments the scenario needs
//! 3. Stage results and let a run consume them
//! 4. Cancel whatever is still running
//! 5. Reset again, then confirm a further reset is a no-op
//!
//! The first scenario runs against the stepped in-memory lab on a paused
//! clock; the second runs the HTTP transport against mock services.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p labsync-e2e --test scenario
//! ```

use std::time::Duration;

use labsync_harness::{Harness, HarnessConfig, HarnessError};
use labsync_model::{
    AssayResult, IdentityError, InstrumentStatus, InstrumentType, ResultSet, RESULT_ELEMENT,
};
use labsync_reconcile::PollPolicy;
use labsync_remote::RemoteConfig;
use labsync_testing::FakeLab;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn scenario_config() -> HarnessConfig {
    HarnessConfig {
        poll: PollPolicy::new(Duration::from_millis(250), Duration::from_secs(10)),
        provision_poll: PollPolicy::new(Duration::from_millis(500), Duration::from_secs(30)),
        automated: true,
        reset_excluded_types: Vec::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn scenario_lifecycle_against_stepped_lab() {
    init_tracing();

    let lab = FakeLab::new().with_startup_reads(3).with_shutdown_reads(2);
    lab.seed_instrument(InstrumentType::UrineAnalyzer, InstrumentStatus::Busy);
    lab.seed_orphan_status(
        InstrumentType::HematologyAnalyzer,
        "ORPHAN7",
        false,
        InstrumentStatus::Alert,
    );
    let harness = Harness::new(lab.clone(), lab.clone(), scenario_config());

    tracing::info!("Step 1: clear leftovers");
    let report = harness.reset_environment().await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.released, 1);
    assert_eq!(report.suppressed, 2);
    assert!(lab.devices().is_empty());
    assert!(lab.statuses().is_empty());

    tracing::info!("Step 2: provision instruments");
    let chem = harness
        .ensure_instrument_of_type(InstrumentType::ChemistryAnalyzer)
        .await
        .unwrap();
    let sediment = harness
        .ensure_instrument_of_type(InstrumentType::SedimentAnalyzer)
        .await
        .unwrap();
    let reflab = harness
        .ensure_instrument_of_type(InstrumentType::ReferenceLabInterface)
        .await
        .unwrap();
    assert_eq!(lab.calls().creates.len(), 3);
    assert_eq!(lab.calls().approvals.len(), 1);
    assert!(chem.main_unit_serial_number.is_some());

    let again = harness
        .ensure_instrument_of_type(InstrumentType::ChemistryAnalyzer)
        .await
        .unwrap();
    assert_eq!(again.id, chem.id);
    assert_eq!(lab.calls().creates.len(), 3);

    tracing::info!("Step 3: stage results and run");
    let first = ResultSet::new(vec![AssayResult::new("ALB", "3.9")]);
    let second = ResultSet {
        sample_type: Some("SERUM".to_string()),
        ..ResultSet::new(vec![AssayResult::new("ALB", "4.4")])
    };
    harness.stage_results(chem.id, &first).await.unwrap();
    harness.stage_results(chem.id, &second).await.unwrap();

    let consumed = lab.simulate_run(chem.id).unwrap();
    assert_eq!(
        consumed.field(RESULT_ELEMENT),
        Some(&json!([{ "assayName": "ALB", "value": "4.4" }]))
    );
    assert_eq!(consumed.field("sampleType"), Some(&json!("SERUM")));
    assert!(lab.simulate_run(chem.id).is_none());

    tracing::info!("Step 4: cancel running work");
    let chem_instrument = lab.instrument_id_of(chem.id).unwrap();
    let sediment_instrument = lab.instrument_id_of(sediment.id).unwrap();
    lab.seed_lab_request(&[chem_instrument, sediment_instrument]);
    let cancel = harness.cancel_running_lab_requests().await.unwrap();
    assert_eq!(cancel.runs, 2);
    assert_eq!(cancel.cancelled, 2);
    assert_eq!(cancel.released, 2);
    assert!(lab.running_runs().is_empty());

    tracing::info!("Step 5: tear down");
    let report = harness.reset_environment().await.unwrap();
    assert_eq!(report.deleted, 3);
    assert_eq!(report.failures(), 0);
    assert!(lab.instrument_id_of(reflab.id).is_none());
    assert!(lab.statuses().is_empty());

    let report = harness.reset_environment().await.unwrap();
    assert!(report.is_noop(), "second reset did work: {report:?}");
}

#[tokio::test]
async fn scenario_over_http_transport() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/devices/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/instruments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/lab-requests/running"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "instrumentRuns": [{ "id": 5, "instrumentId": 12 }] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/runs/5/cancel"))
        .respond_with(ResponseTemplate::new(500).set_body_string("run is locked"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/devices/12/stop-waiting"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RemoteConfig {
        device_service_url: server.uri(),
        management_service_url: server.uri(),
        management_token: None,
        request_timeout: Duration::from_secs(5),
    };
    let harness = Harness::connect(&remote, HarnessConfig::default()).unwrap();

    let report = harness.reset_environment().await.unwrap();
    assert!(report.is_noop());

    let cancel = harness.cancel_running_lab_requests().await.unwrap();
    assert_eq!(cancel.runs, 1);
    assert_eq!(cancel.cancel_failures, 1);
    assert_eq!(cancel.released, 1);
}

#[tokio::test]
async fn scenario_rejects_unmapped_device_type_from_creation() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/devices/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/instruments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 7,
            "instrumentSerialNumber": "SN00007",
            "instrumentType": "mystery-box"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RemoteConfig {
        device_service_url: server.uri(),
        management_service_url: server.uri(),
        management_token: None,
        request_timeout: Duration::from_secs(5),
    };
    let harness = Harness::connect(&remote, HarnessConfig::default()).unwrap();

    let err = harness
        .ensure_instrument_of_type(InstrumentType::UrineAnalyzer)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarnessError::Identity(IdentityError::UnmappedDeviceType(ref name)) if name == "mystery-box"
    ));
}
