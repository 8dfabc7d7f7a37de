//! Contract tests for the HTTP clients against a mock server.

use std::time::Duration;

use labsync_id::{DeviceId, InstrumentId, RunId};
use labsync_model::{
    AssayResult, InstrumentStatus, InstrumentType, QcBarcodeRequest, ResultSet,
    StagedResultDocument, StatusScope,
};
use labsync_remote::{
    DeviceService, DeviceServiceClient, ManagementService, ManagementServiceClient, RemoteConfig,
    RemoteError, ServiceKind,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        device_service_url: format!("{}/", server.uri()),
        management_service_url: server.uri(),
        management_token: Some("t0ken".to_string()),
        request_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn create_instrument_posts_device_type_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/instruments"))
        .and(body_json(json!({ "instrumentType": "chem-analyzer" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 17,
            "instrumentSerialNumber": "100",
            "mainUnitSerialNumber": "MU9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeviceServiceClient::new(&config_for(&server)).unwrap();
    let record = client.create_instrument("chem-analyzer").await.unwrap();

    assert_eq!(record.id, DeviceId::new(17));
    assert_eq!(record.main_unit_serial_number.as_deref(), Some("MU9"));
}

#[tokio::test]
async fn list_instruments_of_type_filters_by_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/instruments"))
        .and(query_param("instrumentType", "urine-analyzer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "instrumentSerialNumber": "U3", "instrumentType": "urine-analyzer" }
        ])))
        .mount(&server)
        .await;

    let client = DeviceServiceClient::new(&config_for(&server)).unwrap();
    let records = client.list_instruments_of_type("urine-analyzer").await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].instrument_type.as_deref(), Some("urine-analyzer"));
}

#[tokio::test]
async fn stage_next_result_sends_renamed_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/instruments/4/next-result"))
        .and(body_json(json!({
            "result": [{ "assayName": "HCT", "value": "41" }],
            "sampleType": "WHOLE_BLOOD"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let set = ResultSet {
        sample_type: Some("WHOLE_BLOOD".into()),
        ..ResultSet::new(vec![AssayResult::new("HCT", "41")])
    };
    let doc = StagedResultDocument::from_result_set(&set).unwrap();

    let client = DeviceServiceClient::new(&config_for(&server)).unwrap();
    client.stage_next_result(DeviceId::new(4), &doc).await.unwrap();
}

#[tokio::test]
async fn device_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/instruments/8"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such instrument"))
        .mount(&server)
        .await;

    let client = DeviceServiceClient::new(&config_for(&server)).unwrap();
    let err = client.delete_instrument(DeviceId::new(8)).await.unwrap_err();

    assert!(err.is_not_found());
    match err {
        RemoteError::Api {
            service, message, ..
        } => {
            assert_eq!(service, ServiceKind::Device);
            assert_eq!(message, "no such instrument");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn status_list_passthrough_variant_uses_query_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/devices/status"))
        .and(query_param("includePassthrough", "true"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "instrument": {
                    "id": 2,
                    "instrumentType": "ReferenceLabInterface",
                    "instrumentSerialNumber": "RL2"
                },
                "connected": false,
                "instrumentStatus": "READY"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ManagementServiceClient::new(&config_for(&server)).unwrap();
    let statuses = client
        .list_device_statuses(StatusScope::IncludePassthrough)
        .await
        .unwrap();

    assert_eq!(statuses.len(), 1);
    assert_eq!(
        statuses[0].instrument_type(),
        InstrumentType::ReferenceLabInterface
    );
    assert_eq!(statuses[0].instrument_status, InstrumentStatus::Ready);
    assert!(statuses[0].is_operable());
}

#[tokio::test]
async fn device_actions_hit_their_routes() {
    let server = MockServer::start().await;
    for action in ["approve", "stop-waiting", "suppress"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/devices/12/{action}")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/api/runs/5/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = ManagementServiceClient::new(&config_for(&server)).unwrap();
    let id = InstrumentId::new(12);
    client.approve_device(id).await.unwrap();
    client.stop_waiting(id).await.unwrap();
    client.suppress(id).await.unwrap();
    client.cancel_run(RunId::new(5)).await.unwrap();
}

#[tokio::test]
async fn feature_flag_and_qc_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/feature-flags/new-results-view"))
        .and(body_json(json!({ "enabled": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/qc/barcodes"))
        .and(body_json(json!({
            "instrumentType": "CoagulationAnalyzer",
            "barcodes": ["C-1"]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ManagementServiceClient::new(&config_for(&server)).unwrap();
    client
        .set_feature_flag("new-results-view", true)
        .await
        .unwrap();

    let request =
        QcBarcodeRequest::for_type(InstrumentType::CoagulationAnalyzer, &["C-1".to_string()])
            .unwrap();
    client.save_qc_barcodes(&request).await.unwrap();
}

#[tokio::test]
async fn feature_flag_name_is_sent_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/feature-flags/lab%2Fresults%3Fv%232"))
        .and(body_json(json!({ "enabled": false })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ManagementServiceClient::new(&config_for(&server)).unwrap();
    client
        .set_feature_flag("lab/results?v#2", false)
        .await
        .unwrap();
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/lab-requests/running"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let client = ManagementServiceClient::new(&config_for(&server)).unwrap();
    let err = client.list_running_lab_requests().await.unwrap_err();

    assert!(matches!(
        err,
        RemoteError::Decode {
            service: ServiceKind::Management,
            ..
        }
    ));
}
