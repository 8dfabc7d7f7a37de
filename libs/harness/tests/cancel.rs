mod support;

use labsync_harness::CancelReport;
use labsync_model::{InstrumentStatus, InstrumentType};
use labsync_testing::FakeLab;
use support::harness;

#[tokio::test]
async fn no_running_requests_makes_no_calls() {
    let lab = FakeLab::new();

    let report = harness(&lab).cancel_running_lab_requests().await.unwrap();

    assert_eq!(report, CancelReport::default());
    assert!(lab.calls().cancels.is_empty());
    assert!(lab.calls().stop_waiting.is_empty());
}

#[tokio::test]
async fn every_run_is_cancelled_and_released() {
    let lab = FakeLab::new();
    let chem = lab.seed_instrument(InstrumentType::ChemistryAnalyzer, InstrumentStatus::Busy);
    let urine = lab.seed_instrument(InstrumentType::UrineAnalyzer, InstrumentStatus::Busy);
    let chem_id = lab.instrument_id_of(chem.id).unwrap();
    let urine_id = lab.instrument_id_of(urine.id).unwrap();
    lab.seed_lab_request(&[chem_id, urine_id]);
    lab.seed_lab_request(&[urine_id]);

    let report = harness(&lab).cancel_running_lab_requests().await.unwrap();

    assert_eq!(report.runs, 3);
    assert_eq!(report.cancelled, 3);
    assert_eq!(report.released, 3);
    assert!(lab.running_runs().is_empty());

    let mut released = lab.calls().stop_waiting;
    released.sort();
    let mut expected = vec![chem_id, urine_id, urine_id];
    expected.sort();
    assert_eq!(released, expected);
}

#[tokio::test]
async fn failed_cancel_still_releases_the_instrument_once() {
    let lab = FakeLab::new();
    let device = lab.seed_instrument(InstrumentType::HematologyAnalyzer, InstrumentStatus::Busy);
    let instrument_id = lab.instrument_id_of(device.id).unwrap();
    let request = lab.seed_lab_request(&[instrument_id]);
    let run_id = request.instrument_runs[0].id;
    lab.fail_cancel(run_id);

    let report = harness(&lab).cancel_running_lab_requests().await.unwrap();

    assert_eq!(report.cancel_failures, 1);
    assert_eq!(report.released, 1);
    assert_eq!(lab.calls().cancels, vec![run_id]);
    assert_eq!(lab.calls().stop_waiting, vec![instrument_id]);
    assert_eq!(lab.running_runs(), vec![run_id]);
}

#[tokio::test]
async fn failed_release_is_reported_not_raised() {
    let lab = FakeLab::new();
    let device = lab.seed_instrument(InstrumentType::CoagulationAnalyzer, InstrumentStatus::Busy);
    let instrument_id = lab.instrument_id_of(device.id).unwrap();
    lab.seed_lab_request(&[instrument_id]);
    lab.fail_stop_waiting(instrument_id);

    let report = harness(&lab).cancel_running_lab_requests().await.unwrap();

    assert_eq!(report.cancelled, 1);
    assert_eq!(report.release_failures, 1);
}
