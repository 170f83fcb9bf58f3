use advanced_signature::{
    map_to_local, AveragingRule, BiometricSummary, BoundingRect, CertificateId, EstimationMethod,
    InputEvent, LogicalSize, Notice, PadConfig, Point, PointerEvent, PointerPhase, RawPointer,
    SampleEstimate, SampleEstimator, SessionContext, SignatureAttestation, SignaturePad,
    SimulatedEstimator, StrokeSample,
};
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

type Received = Rc<RefCell<Vec<SignatureAttestation>>>;

fn mount(config: PadConfig) -> (SignaturePad, Received) {
    let received: Received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    let mut pad = SignaturePad::new(
        config,
        "Jane Doe",
        SessionContext::new("198.51.100.23", "Mozilla/5.0 (integration)"),
        move |attestation| sink.borrow_mut().push(attestation),
    )
    .unwrap();
    pad.configure(LogicalSize {
        width: 400,
        height: 192,
    })
    .unwrap();
    (pad, received)
}

fn sample(x: f64, y: f64, timestamp_ms: u64) -> StrokeSample {
    StrokeSample {
        point: Point::new(x, y),
        pressure: None,
        timestamp_ms,
    }
}

fn confirmed_at() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_767_225_600_000).unwrap()
}

/// Decoded RGBA pixels of an attestation image.
fn pixels(attestation: &SignatureAttestation) -> Vec<u8> {
    let png_data = attestation.image_png().unwrap();
    let decoder = png::Decoder::new(&*png_data);
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();
    buf.truncate(info.buffer_size());
    buf
}

fn is_blank(attestation: &SignatureAttestation) -> bool {
    pixels(attestation).chunks_exact(4).all(|pixel| pixel[3] == 0)
}

#[test]
fn end_to_end_single_stroke() {
    let (mut pad, received) = mount(PadConfig::default());
    let rect = BoundingRect {
        left: 20.0,
        top: 300.0,
        width: 400.0,
        height: 192.0,
    };
    let points = [(10.0, 10.0), (20.0, 20.0), (30.0, 30.0), (40.0, 40.0), (50.0, 50.0)];
    for (index, (x, y)) in points.iter().enumerate() {
        pad.handle_event(&InputEvent {
            phase: if index == 0 {
                PointerPhase::Down
            } else {
                PointerPhase::Move
            },
            pointer: PointerEvent::Mouse(RawPointer::at(x + rect.left, y + rect.top)),
            rect,
            timestamp_ms: 5_000 + index as u64 * 75,
        });
    }
    pad.handle_event(&InputEvent {
        phase: PointerPhase::Up,
        pointer: PointerEvent::Mouse(RawPointer::at(70.0, 350.0)),
        rect,
        timestamp_ms: 5_310,
    });

    let notices = pad.confirm_at(confirmed_at()).unwrap();
    assert_eq!(notices, vec![Notice::SignatureCaptured]);

    let received = received.borrow();
    assert_eq!(received.len(), 1);
    let attestation = &received[0];
    assert!(!is_blank(attestation));
    assert_eq!(attestation.biometrics().duration, 300);
    assert_eq!(attestation.signer_name(), "Jane Doe");
    assert_eq!(attestation.timestamp(), "2026-01-01T00:00:00.000Z");
    assert_eq!(attestation.source_address(), "198.51.100.23");
    assert_eq!(attestation.device_descriptor(), "Mozilla/5.0 (integration)");
    assert!(attestation
        .certificate_id()
        .as_str()
        .starts_with("CERT-1767225600000-"));
    assert!(CertificateId::parse(attestation.certificate_id().as_str()).is_ok());
    assert!(attestation.verify_image_digest().unwrap());

    // Each step covers ~14.14 px in 75 ms, about 188.6 px/s.
    let speed = attestation.biometrics().speed;
    assert!(speed > 170.0 && speed < 189.0, "speed {}", speed);
    assert_eq!(speed, speed.round());
}

#[test]
fn blank_confirmation_still_emits() {
    let (mut pad, received) = mount(PadConfig::default());
    let notices = pad.confirm_at(confirmed_at()).unwrap();
    assert_eq!(
        notices,
        vec![Notice::BlankSignature, Notice::SignatureCaptured]
    );

    let received = received.borrow();
    assert_eq!(received.len(), 1);
    let attestation = &received[0];
    assert!(is_blank(attestation));
    assert_eq!(
        *attestation.biometrics(),
        BiometricSummary::zeroed(EstimationMethod::Kinematic)
    );
    assert!(CertificateId::parse(attestation.certificate_id().as_str()).is_ok());
}

#[test]
fn duration_tracks_last_sample_since_first_stroke() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..20 {
        let (mut pad, _) = mount(PadConfig::default());
        let mut now: u64 = rng.gen_range(0..10_000);
        let session_start = now;
        let mut last_duration = 0;
        for _ in 0..rng.gen_range(1..4) {
            pad.begin_stroke(sample(rng.gen_range(0.0..400.0), rng.gen_range(0.0..192.0), now));
            for _ in 0..rng.gen_range(1..10) {
                now += rng.gen_range(0..40);
                pad.extend_stroke(sample(
                    rng.gen_range(0.0..400.0),
                    rng.gen_range(0.0..192.0),
                    now,
                ));
                let duration = pad.biometrics().duration;
                assert_eq!(duration, now - session_start);
                assert!(duration >= last_duration);
                last_duration = duration;
            }
            pad.end_stroke();
            now += rng.gen_range(0..500);
        }
    }
}

#[test]
fn clear_resets_from_any_state() {
    for stop_drawing in [false, true] {
        let (pad, _) = mount(PadConfig::default());
        let mut pad = pad.with_estimator(Box::new(SimulatedEstimator::seeded(11)));
        pad.begin_stroke(sample(10.0, 10.0, 0));
        pad.extend_stroke(sample(30.0, 12.0, 20));
        pad.extend_stroke(sample(60.0, 14.0, 45));
        if stop_drawing {
            pad.end_stroke();
        }
        assert!(pad.biometrics().pressure > 0.0);

        pad.clear();
        let status = pad.status();
        assert!(!status.has_content);
        assert_eq!(status.stroke_count, 0);
        assert!(!status.biometrics_captured);
        let biometrics = pad.biometrics();
        assert_eq!(biometrics.speed, 0.0);
        assert_eq!(biometrics.pressure, 0.0);
        assert_eq!(biometrics.duration, 0);
        assert!(pad.surface().is_blank());
    }
}

#[test]
fn new_session_after_clear_restarts_duration() {
    let (mut pad, _) = mount(PadConfig::default());
    pad.begin_stroke(sample(10.0, 10.0, 100));
    pad.extend_stroke(sample(20.0, 10.0, 200));
    pad.clear();
    pad.begin_stroke(sample(10.0, 10.0, 1_000));
    pad.extend_stroke(sample(20.0, 10.0, 1_030));
    assert_eq!(pad.biometrics().duration, 30);
}

/// Fixed speeds, in order.
struct Scripted(Vec<f64>);

impl SampleEstimator for Scripted {
    fn method(&self) -> EstimationMethod {
        EstimationMethod::Kinematic
    }

    fn estimate(&mut self, _: Option<&StrokeSample>, _: &StrokeSample) -> SampleEstimate {
        SampleEstimate {
            speed: Some(self.0.remove(0)),
            pressure: Some(0.9),
        }
    }
}

#[test]
fn pairwise_update_rule() {
    let (pad, _) = mount(PadConfig::default());
    let mut pad = pad.with_estimator(Box::new(Scripted(vec![120.0, 80.0])));
    pad.begin_stroke(sample(0.0, 0.0, 0));
    pad.extend_stroke(sample(1.0, 0.0, 10));
    pad.extend_stroke(sample(2.0, 0.0, 20));
    assert_eq!(pad.biometrics().speed, ((0.0 + 120.0) / 2.0 + 80.0) / 2.0);
    assert_ne!(pad.biometrics().speed, (120.0 + 80.0) / 2.0);
    assert_eq!(pad.biometrics().pressure, ((0.0 + 0.9) / 2.0 + 0.9) / 2.0);
}

#[test]
fn running_mean_update_rule() {
    let config = PadConfig {
        averaging: AveragingRule::RunningMean,
        ..PadConfig::default()
    };
    let (pad, _) = mount(config);
    let mut pad = pad.with_estimator(Box::new(Scripted(vec![120.0, 80.0])));
    pad.begin_stroke(sample(0.0, 0.0, 0));
    pad.extend_stroke(sample(1.0, 0.0, 10));
    pad.extend_stroke(sample(2.0, 0.0, 20));
    assert_eq!(pad.biometrics().speed, 100.0);
}

#[test]
fn touch_maps_to_local_coordinates() {
    let rect = BoundingRect {
        left: 12.5,
        top: 640.0,
        width: 320.0,
        height: 192.0,
    };
    let (point, _) =
        map_to_local(&PointerEvent::Touch(vec![RawPointer::at(100.0, 700.0)]), &rect).unwrap();
    assert_eq!(point, Point::new(87.5, 60.0));
}

#[test]
fn certificate_ids_differ_within_a_millisecond() {
    let mut ids = Vec::new();
    for _ in 0..50 {
        let (mut pad, received) = mount(PadConfig::default());
        pad.confirm_at(confirmed_at()).unwrap();
        let id = received.borrow()[0].certificate_id().clone();
        assert!(CertificateId::parse(id.as_str()).is_ok());
        ids.push(id);
    }
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), 50);
}

#[test]
fn simulated_config_reproduces_reference_ranges() {
    let config = PadConfig::from_json(r#"{ "estimator": "simulated" }"#).unwrap();
    let (mut pad, received) = mount(config);
    pad.begin_stroke(sample(10.0, 10.0, 0));
    for step in 1..30u64 {
        pad.extend_stroke(sample(10.0 + step as f64, 10.0, step * 16));
    }
    pad.confirm_at(confirmed_at()).unwrap();
    let received = received.borrow();
    let biometrics = received[0].biometrics();
    assert_eq!(biometrics.method, EstimationMethod::Simulated);
    assert!(biometrics.speed >= 49.0 && biometrics.speed <= 150.0);
    assert!(biometrics.pressure >= 0.49 && biometrics.pressure <= 1.0);
    assert_eq!(biometrics.pressure, (biometrics.pressure * 100.0).round() / 100.0);
}

#[test]
fn attestation_json_round_trip() {
    let (mut pad, received) = mount(PadConfig::default());
    pad.begin_stroke(sample(10.0, 10.0, 0));
    pad.extend_stroke(sample(60.0, 30.0, 120));
    pad.confirm_at(confirmed_at()).unwrap();
    let received = received.borrow();
    let json = received[0].to_json().unwrap();
    let parsed = SignatureAttestation::from_json(&json).unwrap();
    assert_eq!(parsed, received[0]);
    assert!(parsed.verify_image_digest().unwrap());
}
