mod attestation;
mod biometrics;
mod config;
mod error;
mod input;
mod surface;

pub use attestation::{round_biometrics, CertificateId, SessionContext, SignatureAttestation};
pub use biometrics::{
    AveragingRule, BiometricAggregator, BiometricSummary, EstimationMethod, KinematicEstimator,
    SampleEstimate, SampleEstimator, SimulatedEstimator,
};
pub use config::{PadConfig, StrokeStyle, MIN_SCALE};
pub use error::Error;
pub use input::{
    map_to_local, BoundingRect, InputEvent, Point, PointerEvent, PointerPhase, RawPointer,
    StrokeSample,
};
pub use surface::{LogicalSize, Surface};

use chrono::{DateTime, Utc};

/// Receives the attestation once the signer confirms.
pub type CompletionHandler = Box<dyn FnOnce(SignatureAttestation)>;

/// Messages for the host to show the signer. None of them block confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Confirmed without drawing anything.
    BlankSignature,
    SignatureCaptured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadState {
    Idle,
    Drawing,
}

/// What the host shows next to the pad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadStatus {
    pub signer_name: String,
    pub state: PadState,
    pub has_content: bool,
    pub stroke_count: u32,
    /// Content was drawn and at least one sample arrived after the stroke start.
    pub biometrics_captured: bool,
}

/// A single signing session bound to one drawing surface.
///
/// Input handling, rendering and aggregation all happen synchronously inside the
/// call that delivered the event. The completion handler is invoked at most once.
pub struct SignaturePad {
    config: PadConfig,
    signer_name: String,
    session: SessionContext,
    surface: Surface,
    aggregator: BiometricAggregator,
    /// Last point of the open stroke, `None` while idle.
    open_stroke: Option<Point>,
    stroke_count: u32,
    on_complete: Option<CompletionHandler>,
}

impl SignaturePad {
    pub fn new<F>(
        config: PadConfig,
        signer_name: impl Into<String>,
        session: SessionContext,
        on_complete: F,
    ) -> Result<Self, Error>
    where
        F: FnOnce(SignatureAttestation) + 'static,
    {
        config.validate()?;
        Ok(SignaturePad {
            surface: Surface::new(&config.stroke)?,
            aggregator: BiometricAggregator::new(config.estimator, config.averaging),
            config,
            signer_name: signer_name.into(),
            session,
            open_stroke: None,
            stroke_count: 0,
            on_complete: Some(Box::new(on_complete)),
        })
    }

    /// Replace the per-sample estimator. Any biometrics gathered so far are dropped.
    pub fn with_estimator(mut self, estimator: Box<dyn SampleEstimator>) -> Self {
        self.aggregator = BiometricAggregator::with_estimator(estimator, self.config.averaging);
        self
    }

    /// Allocate the surface for the given display size. Safe to call again.
    pub fn configure(&mut self, size: LogicalSize) -> Result<(), Error> {
        self.surface.configure(size, self.config.effective_scale())
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match event.phase {
            PointerPhase::Up | PointerPhase::Leave => self.end_stroke(),
            PointerPhase::Down | PointerPhase::Move => {
                let (point, pressure) = match map_to_local(&event.pointer, &event.rect) {
                    Some(mapped) => mapped,
                    None => {
                        log::trace!("Ignoring {:?} event without touch points.", event.phase);
                        return;
                    }
                };
                let sample = StrokeSample {
                    point,
                    pressure,
                    timestamp_ms: event.timestamp_ms,
                };
                if event.phase == PointerPhase::Down {
                    self.begin_stroke(sample);
                } else {
                    self.extend_stroke(sample);
                }
            }
        }
    }

    pub fn begin_stroke(&mut self, sample: StrokeSample) {
        self.surface.mark_content();
        self.stroke_count += 1;
        self.aggregator.on_stroke_start(sample);
        self.open_stroke = Some(sample.point);
        log::trace!(
            "Stroke {} started at ({}, {}).",
            self.stroke_count,
            sample.point.x,
            sample.point.y
        );
    }

    /// Draw to `sample` from the last point. Does nothing while idle.
    pub fn extend_stroke(&mut self, sample: StrokeSample) {
        let last = match self.open_stroke {
            Some(last) => last,
            None => return,
        };
        self.surface.draw_segment(last, sample.point);
        self.aggregator.on_sample(sample);
        self.open_stroke = Some(sample.point);
    }

    pub fn end_stroke(&mut self) {
        self.open_stroke = None;
    }

    /// Erase the drawing and start the session over. The only way biometrics are reset.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.aggregator.reset();
        self.open_stroke = None;
        self.stroke_count = 0;
    }

    pub fn state(&self) -> PadState {
        if self.open_stroke.is_some() {
            PadState::Drawing
        } else {
            PadState::Idle
        }
    }

    pub fn can_clear(&self) -> bool {
        self.surface.has_content()
    }

    pub fn status(&self) -> PadStatus {
        let has_content = self.surface.has_content();
        PadStatus {
            signer_name: self.signer_name.clone(),
            state: self.state(),
            has_content,
            stroke_count: self.stroke_count,
            biometrics_captured: has_content && self.aggregator.snapshot().duration > 0,
        }
    }

    pub fn biometrics(&self) -> BiometricSummary {
        self.aggregator.snapshot()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn signer_name(&self) -> &str {
        &self.signer_name
    }

    pub fn confirm(&mut self) -> Result<Vec<Notice>, Error> {
        self.confirm_at(Utc::now())
    }

    /// Build the attestation and hand it to the completion handler.
    ///
    /// A blank signature is reported through `Notice::BlankSignature` but still
    /// confirmed. Serialization failures are returned and nothing is emitted.
    pub fn confirm_at(&mut self, now: DateTime<Utc>) -> Result<Vec<Notice>, Error> {
        if self.on_complete.is_none() {
            return Err(Error::AlreadyCompleted);
        }
        let mut notices = Vec::new();
        if !self.surface.has_content() {
            log::warn!(
                "Signer `{}` confirmed without drawing a signature.",
                self.signer_name
            );
            notices.push(Notice::BlankSignature);
        }

        let png_data = self.surface.encode_png()?;
        let attestation = SignatureAttestation::assemble(
            &self.signer_name,
            &png_data,
            now,
            &self.session,
            self.aggregator.snapshot(),
            CertificateId::generate(now),
        );
        log::info!(
            "Captured signature for `{}` with certificate `{}`.",
            self.signer_name,
            attestation.certificate_id()
        );

        if let Some(on_complete) = self.on_complete.take() {
            on_complete(attestation);
        }
        notices.push(Notice::SignatureCaptured);
        Ok(notices)
    }
}

impl std::fmt::Debug for SignaturePad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignaturePad")
            .field("signer_name", &self.signer_name)
            .field("state", &self.state())
            .field("stroke_count", &self.stroke_count)
            .field("aggregator", &self.aggregator)
            .field("completed", &self.on_complete.is_none())
            .finish()
    }
}
