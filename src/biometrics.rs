//! Behavioral signal derived from stroke dynamics.
//!
//! The values produced here are a best-effort heuristic, not a verified biometric.
//! Samples are folded into running statistics and never retained.

use crate::input::StrokeSample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// How per-sample speed and pressure are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EstimationMethod {
    /// Speed from consecutive-point distance over time, pressure only from device data.
    #[default]
    Kinematic,
    /// Bounded random stand-ins: speed in `[50, 150)`, pressure in `[0.5, 1.0)`.
    Simulated,
}

impl EstimationMethod {
    pub fn estimator(self) -> Box<dyn SampleEstimator> {
        match self {
            EstimationMethod::Kinematic => Box::new(KinematicEstimator),
            EstimationMethod::Simulated => Box::new(SimulatedEstimator::new()),
        }
    }
}

/// How a new sample is folded into the running value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AveragingRule {
    /// `new = (prev + sample) / 2`. Biased toward recent samples.
    #[default]
    Pairwise,
    /// True arithmetic mean of all samples seen so far.
    RunningMean,
}

impl AveragingRule {
    /// `count` is the number of samples including the new one.
    fn fold(self, prev: f64, sample: f64, count: u64) -> f64 {
        match self {
            AveragingRule::Pairwise => (prev + sample) / 2.0,
            AveragingRule::RunningMean => prev + (sample - prev) / count.max(1) as f64,
        }
    }
}

/// Estimates for a single sample. `None` leaves the running value untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleEstimate {
    pub speed: Option<f64>,
    pub pressure: Option<f64>,
}

pub trait SampleEstimator {
    fn method(&self) -> EstimationMethod;

    /// `previous` is the last sample of the current stroke, including its start point.
    fn estimate(
        &mut self,
        previous: Option<&StrokeSample>,
        sample: &StrokeSample,
    ) -> SampleEstimate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicEstimator;

impl SampleEstimator for KinematicEstimator {
    fn method(&self) -> EstimationMethod {
        EstimationMethod::Kinematic
    }

    fn estimate(
        &mut self,
        previous: Option<&StrokeSample>,
        sample: &StrokeSample,
    ) -> SampleEstimate {
        // Logical pixels per second. Coalesced events with no time delta carry no speed.
        let speed = previous.and_then(|previous| {
            let elapsed_ms = sample.timestamp_ms.checked_sub(previous.timestamp_ms)?;
            if elapsed_ms == 0 {
                return None;
            }
            Some(previous.point.distance_to(&sample.point) * 1000.0 / elapsed_ms as f64)
        });
        SampleEstimate {
            speed,
            pressure: sample.pressure.map(|pressure| pressure.clamp(0.0, 1.0)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedEstimator {
    rng: StdRng,
}

impl SimulatedEstimator {
    pub fn new() -> Self {
        SimulatedEstimator {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        SimulatedEstimator {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SimulatedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleEstimator for SimulatedEstimator {
    fn method(&self) -> EstimationMethod {
        EstimationMethod::Simulated
    }

    fn estimate(
        &mut self,
        _previous: Option<&StrokeSample>,
        _sample: &StrokeSample,
    ) -> SampleEstimate {
        SampleEstimate {
            speed: Some(self.rng.gen_range(50.0..150.0)),
            pressure: Some(self.rng.gen_range(0.5..1.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricSummary {
    pub speed: f64,
    pub pressure: f64,
    /// Milliseconds from the first stroke start to the most recent sample.
    pub duration: u64,
    #[serde(default)]
    pub method: EstimationMethod,
}

impl BiometricSummary {
    pub fn zeroed(method: EstimationMethod) -> Self {
        BiometricSummary {
            speed: 0.0,
            pressure: 0.0,
            duration: 0,
            method,
        }
    }
}

pub struct BiometricAggregator {
    estimator: Box<dyn SampleEstimator>,
    rule: AveragingRule,
    summary: BiometricSummary,
    /// Set once at the first stroke start, read-only until `reset`.
    session_start_ms: Option<u64>,
    previous: Option<StrokeSample>,
    speed_samples: u64,
    pressure_samples: u64,
}

impl BiometricAggregator {
    pub fn new(method: EstimationMethod, rule: AveragingRule) -> Self {
        Self::with_estimator(method.estimator(), rule)
    }

    pub fn with_estimator(estimator: Box<dyn SampleEstimator>, rule: AveragingRule) -> Self {
        let summary = BiometricSummary::zeroed(estimator.method());
        BiometricAggregator {
            estimator,
            rule,
            summary,
            session_start_ms: None,
            previous: None,
            speed_samples: 0,
            pressure_samples: 0,
        }
    }

    pub fn session_start_ms(&self) -> Option<u64> {
        self.session_start_ms
    }

    /// Marks the start of a stroke. The first call of a session fixes the session start.
    pub fn on_stroke_start(&mut self, sample: StrokeSample) {
        if self.session_start_ms.is_none() {
            self.session_start_ms = Some(sample.timestamp_ms);
        }
        self.previous = Some(sample);
    }

    pub fn on_sample(&mut self, sample: StrokeSample) {
        let estimate = self.estimator.estimate(self.previous.as_ref(), &sample);
        if let Some(speed) = estimate.speed {
            self.speed_samples += 1;
            self.summary.speed = self
                .rule
                .fold(self.summary.speed, speed, self.speed_samples);
        }
        if let Some(pressure) = estimate.pressure {
            self.pressure_samples += 1;
            self.summary.pressure =
                self.rule
                    .fold(self.summary.pressure, pressure, self.pressure_samples);
        }
        let session_start = *self.session_start_ms.get_or_insert(sample.timestamp_ms);
        // A late event with an older timestamp never shrinks the duration.
        self.summary.duration = self
            .summary
            .duration
            .max(sample.timestamp_ms.saturating_sub(session_start));
        self.previous = Some(sample);
    }

    pub fn snapshot(&self) -> BiometricSummary {
        self.summary
    }

    pub fn reset(&mut self) {
        self.summary = BiometricSummary::zeroed(self.estimator.method());
        self.session_start_ms = None;
        self.previous = None;
        self.speed_samples = 0;
        self.pressure_samples = 0;
    }
}

impl std::fmt::Debug for BiometricAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiometricAggregator")
            .field("rule", &self.rule)
            .field("summary", &self.summary)
            .field("session_start_ms", &self.session_start_ms)
            .finish()
    }
}
