//! Pipeline orchestration
//!
//! Wires feature extraction and the five inference stages in dependency order:
//! the per-frame reaction-time array is computed once per request and shared by
//! the pause-frequency, motor-engagement and focus stages; stability depends
//! only on the emotion trace.

use crate::config::{FailurePolicy, PipelineConfig};
use crate::error::ComputeError;
use crate::features::{focus_feature, normalize_reduce, stability_features, ReduceMode};
use crate::fuzzy::{round3, Defuzzified};
use crate::stages::focus::FocusInputs;
use crate::stages::pause_frequency::PauseInputs;
use crate::stages::stability::StabilityInputs;
use crate::stages::{motor_engagement, reaction_time, StageKind, StageSystems};
use crate::types::{
    BehavioralTrace, EmotionOnlyRequest, EmotionStateRequest, EmotionStateScores, EmotionTrace,
    PartialScores, PipelineReport, ScoreError, StabilityFeatures, StabilityScore,
};

/// Convert a `/emotion_state` request JSON into response JSON (stateless, one-shot).
///
/// Any validation failure withholds all three scores.
///
/// # Example
/// ```ignore
/// let response = emotion_state_to_json(request_json)?;
/// ```
pub fn emotion_state_to_json(request_json: &str) -> Result<String, ComputeError> {
    FuzzyPipeline::new()?.process_json(request_json)
}

/// Convert `{"emotion": [...]}` into `{"emotion_stability_score": ...}` (stateless, one-shot)
pub fn emotion_stability_to_json(request_json: &str) -> Result<String, ComputeError> {
    FuzzyPipeline::new()?.stability_json(request_json)
}

/// Behavioral-trace features shared by stages P, M and F within one request
#[derive(Debug, Clone, PartialEq)]
pub struct MotionFeatures {
    /// Stage R output, one value per frame
    pub reaction_times: Vec<f64>,
    /// Min-max reduced mean of `reaction_times`
    pub reaction_time_mean: f64,
    pub speed: f64,
    pub range: f64,
    pub symmetry: f64,
    /// Set when any reaction-time frame fell back
    pub degenerate: bool,
}

/// Stage M output
#[derive(Debug, Clone, PartialEq)]
pub struct MotorEngagement {
    pub score: f64,
    pub frames: Vec<f64>,
    pub degenerate: bool,
}

/// Reusable pipeline holding the five immutable rule bases.
///
/// Build once and share across requests; every method takes `&self`.
#[derive(Debug, Clone)]
pub struct FuzzyPipeline {
    config: PipelineConfig,
    systems: StageSystems,
}

impl FuzzyPipeline {
    /// Pipeline with the default configuration
    pub fn new() -> Result<Self, ComputeError> {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        let systems = StageSystems::build(config.degeneracy_fallback)?;
        Ok(Self { config, systems })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn systems(&self) -> &StageSystems {
        &self.systems
    }

    fn check_frame_cap(&self, trace: &str, frames: usize) -> Result<(), ComputeError> {
        if frames > self.config.max_frames {
            return Err(ComputeError::Validation(format!(
                "{} trace has {} frames, limit is {}",
                trace, frames, self.config.max_frames
            )));
        }
        Ok(())
    }

    fn check_behavioral(&self, trace: &BehavioralTrace) -> Result<(), ComputeError> {
        self.check_frame_cap("behavioral", trace.len())
    }

    fn check_emotion(&self, emotions: &EmotionTrace) -> Result<(), ComputeError> {
        self.check_frame_cap("emotion", emotions.len())
    }

    // ------------------------------------------------------------------
    // Independently callable stages
    // ------------------------------------------------------------------

    /// Stage R over every frame of the trace
    pub fn reaction_time_array(&self, trace: &BehavioralTrace) -> Result<Vec<f64>, ComputeError> {
        Ok(self.motion_features(trace)?.reaction_times)
    }

    /// Stage P, rounded to 3 decimals
    pub fn pause_frequency(&self, trace: &BehavioralTrace) -> Result<f64, ComputeError> {
        let motion = self.motion_features(trace)?;
        Ok(self.pause_from(&motion).rounded())
    }

    /// Stage M, rounded to 3 decimals
    pub fn motor_engagement(&self, trace: &BehavioralTrace) -> Result<f64, ComputeError> {
        let motion = self.motion_features(trace)?;
        Ok(self.motor_from(&motion, trace)?.score)
    }

    /// Stage F, rounded to 3 decimals
    pub fn focus_score(
        &self,
        emotions: &EmotionTrace,
        trace: &BehavioralTrace,
    ) -> Result<f64, ComputeError> {
        self.check_emotion(emotions)?;
        let focus = focus_feature(emotions.frames())?;
        let motion = self.motion_features(trace)?;
        let pause = self.pause_from(&motion).rounded();
        Ok(self.focus_from(focus, pause, &motion).rounded())
    }

    /// Stage S, rounded to 3 decimals
    pub fn emotion_stability(&self, emotions: &EmotionTrace) -> Result<f64, ComputeError> {
        self.check_emotion(emotions)?;
        let features = stability_features(emotions.frames())?;
        Ok(self.stability_from(features).rounded())
    }

    // ------------------------------------------------------------------
    // Stage wiring
    // ------------------------------------------------------------------

    /// Run stage R once and reduce everything stages P, M and F read from the trace
    pub fn motion_features(&self, trace: &BehavioralTrace) -> Result<MotionFeatures, ComputeError> {
        self.check_behavioral(trace)?;

        let frames = reaction_time::evaluate_frames(&self.systems.reaction_time, trace);
        let degenerate = frames.iter().any(|f| f.degenerate);
        let reaction_times: Vec<f64> = frames.iter().map(|f| f.value).collect();

        let motion = MotionFeatures {
            reaction_time_mean: normalize_reduce(&reaction_times, ReduceMode::Mean)?,
            speed: normalize_reduce(trace.speed(), ReduceMode::Mean)?,
            range: normalize_reduce(trace.range(), ReduceMode::Mean)?,
            symmetry: normalize_reduce(trace.symmetry(), ReduceMode::Mean)?,
            reaction_times,
            degenerate,
        };
        log::debug!(
            "reaction_time: {} frames, reduced mean {:.3}",
            motion.reaction_times.len(),
            motion.reaction_time_mean
        );
        Ok(motion)
    }

    fn pause_from(&self, motion: &MotionFeatures) -> Defuzzified {
        let result = self.systems.pause_frequency.infer(&PauseInputs {
            reaction_time_mean: motion.reaction_time_mean,
            speed: motion.speed,
            range: motion.range,
            symmetry: motion.symmetry,
        });
        log::debug!("pause_frequency: {:.3}", result.value);
        result
    }

    fn motor_from(
        &self,
        motion: &MotionFeatures,
        trace: &BehavioralTrace,
    ) -> Result<MotorEngagement, ComputeError> {
        let frames = motor_engagement::evaluate_frames(
            &self.systems.motor_engagement,
            &motion.reaction_times,
            trace.speed(),
            trace.range(),
        );
        let degenerate = frames.iter().any(|f| f.degenerate);
        let frames: Vec<f64> = frames.iter().map(|f| f.value).collect();
        let score = round3(normalize_reduce(&frames, ReduceMode::Mean)?);
        log::debug!("motor_engagement: {:.3}", score);
        Ok(MotorEngagement {
            score,
            frames,
            degenerate,
        })
    }

    fn focus_from(&self, focus: f64, pause_frequency: f64, motion: &MotionFeatures) -> Defuzzified {
        let result = self.systems.focus.infer(&FocusInputs {
            focus,
            pause_frequency,
            reaction_time: motion.reaction_time_mean,
        });
        log::debug!("focus_attention: {:.3}", result.value);
        result
    }

    fn stability_from(&self, features: StabilityFeatures) -> Defuzzified {
        let result = self
            .systems
            .stability
            .infer(&StabilityInputs::from(features));
        log::debug!("emotional_stability: {:.3}", result.value);
        result
    }

    // ------------------------------------------------------------------
    // Combined calls
    // ------------------------------------------------------------------

    /// All scores plus intermediates. Both traces are validated before any
    /// inference runs.
    pub fn analyze(
        &self,
        emotions: &EmotionTrace,
        trace: &BehavioralTrace,
    ) -> Result<PipelineReport, ComputeError> {
        self.check_emotion(emotions)?;
        self.check_behavioral(trace)?;
        let focus = focus_feature(emotions.frames())?;
        let stability_features = stability_features(emotions.frames())?;

        let motion = self.motion_features(trace)?;
        let pause = self.pause_from(&motion);
        let pause_frequency = pause.rounded();
        let motor = self.motor_from(&motion, trace)?;
        let focus_result = self.focus_from(focus, pause_frequency, &motion);
        let stability = self.stability_from(stability_features);

        let degenerate_stages = [
            (StageKind::ReactionTime, motion.degenerate),
            (StageKind::PauseFrequency, pause.degenerate),
            (StageKind::MotorEngagement, motor.degenerate),
            (StageKind::FocusAttention, focus_result.degenerate),
            (StageKind::EmotionalStability, stability.degenerate),
        ]
        .into_iter()
        .filter_map(|(stage, degenerate)| degenerate.then_some(stage))
        .collect();

        Ok(PipelineReport {
            scores: EmotionStateScores {
                focus_score: focus_result.rounded(),
                motor_engagement_score: motor.score,
                emotion_stability_score: stability.rounded(),
            },
            reaction_time_mean: motion.reaction_time_mean,
            reaction_times: motion.reaction_times,
            pause_frequency,
            motor_engagement_frames: motor.frames,
            focus_feature: focus,
            stability_features,
            degenerate_stages,
        })
    }

    /// The three externally reported scores
    pub fn score(
        &self,
        emotions: &EmotionTrace,
        trace: &BehavioralTrace,
    ) -> Result<EmotionStateScores, ComputeError> {
        Ok(self.analyze(emotions, trace)?.scores)
    }

    /// Validate a wire request and score it; any failure withholds every score
    pub fn score_request(
        &self,
        request: &EmotionStateRequest,
    ) -> Result<EmotionStateScores, ComputeError> {
        let emotions = request.emotion_trace()?;
        let trace = request.behavioral_trace()?;
        self.score(&emotions, &trace)
    }

    /// Score a wire request, withholding only the scores whose inputs failed
    pub fn score_partial(&self, request: &EmotionStateRequest) -> PartialScores {
        let emotions = request
            .emotion_trace()
            .and_then(|e| self.check_emotion(&e).map(|_| e));
        let trace = request
            .behavioral_trace()
            .and_then(|t| self.check_behavioral(&t).map(|_| t));

        let mut partial = PartialScores {
            focus_score: None,
            motor_engagement_score: None,
            emotion_stability_score: None,
            errors: Vec::new(),
        };

        let mut record = |score: &str, error: &ComputeError| {
            partial.errors.push(ScoreError {
                score: score.to_string(),
                code: error.code().to_string(),
                message: error.to_string(),
            });
        };

        let mut focus_score = None;
        let mut motor_engagement_score = None;
        let mut emotion_stability_score = None;

        match (&emotions, &trace) {
            (Ok(e), Ok(t)) => match self.score(e, t) {
                Ok(scores) => {
                    focus_score = Some(scores.focus_score);
                    motor_engagement_score = Some(scores.motor_engagement_score);
                    emotion_stability_score = Some(scores.emotion_stability_score);
                }
                Err(err) => {
                    for score in ["focus_score", "motor_engagement_score", "emotion_stability_score"] {
                        record(score, &err);
                    }
                }
            },
            (Ok(e), Err(trace_err)) => {
                record("focus_score", trace_err);
                record("motor_engagement_score", trace_err);
                match self.emotion_stability(e) {
                    Ok(score) => emotion_stability_score = Some(score),
                    Err(err) => record("emotion_stability_score", &err),
                }
            }
            (Err(emotion_err), Ok(t)) => {
                record("focus_score", emotion_err);
                record("emotion_stability_score", emotion_err);
                match self.motor_engagement(t) {
                    Ok(score) => motor_engagement_score = Some(score),
                    Err(err) => record("motor_engagement_score", &err),
                }
            }
            (Err(emotion_err), Err(trace_err)) => {
                record("focus_score", emotion_err);
                record("focus_score", trace_err);
                record("motor_engagement_score", trace_err);
                record("emotion_stability_score", emotion_err);
            }
        }

        partial.focus_score = focus_score;
        partial.motor_engagement_score = motor_engagement_score;
        partial.emotion_stability_score = emotion_stability_score;
        partial
    }

    /// Process request JSON according to the configured failure policy
    pub fn process_json(&self, request_json: &str) -> Result<String, ComputeError> {
        let request: EmotionStateRequest = serde_json::from_str(request_json)?;
        match self.config.failure_policy {
            FailurePolicy::FailTogether => {
                let scores = self.score_request(&request)?;
                Ok(serde_json::to_string(&scores)?)
            }
            FailurePolicy::Partial => Ok(serde_json::to_string(&self.score_partial(&request))?),
        }
    }

    /// Process `{"emotion": [...]}` into `{"emotion_stability_score": ...}`
    pub fn stability_json(&self, request_json: &str) -> Result<String, ComputeError> {
        let request: EmotionOnlyRequest = serde_json::from_str(request_json)?;
        let emotions = EmotionTrace::new(request.emotion)?;
        let response = StabilityScore {
            emotion_stability_score: self.emotion_stability(&emotions)?,
        };
        Ok(serde_json::to_string(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_request, SAMPLE_EMOTIONS, SAMPLE_MOTION};
    use pretty_assertions::assert_eq;

    // reference scores for the bundled sample traces
    const GOLDEN_STABILITY: f64 = 0.814;
    const GOLDEN_FOCUS: f64 = 0.375;
    const GOLDEN_MOTOR: f64 = 0.493;
    const GOLDEN_PAUSE: f64 = 0.455;

    // uniform levels (in hundredths) over which per-frame engagement only rises
    const MONOTONE_FROM: u32 = 36;
    const MONOTONE_TO: u32 = 64;

    fn sample_traces() -> (EmotionTrace, BehavioralTrace) {
        let emotions = EmotionTrace::from_frames(SAMPLE_EMOTIONS.to_vec()).unwrap();
        let trace = BehavioralTrace::new(
            SAMPLE_MOTION.to_vec(),
            SAMPLE_MOTION.to_vec(),
            SAMPLE_MOTION.to_vec(),
        )
        .unwrap();
        (emotions, trace)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-3,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_golden_sample_scores() {
        let pipeline = FuzzyPipeline::new().unwrap();
        let (emotions, trace) = sample_traces();
        let scores = pipeline.score(&emotions, &trace).unwrap();

        assert_close(scores.emotion_stability_score, GOLDEN_STABILITY);
        assert_close(scores.focus_score, GOLDEN_FOCUS);
        assert_close(scores.motor_engagement_score, GOLDEN_MOTOR);
    }

    #[test]
    fn test_golden_sample_intermediates() {
        let pipeline = FuzzyPipeline::new().unwrap();
        let (emotions, trace) = sample_traces();
        let report = pipeline.analyze(&emotions, &trace).unwrap();

        assert_eq!(report.reaction_times.len(), 5);
        assert_close(report.pause_frequency, GOLDEN_PAUSE);
        assert!(report.degenerate_stages.is_empty());
        // reaction time falls as the movement gets faster and broader
        assert!(report
            .reaction_times
            .windows(2)
            .all(|w| w[1] <= w[0] + 1e-9));
    }

    #[test]
    fn test_scores_are_reproducible() {
        let pipeline = FuzzyPipeline::new().unwrap();
        let (emotions, trace) = sample_traces();
        let first = pipeline.score(&emotions, &trace).unwrap();
        let second = pipeline.score(&emotions, &trace).unwrap();
        let fresh = FuzzyPipeline::new().unwrap().score(&emotions, &trace).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, fresh);
    }

    #[test]
    fn test_independent_calls_agree_with_combined() {
        let pipeline = FuzzyPipeline::new().unwrap();
        let (emotions, trace) = sample_traces();
        let report = pipeline.analyze(&emotions, &trace).unwrap();

        assert_eq!(
            pipeline.reaction_time_array(&trace).unwrap(),
            report.reaction_times
        );
        assert_eq!(pipeline.pause_frequency(&trace).unwrap(), report.pause_frequency);
        assert_eq!(
            pipeline.motor_engagement(&trace).unwrap(),
            report.scores.motor_engagement_score
        );
        assert_eq!(
            pipeline.focus_score(&emotions, &trace).unwrap(),
            report.scores.focus_score
        );
        assert_eq!(
            pipeline.emotion_stability(&emotions).unwrap(),
            report.scores.emotion_stability_score
        );
    }

    #[test]
    fn test_scores_in_unit_range_with_unnormalized_trace() {
        let pipeline = FuzzyPipeline::new().unwrap();
        let (emotions, _) = sample_traces();
        let trace = BehavioralTrace::new(
            vec![-3.0, 12.0, 0.4, 7.5],
            vec![2.0, 2.0, 2.0, 2.0],
            vec![0.1, -0.2, 5.0, 0.3],
        )
        .unwrap();
        let scores = pipeline.score(&emotions, &trace).unwrap();
        for score in [
            scores.focus_score,
            scores.motor_engagement_score,
            scores.emotion_stability_score,
        ] {
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn test_motor_engagement_rises_with_uniform_speed() {
        // per-frame stage M with speed == range == symmetry, fed by stage R
        let pipeline = FuzzyPipeline::new().unwrap();
        let systems = pipeline.systems();
        let engagement_at = |level: f64| {
            let trace =
                BehavioralTrace::new(vec![level; 2], vec![level; 2], vec![level; 2]).unwrap();
            let motion = pipeline.motion_features(&trace).unwrap();
            motor_engagement::evaluate_frames(
                &systems.motor_engagement,
                &motion.reaction_times,
                trace.speed(),
                trace.range(),
            )[0]
            .value
        };

        let sweep: Vec<f64> = (MONOTONE_FROM..=MONOTONE_TO)
            .map(|step| engagement_at(step as f64 / 100.0))
            .collect();
        for pair in sweep.windows(2) {
            assert!(pair[1] + 1e-9 >= pair[0], "sweep not monotone: {:?}", sweep);
        }
    }

    #[test]
    fn test_fail_together_on_bad_emotion_width() {
        let pipeline = FuzzyPipeline::new().unwrap();
        let mut request = sample_request();
        request.emotion[3].pop();
        let result = pipeline.score_request(&request);
        assert!(matches!(result, Err(ComputeError::Validation(_))));
    }

    #[test]
    fn test_fail_together_on_length_mismatch() {
        let mut request = sample_request();
        request.symmetry.push(0.5);
        let json = serde_json::to_string(&request).unwrap();
        let result = emotion_state_to_json(&json);
        assert!(matches!(result, Err(ComputeError::Validation(_))));
    }

    #[test]
    fn test_frame_cap_enforced() {
        let config = PipelineConfig {
            max_frames: 4,
            ..PipelineConfig::default()
        };
        let pipeline = FuzzyPipeline::with_config(config).unwrap();
        let (emotions, trace) = sample_traces();
        assert!(matches!(
            pipeline.score(&emotions, &trace),
            Err(ComputeError::Validation(_))
        ));
        assert!(matches!(
            pipeline.reaction_time_array(&trace),
            Err(ComputeError::Validation(_))
        ));
    }

    #[test]
    fn test_extreme_spread_trace_rejected() {
        let pipeline = FuzzyPipeline::new().unwrap();
        let (emotions, _) = sample_traces();
        let wide = vec![-1e308, 1e308, 0.5];
        let trace = BehavioralTrace::new(wide.clone(), wide.clone(), wide).unwrap();
        assert!(matches!(
            pipeline.score(&emotions, &trace),
            Err(ComputeError::Validation(_))
        ));
        assert!(matches!(
            pipeline.pause_frequency(&trace),
            Err(ComputeError::Validation(_))
        ));
    }

    #[test]
    fn test_single_frame_emotion_trace_rejected() {
        let pipeline = FuzzyPipeline::new().unwrap();
        let json = r#"{"emotion": [[0.7,0.05,0.05,0.05,0.05,0.05,0.05]]}"#;
        assert!(matches!(
            pipeline.stability_json(json),
            Err(ComputeError::Validation(_))
        ));
    }

    #[test]
    fn test_partial_policy_keeps_valid_scores() {
        let config = PipelineConfig {
            failure_policy: FailurePolicy::Partial,
            ..PipelineConfig::default()
        };
        let pipeline = FuzzyPipeline::with_config(config).unwrap();
        let mut request = sample_request();
        request.ranges.pop();

        let json = pipeline
            .process_json(&serde_json::to_string(&request).unwrap())
            .unwrap();
        let partial: PartialScores = serde_json::from_str(&json).unwrap();

        assert_eq!(partial.focus_score, None);
        assert_eq!(partial.motor_engagement_score, None);
        assert_close(partial.emotion_stability_score.unwrap(), GOLDEN_STABILITY);
        let withheld: Vec<&str> = partial.errors.iter().map(|e| e.score.as_str()).collect();
        assert_eq!(withheld, vec!["focus_score", "motor_engagement_score"]);
        assert!(partial.errors.iter().all(|e| e.code == "VALIDATION_ERROR"));
    }

    #[test]
    fn test_partial_policy_all_valid() {
        let config = PipelineConfig {
            failure_policy: FailurePolicy::Partial,
            ..PipelineConfig::default()
        };
        let pipeline = FuzzyPipeline::with_config(config).unwrap();
        let partial = pipeline.score_partial(&sample_request());
        assert!(partial.errors.is_empty());
        assert_close(partial.motor_engagement_score.unwrap(), GOLDEN_MOTOR);
        assert_close(partial.focus_score.unwrap(), GOLDEN_FOCUS);
    }

    #[test]
    fn test_emotion_state_json_roundtrip() {
        let json = serde_json::to_string(&sample_request()).unwrap();
        let response = emotion_state_to_json(&json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert!(value["focus_score"].is_number());
        assert!(value["motor_engagement_score"].is_number());
        assert!(value["emotion_stability_score"].is_number());
    }

    #[test]
    fn test_stability_json() {
        let request = serde_json::json!({ "emotion": SAMPLE_EMOTIONS });
        let response = emotion_stability_to_json(&request.to_string()).unwrap();
        let score: StabilityScore = serde_json::from_str(&response).unwrap();
        assert_close(score.emotion_stability_score, GOLDEN_STABILITY);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            emotion_state_to_json("not valid json"),
            Err(ComputeError::Json(_))
        ));
    }

    #[test]
    fn test_pipeline_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FuzzyPipeline>();

        let pipeline = FuzzyPipeline::new().unwrap();
        let (emotions, trace) = sample_traces();
        let expected = pipeline.score(&emotions, &trace).unwrap();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| pipeline.score(&emotions, &trace).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
