use super::*;
use crate::scoring::{RankedMatch, ScoreOutcome};

fn outcome(aggregate: f32, best: (&str, f32)) -> ScoreOutcome {
    ScoreOutcome {
        aggregate,
        top_k: 1,
        ranked: vec![RankedMatch {
            identifier: best.0.into(),
            similarity: best.1,
        }],
    }
}

mod calibration_tests {
    use super::*;

    #[test]
    fn test_default_knots_hit_exactly() {
        let calibration = Calibration::default();
        for &(raw, confidence) in DEFAULT_KNOTS {
            assert!((calibration.calibrate(raw) - confidence).abs() < 1e-3);
        }
    }

    #[test]
    fn test_interpolates_between_knots() {
        let calibration = Calibration::default();
        assert!((calibration.calibrate(0.20) - 12.5).abs() < 1e-3);
        assert!((calibration.calibrate(0.75) - 82.5).abs() < 1e-3);
        assert!((calibration.calibrate(0.90) - 95.0).abs() < 1e-3);
    }

    #[test]
    fn test_clamps_outside_range() {
        let calibration = Calibration::default();
        assert_eq!(calibration.calibrate(-0.5), 0.0);
        assert_eq!(calibration.calibrate(-1.0), 0.0);
        assert_eq!(calibration.calibrate(1.5), 100.0);
        assert_eq!(calibration.calibrate(f32::NAN), 0.0);
    }

    #[test]
    fn test_is_non_decreasing() {
        let calibration = Calibration::default();
        let mut previous = calibration.calibrate(-1.0);
        for step in 0..=2_000 {
            let raw = -1.0 + step as f32 / 1_000.0;
            let current = calibration.calibrate(raw);
            assert!(
                current >= previous,
                "calibrate({raw}) = {current} < {previous}"
            );
            assert!((0.0..=100.0).contains(&current));
            previous = current;
        }
    }

    #[test]
    fn test_rejects_too_few_knots() {
        assert!(matches!(
            Calibration::new(vec![(0.0, 0.0)]),
            Err(DecisionError::InvalidCalibration { .. })
        ));
    }

    #[test]
    fn test_rejects_non_increasing_raw() {
        let err = Calibration::new(vec![(0.0, 0.0), (0.5, 50.0), (0.5, 60.0)]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_rejects_decreasing_confidence() {
        let err = Calibration::new(vec![(0.0, 10.0), (1.0, 5.0)]).unwrap_err();
        assert!(err.to_string().contains("non-decreasing"));
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        assert!(Calibration::new(vec![(0.0, 0.0), (1.0, 120.0)]).is_err());
        assert!(Calibration::new(vec![(0.0, f32::NAN), (1.0, 100.0)]).is_err());
    }

    #[test]
    fn test_custom_knots() {
        let calibration = Calibration::new(vec![(0.5, 0.0), (0.9, 100.0)]).unwrap();
        assert_eq!(calibration.knots().len(), 2);
        assert_eq!(calibration.calibrate(0.3), 0.0);
        assert!((calibration.calibrate(0.7) - 50.0).abs() < 1e-3);
    }
}

mod confidence_tests {
    use super::*;

    #[test]
    fn test_rounds_to_one_decimal() {
        assert_eq!(Confidence::new(79.96).value(), 80.0);
        assert_eq!(Confidence::new(79.94).value(), 79.9);
        assert_eq!(Confidence::new(42.0).to_string(), "42.0%");
    }

    #[test]
    fn test_clamps() {
        assert_eq!(Confidence::new(-3.0), Confidence::ZERO);
        assert_eq!(Confidence::new(250.0), Confidence::MAX);
        assert_eq!(Confidence::new(f32::NAN), Confidence::ZERO);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Confidence::new(94.3)).unwrap();
        assert_eq!(json, "94.3");
    }
}

mod policy_tests {
    use super::*;

    #[test]
    fn test_high_similarity_is_verified() {
        let result = DecisionPolicy::default().decide(&outcome(0.95, ("mural.jpg", 0.97)));

        assert!(result.is_verified);
        assert_eq!(result.verdict, Verdict::Verified);
        assert!(result.confidence.value() >= 80.0);
        assert_eq!(result.best_match.as_deref(), Some("mural.jpg"));
        assert_eq!(result.raw_similarity, Some(0.97));
        assert_eq!(result.avg_top_k_similarity, Some(0.95));
        assert!(result.message.starts_with("Verified!"));
    }

    #[test]
    fn test_threshold_applies_to_rounded_confidence() {
        // 0.7666 calibrates to 84.999, which rounds to 85.0
        let policy = DecisionPolicy::new(Calibration::default(), 85.0, "the artist").unwrap();
        let result = policy.decide(&outcome(0.76666, ("a.png", 0.8)));
        assert_eq!(result.confidence.value(), 85.0);
        assert!(result.is_verified);
    }

    #[test]
    fn test_possible_match_below_threshold() {
        let result = DecisionPolicy::default().decide(&outcome(0.65, ("a.png", 0.7)));

        assert!(!result.is_verified);
        assert_eq!(result.verdict, Verdict::Possible);
        assert!(result.message.starts_with("Possible match"));
    }

    #[test]
    fn test_rejection_keeps_best_match() {
        let result = DecisionPolicy::default().decide(&outcome(0.1, ("closest.webp", 0.12)));

        assert!(!result.is_verified);
        assert_eq!(result.verdict, Verdict::NotRecognized);
        assert!(result.confidence.value() < 40.0);
        assert_eq!(result.best_match.as_deref(), Some("closest.webp"));
    }

    #[test]
    fn test_negative_similarity_is_zero_confidence() {
        let result = DecisionPolicy::default().decide(&outcome(-0.3, ("a.png", -0.2)));
        assert_eq!(result.confidence, Confidence::ZERO);
        assert!(!result.is_verified);
    }

    #[test]
    fn test_messages_name_artist() {
        let policy = DecisionPolicy::new(Calibration::default(), 80.0, "Anna Laurini").unwrap();
        let verified = policy.decide(&outcome(0.9, ("a.png", 0.9)));
        let rejected = policy.decide(&outcome(0.1, ("a.png", 0.1)));

        assert_eq!(
            verified.message,
            "Verified! This looks like Anna Laurini's artwork."
        );
        assert_eq!(rejected.message, "Not recognized as Anna Laurini's artwork.");
        assert_eq!(policy.artist_name(), "Anna Laurini");
    }

    #[test]
    fn test_rejects_invalid_threshold() {
        assert!(matches!(
            DecisionPolicy::new(Calibration::default(), 101.0, "x"),
            Err(DecisionError::InvalidThreshold { .. })
        ));
        assert!(DecisionPolicy::new(Calibration::default(), f32::NAN, "x").is_err());
    }

    #[test]
    fn test_zero_threshold_verifies_everything() {
        let policy = DecisionPolicy::new(Calibration::default(), 0.0, "x").unwrap();
        assert!(policy.decide(&outcome(-1.0, ("a.png", -1.0))).is_verified);
    }

    #[test]
    fn test_result_serializes() {
        let result = DecisionPolicy::default().decide(&outcome(0.9, ("a.png", 0.9)));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["is_verified"], true);
        assert_eq!(json["verdict"], "verified");
        assert_eq!(json["best_match"], "a.png");
        assert!(json["confidence"].as_f64().unwrap() >= 80.0);
    }

    #[test]
    fn test_unavailable_result() {
        let result = VerificationResult::unavailable("try again later");
        assert!(!result.is_verified);
        assert_eq!(result.verdict, Verdict::Unavailable);
        assert_eq!(result.best_match, None);
        assert_eq!(result.confidence, Confidence::ZERO);
    }
}
