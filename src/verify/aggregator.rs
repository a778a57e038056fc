//! Pure decision function combining hash, signature, and AI signals.

use crate::ai::AiAssessment;

/// The signals gathered for one verification attempt.
///
/// `signature_match` is `None` when the proof's method does not include a
/// signature check; `ai` is `None` when AI analysis is not configured or
/// its assessment was unavailable (timeout, error) — absence is neither a
/// veto nor a pass.
#[derive(Debug, Clone, Default)]
pub struct TamperSignals {
    pub hash_match: bool,
    pub signature_match: Option<bool>,
    pub ai: Option<AiAssessment>,
}

/// Overall verdict for a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub valid: bool,
    pub confidence: f64,
}

/// Combine the signals into an overall verdict.
///
/// Checks are conjunctive: the hash must match, a configured signature
/// check must pass, and a returned AI assessment must not flag tampering.
/// Confidence is the AI confidence score when an assessment is present,
/// otherwise 1.0 when the applicable checks passed and 0.0 when not.
pub fn aggregate(signals: &TamperSignals) -> Verdict {
    let ai_veto = signals
        .ai
        .as_ref()
        .map(|a| a.tamper_detected)
        .unwrap_or(false);

    let valid = signals.hash_match && signals.signature_match.unwrap_or(true) && !ai_veto;

    let confidence = match &signals.ai {
        Some(assessment) => assessment.confidence.clamp(0.0, 1.0),
        None => {
            if valid {
                1.0
            } else {
                0.0
            }
        }
    };

    Verdict { valid, confidence }
}
