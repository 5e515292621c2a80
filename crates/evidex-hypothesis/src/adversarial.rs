// crates/evidex-hypothesis/src/adversarial.rs
// ============================================================================
// Module: Adversarial Hypothesis Testing
// Description: Steel-man the strongest counter-argument against a hypothesis.
// Purpose: Populate Hypothesis::adversarial_result for the pipeline's
//          adversarial_evaluate stage.
// Dependencies: evidex-core
// ============================================================================

//! ## Overview
//! [`adversarially_test`] looks at the contradicting assertions already
//! attached to a hypothesis and steel-mans the single strongest one (the
//! contradicting assertion with the highest fusion-derived confidence). The
//! hypothesis survives when its own confidence is still at or above that
//! counter-argument's confidence; otherwise no rebuttal is offered and the
//! hypothesis is recorded as not having survived. A hypothesis with no
//! contradicting assertions trivially survives against the empty-string
//! counter — there is nothing to steel-man.

use evidex_core::core::AdversarialResult;
use evidex_core::core::Assertion;
use evidex_core::core::Hypothesis;

/// Adversarially tests `hypothesis` against `case_assertions`, returning
/// the [`AdversarialResult`] to attach to it.
///
/// `case_assertions` is the full case assertion pool; only the ones cited
/// in `hypothesis.contradicting_assertion_uids` are considered as
/// candidate counter-arguments.
#[must_use]
pub fn adversarially_test(hypothesis: &Hypothesis, case_assertions: &[Assertion]) -> AdversarialResult {
    let strongest = hypothesis
        .contradicting_assertion_uids
        .iter()
        .filter_map(|uid| case_assertions.iter().find(|assertion| assertion.uid == *uid))
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

    let Some(counter) = strongest else {
        return AdversarialResult { survived: true, strongest_counter: String::new(), rebuttal: None };
    };

    let counter_text = assertion_summary(counter);
    if hypothesis.confidence >= counter.confidence {
        AdversarialResult {
            survived: true,
            strongest_counter: counter_text,
            rebuttal: Some(format!(
                "hypothesis confidence {:.2} holds against the strongest counter-evidence (confidence {:.2})",
                hypothesis.confidence, counter.confidence
            )),
        }
    } else {
        AdversarialResult { survived: false, strongest_counter: counter_text, rebuttal: None }
    }
}

fn assertion_summary(assertion: &Assertion) -> String {
    use evidex_core::core::assertion::AssertionValue;
    match &assertion.value {
        AssertionValue::Factual { subject, predicate, object } => match object {
            Some(object) => format!("{subject} {predicate} {object}"),
            None => format!("{subject} {predicate}"),
        },
        AssertionValue::Relational { source_entity, relation, target_entity } => {
            format!("{source_entity} {relation} {target_entity}")
        }
        AssertionValue::Temporal { description, .. } => description.clone(),
    }
}
