//! VICC/CGC oncogenicity point scoring.

use oncotier_common::{Evidence, Result, TierError, ViccCriterion};

use crate::result::{ViccClassification, ViccScoring};

/// (predicate on total, class), checked in order; first match wins.
type ClassRule = (fn(i32) -> bool, ViccClassification);

const CLASS_RULES: [ClassRule; 4] = [
    (|t| t >= 7, ViccClassification::Oncogenic),
    (|t| t >= 4, ViccClassification::LikelyOncogenic),
    (|t| t <= -6, ViccClassification::Benign),
    (|t| t <= -2, ViccClassification::LikelyBenign),
];

pub fn classify(total: i32) -> ViccClassification {
    CLASS_RULES
        .iter()
        .find(|(matches, _)| matches(total))
        .map(|(_, class)| *class)
        .unwrap_or(ViccClassification::UncertainSignificance)
}

/// Sum VICC evidence per criterion. Non-VICC evidence is ignored.
pub fn score_vicc(evidence: &[Evidence]) -> Result<ViccScoring> {
    let mut scoring = ViccScoring::default();
    let mut total: i32 = 0;

    for e in evidence {
        let Some(criterion) = e.vicc_criterion() else {
            continue;
        };
        let slot = scoring.criteria.entry(criterion).or_insert(0);
        *slot = slot
            .checked_add(e.score)
            .ok_or_else(|| overflow(criterion))?;
        total = total.checked_add(e.score).ok_or_else(|| overflow(criterion))?;
    }

    scoring.total_score = total;
    scoring.classification = classify(total);
    Ok(scoring)
}

fn overflow(criterion: ViccCriterion) -> TierError {
    TierError::stage("vicc", format!("score overflow while adding {}", criterion.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{ActionabilityContext, EvidenceCode, EvidenceStrength};

    fn ev(c: ViccCriterion, score: i32) -> Evidence {
        Evidence::new(EvidenceCode::vicc(c), "test", "x", score, 0.8).unwrap()
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(7), ViccClassification::Oncogenic);
        assert_eq!(classify(6), ViccClassification::LikelyOncogenic);
        assert_eq!(classify(4), ViccClassification::LikelyOncogenic);
        assert_eq!(classify(3), ViccClassification::UncertainSignificance);
        assert_eq!(classify(-1), ViccClassification::UncertainSignificance);
        assert_eq!(classify(-2), ViccClassification::LikelyBenign);
        assert_eq!(classify(-5), ViccClassification::LikelyBenign);
        assert_eq!(classify(-6), ViccClassification::Benign);
    }

    #[test]
    fn test_total_is_exact_sum_of_vicc_scores() {
        let amp = Evidence::new(
            EvidenceCode::amp(ActionabilityContext::Therapeutic, EvidenceStrength::FdaApproved),
            "OncoKB",
            "x",
            4,
            0.95,
        )
        .unwrap();
        let evidence = vec![
            ev(ViccCriterion::Os3, 4),
            ev(ViccCriterion::Op1, 2),
            ev(ViccCriterion::Op1, 1),
            ev(ViccCriterion::Sbp1, -2),
            amp,
        ];
        let s = score_vicc(&evidence).unwrap();
        assert_eq!(s.total_score, 5);
        assert_eq!(s.score(ViccCriterion::Op1), 3);
        assert_eq!(s.score(ViccCriterion::Sbp1), -2);
        assert_eq!(s.score(ViccCriterion::Ovs1), 0);
        assert_eq!(s.criteria.values().sum::<i32>(), s.total_score);
        assert_eq!(s.classification, ViccClassification::LikelyOncogenic);
    }

    #[test]
    fn test_overflow_is_a_stage_error() {
        let evidence = vec![ev(ViccCriterion::Os1, i32::MAX), ev(ViccCriterion::Os2, 1)];
        assert!(matches!(score_vicc(&evidence), Err(TierError::Stage { stage: "vicc", .. })));
    }

    #[test]
    fn test_empty_is_uncertain() {
        let s = score_vicc(&[]).unwrap();
        assert_eq!(s.total_score, 0);
        assert_eq!(s.classification, ViccClassification::UncertainSignificance);
    }
}
