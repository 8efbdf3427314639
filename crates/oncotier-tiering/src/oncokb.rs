//! OncoKB-style therapeutic leveling.

use std::collections::{BTreeMap, BTreeSet};

use oncotier_common::{Evidence, OncoKbLevel, Result};

use crate::result::OncoKBScoring;

/// Coarse oncogenicity implied by the strongest level seen.
pub fn oncogenicity_label(level: Option<OncoKbLevel>) -> &'static str {
    match level {
        Some(OncoKbLevel::Level1 | OncoKbLevel::Level2 | OncoKbLevel::Level3A | OncoKbLevel::R1) => "Oncogenic",
        Some(OncoKbLevel::Level3B | OncoKbLevel::Level4 | OncoKbLevel::R2) => "Likely Oncogenic",
        None => "Unknown",
    }
}

pub fn score_oncokb(evidence: &[Evidence]) -> Result<OncoKBScoring> {
    let leveled: Vec<(OncoKbLevel, &Evidence)> =
        evidence.iter().filter_map(|e| e.oncokb_level().map(|l| (l, e))).collect();

    let highest_level = leveled.iter().map(|(l, _)| *l).filter(|l| !l.is_resistance()).min();
    let resistance_levels: Vec<OncoKbLevel> = leveled
        .iter()
        .map(|(l, _)| *l)
        .filter(|l| l.is_resistance())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut therapies: BTreeMap<OncoKbLevel, BTreeSet<String>> = BTreeMap::new();
    for (level, e) in &leveled {
        therapies.entry(*level).or_default().extend(e.drugs());
    }

    let label_level = highest_level.or_else(|| resistance_levels.first().copied());
    let cancer_type_specific = label_level
        .map(|top| leveled.iter().any(|(l, e)| *l == top && e.is_cancer_type_specific()))
        .unwrap_or(false);

    Ok(OncoKBScoring {
        highest_level,
        resistance_levels,
        therapies: therapies.into_iter().map(|(l, d)| (l, d.into_iter().collect())).collect(),
        cancer_type_specific,
        oncogenicity: oncogenicity_label(label_level).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::EvidenceCode;
    use serde_json::json;

    fn level(l: OncoKbLevel, drugs: &[&str], specific: bool) -> Evidence {
        Evidence::new(EvidenceCode::oncokb(l), "OncoKB", "x", l.points(), l.confidence())
            .unwrap()
            .with_data(json!({ "drugs": drugs, "cancer_type_specific": specific }))
    }

    #[test]
    fn test_highest_level_ignores_resistance() {
        let evidence = vec![
            level(OncoKbLevel::R1, &["Cetuximab"], true),
            level(OncoKbLevel::Level3A, &["Binimetinib"], true),
            level(OncoKbLevel::Level1, &["Trametinib", "Dabrafenib"], true),
            level(OncoKbLevel::Level1, &["Dabrafenib"], true),
        ];
        let s = score_oncokb(&evidence).unwrap();
        assert_eq!(s.highest_level, Some(OncoKbLevel::Level1));
        assert_eq!(s.resistance_levels, vec![OncoKbLevel::R1]);
        assert_eq!(
            s.therapies[&OncoKbLevel::Level1],
            vec!["Dabrafenib".to_string(), "Trametinib".to_string()]
        );
        assert_eq!(s.oncogenicity, "Oncogenic");
        assert!(s.cancer_type_specific);
    }

    #[test]
    fn test_resistance_only() {
        let s = score_oncokb(&[level(OncoKbLevel::R2, &["Erlotinib"], false)]).unwrap();
        assert_eq!(s.highest_level, None);
        assert_eq!(s.oncogenicity, "Likely Oncogenic");
        assert!(!s.cancer_type_specific);
    }

    #[test]
    fn test_off_label_only() {
        let s = score_oncokb(&[level(OncoKbLevel::Level3B, &["Dabrafenib"], false)]).unwrap();
        assert_eq!(s.highest_level, Some(OncoKbLevel::Level3B));
        assert!(!s.cancer_type_specific);
        assert_eq!(s.oncogenicity, "Likely Oncogenic");
    }

    #[test]
    fn test_no_levels() {
        let s = score_oncokb(&[]).unwrap();
        assert_eq!(s, OncoKBScoring::default());
    }
}
