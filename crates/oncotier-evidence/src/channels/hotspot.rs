//! Hotspot recurrence channel.

use serde_json::json;

use oncotier_common::{Evidence, EvidenceCode, Result, ViccCriterion};

use super::ChannelContext;

/// One recurrence band: minimum samples, criterion, points, confidence, label.
struct HotspotBand {
    min_samples: u32,
    criterion: ViccCriterion,
    points: i32,
    confidence: f64,
    label: &'static str,
}

/// Strongest band first; the first band the count reaches wins.
const BANDS: [HotspotBand; 3] = [
    HotspotBand { min_samples: 20, criterion: ViccCriterion::Os3, points: 4, confidence: 0.9, label: "strong" },
    HotspotBand { min_samples: 10, criterion: ViccCriterion::Om3, points: 2, confidence: 0.8, label: "moderate" },
    HotspotBand { min_samples: 3, criterion: ViccCriterion::Op3, points: 1, confidence: 0.7, label: "weak" },
];

pub fn evaluate(ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
    let record = ctx
        .variant
        .hotspot_evidence
        .iter()
        .max_by_key(|h| h.samples)
        .map(|h| (h.samples, h.source.clone()));
    let kb = ctx
        .gene_and_protein()
        .and_then(|(gene, protein)| ctx.knowledge.hotspot_samples(gene, protein))
        .map(|n| (n, "cancerhotspots".to_string()));

    let Some((samples, source)) = [record, kb].into_iter().flatten().max_by_key(|(n, _)| *n) else {
        return Ok(vec![]);
    };

    let Some(band) = BANDS.iter().find(|b| samples >= b.min_samples) else {
        return Ok(vec![]);
    };

    let evidence = Evidence::new(
        EvidenceCode::vicc(band.criterion),
        source,
        format!("Recurrent hotspot observed in {} tumour samples ({} recurrence)", samples, band.label),
        band.points,
        band.confidence,
    )?
    .with_data(json!({ "samples": samples, "band": band.label }));

    Ok(vec![evidence])
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{AnalysisType, AnnotatedVariant, HotspotRecord};
    use oncotier_knowledge::MockKnowledgeProvider;

    fn kras(samples: u32) -> AnnotatedVariant {
        AnnotatedVariant {
            gene_symbol: Some("KRAS".to_string()),
            hgvs_p: Some("p.Gly12Asp".to_string()),
            hotspot_evidence: vec![HotspotRecord {
                source: "COSMIC".to_string(),
                samples,
                hotspot_type: None,
            }],
            ..AnnotatedVariant::new("12", 25398284, "C", "T")
        }
    }

    fn run(variant: &AnnotatedVariant, kb: &MockKnowledgeProvider) -> Vec<Evidence> {
        let ctx = ChannelContext {
            variant,
            cancer_type: "Pancreatic Adenocarcinoma",
            analysis_type: AnalysisType::TumorNormal,
            knowledge: kb,
        };
        evaluate(&ctx).unwrap()
    }

    #[test]
    fn test_band_boundaries() {
        let kb = MockKnowledgeProvider::new();
        let cases = [
            (20, Some((ViccCriterion::Os3, 4, 0.9))),
            (19, Some((ViccCriterion::Om3, 2, 0.8))),
            (10, Some((ViccCriterion::Om3, 2, 0.8))),
            (9, Some((ViccCriterion::Op3, 1, 0.7))),
            (3, Some((ViccCriterion::Op3, 1, 0.7))),
            (2, None),
        ];
        for (samples, expected) in cases {
            let ev = run(&kras(samples), &kb);
            match expected {
                Some((crit, pts, conf)) => {
                    assert_eq!(ev.len(), 1, "samples={}", samples);
                    assert_eq!(ev[0].vicc_criterion(), Some(crit));
                    assert_eq!(ev[0].score, pts);
                    assert!((ev[0].confidence - conf).abs() < 1e-9);
                }
                None => assert!(ev.is_empty(), "samples={}", samples),
            }
        }
    }

    #[test]
    fn test_knowledge_count_used_when_larger() {
        let kb = MockKnowledgeProvider::new().with_hotspot("KRAS", "G12D", 2500);
        let ev = run(&kras(4), &kb);
        assert_eq!(ev[0].vicc_criterion(), Some(ViccCriterion::Os3));
        assert_eq!(ev[0].source, "cancerhotspots");
    }

    #[test]
    fn test_no_hotspot_data() {
        let variant = AnnotatedVariant::new("1", 100, "A", "C");
        assert!(run(&variant, &MockKnowledgeProvider::new()).is_empty());
    }
}
