//! Whole-aggregator behaviour against a mock knowledge base.

use std::sync::Arc;

use oncotier_common::{
    ActionabilityContext, AnalysisType, AnnotatedVariant, EvidenceStrength, Guideline, HotspotRecord, OncoKbLevel,
    PopulationFrequency, ViccCriterion,
};
use oncotier_evidence::EvidenceAggregator;
use oncotier_knowledge::MockKnowledgeProvider;

fn braf_v600e() -> AnnotatedVariant {
    AnnotatedVariant {
        gene_symbol: Some("BRAF".to_string()),
        consequences: vec!["missense_variant".to_string()],
        hgvs_p: Some("p.Val600Glu".to_string()),
        vaf: Some(0.45),
        total_depth: Some(180),
        hotspot_evidence: vec![HotspotRecord {
            source: "COSMIC".to_string(),
            samples: 50,
            hotspot_type: Some("single residue".to_string()),
        }],
        ..AnnotatedVariant::new("7", 140453136, "A", "T")
    }
}

fn knowledge() -> MockKnowledgeProvider {
    MockKnowledgeProvider::new()
        .with_oncogene("BRAF")
        .with_therapy("BRAF", "V600E", "Melanoma", OncoKbLevel::Level1, &["Dabrafenib", "Trametinib"])
        .with_domain("BRAF", "Protein kinase", 457, 717, true)
}

#[test]
fn test_braf_hotspot_collects_all_signals() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let agg = EvidenceAggregator::new(Arc::new(knowledge()));
    let report = agg.aggregate_with_report(&braf_v600e(), "Melanoma", AnalysisType::TumorOnly);
    assert!(report.failures.is_empty());

    let criteria: Vec<_> = report.evidence.iter().filter_map(|e| e.vicc_criterion()).collect();
    assert!(criteria.contains(&ViccCriterion::Os3));
    assert!(criteria.contains(&ViccCriterion::Os1));
    assert!(criteria.contains(&ViccCriterion::Om1));

    let hotspot = report
        .evidence
        .iter()
        .find(|e| e.vicc_criterion() == Some(ViccCriterion::Os3))
        .unwrap();
    assert_eq!(hotspot.score, 4);
    assert!((hotspot.confidence - 0.9).abs() < 1e-9);

    assert!(report.evidence.iter().any(|e| e.oncokb_level() == Some(OncoKbLevel::Level1)));
    assert!(report.evidence.iter().any(|e| {
        e.amp_context() == Some((ActionabilityContext::Therapeutic, EvidenceStrength::FdaApproved))
    }));
    for g in Guideline::ALL {
        assert!(report.evidence.iter().any(|e| e.guideline() == g), "{}", g.as_str());
    }
}

#[test]
fn test_every_germline_frequency_gives_negative_signal() {
    let agg = EvidenceAggregator::new(Arc::new(MockKnowledgeProvider::new()));
    for af in [0.051, 0.1, 0.3, 0.9] {
        let variant = AnnotatedVariant {
            population_frequencies: vec![PopulationFrequency {
                population: "gnomAD_AF".to_string(),
                frequency: af,
                source: None,
            }],
            ..AnnotatedVariant::new("1", 1000, "C", "G")
        };
        for analysis in [AnalysisType::TumorNormal, AnalysisType::TumorOnly] {
            let evidence = agg.aggregate(&variant, "Glioblastoma", analysis);
            assert!(
                evidence.iter().any(|e| e.vicc_criterion() == Some(ViccCriterion::Sbvs1) && e.score < 0),
                "af={}",
                af
            );
        }
    }
}

#[test]
fn test_aggregation_is_deterministic() {
    let agg = EvidenceAggregator::new(Arc::new(knowledge()));
    let a = agg.aggregate(&braf_v600e(), "Melanoma", AnalysisType::TumorNormal);
    let b = agg.aggregate(&braf_v600e(), "Melanoma", AnalysisType::TumorNormal);
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}
