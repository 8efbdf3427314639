//! Purity estimated from a sample feeds the DSC of that sample's variants.

use std::sync::Arc;

use oncotier_common::config::{DscConfig, PurityConfig};
use oncotier_common::{AnalysisType, AnnotatedVariant};
use oncotier_dsc::{DscCalculator, PurityEstimator, PurityMethod};
use oncotier_knowledge::MockKnowledgeProvider;

fn clonal_sample(n: usize) -> Vec<AnnotatedVariant> {
    (0..n)
        .map(|i| AnnotatedVariant {
            gene_symbol: Some(format!("GENE{}", i)),
            consequences: vec!["missense_variant".to_string()],
            vaf: Some([0.31, 0.32, 0.33][i % 3]),
            total_depth: Some(120),
            ..AnnotatedVariant::new("1", 10_000 + i as u64, "C", "T")
        })
        .collect()
}

#[test]
fn test_sample_purity_drives_vaf_consistency() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let kb = Arc::new(MockKnowledgeProvider::new());
    let estimator = PurityEstimator::new(PurityConfig::default()).with_knowledge(kb.clone());
    let sample = clonal_sample(30);

    let estimate = estimator.estimate(&sample, AnalysisType::TumorOnly, None);
    assert_eq!(estimate.method, PurityMethod::HeterozygousPeak);
    assert!((estimate.purity - 0.65).abs() < 1e-9, "purity = {}", estimate.purity);
    assert_eq!(estimate.variant_count, 30);
    assert!(estimate.confidence > 0.5 && estimate.confidence <= 0.95);

    let calculator = DscCalculator::new(DscConfig::default(), kb);
    let clonal = calculator.compute(&sample[0], &[], Some(estimate.purity)).unwrap();
    assert!(clonal.vaf_purity_score.unwrap() > 0.9);

    let germline_like = AnnotatedVariant { vaf: Some(0.98), ..sample[0].clone() };
    let suspicious = calculator.compute(&germline_like, &[], Some(estimate.purity)).unwrap();
    assert!((suspicious.vaf_purity_score.unwrap() - 0.4).abs() < 1e-12);
    assert!(suspicious.dsc_score < clonal.dsc_score);
}
