//! Pathogenic-variant-database channel: gene-level ClinVar-style counts.

use serde_json::json;

use oncotier_common::{Evidence, EvidenceCode, Result, ViccCriterion};

use super::ChannelContext;

/// Minimum submissions on the dominant side before the gene says anything.
const MIN_COUNT: u32 = 10;
/// Dominant side must outnumber the other by this factor.
const DOMINANCE: u32 = 2;

pub fn evaluate(ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
    let Some(gene) = ctx.variant.gene() else {
        return Ok(vec![]);
    };
    let Some(counts) = ctx.knowledge.variant_counts(gene) else {
        return Ok(vec![]);
    };

    // Without a matched normal a database hit may reflect a germline call.
    let confidence = if ctx.tumor_only() { 0.4 } else { 0.6 };
    let payload = json!({
        "pathogenic": counts.pathogenic,
        "benign": counts.benign,
        "tumor_only": ctx.tumor_only(),
    });

    let evidence = if counts.pathogenic >= MIN_COUNT && counts.pathogenic >= counts.benign.saturating_mul(DOMINANCE) {
        Evidence::new(
            EvidenceCode::vicc(ViccCriterion::Om4),
            "ClinVar",
            format!(
                "{} carries {} pathogenic vs {} benign variants",
                gene, counts.pathogenic, counts.benign
            ),
            1,
            confidence,
        )?
    } else if counts.benign >= MIN_COUNT && counts.benign >= counts.pathogenic.saturating_mul(DOMINANCE) {
        Evidence::new(
            EvidenceCode::vicc(ViccCriterion::Sbs2),
            "ClinVar",
            format!(
                "{} carries {} benign vs {} pathogenic variants",
                gene, counts.benign, counts.pathogenic
            ),
            -1,
            confidence,
        )?
    } else {
        return Ok(vec![]);
    };

    Ok(vec![evidence.with_data(payload)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{AnalysisType, AnnotatedVariant};
    use oncotier_knowledge::MockKnowledgeProvider;

    fn run(gene: &str, kb: &MockKnowledgeProvider, analysis_type: AnalysisType) -> Vec<Evidence> {
        let variant = AnnotatedVariant {
            gene_symbol: Some(gene.to_string()),
            ..AnnotatedVariant::new("1", 1, "A", "G")
        };
        let ctx = ChannelContext { variant: &variant, cancer_type: "Glioma", analysis_type, knowledge: kb };
        evaluate(&ctx).unwrap()
    }

    #[test]
    fn test_pathogenic_gene() {
        let kb = MockKnowledgeProvider::new().with_variant_counts("TP53", 1200, 40);
        let ev = run("TP53", &kb, AnalysisType::TumorNormal);
        assert_eq!(ev[0].vicc_criterion(), Some(ViccCriterion::Om4));
        assert_eq!(ev[0].score, 1);
        assert!((ev[0].confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_tumor_only_lowers_confidence() {
        let kb = MockKnowledgeProvider::new().with_variant_counts("TP53", 1200, 40);
        let ev = run("TP53", &kb, AnalysisType::TumorOnly);
        assert!((ev[0].confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_benign_gene() {
        let kb = MockKnowledgeProvider::new().with_variant_counts("TTN", 12, 400);
        let ev = run("TTN", &kb, AnalysisType::TumorNormal);
        assert_eq!(ev[0].vicc_criterion(), Some(ViccCriterion::Sbs2));
        assert_eq!(ev[0].score, -1);
    }

    #[test]
    fn test_balanced_or_sparse_counts_silent() {
        let kb = MockKnowledgeProvider::new()
            .with_variant_counts("ATM", 30, 20)
            .with_variant_counts("FOO", 4, 0);
        assert!(run("ATM", &kb, AnalysisType::TumorNormal).is_empty());
        assert!(run("FOO", &kb, AnalysisType::TumorNormal).is_empty());
        assert!(run("BAR", &kb, AnalysisType::TumorNormal).is_empty());
    }
}
