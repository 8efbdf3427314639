//! Gene-role channel: tumour-suppressor loss of function, oncogene activation,
//! census membership and protein-length changes.

use serde_json::json;

use oncotier_common::variant::ConsequenceClass;
use oncotier_common::{Evidence, EvidenceCode, Result, ViccCriterion};

use super::ChannelContext;

pub fn evaluate(ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
    let Some(gene) = ctx.variant.gene() else {
        return Ok(vec![]);
    };
    let Some(role) = ctx.knowledge.gene_role(gene) else {
        return Ok(vec![]);
    };
    let variant = ctx.variant;
    let payload = json!({
        "gene": gene,
        "oncogene": role.oncogene,
        "tumor_suppressor": role.tumor_suppressor,
        "cancer_gene_census": role.cancer_gene_census,
    });

    let mut evidence = Vec::new();

    if role.tumor_suppressor && variant.is_truncating() {
        evidence.push(
            Evidence::new(
                EvidenceCode::vicc(ViccCriterion::Ovs1),
                "CGC",
                format!("Truncating variant in tumour suppressor {}", gene),
                8,
                0.95,
            )?
            .with_data(payload.clone()),
        );
    } else if role.oncogene && variant.is_activating() {
        evidence.push(
            Evidence::new(
                EvidenceCode::vicc(ViccCriterion::Os1),
                "CGC",
                format!("Activating-type consequence in oncogene {}", gene),
                4,
                0.8,
            )?
            .with_data(payload.clone()),
        );
    } else if role.cancer_gene_census || role.oncogene || role.tumor_suppressor {
        evidence.push(
            Evidence::new(
                EvidenceCode::vicc(ViccCriterion::Op2),
                "CGC",
                format!("{} is a Cancer Gene Census gene", gene),
                2,
                0.6,
            )?
            .with_data(payload.clone()),
        );
    }

    let inframe_in_driver = variant.has_consequence(ConsequenceClass::InFrame)
        && (role.oncogene || role.tumor_suppressor);
    let stop_loss_in_tsg = variant.has_consequence(ConsequenceClass::StopLost) && role.tumor_suppressor;
    if inframe_in_driver || stop_loss_in_tsg {
        evidence.push(
            Evidence::new(
                EvidenceCode::vicc(ViccCriterion::Om2),
                "CGC",
                format!("Protein length change in cancer driver {}", gene),
                2,
                0.65,
            )?
            .with_data(payload),
        );
    }

    Ok(evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{AnalysisType, AnnotatedVariant};
    use oncotier_knowledge::{GeneRole, MockKnowledgeProvider};

    fn variant(gene: &str, consequence: &str) -> AnnotatedVariant {
        AnnotatedVariant {
            gene_symbol: Some(gene.to_string()),
            consequences: vec![consequence.to_string()],
            ..AnnotatedVariant::new("1", 1000, "A", "T")
        }
    }

    fn run(variant: &AnnotatedVariant, kb: &MockKnowledgeProvider) -> Vec<Evidence> {
        let ctx = ChannelContext {
            variant,
            cancer_type: "Colorectal Cancer",
            analysis_type: AnalysisType::TumorNormal,
            knowledge: kb,
        };
        evaluate(&ctx).unwrap()
    }

    #[test]
    fn test_truncating_tumor_suppressor() {
        let kb = MockKnowledgeProvider::new().with_tumor_suppressor("APC");
        let ev = run(&variant("APC", "stop_gained"), &kb);
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].vicc_criterion(), Some(ViccCriterion::Ovs1));
        assert_eq!(ev[0].score, 8);
        assert!((ev[0].confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_activating_oncogene() {
        let kb = MockKnowledgeProvider::new().with_oncogene("BRAF");
        let ev = run(&variant("BRAF", "missense_variant"), &kb);
        assert_eq!(ev[0].vicc_criterion(), Some(ViccCriterion::Os1));
        assert_eq!(ev[0].score, 4);
    }

    #[test]
    fn test_census_only() {
        let kb = MockKnowledgeProvider::new().with_gene_role(
            "ARID1A",
            GeneRole { cancer_gene_census: true, ..Default::default() },
        );
        let ev = run(&variant("ARID1A", "missense_variant"), &kb);
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].vicc_criterion(), Some(ViccCriterion::Op2));
        assert_eq!(ev[0].score, 2);
    }

    #[test]
    fn test_inframe_deletion_in_oncogene_adds_length_change() {
        let kb = MockKnowledgeProvider::new().with_oncogene("EGFR");
        let ev = run(&variant("EGFR", "inframe_deletion"), &kb);
        let codes: Vec<_> = ev.iter().filter_map(|e| e.vicc_criterion()).collect();
        assert_eq!(codes, vec![ViccCriterion::Os1, ViccCriterion::Om2]);
    }

    #[test]
    fn test_unknown_gene_yields_nothing() {
        let ev = run(&variant("FOO1", "stop_gained"), &MockKnowledgeProvider::new());
        assert!(ev.is_empty());
    }
}
