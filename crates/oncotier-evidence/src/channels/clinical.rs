//! Clinical-evidence channel.
//!
//! Two independent sources feed this channel:
//!
//! - prior clinical evidence records attached to the variant, leveled by
//!   evidence grade (A/B strong, C/D moderate);
//! - curated therapeutic associations from the knowledge base, matched to
//!   the variant by exact notation, then short-form notation, then a
//!   gene-level "any activating mutation" class.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use oncotier_common::hgvs::same_protein_change;
use oncotier_common::{
    ActionabilityContext, AnnotatedVariant, ClinicalEvidenceRecord, Evidence, EvidenceCode, EvidenceStrength, OncoKbLevel, Result,
    ViccCriterion,
};
use oncotier_knowledge::TherapeuticAssociation;

use super::ChannelContext;

/// Alteration classes that match any protein-altering variant in the gene.
/// Gene-level alteration labels and the variant class each one covers.
const GENE_LEVEL_ALTERATIONS: [(&str, fn(&AnnotatedVariant) -> bool); 5] = [
    ("truncating mutations", AnnotatedVariant::is_truncating),
    ("activating mutation", AnnotatedVariant::is_activating),
    ("oncogenic mutations", AnnotatedVariant::is_impactful),
    ("any mutation", AnnotatedVariant::is_impactful),
    ("all mutations", AnnotatedVariant::is_impactful),
];

/// Cancer-type labels that match every tumour type.
const PAN_CANCER: [&str; 4] = ["all tumors", "all solid tumors", "pan-cancer", "all cancers"];

/// Strategy that matched a therapeutic association to the variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    ShortForm,
    GeneLevel,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::ShortForm => "short_form",
            MatchStrategy::GeneLevel => "gene_level",
        }
    }
}

/// Evidence grade of a prior clinical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    fn parse(level: &str) -> Option<Self> {
        match level.trim().chars().next()?.to_ascii_uppercase() {
            'A' => Some(Grade::A),
            'B' => Some(Grade::B),
            'C' => Some(Grade::C),
            'D' => Some(Grade::D),
            _ => None,
        }
    }

    fn is_strong(&self) -> bool {
        matches!(self, Grade::A | Grade::B)
    }

    /// AMP strength and confidence of a record at this grade.
    fn amp_strength(&self) -> (EvidenceStrength, f64) {
        match self {
            Grade::A => (EvidenceStrength::ProfessionalGuideline, 0.9),
            Grade::B => (EvidenceStrength::ExpertConsensus, 0.85),
            Grade::C => (EvidenceStrength::CaseReports, 0.7),
            Grade::D => (EvidenceStrength::Preclinical, 0.6),
        }
    }
}

pub fn evaluate(ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
    let mut evidence = Vec::new();
    for record in &ctx.variant.clinical_evidence {
        if let Some(item) = prior_record(ctx, record)? {
            evidence.push(item);
        }
    }
    evidence.extend(therapeutic_matches(ctx)?);
    Ok(evidence)
}

// ---------------------------------------------------------------------------
// Prior clinical evidence records
// ---------------------------------------------------------------------------

fn prior_record(ctx: &ChannelContext<'_>, record: &ClinicalEvidenceRecord) -> Result<Option<Evidence>> {
    let Some(grade) = Grade::parse(&record.evidence_level) else {
        debug!(level = %record.evidence_level, source = %record.source, "Skipping clinical record with unsupported grade");
        return Ok(None);
    };
    let evidence_type = record.evidence_type.to_lowercase();
    let points = if grade.is_strong() { 4 } else { 2 };

    if evidence_type.contains("predispos") {
        // Germline records feed the somatic prior, not the clinical signal.
        return Ok(None);
    }

    if evidence_type.contains("oncogenic") || evidence_type.contains("functional") {
        let confidence = if grade.is_strong() { 0.9 } else { 0.7 };
        let evidence = Evidence::new(
            EvidenceCode::vicc(ViccCriterion::Os2),
            record.source.clone(),
            format!(
                "{} evidence level {} supports an oncogenic effect",
                record.source, record.evidence_level
            ),
            points,
            confidence,
        )?
        .with_data(record_payload(record, true));
        return Ok(Some(evidence));
    }

    let Some(context) = ActionabilityContext::from_keyword(&evidence_type) else {
        debug!(evidence_type = %record.evidence_type, "Skipping clinical record with unknown evidence type");
        return Ok(None);
    };

    let (mut strength, mut confidence) = grade.amp_strength();
    let specific = record
        .disease
        .as_deref()
        .map_or(true, |disease| cancer_type_matches(ctx, disease));
    if !specific {
        strength = strength.max(EvidenceStrength::MultipleStudies);
        confidence *= 0.8;
    }

    let evidence = Evidence::new(
        EvidenceCode::amp(context, strength),
        record.source.clone(),
        format!(
            "{} {} evidence level {}{}",
            record.source,
            context.as_str(),
            record.evidence_level,
            record.disease.as_deref().map(|d| format!(" in {}", d)).unwrap_or_default()
        ),
        points,
        confidence,
    )?
    .with_data(record_payload(record, specific));
    Ok(Some(evidence))
}

fn record_payload(record: &ClinicalEvidenceRecord, specific: bool) -> serde_json::Value {
    json!({
        "evidence_level": record.evidence_level,
        "evidence_type": record.evidence_type,
        "significance": record.significance,
        "disease": record.disease,
        "drugs": record.drugs,
        "cancer_type_specific": specific,
    })
}

// ---------------------------------------------------------------------------
// Therapeutic associations
// ---------------------------------------------------------------------------

fn therapeutic_matches(ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
    let Some(gene) = ctx.variant.gene() else {
        return Ok(vec![]);
    };
    let mut evidence = Vec::new();

    for association in ctx.knowledge.therapeutic_associations(gene) {
        let Some(strategy) = match_strategy(ctx, &association) else {
            continue;
        };
        if cancer_type_matches(ctx, &association.cancer_type) {
            evidence.extend(on_label(&association, strategy)?);
        } else {
            evidence.extend(off_label(&association, strategy)?);
        }
    }

    Ok(evidence)
}

/// First strategy that ties the association to this variant.
pub fn match_strategy(ctx: &ChannelContext<'_>, association: &TherapeuticAssociation) -> Option<MatchStrategy> {
    let alteration = association.alteration.trim();
    if let Some(hgvs_p) = ctx.variant.hgvs_p.as_deref().map(str::trim) {
        let bare = hgvs_p.strip_prefix("p.").unwrap_or(hgvs_p);
        if alteration == hgvs_p || alteration == bare {
            return Some(MatchStrategy::Exact);
        }
        if same_protein_change(alteration, hgvs_p) {
            return Some(MatchStrategy::ShortForm);
        }
    }
    let lower = alteration.to_lowercase();
    let covered = GENE_LEVEL_ALTERATIONS
        .iter()
        .find(|(label, _)| lower.contains(label))
        .is_some_and(|(_, covers)| covers(ctx.variant));
    if covered {
        return Some(MatchStrategy::GeneLevel);
    }
    None
}

/// Substring inclusion either way, pan-cancer wildcards, or taxonomy relation.
pub fn cancer_type_matches(ctx: &ChannelContext<'_>, candidate: &str) -> bool {
    let query = ctx.cancer_type.trim().to_lowercase();
    let candidate_lower = candidate.trim().to_lowercase();
    if candidate_lower.is_empty() {
        return false;
    }
    if PAN_CANCER.iter().any(|w| candidate_lower == *w) {
        return true;
    }
    if !query.is_empty() && (query.contains(&candidate_lower) || candidate_lower.contains(&query)) {
        return true;
    }
    ctx.knowledge.is_related_cancer_type(ctx.cancer_type, candidate)
}

fn association_payload(a: &TherapeuticAssociation, strategy: MatchStrategy, specific: bool) -> serde_json::Value {
    json!({
        "drugs": a.drugs,
        "cancer_type": a.cancer_type,
        "alteration": a.alteration,
        "level": a.level.as_str(),
        "match_strategy": strategy.as_str(),
        "cancer_type_specific": specific,
    })
}

fn on_label(a: &TherapeuticAssociation, strategy: MatchStrategy) -> Result<Vec<Evidence>> {
    let level = a.level;
    let drugs = a.drugs.join(", ");
    let relation = if level.is_resistance() { "resistance to" } else { "response to" };
    let payload = association_payload(a, strategy, true);

    let oncokb = Evidence::new(
        EvidenceCode::oncokb(level),
        a.source.clone(),
        format!("{} {}: {} {} in {}", level.as_str(), a.alteration, relation, drugs, a.cancer_type),
        level.points(),
        level.confidence(),
    )?
    .with_data(payload.clone());

    let amp = Evidence::new(
        EvidenceCode::amp(ActionabilityContext::Therapeutic, level.amp_strength()),
        a.source.clone(),
        format!("Therapeutic association ({}) with {} in {}", level.as_str(), drugs, a.cancer_type),
        level.points(),
        level.confidence(),
    )?
    .with_data(payload);

    Ok(vec![oncokb, amp])
}

/// Association for the variant in another tumour type. Sensitivity levels
/// drop to 3B; resistance levels are not carried across tumour types.
fn off_label(a: &TherapeuticAssociation, strategy: MatchStrategy) -> Result<Vec<Evidence>> {
    if a.level.is_resistance() {
        return Ok(vec![]);
    }
    let level = match a.level {
        OncoKbLevel::Level1 | OncoKbLevel::Level2 | OncoKbLevel::Level3A => OncoKbLevel::Level3B,
        other => other,
    };
    let strength = match a.level {
        OncoKbLevel::Level1 | OncoKbLevel::Level2 => EvidenceStrength::MultipleStudies,
        _ => EvidenceStrength::Investigational,
    };
    let payload = association_payload(a, strategy, false);
    let drugs = a.drugs.join(", ");
    let confidence = level.confidence() * 0.8;

    let oncokb = Evidence::new(
        EvidenceCode::oncokb(level),
        a.source.clone(),
        format!("{} (off-label, {} in {}): {}", level.as_str(), a.level.as_str(), a.cancer_type, drugs),
        level.points(),
        confidence,
    )?
    .with_data(payload.clone());

    let amp = Evidence::new(
        EvidenceCode::amp(ActionabilityContext::Therapeutic, strength),
        a.source.clone(),
        format!("Off-label therapeutic association with {} ({} in {})", drugs, a.level.as_str(), a.cancer_type),
        level.points(),
        confidence,
    )?
    .with_data(payload);

    Ok(vec![oncokb, amp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{AnalysisType, AnnotatedVariant, Guideline};
    use oncotier_knowledge::MockKnowledgeProvider;

    fn braf_v600e() -> AnnotatedVariant {
        AnnotatedVariant {
            gene_symbol: Some("BRAF".to_string()),
            consequences: vec!["missense_variant".to_string()],
            hgvs_p: Some("p.Val600Glu".to_string()),
            ..AnnotatedVariant::new("7", 140453136, "A", "T")
        }
    }

    fn run(variant: &AnnotatedVariant, kb: &MockKnowledgeProvider, cancer_type: &str) -> Vec<Evidence> {
        let ctx = ChannelContext {
            variant,
            cancer_type,
            analysis_type: AnalysisType::TumorNormal,
            knowledge: kb,
        };
        evaluate(&ctx).unwrap()
    }

    fn record(level: &str, evidence_type: &str, disease: Option<&str>) -> ClinicalEvidenceRecord {
        ClinicalEvidenceRecord {
            source: "CIViC".to_string(),
            evidence_level: level.to_string(),
            evidence_type: evidence_type.to_string(),
            significance: None,
            disease: disease.map(str::to_string),
            drugs: vec![],
        }
    }

    #[test]
    fn test_short_form_match_on_label() {
        let kb = MockKnowledgeProvider::new().with_therapy(
            "BRAF",
            "V600E",
            "Melanoma",
            OncoKbLevel::Level1,
            &["Dabrafenib", "Trametinib"],
        );
        let ev = run(&braf_v600e(), &kb, "Cutaneous Melanoma");
        assert_eq!(ev.len(), 2);
        assert_eq!(ev[0].oncokb_level(), Some(OncoKbLevel::Level1));
        assert_eq!(
            ev[1].amp_context(),
            Some((ActionabilityContext::Therapeutic, EvidenceStrength::FdaApproved))
        );
        assert_eq!(ev[0].data["match_strategy"], "short_form");
        assert!(ev.iter().all(|e| e.is_cancer_type_specific()));
        assert_eq!(ev[0].drugs(), vec!["Dabrafenib".to_string(), "Trametinib".to_string()]);
    }

    #[test]
    fn test_exact_match_wins_over_short_form() {
        let kb = MockKnowledgeProvider::new().with_therapy("BRAF", "Val600Glu", "Melanoma", OncoKbLevel::Level1, &["Vemurafenib"]);
        let ev = run(&braf_v600e(), &kb, "Melanoma");
        assert_eq!(ev[0].data["match_strategy"], "exact");
    }

    #[test]
    fn test_gene_level_match_requires_impactful_consequence() {
        let kb = MockKnowledgeProvider::new().with_therapy(
            "BRAF",
            "Oncogenic Mutations",
            "Melanoma",
            OncoKbLevel::Level3A,
            &["Binimetinib"],
        );
        let ev = run(&braf_v600e(), &kb, "Melanoma");
        assert_eq!(ev[0].data["match_strategy"], "gene_level");

        let mut silent = braf_v600e();
        silent.consequences = vec!["synonymous_variant".to_string()];
        silent.hgvs_p = Some("p.Val600=".to_string());
        assert!(run(&silent, &kb, "Melanoma").is_empty());
    }

    #[test]
    fn test_gene_level_match_respects_alteration_class() {
        let kb = MockKnowledgeProvider::new()
            .with_therapy("BRCA2", "Truncating Mutations", "Ovarian Cancer", OncoKbLevel::Level1, &["Olaparib"]);
        let brca2 = |consequence: &str, hgvs_p: &str| AnnotatedVariant {
            gene_symbol: Some("BRCA2".to_string()),
            consequences: vec![consequence.to_string()],
            hgvs_p: Some(hgvs_p.to_string()),
            ..AnnotatedVariant::new("13", 32972626, "G", "C")
        };

        let missense = brca2("missense_variant", "p.Asp2723His");
        assert!(run(&missense, &kb, "Ovarian Cancer").is_empty());

        let nonsense = brca2("stop_gained", "p.Glu2723Ter");
        let ev = run(&nonsense, &kb, "Ovarian Cancer");
        assert_eq!(ev[0].oncokb_level(), Some(OncoKbLevel::Level1));
        assert_eq!(ev[0].data["match_strategy"], "gene_level");

        let activating = MockKnowledgeProvider::new()
            .with_therapy("BRAF", "Activating Mutations", "Melanoma", OncoKbLevel::Level3A, &["Binimetinib"]);
        let mut truncated = braf_v600e();
        truncated.consequences = vec!["frameshift_variant".to_string()];
        truncated.hgvs_p = Some("p.Val600fs".to_string());
        assert!(run(&truncated, &activating, "Melanoma").is_empty());
        assert_eq!(run(&braf_v600e(), &activating, "Melanoma").len(), 2);
    }

    #[test]
    fn test_off_label_downgraded() {
        let kb = MockKnowledgeProvider::new().with_therapy("BRAF", "V600E", "Melanoma", OncoKbLevel::Level1, &["Dabrafenib"]);
        let ev = run(&braf_v600e(), &kb, "Thyroid Cancer");
        assert_eq!(ev.len(), 2);
        assert_eq!(ev[0].oncokb_level(), Some(OncoKbLevel::Level3B));
        assert_eq!(
            ev[1].amp_context(),
            Some((ActionabilityContext::Therapeutic, EvidenceStrength::MultipleStudies))
        );
        assert!(ev.iter().all(|e| !e.is_cancer_type_specific()));
        assert!((ev[0].confidence - 0.65 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_off_label_resistance_dropped() {
        let kb = MockKnowledgeProvider::new().with_therapy("BRAF", "V600E", "Colorectal Cancer", OncoKbLevel::R1, &["Vemurafenib"]);
        assert!(run(&braf_v600e(), &kb, "Melanoma").is_empty());
        let on_label = run(&braf_v600e(), &kb, "Colorectal Cancer");
        assert_eq!(on_label[0].oncokb_level(), Some(OncoKbLevel::R1));
    }

    #[test]
    fn test_cancer_type_wildcards_and_taxonomy() {
        let kb = MockKnowledgeProvider::new()
            .with_therapy("BRAF", "V600E", "All Solid Tumors", OncoKbLevel::Level1, &["Dabrafenib"])
            .with_therapy("BRAF", "V600E", "Non-Small Cell Lung Cancer", OncoKbLevel::Level1, &["Dabrafenib"])
            .with_cancer_subtype("Lung Adenocarcinoma", "Non-Small Cell Lung Cancer");
        let ev = run(&braf_v600e(), &kb, "Lung Adenocarcinoma");
        assert_eq!(ev.len(), 4);
        assert!(ev.iter().all(|e| e.is_cancer_type_specific()));
    }

    #[test]
    fn test_prior_records_by_grade() {
        let mut v = braf_v600e();
        v.clinical_evidence = vec![
            record("A", "Predictive", Some("Melanoma")),
            record("C", "Prognostic", Some("Colorectal Cancer")),
            record("B", "Oncogenic", None),
            record("D", "Functional", None),
            record("A", "Predisposing", None),
            record("E", "Predictive", None),
        ];
        let ev = run(&v, &MockKnowledgeProvider::new(), "Melanoma");
        assert_eq!(ev.len(), 4);

        assert_eq!(
            ev[0].amp_context(),
            Some((ActionabilityContext::Therapeutic, EvidenceStrength::ProfessionalGuideline))
        );
        // Other disease: capped at multiple studies, confidence reduced.
        assert_eq!(
            ev[1].amp_context(),
            Some((ActionabilityContext::Prognostic, EvidenceStrength::CaseReports))
        );
        assert!((ev[1].confidence - 0.7 * 0.8).abs() < 1e-9);
        assert!(!ev[1].is_cancer_type_specific());

        assert_eq!(ev[2].vicc_criterion(), Some(ViccCriterion::Os2));
        assert_eq!(ev[2].score, 4);
        assert_eq!(ev[3].vicc_criterion(), Some(ViccCriterion::Os2));
        assert_eq!(ev[3].score, 2);
        assert_eq!(ev[2].guideline(), Guideline::Vicc);
    }

    #[test]
    fn test_strong_off_disease_record_capped() {
        let mut v = braf_v600e();
        v.clinical_evidence = vec![record("A", "Diagnostic", Some("Hairy Cell Leukemia"))];
        let ev = run(&v, &MockKnowledgeProvider::new(), "Melanoma");
        assert_eq!(
            ev[0].amp_context(),
            Some((ActionabilityContext::Diagnostic, EvidenceStrength::MultipleStudies))
        );
    }
}
