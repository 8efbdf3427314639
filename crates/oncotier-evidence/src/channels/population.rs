//! Population-frequency channel.
//!
//! Without a matched normal, population frequency is the primary germline
//! filter; descriptions and payloads say so.

use serde_json::json;
use tracing::debug;

use oncotier_common::{Evidence, EvidenceCode, PopulationFrequency, Result, ViccCriterion};

use super::ChannelContext;

/// Above this the variant is common in the population.
pub const COMMON_AF: f64 = 0.01;
/// Above this the variant is almost certainly germline.
pub const GERMLINE_AF: f64 = 0.05;
/// Below this the variant counts as rare.
pub const RARE_AF: f64 = 0.0001;

pub fn evaluate(ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
    let critical = ctx.tumor_only();
    let mut evidence = Vec::new();

    for record in collect_records(ctx) {
        let af = record.frequency;
        if !af.is_finite() || !(0.0..=1.0).contains(&af) {
            debug!(population = %record.population, frequency = af, "Skipping malformed population frequency");
            continue;
        }
        let source = record.source.clone().unwrap_or_else(|| "gnomAD".to_string());
        let qualifier = if critical { " (critical germline filter: no matched normal)" } else { "" };
        let payload = json!({
            "population": record.population,
            "frequency": af,
            "critical_filter": critical,
        });

        if af > GERMLINE_AF {
            evidence.push(
                Evidence::new(
                    EvidenceCode::vicc(ViccCriterion::Sbvs1),
                    source.clone(),
                    format!(
                        "Allele frequency {:.4} in {} exceeds {:.0}%: strong germline signal{}",
                        af, record.population, GERMLINE_AF * 100.0, qualifier
                    ),
                    -8,
                    0.95,
                )?
                .with_data(payload.clone()),
            );
        }
        if af > COMMON_AF {
            evidence.push(
                Evidence::new(
                    EvidenceCode::vicc(ViccCriterion::Sbs1),
                    source.clone(),
                    format!(
                        "Allele frequency {:.4} in {} exceeds {:.0}%: common variant{}",
                        af, record.population, COMMON_AF * 100.0, qualifier
                    ),
                    -4,
                    0.85,
                )?
                .with_data(payload.clone()),
            );
        }
        if af < RARE_AF {
            evidence.push(
                Evidence::new(
                    EvidenceCode::vicc(ViccCriterion::Op4),
                    source,
                    format!(
                        "Allele frequency {:.6} in {} below 0.01%: rare variant{}",
                        af, record.population, qualifier
                    ),
                    1,
                    0.6,
                )?
                .with_data(payload),
            );
        }
    }

    Ok(evidence)
}

/// Records on the variant first, then knowledge-base records for
/// populations the variant does not already carry.
fn collect_records(ctx: &ChannelContext<'_>) -> Vec<PopulationFrequency> {
    let mut records = ctx.variant.population_frequencies.clone();
    if let Some((gene, protein)) = ctx.gene_and_protein() {
        for kb_record in ctx.knowledge.population_frequencies(gene, protein) {
            if !records.iter().any(|r| r.population.eq_ignore_ascii_case(&kb_record.population)) {
                records.push(kb_record);
            }
        }
    }
    records
}
