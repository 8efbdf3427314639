//! Protein-domain channel.

use serde_json::json;
use tracing::debug;

use oncotier_common::hgvs::protein_position;
use oncotier_common::{Evidence, EvidenceCode, Result, ViccCriterion};

use super::ChannelContext;

pub fn evaluate(ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
    let Some((gene, hgvs_p)) = ctx.gene_and_protein() else {
        return Ok(vec![]);
    };
    let Some(position) = protein_position(hgvs_p) else {
        debug!(gene, hgvs_p, "Skipping domain lookup: no protein position");
        return Ok(vec![]);
    };

    let domains = ctx.knowledge.protein_domains(gene);
    let Some(domain) = domains.iter().find(|d| d.critical && d.contains(position)) else {
        return Ok(vec![]);
    };

    let evidence = Evidence::new(
        EvidenceCode::vicc(ViccCriterion::Om1),
        "InterPro",
        format!(
            "Residue {} lies in critical domain {} ({}-{}) of {}",
            position, domain.name, domain.start, domain.end, gene
        ),
        2,
        0.7,
    )?
    .with_data(json!({
        "domain": domain.name,
        "start": domain.start,
        "end": domain.end,
        "position": position,
    }));
    Ok(vec![evidence])
}
