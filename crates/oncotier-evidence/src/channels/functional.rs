//! Functional-prediction channel.
//!
//! Reads raw predictor scores from the variant's plugin data. Each predictor
//! votes independently; a consensus signal is added on top when enough of
//! them agree.

use serde_json::{json, Value};
use tracing::debug;

use oncotier_common::{AnnotatedVariant, Evidence, EvidenceCode, Result, ViccCriterion};

use super::ChannelContext;

/// Pathogenicity predictor with its plugin field names and cutoffs.
struct Predictor {
    name: &'static str,
    keys: &'static [&'static str],
    pathogenic: f64,
    benign: f64,
}

const PREDICTORS: [Predictor; 4] = [
    Predictor { name: "AlphaMissense", keys: &["am_pathogenicity", "AlphaMissense_score"], pathogenic: 0.564, benign: 0.34 },
    Predictor { name: "REVEL", keys: &["REVEL", "REVEL_score"], pathogenic: 0.5, benign: 0.25 },
    Predictor { name: "MetaRNN", keys: &["MetaRNN_score"], pathogenic: 0.5, benign: 0.25 },
    Predictor { name: "ClinPred", keys: &["ClinPred_score"], pathogenic: 0.5, benign: 0.25 },
];

const SPLICEAI_KEYS: [&str; 4] = ["SpliceAI_pred_DS_AG", "SpliceAI_pred_DS_AL", "SpliceAI_pred_DS_DG", "SpliceAI_pred_DS_DL"];
const SPLICE_HIGH: f64 = 0.8;
const SPLICE_MODERATE: f64 = 0.2;

const CONSERVATION_KEYS: [&str; 2] = ["GERP++_RS", "GERP_RS"];
const CONSERVATION_CUTOFF: f64 = 4.0;

const CONSTRAINT_KEYS: [&str; 2] = ["LOEUF", "gnomAD_LOEUF"];
const CONSTRAINT_CUTOFF: f64 = 0.1;

const CONSENSUS_MIN_VOTES: usize = 3;
const CONSENSUS_PATHOGENIC: f64 = 0.75;
const CONSENSUS_BENIGN: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Pathogenic,
    Benign,
}

pub fn evaluate(ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
    let variant = ctx.variant;
    let mut evidence = Vec::new();
    let mut votes = Vec::new();

    for predictor in &PREDICTORS {
        let Some(score) = first_score(variant, predictor.keys) else {
            continue;
        };
        let payload = json!({ "predictor": predictor.name, "score": score });
        if score >= predictor.pathogenic {
            votes.push(Vote::Pathogenic);
            evidence.push(
                Evidence::new(
                    EvidenceCode::vicc(ViccCriterion::Op1),
                    predictor.name,
                    format!("{} score {:.3} at or above pathogenic cutoff {}", predictor.name, score, predictor.pathogenic),
                    2,
                    0.7,
                )?
                .with_data(payload),
            );
        } else if score <= predictor.benign {
            votes.push(Vote::Benign);
            evidence.push(
                Evidence::new(
                    EvidenceCode::vicc(ViccCriterion::Sbp1),
                    predictor.name,
                    format!("{} score {:.3} at or below benign cutoff {}", predictor.name, score, predictor.benign),
                    -2,
                    0.7,
                )?
                .with_data(payload),
            );
        }
    }

    if let Some(delta) = SPLICEAI_KEYS.iter().filter_map(|k| score_for(variant, k)).reduce(f64::max) {
        let band = if delta >= SPLICE_HIGH {
            Some(("high", 2, 0.85))
        } else if delta >= SPLICE_MODERATE {
            Some(("moderate", 1, 0.6))
        } else {
            None
        };
        if let Some((label, points, confidence)) = band {
            evidence.push(
                Evidence::new(
                    EvidenceCode::vicc(ViccCriterion::Op1),
                    "SpliceAI",
                    format!("SpliceAI maximum delta score {:.2} ({} splice impact)", delta, label),
                    points,
                    confidence,
                )?
                .with_data(json!({ "predictor": "SpliceAI", "max_delta": delta, "band": label })),
            );
        }
    }

    if let Some(gerp) = first_score(variant, &CONSERVATION_KEYS) {
        if gerp >= CONSERVATION_CUTOFF {
            evidence.push(
                Evidence::new(
                    EvidenceCode::vicc(ViccCriterion::Op1),
                    "GERP++",
                    format!("Highly conserved position (GERP++ RS {:.2})", gerp),
                    1,
                    0.5,
                )?
                .with_data(json!({ "predictor": "GERP++", "score": gerp })),
            );
        }
    }

    if let Some(loeuf) = first_score(variant, &CONSTRAINT_KEYS) {
        if loeuf <= CONSTRAINT_CUTOFF {
            evidence.push(
                Evidence::new(
                    EvidenceCode::vicc(ViccCriterion::Op1),
                    "gnomAD",
                    format!("Gene highly intolerant to loss of function (LOEUF {:.3})", loeuf),
                    1,
                    0.5,
                )?
                .with_data(json!({ "predictor": "LOEUF", "score": loeuf })),
            );
        }
    }

    if let Some(consensus) = consensus(&votes)? {
        evidence.push(consensus);
    }

    Ok(evidence)
}

fn consensus(votes: &[Vote]) -> Result<Option<Evidence>> {
    if votes.len() < CONSENSUS_MIN_VOTES {
        return Ok(None);
    }
    let pathogenic = votes.iter().filter(|v| **v == Vote::Pathogenic).count();
    let fraction = pathogenic as f64 / votes.len() as f64;
    let payload = json!({ "votes": votes.len(), "pathogenic_votes": pathogenic, "fraction": fraction });

    let evidence = if fraction >= CONSENSUS_PATHOGENIC {
        Evidence::new(
            EvidenceCode::vicc(ViccCriterion::Op1),
            "consensus",
            format!("{}/{} predictors agree on a damaging effect", pathogenic, votes.len()),
            1,
            0.8,
        )?
    } else if fraction <= CONSENSUS_BENIGN {
        Evidence::new(
            EvidenceCode::vicc(ViccCriterion::Sbp1),
            "consensus",
            format!("{}/{} predictors agree on a benign effect", votes.len() - pathogenic, votes.len()),
            -1,
            0.8,
        )?
    } else {
        return Ok(None);
    };
    Ok(Some(evidence.with_data(payload)))
}

fn first_score(variant: &AnnotatedVariant, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| score_for(variant, k))
}

fn score_for(variant: &AnnotatedVariant, key: &str) -> Option<f64> {
    let value = variant.plugin_data.get(key)?;
    let score = parse_score(value);
    if score.is_none() {
        debug!(key, value = %value, variant = %variant.variant_id(), "Skipping non-numeric predictor score");
    }
    score
}

/// Numeric value of a plugin field. Multi-transcript strings such as
/// "0.12&0.87" or "0.3,." resolve to their largest numeric entry.
fn parse_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s
            .split(|c: char| matches!(c, '&' | ',' | '|' | ';'))
            .filter_map(|part| part.trim().parse::<f64>().ok())
            .filter(|f| f.is_finite())
            .reduce(f64::max),
        Value::Array(items) => items.iter().filter_map(parse_score).reduce(f64::max),
        _ => None,
    }
}
