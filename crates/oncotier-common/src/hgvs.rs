//! HGVS protein notation parsing.
//!
//! Accepts the notations knowledge bases and annotators actually emit
//! ("p.Val600Glu", "p.V600E", "V600E", "p.(Arg213Ter)", "p.Lys12fs") and
//! exposes the amino-acid position plus a canonical short form used when
//! matching against curated variant-drug associations.
//!
//! # Example
//! ```
//! use oncotier_common::hgvs::{ProteinChange, to_short_form};
//! let pc = ProteinChange::parse("p.Val600Glu").unwrap();
//! assert_eq!(pc.position, 600);
//! assert_eq!(to_short_form("p.Val600Glu").as_deref(), Some("V600E"));
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Three-letter → single-letter amino acid code.
pub fn aa3_to_aa1(aa: &str) -> Option<char> {
    match aa.to_lowercase().as_str() {
        "ala" => Some('A'), "cys" => Some('C'), "asp" => Some('D'),
        "glu" => Some('E'), "phe" => Some('F'), "gly" => Some('G'),
        "his" => Some('H'), "ile" => Some('I'), "lys" => Some('K'),
        "leu" => Some('L'), "met" => Some('M'), "asn" => Some('N'),
        "pro" => Some('P'), "gln" => Some('Q'), "arg" => Some('R'),
        "ser" => Some('S'), "thr" => Some('T'), "val" => Some('V'),
        "trp" => Some('W'), "tyr" => Some('Y'), "ter" | "stop" | "*" => Some('*'),
        _ => None,
    }
}

/// Resolve a one- or three-letter residue token to its single-letter code.
fn residue_code(token: &str) -> Option<char> {
    if token.len() == 1 {
        let c = token.chars().next()?.to_ascii_uppercase();
        if c == '*' || (c.is_ascii_alphabetic() && aa3_from_aa1(c).is_some()) {
            return Some(c);
        }
        return None;
    }
    aa3_to_aa1(token)
}

fn aa3_from_aa1(c: char) -> Option<&'static str> {
    match c {
        'A' => Some("Ala"), 'C' => Some("Cys"), 'D' => Some("Asp"),
        'E' => Some("Glu"), 'F' => Some("Phe"), 'G' => Some("Gly"),
        'H' => Some("His"), 'I' => Some("Ile"), 'K' => Some("Lys"),
        'L' => Some("Leu"), 'M' => Some("Met"), 'N' => Some("Asn"),
        'P' => Some("Pro"), 'Q' => Some("Gln"), 'R' => Some("Arg"),
        'S' => Some("Ser"), 'T' => Some("Thr"), 'V' => Some("Val"),
        'W' => Some("Trp"), 'Y' => Some("Tyr"), '*' => Some("Ter"),
        _ => None,
    }
}

fn re_protein() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // p.Val600Glu, p.V600E, V600E, p.(Arg213Ter), p.Lys12fs, p.Gly12_Gly13del
    RE.get_or_init(|| {
        Regex::new(r"^(?:p\.)?\(?([A-Z][a-z]{2}|[A-Z\*])(\d+)(.*?)\)?$").expect("static regex")
    })
}

/// Parsed protein-level change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProteinChange {
    /// Reference residue, single-letter code
    pub ref_aa: char,
    /// 1-based amino-acid position
    pub position: u32,
    /// Alternate residue for substitutions; None for frameshifts, indels, etc.
    pub alt_aa: Option<char>,
    /// Trailing descriptor for non-substitutions, e.g. "fs", "_Gly13del"
    pub suffix: String,
}

impl ProteinChange {
    /// Parse a protein change. Returns `None` when the notation has no
    /// recoverable position (e.g. "p.?", "p.=", free text).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        // Strip a transcript prefix such as "ENSP00000288602.6:"
        let raw = raw.rsplit(':').next().unwrap_or(raw);
        let caps = re_protein().captures(raw)?;

        let ref_aa = residue_code(caps.get(1)?.as_str())?;
        let position: u32 = caps.get(2)?.as_str().parse().ok()?;
        let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("");

        let alt_aa = match rest {
            "" => None,
            r if r.len() == 3 && r.chars().next().is_some_and(|c| c.is_ascii_uppercase()) => aa3_to_aa1(r),
            r if r.len() == 1 => residue_code(r),
            _ => None,
        };
        let suffix = if alt_aa.is_some() { String::new() } else { rest.to_string() };

        Some(Self { ref_aa, position, alt_aa, suffix })
    }

    /// Single-letter short form, e.g. "V600E", "R213*", "K12fs".
    pub fn short_form(&self) -> String {
        match self.alt_aa {
            Some(alt) => format!("{}{}{}", self.ref_aa, self.position, alt),
            None => format!("{}{}{}", self.ref_aa, self.position, self.suffix),
        }
    }

    /// Canonical three-letter HGVS form for substitutions, e.g. "p.Val600Glu".
    pub fn hgvs_p(&self) -> Option<String> {
        let ref3 = aa3_from_aa1(self.ref_aa)?;
        let alt3 = aa3_from_aa1(self.alt_aa?)?;
        Some(format!("p.{}{}{}", ref3, self.position, alt3))
    }
}

/// Convert any supported notation to its single-letter short form.
pub fn to_short_form(raw: &str) -> Option<String> {
    ProteinChange::parse(raw).map(|pc| pc.short_form())
}

/// Amino-acid position from a protein notation.
pub fn protein_position(raw: &str) -> Option<u32> {
    ProteinChange::parse(raw).map(|pc| pc.position)
}

/// Whether two notations describe the same protein change.
pub fn same_protein_change(a: &str, b: &str) -> bool {
    match (to_short_form(a), to_short_form(b)) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(&y),
        _ => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
