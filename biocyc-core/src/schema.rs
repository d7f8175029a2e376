//! Entity kinds and the attribute schema.
//!
//! Attribute access is dispatched through an explicit enumerated schema:
//! every attribute has a declared shape and a set of kinds it applies to.
//! The remote service exposes many more slots than are listed here; only
//! the attributes this client understands are retained from payloads.

use crate::identity::FrameId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// ENTITY KINDS
// ============================================================================

/// Record kind, derived from the upstream schema class of a payload.
/// `Unknown` until the record has been fetched at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Compound,
    Protein,
    Gene,
    Reaction,
    Pathway,
    Organism,
    Unknown,
}

impl EntityKind {
    /// Map an upstream schema class name onto a kind. Enzymatic reactions
    /// are plain reactions for this client's purposes; classes with no
    /// counterpart here stay `Unknown`.
    pub fn from_schema_class(class: &str) -> Self {
        match class {
            "Compound" => Self::Compound,
            "Protein" => Self::Protein,
            "Gene" => Self::Gene,
            "Reaction" | "EnzymaticReaction" => Self::Reaction,
            "Pathway" => Self::Pathway,
            "Organism" => Self::Organism,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compound => "Compound",
            Self::Protein => "Protein",
            Self::Gene => "Gene",
            Self::Reaction => "Reaction",
            Self::Pathway => "Pathway",
            Self::Organism => "Organism",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ATTRIBUTE NAMES AND SHAPES
// ============================================================================

/// The attributes this client understands, across all entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttrName {
    Name,
    Synonyms,
    DbLinks,
    Inchi,
    MolecularWeight,
    Gibbs0,
    Parents,
    Instances,
    ReactionsLeft,
    ReactionsRight,
    Pathways,
    SuperPathways,
    Species,
    TaxonomicRange,
}

/// Value shape an attribute is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrShape {
    /// Single text value.
    Text,
    /// Single numeric value.
    Float,
    /// List of text values.
    TextList,
    /// Ordered list of frame-id references to other entities.
    RefList,
    /// Cross-reference database name to external identifier.
    Links,
}

impl AttrName {
    pub const ALL: [AttrName; 14] = [
        AttrName::Name,
        AttrName::Synonyms,
        AttrName::DbLinks,
        AttrName::Inchi,
        AttrName::MolecularWeight,
        AttrName::Gibbs0,
        AttrName::Parents,
        AttrName::Instances,
        AttrName::ReactionsLeft,
        AttrName::ReactionsRight,
        AttrName::Pathways,
        AttrName::SuperPathways,
        AttrName::Species,
        AttrName::TaxonomicRange,
    ];

    /// Declared shape of this attribute.
    pub fn shape(self) -> AttrShape {
        match self {
            Self::Name | Self::Inchi => AttrShape::Text,
            Self::MolecularWeight | Self::Gibbs0 => AttrShape::Float,
            Self::Synonyms => AttrShape::TextList,
            Self::DbLinks => AttrShape::Links,
            Self::Parents
            | Self::Instances
            | Self::ReactionsLeft
            | Self::ReactionsRight
            | Self::Pathways
            | Self::SuperPathways
            | Self::Species
            | Self::TaxonomicRange => AttrShape::RefList,
        }
    }

    /// Slot name used by the upstream payload format.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Name => "common-name",
            Self::Synonyms => "synonym",
            Self::DbLinks => "dblink",
            Self::Inchi => "inchi",
            Self::MolecularWeight => "molecular-weight",
            Self::Gibbs0 => "gibbs-0",
            Self::Parents => "parent",
            Self::Instances => "instance",
            Self::ReactionsLeft => "appears-in-left-side-of",
            Self::ReactionsRight => "appears-in-right-side-of",
            Self::Pathways => "in-pathway",
            Self::SuperPathways => "super-pathways",
            Self::Species => "species",
            Self::TaxonomicRange => "taxonomic-range",
        }
    }

    /// Inverse of [`wire_name`](Self::wire_name). Unrecognized slots are
    /// skipped by payload conversion, not errors.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.wire_name() == name)
    }

    pub fn as_str(self) -> &'static str {
        self.wire_name()
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ATTRIBUTE VALUES
// ============================================================================

/// A raw attribute value as stored in `raw_attributes` and in cache
/// records. Reference lists hold unresolved frame ids only; resolution
/// into entities happens lazily and is memoized elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Text(String),
    Float(f64),
    TextList(Vec<String>),
    RefList(Vec<FrameId>),
    Links(BTreeMap<String, String>),
}

impl AttrValue {
    pub fn shape(&self) -> AttrShape {
        match self {
            Self::Text(_) => AttrShape::Text,
            Self::Float(_) => AttrShape::Float,
            Self::TextList(_) => AttrShape::TextList,
            Self::RefList(_) => AttrShape::RefList,
            Self::Links(_) => AttrShape::Links,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            Self::TextList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref_list(&self) -> Option<&[FrameId]> {
        match self {
            Self::RefList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_links(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Links(v) => Some(v),
            _ => None,
        }
    }
}

// ============================================================================
// PER-KIND SCHEMA
// ============================================================================

const COMMON_ATTRS: [AttrName; 5] = [
    AttrName::Name,
    AttrName::Synonyms,
    AttrName::DbLinks,
    AttrName::Parents,
    AttrName::Instances,
];

const COMPOUND_ATTRS: [AttrName; 5] = [
    AttrName::Inchi,
    AttrName::MolecularWeight,
    AttrName::Gibbs0,
    AttrName::ReactionsLeft,
    AttrName::ReactionsRight,
];

const REACTION_ATTRS: [AttrName; 1] = [AttrName::Pathways];

const PATHWAY_ATTRS: [AttrName; 3] = [
    AttrName::SuperPathways,
    AttrName::Species,
    AttrName::TaxonomicRange,
];

/// Whether `attr` is part of `kind`'s schema. Every kind carries the
/// common attributes; `Unknown` accepts everything because the kind has
/// not been resolved yet.
pub fn is_applicable(kind: EntityKind, attr: AttrName) -> bool {
    if COMMON_ATTRS.contains(&attr) {
        return true;
    }
    match kind {
        EntityKind::Compound => COMPOUND_ATTRS.contains(&attr),
        EntityKind::Reaction => REACTION_ATTRS.contains(&attr),
        EntityKind::Pathway => PATHWAY_ATTRS.contains(&attr),
        EntityKind::Protein | EntityKind::Gene | EntityKind::Organism => false,
        EntityKind::Unknown => true,
    }
}

// ============================================================================
// CROSS-REFERENCE URLS
// ============================================================================

/// External databases we can build browse URLs for, from a dblink entry.
/// `%s` is replaced with the external identifier.
const DBLINK_URLS: [(&str, &str); 11] = [
    ("BIOPATH", "http://www.molecular-networks.com/biopath3/biopath/mols/%s"),
    ("CAS", "http://www.commonchemistry.org/ChemicalDetail.aspx?ref=%s"),
    ("CHEBI", "http://www.ebi.ac.uk/chebi/searchId.do?chebiId=CHEBI:%s"),
    ("CHEMSPIDER", "http://www.chemspider.com/%s"),
    ("HMDB", "http://www.hmdb.ca/compounds/%s"),
    ("KEGG", "http://www.genome.ad.jp/dbget-bin/www_bget?%s"),
    ("KNAPSACK", "http://kanaya.naist.jp/knapsack_jsp/information.jsp?sname=C_ID&word=%s"),
    ("LIGAND-CPD", "http://www.genome.ad.jp/dbget-bin/www_bget?%s"),
    ("NCBI-TAXONOMY-DB", "http://www.ncbi.nlm.nih.gov/Taxonomy/Browser/wwwtax.cgi?mode=Info&id=%s"),
    ("PUBCHEM", "http://pubchem.ncbi.nlm.nih.gov/summary/summary.cgi?cid=%s"),
    ("UNIPROT", "http://www.uniprot.org/uniprot/%s"),
];

/// Browse URL for a cross-reference, if the database is known.
pub fn dblink_url(db: &str, external_id: &str) -> Option<String> {
    DBLINK_URLS
        .iter()
        .find(|(name, _)| *name == db)
        .map(|(_, template)| template.replace("%s", external_id))
}
