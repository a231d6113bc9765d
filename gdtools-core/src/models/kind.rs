use std::fmt;
use std::str::FromStr;

use crate::errors::GenomeDiffError;

///
/// Every record type a Genome Diff can hold.
///
/// The class of a kind follows from the length of its tag: three letters for
/// mutations, two for evidence, four for validation.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    // mutations
    Snp,
    Sub,
    Del,
    Ins,
    Mob,
    Amp,
    Inv,
    Con,
    // evidence
    Ra,
    Mc,
    Jc,
    Cn,
    Un,
    // validation
    Cura,
    Fpos,
    Phyl,
    Tseq,
    Pflp,
    Rflp,
    Pfge,
    Note,
    Mask,
}

/// Entry classes that can be removed or listed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Mutations,
    Evidence,
    Validation,
}

impl Kind {
    pub const ALL: [Kind; 22] = [
        Kind::Snp,
        Kind::Sub,
        Kind::Del,
        Kind::Ins,
        Kind::Mob,
        Kind::Amp,
        Kind::Inv,
        Kind::Con,
        Kind::Ra,
        Kind::Mc,
        Kind::Jc,
        Kind::Cn,
        Kind::Un,
        Kind::Cura,
        Kind::Fpos,
        Kind::Phyl,
        Kind::Tseq,
        Kind::Pflp,
        Kind::Rflp,
        Kind::Pfge,
        Kind::Note,
        Kind::Mask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Snp => "SNP",
            Kind::Sub => "SUB",
            Kind::Del => "DEL",
            Kind::Ins => "INS",
            Kind::Mob => "MOB",
            Kind::Amp => "AMP",
            Kind::Inv => "INV",
            Kind::Con => "CON",
            Kind::Ra => "RA",
            Kind::Mc => "MC",
            Kind::Jc => "JC",
            Kind::Cn => "CN",
            Kind::Un => "UN",
            Kind::Cura => "CURA",
            Kind::Fpos => "FPOS",
            Kind::Phyl => "PHYL",
            Kind::Tseq => "TSEQ",
            Kind::Pflp => "PFLP",
            Kind::Rflp => "RFLP",
            Kind::Pfge => "PFGE",
            Kind::Note => "NOTE",
            Kind::Mask => "MASK",
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.as_str().len() == 3
    }

    pub fn is_evidence(&self) -> bool {
        self.as_str().len() == 2
    }

    pub fn is_validation(&self) -> bool {
        self.as_str().len() == 4
    }

    /// Mutations plus MASK, the entries that change sequence when applied.
    pub fn is_applied(&self) -> bool {
        self.is_mutation() || *self == Kind::Mask
    }

    pub fn group(&self) -> Group {
        if self.is_mutation() {
            Group::Mutations
        } else if self.is_evidence() {
            Group::Evidence
        } else {
            Group::Validation
        }
    }

    ///
    /// Parse a comma-separated list of type tags, e.g. `SNP,DEL`.
    ///
    pub fn parse_list(list: &str) -> Result<Vec<Kind>, GenomeDiffError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Kind::from_str)
            .collect()
    }
}

impl FromStr for Kind {
    type Err = GenomeDiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| GenomeDiffError::UnknownKind(s.to_string()))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("SNP", Group::Mutations)]
    #[case("RA", Group::Evidence)]
    #[case("CURA", Group::Validation)]
    #[case("MASK", Group::Validation)]
    fn test_kind_group(#[case] tag: &str, #[case] group: Group) {
        let kind: Kind = tag.parse().unwrap();
        assert_eq!(kind.group(), group);
        assert_eq!(kind.to_string(), tag);
    }

    #[rstest]
    fn test_unknown_kind() {
        assert!("XYZ".parse::<Kind>().is_err());
        assert!("snp".parse::<Kind>().is_err());
    }

    #[rstest]
    fn test_parse_list() {
        assert_eq!(
            Kind::parse_list("SNP, DEL,").unwrap(),
            vec![Kind::Snp, Kind::Del]
        );
        assert!(Kind::parse_list("SNP,FOO").is_err());
    }

    #[rstest]
    fn test_mask_is_applied() {
        assert!(Kind::Mask.is_applied());
        assert!(!Kind::Note.is_applied());
    }
}
