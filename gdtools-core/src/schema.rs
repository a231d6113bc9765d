//! Static field tables for every record kind.
use crate::models::Kind;

/// Value classes of fields that are type-checked and compared numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    BaseSequence,
    Integer,
    PositiveInteger,
    PositiveIntegerReverseSort,
    Strand,
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, FieldKind::BaseSequence)
    }
}

/// Three-level output grouping for a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub bucket: u8,
    pub primary: &'static str,
    pub secondary: &'static str,
}

/// Fields checked for equality on every kind.
pub const UNIQUENESS_FIELDS: [&str; 3] = ["phylogeny_id", "unique", "population_id"];

/// Keys whose value starts with the id of another mutation (`id` or `id:copy`).
pub const ID_REFERENCE_KEYS: [&str; 2] = ["before", "within"];

/// Number of columns before the kind-specific fields: type, id and evidence.
pub const COMMON_PREFIX_COLUMNS: usize = 3;

const PRIMERS: [&str; 5] = [
    "seq_id",
    "primer_1_start",
    "primer_1_end",
    "primer_2_start",
    "primer_2_end",
];

///
/// Fields written positionally, in order, after the common prefix columns.
///
pub fn required_fields(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Snp => &["seq_id", "position", "new_seq"],
        Kind::Sub => &["seq_id", "position", "size", "new_seq"],
        Kind::Del => &["seq_id", "position", "size"],
        Kind::Ins => &["seq_id", "position", "new_seq"],
        Kind::Mob => &["seq_id", "position", "repeat_name", "strand", "duplication_size"],
        Kind::Inv => &["seq_id", "position", "size"],
        Kind::Amp => &["seq_id", "position", "size", "new_copy_number"],
        Kind::Con => &["seq_id", "position", "size", "region"],
        Kind::Ra => &["seq_id", "position", "insert_position", "ref_base", "new_base"],
        Kind::Mc => &["seq_id", "start", "end", "start_range", "end_range"],
        Kind::Jc => &[
            "side_1_seq_id",
            "side_1_position",
            "side_1_strand",
            "side_2_seq_id",
            "side_2_position",
            "side_2_strand",
            "overlap",
        ],
        Kind::Cn => &["seq_id", "start", "end", "copy_number"],
        Kind::Un => &["seq_id", "start", "end"],
        Kind::Cura | Kind::Fpos => &["expert"],
        Kind::Phyl => &["gd"],
        Kind::Tseq | Kind::Pflp | Kind::Rflp => &PRIMERS,
        Kind::Pfge => &["seq_id", "enzyme"],
        Kind::Note => &["note"],
        Kind::Mask => &["seq_id", "position", "size"],
    }
}

///
/// Fields that decide whether two records describe the same thing. Includes
/// optional fields which may be absent on a given record.
///
pub fn extended_fields(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Ins => &["seq_id", "position", "insert_position", "new_seq"],
        Kind::Mob => &[
            "seq_id",
            "position",
            "repeat_name",
            "strand",
            "duplication_size",
            "ins_start",
            "ins_end",
            "del_start",
            "del_end",
            "mob_region",
        ],
        Kind::Amp => &[
            "seq_id",
            "position",
            "size",
            "new_copy_number",
            "mediated",
            "mediated_strand",
            "mob_region",
        ],
        Kind::Jc => &[
            "side_1_seq_id",
            "side_1_position",
            "side_1_strand",
            "side_2_seq_id",
            "side_2_position",
            "side_2_strand",
            "overlap",
            "unique_read_sequence",
        ],
        _ => required_fields(kind),
    }
}

pub fn field_kind(field: &str) -> Option<FieldKind> {
    let kind = match field {
        "position" | "start" | "end" | "new_copy_number" | "del_start" | "del_end"
        | "side_1_position" | "side_2_position" => FieldKind::PositiveInteger,
        "size" => FieldKind::PositiveIntegerReverseSort,
        "strand" | "mediated_strand" | "side_1_strand" | "side_2_strand" => FieldKind::Strand,
        "new_seq" | "ins_start" | "ins_end" | "unique_read_sequence" => FieldKind::BaseSequence,
        "duplication_size" | "insert_position" | "overlap" => FieldKind::Integer,
        _ => return None,
    };
    Some(kind)
}

pub fn sort_key(kind: Kind) -> SortKey {
    let (bucket, primary, secondary) = match kind {
        Kind::Snp
        | Kind::Sub
        | Kind::Del
        | Kind::Ins
        | Kind::Mob
        | Kind::Amp
        | Kind::Inv
        | Kind::Con => (1, "seq_id", "position"),
        Kind::Note => (2, "note", "note"),
        Kind::Ra => (3, "seq_id", "position"),
        Kind::Mc => (4, "seq_id", "start"),
        Kind::Jc => (5, "side_1_seq_id", "side_1_position"),
        Kind::Cn => (6, "seq_id", "start"),
        Kind::Un => (7, "seq_id", "start"),
        Kind::Cura | Kind::Fpos => (8, "expert", "expert"),
        Kind::Phyl => (8, "gd", "gd"),
        Kind::Tseq | Kind::Pflp | Kind::Rflp => (8, "seq_id", "primer_1_start"),
        Kind::Pfge => (8, "seq_id", "enzyme"),
        Kind::Mask => (8, "seq_id", "position"),
    };
    SortKey {
        bucket,
        primary,
        secondary,
    }
}

/// Tie-break among kinds at the same location.
pub fn output_priority(kind: Kind) -> u8 {
    match kind {
        Kind::Del => 1,
        Kind::Snp => 2,
        Kind::Ins => 3,
        Kind::Sub => 4,
        Kind::Mob => 5,
        Kind::Amp => 6,
        Kind::Inv => 7,
        Kind::Con => 8,
        Kind::Ra => 9,
        Kind::Mc => 10,
        Kind::Jc => 11,
        Kind::Cn => 12,
        Kind::Un => 13,
        Kind::Cura => 14,
        Kind::Fpos => 15,
        Kind::Phyl => 16,
        Kind::Tseq => 17,
        Kind::Pflp => 18,
        Kind::Rflp => 19,
        Kind::Pfge | Kind::Note | Kind::Mask => 20,
    }
}

/// `[ACGTN]+`
pub fn is_base_sequence(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T' | b'N'))
}
