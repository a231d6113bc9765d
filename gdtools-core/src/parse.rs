//! Reading the Genome Diff text format.
use std::io::BufRead;
use std::path::Path;

use gdtools_refseq::utils::get_dynamic_reader;

use crate::errors::{GenomeDiffError, ParseReport, Result};
use crate::genome_diff::GenomeDiff;
use crate::models::{Kind, Metadata, Record};
use crate::schema::{COMMON_PREFIX_COLUMNS, FieldKind, field_kind, is_base_sequence, required_fields};

const DEPRECATED_KEYS: [(&str, &str); 3] = [
    ("nested_within", "Key 'nested_within' is DEPRECATED and will be ignored. Use 'within' instead."),
    ("nested_copy", "Key 'nested_copy' is DEPRECATED and will be ignored. Use 'within' instead."),
    ("after", "Key 'after' is DEPRECATED and will be ignored. Use 'within' or 'before' instead."),
];

impl Record {
    ///
    /// Parse one tab-delimited data line. Problems are added to `report`;
    /// `None` is returned when the line has no usable type or required fields.
    ///
    pub fn parse_line(line: &str, line_number: usize, report: &mut ParseReport) -> Option<Record> {
        let tokens: Vec<&str> = line.split('\t').map(str::trim).collect();

        if tokens.len() < COMMON_PREFIX_COLUMNS {
            report.add(line_number, line, "Could not determine type, id, or parent_id.", true);
            return None;
        }

        let Ok(kind) = tokens[0].parse::<Kind>() else {
            report.add(line_number, line, "Unknown type for entry.", true);
            return None;
        };

        let mut record = Record::new(kind, tokens[1]);
        record.set("_line_number", line_number);
        if tokens[2] != "." && !tokens[2].is_empty() {
            record.evidence = tokens[2].split(',').map(|e| e.trim().to_string()).collect();
        }

        let required = required_fields(kind);
        if tokens.len() - COMMON_PREFIX_COLUMNS < required.len() {
            report.add(
                line_number,
                line,
                &format!(
                    "Expected {} tab-delimited columns for entry",
                    required.len() + COMMON_PREFIX_COLUMNS
                ),
                true,
            );
            return None;
        }
        for (field, value) in required.iter().zip(&tokens[COMMON_PREFIX_COLUMNS..]) {
            record.set(field, value);
        }

        for token in tokens[COMMON_PREFIX_COLUMNS + required.len()..].iter() {
            if token.is_empty() {
                continue;
            }
            let Some((key, value)) = token.split_once('=') else {
                report.add(
                    line_number,
                    line,
                    &format!("Field {} is not a key=value pair. Ignoring this key.", token),
                    false,
                );
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            record.set(key, value);
            check_key(kind, key, line, line_number, report);
        }

        if kind == Kind::Amp && record.has("mediated") != record.has("mediated_strand") {
            report.add(
                line_number,
                line,
                "Only one key of 'mediated' and 'mediated_strand' is supplied for this AMP. Both must be present to describe the mutation. Did you mean to use 'between' instead?",
                true,
            );
        }

        if record.has("apply_size_adjust")
            && !matches!(kind, Kind::Amp | Kind::Del | Kind::Sub | Kind::Con | Kind::Inv)
        {
            report.add(
                line_number,
                line,
                "Key 'apply_size_adjust' is only allowed for AMP, CON, DEL, INV, and SUB mutations.",
                true,
            );
        }

        Some(record)
    }

    ///
    /// Check every typed field: base sequences must be `[ACGTN]+`, numeric fields
    /// integers, positive where required, strands -1 or 1.
    ///
    pub fn check_field_types(&self, report: &mut ParseReport) {
        for (key, value) in self.fields.iter() {
            let Some(field_type) = field_kind(key) else {
                continue;
            };

            let problem = match field_type {
                FieldKind::BaseSequence => (!is_base_sequence(value))
                    .then(|| "Expected base sequence containing only characters 'ATCGN'"),
                _ => match value.parse::<i64>() {
                    Err(_) => Some("Expected integral value"),
                    Ok(n) => match field_type {
                        FieldKind::PositiveInteger | FieldKind::PositiveIntegerReverseSort
                            if n <= 0 =>
                        {
                            Some("Expected positive integral value")
                        }
                        FieldKind::Strand if n != -1 && n != 1 => {
                            Some("Expected strand value (-1/1)")
                        }
                        _ => None,
                    },
                },
            };

            if let Some(problem) = problem {
                report.add(
                    self.line_number(),
                    &self.to_string(),
                    &format!("{} for field [{}] instead of [{}].", problem, key, value),
                    true,
                );
            }
        }
    }
}

fn check_key(kind: Kind, key: &str, line: &str, line_number: usize, report: &mut ParseReport) {
    let misplaced = match key {
        "mediated" if !matches!(kind, Kind::Del | Kind::Amp | Kind::Sub) => {
            Some("Key 'mediated' is only allowed for entries of type DEL, AMP, or SUB.")
        }
        "mediated_strand" if kind != Kind::Amp => {
            Some("Key 'mediated_strand' is only allowed for entries of type AMP.")
        }
        "between" if !matches!(kind, Kind::Del | Kind::Amp | Kind::Con) => {
            Some("Key 'between' is only allowed for entries of type DEL, AMP, or CON.")
        }
        _ => None,
    };
    if let Some(message) = misplaced {
        report.add(line_number, line, message, true);
    }

    if let Some((_, message)) = DEPRECATED_KEYS.iter().find(|(k, _)| *k == key) {
        report.add(line_number, line, message, false);
    }
}

/// Value of a `#=KEY value...` line: every token after the key, space-joined.
fn header_value(tokens: &[&str]) -> String {
    tokens[1..].join(" ")
}

fn read_header_line(metadata: &mut Metadata, line: &str, line_number: usize, report: &mut ParseReport) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let has_value = tokens.len() > 1;
    let value = match has_value {
        true => header_value(&tokens),
        false => String::new(),
    };

    match tokens.first().copied().unwrap_or_default() {
        "#=GENOME_DIFF" if has_value => metadata.version = value,
        "#=AUTHOR" => metadata.author = value,
        "#=CREATED" => metadata.created = value,
        "#=PROGRAM" => metadata.program = value,
        "#=COMMAND" => metadata.command = value,
        "#=REFSEQ" if has_value => metadata.ref_seqs.push(value),
        "#=READSEQ" if has_value => metadata.add_read_seq(&value),
        "#=ADAPTSEQ" if has_value => metadata.adapter_seqs.push(value),
        "#=TITLE" if has_value => metadata.title = value,
        "#=TIME" if has_value => match value.parse::<f64>() {
            Ok(time) => metadata.time = time,
            Err(_) => report.add(line_number, line, "Could not read #=TIME value as a number.", false),
        },
        "#=POPULATION" if has_value => metadata.population = value.replace(' ', "_"),
        "#=TREATMENT" if has_value => metadata.treatment = value.replace(' ', "_"),
        "#=CLONE" if has_value => metadata.clone = value.replace(' ', "_"),
        key if has_value && key.starts_with("#=") => {
            metadata.set_extension(&key[2..], value);
        }
        _ => report.add(
            line_number,
            line,
            "Metadata header line not recognized and will be ignored.",
            false,
        ),
    }
}

fn default_title(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name.to_string(),
    }
}

impl GenomeDiff {
    ///
    /// Parse Genome Diff lines, collecting every problem into a report.
    ///
    /// Records without a positive integer id get a fresh one once parsing
    /// finishes. `source` names the input in diagnostics.
    ///
    pub fn from_lines<I, S>(lines: I, source: &str) -> (GenomeDiff, ParseReport)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut gd = GenomeDiff::new();
        let mut report = ParseReport::new(source);
        gd.metadata.version = String::new();

        let mut in_header = true;
        for (i, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim_end_matches(['\r', '\n']);
            let line_number = i + 1;

            if in_header {
                if line.starts_with("#=") {
                    read_header_line(&mut gd.metadata, line, line_number, &mut report);
                    continue;
                }
                in_header = false;
                if gd.metadata.version.is_empty() {
                    break;
                }
            }

            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(record) = Record::parse_line(line, line_number, &mut report) else {
                continue;
            };
            record.check_field_types(&mut report);

            if gd.id_in_use(&record.id) {
                report.add(line_number, &record.to_string(), "ID for this entry is not unique.", true);
            }
            gd.add(record, false);
        }

        if gd.metadata.version.is_empty() {
            report.add(1, "", "No #=GENOME_DIFF XX header line in this file.", true);
            return (gd, report);
        }

        if let Err(e) = gd.sort_and_check_for_duplicates(Some(&mut report)) {
            report.add(0, "", &e.to_string(), true);
        }

        for record in gd.entries.iter_mut() {
            if !Record::is_valid_id(&record.id) {
                record.id = String::new();
            }
        }
        let unassigned: Vec<usize> = gd
            .entries
            .iter()
            .enumerate()
            .filter(|(_, r)| r.id.is_empty())
            .map(|(i, _)| i)
            .collect();
        for i in unassigned {
            let id = gd.new_unique_id();
            gd.mark_id_used(&id);
            gd.entries[i].id = id;
        }

        (gd, report)
    }

    ///
    /// Read a Genome Diff file (optionally gzipped), returning the report
    /// rather than failing on fatal problems.
    ///
    pub fn read_with_report<P: AsRef<Path>>(path: P) -> Result<(GenomeDiff, ParseReport)> {
        let path = path.as_ref();
        let reader = get_dynamic_reader(path)?;
        let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;

        let (mut gd, report) = GenomeDiff::from_lines(lines, &path.display().to_string());
        if gd.metadata.title.is_empty() {
            gd.metadata.title = default_title(path);
        }
        gd.file_path = Some(path.to_path_buf());
        Ok((gd, report))
    }

    ///
    /// Read a Genome Diff file. Advisory problems are logged; any fatal problem
    /// fails the whole read.
    ///
    pub fn read<P: AsRef<Path>>(path: P) -> Result<GenomeDiff> {
        let (gd, report) = GenomeDiff::read_with_report(path)?;
        finish(gd, report)
    }

    pub fn parse_str(text: &str) -> Result<GenomeDiff> {
        let (gd, report) = GenomeDiff::from_lines(text.lines(), "<string>");
        finish(gd, report)
    }
}

fn finish(gd: GenomeDiff, report: ParseReport) -> Result<GenomeDiff> {
    report.log_issues();
    if report.is_fatal() {
        return Err(GenomeDiffError::Parse(report));
    }
    Ok(gd)
}
