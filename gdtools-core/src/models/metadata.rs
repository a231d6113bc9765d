use std::collections::BTreeMap;

pub const DEFAULT_VERSION: &str = "1.0";

///
/// Document-level header of a Genome Diff (`#=KEY value` lines).
///
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub version: String,
    pub title: String,
    pub author: String,
    pub created: String,
    pub program: String,
    pub command: String,
    /// -1 when unset
    pub time: f64,
    pub population: String,
    pub treatment: String,
    pub clone: String,
    pub ref_seqs: Vec<String>,
    pub read_seqs: Vec<String>,
    pub adapter_seqs: Vec<String>,
    pub adapters_for_reads: BTreeMap<String, String>,
    pub reads_by_pair: Vec<Vec<String>>,
    /// Unrecognized `#=KEY value` lines, kept for round-tripping.
    pub extensions: BTreeMap<String, String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            version: DEFAULT_VERSION.to_string(),
            title: String::new(),
            author: String::new(),
            created: String::new(),
            program: String::new(),
            command: String::new(),
            time: -1.0,
            population: String::new(),
            treatment: String::new(),
            clone: String::new(),
            ref_seqs: Vec::new(),
            read_seqs: Vec::new(),
            adapter_seqs: Vec::new(),
            adapters_for_reads: BTreeMap::new(),
            reads_by_pair: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }
}

///
/// Name of the other read file of a pair: `_R1` becomes `_R2` and vice versa.
///
fn paired_read_name(read_name: &str) -> String {
    if let Some(pos) = read_name.find("_R1") {
        let mut name = read_name.to_string();
        name.replace_range(pos + 2..pos + 3, "2");
        name
    } else if let Some(pos) = read_name.find("_R2") {
        let mut name = read_name.to_string();
        name.replace_range(pos + 2..pos + 3, "1");
        name
    } else {
        read_name.to_string()
    }
}

impl Metadata {
    ///
    /// Record a read file, attaching the latest adapter and grouping it with
    /// its paired-end partner when that was seen already.
    ///
    pub fn add_read_seq(&mut self, read_name: &str) {
        self.read_seqs.push(read_name.to_string());
        if let Some(adapter) = self.adapter_seqs.last() {
            self.adapters_for_reads
                .insert(read_name.to_string(), adapter.clone());
        }

        let pair_name = paired_read_name(read_name);
        match self
            .reads_by_pair
            .iter_mut()
            .find(|group| group.iter().any(|r| *r == pair_name))
        {
            Some(group) => group.push(read_name.to_string()),
            None => self.reads_by_pair.push(vec![read_name.to_string()]),
        }
    }

    pub fn set_extension(&mut self, key: &str, value: impl ToString) {
        self.extensions.insert(key.to_string(), value.to_string());
    }

    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).map(String::as_str)
    }

    ///
    /// Header lines in output order.
    ///
    pub fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("#=GENOME_DIFF\t{}", self.version)];

        let singles = [
            ("TITLE", &self.title),
            ("AUTHOR", &self.author),
            ("CREATED", &self.created),
            ("PROGRAM", &self.program),
            ("COMMAND", &self.command),
        ];
        for (key, value) in singles {
            if !value.is_empty() {
                lines.push(format!("#={}\t{}", key, value));
            }
        }
        if self.time != -1.0 {
            lines.push(format!("#=TIME\t{}", self.time));
        }
        for (key, value) in [
            ("POPULATION", &self.population),
            ("TREATMENT", &self.treatment),
            ("CLONE", &self.clone),
        ] {
            if !value.is_empty() {
                lines.push(format!("#={}\t{}", key, value));
            }
        }

        lines.extend(self.ref_seqs.iter().map(|r| format!("#=REFSEQ\t{}", r)));
        lines.extend(self.adapter_seqs.iter().map(|a| format!("#=ADAPTSEQ\t{}", a)));
        lines.extend(self.read_seqs.iter().map(|r| format!("#=READSEQ\t{}", r)));
        lines.extend(
            self.extensions
                .iter()
                .map(|(k, v)| format!("#={}\t{}", k, v)),
        );

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_read_pairs() {
        let mut metadata = Metadata::default();
        metadata.adapter_seqs.push("adapters.fa".to_string());
        metadata.add_read_seq("sample_R1.fastq");
        metadata.add_read_seq("other.fastq");
        metadata.add_read_seq("sample_R2.fastq");

        assert_eq!(
            metadata.reads_by_pair,
            vec![
                vec!["sample_R1.fastq".to_string(), "sample_R2.fastq".to_string()],
                vec!["other.fastq".to_string()],
            ]
        );
        assert_eq!(
            metadata.adapters_for_reads.get("other.fastq").map(String::as_str),
            Some("adapters.fa")
        );
    }

    #[rstest]
    fn test_header_lines_order() {
        let mut metadata = Metadata::default();
        metadata.title = "clone_A".to_string();
        metadata.time = 1500.0;
        metadata.ref_seqs.push("REL606.gbk".to_string());
        metadata.set_extension("BASES-CHANGED", 3);

        assert_eq!(
            metadata.header_lines(),
            vec![
                "#=GENOME_DIFF\t1.0",
                "#=TITLE\tclone_A",
                "#=TIME\t1500",
                "#=REFSEQ\tREL606.gbk",
                "#=BASES-CHANGED\t3",
            ]
        );
    }
}
