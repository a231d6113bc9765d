//! Gene overlap annotation of mutations.
use gdtools_refseq::{Feature, ReferenceSequences};

use crate::coords::reference_span;
use crate::errors::Result;
use crate::genome_diff::GenomeDiff;
use crate::models::Record;

pub const INTERGENIC: &str = "intergenic";

fn is_pseudogene(feature: &Feature) -> bool {
    feature.attributes.get("pseudo").is_some_and(|v| v == "true")
        || feature.attributes.contains_key("pseudogene")
}

// gene and CDS records for the same locus are reported once
fn push_unique(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

///
/// Set `gene_name`, `locus_tag` and `gene_product` on one mutation from the
/// genes it overlaps. Mutations hitting no gene are `intergenic`.
///
pub fn annotate_record(
    record: &mut Record,
    refs: &ReferenceSequences,
    ignore_pseudogenes: bool,
) -> Result<()> {
    let (start, end) = reference_span(record)?;
    let seq = refs.get(record.seq_id()?)?;

    let mut names = Vec::new();
    let mut locus_tags = Vec::new();
    let mut products = Vec::new();
    let genes = seq
        .features
        .iter()
        .filter(|f| matches!(f.feature_type.as_str(), "gene" | "CDS"))
        .filter(|f| !(ignore_pseudogenes && is_pseudogene(f)))
        .filter(|f| f.overlaps(start.position, end.position));
    for gene in genes {
        push_unique(&mut names, &gene.name);
        push_unique(&mut locus_tags, gene.accession.as_deref().unwrap_or_default());
        push_unique(&mut products, gene.product.as_deref().unwrap_or_default());
    }

    if names.is_empty() {
        record.set("gene_name", INTERGENIC);
        record.remove("locus_tag");
        record.remove("gene_product");
        return Ok(());
    }
    record.set("gene_name", names.join(","));
    for (key, values) in [("locus_tag", locus_tags), ("gene_product", products)] {
        if values.is_empty() {
            record.remove(key);
        } else {
            record.set(key, values.join(","));
        }
    }
    Ok(())
}

impl GenomeDiff {
    /// Annotate every mutation with the genes it overlaps.
    pub fn annotate_mutations(
        &mut self,
        refs: &ReferenceSequences,
        ignore_pseudogenes: bool,
    ) -> Result<()> {
        let mut annotated = 0;
        for record in self.entries.iter_mut().filter(|r| r.is_mutation()) {
            annotate_record(record, refs, ignore_pseudogenes)?;
            annotated += 1;
        }
        log::info!("Annotated {} mutations", annotated);
        Ok(())
    }
}
