mod annotate;
mod apply;
mod common;
mod compare;
mod count;
mod filter;
mod gd2gvf;
mod intersect;
mod mask;
mod merge;
mod normalize;
mod not_evidence;
mod simulate;
mod subtract;
mod union;
mod validate;
mod vcf2gd;
mod weights;

use anyhow::Result;
use clap::{ArgAction, Command, arg};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "gdtools";
    pub const BIN_NAME: &str = "gdtools";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Manipulate Genome Diff (*.gd) files: apply, compare, merge and convert mutation records.")
        .subcommand_required(true)
        .arg(
            arg!(-v --verbose "Log debugging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        // general
        .subcommand(apply::cli::create_apply_cli())
        .subcommand(compare::cli::create_compare_cli())
        .subcommand(not_evidence::cli::create_not_evidence_cli())
        .subcommand(annotate::cli::create_annotate_cli())
        .subcommand(normalize::cli::create_normalize_cli())
        .subcommand(filter::cli::create_filter_cli())
        .subcommand(mask::cli::create_mask_cli())
        .subcommand(merge::cli::create_merge_cli())
        .subcommand(weights::cli::create_weights_cli())
        .subcommand(count::cli::create_count_cli())
        .subcommand(validate::cli::create_validate_cli())
        .subcommand(simulate::cli::create_simulate_cli())
        // format conversions
        .subcommand(gd2gvf::cli::create_gd2gvf_cli())
        .subcommand(vcf2gd::cli::create_vcf2gd_cli())
        // set operations
        .subcommand(subtract::cli::create_subtract_cli())
        .subcommand(intersect::cli::create_intersect_cli())
        .subcommand(union::cli::create_union_cli())
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp_secs().init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();
    init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some((apply::cli::APPLY_CMD, matches)) => apply::handlers::run_apply(matches)?,
        Some((compare::cli::COMPARE_CMD, matches)) => compare::handlers::run_compare(matches)?,
        Some((not_evidence::cli::NOT_EVIDENCE_CMD, matches)) => {
            not_evidence::handlers::run_not_evidence(matches)?
        }
        Some((annotate::cli::ANNOTATE_CMD, matches)) => annotate::handlers::run_annotate(matches)?,
        Some((normalize::cli::NORMALIZE_CMD, matches)) => {
            normalize::handlers::run_normalize(matches)?
        }
        Some((filter::cli::FILTER_CMD, matches)) => filter::handlers::run_filter(matches)?,
        Some((mask::cli::MASK_CMD, matches)) => mask::handlers::run_mask(matches)?,
        Some((merge::cli::MERGE_CMD, matches)) => merge::handlers::run_merge(matches)?,
        Some((weights::cli::WEIGHTS_CMD, matches)) => weights::handlers::run_weights(matches)?,
        Some((count::cli::COUNT_CMD, matches)) => count::handlers::run_count(matches)?,
        Some((validate::cli::VALIDATE_CMD, matches)) => validate::handlers::run_validate(matches)?,
        Some((simulate::cli::SIMULATE_CMD, matches)) => simulate::handlers::run_simulate(matches)?,

        //
        // FORMAT CONVERSIONS
        //
        Some((gd2gvf::cli::GD2GVF_CMD, matches)) => gd2gvf::handlers::run_gd2gvf(matches)?,
        Some((vcf2gd::cli::VCF2GD_CMD, matches)) => vcf2gd::handlers::run_vcf2gd(matches)?,

        //
        // SET OPERATIONS
        //
        Some((subtract::cli::SUBTRACT_CMD, matches)) => subtract::handlers::run_subtract(matches)?,
        Some((intersect::cli::INTERSECT_CMD, matches)) => {
            intersect::handlers::run_intersect(matches)?
        }
        Some((union::cli::UNION_CMD, matches)) => union::handlers::run_union(matches)?,

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
