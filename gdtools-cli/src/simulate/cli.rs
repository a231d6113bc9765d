use clap::{Arg, Command, arg, value_parser};

use crate::common::{config_arg, i64_arg, output_arg, reference_arg};

pub const SIMULATE_CMD: &str = "simulate-mutations";

pub fn create_simulate_cli() -> Command {
    Command::new(SIMULATE_CMD)
        .about("Generate random mutations of one type on the first reference sequence.")
        .arg_required_else_help(true)
        .arg(reference_arg())
        .arg(output_arg("Genome Diff file of simulated mutations"))
        .arg(
            Arg::new("type")
                .short('t')
                .long("type")
                .value_name("TYPE")
                .required(true)
                .help("Mutation type and sizes: SNP, INS:1-10, DEL:5, AMP:100-200:2-4, MOB:5-9"),
        )
        .arg(
            arg!(-n --number <number> "Number of mutations to generate")
                .value_parser(value_parser!(usize))
                .default_value("1000"),
        )
        .arg(i64_arg(arg!(-b --buffer <buffer> "Bases kept between mutations and repeats")).default_value("50"))
        .arg(arg!(-s --seed <seed> "Seed for the random number generator").value_parser(value_parser!(u64)))
        .arg(config_arg())
}
