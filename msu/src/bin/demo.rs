use fpga::Clocked;
use num_bigint::BigUint;
use tracing_subscriber::EnvFilter;

use vdf_msu::{
    lut::ReductionLuts,
    metzgen::ModTerms,
    testing::{random_input, reference},
    timing::always_timed,
    Job, ModularSquare, ModularSquareMetzgen, Msu, Pins, Squarer, Widths,
};

#[path = "../bin-lib/args.rs"]
mod args;

use args::{Args, Strategy, Subcommand};

fn run_job<S>(core: S, x: &BigUint, iterations: u64) -> vdf_msu::Result<Job>
where
    S: Squarer + Clocked<Inputs = Pins<<S as Squarer>::Value>>,
{
    let mut msu = Msu::new(core)?;
    always_timed(&format!("{} squarings", iterations), || {
        msu.compute(x, iterations)
    })
}

fn run(args: Args) -> vdf_msu::Result<()> {
    let modulus = args.modulus()?;

    match args.subcommand {
        Subcommand::Square(ref square) => {
            let x = match &square.input {
                Some(hex) => args::parse_input(hex)?,
                None => random_input(&modulus),
            };
            if args.verbose {
                println!("sq_in:  {:#x}", x);
            }

            let job = match square.strategy {
                Strategy::A => {
                    let core = ModularSquare::new(args::params(&modulus)?, modulus.clone())?;
                    run_job(core, &x, square.iterations)?
                }
                Strategy::B => {
                    let params = args::metzgen_params(&modulus)?;
                    let core = ModularSquareMetzgen::new(params, modulus.clone())?;
                    run_job(core, &x, square.iterations)?
                }
            };
            let expected = always_timed("reference", || reference(&x, square.iterations, &modulus));

            println!("cycles: {}", job.cycles);
            if args.verbose {
                println!("sq_out: {:#x}", job.sq_out);
                println!("expect: {:#x}", expected);
            }
            if job.sq_out != expected {
                println!("\n==> FAILURE <==");
                std::process::exit(1);
            } else {
                println!("\n==> SUCCESS <==");
            }
        }

        Subcommand::Lut(ref lut) => {
            let params = args::params(&modulus)?;
            let luts = ReductionLuts::new(&params, &modulus);
            let dir = std::path::Path::new(&lut.dir);
            let written = always_timed("writing tables", || luts.write_dat(dir))?;
            println!("wrote {} files to {}", written.len(), dir.display());
            if lut.check {
                always_timed("checking tables", || luts.read_dat(dir))?;
                println!("tables match the modulus");
            }
        }

        Subcommand::Widths(_) => {
            let params = args::params(&modulus)?;
            let widths = Widths::derive(&params, &modulus)?;
            println!("{:#?}", params);
            println!("{:#?}", widths);
            if widths.reduction_acc_bits > widths.nominal_acc_bits {
                println!(
                    "nominal accumulator ({} bits) is narrower than the worst case ({} bits)",
                    widths.nominal_acc_bits, widths.reduction_acc_bits
                );
            }

            let metzgen = args::metzgen_params(&modulus)?;
            let terms = ModTerms::new(&metzgen, &modulus)?;
            let kernel = metzgen.kernel()?;
            println!("{:#?}", metzgen);
            println!(
                "kernel: {:?}, {} DSP slices per symbol, {} on the diagonal",
                kernel,
                kernel.multiplies(),
                kernel.multiplies() * metzgen.num_symbols()
            );
            println!(
                "modulolut6 tables: {}, output bound: {} of {} bits",
                terms.luts().len(),
                terms.bound().bits(),
                metzgen.mod_bit_width()
            );
        }
    }
    Ok(())
}

fn main() {
    let args: Args = argh::from_env();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(error) = run(args) {
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
}
