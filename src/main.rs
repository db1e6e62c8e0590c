fn main() {
    use clap::Parser;
    use std::error::Error;
    let args = scandl::cli::Args::parse();
    let progress = scandl::logging::ProgressSlot::new();
    if let Err(e) = scandl::logging::init(args.log_level(), &progress) {
        eprintln!("{}", e);
    }
    if let Err(e) = scandl::cli::run(&args, &progress) {
        eprintln!("{}", e);
        if args.verbose {
            let mut source = e.source();
            while let Some(s) = source {
                eprintln!("  cause: {}", s);
                source = s.source();
            }
        }
        std::process::exit(e.exit_code());
    }
}
