use famms::cli;
use famms::harness;
use famms::logging;

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("famms: {e}");
            eprintln!("Usage: famms [-dq] [-f[<file>]] [-t<time>] [-e<expr>]... [<coord>...]");
            eprintln!("       famms [-dq] [-f[<file>]] [-t<time>] (-p<file> | -l<file>) [-c<func>] [<coord>...]");
            std::process::exit(1);
        }
    };

    logging::init(args.debug, args.quiet);
    tracing::debug!(?args, "starting");

    match harness::run(&args) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Err(e) => {
            eprintln!("famms: {e}");
            std::process::exit(1);
        }
    }
}
