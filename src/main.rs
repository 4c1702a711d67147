use clap::Parser;
use pinvault::cli::{init_tracing, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Add {
            ref name,
            ref digits,
            ref pattern,
            fill,
        } => pinvault::cli::commands::add::execute(
            &cli,
            name,
            digits.as_deref(),
            pattern.as_deref(),
            fill,
        ),
        Commands::Show { ref name } => pinvault::cli::commands::show::execute(&cli, name),
        Commands::List => pinvault::cli::commands::list::execute(&cli),
        Commands::Delete { ref name, force } => {
            pinvault::cli::commands::delete::execute(&cli, name, force)
        }
        Commands::Export {
            ref name,
            ref output,
        } => pinvault::cli::commands::export::execute(&cli, name.as_deref(), output.as_deref()),
        Commands::Import { ref file } => pinvault::cli::commands::import_cmd::execute(&cli, file),
    };

    if let Err(e) = result {
        pinvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
