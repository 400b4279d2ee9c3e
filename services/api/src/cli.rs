use crate::server;
use clap::{Args, Parser, Subcommand};
use edumarket::accounts::PasswordHasher;
use edumarket::config::AppConfig;
use edumarket::error::{AppError, ServiceError};

#[derive(Parser, Debug)]
#[command(
    name = "Edumarket",
    about = "Run the education consultancy marketplace API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print a bcrypt hash for seeding accounts by hand
    HashPassword(HashPasswordArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
struct HashPasswordArgs {
    /// Plaintext password to hash
    password: String,
    /// Work factor; defaults to BCRYPT_COST from the environment
    #[arg(long)]
    cost: Option<u32>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::HashPassword(args) => hash_password(args),
    }
}

fn hash_password(args: HashPasswordArgs) -> Result<(), AppError> {
    let cost = match args.cost {
        Some(cost) => cost,
        None => AppConfig::load()?.auth.bcrypt_cost,
    };
    let hash = PasswordHasher::new(cost)
        .hash(&args.password)
        .map_err(ServiceError::from)?;
    println!("{hash}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["edumarket"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn hash_password_accepts_a_cost_override() {
        let cli = Cli::try_parse_from(["edumarket", "hash-password", "s3cret", "--cost", "4"])
            .expect("parses");
        match cli.command {
            Some(Command::HashPassword(args)) => {
                assert_eq!(args.password, "s3cret");
                assert_eq!(args.cost, Some(4));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
