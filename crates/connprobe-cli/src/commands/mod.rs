use clap::Subcommand;

pub mod probe;
pub mod validate;

#[derive(Subcommand)]
pub enum Commands {
    /// Load the env file and resolve the connection string without connecting
    Validate(validate::ValidateArgs),
}
