use structopt::StructOpt;

#[derive(StructOpt)]
pub struct Options {
    /// Path of the config file
    #[structopt(long, default_value = "config.toml")]
    pub config: String,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Serve the HTTP interface
    Serve,

    /// Check GraphQL documents and print the deprecated members they use
    Check {
        /// Hand each operation only the members it references itself
        #[structopt(long)]
        per_operation: bool,

        /// GraphQL documents to check
        #[structopt(required = true)]
        files: Vec<String>,
    },
}
