use clap::Parser;

#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct CliArgs {
    /// Path to a TOML config file.
    #[arg(short, long)]
    pub config: Option<String>,
    /// Deployment environment, `staging` or `production`.
    #[arg(short, long, env = "CLUSTERENV")]
    pub env: Option<String>,
    /// A1 range to read, overrides `sheet.range`.
    #[arg(short, long)]
    pub range: Option<String>,
}
