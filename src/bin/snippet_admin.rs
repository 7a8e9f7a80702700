use clap::Parser;
use snippet_hub_lib::interfaces::cli::AdminCli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    snippet_hub_lib::app::run_admin(AdminCli::parse()).await
}
