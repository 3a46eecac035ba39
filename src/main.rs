use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let code = baton_cli::run().await?;
    std::process::exit(code)
}
