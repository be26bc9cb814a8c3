#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sigmascholar_server::start().await
}
