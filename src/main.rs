use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    squatguard::run().await
}
