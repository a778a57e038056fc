//! Proof registry server binary.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    prooflink_registry::server::run().await
}
