#[cfg(feature = "server")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    biolink_entitlements::server::run().await
}
