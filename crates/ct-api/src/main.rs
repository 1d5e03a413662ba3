use ct_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "ct-api failed");
        std::process::exit(1);
    }
}
