#[tokio::main]
async fn main() -> std::io::Result<()> {
    campus_guesser::run_with_config().await.map(|_| ())
}
