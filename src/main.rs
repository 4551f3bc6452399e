#[tokio::main]
async fn main() {
    mirage::web::run().await;
}
