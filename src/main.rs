#[tokio::main]
async fn main() {
    chalet_booking::run().await;
}
