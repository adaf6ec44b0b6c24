#[tokio::main]
async fn main() {
    jms_backend::start_server().await;
}
