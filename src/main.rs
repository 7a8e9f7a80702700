#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    snippet_hub_lib::app::run().await
}
