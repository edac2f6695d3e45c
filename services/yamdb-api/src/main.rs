use yamdb_api::build_app;
use yamdb_api::infrastructure::migrations;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    yamdb_bootstrap::run("config", &migrations(), build_app).await
}
