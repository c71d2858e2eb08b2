#![allow(dead_code)]

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use salvo::{listener::TcpListener, Server};
use url::Url;

use user_registry::infra::{
    controller::Repositories,
    database::{connection, schema},
    router,
};

/// Starts the api on a free local port backed by in-memory storage.
pub async fn spawn_app() -> (Client, Url) {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("Expect a free local port")
        .port();
    let address = format!("127.0.0.1:{port}");
    let url = Url::parse(&format!("http://{address}")).unwrap();

    let app = router::app(&Repositories::memory());
    tokio::spawn(async move {
        Server::new(TcpListener::bind(&address)).serve(app).await;
    });

    let client = create_client();
    wait_ready(&client, &url).await;
    (client, url)
}

async fn wait_ready(client: &Client, url: &Url) {
    let health = url.join("/health").unwrap();
    for _ in 0..50 {
        if let Ok(res) = client.get(health.clone()).send().await {
            if res.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("api did not start listening on {url}");
}

/// Recreates the `registry` schema in the database named by `DATABASE_URL`.
pub async fn setup_database() -> sqlx::PgPool {
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set to run the ignored postgres tests");

    let pool = connection::create_sqlx_pool(&database_url, 5)
        .await
        .expect("Expect to create a database pool with a open connection");
    schema::drop(&pool).await.unwrap();
    schema::migrate(&pool).await.unwrap();

    pool
}

pub fn create_client() -> Client {
    let mut headers = HeaderMap::new();
    headers.append("accept", HeaderValue::from_static("application/json"));

    let connect_timeout = 1000 * 5; // 5 sec
    let timeout = 1000 * 10; // 10 sec

    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(connect_timeout))
        .timeout(Duration::from_millis(timeout))
        .pool_max_idle_per_host(5)
        .default_headers(headers)
        .brotli(true)
        .gzip(true)
        .build()
        .expect("Expect to create a http client")
}
