use salvo::{listener::TcpListener, Server};
use tracing_subscriber::EnvFilter;

use user_registry::{
    config::env_var::{self, Storage},
    infra::{
        controller::Repositories,
        database::{connection, schema},
        router,
    },
};

#[tokio::main]
async fn main() {
    let env_file = env_var::load_env_files();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    if let Some(path) = env_file {
        tracing::debug!("loaded environment file {}", path.display());
    }

    let env = env_var::get();
    let repos = match env.storage {
        Storage::Postgres => {
            let pool = match connection::create_sqlx_pool(
                &env.database_url,
                env.database_max_connections,
            )
            .await
            {
                Ok(pool) => pool,
                Err(err) => {
                    tracing::error!("could not connect to database: {err}");
                    std::process::exit(1);
                }
            };

            if env.migrate_on_start {
                if let Err(err) = schema::migrate(&pool).await {
                    tracing::error!("could not apply database schema: {err}");
                    std::process::exit(1);
                }
            }

            Repositories::postgres(&pool)
        }
        Storage::Memory => {
            tracing::warn!("using in-memory storage, records are lost on shutdown");
            Repositories::memory()
        }
    };

    let address = format!("0.0.0.0:{}", env.port);
    tracing::info!(app_env = %env.app_env, base_url = ?env.base_url, "listening on {address}");
    let listener = TcpListener::bind(&address);
    Server::new(listener).serve(router::app(&repos)).await;
}
