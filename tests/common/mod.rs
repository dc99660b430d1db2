use chrono::NaiveDate;
use sea_orm::EntityTrait;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use order_analysis_etl::entities::final_record;
use order_analysis_etl::{config::AppConfig, db, ArtifactStore};

/// Helper harness: a wiremock stand-in for the remote API, a tempdir for the
/// CSV artifacts, and a file-backed SQLite final store with the schema
/// ensured.
pub struct TestPipeline {
    pub cfg: AppConfig,
    pub db: db::DbPool,
    pub server: MockServer,
    pub store: ArtifactStore,
    _dir: TempDir,
}

impl TestPipeline {
    /// Construct a new test pipeline with fresh artifact and database state.
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;

        let data_dir = dir.path().join("order_analysis");
        let db_path = dir.path().join("api_database.db");
        let mut cfg = AppConfig::new(
            format!("{}/api", server.uri()),
            data_dir.to_string_lossy().into_owned(),
            format!("sqlite://{}?mode=rwc", db_path.display()),
        );
        // Keep retry backoff out of the test runtime
        cfg.api_retry_initial_delay_ms = 1;
        cfg.api_retry_max_delay_ms = 5;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let db = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("test database should connect");
        db::run_migrations(&db).await.expect("schema should apply");

        let store = ArtifactStore::new(&cfg.data_dir);
        Self {
            cfg,
            db,
            server,
            store,
            _dir: dir,
        }
    }

    /// Mounts a 200 response for one collection endpoint.
    pub async fn mock_collection(&self, endpoint: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{endpoint}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// All rows currently in the final store, ordered by primary key.
    pub async fn final_rows(&self) -> Vec<final_record::Model> {
        let mut rows = final_record::Entity::find()
            .all(&self.db)
            .await
            .expect("final_data should be readable");
        rows.sort_by(|a, b| {
            (&a.order_id, &a.customer_id, &a.product_id)
                .cmp(&(&b.order_id, &b.customer_id, &b.product_id))
        });
        rows
    }
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}
