use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use skillpath_config::{
    Config, ConfigMetadata, CorsConfig, DatabaseConfig, ServerConfig,
    TrackingConfig,
};
use skillpath_core::{
    AppUnitOfWork,
    database::{InMemoryCatalog, InMemoryTrackingStore},
    domain::{CourseId, LearnerId, VideoId, WatchPolicy},
};
use skillpath_server::{
    AppState,
    infra::identity::{LEARNER_ID_HEADER, LEARNER_NAME_HEADER},
    routes::create_api_router,
};

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryTrackingStore,
    pub catalog: InMemoryCatalog,
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            primary_url: None,
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_secs: 1,
        },
        tracking: TrackingConfig {
            watched_threshold: 90.0,
        },
        cors: CorsConfig {
            allowed_origins: vec![],
        },
        dev_mode: true,
        metadata: ConfigMetadata::default(),
    }
}

pub fn build_test_app() -> Result<TestApp> {
    let store = InMemoryTrackingStore::new();
    let catalog = InMemoryCatalog::new();
    let unit_of_work = AppUnitOfWork::in_memory(&store, catalog.clone());
    let state = AppState::new(
        &unit_of_work,
        WatchPolicy::default(),
        Arc::new(test_config()),
        None,
    );

    let router = create_api_router().with_state(state);
    let server = TestServer::new(router)
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        store,
        catalog,
    })
}

#[allow(dead_code)]
impl TestApp {
    /// Single-module course with `videos` videos.
    pub async fn course(&self, videos: usize) -> Result<(CourseId, Vec<VideoId>)> {
        let (course_id, _, video_ids) = self
            .catalog
            .add_single_module_course("Ownership and Borrowing", videos)
            .await?;
        Ok((course_id, video_ids))
    }
}

pub fn as_learner(request: TestRequest, learner: LearnerId) -> TestRequest {
    request.add_header(
        HeaderName::from_static(LEARNER_ID_HEADER),
        HeaderValue::from_str(&learner.to_string())
            .expect("uuid is a valid header value"),
    )
}

#[allow(dead_code)]
pub fn named_learner(
    request: TestRequest,
    learner: LearnerId,
    name: &str,
) -> TestRequest {
    as_learner(request, learner).add_header(
        HeaderName::from_static(LEARNER_NAME_HEADER),
        HeaderValue::from_str(name).expect("name is a valid header value"),
    )
}
