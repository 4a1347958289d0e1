//! Dashboard counters service

use crate::{
    api::dashboard::DashboardSummary,
    error::AppResult,
    models::instance::LoanStatus,
    repository::Repository,
    services::redis::RedisService,
};

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
    redis: RedisService,
}

impl DashboardService {
    pub fn new(repository: Repository, redis: RedisService) -> Self {
        Self { repository, redis }
    }

    /// Collect the home-page counters. When the caller supplies a session id,
    /// that session's visit counter is incremented and returned with the rest.
    pub async fn summary(&self, session_id: Option<&str>) -> AppResult<DashboardSummary> {
        let num_books = self.repository.books.count().await?;
        let num_instances = self.repository.instances.count().await?;
        let num_instances_available = self
            .repository
            .instances
            .count_by_status(LoanStatus::Available)
            .await?;
        let num_authors = self.repository.authors.count().await?;
        let num_genres = self.repository.genres.count().await?;
        // Titles containing " y ", kept for parity with the Spanish catalog
        let num_books_with_y = self.repository.books.count_title_containing(" y ").await?;

        let num_visits = match session_id {
            Some(session_id) => Some(self.redis.incr_session_visits(session_id).await?),
            None => None,
        };

        Ok(DashboardSummary {
            num_books,
            num_instances,
            num_instances_available,
            num_authors,
            num_genres,
            num_books_with_y,
            num_visits,
        })
    }
}
