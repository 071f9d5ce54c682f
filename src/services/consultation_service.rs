//! Consultation service - Consultation lifecycle and doctor statistics.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::domain::metrics::{
    self, CalendarFilter, ConsultationMetrics, HourlyMetrics, PerformancePeriod, PeriodMetrics,
};
use crate::domain::Consultation;
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Result of closing a consultation
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClosedConsultation {
    #[schema(example = "Consultation closed successfully")]
    pub message: String,
    pub duration_minutes: f64,
    pub metrics: ConsultationMetrics,
}

/// Hourly breakdown of one day
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyBreakdown {
    #[schema(example = "2024-07-01")]
    pub date: String,
    pub hours: Vec<HourlyMetrics>,
}

/// Consultation service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ConsultationService: Send + Sync {
    /// The doctor's open consultation, if any
    async fn active(&self, username: &str) -> AppResult<Option<Consultation>>;

    /// Open a consultation for a record
    async fn start(&self, username: &str, record_id: &str) -> AppResult<Consultation>;

    /// Close an active consultation owned by `username`
    async fn close(&self, id: &str, username: &str) -> AppResult<ClosedConsultation>;

    async fn metrics(&self, username: &str) -> AppResult<ConsultationMetrics>;

    async fn performance(
        &self,
        username: &str,
        period: PerformancePeriod,
        filter: CalendarFilter,
    ) -> AppResult<Vec<PeriodMetrics>>;

    /// `date` is `YYYY-MM-DD` or an ISO date-time; today when absent
    async fn daily_breakdown(
        &self,
        username: &str,
        date: Option<String>,
    ) -> AppResult<DailyBreakdown>;
}

/// Concrete implementation of ConsultationService using Unit of Work.
pub struct ConsultationManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ConsultationManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

const NOT_ACTIVE: &str = "Consultation not found or already closed";

#[async_trait]
impl<U: UnitOfWork> ConsultationService for ConsultationManager<U> {
    async fn active(&self, username: &str) -> AppResult<Option<Consultation>> {
        self.uow.consultations().find_active(username).await
    }

    async fn start(&self, username: &str, record_id: &str) -> AppResult<Consultation> {
        self.uow
            .consultations()
            .start(username, record_id, Utc::now())
            .await
    }

    async fn close(&self, id: &str, username: &str) -> AppResult<ClosedConsultation> {
        let repo = self.uow.consultations();
        let mut consultation = repo
            .find_active_by_id(id, username)
            .await?
            .ok_or_not_found(NOT_ACTIVE)?;

        let duration = consultation.complete(Utc::now());
        if !repo.save_completion(&consultation).await? {
            return Err(AppError::not_found(NOT_ACTIVE));
        }
        tracing::info!(
            consultation_id = %id,
            username = %username,
            duration_secs = duration,
            "Consultation closed"
        );

        let completed = repo.list_completed(username).await?;
        Ok(ClosedConsultation {
            message: "Consultation closed successfully".to_string(),
            duration_minutes: metrics::round2(duration / 60.0),
            metrics: ConsultationMetrics::from_completed(&completed),
        })
    }

    async fn metrics(&self, username: &str) -> AppResult<ConsultationMetrics> {
        let completed = self.uow.consultations().list_completed(username).await?;
        Ok(ConsultationMetrics::from_completed(&completed))
    }

    async fn performance(
        &self,
        username: &str,
        period: PerformancePeriod,
        filter: CalendarFilter,
    ) -> AppResult<Vec<PeriodMetrics>> {
        let window = period.window(Utc::now(), filter)?;
        let consultations = self
            .uow
            .consultations()
            .list_started_in(username, window)
            .await?;
        Ok(metrics::performance_breakdown(period, &consultations))
    }

    async fn daily_breakdown(
        &self,
        username: &str,
        date: Option<String>,
    ) -> AppResult<DailyBreakdown> {
        let day = metrics::parse_day(date.as_deref(), Utc::now())?;
        let consultations = self
            .uow
            .consultations()
            .list_started_in(username, metrics::day_window(day))
            .await?;

        Ok(DailyBreakdown {
            date: day.format("%Y-%m-%d").to_string(),
            hours: metrics::hourly_breakdown(&consultations),
        })
    }
}
