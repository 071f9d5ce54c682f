//! Service tests against in-memory repositories.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use sperow_api::config::Config;
use sperow_api::domain::{Consultation, ConsultationStatus, TimeWindow, User};
use sperow_api::errors::{AppError, AppResult};
use sperow_api::infra::{ConsultationRepository, UnitOfWork, UserRepository};
use sperow_api::services::{
    AuthService, Authenticator, ConsultationManager, ConsultationService,
};

// =============================================================================
// In-memory persistence
// =============================================================================

#[derive(Default)]
struct InMemoryUsers {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    async fn create(&self, username: String, password_hash: String) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&username) {
            return Err(AppError::conflict("Username"));
        }
        let user = User::new(format!("u{}", users.len() + 1), username.clone(), password_hash);
        users.insert(username, user.clone());
        Ok(user)
    }
}

#[derive(Default)]
struct InMemoryConsultations {
    rows: Mutex<Vec<Consultation>>,
}

impl InMemoryConsultations {
    fn seed(&self, consultation: Consultation) {
        self.rows.lock().unwrap().push(consultation);
    }
}

#[async_trait]
impl ConsultationRepository for InMemoryConsultations {
    async fn find_active(&self, username: &str) -> AppResult<Option<Consultation>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.doctor_username == username && c.is_active())
            .cloned())
    }

    async fn find_active_by_id(
        &self,
        id: &str,
        username: &str,
    ) -> AppResult<Option<Consultation>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id && c.doctor_username == username && c.is_active())
            .cloned())
    }

    async fn start(
        &self,
        username: &str,
        record_id: &str,
        start_time: DateTime<Utc>,
    ) -> AppResult<Consultation> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|c| c.doctor_username == username && c.is_active())
        {
            return Err(AppError::conflict("Active consultation"));
        }
        let consultation = Consultation::start(
            format!("c{}", rows.len() + 1),
            username.to_string(),
            record_id.to_string(),
            start_time,
        );
        rows.push(consultation.clone());
        Ok(consultation)
    }

    async fn save_completion(&self, consultation: &Consultation) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|c| c.id == consultation.id && c.is_active())
        {
            Some(row) => {
                *row = consultation.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_completed(&self, username: &str) -> AppResult<Vec<Consultation>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.doctor_username == username && c.is_completed())
            .cloned()
            .collect())
    }

    async fn list_started_in(
        &self,
        username: &str,
        window: TimeWindow,
    ) -> AppResult<Vec<Consultation>> {
        let mut found: Vec<Consultation> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.doctor_username == username)
            .filter(|c| c.start_time >= window.start)
            .filter(|c| window.end.map_or(true, |end| c.start_time < end))
            .cloned()
            .collect();
        found.sort_by_key(|c| c.start_time);
        Ok(found)
    }
}

#[derive(Default)]
struct TestUnitOfWork {
    users: Arc<InMemoryUsers>,
    consultations: Arc<InMemoryConsultations>,
}

impl UnitOfWork for TestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn consultations(&self) -> Arc<dyn ConsultationRepository> {
        self.consultations.clone()
    }
}

fn test_config() -> Config {
    let env = HashMap::from([
        ("FLASK_APP", "app.py"),
        ("FLASK_ENV", "development"),
        ("SECRET_KEY", "integration-secret-key-long-enough-for-hs256"),
        ("AZURE_OPENAI_API_KEY", "azure-key"),
        ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
        ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
        ("AWS_SECRET_ACCESS_KEY", "aws-secret"),
        ("AWS_REGION", "us-east-1"),
        ("MONGODB_URI", "mongodb://localhost:27017"),
    ]);
    Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_register_then_login_issues_verifiable_token() {
    let auth = Authenticator::new(Arc::new(TestUnitOfWork::default()), test_config());

    let user = auth
        .register("dr_grey".into(), "correct-horse".into())
        .await
        .unwrap();
    assert_eq!(user.username, "dr_grey");
    assert_ne!(user.password_hash, "correct-horse");

    let token = auth
        .login("dr_grey".into(), "correct-horse".into())
        .await
        .unwrap();
    assert_eq!(token.token_type, "Bearer");

    let claims = auth.verify_token(&token.access_token).unwrap();
    assert_eq!(claims.sub, "dr_grey");
    assert_eq!(claims.role, "doctor");
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let auth = Authenticator::new(Arc::new(TestUnitOfWork::default()), test_config());

    auth.register("dr_grey".into(), "correct-horse".into())
        .await
        .unwrap();
    let err = auth
        .register("dr_grey".into(), "another-pass".into())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let auth = Authenticator::new(Arc::new(TestUnitOfWork::default()), test_config());

    let err = auth
        .register("dr_grey".into(), "short".into())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let auth = Authenticator::new(Arc::new(TestUnitOfWork::default()), test_config());
    auth.register("dr_grey".into(), "correct-horse".into())
        .await
        .unwrap();

    let wrong_password = auth
        .login("dr_grey".into(), "wrong-horse".into())
        .await
        .unwrap_err();
    let unknown_user = auth
        .login("nobody".into(), "correct-horse".into())
        .await
        .unwrap_err();

    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    assert!(matches!(unknown_user, AppError::InvalidCredentials));
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let auth = Authenticator::new(Arc::new(TestUnitOfWork::default()), test_config());
    auth.register("dr_grey".into(), "correct-horse".into())
        .await
        .unwrap();
    let token = auth
        .login("dr_grey".into(), "correct-horse".into())
        .await
        .unwrap();

    let tampered = format!("{}x", token.access_token);
    assert!(auth.verify_token(&tampered).is_err());
}

// =============================================================================
// Consultations
// =============================================================================

#[tokio::test]
async fn test_consultation_lifecycle() {
    let uow = Arc::new(TestUnitOfWork::default());
    let consultations = ConsultationManager::new(uow.clone());

    let started = consultations.start("dr_grey", "scan.pdf").await.unwrap();
    assert_eq!(started.status, ConsultationStatus::Active);
    assert!(consultations.active("dr_grey").await.unwrap().is_some());

    let err = consultations.start("dr_grey", "other.pdf").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let closed = consultations.close(&started.id, "dr_grey").await.unwrap();
    assert_eq!(closed.message, "Consultation closed successfully");
    assert_eq!(closed.metrics.total_consultations, 1);
    assert!(consultations.active("dr_grey").await.unwrap().is_none());

    let err = consultations.close(&started.id, "dr_grey").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_close_is_scoped_to_the_doctor() {
    let uow = Arc::new(TestUnitOfWork::default());
    let consultations = ConsultationManager::new(uow.clone());

    let started = consultations.start("dr_grey", "scan.pdf").await.unwrap();
    let err = consultations.close(&started.id, "dr_house").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_metrics_summarize_completed_consultations() {
    let uow = Arc::new(TestUnitOfWork::default());
    let now = Utc::now();
    for minutes in [10, 20] {
        let mut consultation = Consultation::start(
            format!("seed-{}", minutes),
            "dr_grey".into(),
            "scan.pdf".into(),
            now - Duration::hours(1),
        );
        consultation.complete(now - Duration::hours(1) + Duration::minutes(minutes));
        uow.consultations.seed(consultation);
    }

    let metrics = ConsultationManager::new(uow)
        .metrics("dr_grey")
        .await
        .unwrap();

    assert_eq!(metrics.total_consultations, 2);
    assert_eq!(metrics.avg_minutes, 15.0);
    assert_eq!(metrics.min_minutes, 10.0);
    assert_eq!(metrics.max_minutes, 20.0);
}

#[tokio::test]
async fn test_daily_breakdown_covers_every_hour() {
    let uow = Arc::new(TestUnitOfWork::default());
    let consultations = ConsultationManager::new(uow);

    let breakdown = consultations
        .daily_breakdown("dr_grey", Some("2024-07-01".into()))
        .await
        .unwrap();

    assert_eq!(breakdown.date, "2024-07-01");
    assert_eq!(breakdown.hours.len(), 24);
    assert!(breakdown.hours.iter().all(|h| h.total_records == 0));
}
