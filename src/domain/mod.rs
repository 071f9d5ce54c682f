//! Domain layer - Core business entities and logic
//!
//! Entities, value objects and the pure computations over them
//! (consultation statistics, structured summary views).

pub mod consultation;
pub mod metrics;
pub mod password;
pub mod summary;
pub mod user;

pub use consultation::{Consultation, ConsultationStatus};
pub use metrics::{
    CalendarFilter, ConsultationMetrics, HourlyMetrics, PerformancePeriod, PeriodMetrics,
    TimeWindow,
};
pub use password::Password;
pub use summary::{EntityAnalysis, RiskAssessment, Visualization};
pub use user::{validate_username, User, UserResponse, UserRole};
