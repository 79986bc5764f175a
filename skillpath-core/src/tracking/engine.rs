use crate::application::AppUnitOfWork;
use crate::domain::WatchPolicy;

use super::{CompletionEvaluator, EnrollmentService, ProgressUpdateService};

/// The three tracking services wired over one unit of work.
#[derive(Debug, Clone)]
pub struct TrackingEngine {
    enrollment: EnrollmentService,
    progress: ProgressUpdateService,
    completion: CompletionEvaluator,
}

impl TrackingEngine {
    pub fn new(uow: &AppUnitOfWork, policy: WatchPolicy) -> Self {
        let completion = CompletionEvaluator::new(
            uow.enrollments.clone(),
            uow.progress.clone(),
            uow.catalog.clone(),
        );
        let enrollment =
            EnrollmentService::new(uow.enrollments.clone(), uow.catalog.clone());
        let progress = ProgressUpdateService::new(
            uow.progress.clone(),
            uow.catalog.clone(),
            completion.clone(),
            policy,
        );

        Self {
            enrollment,
            progress,
            completion,
        }
    }

    pub fn enrollment(&self) -> &EnrollmentService {
        &self.enrollment
    }

    pub fn progress(&self) -> &ProgressUpdateService {
        &self.progress
    }

    pub fn completion(&self) -> &CompletionEvaluator {
        &self.completion
    }

    pub fn policy(&self) -> WatchPolicy {
        self.progress.policy()
    }
}
