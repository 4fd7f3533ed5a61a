use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::engine::max_math::MaxCalculator;
use crate::engine::EngineConfig;
use crate::models::{CreateLiftMax, FieldWarning, LiftMax, MaxType};
use crate::repos::Repos;

use super::error::{ServiceError, ServiceResult};

/// A stored max plus the advisories that rode along with the write.
#[derive(Debug, Clone)]
pub struct RecordedMax {
    pub max: LiftMax,
    pub warnings: Vec<FieldWarning>,
}

/// Writes and reads of the append-only max history, including RPE-chart
/// estimation and the training-max sanity band.
#[derive(Clone)]
pub struct MaxService {
    repos: Repos,
    calculator: MaxCalculator,
}

impl MaxService {
    pub fn new(repos: Repos, config: &EngineConfig) -> Self {
        Self {
            repos,
            calculator: MaxCalculator::new(config),
        }
    }

    pub async fn record(&self, user_id: Uuid, request: CreateLiftMax) -> ServiceResult<RecordedMax> {
        let report = request.validate();
        if !report.valid() {
            return Err(ServiceError::validation(report));
        }
        let mut warnings = report.warnings;

        let lift = self
            .repos
            .lifts
            .get(request.lift_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("lift", request.lift_id))?;

        let value = match (request.value, &request.estimate) {
            (Some(value), None) => value,
            (None, Some(estimate)) => {
                if request.max_type == MaxType::TrainingMax {
                    return Err(ServiceError::invalid(
                        "estimate",
                        "training maxes are set directly, not estimated",
                    ));
                }
                self.calculator
                    .estimate_one_rm(estimate.weight, estimate.reps, estimate.rpe)?
            }
            // validate() has already rejected the other combinations.
            _ => return Err(ServiceError::invalid("value", "either value or estimate is required")),
        };

        if request.max_type == MaxType::TrainingMax {
            if let Some(one_rm) = self
                .repos
                .lift_maxes
                .current(user_id, lift.id, MaxType::OneRm)
                .await?
            {
                warnings.extend(self.calculator.training_max_warnings(value, one_rm.value).warnings);
            }
        }

        let now = Utc::now();
        let max = LiftMax {
            id: Uuid::new_v4(),
            user_id,
            lift_id: lift.id,
            max_type: request.max_type,
            value,
            effective_date: request.effective_date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        };
        let max = self.repos.lift_maxes.append(max).await?;
        info!(
            user_id = %user_id,
            lift = %lift.slug,
            max_type = %max.max_type,
            value = max.value,
            "recorded lift max"
        );

        Ok(RecordedMax { max, warnings })
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        lift_id: Option<Uuid>,
        max_type: Option<MaxType>,
    ) -> ServiceResult<Vec<LiftMax>> {
        Ok(self.repos.lift_maxes.history(user_id, lift_id, max_type).await?)
    }
}
