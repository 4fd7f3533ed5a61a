use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::models::{
    Cycle, DailyLookup, DailyLookupEntry, Day, DayPrescription, Lift, LiftMax, LoadStrategy,
    LookupKey, MaxType, Prescription, Program, ProgramProgression, Progression, ProgressionParams,
    ProgressionState, RampStep, RotationLookup, RotationLookupEntry, Rounding, RoundingDirection,
    SessionStatus, SetRecord, SetScheme, StageDef, UserProgramState, Week, WeekDay, WeekVariant,
    Weekday, WeeklyLookup, WeeklyLookupEntry, WorkoutSession,
};

use super::{
    CycleRepo, DayRepo, LiftMaxRepo, LiftRepo, LookupRepo, PrescriptionRepo, ProgramProgressionRepo,
    ProgramRepo, ProgressionEffect, ProgressionRepo, SessionRepo, UserProgramStateRepo, WeekRepo,
};

/// All repository contracts over one Postgres pool. Queries go through the
/// runtime API with explicit row mapping, so the crate builds without a
/// live database.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|e| anyhow!(e))
}

// ---------------------------------------------------------------------------
// Lifts

#[derive(FromRow)]
struct LiftRow {
    id: Uuid,
    name: String,
    slug: String,
    is_competition_lift: bool,
    parent_lift_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LiftRow> for Lift {
    fn from(row: LiftRow) -> Self {
        Lift {
            id: row.id,
            name: row.name,
            slug: row.slug,
            is_competition_lift: row.is_competition_lift,
            parent_lift_id: row.parent_lift_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl LiftRepo for PgStore {
    async fn create(&self, lift: Lift) -> Result<Lift> {
        sqlx::query(
            r#"
            INSERT INTO lifts (id, name, slug, is_competition_lift, parent_lift_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(lift.id)
        .bind(&lift.name)
        .bind(&lift.slug)
        .bind(lift.is_competition_lift)
        .bind(lift.parent_lift_id)
        .bind(lift.created_at)
        .bind(lift.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(lift)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Lift>> {
        let row = sqlx::query_as::<_, LiftRow>("SELECT * FROM lifts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Lift::from))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Lift>> {
        let row = sqlx::query_as::<_, LiftRow>("SELECT * FROM lifts WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Lift::from))
    }

    async fn list(&self) -> Result<Vec<Lift>> {
        let rows = sqlx::query_as::<_, LiftRow>("SELECT * FROM lifts ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Lift::from).collect())
    }

    async fn update(&self, lift: Lift) -> Result<Option<Lift>> {
        let result = sqlx::query(
            r#"
            UPDATE lifts
            SET name = $2, is_competition_lift = $3, parent_lift_id = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(lift.id)
        .bind(&lift.name)
        .bind(lift.is_competition_lift)
        .bind(lift.parent_lift_id)
        .bind(lift.updated_at)
        .execute(&self.pool)
        .await?;
        Ok((result.rows_affected() > 0).then_some(lift))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lifts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Lift maxes

#[derive(FromRow)]
struct LiftMaxRow {
    id: Uuid,
    user_id: Uuid,
    lift_id: Uuid,
    max_type: String,
    value: f64,
    effective_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<LiftMaxRow> for LiftMax {
    type Error = anyhow::Error;

    fn try_from(row: LiftMaxRow) -> Result<Self> {
        Ok(LiftMax {
            id: row.id,
            user_id: row.user_id,
            lift_id: row.lift_id,
            max_type: parse(&row.max_type)?,
            value: row.value,
            effective_date: row.effective_date,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl LiftMaxRepo for PgStore {
    async fn append(&self, max: LiftMax) -> Result<LiftMax> {
        sqlx::query(
            r#"
            INSERT INTO lift_maxes (id, user_id, lift_id, max_type, value, effective_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(max.id)
        .bind(max.user_id)
        .bind(max.lift_id)
        .bind(max.max_type.as_str())
        .bind(max.value)
        .bind(max.effective_date)
        .bind(max.created_at)
        .execute(&self.pool)
        .await?;
        Ok(max)
    }

    async fn current(
        &self,
        user_id: Uuid,
        lift_id: Uuid,
        max_type: MaxType,
    ) -> Result<Option<LiftMax>> {
        let row = sqlx::query_as::<_, LiftMaxRow>(
            r#"
            SELECT * FROM lift_maxes
            WHERE user_id = $1 AND lift_id = $2 AND max_type = $3
            ORDER BY effective_date DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(lift_id)
        .bind(max_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(LiftMax::try_from).transpose()
    }

    async fn history(
        &self,
        user_id: Uuid,
        lift_id: Option<Uuid>,
        max_type: Option<MaxType>,
    ) -> Result<Vec<LiftMax>> {
        let rows = sqlx::query_as::<_, LiftMaxRow>(
            r#"
            SELECT * FROM lift_maxes
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR lift_id = $2)
              AND ($3::text IS NULL OR max_type = $3)
            ORDER BY effective_date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(lift_id)
        .bind(max_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LiftMax::try_from).collect()
    }
}

// ---------------------------------------------------------------------------
// Prescriptions: the strategy/scheme tags flatten into columns, with ramp
// steps and stages in child tables.

#[derive(FromRow)]
struct PrescriptionRow {
    id: Uuid,
    lift_id: Uuid,
    load_type: String,
    load_reference: Option<String>,
    load_percentage: Option<f64>,
    load_weight: Option<f64>,
    source_prescription_id: Option<Uuid>,
    rounding_increment: f64,
    rounding_direction: String,
    lookup_key: Option<String>,
    scheme_type: String,
    scheme_sets: Option<i32>,
    scheme_reps: Option<i32>,
    scheme_is_amrap: bool,
    work_set_threshold: Option<f64>,
    exercise_order: i32,
    notes: Option<String>,
    rest_seconds: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct RampStepRow {
    prescription_id: Uuid,
    percentage: Option<f64>,
    reps: Option<i32>,
    is_amrap: bool,
}

#[derive(FromRow)]
struct StageRow {
    prescription_id: Uuid,
    name: String,
    sets: i32,
    reps: i32,
    is_amrap: bool,
    min_volume: i32,
}

fn assemble_prescription(
    row: PrescriptionRow,
    steps: Vec<RampStepRow>,
    stages: Vec<StageRow>,
) -> Result<Prescription> {
    let rounding = Rounding {
        increment: row.rounding_increment,
        direction: parse::<RoundingDirection>(&row.rounding_direction)?,
    };

    let load_strategy = match row.load_type.as_str() {
        "percent_of" => LoadStrategy::PercentOf {
            reference: parse(
                row.load_reference
                    .as_deref()
                    .ok_or_else(|| anyhow!("percent_of strategy is missing a reference"))?,
            )?,
            percentage: row
                .load_percentage
                .ok_or_else(|| anyhow!("percent_of strategy is missing a percentage"))?,
            rounding,
            lookup_key: match row.lookup_key.as_deref() {
                Some(raw) => parse::<LookupKey>(raw)?,
                None => LookupKey::default(),
            },
        },
        "fixed_weight" => LoadStrategy::FixedWeight {
            weight: row
                .load_weight
                .ok_or_else(|| anyhow!("fixed_weight strategy is missing a weight"))?,
            rounding,
        },
        "computed" => LoadStrategy::Computed {
            source_prescription_id: row
                .source_prescription_id
                .ok_or_else(|| anyhow!("computed strategy is missing a source"))?,
            percentage: row
                .load_percentage
                .ok_or_else(|| anyhow!("computed strategy is missing a percentage"))?,
            rounding,
        },
        other => return Err(anyhow!("unknown load strategy type: {other}")),
    };

    let set_scheme = match row.scheme_type.as_str() {
        "fixed" => SetScheme::Fixed {
            sets: row
                .scheme_sets
                .ok_or_else(|| anyhow!("fixed scheme is missing a set count"))?
                as u32,
            reps: row
                .scheme_reps
                .ok_or_else(|| anyhow!("fixed scheme is missing a rep count"))?,
            is_amrap: row.scheme_is_amrap,
        },
        "amrap" => SetScheme::Amrap {
            sets: row
                .scheme_sets
                .ok_or_else(|| anyhow!("amrap scheme is missing a set count"))?
                as u32,
            reps: row
                .scheme_reps
                .ok_or_else(|| anyhow!("amrap scheme is missing a rep count"))?,
        },
        "ramp" => SetScheme::Ramp {
            steps: steps
                .into_iter()
                .map(|s| RampStep {
                    percentage: s.percentage,
                    reps: s.reps,
                    is_amrap: s.is_amrap,
                })
                .collect(),
            work_set_threshold: row
                .work_set_threshold
                .ok_or_else(|| anyhow!("ramp scheme is missing a work-set threshold"))?,
        },
        "stage" => SetScheme::Stage {
            stages: stages
                .into_iter()
                .map(|s| StageDef {
                    name: s.name,
                    sets: s.sets as u32,
                    reps: s.reps,
                    is_amrap: s.is_amrap,
                    min_volume: s.min_volume,
                })
                .collect(),
        },
        other => return Err(anyhow!("unknown set scheme type: {other}")),
    };

    Ok(Prescription {
        id: row.id,
        lift_id: row.lift_id,
        load_strategy,
        set_scheme,
        order: row.exercise_order,
        notes: row.notes,
        rest_seconds: row.rest_seconds,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn insert_prescription_tx(
    tx: &mut Transaction<'_, Postgres>,
    p: &Prescription,
) -> Result<()> {
    let rounding = p.load_strategy.rounding();
    let (load_type, load_reference, load_percentage, load_weight, source_id, lookup_key) =
        match &p.load_strategy {
            LoadStrategy::PercentOf {
                reference,
                percentage,
                lookup_key,
                ..
            } => (
                "percent_of",
                Some(reference.as_str()),
                Some(*percentage),
                None,
                None,
                Some(lookup_key.as_str()),
            ),
            LoadStrategy::FixedWeight { weight, .. } => {
                ("fixed_weight", None, None, Some(*weight), None, None)
            }
            LoadStrategy::Computed {
                source_prescription_id,
                percentage,
                ..
            } => (
                "computed",
                None,
                Some(*percentage),
                None,
                Some(*source_prescription_id),
                None,
            ),
        };

    let (scheme_type, scheme_sets, scheme_reps, scheme_is_amrap, threshold) = match &p.set_scheme {
        SetScheme::Fixed { sets, reps, is_amrap } => {
            ("fixed", Some(*sets as i32), Some(*reps), *is_amrap, None)
        }
        SetScheme::Amrap { sets, reps } => ("amrap", Some(*sets as i32), Some(*reps), true, None),
        SetScheme::Ramp {
            work_set_threshold, ..
        } => ("ramp", None, None, false, Some(*work_set_threshold)),
        SetScheme::Stage { .. } => ("stage", None, None, false, None),
    };

    sqlx::query(
        r#"
        INSERT INTO prescriptions (
            id, lift_id, load_type, load_reference, load_percentage, load_weight,
            source_prescription_id, rounding_increment, rounding_direction, lookup_key,
            scheme_type, scheme_sets, scheme_reps, scheme_is_amrap, work_set_threshold,
            exercise_order, notes, rest_seconds, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        "#,
    )
    .bind(p.id)
    .bind(p.lift_id)
    .bind(load_type)
    .bind(load_reference)
    .bind(load_percentage)
    .bind(load_weight)
    .bind(source_id)
    .bind(rounding.increment)
    .bind(rounding.direction.as_str())
    .bind(lookup_key)
    .bind(scheme_type)
    .bind(scheme_sets)
    .bind(scheme_reps)
    .bind(scheme_is_amrap)
    .bind(threshold)
    .bind(p.order)
    .bind(&p.notes)
    .bind(p.rest_seconds)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(&mut **tx)
    .await?;

    if let SetScheme::Ramp { steps, .. } = &p.set_scheme {
        for (i, step) in steps.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO prescription_ramp_steps (prescription_id, step_order, percentage, reps, is_amrap)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(p.id)
            .bind(i as i32)
            .bind(step.percentage)
            .bind(step.reps)
            .bind(step.is_amrap)
            .execute(&mut **tx)
            .await?;
        }
    }
    if let SetScheme::Stage { stages } = &p.set_scheme {
        for (i, stage) in stages.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO prescription_stages (prescription_id, stage_order, name, sets, reps, is_amrap, min_volume)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(p.id)
            .bind(i as i32)
            .bind(&stage.name)
            .bind(stage.sets as i32)
            .bind(stage.reps)
            .bind(stage.is_amrap)
            .bind(stage.min_volume)
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}

impl PgStore {
    async fn load_prescriptions(&self, rows: Vec<PrescriptionRow>) -> Result<Vec<Prescription>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let steps = sqlx::query_as::<_, RampStepRow>(
            r#"
            SELECT prescription_id, percentage, reps, is_amrap
            FROM prescription_ramp_steps
            WHERE prescription_id = ANY($1)
            ORDER BY step_order
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let stages = sqlx::query_as::<_, StageRow>(
            r#"
            SELECT prescription_id, name, sets, reps, is_amrap, min_volume
            FROM prescription_stages
            WHERE prescription_id = ANY($1)
            ORDER BY stage_order
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let id = row.id;
                let own_steps = steps
                    .iter()
                    .filter(|s| s.prescription_id == id)
                    .map(|s| RampStepRow {
                        prescription_id: s.prescription_id,
                        percentage: s.percentage,
                        reps: s.reps,
                        is_amrap: s.is_amrap,
                    })
                    .collect();
                let own_stages = stages
                    .iter()
                    .filter(|s| s.prescription_id == id)
                    .map(|s| StageRow {
                        prescription_id: s.prescription_id,
                        name: s.name.clone(),
                        sets: s.sets,
                        reps: s.reps,
                        is_amrap: s.is_amrap,
                        min_volume: s.min_volume,
                    })
                    .collect();
                assemble_prescription(row, own_steps, own_stages)
            })
            .collect()
    }
}

#[async_trait]
impl PrescriptionRepo for PgStore {
    async fn create(&self, prescription: Prescription) -> Result<Prescription> {
        let mut tx = self.pool.begin().await?;
        insert_prescription_tx(&mut tx, &prescription).await?;
        tx.commit().await?;
        Ok(prescription)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Prescription>> {
        let row = sqlx::query_as::<_, PrescriptionRow>("SELECT * FROM prescriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.load_prescriptions(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Prescription>> {
        let rows = sqlx::query_as::<_, PrescriptionRow>(
            "SELECT * FROM prescriptions WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        self.load_prescriptions(rows).await
    }

    async fn list(&self) -> Result<Vec<Prescription>> {
        let rows = sqlx::query_as::<_, PrescriptionRow>(
            "SELECT * FROM prescriptions ORDER BY exercise_order, created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        self.load_prescriptions(rows).await
    }

    async fn update(&self, prescription: Prescription) -> Result<Option<Prescription>> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM prescriptions WHERE id = $1")
            .bind(prescription.id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        // Replace wholesale: the child tables follow the scheme variant.
        insert_prescription_tx(&mut tx, &prescription).await?;
        tx.commit().await?;
        Ok(Some(prescription))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM prescriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Days

#[derive(FromRow)]
struct DayRow {
    id: Uuid,
    name: String,
    slug: String,
    metadata: Option<Value>,
    program_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DayRow> for Day {
    fn from(row: DayRow) -> Self {
        Day {
            id: row.id,
            name: row.name,
            slug: row.slug,
            metadata: row.metadata,
            program_id: row.program_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl DayRepo for PgStore {
    async fn create(&self, day: Day) -> Result<Day> {
        sqlx::query(
            r#"
            INSERT INTO days (id, name, slug, metadata, program_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(day.id)
        .bind(&day.name)
        .bind(&day.slug)
        .bind(&day.metadata)
        .bind(day.program_id)
        .bind(day.created_at)
        .bind(day.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(day)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Day>> {
        let row = sqlx::query_as::<_, DayRow>("SELECT * FROM days WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Day::from))
    }

    async fn get_by_slug(&self, program_id: Option<Uuid>, slug: &str) -> Result<Option<Day>> {
        let row = sqlx::query_as::<_, DayRow>(
            "SELECT * FROM days WHERE slug = $1 AND program_id IS NOT DISTINCT FROM $2",
        )
        .bind(slug)
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Day::from))
    }

    async fn list(&self) -> Result<Vec<Day>> {
        let rows = sqlx::query_as::<_, DayRow>("SELECT * FROM days ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Day::from).collect())
    }

    async fn update(&self, day: Day) -> Result<Option<Day>> {
        let result = sqlx::query(
            r#"
            UPDATE days SET name = $2, metadata = $3, program_id = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(day.id)
        .bind(&day.name)
        .bind(&day.metadata)
        .bind(day.program_id)
        .bind(day.updated_at)
        .execute(&self.pool)
        .await?;
        Ok((result.rows_affected() > 0).then_some(day))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM days WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_prescriptions(&self, day_id: Uuid, entries: Vec<DayPrescription>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM day_prescriptions WHERE day_id = $1")
            .bind(day_id)
            .execute(&mut *tx)
            .await?;
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO day_prescriptions (day_id, prescription_id, exercise_order)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(entry.day_id)
            .bind(entry.prescription_id)
            .bind(entry.order)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn prescriptions_for(&self, day_id: Uuid) -> Result<Vec<DayPrescription>> {
        let rows = sqlx::query(
            r#"
            SELECT day_id, prescription_id, exercise_order
            FROM day_prescriptions
            WHERE day_id = $1
            ORDER BY exercise_order
            "#,
        )
        .bind(day_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row: PgRow| {
                Ok(DayPrescription {
                    day_id: row.try_get("day_id")?,
                    prescription_id: row.try_get("prescription_id")?,
                    order: row.try_get("exercise_order")?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Weeks

#[derive(FromRow)]
struct WeekRow {
    id: Uuid,
    cycle_id: Uuid,
    week_number: i32,
    variant: Option<String>,
}

impl TryFrom<WeekRow> for Week {
    type Error = anyhow::Error;

    fn try_from(row: WeekRow) -> Result<Self> {
        Ok(Week {
            id: row.id,
            cycle_id: row.cycle_id,
            week_number: row.week_number,
            variant: row
                .variant
                .as_deref()
                .map(parse::<WeekVariant>)
                .transpose()?,
        })
    }
}

#[async_trait]
impl WeekRepo for PgStore {
    async fn create(&self, week: Week) -> Result<Week> {
        sqlx::query(
            "INSERT INTO weeks (id, cycle_id, week_number, variant) VALUES ($1, $2, $3, $4)",
        )
        .bind(week.id)
        .bind(week.cycle_id)
        .bind(week.week_number)
        .bind(week.variant.map(|v| v.as_str()))
        .execute(&self.pool)
        .await?;
        Ok(week)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Week>> {
        let row = sqlx::query_as::<_, WeekRow>("SELECT * FROM weeks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Week::try_from).transpose()
    }

    async fn list_for_cycle(&self, cycle_id: Uuid) -> Result<Vec<Week>> {
        let rows = sqlx::query_as::<_, WeekRow>(
            "SELECT * FROM weeks WHERE cycle_id = $1 ORDER BY week_number",
        )
        .bind(cycle_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Week::try_from).collect()
    }

    async fn update(&self, week: Week) -> Result<Option<Week>> {
        let result = sqlx::query("UPDATE weeks SET week_number = $2, variant = $3 WHERE id = $1")
            .bind(week.id)
            .bind(week.week_number)
            .bind(week.variant.map(|v| v.as_str()))
            .execute(&self.pool)
            .await?;
        Ok((result.rows_affected() > 0).then_some(week))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM weeks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_days(&self, week_id: Uuid, entries: Vec<WeekDay>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM week_days WHERE week_id = $1")
            .bind(week_id)
            .execute(&mut *tx)
            .await?;
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO week_days (week_id, day_id, day_of_week, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(entry.week_id)
            .bind(entry.day_id)
            .bind(entry.day_of_week.as_str())
            .bind(entry.position)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn days_for(&self, week_id: Uuid) -> Result<Vec<WeekDay>> {
        let rows = sqlx::query(
            r#"
            SELECT week_id, day_id, day_of_week, position
            FROM week_days
            WHERE week_id = $1
            ORDER BY position
            "#,
        )
        .bind(week_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row: PgRow| {
                let raw: String = row.try_get("day_of_week")?;
                Ok(WeekDay {
                    week_id: row.try_get("week_id")?,
                    day_id: row.try_get("day_id")?,
                    day_of_week: parse::<Weekday>(&raw)?,
                    position: row.try_get("position")?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Cycles

#[derive(FromRow)]
struct CycleRow {
    id: Uuid,
    name: String,
    length_weeks: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CycleRow> for Cycle {
    fn from(row: CycleRow) -> Self {
        Cycle {
            id: row.id,
            name: row.name,
            length_weeks: row.length_weeks,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CycleRepo for PgStore {
    async fn create(&self, cycle: Cycle) -> Result<Cycle> {
        sqlx::query(
            r#"
            INSERT INTO cycles (id, name, length_weeks, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(cycle.id)
        .bind(&cycle.name)
        .bind(cycle.length_weeks)
        .bind(cycle.created_at)
        .bind(cycle.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(cycle)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Cycle>> {
        let row = sqlx::query_as::<_, CycleRow>("SELECT * FROM cycles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Cycle::from))
    }

    async fn list(&self) -> Result<Vec<Cycle>> {
        let rows = sqlx::query_as::<_, CycleRow>("SELECT * FROM cycles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Cycle::from).collect())
    }

    async fn update(&self, cycle: Cycle) -> Result<Option<Cycle>> {
        let result = sqlx::query(
            "UPDATE cycles SET name = $2, length_weeks = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(cycle.id)
        .bind(&cycle.name)
        .bind(cycle.length_weeks)
        .bind(cycle.updated_at)
        .execute(&self.pool)
        .await?;
        Ok((result.rows_affected() > 0).then_some(cycle))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cycles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Programs

#[derive(FromRow)]
struct ProgramRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    cycle_id: Uuid,
    weekly_lookup_id: Option<Uuid>,
    daily_lookup_id: Option<Uuid>,
    rotation_lookup_id: Option<Uuid>,
    rounding_increment: f64,
    rounding_direction: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProgramRow> for Program {
    type Error = anyhow::Error;

    fn try_from(row: ProgramRow) -> Result<Self> {
        Ok(Program {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            cycle_id: row.cycle_id,
            weekly_lookup_id: row.weekly_lookup_id,
            daily_lookup_id: row.daily_lookup_id,
            rotation_lookup_id: row.rotation_lookup_id,
            default_rounding: Rounding {
                increment: row.rounding_increment,
                direction: parse::<RoundingDirection>(&row.rounding_direction)?,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ProgramRepo for PgStore {
    async fn create(&self, program: Program) -> Result<Program> {
        sqlx::query(
            r#"
            INSERT INTO programs (
                id, name, slug, description, cycle_id, weekly_lookup_id, daily_lookup_id,
                rotation_lookup_id, rounding_increment, rounding_direction, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(program.id)
        .bind(&program.name)
        .bind(&program.slug)
        .bind(&program.description)
        .bind(program.cycle_id)
        .bind(program.weekly_lookup_id)
        .bind(program.daily_lookup_id)
        .bind(program.rotation_lookup_id)
        .bind(program.default_rounding.increment)
        .bind(program.default_rounding.direction.as_str())
        .bind(program.created_at)
        .bind(program.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(program)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Program>> {
        let row = sqlx::query_as::<_, ProgramRow>("SELECT * FROM programs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Program::try_from).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Program>> {
        let row = sqlx::query_as::<_, ProgramRow>("SELECT * FROM programs WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Program::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Program>> {
        let rows = sqlx::query_as::<_, ProgramRow>("SELECT * FROM programs ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Program::try_from).collect()
    }

    async fn update(&self, program: Program) -> Result<Option<Program>> {
        let result = sqlx::query(
            r#"
            UPDATE programs
            SET name = $2, description = $3, cycle_id = $4, weekly_lookup_id = $5,
                daily_lookup_id = $6, rotation_lookup_id = $7, rounding_increment = $8,
                rounding_direction = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(program.id)
        .bind(&program.name)
        .bind(&program.description)
        .bind(program.cycle_id)
        .bind(program.weekly_lookup_id)
        .bind(program.daily_lookup_id)
        .bind(program.rotation_lookup_id)
        .bind(program.default_rounding.increment)
        .bind(program.default_rounding.direction.as_str())
        .bind(program.updated_at)
        .execute(&self.pool)
        .await?;
        Ok((result.rows_affected() > 0).then_some(program))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Lookups: entries live in one jsonb column per table.

#[derive(FromRow)]
struct LookupRow {
    id: Uuid,
    name: String,
    entries: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// The three lookup tables share one (id, name, entries jsonb) shape, so the
// SQL is parameterized over the table name (a fixed literal, never input).
impl PgStore {
    async fn insert_lookup(
        &self,
        table: &str,
        id: Uuid,
        name: &str,
        entries: Value,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {table} (id, name, entries, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)"
        ))
        .bind(id)
        .bind(name)
        .bind(entries)
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_lookup(&self, table: &str, id: Uuid) -> Result<Option<LookupRow>> {
        Ok(
            sqlx::query_as::<_, LookupRow>(&format!("SELECT * FROM {table} WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_lookups(&self, table: &str) -> Result<Vec<LookupRow>> {
        Ok(
            sqlx::query_as::<_, LookupRow>(&format!("SELECT * FROM {table} ORDER BY name"))
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update_lookup(
        &self,
        table: &str,
        id: Uuid,
        name: &str,
        entries: Value,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(&format!(
            "UPDATE {table} SET name = $2, entries = $3, updated_at = $4 WHERE id = $1"
        ))
        .bind(id)
        .bind(name)
        .bind(entries)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_lookup(&self, table: &str, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn weekly_from_row(row: LookupRow) -> Result<WeeklyLookup> {
    Ok(WeeklyLookup {
        id: row.id,
        name: row.name,
        entries: serde_json::from_value::<Vec<WeeklyLookupEntry>>(row.entries)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn daily_from_row(row: LookupRow) -> Result<DailyLookup> {
    Ok(DailyLookup {
        id: row.id,
        name: row.name,
        entries: serde_json::from_value::<Vec<DailyLookupEntry>>(row.entries)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rotation_from_row(row: LookupRow) -> Result<RotationLookup> {
    Ok(RotationLookup {
        id: row.id,
        name: row.name,
        entries: serde_json::from_value::<Vec<RotationLookupEntry>>(row.entries)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl LookupRepo for PgStore {
    async fn create_weekly(&self, lookup: WeeklyLookup) -> Result<WeeklyLookup> {
        self.insert_lookup(
            "weekly_lookups",
            lookup.id,
            &lookup.name,
            serde_json::to_value(&lookup.entries)?,
            lookup.created_at,
            lookup.updated_at,
        )
        .await?;
        Ok(lookup)
    }

    async fn get_weekly(&self, id: Uuid) -> Result<Option<WeeklyLookup>> {
        self.get_lookup("weekly_lookups", id)
            .await?
            .map(weekly_from_row)
            .transpose()
    }

    async fn list_weekly(&self) -> Result<Vec<WeeklyLookup>> {
        self.list_lookups("weekly_lookups")
            .await?
            .into_iter()
            .map(weekly_from_row)
            .collect()
    }

    async fn update_weekly(&self, lookup: WeeklyLookup) -> Result<Option<WeeklyLookup>> {
        let updated = self
            .update_lookup(
                "weekly_lookups",
                lookup.id,
                &lookup.name,
                serde_json::to_value(&lookup.entries)?,
                lookup.updated_at,
            )
            .await?;
        Ok(updated.then_some(lookup))
    }

    async fn delete_weekly(&self, id: Uuid) -> Result<bool> {
        self.delete_lookup("weekly_lookups", id).await
    }

    async fn create_daily(&self, lookup: DailyLookup) -> Result<DailyLookup> {
        self.insert_lookup(
            "daily_lookups",
            lookup.id,
            &lookup.name,
            serde_json::to_value(&lookup.entries)?,
            lookup.created_at,
            lookup.updated_at,
        )
        .await?;
        Ok(lookup)
    }

    async fn get_daily(&self, id: Uuid) -> Result<Option<DailyLookup>> {
        self.get_lookup("daily_lookups", id)
            .await?
            .map(daily_from_row)
            .transpose()
    }

    async fn list_daily(&self) -> Result<Vec<DailyLookup>> {
        self.list_lookups("daily_lookups")
            .await?
            .into_iter()
            .map(daily_from_row)
            .collect()
    }

    async fn update_daily(&self, lookup: DailyLookup) -> Result<Option<DailyLookup>> {
        let updated = self
            .update_lookup(
                "daily_lookups",
                lookup.id,
                &lookup.name,
                serde_json::to_value(&lookup.entries)?,
                lookup.updated_at,
            )
            .await?;
        Ok(updated.then_some(lookup))
    }

    async fn delete_daily(&self, id: Uuid) -> Result<bool> {
        self.delete_lookup("daily_lookups", id).await
    }

    async fn create_rotation(&self, lookup: RotationLookup) -> Result<RotationLookup> {
        self.insert_lookup(
            "rotation_lookups",
            lookup.id,
            &lookup.name,
            serde_json::to_value(&lookup.entries)?,
            lookup.created_at,
            lookup.updated_at,
        )
        .await?;
        Ok(lookup)
    }

    async fn get_rotation(&self, id: Uuid) -> Result<Option<RotationLookup>> {
        self.get_lookup("rotation_lookups", id)
            .await?
            .map(rotation_from_row)
            .transpose()
    }

    async fn list_rotation(&self) -> Result<Vec<RotationLookup>> {
        self.list_lookups("rotation_lookups")
            .await?
            .into_iter()
            .map(rotation_from_row)
            .collect()
    }

    async fn update_rotation(&self, lookup: RotationLookup) -> Result<Option<RotationLookup>> {
        let updated = self
            .update_lookup(
                "rotation_lookups",
                lookup.id,
                &lookup.name,
                serde_json::to_value(&lookup.entries)?,
                lookup.updated_at,
            )
            .await?;
        Ok(updated.then_some(lookup))
    }

    async fn delete_rotation(&self, id: Uuid) -> Result<bool> {
        self.delete_lookup("rotation_lookups", id).await
    }
}

// ---------------------------------------------------------------------------
// Progressions

#[derive(FromRow)]
struct ProgressionRow {
    id: Uuid,
    name: String,
    trigger_type: String,
    max_type: String,
    parameters: Value,
    state: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProgressionRow> for Progression {
    type Error = anyhow::Error;

    fn try_from(row: ProgressionRow) -> Result<Self> {
        Ok(Progression {
            id: row.id,
            name: row.name,
            trigger_type: parse(&row.trigger_type)?,
            max_type: parse(&row.max_type)?,
            params: serde_json::from_value::<ProgressionParams>(row.parameters)?,
            state: serde_json::from_value::<ProgressionState>(row.state)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ProgressionRepo for PgStore {
    async fn create(&self, progression: Progression) -> Result<Progression> {
        sqlx::query(
            r#"
            INSERT INTO progressions (id, name, trigger_type, max_type, parameters, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(progression.id)
        .bind(&progression.name)
        .bind(progression.trigger_type.as_str())
        .bind(progression.max_type.as_str())
        .bind(serde_json::to_value(&progression.params)?)
        .bind(serde_json::to_value(&progression.state)?)
        .bind(progression.created_at)
        .bind(progression.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(progression)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Progression>> {
        let row = sqlx::query_as::<_, ProgressionRow>("SELECT * FROM progressions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Progression::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Progression>> {
        let rows = sqlx::query_as::<_, ProgressionRow>("SELECT * FROM progressions ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Progression::try_from).collect()
    }

    async fn update(&self, progression: Progression) -> Result<Option<Progression>> {
        let result = sqlx::query(
            r#"
            UPDATE progressions
            SET name = $2, trigger_type = $3, max_type = $4, parameters = $5, state = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(progression.id)
        .bind(&progression.name)
        .bind(progression.trigger_type.as_str())
        .bind(progression.max_type.as_str())
        .bind(serde_json::to_value(&progression.params)?)
        .bind(serde_json::to_value(&progression.state)?)
        .bind(progression.updated_at)
        .execute(&self.pool)
        .await?;
        Ok((result.rows_affected() > 0).then_some(progression))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM progressions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit_event_effects(&self, effects: Vec<ProgressionEffect>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for effect in effects {
            sqlx::query("UPDATE progressions SET state = $2, updated_at = $3 WHERE id = $1")
                .bind(effect.progression_id)
                .bind(serde_json::to_value(&effect.new_state)?)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
            if let Some(max) = effect.new_max {
                sqlx::query(
                    r#"
                    INSERT INTO lift_maxes (id, user_id, lift_id, max_type, value, effective_date, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(max.id)
                .bind(max.user_id)
                .bind(max.lift_id)
                .bind(max.max_type.as_str())
                .bind(max.value)
                .bind(max.effective_date)
                .bind(max.created_at)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Program progressions

#[derive(FromRow)]
struct ProgramProgressionRow {
    id: Uuid,
    program_id: Uuid,
    progression_id: Uuid,
    lift_id: Uuid,
    priority: i32,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl From<ProgramProgressionRow> for ProgramProgression {
    fn from(row: ProgramProgressionRow) -> Self {
        ProgramProgression {
            id: row.id,
            program_id: row.program_id,
            progression_id: row.progression_id,
            lift_id: row.lift_id,
            priority: row.priority,
            enabled: row.enabled,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ProgramProgressionRepo for PgStore {
    async fn link(&self, link: ProgramProgression) -> Result<ProgramProgression> {
        sqlx::query(
            r#"
            INSERT INTO program_progressions (id, program_id, progression_id, lift_id, priority, enabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(link.id)
        .bind(link.program_id)
        .bind(link.progression_id)
        .bind(link.lift_id)
        .bind(link.priority)
        .bind(link.enabled)
        .bind(link.created_at)
        .execute(&self.pool)
        .await?;
        Ok(link)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ProgramProgression>> {
        let row = sqlx::query_as::<_, ProgramProgressionRow>(
            "SELECT * FROM program_progressions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ProgramProgression::from))
    }

    async fn list_for_program(&self, program_id: Uuid) -> Result<Vec<ProgramProgression>> {
        let rows = sqlx::query_as::<_, ProgramProgressionRow>(
            r#"
            SELECT * FROM program_progressions
            WHERE program_id = $1
            ORDER BY priority, created_at
            "#,
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProgramProgression::from).collect())
    }

    async fn update(&self, link: ProgramProgression) -> Result<Option<ProgramProgression>> {
        let result = sqlx::query(
            "UPDATE program_progressions SET priority = $2, enabled = $3 WHERE id = $1",
        )
        .bind(link.id)
        .bind(link.priority)
        .bind(link.enabled)
        .execute(&self.pool)
        .await?;
        Ok((result.rows_affected() > 0).then_some(link))
    }

    async fn unlink(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM program_progressions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// User program state

#[derive(FromRow)]
struct UserProgramStateRow {
    id: Uuid,
    user_id: Uuid,
    program_id: Uuid,
    current_week: i32,
    current_cycle_iteration: i32,
    current_day_index: Option<i32>,
    rotation_position: i32,
    cycles_since_start: i32,
    meet_date: Option<NaiveDate>,
    schedule_type: String,
    enrollment_status: String,
    cycle_status: String,
    week_status: String,
    enrolled_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserProgramStateRow> for UserProgramState {
    type Error = anyhow::Error;

    fn try_from(row: UserProgramStateRow) -> Result<Self> {
        Ok(UserProgramState {
            id: row.id,
            user_id: row.user_id,
            program_id: row.program_id,
            current_week: row.current_week,
            current_cycle_iteration: row.current_cycle_iteration,
            current_day_index: row.current_day_index,
            rotation_position: row.rotation_position,
            cycles_since_start: row.cycles_since_start,
            meet_date: row.meet_date,
            schedule_type: parse(&row.schedule_type)?,
            enrollment_status: parse(&row.enrollment_status)?,
            cycle_status: parse(&row.cycle_status)?,
            week_status: parse(&row.week_status)?,
            enrolled_at: row.enrolled_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserProgramStateRepo for PgStore {
    async fn create(&self, state: UserProgramState) -> Result<UserProgramState> {
        sqlx::query(
            r#"
            INSERT INTO user_program_states (
                id, user_id, program_id, current_week, current_cycle_iteration,
                current_day_index, rotation_position, cycles_since_start, meet_date,
                schedule_type, enrollment_status, cycle_status, week_status,
                enrolled_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(state.id)
        .bind(state.user_id)
        .bind(state.program_id)
        .bind(state.current_week)
        .bind(state.current_cycle_iteration)
        .bind(state.current_day_index)
        .bind(state.rotation_position)
        .bind(state.cycles_since_start)
        .bind(state.meet_date)
        .bind(state.schedule_type.as_str())
        .bind(state.enrollment_status.as_str())
        .bind(state.cycle_status.as_str())
        .bind(state.week_status.as_str())
        .bind(state.enrolled_at)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(state)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserProgramState>> {
        let row = sqlx::query_as::<_, UserProgramStateRow>(
            "SELECT * FROM user_program_states WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserProgramState::try_from).transpose()
    }

    async fn get_for_user(&self, user_id: Uuid) -> Result<Option<UserProgramState>> {
        let row = sqlx::query_as::<_, UserProgramStateRow>(
            "SELECT * FROM user_program_states WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserProgramState::try_from).transpose()
    }

    async fn update(
        &self,
        state: UserProgramState,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        // The updated_at guard turns lost-update races into conflicts.
        let result = sqlx::query(
            r#"
            UPDATE user_program_states
            SET current_week = $2, current_cycle_iteration = $3, current_day_index = $4,
                rotation_position = $5, cycles_since_start = $6, meet_date = $7,
                schedule_type = $8, enrollment_status = $9, cycle_status = $10,
                week_status = $11, updated_at = $12
            WHERE id = $1 AND updated_at = $13
            "#,
        )
        .bind(state.id)
        .bind(state.current_week)
        .bind(state.current_cycle_iteration)
        .bind(state.current_day_index)
        .bind(state.rotation_position)
        .bind(state.cycles_since_start)
        .bind(state.meet_date)
        .bind(state.schedule_type.as_str())
        .bind(state.enrollment_status.as_str())
        .bind(state.cycle_status.as_str())
        .bind(state.week_status.as_str())
        .bind(state.updated_at)
        .bind(expected_updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_program_states WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Sessions

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    user_program_state_id: Uuid,
    week_number: i32,
    day_index: i32,
    status: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<SessionRow> for WorkoutSession {
    type Error = anyhow::Error;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(WorkoutSession {
            id: row.id,
            user_program_state_id: row.user_program_state_id,
            week_number: row.week_number,
            day_index: row.day_index,
            status: parse::<SessionStatus>(&row.status)?,
            started_at: row.started_at,
            finished_at: row.finished_at,
        })
    }
}

#[derive(FromRow)]
struct SetRecordRow {
    id: Uuid,
    session_id: Uuid,
    prescription_id: Uuid,
    lift_id: Uuid,
    set_number: i32,
    weight: f64,
    target_reps: i32,
    reps_performed: i32,
    is_amrap: bool,
    logged_at: DateTime<Utc>,
}

impl From<SetRecordRow> for SetRecord {
    fn from(row: SetRecordRow) -> Self {
        SetRecord {
            id: row.id,
            session_id: row.session_id,
            prescription_id: row.prescription_id,
            lift_id: row.lift_id,
            set_number: row.set_number,
            weight: row.weight,
            target_reps: row.target_reps,
            reps_performed: row.reps_performed,
            is_amrap: row.is_amrap,
            logged_at: row.logged_at,
        }
    }
}

#[async_trait]
impl SessionRepo for PgStore {
    async fn create(&self, session: WorkoutSession) -> Result<WorkoutSession> {
        sqlx::query(
            r#"
            INSERT INTO workout_sessions (id, user_program_state_id, week_number, day_index, status, started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id)
        .bind(session.user_program_state_id)
        .bind(session.week_number)
        .bind(session.day_index)
        .bind(session.status.as_str())
        .bind(session.started_at)
        .bind(session.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(session)
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkoutSession>> {
        let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM workout_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(WorkoutSession::try_from).transpose()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<Option<WorkoutSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE workout_sessions SET status = $2, finished_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(finished_at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(WorkoutSession::try_from).transpose()
    }

    async fn add_set(&self, set: SetRecord) -> Result<SetRecord> {
        sqlx::query(
            r#"
            INSERT INTO set_records (id, session_id, prescription_id, lift_id, set_number, weight, target_reps, reps_performed, is_amrap, logged_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(set.id)
        .bind(set.session_id)
        .bind(set.prescription_id)
        .bind(set.lift_id)
        .bind(set.set_number)
        .bind(set.weight)
        .bind(set.target_reps)
        .bind(set.reps_performed)
        .bind(set.is_amrap)
        .bind(set.logged_at)
        .execute(&self.pool)
        .await?;
        Ok(set)
    }

    async fn sets_for_session(&self, session_id: Uuid) -> Result<Vec<SetRecord>> {
        let rows = sqlx::query_as::<_, SetRecordRow>(
            "SELECT * FROM set_records WHERE session_id = $1 ORDER BY logged_at, set_number",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SetRecord::from).collect())
    }

    async fn for_state_week(
        &self,
        user_program_state_id: Uuid,
        week_number: i32,
    ) -> Result<Vec<WorkoutSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT * FROM workout_sessions
            WHERE user_program_state_id = $1 AND week_number = $2
            ORDER BY started_at
            "#,
        )
        .bind(user_program_state_id)
        .bind(week_number)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(WorkoutSession::try_from).collect()
    }
}
