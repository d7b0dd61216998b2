//! Series-aware CRUD over a collection of dated amount records.
//!
//! A recurring submission is stored as its expanded instances. Every mutation
//! on a series member resolves its siblings through the explicit `series_id`
//! and applies to either the single instance or the whole series, as chosen
//! by the caller. The collection is loaded once when the service opens and
//! written back in full after each committed mutation.

use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::clock::Clock;
use crate::core::recurring::{expand, RecurrenceGenerator, RecurringRule, DEFAULT_HORIZON_MONTHS};
use crate::records::{
    add_months, DatedAmountRecord, MutationScope, NewRecord, RecordId, RecordPatch,
};
use crate::storage::Repository;

use super::{validate_amount, validate_label, ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSettings {
    pub horizon_months: u32,
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            horizon_months: DEFAULT_HORIZON_MONTHS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub series_id: Uuid,
    pub created: Vec<RecordId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub scope: MutationScope,
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Only the targeted record changed.
    Instance,
    /// Every sibling received the patch in place.
    Series { updated: usize },
    /// The series was replaced by one non-recurring record.
    Collapsed { removed: usize },
    /// The series was regenerated against a new end date.
    Regenerated { instances: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub series_checked: usize,
    pub series_extended: usize,
    pub instances_added: usize,
}

pub struct RecordService<R, C> {
    repository: R,
    clock: C,
    generator: RecurrenceGenerator,
    records: Vec<DatedAmountRecord>,
}

impl<R, C> RecordService<R, C>
where
    R: Repository<DatedAmountRecord>,
    C: Clock,
{
    /// Loads the collection from `repository`.
    pub fn open(repository: R, clock: C, settings: RecordSettings) -> ServiceResult<Self> {
        let records = repository.load()?;
        debug!(count = records.len(), "loaded record collection");
        Ok(Self {
            repository,
            clock,
            generator: RecurrenceGenerator::new(settings.horizon_months),
            records,
        })
    }

    pub fn records(&self) -> &[DatedAmountRecord] {
        &self.records
    }

    pub fn record(&self, id: &RecordId) -> Option<&DatedAmountRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Every record sharing the series of `id`, the target included.
    pub fn siblings(&self, id: &RecordId) -> ServiceResult<Vec<&DatedAmountRecord>> {
        let target = self.find(id)?;
        Ok(self
            .records
            .iter()
            .filter(|r| r.series_id == target.series_id)
            .collect())
    }

    /// Whether a mutation on `id` needs an instance-or-series decision.
    pub fn is_part_of_series(&self, id: &RecordId) -> ServiceResult<bool> {
        Ok(self.siblings(id)?.len() > 1)
    }

    /// Stores a new record; a recurring submission is expanded from its date
    /// through its end date, or the rolling horizon when it has none.
    pub fn add(&mut self, input: NewRecord) -> ServiceResult<AddOutcome> {
        validate_amount(input.amount)?;
        validate_label("category", &input.category)?;

        let series_id = Uuid::new_v4();
        let created = if input.is_recurring() {
            let rule = RecurringRule::from_new(series_id, &input);
            self.generator
                .generate(&rule, input.date, input.end_date, self.clock.today())
        } else {
            vec![DatedAmountRecord::standalone(series_id, &input)]
        };

        let ids: Vec<RecordId> = created.iter().map(|r| r.id.clone()).collect();
        let mut next = self.records.clone();
        next.extend(created);
        self.commit(next)?;

        info!(
            series = %series_id,
            instances = ids.len(),
            recurring = input.is_recurring(),
            "record added"
        );
        Ok(AddOutcome {
            series_id,
            created: ids,
        })
    }

    /// Removes one instance, or its whole series when `scope` asks for it and
    /// the record has siblings.
    pub fn remove(&mut self, id: &RecordId, scope: MutationScope) -> ServiceResult<RemoveOutcome> {
        let (series_id, sibling_count) = self.series_of(id)?;
        let scope = resolve_scope(sibling_count, scope);
        debug!(%id, siblings = sibling_count, ?scope, "resolved removal scope");

        let next: Vec<DatedAmountRecord> = match scope {
            MutationScope::Instance => self.records.iter().filter(|r| &r.id != id).cloned().collect(),
            MutationScope::Series => self
                .records
                .iter()
                .filter(|r| r.series_id != series_id)
                .cloned()
                .collect(),
        };
        let removed = self.records.len() - next.len();
        self.commit(next)?;

        info!(%id, removed, ?scope, "record removed");
        Ok(RemoveOutcome { scope, removed })
    }

    /// Applies `patch` to one instance or across its series.
    ///
    /// Series-wide patches that turn recurrence off collapse the series into
    /// its earliest member; patches carrying an end date regenerate the series
    /// from its earliest date. Other patches rewrite each sibling in place,
    /// keeping every sibling's own dates.
    pub fn update(
        &mut self,
        id: &RecordId,
        patch: RecordPatch,
        scope: MutationScope,
    ) -> ServiceResult<UpdateOutcome> {
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        if let Some(category) = &patch.category {
            validate_label("category", category)?;
        }

        let (series_id, sibling_count) = self.series_of(id)?;
        let scope = resolve_scope(sibling_count, scope);
        debug!(%id, siblings = sibling_count, ?scope, "resolved update scope");

        if scope == MutationScope::Instance {
            let mut next = self.records.clone();
            if let Some(record) = next.iter_mut().find(|r| &r.id == id) {
                record.apply_patch(&patch);
            }
            self.commit(next)?;
            info!(%id, "record updated");
            return Ok(UpdateOutcome::Instance);
        }

        if !patch.is_structural() {
            let mut next = self.records.clone();
            for record in next.iter_mut().filter(|r| r.series_id == series_id) {
                record.apply_patch(&patch);
            }
            self.commit(next)?;
            info!(series = %series_id, updated = sibling_count, "series updated");
            return Ok(UpdateOutcome::Series {
                updated: sibling_count,
            });
        }

        let mut anchor = self
            .earliest_in_series(series_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(id.clone()))?;
        anchor.apply_patch(&patch);

        if patch.is_recurring == Some(false) {
            anchor.is_recurring = false;
            anchor.recurrence_interval = None;
            anchor.next_due_date = None;
            anchor.end_date = None;
            let next = replace_series(&self.records, series_id, vec![anchor]);
            self.commit(next)?;
            info!(series = %series_id, removed = sibling_count, "series collapsed to a single record");
            return Ok(UpdateOutcome::Collapsed {
                removed: sibling_count,
            });
        }

        let end_date = patch.end_date;
        let rule = RecurringRule::from_record(&anchor);
        let regenerated = self
            .generator
            .generate(&rule, anchor.date, end_date, self.clock.today());
        let instances = regenerated.len();
        let next = replace_series(&self.records, series_id, regenerated);
        self.commit(next)?;
        info!(series = %series_id, instances, "series regenerated with new end date");
        Ok(UpdateOutcome::Regenerated { instances })
    }

    /// Extends every recurring series whose horizon has not been reached.
    /// Only dates after a series' latest instance are generated, so removed
    /// instances inside the series stay removed.
    pub fn refresh(&mut self) -> ServiceResult<RefreshReport> {
        let today = self.clock.today();
        let mut report = RefreshReport::default();
        let mut seen = HashSet::new();
        let series_ids: Vec<Uuid> = self
            .records
            .iter()
            .filter(|r| r.is_recurring_rule())
            .map(|r| r.series_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let mut next = self.records.clone();
        for series_id in series_ids {
            report.series_checked += 1;
            let siblings: Vec<&DatedAmountRecord> =
                next.iter().filter(|r| r.series_id == series_id).collect();
            let (Some(anchor), Some(latest)) = (
                siblings.iter().min_by_key(|r| r.date).copied(),
                siblings.iter().max_by_key(|r| r.date).copied(),
            ) else {
                continue;
            };

            let boundary = self.generator.boundary(anchor.end_date, today);
            let horizon_open = latest.next_due_date.is_some()
                || (anchor.end_date.is_none() && add_months(latest.date, 1) < boundary);
            if !horizon_open {
                continue;
            }

            let latest_id = latest.id.clone();
            let latest_date = latest.date;
            let rule = RecurringRule::from_record(anchor);
            let tail: Vec<DatedAmountRecord> = expand(&rule, anchor.date, boundary)
                .into_iter()
                .filter(|r| r.date > latest_date)
                .collect();
            if tail.is_empty() {
                continue;
            }
            report.series_extended += 1;
            report.instances_added += tail.len();
            next = extend_series(next, &latest_id, tail);
        }

        if report.instances_added > 0 {
            self.commit(next)?;
            info!(
                added = report.instances_added,
                series = report.series_extended,
                "generated new recurring instances"
            );
        } else {
            debug!(checked = report.series_checked, "refresh found nothing to extend");
        }
        Ok(report)
    }

    fn find(&self, id: &RecordId) -> ServiceResult<&DatedAmountRecord> {
        self.record(id).ok_or_else(|| {
            warn!(%id, "record not found");
            ServiceError::NotFound(id.clone())
        })
    }

    fn series_of(&self, id: &RecordId) -> ServiceResult<(Uuid, usize)> {
        let series_id = self.find(id)?.series_id;
        let count = self
            .records
            .iter()
            .filter(|r| r.series_id == series_id)
            .count();
        Ok((series_id, count))
    }

    fn earliest_in_series(&self, series_id: Uuid) -> Option<&DatedAmountRecord> {
        self.records
            .iter()
            .filter(|r| r.series_id == series_id)
            .min_by_key(|r| r.date)
    }

    fn commit(&mut self, next: Vec<DatedAmountRecord>) -> ServiceResult<()> {
        self.repository.store(&next)?;
        self.records = next;
        Ok(())
    }
}

fn resolve_scope(sibling_count: usize, requested: MutationScope) -> MutationScope {
    if sibling_count > 1 {
        requested
    } else {
        MutationScope::Instance
    }
}

/// Swaps the members of `series_id` for `replacement`, placed where the first
/// member used to be.
fn replace_series(
    records: &[DatedAmountRecord],
    series_id: Uuid,
    replacement: Vec<DatedAmountRecord>,
) -> Vec<DatedAmountRecord> {
    let position = records.iter().position(|r| r.series_id == series_id);
    let mut next: Vec<DatedAmountRecord> = records
        .iter()
        .filter(|r| r.series_id != series_id)
        .cloned()
        .collect();
    let at = position.unwrap_or(next.len()).min(next.len());
    next.splice(at..at, replacement);
    next
}

/// Inserts `tail` after the record `latest` and links that record to it.
fn extend_series(
    mut records: Vec<DatedAmountRecord>,
    latest: &RecordId,
    tail: Vec<DatedAmountRecord>,
) -> Vec<DatedAmountRecord> {
    let Some(position) = records.iter().position(|r| &r.id == latest) else {
        records.extend(tail);
        return records;
    };
    records[position].next_due_date = tail.first().map(|r| r.date);
    records.splice(position + 1..position + 1, tail);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::storage::MemoryRepository;
    use chrono::NaiveDate;

    type TestService = RecordService<MemoryRepository<DatedAmountRecord>, FixedClock>;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service_on(today: NaiveDate) -> TestService {
        RecordService::open(
            MemoryRepository::new(),
            FixedClock::on(today),
            RecordSettings::default(),
        )
        .expect("open service")
    }

    #[test]
    fn standalone_record_is_its_own_series() {
        let mut service = service_on(date(2024, 1, 1));
        let outcome = service
            .add(NewRecord::new(date(2024, 1, 5), 42.0, "Groceries"))
            .expect("add");
        assert_eq!(outcome.created.len(), 1);
        let record = service.record(&outcome.created[0]).expect("stored");
        assert_eq!(record.id, RecordId::standalone(outcome.series_id));
        assert!(!record.is_recurring);
        assert_eq!(record.next_due_date, None);
        assert!(!service.is_part_of_series(&record.id).unwrap());
    }

    #[test]
    fn add_rejects_negative_amount_without_mutation() {
        let mut service = service_on(date(2024, 1, 1));
        let err = service
            .add(NewRecord::new(date(2024, 1, 5), -1.0, "Groceries"))
            .expect_err("negative amount");
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(service.records().is_empty());
    }

    #[test]
    fn add_rejects_blank_category() {
        let mut service = service_on(date(2024, 1, 1));
        let err = service
            .add(NewRecord::new(date(2024, 1, 5), 1.0, "  "))
            .expect_err("blank category");
        assert!(matches!(err, ServiceError::Validation(ref msg) if msg.contains("category")));
    }

    #[test]
    fn missing_id_is_reported_and_leaves_collection_intact() {
        let mut service = service_on(date(2024, 1, 1));
        service
            .add(NewRecord::new(date(2024, 1, 5), 42.0, "Groceries"))
            .expect("add");
        let ghost = RecordId::from("missing");
        let err = service
            .remove(&ghost, MutationScope::Series)
            .expect_err("unknown id");
        assert!(matches!(err, ServiceError::NotFound(ref id) if id == &ghost));
        assert_eq!(service.records().len(), 1);
    }

    #[test]
    fn series_wide_rename_keeps_dates() {
        let mut service = service_on(date(2024, 1, 15));
        let outcome = service
            .add(
                NewRecord::new(date(2024, 1, 15), 100.0, "Software")
                    .monthly()
                    .until(date(2024, 4, 15)),
            )
            .expect("add");
        let before: Vec<_> = service
            .records()
            .iter()
            .map(|r| (r.date, r.next_due_date))
            .collect();

        let patch = RecordPatch {
            category: Some("Tools".into()),
            amount: Some(120.0),
            ..RecordPatch::default()
        };
        let result = service
            .update(&outcome.created[1], patch, MutationScope::Series)
            .expect("update");
        assert_eq!(result, UpdateOutcome::Series { updated: 3 });

        let after: Vec<_> = service
            .records()
            .iter()
            .map(|r| (r.date, r.next_due_date))
            .collect();
        assert_eq!(before, after);
        assert!(service
            .records()
            .iter()
            .all(|r| r.category == "Tools" && r.amount == 120.0));
    }

    #[test]
    fn single_instance_update_touches_only_target() {
        let mut service = service_on(date(2024, 1, 15));
        let outcome = service
            .add(
                NewRecord::new(date(2024, 1, 15), 100.0, "Software")
                    .monthly()
                    .until(date(2024, 4, 15)),
            )
            .expect("add");
        let target = outcome.created[2].clone();
        let patch = RecordPatch {
            amount: Some(80.0),
            ..RecordPatch::default()
        };
        let result = service
            .update(&target, patch, MutationScope::Instance)
            .expect("update");
        assert_eq!(result, UpdateOutcome::Instance);
        let amounts: Vec<_> = service.records().iter().map(|r| r.amount).collect();
        assert_eq!(amounts, [100.0, 100.0, 80.0]);
    }

    #[test]
    fn collapse_clears_recurrence_fields() {
        let mut service = service_on(date(2024, 1, 15));
        let outcome = service
            .add(NewRecord::new(date(2024, 1, 15), 100.0, "Software").monthly())
            .expect("add");
        let patch = RecordPatch {
            is_recurring: Some(false),
            ..RecordPatch::default()
        };
        let result = service
            .update(&outcome.created[5], patch, MutationScope::Series)
            .expect("collapse");
        assert_eq!(result, UpdateOutcome::Collapsed { removed: 24 });

        let records = service.records();
        assert_eq!(records.len(), 1);
        let only = &records[0];
        assert_eq!(only.series_id, outcome.series_id);
        assert_eq!(only.date, date(2024, 1, 15));
        assert!(!only.is_recurring);
        assert_eq!(only.recurrence_interval, None);
        assert_eq!(only.next_due_date, None);
        assert_eq!(only.end_date, None);
    }

    #[test]
    fn refresh_is_noop_when_horizon_exhausted() {
        let mut service = service_on(date(2024, 1, 15));
        service
            .add(
                NewRecord::new(date(2024, 1, 15), 10.0, "Gym")
                    .monthly()
                    .until(date(2024, 6, 15)),
            )
            .expect("add");
        let report = service.refresh().expect("refresh");
        assert_eq!(report.series_checked, 1);
        assert_eq!(report.instances_added, 0);
        assert_eq!(service.records().len(), 5);
    }

    #[test]
    fn refresh_restores_removed_tail_instance() {
        let mut service = service_on(date(2024, 1, 15));
        let outcome = service
            .add(
                NewRecord::new(date(2024, 1, 15), 10.0, "Gym")
                    .monthly()
                    .until(date(2024, 6, 15)),
            )
            .expect("add");
        let last = outcome.created.last().cloned().expect("tail");
        service
            .remove(&last, MutationScope::Instance)
            .expect("remove tail");
        assert_eq!(service.records().len(), 4);

        let report = service.refresh().expect("refresh");
        assert_eq!(report.instances_added, 1);
        assert_eq!(service.records().len(), 5);
        assert!(service.record(&last).is_some());
    }

    #[test]
    fn replace_series_keeps_position() {
        let a = DatedAmountRecord::standalone(
            Uuid::new_v4(),
            &NewRecord::new(date(2024, 1, 1), 1.0, "A"),
        );
        let b = DatedAmountRecord::standalone(
            Uuid::new_v4(),
            &NewRecord::new(date(2024, 1, 1), 2.0, "B"),
        );
        let c = DatedAmountRecord::standalone(
            Uuid::new_v4(),
            &NewRecord::new(date(2024, 1, 1), 3.0, "C"),
        );
        let mut replacement = b.clone();
        replacement.amount = 20.0;
        let records = vec![a, b.clone(), c];
        let next = replace_series(&records, b.series_id, vec![replacement]);
        let amounts: Vec<_> = next.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, [1.0, 20.0, 3.0]);
    }
}
