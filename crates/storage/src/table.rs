//! The in-memory `entities` table
//!
//! One ordered map from internal id to row, plus a public-id index standing
//! in for the `pub_id` unique constraint. All plan semantics of the schema
//! contract live here:
//!
//! - Insert assigns identity and both creation timestamps in one step, and
//!   resolves ownership inside that same step (self-ownership is the
//!   storage-side default; a named owner must already exist)
//! - Update and soft delete match live rows only, the way a soft-delete
//!   aware query layer filters archived rows out of writes by default
//! - Hard delete removes only rows that are already archived
//! - Select applies the archived filter and joins the owner's public id

use std::collections::{BTreeMap, HashMap};

use plinth_core::{
    ArchivedFilter, Column, Entity, Error, ExecMode, InternalId, OwnerSpec, Predicate, PublicId,
    QueryPlan, ResourceName, Result, SelectQuery, Timestamp, Value, WriteOutcome,
};

/// One persisted row of the `entities` table
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredRow {
    pub id: InternalId,
    pub pub_id: PublicId,
    pub resource_name: ResourceName,
    pub name: String,
    pub description: String,
    pub owner_id: InternalId,
    pub publicly_readable: bool,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// The table itself: rows ordered by internal id, plus the pub_id index
#[derive(Debug, Clone, Default)]
pub(crate) struct EntityTable {
    rows: BTreeMap<InternalId, StoredRow>,
    pub_index: HashMap<PublicId, InternalId>,
}

impl EntityTable {
    pub(crate) fn new() -> Self {
        EntityTable::default()
    }

    /// Insert a new row, assigning identity and resolving ownership
    ///
    /// `id` and `now` come from the caller because the id counter and the
    /// clock are shared across connections and transactions.
    pub(crate) fn insert(
        &mut self,
        plan: &QueryPlan,
        id: InternalId,
        now: Timestamp,
    ) -> Result<WriteOutcome> {
        let owner_id = match plan.owner.unwrap_or(OwnerSpec::SelfOwned) {
            OwnerSpec::SelfOwned => id,
            OwnerSpec::Resolve(pub_id) => *self.pub_index.get(&pub_id).ok_or_else(|| {
                Error::Storage(format!("owner {} does not resolve to an entity", pub_id))
            })?,
        };

        let row = StoredRow {
            id,
            pub_id: PublicId::generate(),
            resource_name: ResourceName::new(required_text(plan, Column::ResourceName)?),
            name: required_text(plan, Column::Name)?,
            description: required_text(plan, Column::Description)?,
            owner_id,
            publicly_readable: required_bool(plan, Column::PubliclyReadable)?,
            created_at: now,
            last_updated: now,
            deleted_at: None,
        };

        self.pub_index.insert(row.pub_id, id);
        let returned = returned_columns(plan, &row);
        self.rows.insert(id, row);

        Ok(WriteOutcome {
            rows_affected: 1,
            returned,
        })
    }

    /// Update live rows matching the plan's predicate
    pub(crate) fn update(&mut self, plan: &QueryPlan, now: Timestamp) -> Result<WriteOutcome> {
        let ids: Vec<InternalId> = self
            .matched_ids(plan.predicate)
            .into_iter()
            .filter(|id| self.rows[id].deleted_at.is_none())
            .collect();

        for id in &ids {
            let Some(row) = self.rows.get_mut(id) else {
                continue;
            };
            if let Some(Value::Text(name)) = plan.write_value(Column::Name) {
                row.name = name.clone();
            }
            if let Some(Value::Text(description)) = plan.write_value(Column::Description) {
                row.description = description.clone();
            }
            if let Some(Value::Bool(readable)) = plan.write_value(Column::PubliclyReadable) {
                row.publicly_readable = *readable;
            }
            row.last_updated = now;
        }

        Ok(self.outcome_for(plan, &ids))
    }

    /// Apply a delete plan: archive live rows, or remove archived rows
    pub(crate) fn delete(&mut self, plan: &QueryPlan, now: Timestamp) -> Result<WriteOutcome> {
        match plan.mode {
            ExecMode::SoftDelete => {
                let ids: Vec<InternalId> = self
                    .matched_ids(plan.predicate)
                    .into_iter()
                    .filter(|id| self.rows[id].deleted_at.is_none())
                    .collect();
                for id in &ids {
                    let Some(row) = self.rows.get_mut(id) else {
                        continue;
                    };
                    row.deleted_at = Some(now);
                    row.last_updated = now;
                }
                Ok(self.outcome_for(plan, &ids))
            }
            ExecMode::HardDelete => {
                let ids: Vec<InternalId> = self
                    .matched_ids(plan.predicate)
                    .into_iter()
                    .filter(|id| self.rows[id].deleted_at.is_some())
                    .collect();
                for id in &ids {
                    if let Some(row) = self.rows.remove(id) {
                        self.pub_index.remove(&row.pub_id);
                    }
                }
                Ok(WriteOutcome {
                    rows_affected: ids.len() as u64,
                    returned: Vec::new(),
                })
            }
            mode => Err(Error::Storage(format!(
                "delete handed a non-delete plan ({:?})",
                mode
            ))),
        }
    }

    /// Retrieve entities matching a query, in internal-id order
    pub(crate) fn select(&self, query: &SelectQuery) -> Result<Vec<Entity>> {
        let entities = self
            .matched_ids(query.predicate)
            .into_iter()
            .map(|id| &self.rows[&id])
            .filter(|row| match query.archived {
                ArchivedFilter::Live => row.deleted_at.is_none(),
                ArchivedFilter::Archived => row.deleted_at.is_some(),
                ArchivedFilter::Any => true,
            })
            .map(|row| self.to_entity(row))
            .collect();
        Ok(entities)
    }

    fn matched_ids(&self, predicate: Predicate) -> Vec<InternalId> {
        match predicate {
            Predicate::All => self.rows.keys().copied().collect(),
            Predicate::ById(id) => {
                if self.rows.contains_key(&id) {
                    vec![id]
                } else {
                    Vec::new()
                }
            }
            Predicate::ByPublicId(pub_id) => {
                self.pub_index.get(&pub_id).copied().into_iter().collect()
            }
        }
    }

    /// Read-backs are only meaningful when exactly one row was touched.
    fn outcome_for(&self, plan: &QueryPlan, ids: &[InternalId]) -> WriteOutcome {
        let returned = match ids {
            [id] => returned_columns(plan, &self.rows[id]),
            _ => Vec::new(),
        };
        WriteOutcome {
            rows_affected: ids.len() as u64,
            returned,
        }
    }

    /// Hydrate a row, joining the owner's public id for owned entities
    fn to_entity(&self, row: &StoredRow) -> Entity {
        let owner_public_id = if row.owner_id == row.id {
            None
        } else {
            self.rows.get(&row.owner_id).map(|owner| owner.pub_id)
        };
        Entity {
            internal_id: row.id,
            public_id: row.pub_id,
            resource_name: row.resource_name.clone(),
            name: row.name.clone(),
            description: row.description.clone(),
            owner_internal_id: row.owner_id,
            owner_public_id,
            publicly_readable: row.publicly_readable,
            created_at: row.created_at,
            last_updated: row.last_updated,
            deleted_at: row.deleted_at,
        }
    }
}

fn required_text(plan: &QueryPlan, column: Column) -> Result<String> {
    match plan.write_value(column) {
        Some(Value::Text(s)) => Ok(s.clone()),
        Some(other) => Err(Error::Storage(format!(
            "column {} expects text, plan wrote {:?}",
            column.as_str(),
            other
        ))),
        None => Err(Error::Storage(format!(
            "insert plan missing column {}",
            column.as_str()
        ))),
    }
}

fn required_bool(plan: &QueryPlan, column: Column) -> Result<bool> {
    match plan.write_value(column) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(Error::Storage(format!(
            "column {} expects bool, plan wrote {:?}",
            column.as_str(),
            other
        ))),
        None => Err(Error::Storage(format!(
            "insert plan missing column {}",
            column.as_str()
        ))),
    }
}

fn returned_columns(plan: &QueryPlan, row: &StoredRow) -> Vec<(Column, Value)> {
    plan.returning
        .iter()
        .map(|column| (*column, value_of(row, *column)))
        .collect()
}

fn value_of(row: &StoredRow, column: Column) -> Value {
    match column {
        Column::Id => Value::Id(row.id),
        Column::PubId => Value::Pub(row.pub_id),
        Column::ResourceName => Value::Text(row.resource_name.as_str().to_string()),
        Column::Name => Value::Text(row.name.clone()),
        Column::Description => Value::Text(row.description.clone()),
        Column::OwnerId => Value::Id(row.owner_id),
        Column::PubliclyReadable => Value::Bool(row.publicly_readable),
        Column::CreatedAt => Value::Time(row.created_at),
        Column::LastUpdated => Value::Time(row.last_updated),
        Column::DeletedAt => match row.deleted_at {
            Some(ts) => Value::Time(ts),
            None => Value::Null,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_plan() -> QueryPlan {
        QueryPlan::insert(
            Entity::TABLE,
            vec![
                (Column::ResourceName, Value::Text("widget".to_string())),
                (Column::Name, Value::Text("alpha".to_string())),
                (Column::Description, Value::Text("first".to_string())),
                (Column::PubliclyReadable, Value::Bool(false)),
            ],
            OwnerSpec::SelfOwned,
            vec![
                Column::Id,
                Column::PubId,
                Column::OwnerId,
                Column::CreatedAt,
                Column::LastUpdated,
            ],
        )
    }

    fn insert_row(table: &mut EntityTable, raw_id: i64, micros: u64) -> WriteOutcome {
        table
            .insert(
                &insert_plan(),
                InternalId::from_raw(raw_id),
                Timestamp::from_micros(micros),
            )
            .unwrap()
    }

    fn returned_value(outcome: &WriteOutcome, column: Column) -> Value {
        outcome
            .returned
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v.clone())
            .unwrap()
    }

    fn pub_id_of(outcome: &WriteOutcome) -> PublicId {
        match returned_value(outcome, Column::PubId) {
            Value::Pub(p) => p,
            other => panic!("expected pub id, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_assigns_identity_and_timestamps() {
        let mut table = EntityTable::new();
        let outcome = insert_row(&mut table, 1, 100);

        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(
            returned_value(&outcome, Column::Id),
            Value::Id(InternalId::from_raw(1))
        );
        assert!(pub_id_of(&outcome).is_set());
        assert_eq!(
            returned_value(&outcome, Column::CreatedAt),
            Value::Time(Timestamp::from_micros(100))
        );
        assert_eq!(
            returned_value(&outcome, Column::LastUpdated),
            Value::Time(Timestamp::from_micros(100))
        );
    }

    #[test]
    fn test_insert_self_ownership_is_storage_side_default() {
        let mut table = EntityTable::new();
        let outcome = insert_row(&mut table, 1, 100);
        assert_eq!(
            returned_value(&outcome, Column::OwnerId),
            Value::Id(InternalId::from_raw(1))
        );
    }

    #[test]
    fn test_insert_resolves_named_owner() {
        let mut table = EntityTable::new();
        let owner = insert_row(&mut table, 1, 100);
        let owner_pub = pub_id_of(&owner);

        let mut plan = insert_plan();
        plan.owner = Some(OwnerSpec::Resolve(owner_pub));
        let outcome = table
            .insert(&plan, InternalId::from_raw(2), Timestamp::from_micros(200))
            .unwrap();

        assert_eq!(
            returned_value(&outcome, Column::OwnerId),
            Value::Id(InternalId::from_raw(1))
        );
    }

    #[test]
    fn test_insert_unknown_owner_fails() {
        let mut table = EntityTable::new();
        let mut plan = insert_plan();
        plan.owner = Some(OwnerSpec::Resolve(PublicId::generate()));
        let err = table
            .insert(&plan, InternalId::from_raw(1), Timestamp::from_micros(100))
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        // Failed insert leaves no row behind.
        assert!(table
            .select(&SelectQuery::any(Predicate::All))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_update_refreshes_last_updated() {
        let mut table = EntityTable::new();
        insert_row(&mut table, 1, 100);

        let plan = QueryPlan::update(
            Entity::TABLE,
            Predicate::ById(InternalId::from_raw(1)),
            vec![(Column::Name, Value::Text("renamed".to_string()))],
            vec![Column::LastUpdated, Column::DeletedAt],
        );
        let outcome = table.update(&plan, Timestamp::from_micros(200)).unwrap();

        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(
            returned_value(&outcome, Column::LastUpdated),
            Value::Time(Timestamp::from_micros(200))
        );
        assert_eq!(returned_value(&outcome, Column::DeletedAt), Value::Null);

        let rows = table.select(&SelectQuery::live(Predicate::All)).unwrap();
        assert_eq!(rows[0].name(), "renamed");
        // Untouched columns keep their values.
        assert_eq!(rows[0].description(), "first");
    }

    #[test]
    fn test_update_skips_archived_rows() {
        let mut table = EntityTable::new();
        insert_row(&mut table, 1, 100);

        let archive = QueryPlan::soft_delete(
            Entity::TABLE,
            Predicate::ById(InternalId::from_raw(1)),
            vec![],
        );
        table.delete(&archive, Timestamp::from_micros(200)).unwrap();

        let update = QueryPlan::update(
            Entity::TABLE,
            Predicate::ById(InternalId::from_raw(1)),
            vec![(Column::Name, Value::Text("renamed".to_string()))],
            vec![],
        );
        let outcome = table.update(&update, Timestamp::from_micros(300)).unwrap();
        assert_eq!(outcome.rows_affected, 0);
    }

    #[test]
    fn test_update_missing_row_affects_nothing() {
        let mut table = EntityTable::new();
        let plan = QueryPlan::update(
            Entity::TABLE,
            Predicate::ById(InternalId::from_raw(9)),
            vec![],
            vec![Column::LastUpdated],
        );
        let outcome = table.update(&plan, Timestamp::from_micros(100)).unwrap();
        assert_eq!(outcome.rows_affected, 0);
        assert!(outcome.returned.is_empty());
    }

    #[test]
    fn test_soft_delete_archives_and_hides_row() {
        let mut table = EntityTable::new();
        insert_row(&mut table, 1, 100);

        let plan = QueryPlan::soft_delete(
            Entity::TABLE,
            Predicate::ById(InternalId::from_raw(1)),
            vec![Column::LastUpdated, Column::DeletedAt],
        );
        let outcome = table.delete(&plan, Timestamp::from_micros(200)).unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(
            returned_value(&outcome, Column::DeletedAt),
            Value::Time(Timestamp::from_micros(200))
        );

        assert!(table
            .select(&SelectQuery::live(Predicate::All))
            .unwrap()
            .is_empty());
        assert_eq!(
            table
                .select(&SelectQuery::archived(Predicate::All))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            table.select(&SelectQuery::any(Predicate::All)).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_soft_delete_of_archived_row_affects_nothing() {
        let mut table = EntityTable::new();
        insert_row(&mut table, 1, 100);
        let plan = QueryPlan::soft_delete(
            Entity::TABLE,
            Predicate::ById(InternalId::from_raw(1)),
            vec![],
        );
        assert_eq!(
            table
                .delete(&plan, Timestamp::from_micros(200))
                .unwrap()
                .rows_affected,
            1
        );
        // Second archive matches no live row; deleted_at keeps its first value.
        assert_eq!(
            table
                .delete(&plan, Timestamp::from_micros(300))
                .unwrap()
                .rows_affected,
            0
        );
        let rows = table.select(&SelectQuery::archived(Predicate::All)).unwrap();
        assert_eq!(rows[0].deleted_at(), Some(Timestamp::from_micros(200)));
    }

    #[test]
    fn test_hard_delete_only_removes_archived_rows() {
        let mut table = EntityTable::new();
        insert_row(&mut table, 1, 100);

        let hard = QueryPlan::hard_delete(Entity::TABLE, Predicate::ById(InternalId::from_raw(1)));
        // Live row: the hard delete touches nothing.
        assert_eq!(
            table
                .delete(&hard, Timestamp::from_micros(200))
                .unwrap()
                .rows_affected,
            0
        );

        let soft = QueryPlan::soft_delete(
            Entity::TABLE,
            Predicate::ById(InternalId::from_raw(1)),
            vec![],
        );
        table.delete(&soft, Timestamp::from_micros(300)).unwrap();
        assert_eq!(
            table
                .delete(&hard, Timestamp::from_micros(400))
                .unwrap()
                .rows_affected,
            1
        );
        assert!(table
            .select(&SelectQuery::any(Predicate::All))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_select_by_public_id_and_owner_join() {
        let mut table = EntityTable::new();
        let owner = insert_row(&mut table, 1, 100);
        let owner_pub = pub_id_of(&owner);

        let mut plan = insert_plan();
        plan.owner = Some(OwnerSpec::Resolve(owner_pub));
        let owned = table
            .insert(&plan, InternalId::from_raw(2), Timestamp::from_micros(200))
            .unwrap();
        let owned_pub = pub_id_of(&owned);

        let rows = table
            .select(&SelectQuery::live(Predicate::ByPublicId(owned_pub)))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].owner_internal_id(), InternalId::from_raw(1));
        assert_eq!(rows[0].owner_public_id(), Some(owner_pub));

        // Self-owned rows report no distinct owner.
        let rows = table
            .select(&SelectQuery::live(Predicate::ByPublicId(owner_pub)))
            .unwrap();
        assert_eq!(rows[0].owner_public_id(), None);
        assert_eq!(rows[0].owner_internal_id(), InternalId::from_raw(1));
    }
}
