//! Compiled projectors.
//!
//! A [`CompiledProjector`] is the per-type extraction plan: how to construct the target and which
//! member writer handles which (lower-cased) column name. It is built once per type and shared
//! across every row and cursor afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cursor::RowCursor;
use crate::error::ProjectionResult;
use crate::introspect::{
    ConstructionPlan, MemberDescriptor, MemberMode, MemberWriter, Projectable, SkippedMember, introspect,
};
use crate::observability::ProjectorStats;

/// Immutable projection plan for one target type.
pub struct CompiledProjector<T> {
    type_name: &'static str,
    plan: ConstructionPlan<T>,
    mode: MemberMode,
    members: HashMap<String, MemberDescriptor<T>>,
    skipped: Vec<SkippedMember>,
}

impl<T: Projectable> CompiledProjector<T> {
    /// Introspect `T` and compile its plan.
    pub fn build() -> ProjectionResult<Self> {
        let info = introspect::<T>()?;
        let members: HashMap<String, MemberDescriptor<T>> = info
            .members
            .into_iter()
            .map(|m| (m.name.to_lowercase(), m))
            .collect();

        tracing::debug!(
            target_type = info.type_name,
            mode = %info.mode,
            members = members.len(),
            skipped = info.skipped.len(),
            plan = ?info.plan,
            "compiled projector"
        );

        Ok(Self {
            type_name: info.type_name,
            plan: info.plan,
            mode: info.mode,
            members,
            skipped: info.skipped,
        })
    }
}

impl<T> CompiledProjector<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn plan(&self) -> &ConstructionPlan<T> {
        &self.plan
    }

    pub fn mode(&self) -> MemberMode {
        self.mode
    }

    /// Look up a member by name, ignoring case.
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor<T>> {
        self.members.get(&name.to_lowercase())
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn skipped(&self) -> &[SkippedMember] {
        &self.skipped
    }

    pub fn stats(&self) -> ProjectorStats {
        ProjectorStats::new(self.members.len(), self.skipped.len(), self.mode, &self.plan)
    }

    /// Resolve which cursor ordinals feed which members.
    ///
    /// Columns with no matching member are ignored; members with no column keep the value the
    /// constructor gave them.
    pub fn bind(&self, cursor: &dyn RowCursor) -> ProjectionResult<ColumnBinding<T>> {
        let mut slots = Vec::with_capacity(cursor.field_count().min(self.members.len()));
        for ordinal in 0..cursor.field_count() {
            let column = cursor.column_name(ordinal)?.to_lowercase();
            if let Some(member) = self.members.get(&column) {
                slots.push(BoundMember {
                    ordinal,
                    writer: Arc::clone(&member.writer),
                });
            }
        }
        Ok(ColumnBinding { slots })
    }

    /// Project the cursor's current row.
    pub fn apply(&self, cursor: &dyn RowCursor) -> ProjectionResult<T> {
        let binding = self.bind(cursor)?;
        self.apply_bound(&binding, cursor)
    }

    /// Project the cursor's current row using a binding from [`Self::bind`] on the same cursor.
    pub fn apply_bound(&self, binding: &ColumnBinding<T>, cursor: &dyn RowCursor) -> ProjectionResult<T> {
        binding
            .slots
            .iter()
            .try_fold(self.plan.construct(), |target, slot| {
                (slot.writer)(target, cursor, slot.ordinal)
            })
    }
}

impl<T> fmt::Debug for CompiledProjector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledProjector")
            .field("type_name", &self.type_name)
            .field("plan", &self.plan)
            .field("mode", &self.mode)
            .field("members", &self.members.len())
            .field("skipped", &self.skipped.len())
            .finish()
    }
}

struct BoundMember<T> {
    ordinal: usize,
    writer: MemberWriter<T>,
}

/// Column ordinals resolved against one cursor.
pub struct ColumnBinding<T> {
    slots: Vec<BoundMember<T>>,
}

impl<T> ColumnBinding<T> {
    /// Bound ordinals in column order.
    pub fn ordinals(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().map(|s| s.ordinal)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::CompiledProjector;
    use crate::cursor::{DataSetCursor, RowCursor};
    use crate::introspect::{MemberMode, Projectable, TypeDescriptor};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        id: i32,
        name: String,
        nickname: Option<String>,
    }

    impl Projectable for Person {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor(Person::default)
                .property("Id", |p: &mut Person, v: i32| p.id = v)
                .property("Name", |p: &mut Person, v: String| p.name = v)
                .property("Nickname", |p: &mut Person, v: Option<String>| p.nickname = v);
        }
    }

    fn cursor(columns: &[(&str, DataType)], rows: Vec<Vec<Value>>) -> DataSetCursor {
        let schema = Schema::new(columns.iter().map(|(n, t)| Field::new(*n, *t)).collect());
        DataSetCursor::new(DataSet::new(schema, rows))
    }

    #[test]
    fn matches_columns_case_insensitively() {
        let projector = CompiledProjector::<Person>::build().unwrap();
        assert_eq!(projector.mode(), MemberMode::Properties);
        assert!(projector.member("NAME").is_some());

        let mut c = cursor(
            &[("id", DataType::Int32), ("NAME", DataType::Utf8), ("extra", DataType::Bool)],
            vec![vec![Value::Int32(5), Value::Utf8("Ann".into()), Value::Bool(true)]],
        );
        c.advance().unwrap();

        let binding = projector.bind(&c).unwrap();
        assert_eq!(binding.ordinals().collect::<Vec<_>>(), vec![0, 1]);

        let person = projector.apply_bound(&binding, &c).unwrap();
        assert_eq!(
            person,
            Person {
                id: 5,
                name: "Ann".into(),
                nickname: None,
            }
        );
    }

    #[test]
    fn null_cells_become_defaults() {
        let projector = CompiledProjector::<Person>::build().unwrap();
        let mut c = cursor(
            &[("Id", DataType::Int32), ("Name", DataType::Utf8), ("Nickname", DataType::Utf8)],
            vec![vec![Value::Null, Value::Null, Value::Null]],
        );
        c.advance().unwrap();
        assert_eq!(projector.apply(&c).unwrap(), Person::default());
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Point {
        x: f64,
        y: f64,
    }

    impl Projectable for Point {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor(|x: f64, y: f64| Point { x, y })
                .field("x", |p: &mut Point| &mut p.x)
                .field("y", |p: &mut Point| &mut p.y);
        }
    }

    #[test]
    fn copy_types_keep_every_write() {
        let projector = CompiledProjector::<Point>::build().unwrap();
        assert_eq!(projector.stats().constructor_arity, 2);

        let mut c = cursor(
            &[("X", DataType::Float64), ("Y", DataType::Float64)],
            vec![vec![Value::Float64(1.5), Value::Float64(-2.0)]],
        );
        c.advance().unwrap();
        assert_eq!(projector.apply(&c).unwrap(), Point { x: 1.5, y: -2.0 });
    }
}
