//! Member introspection and constructor selection.
//!
//! Target types describe themselves once through [`Projectable::describe`]: the public
//! constructors they offer, their writable properties (setter closures) and their public fields
//! (field accessors). The declaration is turned into an ordered member list and a
//! [`ConstructionPlan`].
//!
//! ```
//! use row_projection::{Projectable, TypeDescriptor};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     id: i32,
//!     name: String,
//! }
//!
//! impl Projectable for Person {
//!     fn describe(ty: &mut TypeDescriptor<Self>) {
//!         ty.constructor(Person::default)
//!             .field("Id", |p: &mut Person| &mut p.id)
//!             .field("Name", |p: &mut Person| &mut p.name);
//!     }
//! }
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::ScalarCategory;
use crate::cursor::RowCursor;
use crate::error::{ProjectionError, ProjectionResult};
use crate::types::Value;

/// Builds a fresh instance of a target type.
pub type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Writes one member from the cell at an ordinal, consuming and returning the instance.
pub type MemberWriter<T> = Arc<dyn Fn(T, &dyn RowCursor, usize) -> ProjectionResult<T> + Send + Sync>;

/// A type that can be projected from cursor rows.
pub trait Projectable: Sized + 'static {
    /// Declare constructors and members. The default declares nothing, which makes the type
    /// unconstructible unless a parser is registered for it.
    fn describe(_ty: &mut TypeDescriptor<Self>) {}
}

/// A public constructor: a closure whose parameters all implement [`Default`].
///
/// Implemented for closures and functions of up to eight parameters.
pub trait Constructor<T, Args>: Send + Sync + 'static {
    /// Number of parameters.
    fn arity(&self) -> usize;

    /// Invoke with `Default::default()` for every parameter.
    fn construct_with_defaults(&self) -> T;
}

macro_rules! impl_constructor {
    ($arity:literal $(, $arg:ident)*) => {
        impl<T, F, $($arg,)*> Constructor<T, ($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> T + Send + Sync + 'static,
            $($arg: Default,)*
        {
            fn arity(&self) -> usize {
                $arity
            }

            fn construct_with_defaults(&self) -> T {
                (self)($(<$arg as Default>::default()),*)
            }
        }
    };
}

impl_constructor!(0);
impl_constructor!(1, A1);
impl_constructor!(2, A1, A2);
impl_constructor!(3, A1, A2, A3);
impl_constructor!(4, A1, A2, A3, A4);
impl_constructor!(5, A1, A2, A3, A4, A5);
impl_constructor!(6, A1, A2, A3, A4, A5, A6);
impl_constructor!(7, A1, A2, A3, A4, A5, A6, A7);
impl_constructor!(8, A1, A2, A3, A4, A5, A6, A7, A8);

/// How a target type is instantiated before its members are populated.
pub enum ConstructionPlan<T> {
    /// A public zero-parameter constructor.
    ZeroArgument(Factory<T>),
    /// The lowest-arity public constructor, invoked with default argument values.
    ParameterizedWithDefaults { arity: usize, factory: Factory<T> },
}

impl<T> ConstructionPlan<T> {
    /// Create a new, unpopulated instance.
    pub fn construct(&self) -> T {
        match self {
            ConstructionPlan::ZeroArgument(factory) => factory(),
            ConstructionPlan::ParameterizedWithDefaults { factory, .. } => factory(),
        }
    }

    /// Number of synthetic arguments passed to the constructor.
    pub fn arity(&self) -> usize {
        match self {
            ConstructionPlan::ZeroArgument(_) => 0,
            ConstructionPlan::ParameterizedWithDefaults { arity, .. } => *arity,
        }
    }
}

impl<T> Clone for ConstructionPlan<T> {
    fn clone(&self) -> Self {
        match self {
            ConstructionPlan::ZeroArgument(factory) => ConstructionPlan::ZeroArgument(Arc::clone(factory)),
            ConstructionPlan::ParameterizedWithDefaults { arity, factory } => {
                ConstructionPlan::ParameterizedWithDefaults {
                    arity: *arity,
                    factory: Arc::clone(factory),
                }
            }
        }
    }
}

impl<T> fmt::Debug for ConstructionPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionPlan::ZeroArgument(_) => f.write_str("ZeroArgument"),
            ConstructionPlan::ParameterizedWithDefaults { arity, .. } => f
                .debug_struct("ParameterizedWithDefaults")
                .field("arity", arity)
                .finish(),
        }
    }
}

/// Which member kind a type populates. Never mixed within one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberMode {
    Properties,
    Fields,
}

impl fmt::Display for MemberMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberMode::Properties => f.write_str("properties"),
            MemberMode::Fields => f.write_str("fields"),
        }
    }
}

/// One eligible, classified member.
pub struct MemberDescriptor<T> {
    /// Declared name (matching is case-insensitive).
    pub name: String,
    /// Declared Rust type.
    pub rust_type: &'static str,
    /// Scalar category the member's type classifies to.
    pub category: ScalarCategory,
    /// Reads the member's cell and stores it into the instance.
    pub writer: MemberWriter<T>,
}

impl<T> Clone for MemberDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            rust_type: self.rust_type,
            category: self.category,
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<T> fmt::Debug for MemberDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Why a declared member is not part of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The member's type has no scalar category.
    UnsupportedType,
    /// Another member with the same case-insensitive name was declared first.
    DuplicateName,
}

/// A declared member that was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMember {
    /// Declared name.
    pub name: String,
    /// Declared Rust type.
    pub rust_type: &'static str,
    /// Why the member was dropped.
    pub reason: SkipReason,
}

struct ConstructorDecl<T> {
    arity: usize,
    factory: Factory<T>,
}

/// Declarations collected from [`Projectable::describe`].
pub struct TypeDescriptor<T> {
    constructors: Vec<ConstructorDecl<T>>,
    properties: Vec<MemberDescriptor<T>>,
    fields: Vec<MemberDescriptor<T>>,
    declared_properties: usize,
    unsupported_properties: Vec<SkippedMember>,
    unsupported_fields: Vec<SkippedMember>,
}

impl<T: 'static> TypeDescriptor<T> {
    fn new() -> Self {
        Self {
            constructors: Vec::new(),
            properties: Vec::new(),
            fields: Vec::new(),
            declared_properties: 0,
            unsupported_properties: Vec::new(),
            unsupported_fields: Vec::new(),
        }
    }

    /// Declare a public constructor.
    pub fn constructor<Args: 'static, C: Constructor<T, Args>>(&mut self, ctor: C) -> &mut Self {
        let arity = ctor.arity();
        self.constructors.push(ConstructorDecl {
            arity,
            factory: Arc::new(move || ctor.construct_with_defaults()),
        });
        self
    }

    /// Declare a writable property.
    pub fn property<V: 'static>(
        &mut self,
        name: &str,
        setter: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> &mut Self {
        self.declared_properties += 1;
        let Some(category) = ScalarCategory::of::<V>() else {
            self.unsupported_properties.push(unsupported::<V>(name));
            return self;
        };
        let writer: MemberWriter<T> = Arc::new(move |mut target: T, cursor: &dyn RowCursor, ordinal: usize| {
            let value = category.extract::<V>(cursor, ordinal)?;
            setter(&mut target, value);
            Ok(target)
        });
        self.properties.push(MemberDescriptor {
            name: name.to_owned(),
            rust_type: category.rust_type(),
            category,
            writer,
        });
        self
    }

    /// Declare a public field.
    pub fn field<V: 'static>(
        &mut self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut V + Send + Sync + 'static,
    ) -> &mut Self {
        let Some(category) = ScalarCategory::of::<V>() else {
            self.unsupported_fields.push(unsupported::<V>(name));
            return self;
        };
        let writer: MemberWriter<T> = Arc::new(move |mut target: T, cursor: &dyn RowCursor, ordinal: usize| {
            *accessor(&mut target) = category.extract::<V>(cursor, ordinal)?;
            Ok(target)
        });
        self.fields.push(MemberDescriptor {
            name: name.to_owned(),
            rust_type: category.rust_type(),
            category,
            writer,
        });
        self
    }

    /// Properties when at least one writable property was declared, fields otherwise.
    pub fn mode(&self) -> MemberMode {
        if self.declared_properties > 0 {
            MemberMode::Properties
        } else {
            MemberMode::Fields
        }
    }

    /// Pick the construction plan: zero-argument if offered, else the lowest arity.
    pub fn construction_plan(&self) -> Option<ConstructionPlan<T>> {
        let chosen = self.constructors.iter().min_by_key(|c| c.arity)?;
        let factory = Arc::clone(&chosen.factory);
        Some(match chosen.arity {
            0 => ConstructionPlan::ZeroArgument(factory),
            arity => ConstructionPlan::ParameterizedWithDefaults { arity, factory },
        })
    }
}

fn unsupported<V: 'static>(name: &str) -> SkippedMember {
    let rust_type = type_name::<V>();
    tracing::trace!(member = name, rust_type, "member type has no scalar category; skipping");
    SkippedMember {
        name: name.to_owned(),
        rust_type,
        reason: SkipReason::UnsupportedType,
    }
}

/// The introspection result for one target type.
pub struct Introspection<T> {
    /// Fully qualified name of the target type.
    pub type_name: &'static str,
    /// How instances are constructed.
    pub plan: ConstructionPlan<T>,
    /// Whether properties or fields are populated.
    pub mode: MemberMode,
    /// Eligible members in declaration order, unique by lower-cased name.
    pub members: Vec<MemberDescriptor<T>>,
    /// Declared members left out of the plan, with the reason.
    pub skipped: Vec<SkippedMember>,
}

/// Run `T::describe` and derive the member list and construction plan.
///
/// Fails with [`ProjectionError::UnconstructibleType`] when no constructor is declared.
pub fn introspect<T: Projectable>() -> ProjectionResult<Introspection<T>> {
    let mut ty = TypeDescriptor::<T>::new();
    T::describe(&mut ty);

    let type_name = type_name::<T>();
    let plan = ty
        .construction_plan()
        .ok_or(ProjectionError::UnconstructibleType { type_name })?;
    let mode = ty.mode();
    let (declared, mut skipped) = match mode {
        MemberMode::Properties => (ty.properties, ty.unsupported_properties),
        MemberMode::Fields => (ty.fields, ty.unsupported_fields),
    };

    let mut seen: HashMap<String, String> = HashMap::with_capacity(declared.len());
    let mut members = Vec::with_capacity(declared.len());
    for member in declared {
        let key = member.name.to_lowercase();
        if let Some(first) = seen.get(&key) {
            tracing::warn!(
                target_type = type_name,
                member = %member.name,
                kept = %first,
                "members differ only by case; keeping the first declared"
            );
            skipped.push(SkippedMember {
                name: member.name.clone(),
                rust_type: member.rust_type,
                reason: SkipReason::DuplicateName,
            });
            continue;
        }
        seen.insert(key, member.name.clone());
        members.push(member);
    }

    Ok(Introspection {
        type_name,
        plan,
        mode,
        members,
        skipped,
    })
}

macro_rules! opaque_projectable {
    ($($ty:ty),* $(,)?) => {
        $(impl Projectable for $ty {})*
    };
}

// Scalar and row-shaped targets resolve to built-in parsers before any projector is built.
opaque_projectable!(
    bool,
    Option<bool>,
    u8,
    Option<u8>,
    i8,
    Option<i8>,
    i16,
    Option<i16>,
    u16,
    Option<u16>,
    i32,
    Option<i32>,
    u32,
    Option<u32>,
    i64,
    Option<i64>,
    u64,
    Option<u64>,
    f32,
    Option<f32>,
    f64,
    Option<f64>,
    rust_decimal::Decimal,
    Option<rust_decimal::Decimal>,
    chrono::NaiveDateTime,
    Option<chrono::NaiveDateTime>,
    uuid::Uuid,
    Option<uuid::Uuid>,
    String,
    Option<String>,
    char,
    Option<char>,
    Vec<u8>,
    Vec<char>,
    crate::catalog::BinaryStream,
    HashMap<String, Value>,
    serde_json::Value,
);

#[cfg(test)]
mod tests {
    use super::{ConstructionPlan, MemberMode, Projectable, SkipReason, TypeDescriptor, introspect};
    use crate::catalog::ScalarCategory;
    use crate::error::ProjectionError;

    #[derive(Debug, Default)]
    struct Account {
        id: i64,
        owner: Option<String>,
        tags: Vec<String>,
        note: String,
    }

    impl Projectable for Account {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor(|id: i64, owner: Option<String>| Account {
                id,
                owner,
                ..Account::default()
            })
            .constructor(Account::default)
            .property("Id", |a: &mut Account, v: i64| a.id = v)
            .property("Owner", |a: &mut Account, v: Option<String>| a.owner = v)
            .property("Tags", |a: &mut Account, v: Vec<String>| a.tags = v)
            .field("note", |a: &mut Account| &mut a.note);
        }
    }

    struct Sealed;

    impl Projectable for Sealed {}

    #[test]
    fn zero_argument_constructor_wins_regardless_of_order() {
        let info = introspect::<Account>().unwrap();
        assert!(matches!(info.plan, ConstructionPlan::ZeroArgument(_)));
    }

    #[test]
    fn properties_mode_excludes_fields_and_drops_unsupported() {
        let info = introspect::<Account>().unwrap();
        assert_eq!(info.mode, MemberMode::Properties);
        let names: Vec<&str> = info.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Id", "Owner"]);
        assert_eq!(info.members[1].category, ScalarCategory::NullableString);
        assert_eq!(info.skipped.len(), 1);
        assert_eq!(info.skipped[0].name, "Tags");
        assert_eq!(info.skipped[0].reason, SkipReason::UnsupportedType);
    }

    #[derive(Debug)]
    struct Pair {
        left: i32,
        right: i32,
        shadow: i32,
    }

    impl Projectable for Pair {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor(|left: i32, right: i32, shadow: i32| Pair { left, right, shadow })
                .constructor(|left: i32, right: i32| Pair { left, right, shadow: 0 })
                .field("left", |p: &mut Pair| &mut p.left)
                .field("right", |p: &mut Pair| &mut p.right)
                .field("LEFT", |p: &mut Pair| &mut p.shadow);
        }
    }

    #[test]
    fn lowest_arity_constructor_is_used_with_defaults() {
        let info = introspect::<Pair>().unwrap();
        assert_eq!(info.plan.arity(), 2);
        let built = info.plan.construct();
        assert_eq!((built.left, built.right, built.shadow), (0, 0, 0));
    }

    #[test]
    fn case_collision_keeps_first_declared() {
        let info = introspect::<Pair>().unwrap();
        assert_eq!(info.mode, MemberMode::Fields);
        assert_eq!(info.members.len(), 2);
        assert_eq!(info.skipped[0].name, "LEFT");
        assert_eq!(info.skipped[0].reason, SkipReason::DuplicateName);
    }

    #[test]
    fn type_without_constructor_is_unconstructible() {
        let err = introspect::<Sealed>().err().unwrap();
        assert!(matches!(err, ProjectionError::UnconstructibleType { .. }));
        assert!(err.to_string().contains("Sealed"));
    }
}
