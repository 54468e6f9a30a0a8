//! # Schema Registry
//!
//! The immutable catalog of every variant the engine knows, keyed by
//! `(family, tag)`, plus the named record schemas those variants embed
//! (`user`, `emoji`, `embed`, ...).
//!
//! ## Lifecycle
//!
//! A registry is assembled once through [`RegistryBuilder`] and frozen by
//! [`RegistryBuilder::build`]. Nothing mutates it afterwards, so a single
//! `SchemaRegistry` can be shared by reference across threads and every
//! validation call reads it without locking. Construction rejects duplicate
//! tags and field types that name a record nobody registered.
//!
//! ## Shape of a Variant
//!
//! A [`VariantSchema`] is an ordered list of [`FieldSpec`]s, optionally
//! layered over a shared base list (all message kinds share the same
//! header fields), plus [`CrossFieldRule`]s that no single field can
//! express. Component variants also carry a [`ComponentClass`] used by the
//! tree validator, and buttons name a secondary discriminant family
//! (`style`) whose variants add their own rules.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chatwire_core::{BitfieldSpec, Presence};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{ConfigError, ValidatorConfig};

/// Discriminant value. Every discriminated family on the wire uses a
/// non-negative integer.
pub type Tag = u64;

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

/// A set of variants sharing one discriminant field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// Messages, discriminated by `type`.
    Message,
    /// Interactive components, discriminated by `type`.
    Component,
    /// Button styles, discriminated by `style`.
    ButtonStyle,
}

impl Family {
    /// The wire key holding this family's discriminant.
    pub fn discriminant_field(self) -> &'static str {
        match self {
            Self::Message | Self::Component => "type",
            Self::ButtonStyle => "style",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Component => "component",
            Self::ButtonStyle => "button_style",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

/// The declared type of one field.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Bool,
    /// Integer within inclusive bounds.
    Integer { min: i64, max: i64 },
    /// Any JSON number, integral or not.
    Number,
    /// String with an optional maximum length in characters.
    String { max_chars: Option<usize> },
    Snowflake,
    Timestamp,
    /// Non-negative integer decoded through the named bitfield.
    Flags(&'static BitfieldSpec),
    /// Accepted as-is and carried through normalization untouched.
    Any,
    /// Object validated against a registered record schema.
    Record(&'static str),
    /// Object resolved through a discriminated family (a nested message).
    Variant(Family),
    /// A message's top-level component list, walked by the tree validator.
    Components,
    /// A container's child list, walked by the tree validator.
    Children,
    /// Homogeneous array with length bounds.
    Array {
        items: Box<TypeDescriptor>,
        min_items: usize,
        max_items: Option<usize>,
    },
    /// Accepted if any listed type accepts the value's shape.
    OneOf(Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn int(min: i64, max: i64) -> Self {
        Self::Integer { min, max }
    }

    /// Integer in `[0, i64::MAX]`.
    pub fn non_negative() -> Self {
        Self::Integer { min: 0, max: i64::MAX }
    }

    pub fn string() -> Self {
        Self::String { max_chars: None }
    }

    pub fn string_max(max_chars: usize) -> Self {
        Self::String {
            max_chars: Some(max_chars),
        }
    }

    pub fn array(items: TypeDescriptor) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: 0,
            max_items: None,
        }
    }

    pub fn bounded_array(items: TypeDescriptor, min_items: usize, max_items: usize) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items,
            max_items: Some(max_items),
        }
    }

    /// Values of this type are carried through without interpretation.
    pub fn is_opaque(&self) -> bool {
        match self {
            Self::Any => true,
            Self::Array { items, .. } => matches!(**items, Self::Any),
            _ => false,
        }
    }

    /// Human-readable name used in `TypeMismatch` diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Bool => "boolean".into(),
            Self::Integer { .. } => "integer".into(),
            Self::Number => "number".into(),
            Self::String { .. } => "string".into(),
            Self::Snowflake => "snowflake".into(),
            Self::Timestamp => "ISO 8601 timestamp".into(),
            Self::Flags(spec) => format!("{} integer", spec.name()),
            Self::Any => "any value".into(),
            Self::Record(name) => format!("{name} object"),
            Self::Variant(family) => format!("{family} object"),
            Self::Components | Self::Children => "component array".into(),
            Self::Array { items, .. } => format!("array of {}", items.describe()),
            Self::OneOf(options) => {
                let names: Vec<String> = options.iter().map(TypeDescriptor::describe).collect();
                format!("one of [{}]", names.join(", "))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Presence policy
// ---------------------------------------------------------------------------

/// A condition over the sibling fields of a record.
///
/// Paths are dot-separated (`message_reference.type`) and are evaluated
/// against the record being validated.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// The field is present with a non-null value.
    Present(&'static str),
    /// The field was sent as `null`.
    Null(&'static str),
    /// The field is an integer equal to the given value.
    Equals(&'static str, i64),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn not(inner: Predicate) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn eval(&self, record: &Map<String, Value>) -> bool {
        match self {
            Self::Present(path) => lookup(record, path).is_present(),
            Self::Null(path) => lookup(record, path).is_null(),
            Self::Equals(path, expected) => lookup(record, path)
                .present()
                .and_then(|v| v.as_i64())
                .is_some_and(|v| v == *expected),
            Self::Not(inner) => !inner.eval(record),
        }
    }
}

/// Resolve a dot-separated path against an object.
pub(crate) fn lookup<'a>(record: &'a Map<String, Value>, path: &str) -> Presence<&'a Value> {
    let mut current = record;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let slot = Presence::of(current, segment);
        if segments.peek().is_none() {
            return slot;
        }
        match slot {
            Presence::Present(Value::Object(next)) => current = next,
            _ => return Presence::Absent,
        }
    }
    Presence::Absent
}

/// When a field must be present.
#[derive(Debug, Clone)]
pub enum PresencePolicy {
    Required,
    Optional,
    /// Required while the predicate holds, optional otherwise.
    ConditionallyRequired(Predicate),
    /// Must be absent. `null` counts as sent.
    Forbidden,
}

/// Whether a field accepts `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    NonNull,
    Nullable,
}

/// One field of a variant or record.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: TypeDescriptor,
    pub presence: PresencePolicy,
    pub nullability: Nullability,
    /// Documented but not yet stable on the platform. Provisional fields are
    /// never required; when sent they are type-checked like any other.
    pub provisional: bool,
}

impl FieldSpec {
    fn new(name: &'static str, ty: TypeDescriptor, presence: PresencePolicy) -> Self {
        Self {
            name,
            ty,
            presence,
            nullability: Nullability::NonNull,
            provisional: false,
        }
    }

    pub fn required(name: &'static str, ty: TypeDescriptor) -> Self {
        Self::new(name, ty, PresencePolicy::Required)
    }

    pub fn optional(name: &'static str, ty: TypeDescriptor) -> Self {
        Self::new(name, ty, PresencePolicy::Optional)
    }

    pub fn required_if(name: &'static str, ty: TypeDescriptor, predicate: Predicate) -> Self {
        Self::new(name, ty, PresencePolicy::ConditionallyRequired(predicate))
    }

    pub fn forbidden(name: &'static str) -> Self {
        Self::new(name, TypeDescriptor::Any, PresencePolicy::Forbidden)
    }

    pub fn nullable(mut self) -> Self {
        self.nullability = Nullability::Nullable;
        self
    }

    pub fn provisional(mut self) -> Self {
        self.provisional = true;
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.nullability == Nullability::Nullable
    }

    /// The policy actually enforced. Provisional fields are downgraded to
    /// optional unless they are forbidden.
    pub fn effective_presence(&self) -> &PresencePolicy {
        static OPTIONAL: PresencePolicy = PresencePolicy::Optional;
        match (&self.presence, self.provisional) {
            (PresencePolicy::Forbidden, _) | (_, false) => &self.presence,
            (_, true) => &OPTIONAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Cross-field rules
// ---------------------------------------------------------------------------

/// A constraint spanning several fields of one record.
#[derive(Debug, Clone)]
pub enum CrossFieldRule {
    /// `selected` must be present and every other key in `keys` absent.
    ExactlyOneOf {
        keys: &'static [&'static str],
        selected: &'static str,
    },
    /// When both integers are present, `min` must not exceed `max`.
    MinNotAboveMax {
        min: &'static str,
        max: &'static str,
    },
    /// The integer `field` must not exceed the length of the array `array`.
    AtMostArrayLen {
        field: &'static str,
        array: &'static str,
    },
    /// The summed character count of the listed string paths must stay
    /// within `limit`. A segment ending in `[]` fans out over an array.
    TotalTextLength {
        paths: &'static [&'static str],
        limit: usize,
    },
}

// ---------------------------------------------------------------------------
// Variants and records
// ---------------------------------------------------------------------------

/// What role a component plays in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentClass {
    /// Holds other components (action row).
    Container,
    /// Button-like control; several may share a row.
    Control,
    /// Select menu; must be alone in its row.
    Selection,
    /// Text input; modal surfaces only.
    TextInput,
}

/// Schema for one discriminated variant.
#[derive(Debug, Clone)]
pub struct VariantSchema {
    family: Family,
    tag: Option<Tag>,
    name: &'static str,
    base: Option<Arc<[FieldSpec]>>,
    fields: Vec<FieldSpec>,
    rules: Vec<CrossFieldRule>,
    class: Option<ComponentClass>,
    sub_discriminant: Option<Family>,
}

impl VariantSchema {
    pub fn new(family: Family, tag: Tag, name: &'static str) -> Self {
        Self {
            family,
            tag: Some(tag),
            name,
            base: None,
            fields: Vec::new(),
            rules: Vec::new(),
            class: None,
            sub_discriminant: None,
        }
    }

    /// The lenient fallback for a family: base fields only, no tag.
    pub fn generic(family: Family, name: &'static str) -> Self {
        Self {
            tag: None,
            ..Self::new(family, 0, name)
        }
    }

    pub fn with_base(mut self, base: Arc<[FieldSpec]>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn class(mut self, class: ComponentClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn sub_discriminant(mut self, family: Family) -> Self {
        self.sub_discriminant = Some(family);
        self
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// `None` for a generic fallback.
    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rules(&self) -> &[CrossFieldRule] {
        &self.rules
    }

    pub fn component_class(&self) -> Option<ComponentClass> {
        self.class
    }

    pub fn secondary_family(&self) -> Option<Family> {
        self.sub_discriminant
    }

    /// Base fields not overridden by this variant, then this variant's own.
    pub fn effective_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        let own = &self.fields;
        self.base
            .iter()
            .flat_map(|b| b.iter())
            .filter(move |b| !own.iter().any(|f| f.name == b.name))
            .chain(own.iter())
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.effective_fields().find(|f| f.name == name)
    }

    /// Whether `key` is described by this variant (its discriminants or any
    /// effective field). Keys not covered end up in the extras bag.
    pub fn covers(&self, key: &str) -> bool {
        key == self.family.discriminant_field()
            || self
                .sub_discriminant
                .is_some_and(|f| f.discriminant_field() == key)
            || self.effective_fields().any(|f| f.name == key)
    }
}

/// Schema for a named, non-discriminated object.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: &'static str,
    fields: Vec<FieldSpec>,
    rules: Vec<CrossFieldRule>,
}

impl RecordSchema {
    pub fn new(name: &'static str, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        Self {
            name,
            fields: fields.into_iter().collect(),
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn rules(&self) -> &[CrossFieldRule] {
        &self.rules
    }

    pub fn covers(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.name == key)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry construction failures.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("duplicate {family} variant for tag {tag}")]
    DuplicateVariant { family: Family, tag: Tag },

    #[error("duplicate generic fallback for {0}")]
    DuplicateGeneric(Family),

    #[error("duplicate record schema '{0}'")]
    DuplicateRecord(&'static str),

    #[error("{owner}: field '{field}' references unregistered record '{record}'")]
    UnresolvedRecord {
        owner: String,
        field: &'static str,
        record: &'static str,
    },

    #[error("{owner}: secondary family {family} has no registered variants")]
    EmptySecondaryFamily { owner: String, family: Family },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<RegistryError> for chatwire_core::ChatwireError {
    fn from(e: RegistryError) -> Self {
        chatwire_core::ChatwireError::Registry(e.to_string())
    }
}

/// Lookup miss for `(family, tag)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnregisteredTag {
    pub family: Family,
    pub tag: Tag,
}

/// Mutable staging area for a [`SchemaRegistry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    config: ValidatorConfig,
    variants: HashMap<(Family, Tag), VariantSchema>,
    generics: HashMap<Family, VariantSchema>,
    records: HashMap<&'static str, RecordSchema>,
}

impl RegistryBuilder {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            variants: HashMap::new(),
            generics: HashMap::new(),
            records: HashMap::new(),
        }
    }

    /// Add a tagged variant. A generic schema is routed to
    /// [`RegistryBuilder::register_generic`].
    pub fn register(&mut self, schema: VariantSchema) -> Result<&mut Self, RegistryError> {
        let Some(tag) = schema.tag else {
            return self.register_generic(schema);
        };
        let key = (schema.family, tag);
        if self.variants.contains_key(&key) {
            return Err(RegistryError::DuplicateVariant {
                family: schema.family,
                tag,
            });
        }
        self.variants.insert(key, schema);
        Ok(self)
    }

    /// Set the lenient fallback for a family.
    pub fn register_generic(&mut self, schema: VariantSchema) -> Result<&mut Self, RegistryError> {
        if self.generics.contains_key(&schema.family) {
            return Err(RegistryError::DuplicateGeneric(schema.family));
        }
        self.generics.insert(schema.family, schema);
        Ok(self)
    }

    pub fn register_record(&mut self, record: RecordSchema) -> Result<&mut Self, RegistryError> {
        if self.records.contains_key(record.name) {
            return Err(RegistryError::DuplicateRecord(record.name));
        }
        self.records.insert(record.name, record);
        Ok(self)
    }

    /// Check cross-references and freeze.
    pub fn build(self) -> Result<SchemaRegistry, RegistryError> {
        self.config.validate()?;

        let variant_owners = self
            .variants
            .values()
            .chain(self.generics.values())
            .map(|v| (format!("{} '{}'", v.family, v.name), v.effective_fields().collect::<Vec<_>>()));
        let record_owners = self
            .records
            .values()
            .map(|r| (format!("record '{}'", r.name), r.fields.iter().collect::<Vec<_>>()));
        for (owner, fields) in variant_owners.chain(record_owners) {
            for field in fields {
                let mut records = Vec::new();
                referenced_records(&field.ty, &mut records);
                if let Some(record) = records.into_iter().find(|r| !self.records.contains_key(r)) {
                    return Err(RegistryError::UnresolvedRecord {
                        owner,
                        field: field.name,
                        record,
                    });
                }
            }
        }

        for v in self.variants.values() {
            if let Some(family) = v.sub_discriminant {
                if !self.variants.keys().any(|(f, _)| *f == family) {
                    return Err(RegistryError::EmptySecondaryFamily {
                        owner: format!("{} '{}'", v.family, v.name),
                        family,
                    });
                }
            }
        }

        tracing::debug!(
            variants = self.variants.len(),
            records = self.records.len(),
            strictness = ?self.config.strictness,
            "schema registry built"
        );

        Ok(SchemaRegistry {
            config: self.config,
            variants: self.variants,
            generics: self.generics,
            records: self.records,
        })
    }
}

/// Every record name `ty` mentions, through arrays and all union options.
fn referenced_records(ty: &TypeDescriptor, out: &mut Vec<&'static str>) {
    match ty {
        TypeDescriptor::Record(name) => out.push(*name),
        TypeDescriptor::Array { items, .. } => referenced_records(items, out),
        TypeDescriptor::OneOf(options) => {
            for option in options {
                referenced_records(option, out);
            }
        }
        _ => {}
    }
}

/// Immutable variant catalog plus the configuration it was built with.
#[derive(Debug)]
pub struct SchemaRegistry {
    config: ValidatorConfig,
    variants: HashMap<(Family, Tag), VariantSchema>,
    generics: HashMap<Family, VariantSchema>,
    records: HashMap<&'static str, RecordSchema>,
}

impl SchemaRegistry {
    pub fn builder(config: ValidatorConfig) -> RegistryBuilder {
        RegistryBuilder::new(config)
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The variant registered for `(family, tag)`.
    pub fn lookup(&self, family: Family, tag: Tag) -> Result<&VariantSchema, UnregisteredTag> {
        self.variants
            .get(&(family, tag))
            .ok_or(UnregisteredTag { family, tag })
    }

    /// The lenient fallback for a family, if one was registered.
    pub fn generic(&self, family: Family) -> Option<&VariantSchema> {
        self.generics.get(&family)
    }

    pub fn record(&self, name: &str) -> Option<&RecordSchema> {
        self.records.get(name)
    }

    /// Every variant of a family, ordered by tag.
    pub fn variants(&self, family: Family) -> Vec<&VariantSchema> {
        let mut out: Vec<&VariantSchema> = self
            .variants
            .values()
            .filter(|v| v.family == family)
            .collect();
        out.sort_by_key(|v| v.tag);
        out
    }

    /// Every record, ordered by name.
    pub fn records(&self) -> Vec<&RecordSchema> {
        let mut out: Vec<&RecordSchema> = self.records.values().collect();
        out.sort_by_key(|r| r.name);
        out
    }

    /// Number of tagged variants across all families.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tiny_builder() -> RegistryBuilder {
        let mut b = SchemaRegistry::builder(ValidatorConfig::default());
        b.register_record(RecordSchema::new(
            "thing",
            [FieldSpec::required("id", TypeDescriptor::Snowflake)],
        ))
        .unwrap();
        b
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mut b = tiny_builder();
        b.register(VariantSchema::new(Family::Message, 0, "default")).unwrap();
        let err = b
            .register(VariantSchema::new(Family::Message, 0, "again"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateVariant { tag: 0, .. }));
    }

    #[test]
    fn same_tag_in_different_families_is_fine() {
        let mut b = tiny_builder();
        b.register(VariantSchema::new(Family::Message, 1, "a")).unwrap();
        b.register(VariantSchema::new(Family::Component, 1, "b")).unwrap();
        let reg = b.build().unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup(Family::Component, 1).unwrap().name(), "b");
        assert_eq!(
            reg.lookup(Family::Component, 2).unwrap_err(),
            UnregisteredTag {
                family: Family::Component,
                tag: 2
            }
        );
    }

    #[test]
    fn dangling_record_reference_fails_build() {
        let mut b = tiny_builder();
        b.register(
            VariantSchema::new(Family::Message, 0, "default")
                .field(FieldSpec::optional("author", TypeDescriptor::Record("user"))),
        )
        .unwrap();
        let err = b.build().unwrap_err();
        assert!(matches!(err, RegistryError::UnresolvedRecord { record: "user", .. }));
    }

    #[test]
    fn record_reference_inside_array_is_checked() {
        let mut b = tiny_builder();
        b.register(VariantSchema::new(Family::Message, 0, "default").field(FieldSpec::optional(
            "things",
            TypeDescriptor::array(TypeDescriptor::Record("thing")),
        )))
        .unwrap();
        assert!(b.build().is_ok());
    }

    #[test]
    fn every_union_option_is_checked() {
        let mut b = tiny_builder();
        b.register(VariantSchema::new(Family::Message, 0, "default").field(FieldSpec::optional(
            "subject",
            TypeDescriptor::OneOf(vec![
                TypeDescriptor::Record("thing"),
                TypeDescriptor::array(TypeDescriptor::Record("gadget")),
            ]),
        )))
        .unwrap();
        let err = b.build().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnresolvedRecord { field: "subject", record: "gadget", .. }
        ));
    }

    #[test]
    fn secondary_family_must_exist() {
        let mut b = tiny_builder();
        b.register(
            VariantSchema::new(Family::Component, 2, "button")
                .sub_discriminant(Family::ButtonStyle),
        )
        .unwrap();
        assert!(matches!(
            b.build().unwrap_err(),
            RegistryError::EmptySecondaryFamily { .. }
        ));
    }

    #[test]
    fn variant_fields_override_base() {
        let base: Arc<[FieldSpec]> = vec![
            FieldSpec::optional("id", TypeDescriptor::Snowflake),
            FieldSpec::optional("message_reference", TypeDescriptor::Any),
        ]
        .into();
        let v = VariantSchema::new(Family::Message, 19, "reply")
            .with_base(base)
            .field(FieldSpec::required("message_reference", TypeDescriptor::Any));
        let names: Vec<&str> = v.effective_fields().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "message_reference"]);
        assert!(matches!(
            v.field_spec("message_reference").unwrap().presence,
            PresencePolicy::Required
        ));
        assert!(v.covers("type"));
        assert!(v.covers("id"));
        assert!(!v.covers("shiny"));
    }

    #[test]
    fn provisional_fields_are_never_required() {
        let f = FieldSpec::required("poll", TypeDescriptor::Any).provisional();
        assert!(matches!(f.effective_presence(), PresencePolicy::Optional));
        let g = FieldSpec::forbidden("label").provisional();
        assert!(matches!(g.effective_presence(), PresencePolicy::Forbidden));
    }

    #[test]
    fn predicates_follow_dotted_paths() {
        let record = json!({"message_reference": {"type": 1}, "id": null});
        let map = record.as_object().unwrap();
        assert!(Predicate::Equals("message_reference.type", 1).eval(map));
        assert!(!Predicate::Equals("message_reference.type", 0).eval(map));
        assert!(Predicate::Null("id").eval(map));
        assert!(!Predicate::Present("id").eval(map));
        assert!(Predicate::not(Predicate::Present("missing.deeper")).eval(map));
    }

    #[test]
    fn describe_names_nested_types() {
        let t = TypeDescriptor::OneOf(vec![
            TypeDescriptor::int(0, 10),
            TypeDescriptor::array(TypeDescriptor::Snowflake),
        ]);
        assert_eq!(t.describe(), "one of [integer, array of snowflake]");
        assert!(TypeDescriptor::array(TypeDescriptor::Any).is_opaque());
        assert!(!TypeDescriptor::Snowflake.is_opaque());
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaRegistry>();
    }
}
