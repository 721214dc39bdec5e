//! Fields and groups: what field references resolve to.
//!
//! A [`Group`] is a table (or another source of rows) with named
//! [`Field`]s. A field may reference another group, which makes the fields
//! of that group reachable with dotted paths: if the variable `p` is a
//! field referencing the group `person`, then `p.name` refers to the field
//! `name` of `person`. Reaching a referenced group requires a join, which
//! the [`Query`](crate::Query) adds when it renders such a path.
//!
//! The model is immutable and shared through [`Arc`]s. Groups may refer to
//! themselves or to each other; such back references are [`Weak`], so a
//! group only reachable through them lives as long as its [`Schema`]. It
//! is usually loaded from a JSON definition:
//!
//! ```
//! use vsql::schema::Schema;
//!
//! let schema = Schema::from_json(r#"{
//!     "groups": {
//!         "dept": {"table": "dept_table", "fields": [
//!             {"identifier": "name", "type": "str", "sql": "{a}.name"}
//!         ]}
//!     },
//!     "vars": [
//!         {"identifier": "d", "type": "int", "sql": "d_id",
//!          "join": "{d}.id = d_id", "group": "dept"}
//!     ]
//! }"#).unwrap();
//! assert!(schema.vars().contains_key("d"));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::datatype::DataType;
use crate::error::VsqlError;

/// Top level fields of an expression, by identifier.
pub type Vars = IndexMap<String, Arc<Field>>;

/// A queryable value.
///
/// `field_sql` is the SQL for the value, where `{a}` stands for the alias
/// of the table the field belongs to. `join_sql` is the condition joining
/// the referenced group, with `{m}` for the alias of the table of this
/// field and `{d}` for the alias of the referenced table.
#[derive(Debug, Clone)]
pub struct Field {
    identifier: String,
    datatype: DataType,
    field_sql: String,
    join_sql: Option<String>,
    ref_group: Option<GroupRef>,
}

#[derive(Debug, Clone)]
enum GroupRef {
    Strong(Arc<Group>),
    Weak(Weak<Group>),
}

impl GroupRef {
    fn get(&self) -> Option<Arc<Group>> {
        match self {
            GroupRef::Strong(group) => Some(Arc::clone(group)),
            GroupRef::Weak(group) => group.upgrade(),
        }
    }

    fn as_ptr(&self) -> *const Group {
        match self {
            GroupRef::Strong(group) => Arc::as_ptr(group),
            GroupRef::Weak(group) => Weak::as_ptr(group),
        }
    }
}

impl Field {
    pub fn new(identifier: &str, datatype: DataType, field_sql: &str) -> Self {
        Field {
            identifier: identifier.to_string(),
            datatype,
            field_sql: field_sql.to_string(),
            join_sql: None,
            ref_group: None,
        }
    }

    /// Makes this field reference `group`, reached through `join_sql`.
    pub fn with_ref(mut self, join_sql: Option<&str>, group: Arc<Group>) -> Self {
        self.join_sql = join_sql.map(str::to_string);
        self.ref_group = Some(GroupRef::Strong(group));
        self
    }

    /// Like [`with_ref`](Field::with_ref), for a group that is still being
    /// built, e.g. inside [`Arc::new_cyclic`]. The field keeps the group
    /// reachable only while someone else owns it.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use vsql::{DataType, Field, Group};
    ///
    /// let person = Arc::new_cyclic(|me| {
    ///     let mut group = Group::new(Some("person"));
    ///     group.add_field(
    ///         Field::new("boss", DataType::Int, "{a}.boss_id")
    ///             .with_back_ref(Some("{m}.boss_id = {d}.id"), me.clone()),
    ///     );
    ///     group
    /// });
    /// let boss = person.field("boss").unwrap();
    /// assert!(Arc::ptr_eq(&boss.ref_group().unwrap(), &person));
    /// ```
    pub fn with_back_ref(mut self, join_sql: Option<&str>, group: Weak<Group>) -> Self {
        self.join_sql = join_sql.map(str::to_string);
        self.ref_group = Some(GroupRef::Weak(group));
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn field_sql(&self) -> &str {
        &self.field_sql
    }

    pub fn join_sql(&self) -> Option<&str> {
        self.join_sql.as_deref()
    }

    /// The referenced group, if there is one and it is still alive.
    pub fn ref_group(&self) -> Option<Arc<Group>> {
        self.ref_group.as_ref().and_then(GroupRef::get)
    }
}

/// Referenced groups compare by identity, which keeps comparing cyclic
/// schemas finite.
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.datatype == other.datatype
            && self.field_sql == other.field_sql
            && self.join_sql == other.join_sql
            && self.ref_group.as_ref().map(GroupRef::as_ptr) == other.ref_group.as_ref().map(GroupRef::as_ptr)
    }
}

/// A set of fields, optionally backed by a table.
///
/// Groups without table SQL describe values that don't need a `from`
/// entry, e.g. values computed by function calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    table_sql: Option<String>,
    fields: IndexMap<String, Arc<Field>>,
}

impl Group {
    pub fn new(table_sql: Option<&str>) -> Self {
        Group {
            table_sql: table_sql.map(str::to_string),
            fields: IndexMap::new(),
        }
    }

    pub fn add_field(&mut self, field: Field) -> &mut Self {
        self.fields.insert(field.identifier.clone(), Arc::new(field));
        self
    }

    pub fn table_sql(&self) -> Option<&str> {
        self.table_sql.as_deref()
    }

    /// The field named `identifier`, or the wildcard field `*` if there is
    /// no such field.
    pub fn field(&self, identifier: &str) -> Option<&Arc<Field>> {
        self.fields.get(identifier).or_else(|| self.fields.get("*"))
    }

    pub fn fields(&self) -> &IndexMap<String, Arc<Field>> {
        &self.fields
    }
}

#[derive(Debug, Deserialize)]
struct SchemaDef {
    #[serde(default)]
    groups: IndexMap<String, GroupDef>,
    #[serde(default)]
    vars: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
struct GroupDef {
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    identifier: String,
    #[serde(rename = "type")]
    datatype: DataType,
    sql: String,
    #[serde(default)]
    join: Option<String>,
    #[serde(default)]
    group: Option<String>,
}

/// Groups and variables loaded from a JSON definition.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    groups: IndexMap<String, Arc<Group>>,
    vars: Vars,
}

impl Schema {
    /// Loads a schema definition.
    ///
    /// # Errors
    ///
    /// [`VsqlError::Json`] for malformed JSON, [`VsqlError::Schema`] for
    /// references to unknown groups and duplicate identifiers.
    pub fn from_json(json: &str) -> Result<Schema, VsqlError> {
        let def: SchemaDef = serde_json::from_str(json)?;
        let mut builder = Builder {
            defs: &def.groups,
            built: IndexMap::new(),
            pending: HashMap::new(),
        };
        for name in def.groups.keys() {
            builder.group(name)?;
        }
        let mut vars = Vars::new();
        for field_def in &def.vars {
            let field = builder.field(field_def, "vars")?;
            if vars.insert(field_def.identifier.clone(), Arc::new(field)).is_some() {
                return Err(VsqlError::Schema(format!("Duplicate variable `{}`", field_def.identifier)));
            }
        }
        tracing::debug!(groups = builder.built.len(), vars = vars.len(), "loaded schema");
        Ok(Schema {
            groups: builder.built,
            vars,
        })
    }

    pub fn group(&self, name: &str) -> Option<&Arc<Group>> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> &IndexMap<String, Arc<Group>> {
        &self.groups
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }
}

/// Builds groups depth first, so referenced groups exist before the fields
/// referencing them. A reference to a group that is still being built is a
/// back reference and becomes weak.
struct Builder<'a> {
    defs: &'a IndexMap<String, GroupDef>,
    built: IndexMap<String, Arc<Group>>,
    pending: HashMap<&'a str, Weak<Group>>,
}

impl<'a> Builder<'a> {
    fn group(&mut self, name: &'a str) -> Result<GroupRef, VsqlError> {
        if let Some(group) = self.built.get(name) {
            return Ok(GroupRef::Strong(Arc::clone(group)));
        }
        if let Some(group) = self.pending.get(name) {
            tracing::trace!(group = name, "back reference");
            return Ok(GroupRef::Weak(group.clone()));
        }
        let defs: &'a IndexMap<String, GroupDef> = self.defs;
        let def = defs
            .get(name)
            .ok_or_else(|| VsqlError::Schema(format!("Unknown group `{}`", name)))?;

        let mut failure = None;
        let group = Arc::new_cyclic(|me| {
            self.pending.insert(name, me.clone());
            let mut group = Group::new(def.table.as_deref());
            for field_def in &def.fields {
                if group.fields.contains_key(&field_def.identifier) {
                    failure = Some(VsqlError::Schema(format!(
                        "Duplicate field `{}` in group `{}`",
                        field_def.identifier, name
                    )));
                    break;
                }
                match self.field(field_def, name) {
                    Ok(field) => {
                        group.add_field(field);
                    }
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }
            group
        });
        self.pending.remove(name);
        if let Some(err) = failure {
            return Err(err);
        }

        self.built.insert(name.to_string(), Arc::clone(&group));
        Ok(GroupRef::Strong(group))
    }

    fn field(&mut self, def: &'a FieldDef, owner: &str) -> Result<Field, VsqlError> {
        let field = Field::new(&def.identifier, def.datatype, &def.sql);
        match &def.group {
            Some(group_name) => {
                if !self.defs.contains_key(group_name.as_str()) {
                    return Err(VsqlError::Schema(format!(
                        "Field `{}` in `{}` references unknown group `{}`",
                        def.identifier, owner, group_name
                    )));
                }
                let mut field = field;
                field.join_sql = def.join.clone();
                field.ref_group = Some(self.group(group_name)?);
                Ok(field)
            }
            None if def.join.is_some() => Err(VsqlError::Schema(format!(
                "Field `{}` in `{}` has a join condition but no group",
                def.identifier, owner
            ))),
            None => Ok(field),
        }
    }
}
